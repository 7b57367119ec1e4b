// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::tracker::{EntityManager, Track};
use crate::{Tag, Writer};

/// A simple text logger to output messages to a [`Writer`].
pub struct TextTracker {
    entity_manager: EntityManager,

    /// Names of registered entities, used to prefix messages.
    entity_names: RefCell<HashMap<Tag, String>>,

    /// Writer to which all log events will be written.
    writer: RefCell<Writer>,
}

impl TextTracker {
    /// Create a new [`TextTracker`] with an [`EntityManager`].
    pub fn new(entity_manager: EntityManager, writer: Writer) -> Self {
        Self {
            entity_manager,
            entity_names: RefCell::new(HashMap::new()),
            writer: RefCell::new(writer),
        }
    }
}

/// Implementation for each [`Track`] event
impl Track for TextTracker {
    fn unique_tag(&self) -> Tag {
        self.entity_manager.unique_tag()
    }

    fn is_entity_enabled(&self, tag: Tag, level: log::Level) -> bool {
        self.entity_manager.is_enabled(tag, level)
    }

    fn add_entity(&self, tag: Tag, entity_name: &str) {
        self.entity_manager.add_entity(tag, entity_name);
        self.entity_names
            .borrow_mut()
            .insert(tag, entity_name.to_owned());
    }

    fn log(&self, msg_by: Tag, level: log::Level, msg: std::fmt::Arguments) {
        let names = self.entity_names.borrow();
        let name = names.get(&msg_by).map_or("?", String::as_str);
        self.writer
            .borrow_mut()
            .write_all(format!("{name}({msg_by}):{level}: {msg}\n").as_bytes())
            .unwrap();
    }

    fn shutdown(&self) {
        self.writer.borrow_mut().flush().unwrap();
    }
}
