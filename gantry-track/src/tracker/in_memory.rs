// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::Tag;
use crate::tracker::{EntityManager, Track};

/// A recorded log event.
#[derive(Debug, Clone)]
pub struct LogEvent {
    /// The [`Tag`] of the event originator.
    pub tag: Tag,

    /// The level at which the event was emitted.
    pub level: log::Level,

    /// The formatted message text.
    pub text: String,
}

/// A tracker that records all log events in memory.
///
/// Used by tests to assert on messages emitted by the pipeline.
pub struct InMemoryTracker {
    entity_manager: EntityManager,
    entity_names: RefCell<HashMap<Tag, String>>,
    events: RefCell<Vec<LogEvent>>,
}

impl InMemoryTracker {
    /// Create a new [`InMemoryTracker`] recording everything at or above
    /// `level`.
    #[must_use]
    pub fn new(level: log::Level) -> Self {
        Self {
            entity_manager: EntityManager::new(level),
            entity_names: RefCell::new(HashMap::new()),
            events: RefCell::new(Vec::new()),
        }
    }

    /// Return a copy of all recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<LogEvent> {
        self.events.borrow().clone()
    }

    /// Return the recorded messages at exactly the given level.
    #[must_use]
    pub fn messages_at(&self, level: log::Level) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.level == level)
            .map(|e| e.text.clone())
            .collect()
    }

    /// Return the name an entity registered with, if any.
    #[must_use]
    pub fn name_of(&self, tag: Tag) -> Option<String> {
        self.entity_names.borrow().get(&tag).cloned()
    }
}

impl Track for InMemoryTracker {
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
        self.events.borrow_mut().push(LogEvent {
            tag: msg_by,
            level,
            text: format!("{msg}"),
        });
    }

    fn shutdown(&self) {}
}
