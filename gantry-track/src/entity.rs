// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! An analysis entity.
//!
//! All parts of the analysis pipeline should contain an entity in order to
//! maintain a hierarchy. They contain a name and a unique tag for logging.

use std::fmt;
use std::rc::Rc;

use crate::{Tag, Tracker};

/// An analysis entity
///
/// An entity is a part of a hierarchical pipeline in which it must have a
/// parent. The top-level should be created using `toplevel(tracker, "name")`.
///
/// The entity is used when logging so that its unique tag can be emitted and
/// it can determine which messages are emitted.
pub struct Entity {
    /// Name of this entity.
    pub name: String,

    /// Optional parent entity (only the top-level should be None).
    pub parent: Option<Rc<Entity>>,

    /// Unique identifier used for log messages.
    pub tag: Tag,

    /// [`Tracker`] used to handle log events.
    pub tracker: Tracker,
}

static JOIN: &str = "::";

impl Entity {
    /// Create a new entity.
    #[must_use]
    pub fn new(parent: &Rc<Entity>, name: &str) -> Self {
        let mut full_name = parent.full_name();
        full_name.push_str(JOIN);
        full_name.push_str(name);

        let tracker = parent.tracker.clone();
        let tag = tracker.unique_tag();
        tracker.add_entity(tag, &full_name);

        Self {
            name: String::from(name),
            parent: Some(parent.clone()),
            tag,
            tracker,
        }
    }

    /// Returns the full hierarchical name of this entity
    #[must_use]
    pub fn full_name(&self) -> String {
        match &self.parent {
            Some(parent) => {
                let mut name = parent.full_name();
                name.push_str(JOIN);
                name.push_str(self.name.as_str());
                name
            }
            None => self.name.clone(),
        }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("tag", &self.tag)
            .finish()
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(parent) = &self.parent {
            parent.fmt(f)?;
            write!(f, "{}{}", JOIN, self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// Create the top-level entity. This should be the only entity without a
/// parent.
pub fn toplevel(tracker: &Tracker, name: &str) -> Rc<Entity> {
    let tag = tracker.unique_tag();
    tracker.add_entity(tag, name);
    Rc::new(Entity {
        parent: None,
        name: String::from(name),
        tag,
        tracker: tracker.clone(),
    })
}
