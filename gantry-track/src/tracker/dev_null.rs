// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::cell::RefCell;

use crate::Tag;
use crate::tracker::Track;

/// A tracker that does nothing.
///
/// This can be useful for tests that do not care about log output.
pub struct DevNullTracker {
    next_tag: RefCell<u64>,
}

impl DevNullTracker {
    /// Basic constructor
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_tag: RefCell::new(crate::ROOT.0 + 1),
        }
    }
}

impl Default for DevNullTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Track for DevNullTracker {
    fn unique_tag(&self) -> Tag {
        let mut guard = self.next_tag.borrow_mut();
        let tag = *guard;
        *guard += 1;
        Tag(tag)
    }

    fn is_entity_enabled(&self, _tag: Tag, _level: log::Level) -> bool {
        false
    }
    fn add_entity(&self, _tag: Tag, _entity_name: &str) {}
    fn log(&self, _tag: Tag, _level: log::Level, _msg: std::fmt::Arguments) {}
    fn shutdown(&self) {}
}
