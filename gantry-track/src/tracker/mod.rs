// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Define the [`Track`] trait and a number of [`Tracker`]s.

/// Include the /dev/null tracker.
pub mod dev_null;
/// Include the in-memory tracker.
pub mod in_memory;
/// Include the text-based tracker.
pub mod text;

use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::rc::Rc;

pub use dev_null::DevNullTracker;
pub use in_memory::InMemoryTracker;
use regex::Regex;
pub use text::TextTracker;

use crate::{ROOT, Tag};

/// Error used to return configuration errors
#[derive(Debug)]
pub struct TrackConfigError(pub String);

impl std::fmt::Display for TrackConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Error: {}", self.0)
    }
}

impl std::error::Error for TrackConfigError {}

/// This is the interface that is supported by all [`Tracker`]s.
pub trait Track {
    /// Allocate a new global tag
    fn unique_tag(&self) -> Tag;

    /// Determine whether logging is enabled, and at what level, for an
    /// entity looked up by its tag.
    fn is_entity_enabled(&self, tag: Tag, level: log::Level) -> bool;

    /// Record an entity being created.
    fn add_entity(&self, tag: Tag, entity_name: &str);

    /// Track a log message of the given level.
    fn log(&self, msg_by: Tag, level: log::Level, msg: std::fmt::Arguments);

    /// Perform any pre-exit shutdown/cleanup
    fn shutdown(&self);
}

/// The type of a [`Tracker`] that is shared across entities.
pub type Tracker = Rc<dyn Track>;

/// Create a [`Tracker`] that prints all log events to `stdout`.
#[must_use]
pub fn stdout_tracker(level: log::Level) -> Tracker {
    let entity_manager = EntityManager::new(level);
    let stdout_writer = Box::new(io::BufWriter::new(io::stdout()));
    let tracker: Tracker = Rc::new(TextTracker::new(entity_manager, stdout_writer));
    tracker
}

/// Create a [`Tracker`] that suppresses all log events.
#[must_use]
pub fn dev_null_tracker() -> Tracker {
    let tracker: Tracker = Rc::new(DevNullTracker::new());
    tracker
}

/// The [`EntityManager`] is responsible for determining entity log enable
/// states.
///
/// This is shared by the [`Text`](crate::tracker::text) and
/// [`InMemory`](crate::tracker::in_memory) trackers.
///
/// This manager is also used to allocate unique [`Tag`] values.
pub struct EntityManager {
    /// Level of log events to output.
    default_entity_level: log::Level,

    /// List of regular expressions mapping entity names to log levels.
    regex_to_entity_level: Vec<(Regex, log::Level)>,

    /// Used to assign unique tags.
    unique_tag: RefCell<u64>,

    /// Keep track of entities that have log levels different to the default.
    log_entity_lookup: RefCell<HashMap<Tag, log::Level>>,
}

impl EntityManager {
    /// Constructor with default [`log::Level`]
    #[must_use]
    pub fn new(default_entity_level: log::Level) -> Self {
        Self {
            default_entity_level,
            regex_to_entity_level: Vec::new(),
            unique_tag: RefCell::new(ROOT.0 + 1),
            log_entity_lookup: RefCell::new(HashMap::new()),
        }
    }

    pub(crate) fn unique_tag(&self) -> Tag {
        let mut guard = self.unique_tag.borrow_mut();
        let tag = *guard;
        *guard += 1;
        Tag(tag)
    }

    pub(crate) fn is_enabled(&self, tag: Tag, level: log::Level) -> bool {
        match self.log_entity_lookup.borrow().get(&tag) {
            None => level <= self.default_entity_level,
            Some(entity_level) => level <= *entity_level,
        }
    }

    pub(crate) fn add_entity(&self, tag: Tag, entity_name: &str) {
        let entity_level = self.log_level_for(entity_name);
        if entity_level != self.default_entity_level
            && self
                .log_entity_lookup
                .borrow_mut()
                .insert(tag, entity_level)
                .is_some()
        {
            panic!("Entity tag {tag} already seen ({entity_name})");
        }
    }

    fn log_level_for(&self, entity_name: &str) -> log::Level {
        for (regex, level) in &self.regex_to_entity_level {
            if regex.is_match(entity_name) {
                return *level;
            }
        }
        self.default_entity_level
    }

    /// Add a filter regular expression to set matching entities to a given
    /// level.
    ///
    /// # Example
    ///
    /// ```rust
    /// use gantry_track::tracker::EntityManager;
    /// let mut manager = EntityManager::new(log::Level::Warn);
    /// manager
    ///     .add_entity_level_filter(".*graph.*", log::Level::Trace)
    ///     .unwrap();
    /// ```
    pub fn add_entity_level_filter(
        &mut self,
        regex_str: &str,
        level: log::Level,
    ) -> Result<(), TrackConfigError> {
        match Regex::new(regex_str) {
            Ok(regex) => self.regex_to_entity_level.push((regex, level)),
            Err(e) => {
                return Err(TrackConfigError(format!(
                    "Failed to parse regex {regex_str}:\n{e}\n"
                )));
            }
        }
        Ok(())
    }
}
