// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Library functions to build trackers as defined by the user.

use std::io::BufWriter;
use std::rc::Rc;
use std::{fs, io};

use crate::tracker::{EntityManager, TextTracker, TrackConfigError, dev_null_tracker};
use crate::{Tracker, Writer};

/// Configuration options for a tracker.
pub struct TrackerConfig<'a> {
    /// Enable this tracker.
    pub enable: bool,

    /// Set the level at which this tracker should be enabled.
    pub level: log::Level,

    /// A regular expression to match which entities should have this level
    /// applied.
    pub filter_regex: &'a str,

    /// If set, the name of the file to which the tracker will write.
    /// Otherwise output goes to stdout.
    pub file: Option<&'a str>,
}

impl Default for TrackerConfig<'_> {
    fn default() -> Self {
        Self {
            enable: true,
            level: log::Level::Warn,
            filter_regex: "",
            file: None,
        }
    }
}

/// Create a tracker as described by the configuration.
///
/// The user can pass a filter regular expression which will set the level
/// only for matching entities and set all other entities to only emit
/// errors. A disabled configuration yields a tracker that suppresses
/// everything.
pub fn setup_tracker(config: &TrackerConfig) -> Result<Tracker, TrackConfigError> {
    if !config.enable {
        return Ok(dev_null_tracker());
    }

    let default_level = if config.filter_regex.is_empty() {
        config.level
    } else {
        log::Level::Error
    };

    let mut entity_manager = EntityManager::new(default_level);
    if !config.filter_regex.is_empty() {
        entity_manager.add_entity_level_filter(config.filter_regex, config.level)?;
    }

    let writer: Writer = match config.file {
        Some(path) => {
            let file = fs::File::create(path)
                .map_err(|e| TrackConfigError(format!("Unable to create {path}: {e}")))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout())),
    };

    Ok(Rc::new(TextTracker::new(entity_manager, writer)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_config_is_silent() {
        let tracker = setup_tracker(&TrackerConfig {
            enable: false,
            ..TrackerConfig::default()
        })
        .unwrap();
        assert!(!tracker.is_entity_enabled(crate::ROOT, log::Level::Error));
    }

    #[test]
    fn bad_filter_regex_is_rejected() {
        let result = setup_tracker(&TrackerConfig {
            filter_regex: "*(",
            ..TrackerConfig::default()
        });
        assert!(result.is_err());
    }
}
