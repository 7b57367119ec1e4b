// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! This crate provides the _track_ capabilities for the Gantry workspace.
//!
//! _Track_ means text-based human-readable messages emitted at various
//! levels of verbosity (from `Trace` through to `Error`), scoped to the
//! [`Entity`](crate::entity::Entity) that emitted them. Entities form a
//! hierarchy so that a message can always be attributed to one part of the
//! analysis pipeline (for example `gantry::graph` or `gantry::clock`).
//!
//! The _track_ events can be emitted using:
//!
//!   - a textual output based on the [log](https://docs.rs/log) crate,
//!     written to stdout or to a file.
//!   - an in-memory recorder used by tests to assert on emitted messages.

// Enable warnings for missing documentation
#![warn(missing_docs)]

pub use log;

pub mod entity;
pub mod tag;

/// Include the trackers.
pub mod tracker;
pub use tracker::{Track, Tracker};

pub mod builder;

/// A type alias for objects that receive _log_ events.
pub type Writer = Box<dyn std::io::Write>;

/// Type used for unique tags
///
/// Each _log_ event within the application is given a unique tag to identify
/// it. There are two reserved tag values: [`NO_TAG`] and [`ROOT`].
pub use tag::Tag;

/// Tag value which indicates where there is no valid tag
pub const NO_TAG: Tag = tag::Tag(0);

/// The root tag from which all other tags are derived
pub const ROOT: Tag = tag::Tag(1);

/// Base macro for log messages of all levels.
///
/// This wrapper checks whether the entity is enabled at the requested level
/// before formatting and emitting the message.
#[macro_export]
macro_rules! log_base {
    ($entity:expr ; $lvl:expr, $($arg:tt)+) => (
        if $entity.tracker.is_entity_enabled($entity.tag, $lvl) {
            $entity.tracker.log($entity.tag, $lvl, format_args!($($arg)+));
        }
    );
}

/// The `trace` macro provides a wrapper for [`log_base`] at level
/// `log::Level::Trace`
#[macro_export]
macro_rules! trace {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::log_base!($entity ; $crate::log::Level::Trace, $($arg)+);
    );
}

/// The `debug` macro provides a wrapper for [`log_base`] at level
/// `log::Level::Debug`
#[macro_export]
macro_rules! debug {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::log_base!($entity ; $crate::log::Level::Debug, $($arg)+);
    );
}

/// The `info` macro provides a wrapper for [`log_base`] at level
/// `log::Level::Info`
#[macro_export]
macro_rules! info {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::log_base!($entity ; $crate::log::Level::Info, $($arg)+);
    );
}

/// The `warn` macro provides a wrapper for [`log_base`] at level
/// `log::Level::Warn`
#[macro_export]
macro_rules! warn {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::log_base!($entity ; $crate::log::Level::Warn, $($arg)+);
    );
}

/// The `error` macro provides a wrapper for [`log_base`] at level
/// `log::Level::Error`
#[macro_export]
macro_rules! error {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::log_base!($entity ; $crate::log::Level::Error, $($arg)+);
    );
}
