// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Shared types.

use std::error::Error;
use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// Build a [`TraceError`] from a format string
#[macro_export]
macro_rules! trace_error {
    ($($arg:tt)+) => {
        Err($crate::types::TraceError(format!($($arg)+)))
    };
}

/// The `TraceError` is what should be returned in the case of an error
#[derive(Debug)]
pub struct TraceError(pub String);

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Error: {}", self.0)
    }
}

impl Error for TraceError {}

/// The `TraceResult` is the return type for most fallible trace functions
pub type TraceResult<T> = Result<T, TraceError>;

/// A point in time relative to the start of the trace, in nanoseconds.
///
/// Timestamps are monotonic within one location but only approximately
/// aligned across locations, which is why matching uses a tolerance window
/// rather than exact comparison.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TraceTime(pub u64);

impl TraceTime {
    /// Zero point of the trace.
    pub const ZERO: Self = Self(0);

    /// Build a time from nanoseconds since trace start.
    #[must_use]
    pub const fn from_nanos(ns: u64) -> Self {
        Self(ns)
    }

    /// Build a time from microseconds since trace start.
    #[must_use]
    pub const fn from_micros(us: u64) -> Self {
        Self(us * 1_000)
    }

    /// Build a time from milliseconds since trace start.
    #[must_use]
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms * 1_000_000)
    }

    /// Nanoseconds since trace start.
    #[must_use]
    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    /// Absolute distance between two times.
    #[must_use]
    pub const fn abs_diff(self, other: Self) -> Self {
        Self(self.0.abs_diff(other.0))
    }
}

impl Add for TraceTime {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for TraceTime {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for TraceTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0 >= 1_000_000 && self.0 % 1_000_000 == 0 {
            write!(f, "{}ms", self.0 / 1_000_000)
        } else if self.0 >= 1_000 && self.0 % 1_000 == 0 {
            write!(f, "{}us", self.0 / 1_000)
        } else {
            write!(f, "{}ns", self.0)
        }
    }
}

/// Reference to an addressable execution context (a thread within a rank).
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct LocationRef(pub u64);

impl fmt::Display for LocationRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
