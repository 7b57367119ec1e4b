// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Point-to-point communications and their endpoint events.

use std::fmt;
use std::ops::{BitAnd, BitOr};

use crate::types::{LocationRef, TraceTime};

/// Bitset describing the behaviour of a communication event.
///
/// Kinds combine with `|` and are tested with `&` (via
/// [`intersects`](CommunicationKind::intersects)) because one event can
/// carry several properties, for example a synchronizing collective.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CommunicationKind(pub u8);

impl CommunicationKind {
    /// No recorded behaviour.
    pub const NONE: Self = Self(0);
    /// A blocking point-to-point call.
    pub const BLOCKING_POINT_TO_POINT: Self = Self(0b0000_0001);
    /// A non-blocking point-to-point initiation.
    pub const NON_BLOCKING_POINT_TO_POINT: Self = Self(0b0000_0010);
    /// A synchronizing operation (barrier-like).
    pub const SYNCHRONIZING: Self = Self(0b0000_0100);
    /// A cancelled non-blocking request.
    pub const REQUEST_CANCELLED: Self = Self(0b0000_1000);
    /// Participation in a collective operation.
    pub const COLLECTIVE: Self = Self(0b0001_0000);

    /// Whether any bit of `other` is set in `self`.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitAnd for CommunicationKind {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitOr for CommunicationKind {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for CommunicationKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut parts = Vec::new();
        if self.intersects(Self::BLOCKING_POINT_TO_POINT) {
            parts.push("blocking");
        }
        if self.intersects(Self::NON_BLOCKING_POINT_TO_POINT) {
            parts.push("non-blocking");
        }
        if self.intersects(Self::SYNCHRONIZING) {
            parts.push("synchronizing");
        }
        if self.intersects(Self::REQUEST_CANCELLED) {
            parts.push("request-cancelled");
        }
        if self.intersects(Self::COLLECTIVE) {
            parts.push("collective");
        }
        if parts.is_empty() {
            parts.push("none");
        }
        write!(f, "{}", parts.join("|"))
    }
}

/// One endpoint of a point-to-point communication, as recorded at its own
/// location.
#[derive(Debug)]
pub struct CommunicationEvent {
    /// Location the endpoint was recorded at.
    pub location: LocationRef,

    /// Start time of the call at this endpoint.
    pub start: TraceTime,

    /// End time of the call at this endpoint.
    pub end: TraceTime,

    /// Behaviour bits of this endpoint.
    pub kind: CommunicationKind,
}

impl CommunicationEvent {
    /// Basic constructor
    #[must_use]
    pub fn new(
        location: LocationRef,
        start: TraceTime,
        end: TraceTime,
        kind: CommunicationKind,
    ) -> Self {
        Self {
            location,
            start,
            end,
            kind,
        }
    }
}

/// One matched logical message: the issuing endpoint and the completing
/// endpoint.
///
/// Created by the decoder once both endpoints are known; immutable
/// thereafter. Owned by the trace and only referenced by graph nodes.
#[derive(Debug)]
pub struct Communication {
    start_event: CommunicationEvent,
    end_event: CommunicationEvent,
}

impl Communication {
    /// Basic constructor
    #[must_use]
    pub fn new(start_event: CommunicationEvent, end_event: CommunicationEvent) -> Self {
        Self {
            start_event,
            end_event,
        }
    }

    /// The issuing side of the message.
    #[must_use]
    pub fn start_event(&self) -> &CommunicationEvent {
        &self.start_event
    }

    /// The completing side of the message.
    #[must_use]
    pub fn end_event(&self) -> &CommunicationEvent {
        &self.end_event
    }
}
