// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! A timed interval representing one call/region occurrence at one location.

use std::rc::Rc;

use crate::region::Region;
use crate::types::{LocationRef, TraceTime};

/// One recorded interval of the trace.
///
/// Slots are created by the decoder and never mutated afterwards. The
/// invariant `start <= end` is checked by the schema validation pass.
#[derive(Debug)]
pub struct Slot {
    /// Start time of the slot relative to the trace start time.
    pub start: TraceTime,

    /// End time of the slot relative to the trace start time.
    pub end: TraceTime,

    /// Location (thread within a rank) the slot occurred at.
    pub location: LocationRef,

    /// Region the slot occurred in.
    pub region: Rc<Region>,
}

impl Slot {
    /// Basic constructor
    #[must_use]
    pub fn new(start: TraceTime, end: TraceTime, location: LocationRef, region: &Rc<Region>) -> Self {
        Self {
            start,
            end,
            location,
            region: region.clone(),
        }
    }

    /// How long the slot lasted.
    #[must_use]
    pub fn duration(&self) -> TraceTime {
        self.end - self.start
    }
}
