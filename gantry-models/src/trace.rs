// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! The owning container for a decoded trace.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::collective::CollectiveCommunicationEvent;
use crate::communication::Communication;
use crate::slot::Slot;
use crate::types::{LocationRef, TraceTime};

/// A fully decoded trace.
///
/// The trace owns every slot, communication and collective. Downstream
/// consumers (the correlation graph, the layout engine) hold `Rc` references
/// and never mutate any of it.
#[derive(Debug, Default)]
pub struct Trace {
    slots: BTreeMap<LocationRef, Vec<Rc<Slot>>>,
    communications: Vec<Rc<Communication>>,
    collectives: Vec<Rc<CollectiveCommunicationEvent>>,
    duration: TraceTime,
}

impl Trace {
    /// Build a trace from decoded parts. The per-location slot vectors must
    /// be in trace order; the total duration is derived from the latest slot
    /// end time.
    #[must_use]
    pub fn new(
        slots: BTreeMap<LocationRef, Vec<Rc<Slot>>>,
        communications: Vec<Rc<Communication>>,
        collectives: Vec<Rc<CollectiveCommunicationEvent>>,
    ) -> Self {
        let duration = slots
            .values()
            .flatten()
            .map(|slot| slot.end)
            .max()
            .unwrap_or(TraceTime::ZERO);
        Self {
            slots,
            communications,
            collectives,
            duration,
        }
    }

    /// Per-location slot sequences, in trace order.
    #[must_use]
    pub fn slots(&self) -> &BTreeMap<LocationRef, Vec<Rc<Slot>>> {
        &self.slots
    }

    /// All matched point-to-point communications.
    #[must_use]
    pub fn communications(&self) -> &[Rc<Communication>] {
        &self.communications
    }

    /// All collective communications.
    #[must_use]
    pub fn collective_communications(&self) -> &[Rc<CollectiveCommunicationEvent>] {
        &self.collectives
    }

    /// Runtime of the entire trace.
    #[must_use]
    pub fn duration(&self) -> TraceTime {
        self.duration
    }

    /// Total number of slots across all locations.
    #[must_use]
    pub fn num_slots(&self) -> usize {
        self.slots.values().map(Vec::len).sum()
    }
}
