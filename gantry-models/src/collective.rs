// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Collective operations and their member participations.

use serde::Deserialize;

use crate::communication::CommunicationKind;
use crate::types::{LocationRef, TraceTime};

/// The fixed enumeration of collective operations a trace can record.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectiveOp {
    Barrier,
    Broadcast,
    Scatter,
    Scatterv,
    Gather,
    Gatherv,
    Reduce,
    AllGather,
    AllGatherv,
    AllToAll,
    AllToAllv,
    AllToAllw,
    AllReduce,
    ReduceScatter,
    ReduceScatterBlock,
    Scan,
    Exscan,
    CreateHandle,
    DestroyHandle,
    Allocate,
    Deallocate,
    CreateHandleAndAllocate,
    DestroyHandleAndDeallocate,
}

/// The bucket a collective operation is queued under when matching pending
/// slots to operations. The same buckets key the region-role side, so both
/// sides of the match use one consistent mapping.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum CollectiveBucket {
    /// Barrier operations.
    Barrier,
    /// One-to-all operations (broadcast, scatter).
    One2All,
    /// All-to-one operations (gather, reduce).
    All2One,
    /// All-to-all operations.
    All2All,
    /// Any other meaningful collective.
    Other,
    /// Handle/allocation management. Not a communication; excluded from
    /// matching entirely.
    Administrative,
}

impl CollectiveOp {
    /// Map the operation onto its pending-queue bucket.
    #[must_use]
    pub fn bucket(self) -> CollectiveBucket {
        match self {
            CollectiveOp::Barrier => CollectiveBucket::Barrier,
            CollectiveOp::Broadcast | CollectiveOp::Scatter | CollectiveOp::Scatterv => {
                CollectiveBucket::One2All
            }
            CollectiveOp::Gather | CollectiveOp::Gatherv | CollectiveOp::Reduce => {
                CollectiveBucket::All2One
            }
            CollectiveOp::AllGather
            | CollectiveOp::AllGatherv
            | CollectiveOp::AllToAll
            | CollectiveOp::AllToAllv
            | CollectiveOp::AllToAllw
            | CollectiveOp::AllReduce
            | CollectiveOp::ReduceScatter
            | CollectiveOp::ReduceScatterBlock
            | CollectiveOp::Scan
            | CollectiveOp::Exscan => CollectiveBucket::All2All,
            CollectiveOp::CreateHandle
            | CollectiveOp::DestroyHandle
            | CollectiveOp::Allocate
            | CollectiveOp::Deallocate
            | CollectiveOp::CreateHandleAndAllocate
            | CollectiveOp::DestroyHandleAndDeallocate => CollectiveBucket::Administrative,
        }
    }

    /// Whether this operation is handle/allocation management rather than a
    /// communication.
    #[must_use]
    pub fn is_administrative(self) -> bool {
        self.bucket() == CollectiveBucket::Administrative
    }

    /// The communication behaviour of the operation.
    #[must_use]
    pub fn kind(self) -> CommunicationKind {
        match self.bucket() {
            CollectiveBucket::Barrier => {
                CommunicationKind::SYNCHRONIZING | CommunicationKind::COLLECTIVE
            }
            _ => CommunicationKind::COLLECTIVE,
        }
    }
}

/// One location's participation in a collective operation.
#[derive(Debug)]
pub struct Member {
    /// Location of the participant.
    pub location: LocationRef,

    /// Start time of the participation.
    pub start: TraceTime,

    /// End time of the participation.
    pub end: TraceTime,
}

impl Member {
    /// Basic constructor
    #[must_use]
    pub fn new(location: LocationRef, start: TraceTime, end: TraceTime) -> Self {
        Self {
            location,
            start,
            end,
        }
    }
}

/// One logical collective call and the participations recorded for it.
///
/// Created once per logical collective; immutable. Owned by the trace and
/// only referenced by graph nodes.
#[derive(Debug)]
pub struct CollectiveCommunicationEvent {
    /// The collective operation performed.
    pub operation: CollectiveOp,

    /// Root rank for rooted operations. For non-rooted operations the
    /// decoder records the lowest member location.
    pub root: LocationRef,

    members: Vec<Member>,
}

impl CollectiveCommunicationEvent {
    /// Basic constructor
    #[must_use]
    pub fn new(operation: CollectiveOp, root: LocationRef, members: Vec<Member>) -> Self {
        Self {
            operation,
            root,
            members,
        }
    }

    /// The recorded participations, in decode order.
    #[must_use]
    pub fn members(&self) -> &[Member] {
        &self.members
    }
}
