// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Region definitions and their one-time classification.
//!
//! A region names the operation a slot occurred in (for example `MPI_Send`).
//! The decoder classifies every region exactly once, so that neither the
//! graph builder nor the layout engine ever has to re-derive behaviour from
//! region-name substrings.

use serde::Deserialize;

use crate::collective::CollectiveBucket;

/// The role taxonomy recorded for a region by the trace format.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
pub enum RegionRole {
    /// A point-to-point communication operation.
    #[serde(rename = "point2point")]
    Point2Point,
    /// A barrier collective.
    #[serde(rename = "barrier")]
    Barrier,
    /// A one-to-all collective (broadcast, scatter).
    #[serde(rename = "coll_one2all")]
    CollOne2All,
    /// An all-to-one collective (gather, reduce).
    #[serde(rename = "coll_all2one")]
    CollAll2One,
    /// An all-to-all collective.
    #[serde(rename = "coll_all2all")]
    CollAll2All,
    /// Any other collective.
    #[serde(rename = "coll_other")]
    CollOther,
    /// A plain function call.
    #[serde(rename = "function")]
    Function,
}

impl RegionRole {
    /// Map a collective role onto the bucket used for pending-queue keying.
    /// Returns `None` for non-collective roles.
    #[must_use]
    pub fn bucket(self) -> Option<CollectiveBucket> {
        match self {
            RegionRole::Barrier => Some(CollectiveBucket::Barrier),
            RegionRole::CollOne2All => Some(CollectiveBucket::One2All),
            RegionRole::CollAll2One => Some(CollectiveBucket::All2One),
            RegionRole::CollAll2All => Some(CollectiveBucket::All2All),
            RegionRole::CollOther => Some(CollectiveBucket::Other),
            RegionRole::Point2Point | RegionRole::Function => None,
        }
    }

    /// Whether this role belongs to a collective operation.
    #[must_use]
    pub fn is_collective(self) -> bool {
        self.bucket().is_some()
    }
}

/// Direction of a point-to-point operation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    /// The issuing side of a message.
    Send,
    /// The completing side of a message.
    Receive,
}

/// How many outstanding non-blocking operations a wait completes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WaitScope {
    /// Completes the oldest outstanding non-blocking operation.
    Single,
    /// Drains every outstanding non-blocking operation of its location.
    All,
}

/// The refined classification of a region, produced once at decode time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RegionKind {
    /// A plain function call with no communication behaviour.
    Function,
    /// Communicator/group/handle management. These slots are skipped by the
    /// layout engine.
    Administrative,
    /// One endpoint of a point-to-point message.
    PointToPoint {
        /// Whether this endpoint issues or completes the message.
        direction: Direction,
        /// Blocking call, or a non-blocking initiation completed by a later
        /// wait.
        blocking: bool,
    },
    /// A wait call completing earlier non-blocking operations.
    Wait {
        /// Single-request wait or a wait-all style drain.
        scope: WaitScope,
    },
    /// Participation in a collective operation.
    Collective(CollectiveBucket),
}

impl RegionKind {
    /// Whether this region initiates a non-blocking point-to-point
    /// operation that a later wait must complete.
    #[must_use]
    pub fn is_non_blocking_point_to_point(self) -> bool {
        matches!(
            self,
            RegionKind::PointToPoint {
                direction: _,
                blocking: false
            }
        )
    }
}

/// A named operation with its role and refined classification.
///
/// Regions are shared between all slots that occurred in them.
#[derive(Debug)]
pub struct Region {
    /// Name of the operation, as recorded by the tracer.
    pub name: String,

    /// Role recorded by the trace format.
    pub role: RegionRole,

    /// Refined classification used by the graph builder and the layout.
    pub kind: RegionKind,
}

impl Region {
    /// Basic constructor
    #[must_use]
    pub fn new(name: &str, role: RegionRole, kind: RegionKind) -> Self {
        Self {
            name: String::from(name),
            role,
            kind,
        }
    }
}
