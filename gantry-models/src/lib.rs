// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

// TODO: enable this warning to ensure all public interfaces are documented.
// Enable warnings for missing documentation
// #![warn(missing_docs)]

//! `gantry-models` - the event model of the Gantry workspace
//!
//! A decoded trace consists of:
//!
//!   - [`Slot`](crate::slot::Slot)s: timed intervals recorded per
//!     [location](crate::types::LocationRef) (one call/region occurrence),
//!   - [`Communication`](crate::communication::Communication)s: matched
//!     point-to-point messages with one endpoint event per side,
//!   - [`CollectiveCommunicationEvent`](crate::collective::CollectiveCommunicationEvent)s:
//!     one logical collective call and its member participations.
//!
//! All of it is owned by the [`Trace`](crate::trace::Trace) and immutable
//! once decoded. The [`schema`](crate::schema) module provides a YAML
//! representation of a decoded trace which doubles as the test vehicle for
//! the downstream graph builder and layout engine.

pub mod collective;
pub mod communication;
pub mod region;
pub mod schema;
pub mod slot;
pub mod trace;
pub mod types;

pub use collective::{CollectiveBucket, CollectiveCommunicationEvent, CollectiveOp, Member};
pub use communication::{Communication, CommunicationEvent, CommunicationKind};
pub use region::{Direction, Region, RegionKind, RegionRole, WaitScope};
pub use slot::Slot;
pub use trace::Trace;
pub use types::{LocationRef, TraceError, TraceResult, TraceTime};
