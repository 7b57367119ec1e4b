// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! `gantry-graph` - the correlation graph builder
//!
//! This library consumes a decoded [`Trace`](gantry_models::trace::Trace)
//! and reconstructs the logical structure the flat event stream implies:
//! which send matches which receive, which slots belong to the same
//! collective operation and which non-blocking initiation is completed by
//! which later wait call.
//!
//! The result is a [`NodeGraph`](crate::node::NodeGraph): one
//! [`Node`](crate::node::Node) per slot, addressed per location in trace
//! order, each optionally correlated to a point-to-point or collective
//! communication and mutually linked to the other participants.
//!
//! # Example
//!
//! ```rust
//! use gantry_graph::GraphBuilder;
//! use gantry_models::schema::TraceFile;
//! use gantry_track::entity::toplevel;
//! use gantry_track::tracker::dev_null_tracker;
//!
//! let trace = TraceFile::from_string(
//!     "
//! slots:
//!   - { location: 0, region: MPI_Send, start: 10us, end: 12us }
//!   - { location: 1, region: MPI_Recv, start: 11us, end: 13us }
//! communications:
//!   - start: { location: 0, start: 10us, end: 12us, kind: blocking }
//!     end:   { location: 1, start: 11us, end: 13us, kind: blocking }
//! ",
//! )
//! .unwrap()
//! .to_trace()
//! .unwrap();
//!
//! let tracker = dev_null_tracker();
//! let top = toplevel(&tracker, "gantry");
//! let graph = GraphBuilder::new(&top).build(&trace).unwrap();
//! assert_eq!(graph.num_nodes(), 2);
//! ```

pub mod builder;
pub mod node;

pub use builder::{DEFAULT_MATCH_TOLERANCE, GraphBuilder};
pub use node::{CollectiveRef, CommRef, Correlation, Node, NodeGraph, NodeId};
