// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! The correlation graph: an arena of nodes wrapping slots.
//!
//! Nodes and their connections are addressed by stable indices so that the
//! structure stays serializable and free of reference cycles: a node refers
//! to its peers by [`NodeId`] and to its communication by [`CommRef`] /
//! [`CollectiveRef`] into the graph's referenced vectors.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use gantry_models::collective::CollectiveCommunicationEvent;
use gantry_models::communication::{Communication, CommunicationEvent, CommunicationKind};
use gantry_models::region::Region;
use gantry_models::slot::Slot;
use gantry_models::trace_error;
use gantry_models::types::{LocationRef, TraceResult, TraceTime};
use serde::Serialize;

/// Stable index of a node within its [`NodeGraph`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

/// Stable index of a point-to-point communication within the graph.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CommRef(pub usize);

/// Stable index of a collective communication within the graph.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CollectiveRef(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The correlation a node carries, if any. A node never correlates to both a
/// point-to-point and a collective communication.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Correlation {
    /// A plain function-call node.
    #[default]
    None,
    /// One endpoint of a point-to-point communication.
    PointToPoint(CommRef),
    /// One member of a collective communication.
    Collective(CollectiveRef),
}

/// The graph wrapper around one slot.
///
/// Created once per slot during graph building; mutated only by the
/// correlation step (set the correlation, add connected nodes) and immutable
/// from then on.
#[derive(Debug)]
pub struct Node {
    slot: Rc<Slot>,
    correlation: Correlation,
    connected: BTreeMap<LocationRef, Vec<NodeId>>,
}

impl Node {
    pub(crate) fn new(slot: &Rc<Slot>) -> Self {
        Self {
            slot: slot.clone(),
            correlation: Correlation::None,
            connected: BTreeMap::new(),
        }
    }

    /// The underlying slot.
    #[must_use]
    pub fn slot(&self) -> &Rc<Slot> {
        &self.slot
    }

    /// The location the slot occurred at.
    #[must_use]
    pub fn location(&self) -> LocationRef {
        self.slot.location
    }

    /// The region the slot occurred in.
    #[must_use]
    pub fn region(&self) -> &Rc<Region> {
        &self.slot.region
    }

    /// End time of the underlying slot. Sorting by this key yields the
    /// chronological order used by consumers of the graph.
    #[must_use]
    pub fn end_time(&self) -> TraceTime {
        self.slot.end
    }

    /// The correlation this node carries.
    #[must_use]
    pub fn correlation(&self) -> Correlation {
        self.correlation
    }

    /// Whether the node correlates to a point-to-point communication.
    #[must_use]
    pub fn has_communication(&self) -> bool {
        matches!(self.correlation, Correlation::PointToPoint(_))
    }

    /// Whether the node correlates to a collective communication.
    #[must_use]
    pub fn has_collective_communication(&self) -> bool {
        matches!(self.correlation, Correlation::Collective(_))
    }

    /// The other nodes participating in the same correlated event, keyed by
    /// their location.
    #[must_use]
    pub fn connected_nodes(&self) -> &BTreeMap<LocationRef, Vec<NodeId>> {
        &self.connected
    }

    /// The connected nodes at one location, or an empty slice.
    #[must_use]
    pub fn connected_at(&self, location: LocationRef) -> &[NodeId] {
        self.connected.get(&location).map_or(&[], Vec::as_slice)
    }

    pub(crate) fn set_correlation(&mut self, correlation: Correlation) {
        self.correlation = correlation;
    }

    pub(crate) fn add_connected(&mut self, location: LocationRef, id: NodeId) {
        self.connected.entry(location).or_default().push(id);
    }
}

/// The node graph produced by the builder: all nodes, addressed per
/// location, plus references to the communications they correlate to.
///
/// The graph exclusively owns its nodes. Communications and collectives are
/// shared with the owning trace.
#[derive(Debug)]
pub struct NodeGraph {
    nodes: Vec<Node>,
    by_location: BTreeMap<LocationRef, Vec<NodeId>>,
    communications: Vec<Rc<Communication>>,
    collectives: Vec<Rc<CollectiveCommunicationEvent>>,
    collective_members: BTreeMap<CollectiveRef, Vec<NodeId>>,
}

impl NodeGraph {
    pub(crate) fn new(
        nodes: Vec<Node>,
        by_location: BTreeMap<LocationRef, Vec<NodeId>>,
        communications: Vec<Rc<Communication>>,
        collectives: Vec<Rc<CollectiveCommunicationEvent>>,
        collective_members: BTreeMap<CollectiveRef, Vec<NodeId>>,
    ) -> Self {
        Self {
            nodes,
            by_location,
            communications,
            collectives,
            collective_members,
        }
    }

    /// Access a node by its id.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Total number of nodes in the graph.
    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// The locations of the graph, in ascending order.
    pub fn locations(&self) -> impl Iterator<Item = LocationRef> + '_ {
        self.by_location.keys().copied()
    }

    /// The per-location node lists, in trace order.
    #[must_use]
    pub fn by_location(&self) -> &BTreeMap<LocationRef, Vec<NodeId>> {
        &self.by_location
    }

    /// The node ids of one location, in trace order.
    #[must_use]
    pub fn nodes_at(&self, location: LocationRef) -> &[NodeId] {
        self.by_location
            .get(&location)
            .map_or(&[], Vec::as_slice)
    }

    /// All node ids sorted chronologically by slot end time.
    #[must_use]
    pub fn chronological(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = (0..self.nodes.len()).map(NodeId).collect();
        ids.sort_by_key(|id| self.nodes[id.0].end_time());
        ids
    }

    /// Access a referenced point-to-point communication.
    #[must_use]
    pub fn communication(&self, comm: CommRef) -> &Rc<Communication> {
        &self.communications[comm.0]
    }

    /// Access a referenced collective communication.
    #[must_use]
    pub fn collective(&self, collective: CollectiveRef) -> &Rc<CollectiveCommunicationEvent> {
        &self.collectives[collective.0]
    }

    /// The nodes correlated to one collective, in the order they were
    /// matched.
    #[must_use]
    pub fn collective_nodes(&self, collective: CollectiveRef) -> &[NodeId] {
        self.collective_members
            .get(&collective)
            .map_or(&[], Vec::as_slice)
    }

    /// The communication a node correlates to.
    ///
    /// Calling this on a node without a point-to-point correlation is a
    /// contract violation and yields an error; callers must check
    /// [`Node::has_communication`] first.
    pub fn communication_of(&self, id: NodeId) -> TraceResult<&Rc<Communication>> {
        match self.node(id).correlation() {
            Correlation::PointToPoint(comm) => Ok(self.communication(comm)),
            _ => trace_error!("No point-to-point communication present for node {id}"),
        }
    }

    /// The collective communication a node correlates to.
    pub fn collective_of(&self, id: NodeId) -> TraceResult<&Rc<CollectiveCommunicationEvent>> {
        match self.node(id).correlation() {
            Correlation::Collective(collective) => Ok(self.collective(collective)),
            _ => trace_error!("No collective communication present for node {id}"),
        }
    }

    /// The behaviour bits of whichever communication the node correlates to.
    pub fn communication_kind_of(&self, id: NodeId) -> TraceResult<CommunicationKind> {
        match self.node(id).correlation() {
            Correlation::PointToPoint(comm) => {
                Ok(self.communication(comm).start_event().kind)
            }
            Correlation::Collective(collective) => {
                Ok(self.collective(collective).operation.kind())
            }
            Correlation::None => trace_error!("No communication present for node {id}"),
        }
    }

    /// The endpoint event recorded at this node's own location.
    pub fn own_event(&self, id: NodeId) -> TraceResult<&CommunicationEvent> {
        let location = self.node(id).location();
        let comm = self.communication_of(id)?;
        if comm.start_event().location == location {
            Ok(comm.start_event())
        } else {
            Ok(comm.end_event())
        }
    }

    /// The endpoint event recorded at the opposite location.
    pub fn connected_event(&self, id: NodeId) -> TraceResult<&CommunicationEvent> {
        let location = self.node(id).location();
        let comm = self.communication_of(id)?;
        if comm.start_event().location != location {
            Ok(comm.start_event())
        } else {
            Ok(comm.end_event())
        }
    }

    /// The location of the opposite endpoint of this node's communication.
    pub fn connected_communication_rank(&self, id: NodeId) -> TraceResult<LocationRef> {
        Ok(self.connected_event(id)?.location)
    }
}
