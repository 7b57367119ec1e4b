// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Build the correlation graph from a decoded trace.
//!
//! The builder walks every location's slot sequence once, queues the
//! communications recorded for that location and matches them to nodes in
//! deterministic chronological order. Non-blocking initiations are parked in
//! a pending-for-wait queue until a wait call claims them.

use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use gantry_models::collective::CollectiveBucket;
use gantry_models::communication::{Communication, CommunicationEvent};
use gantry_models::region::{RegionKind, WaitScope};
use gantry_models::slot::Slot;
use gantry_models::trace::Trace;
use gantry_models::trace_error;
use gantry_models::types::{LocationRef, TraceResult, TraceTime};
use gantry_track::entity::Entity;
use gantry_track::{debug, trace, warn};
use itertools::Itertools;

use crate::node::{CollectiveRef, CommRef, Correlation, Node, NodeGraph, NodeId};

/// How far a slot's recorded times may drift from its communication
/// endpoint's times and still be considered the same operation. Timestamps
/// of one logical event recorded at different locations disagree by a small
/// but bounded offset.
pub const DEFAULT_MATCH_TOLERANCE: TraceTime = TraceTime::from_micros(500);

/// Per-location pending state built up before matching.
#[derive(Default)]
struct PendingEvents {
    p2p_nodes: Vec<NodeId>,
    collective_nodes: Vec<NodeId>,
    communications: Vec<CommRef>,
    collectives: BTreeMap<CollectiveBucket, VecDeque<CollectiveRef>>,
}

/// Builds a [`NodeGraph`] from a [`Trace`].
pub struct GraphBuilder {
    entity: Rc<Entity>,
    tolerance: TraceTime,
}

impl GraphBuilder {
    /// Basic constructor
    #[must_use]
    pub fn new(parent: &Rc<Entity>) -> Self {
        Self {
            entity: Rc::new(Entity::new(parent, "graph")),
            tolerance: DEFAULT_MATCH_TOLERANCE,
        }
    }

    /// Override the matching tolerance window.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: TraceTime) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Build the correlation graph.
    ///
    /// Fails only on a malformed trace (a wait with no pending non-blocking
    /// operation). Nodes that cannot be matched to any communication stay
    /// uncorrelated and are reported as warnings.
    pub fn build(&self, trace: &Trace) -> TraceResult<NodeGraph> {
        let mut nodes: Vec<Node> = Vec::with_capacity(trace.num_slots());
        let mut by_location: BTreeMap<LocationRef, Vec<NodeId>> = BTreeMap::new();
        let mut pending: BTreeMap<LocationRef, PendingEvents> = BTreeMap::new();

        self.create_nodes(trace, &mut nodes, &mut by_location, &mut pending)?;
        self.queue_communications(trace, &mut pending);
        self.queue_collectives(trace, &mut pending);

        let mut collective_members: BTreeMap<CollectiveRef, Vec<NodeId>> = BTreeMap::new();
        self.match_pending(trace, &mut nodes, &pending, &mut collective_members);

        // Full mutual membership: every node of one collective lists every
        // other node of it.
        let mut num_collective_links = 0;
        for members in collective_members.values() {
            for (&a, &b) in members.iter().tuple_combinations() {
                connect(&mut nodes, a, b);
                num_collective_links += 1;
            }
        }

        debug!(self.entity ;
            "built {} nodes across {} locations ({} collective links)",
            nodes.len(), by_location.len(), num_collective_links);

        Ok(NodeGraph::new(
            nodes,
            by_location,
            trace.communications().to_vec(),
            trace.collective_communications().to_vec(),
            collective_members,
        ))
    }

    /// Create one node per slot and partition them into pending buckets by
    /// their region classification. Wait calls claim their non-blocking
    /// predecessors here, while slot order is still at hand.
    fn create_nodes(
        &self,
        trace: &Trace,
        nodes: &mut Vec<Node>,
        by_location: &mut BTreeMap<LocationRef, Vec<NodeId>>,
        pending: &mut BTreeMap<LocationRef, PendingEvents>,
    ) -> TraceResult<()> {
        let mut pending_for_wait: BTreeMap<LocationRef, VecDeque<NodeId>> = BTreeMap::new();

        for (&location, slots) in trace.slots() {
            for slot in slots {
                let id = NodeId(nodes.len());
                nodes.push(Node::new(slot));
                by_location.entry(location).or_default().push(id);

                match slot.region.kind {
                    RegionKind::PointToPoint { blocking, .. } => {
                        pending.entry(location).or_default().p2p_nodes.push(id);
                        if !blocking {
                            pending_for_wait.entry(location).or_default().push_back(id);
                        }
                    }
                    RegionKind::Collective(_) => {
                        pending
                            .entry(location)
                            .or_default()
                            .collective_nodes
                            .push(id);
                    }
                    RegionKind::Wait { scope } => {
                        self.claim_pending_waits(
                            nodes,
                            &mut pending_for_wait,
                            location,
                            id,
                            scope,
                            slot,
                        )?;
                    }
                    RegionKind::Function | RegionKind::Administrative => {}
                }
            }
        }
        Ok(())
    }

    /// Link a wait node to the non-blocking operation(s) it completes.
    fn claim_pending_waits(
        &self,
        nodes: &mut [Node],
        pending_for_wait: &mut BTreeMap<LocationRef, VecDeque<NodeId>>,
        location: LocationRef,
        wait: NodeId,
        scope: WaitScope,
        slot: &Rc<Slot>,
    ) -> TraceResult<()> {
        let queue = pending_for_wait.entry(location).or_default();
        if queue.is_empty() {
            return trace_error!(
                "Malformed trace: wait '{}' at location {location} has no pending \
                 non-blocking operation",
                slot.region.name
            );
        }

        let claimed: Vec<NodeId> = match scope {
            WaitScope::Single => queue.pop_front().into_iter().collect(),
            WaitScope::All => queue.drain(..).collect(),
        };

        for id in claimed {
            trace!(self.entity ; "wait {wait} completes non-blocking node {id}");
            connect(nodes, wait, id);
        }
        Ok(())
    }

    /// Queue every communication at both of its endpoint locations and sort
    /// each queue by the location's own endpoint time, establishing the
    /// deterministic per-location chronological order that matching relies
    /// on.
    fn queue_communications(
        &self,
        trace: &Trace,
        pending: &mut BTreeMap<LocationRef, PendingEvents>,
    ) {
        for (i, comm) in trace.communications().iter().enumerate() {
            let comm_ref = CommRef(i);
            let start_loc = comm.start_event().location;
            let end_loc = comm.end_event().location;

            // A self-message queues twice at its one location so that both
            // the issuing and the completing slot consume an entry.
            pending
                .entry(start_loc)
                .or_default()
                .communications
                .push(comm_ref);
            pending
                .entry(end_loc)
                .or_default()
                .communications
                .push(comm_ref);
        }

        for (&location, events) in pending.iter_mut() {
            events
                .communications
                .sort_by_key(|&comm_ref| own_time(trace.communications(), comm_ref, location));
        }
    }

    /// Queue every meaningful collective at each member's location, keyed by
    /// the operation's bucket.
    fn queue_collectives(
        &self,
        trace: &Trace,
        pending: &mut BTreeMap<LocationRef, PendingEvents>,
    ) {
        for (i, collective) in trace.collective_communications().iter().enumerate() {
            if collective.operation.is_administrative() {
                trace!(self.entity ;
                    "skipping administrative collective {i} ({:?})", collective.operation);
                continue;
            }
            let bucket = collective.operation.bucket();
            for member in collective.members() {
                pending
                    .entry(member.location)
                    .or_default()
                    .collectives
                    .entry(bucket)
                    .or_default()
                    .push_back(CollectiveRef(i));
            }
        }
    }

    /// Consume the pending queues per location and set node correlations.
    fn match_pending(
        &self,
        trace: &Trace,
        nodes: &mut Vec<Node>,
        pending: &BTreeMap<LocationRef, PendingEvents>,
        collective_members: &mut BTreeMap<CollectiveRef, Vec<NodeId>>,
    ) {
        let mut first_seen_p2p: BTreeMap<CommRef, NodeId> = BTreeMap::new();

        for (&location, events) in pending {
            // When the counts agree every node takes the front of the queue.
            // On a mismatch some communications are incomplete and a node
            // only takes the front if the recorded times agree within the
            // tolerance window.
            let counts_agree = events.p2p_nodes.len() == events.communications.len();
            let mut queue: VecDeque<CommRef> = events.communications.iter().copied().collect();

            for &id in &events.p2p_nodes {
                let Some(&comm_ref) = queue.front() else {
                    warn!(self.entity ;
                        "no communication left for '{}' at location {location}",
                        nodes[id.0].region().name);
                    continue;
                };

                let comm = &trace.communications()[comm_ref.0];
                let own = own_event(comm, location);
                if counts_agree || self.within_tolerance(nodes[id.0].slot(), own) {
                    queue.pop_front();
                    nodes[id.0].set_correlation(Correlation::PointToPoint(comm_ref));
                    match first_seen_p2p.get(&comm_ref) {
                        Some(&other) => connect(nodes, id, other),
                        None => {
                            first_seen_p2p.insert(comm_ref, id);
                        }
                    }
                } else {
                    warn!(self.entity ;
                        "'{}' at location {location} matches no communication within {}",
                        nodes[id.0].region().name, self.tolerance);
                }
            }

            let mut collectives = events.collectives.clone();
            for &id in &events.collective_nodes {
                let RegionKind::Collective(bucket) = nodes[id.0].region().kind else {
                    continue;
                };
                match collectives.get_mut(&bucket).and_then(VecDeque::pop_front) {
                    Some(collective_ref) => {
                        nodes[id.0].set_correlation(Correlation::Collective(collective_ref));
                        collective_members.entry(collective_ref).or_default().push(id);
                    }
                    None => {
                        warn!(self.entity ;
                            "no pending {bucket:?} collective for '{}' at location {location}",
                            nodes[id.0].region().name);
                    }
                }
            }
        }
    }

    fn within_tolerance(&self, slot: &Rc<Slot>, event: &CommunicationEvent) -> bool {
        slot.start.abs_diff(event.start) <= self.tolerance
            || slot.end.abs_diff(event.end) <= self.tolerance
    }
}

/// Mutually link two nodes, keyed by each other's location.
fn connect(nodes: &mut [Node], a: NodeId, b: NodeId) {
    if a == b {
        return;
    }
    let loc_a = nodes[a.0].location();
    let loc_b = nodes[b.0].location();
    nodes[a.0].add_connected(loc_b, b);
    nodes[b.0].add_connected(loc_a, a);
}

/// The time at which `location`'s own endpoint of the communication started.
fn own_time(
    communications: &[Rc<Communication>],
    comm_ref: CommRef,
    location: LocationRef,
) -> TraceTime {
    let comm = &communications[comm_ref.0];
    own_event(comm, location).start
}

/// The endpoint event of the communication recorded at `location`.
fn own_event(comm: &Communication, location: LocationRef) -> &CommunicationEvent {
    if comm.start_event().location == location {
        comm.start_event()
    } else {
        comm.end_event()
    }
}
