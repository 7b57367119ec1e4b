// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! `gantry-clock` - the temporal layout engine
//!
//! Assigns every node of a correlation graph a deterministic logical column
//! (a happened-before index per location row), consistent with the
//! correlations the graph records:
//!
//!   - within one location, columns strictly increase in visit order,
//!   - a blocking receive is always placed at least one column after its
//!     matching send, descending into the sender's row first if necessary,
//!   - all participants of a collective share one column, the maximum any of
//!     them reached,
//!   - a wait call pushes the completion of the non-blocking operations it
//!     finishes past its own column.
//!
//! The traversal is an explicit work-stack of row sweeps rather than a
//! mutually recursive walk, so adversarial traces with cyclic correlations
//! cannot exhaust the call stack: every node descends at most once and is
//! placed exactly once.
//!
//! The output is a [`Scene`](crate::scene::Scene) of rendering-ready marks
//! plus the per-node columns.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::rc::Rc;

use gantry_graph::{CollectiveRef, CommRef, Correlation, NodeGraph, NodeId};
use gantry_models::communication::CommunicationKind;
use gantry_models::region::{Direction, RegionKind};
use gantry_models::types::{LocationRef, TraceResult};
use gantry_track::entity::Entity;
use gantry_track::{debug, trace};

pub mod scene;

pub use scene::{
    CollectiveMark, EdgeMark, NodeClass, NodeMark, RowMark, Scene, SceneConfig, Selection,
};

/// Per-location progress: the next free column and the next node index.
#[derive(Debug)]
struct RowCursor {
    next_column: i64,
    next_index: usize,
}

impl Default for RowCursor {
    fn default() -> Self {
        Self {
            next_column: 1,
            next_index: 0,
        }
    }
}

/// The first-placed endpoint of a point-to-point communication, kept until
/// the opposite endpoint is placed and the edge can be emitted.
struct PendingEdge {
    node: NodeId,
    row: usize,
    column: i64,
}

/// A collective whose members are still being placed. Marks are deferred so
/// that every member ends up on the shared final column.
struct PendingCollective {
    max_column: i64,
    row_min: usize,
    row_max: usize,
    placed: Vec<(NodeId, LocationRef, usize)>,
    expected: usize,
}

/// One traversal frame: sweep rows in ascending location order starting at
/// `current`, until the stop node is placed or every row is exhausted.
struct Sweep {
    current: Option<LocationRef>,
    stop: Option<NodeId>,
}

/// The computed layout: the scene plus the per-node logical columns.
pub struct Layout {
    /// Rendering-ready marks.
    pub scene: Scene,

    columns: Vec<Option<i64>>,
}

impl Layout {
    /// The logical column assigned to a node. `None` for administrative
    /// nodes, which consume no column.
    #[must_use]
    pub fn column_of(&self, id: NodeId) -> Option<i64> {
        self.columns[id.0]
    }

    /// The highest column assigned to any node.
    #[must_use]
    pub fn max_column(&self) -> i64 {
        self.columns.iter().flatten().copied().max().unwrap_or(0)
    }
}

/// The layout engine. Create one per graph and call
/// [`run`](LogicalClock::run).
pub struct LogicalClock<'a> {
    entity: Rc<Entity>,
    graph: &'a NodeGraph,
    config: SceneConfig,

    /// Dense row index per location.
    rows: BTreeMap<LocationRef, usize>,

    cursors: BTreeMap<LocationRef, RowCursor>,
    finished: Vec<bool>,
    descended: Vec<bool>,
    columns: Vec<Option<i64>>,
    pending_edges: BTreeMap<CommRef, PendingEdge>,
    pending_collectives: BTreeMap<CollectiveRef, PendingCollective>,
    stack: Vec<Sweep>,
    scene: Scene,
}

impl<'a> LogicalClock<'a> {
    /// Basic constructor
    #[must_use]
    pub fn new(parent: &Rc<Entity>, graph: &'a NodeGraph, config: SceneConfig) -> Self {
        let rows: BTreeMap<LocationRef, usize> = graph
            .locations()
            .enumerate()
            .map(|(row, location)| (location, row))
            .collect();
        let cursors = graph
            .locations()
            .map(|location| (location, RowCursor::default()))
            .collect();

        Self {
            entity: Rc::new(Entity::new(parent, "clock")),
            graph,
            config,
            rows,
            cursors,
            finished: vec![false; graph.num_nodes()],
            descended: vec![false; graph.num_nodes()],
            columns: vec![None; graph.num_nodes()],
            pending_edges: BTreeMap::new(),
            pending_collectives: BTreeMap::new(),
            stack: Vec::new(),
            scene: Scene::default(),
        }
    }

    /// Run the layout to completion.
    pub fn run(mut self) -> TraceResult<Layout> {
        if let Some(first) = self.graph.locations().next() {
            self.stack.push(Sweep {
                current: Some(first),
                stop: None,
            });
            while !self.stack.is_empty() {
                self.step()?;
            }
        }

        // Collectives with unmatched members never see their full
        // membership; emit them with whatever maximum was reached.
        let unfinished: Vec<CollectiveRef> = self.pending_collectives.keys().copied().collect();
        for collective in unfinished {
            self.finalize_collective(collective);
        }

        for (&location, &row) in &self.rows {
            self.scene.rows.push(RowMark {
                location,
                row,
                y: row as i64 * self.config.y_offset,
            });
        }

        debug!(self.entity ;
            "laid out {} node marks, {} edges, {} collective spans",
            self.scene.nodes.len(), self.scene.edges.len(), self.scene.collectives.len());

        Ok(Layout {
            scene: self.scene,
            columns: self.columns,
        })
    }

    /// Execute one unit of work from the top sweep: place one node, advance
    /// one row, or pop the sweep.
    fn step(&mut self) -> TraceResult<()> {
        let Some(sweep) = self.stack.last() else {
            return Ok(());
        };

        if let Some(stop) = sweep.stop
            && self.finished[stop.0]
        {
            self.stack.pop();
            return Ok(());
        }

        let Some(location) = sweep.current else {
            self.stack.pop();
            return Ok(());
        };

        let node_ids = self.graph.nodes_at(location);
        // Locations referenced by a communication but absent from the graph
        // have no cursor yet; they sweep straight through.
        let next_index = self.cursor_mut(location).next_index;
        if next_index >= node_ids.len() {
            // Row exhausted, move the sweep to the next location.
            let next_location = self
                .graph
                .by_location()
                .range((Bound::Excluded(location), Bound::Unbounded))
                .next()
                .map(|(&l, _)| l);
            self.stack.last_mut().unwrap().current = next_location;
            return Ok(());
        }

        let id = node_ids[next_index];
        if self.finished[id.0] {
            self.cursor_mut(location).next_index += 1;
            return Ok(());
        }

        self.process(location, id)
    }

    fn process(&mut self, location: LocationRef, id: NodeId) -> TraceResult<()> {
        let graph = self.graph;
        match graph.node(id).correlation() {
            Correlation::PointToPoint(comm) => self.process_point_to_point(location, id, comm),
            Correlation::Collective(collective) => {
                self.process_collective(location, id, collective);
                Ok(())
            }
            Correlation::None => {
                match graph.node(id).region().kind {
                    RegionKind::Administrative => self.finish_without_column(location, id),
                    RegionKind::Wait { .. } => self.place_wait(location, id)?,
                    // Unmatched communication slots degrade to plain nodes.
                    _ => self.place(location, id, NodeClass::Other, false),
                }
                Ok(())
            }
        }
    }

    /// Handle one endpoint of a point-to-point communication.
    fn process_point_to_point(
        &mut self,
        location: LocationRef,
        id: NodeId,
        comm: CommRef,
    ) -> TraceResult<()> {
        let graph = self.graph;
        let peer = graph.connected_communication_rank(id)?;
        let kind = graph.communication_kind_of(id)?;
        let own_is_start = match graph.node(id).region().kind {
            RegionKind::PointToPoint { direction, .. } => direction == Direction::Send,
            _ => graph.communication(comm).start_event().location == location,
        };
        self.ensure_cursor(peer);

        if !self.pending_edges.contains_key(&comm) {
            if kind.intersects(CommunicationKind::BLOCKING_POINT_TO_POINT) {
                if own_is_start {
                    // The matching receive must not be placed before us.
                    let at_least = self.cursor(location).next_column + 1;
                    let peer_cursor = self.cursor_mut(peer);
                    peer_cursor.next_column = peer_cursor.next_column.max(at_least);
                } else if !self.descended[id.0] && peer != location {
                    // Receive visited first: the sender's column is not
                    // fixed yet, so sweep the sender's row before taking a
                    // column ourselves.
                    self.descended[id.0] = true;
                    let stop = graph.node(id).connected_at(peer).first().copied();
                    trace!(self.entity ;
                        "node {id} at location {location} waits for location {peer}");
                    self.stack.push(Sweep {
                        current: Some(peer),
                        stop,
                    });
                    return Ok(());
                }
            }

            self.pending_edges.insert(
                comm,
                PendingEdge {
                    node: id,
                    row: self.row_of(location),
                    column: self.cursor(location).next_column,
                },
            );
        } else if self.pending_edges[&comm].node != id {
            // The opposite endpoint is already placed; emit the edge from
            // the send mark to the receive mark.
            let pending = &self.pending_edges[&comm];
            let (from_row, from_column) = (pending.row, pending.column);
            let (to_row, to_column) = (self.row_of(location), self.cursor(location).next_column);
            let (from_row, from_column, to_row, to_column) = if own_is_start {
                (to_row, to_column, from_row, from_column)
            } else {
                (from_row, from_column, to_row, to_column)
            };
            self.scene.edges.push(EdgeMark {
                communication: comm,
                from_x: from_column * self.config.x_offset,
                from_y: from_row as i64 * self.config.y_offset,
                to_x: to_column * self.config.x_offset,
                to_y: to_row as i64 * self.config.y_offset,
            });
        }

        let class = if own_is_start {
            NodeClass::Send
        } else {
            NodeClass::Receive
        };
        let emphasised = kind.intersects(CommunicationKind::BLOCKING_POINT_TO_POINT);
        self.place(location, id, class, emphasised);
        Ok(())
    }

    /// Handle one member of a collective communication.
    fn process_collective(&mut self, location: LocationRef, id: NodeId, collective: CollectiveRef) {
        let graph = self.graph;
        let row = self.row_of(location);
        let current_column = self.cursor(location).next_column;

        let is_initial = !self.pending_collectives.contains_key(&collective);
        let expected = graph.collective_nodes(collective).len();
        let entry = self
            .pending_collectives
            .entry(collective)
            .or_insert_with(|| PendingCollective {
                max_column: current_column,
                row_min: row,
                row_max: row,
                placed: Vec::new(),
                expected,
            });
        entry.max_column = entry.max_column.max(current_column);
        entry.row_min = entry.row_min.min(row);
        entry.row_max = entry.row_max.max(row);

        if is_initial && !self.descended[id.0] {
            // The first-visited member sweeps every other member's row so
            // the shared column reflects the true maximum.
            self.descended[id.0] = true;
            let mut sweeps = Vec::new();
            for member in graph.collective(collective).members() {
                if member.location == location {
                    continue;
                }
                let stop = graph.node(id).connected_at(member.location).first().copied();
                if let Some(target) = stop
                    && self.finished[target.0]
                {
                    continue;
                }
                sweeps.push(Sweep {
                    current: Some(member.location),
                    stop,
                });
            }
            if !sweeps.is_empty() {
                trace!(self.entity ;
                    "collective member {id} at location {location} sweeps {} other members",
                    sweeps.len());
                // Reversed so the stack processes members in member order.
                for sweep in sweeps.into_iter().rev() {
                    self.stack.push(sweep);
                }
                return;
            }
        }

        self.finished[id.0] = true;
        self.cursor_mut(location).next_index += 1;

        let entry = self.pending_collectives.get_mut(&collective).unwrap();
        entry.placed.push((id, location, row));
        let shared = entry.max_column;
        let complete = entry.placed.len() >= entry.expected;

        let cursor = self.cursor_mut(location);
        cursor.next_column = cursor.next_column.max(shared + 1);

        if complete {
            self.finalize_collective(collective);
        }
    }

    /// Emit the marks of a collective once its membership is complete: every
    /// member lands on the shared maximum column.
    fn finalize_collective(&mut self, collective: CollectiveRef) {
        let Some(entry) = self.pending_collectives.remove(&collective) else {
            return;
        };
        if entry.placed.is_empty() {
            return;
        }

        let graph = self.graph;
        let column = entry.max_column;
        for &(id, location, row) in &entry.placed {
            self.columns[id.0] = Some(column);
            self.scene.nodes.push(NodeMark {
                node: id,
                location,
                row,
                column,
                x: column * self.config.x_offset,
                y: row as i64 * self.config.y_offset,
                radius: self.config.radius,
                class: NodeClass::Collective,
                label: graph.node(id).region().name.clone(),
                emphasised: false,
            });
            let cursor = self.cursor_mut(location);
            cursor.next_column = cursor.next_column.max(column + 1);
        }

        self.scene.collectives.push(CollectiveMark {
            collective,
            column,
            x: column * self.config.x_offset,
            y_start: entry.row_min as i64 * self.config.y_offset - self.config.radius,
            y_end: entry.row_max as i64 * self.config.y_offset + self.config.radius,
        });
    }

    /// A wait completes earlier non-blocking operations: their peers'
    /// completions happen after the wait, so each peer row is pushed past
    /// the wait's own column before the wait is placed.
    fn place_wait(&mut self, location: LocationRef, id: NodeId) -> TraceResult<()> {
        let graph = self.graph;
        let own_column = self.cursor(location).next_column;

        let mut forced = Vec::new();
        for pending in graph.node(id).connected_nodes().values() {
            for &completed in pending {
                if graph.node(completed).has_communication() {
                    forced.push(graph.connected_communication_rank(completed)?);
                }
            }
        }
        for peer in forced {
            self.ensure_cursor(peer);
            let cursor = self.cursor_mut(peer);
            cursor.next_column = cursor.next_column.max(own_column + 1);
        }

        self.place(location, id, NodeClass::Wait, false);
        Ok(())
    }

    /// Place a node at the current column of its row and emit its mark.
    fn place(&mut self, location: LocationRef, id: NodeId, class: NodeClass, emphasised: bool) {
        let graph = self.graph;
        let row = self.row_of(location);
        let cursor = self.cursor_mut(location);
        let column = cursor.next_column;
        cursor.next_column += 1;
        cursor.next_index += 1;

        self.finished[id.0] = true;
        self.columns[id.0] = Some(column);
        self.scene.nodes.push(NodeMark {
            node: id,
            location,
            row,
            column,
            x: column * self.config.x_offset,
            y: row as i64 * self.config.y_offset,
            radius: self.config.radius,
            class,
            label: graph.node(id).region().name.clone(),
            emphasised,
        });
    }

    /// Administrative slots are skipped: finished, but no column consumed.
    fn finish_without_column(&mut self, location: LocationRef, id: NodeId) {
        self.finished[id.0] = true;
        self.cursor_mut(location).next_index += 1;
    }

    fn row_of(&self, location: LocationRef) -> usize {
        self.rows[&location]
    }

    fn cursor(&self, location: LocationRef) -> &RowCursor {
        &self.cursors[&location]
    }

    fn cursor_mut(&mut self, location: LocationRef) -> &mut RowCursor {
        self.cursors.entry(location).or_default()
    }

    fn ensure_cursor(&mut self, location: LocationRef) {
        self.cursors.entry(location).or_default();
    }
}
