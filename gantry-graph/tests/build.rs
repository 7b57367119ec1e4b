// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::rc::Rc;

use gantry_graph::{Correlation, GraphBuilder, NodeGraph};
use gantry_models::schema::TraceFile;
use gantry_models::trace::Trace;
use gantry_models::types::LocationRef;
use gantry_track::entity::toplevel;
use gantry_track::Tracker;
use gantry_track::tracker::{InMemoryTracker, dev_null_tracker};

fn trace_from(yaml: &str) -> Trace {
    TraceFile::from_string(yaml).unwrap().to_trace().unwrap()
}

fn build(yaml: &str) -> NodeGraph {
    let tracker = dev_null_tracker();
    let top = toplevel(&tracker, "test");
    GraphBuilder::new(&top).build(&trace_from(yaml)).unwrap()
}

static SEND_RECV: &str = "
slots:
  - { location: 0, region: MPI_Send, start: 10us, end: 12us }
  - { location: 1, region: MPI_Recv, start: 11us, end: 13us }
communications:
  - start: { location: 0, start: 10us, end: 12us, kind: blocking }
    end:   { location: 1, start: 11us, end: 13us, kind: blocking }
";

#[test]
fn send_and_receive_are_mutually_connected() {
    let graph = build(SEND_RECV);
    assert_eq!(graph.num_nodes(), 2);

    let send = graph.nodes_at(LocationRef(0))[0];
    let recv = graph.nodes_at(LocationRef(1))[0];

    assert!(graph.node(send).has_communication());
    assert!(graph.node(recv).has_communication());
    assert_eq!(
        graph.node(send).correlation(),
        graph.node(recv).correlation()
    );

    assert_eq!(graph.node(send).connected_at(LocationRef(1)), &[recv]);
    assert_eq!(graph.node(recv).connected_at(LocationRef(0)), &[send]);
}

#[test]
fn connected_communication_rank_round_trips() {
    let graph = build(SEND_RECV);
    let send = graph.nodes_at(LocationRef(0))[0];
    let recv = graph.nodes_at(LocationRef(1))[0];

    assert_eq!(
        graph.connected_communication_rank(send).unwrap(),
        LocationRef(1)
    );
    assert_eq!(
        graph.connected_communication_rank(recv).unwrap(),
        LocationRef(0)
    );

    let comm = graph.communication_of(send).unwrap();
    assert_eq!(graph.own_event(send).unwrap().location, LocationRef(0));
    assert_eq!(
        graph.connected_event(send).unwrap().location,
        comm.end_event().location
    );
}

#[test]
fn correlation_accessors_reject_plain_nodes() {
    let graph = build(
        "
slots:
  - { location: 0, region: compute, start: 1us, end: 2us }
",
    );
    let node = graph.nodes_at(LocationRef(0))[0];
    assert!(!graph.node(node).has_communication());
    assert!(graph.communication_of(node).is_err());
    assert!(graph.collective_of(node).is_err());
    assert!(graph.connected_communication_rank(node).is_err());
}

#[test]
fn barrier_members_are_pairwise_connected() {
    let graph = build(
        "
slots:
  - { location: 0, region: MPI_Barrier, start: 9us, end: 10us }
  - { location: 1, region: MPI_Barrier, start: 9us, end: 10us }
  - { location: 2, region: MPI_Barrier, start: 9us, end: 10us }
collectives:
  - operation: barrier
    members:
      - { location: 0, start: 9us, end: 10us }
      - { location: 1, start: 9us, end: 10us }
      - { location: 2, start: 9us, end: 10us }
",
    );

    let members: Vec<_> = graph.locations().map(|l| graph.nodes_at(l)[0]).collect();
    for &a in &members {
        assert!(graph.node(a).has_collective_communication());
        for &b in &members {
            if a == b {
                continue;
            }
            let at = graph.node(a).connected_at(graph.node(b).location());
            assert!(at.contains(&b), "{a} should list {b} as connected");
        }
    }
}

#[test]
fn wait_claims_the_oldest_pending_non_blocking_node() {
    let graph = build(
        "
slots:
  - { location: 0, region: MPI_Isend, start: 1us, end: 2us }
  - { location: 0, region: MPI_Isend, start: 3us, end: 4us }
  - { location: 0, region: MPI_Wait, start: 5us, end: 6us }
",
    );

    let nodes = graph.nodes_at(LocationRef(0));
    let (first, second, wait) = (nodes[0], nodes[1], nodes[2]);

    assert_eq!(graph.node(wait).connected_at(LocationRef(0)), &[first]);
    assert_eq!(graph.node(first).connected_at(LocationRef(0)), &[wait]);
    assert!(graph.node(second).connected_nodes().is_empty());
}

#[test]
fn wait_all_drains_every_pending_node() {
    let graph = build(
        "
slots:
  - { location: 0, region: MPI_Isend, start: 1us, end: 2us }
  - { location: 0, region: MPI_Irecv, start: 3us, end: 4us }
  - { location: 0, region: MPI_Waitall, start: 5us, end: 6us }
",
    );

    let nodes = graph.nodes_at(LocationRef(0));
    let (isend, irecv, waitall) = (nodes[0], nodes[1], nodes[2]);
    assert_eq!(
        graph.node(waitall).connected_at(LocationRef(0)),
        &[isend, irecv]
    );
}

#[test]
fn wait_without_pending_operation_is_a_malformed_trace() {
    let tracker = dev_null_tracker();
    let top = toplevel(&tracker, "test");
    let trace = trace_from(
        "
slots:
  - { location: 0, region: MPI_Wait, start: 5us, end: 6us }
",
    );

    let err = GraphBuilder::new(&top).build(&trace).unwrap_err();
    assert!(format!("{err}").contains("no pending non-blocking operation"));
}

#[test]
fn count_mismatch_matches_within_tolerance_only() {
    // Two communications are queued at location 0 but only one slot exists,
    // so matching falls back to the tolerance window. The sorted queue
    // leads with the communication whose endpoint times agree with the
    // slot.
    let graph = build(
        "
slots:
  - { location: 0, region: MPI_Send, start: 10us, end: 12us }
communications:
  - start: { location: 0, start: 100ms, end: 101ms, kind: blocking }
    end:   { location: 1, start: 100ms, end: 101ms, kind: blocking }
  - start: { location: 0, start: 10us, end: 12us, kind: blocking }
    end:   { location: 1, start: 11us, end: 13us, kind: blocking }
",
    );

    let send = graph.nodes_at(LocationRef(0))[0];
    match graph.node(send).correlation() {
        Correlation::PointToPoint(comm) => {
            assert_eq!(
                graph.communication(comm).start_event().start.as_nanos(),
                10_000
            );
        }
        other => panic!("expected a point-to-point correlation, got {other:?}"),
    }
}

#[test]
fn out_of_tolerance_node_stays_plain_and_warns() {
    let tracker = Rc::new(InMemoryTracker::new(log::Level::Warn));
    let shared: Tracker = tracker.clone();
    let top = toplevel(&shared, "test");
    let trace = trace_from(
        "
slots:
  - { location: 0, region: MPI_Send, start: 10us, end: 12us }
communications:
  - start: { location: 0, start: 100ms, end: 101ms, kind: blocking }
    end:   { location: 1, start: 100ms, end: 101ms, kind: blocking }
  - start: { location: 0, start: 200ms, end: 201ms, kind: blocking }
    end:   { location: 1, start: 200ms, end: 201ms, kind: blocking }
",
    );

    let graph = GraphBuilder::new(&top).build(&trace).unwrap();
    let send = graph.nodes_at(LocationRef(0))[0];
    assert_eq!(graph.node(send).correlation(), Correlation::None);

    let warnings = tracker.messages_at(log::Level::Warn);
    assert!(
        warnings
            .iter()
            .any(|w| w.contains("matches no communication within")),
        "expected an unmatched warning, got {warnings:?}"
    );
}

#[test]
fn administrative_collectives_are_excluded() {
    let graph = build(
        "
slots:
  - { location: 0, region: MPI_Barrier, start: 9us, end: 10us }
collectives:
  - operation: create_handle
    members:
      - { location: 0, start: 9us, end: 10us }
",
    );

    let node = graph.nodes_at(LocationRef(0))[0];
    assert_eq!(graph.node(node).correlation(), Correlation::None);
}

#[test]
fn rebuilding_yields_an_identical_graph() {
    let yaml = "
slots:
  - { location: 0, region: MPI_Isend, start: 2us, end: 3us }
  - { location: 0, region: MPI_Recv, start: 4us, end: 6us }
  - { location: 0, region: MPI_Wait, start: 7us, end: 8us }
  - { location: 0, region: MPI_Barrier, start: 9us, end: 10us }
  - { location: 1, region: MPI_Isend, start: 2us, end: 3us }
  - { location: 1, region: MPI_Recv, start: 4us, end: 6us }
  - { location: 1, region: MPI_Wait, start: 7us, end: 8us }
  - { location: 1, region: MPI_Barrier, start: 9us, end: 10us }
communications:
  - start: { location: 0, start: 2us, end: 3us, kind: non_blocking }
    end:   { location: 1, start: 4us, end: 6us, kind: blocking }
  - start: { location: 1, start: 2us, end: 3us, kind: non_blocking }
    end:   { location: 0, start: 4us, end: 6us, kind: blocking }
collectives:
  - operation: barrier
    members:
      - { location: 0, start: 9us, end: 10us }
      - { location: 1, start: 9us, end: 10us }
";
    let first = build(yaml);
    let second = build(yaml);

    assert_eq!(first.num_nodes(), second.num_nodes());
    for id in first.chronological() {
        assert_eq!(
            first.node(id).correlation(),
            second.node(id).correlation(),
            "correlation of node {id} differs between runs"
        );
        assert_eq!(
            first.node(id).connected_nodes(),
            second.node(id).connected_nodes(),
            "connections of node {id} differ between runs"
        );
    }
}

#[test]
fn chronological_order_follows_slot_end_times() {
    let graph = build(
        "
slots:
  - { location: 0, region: a, start: 1us, end: 9us }
  - { location: 1, region: b, start: 1us, end: 2us }
  - { location: 2, region: c, start: 1us, end: 5us }
",
    );

    let ordered: Vec<_> = graph
        .chronological()
        .into_iter()
        .map(|id| graph.node(id).region().name.clone())
        .collect();
    assert_eq!(ordered, ["b", "c", "a"]);
}
