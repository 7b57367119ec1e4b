// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use gantry_clock::{Layout, LogicalClock, NodeClass, SceneConfig, Selection};
use gantry_graph::{GraphBuilder, NodeGraph, NodeId};
use gantry_models::schema::TraceFile;
use gantry_models::types::LocationRef;
use gantry_track::entity::toplevel;
use gantry_track::tracker::dev_null_tracker;

fn layout_of(yaml: &str) -> (NodeGraph, Layout) {
    let tracker = dev_null_tracker();
    let top = toplevel(&tracker, "test");
    let trace = TraceFile::from_string(yaml).unwrap().to_trace().unwrap();
    let graph = GraphBuilder::new(&top).build(&trace).unwrap();
    let layout = LogicalClock::new(&top, &graph, SceneConfig::default())
        .run()
        .unwrap();
    (graph, layout)
}

fn mark_of(layout: &Layout, id: NodeId) -> gantry_clock::NodeMark {
    layout
        .scene
        .nodes
        .iter()
        .find(|mark| mark.node == id)
        .unwrap_or_else(|| panic!("no mark for node {id}"))
        .clone()
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
fn receive_is_placed_after_its_send() {
    let (graph, layout) = layout_of(SEND_RECV);
    let send = graph.nodes_at(LocationRef(0))[0];
    let recv = graph.nodes_at(LocationRef(1))[0];

    let send_column = layout.column_of(send).unwrap();
    let recv_column = layout.column_of(recv).unwrap();
    assert_eq!(send_column, 1);
    assert!(recv_column > send_column);

    let send_mark = mark_of(&layout, send);
    let recv_mark = mark_of(&layout, recv);
    assert_eq!(send_mark.class, NodeClass::Send);
    assert_eq!(recv_mark.class, NodeClass::Receive);
    assert!(send_mark.emphasised);

    // One directed edge, from the send mark to the receive mark.
    assert_eq!(layout.scene.edges.len(), 1);
    let edge = &layout.scene.edges[0];
    assert_eq!((edge.from_x, edge.from_y), (send_mark.x, send_mark.y));
    assert_eq!((edge.to_x, edge.to_y), (recv_mark.x, recv_mark.y));
}

#[test]
fn receiver_visited_first_descends_into_the_sender_row() {
    // Location 0 holds the receive, so the traversal reaches it before the
    // send at location 1 and must sweep the sender's row first.
    let (graph, layout) = layout_of(
        "
slots:
  - { location: 0, region: MPI_Recv, start: 11us, end: 13us }
  - { location: 1, region: MPI_Send, start: 10us, end: 12us }
communications:
  - start: { location: 1, start: 10us, end: 12us, kind: blocking }
    end:   { location: 0, start: 11us, end: 13us, kind: blocking }
",
    );
    let recv = graph.nodes_at(LocationRef(0))[0];
    let send = graph.nodes_at(LocationRef(1))[0];

    assert_eq!(layout.column_of(send), Some(1));
    assert_eq!(layout.column_of(recv), Some(2));
    assert_eq!(layout.scene.edges.len(), 1);
}

#[test]
fn barrier_members_share_the_maximum_column() {
    let (graph, layout) = layout_of(
        "
slots:
  - { location: 0, region: setup, start: 1us, end: 2us }
  - { location: 0, region: MPI_Barrier, start: 9us, end: 10us }
  - { location: 1, region: MPI_Barrier, start: 9us, end: 10us }
  - { location: 1, region: teardown, start: 11us, end: 12us }
  - { location: 2, region: setup, start: 1us, end: 2us }
  - { location: 2, region: settle, start: 3us, end: 4us }
  - { location: 2, region: MPI_Barrier, start: 9us, end: 10us }
collectives:
  - operation: barrier
    members:
      - { location: 0, start: 9us, end: 10us }
      - { location: 1, start: 9us, end: 10us }
      - { location: 2, start: 9us, end: 10us }
",
    );

    // Natural columns would be 2, 1 and 3; all members land on 3.
    let columns: Vec<_> = graph
        .locations()
        .map(|l| {
            let member = graph
                .nodes_at(l)
                .iter()
                .copied()
                .find(|&id| graph.node(id).has_collective_communication())
                .unwrap();
            layout.column_of(member).unwrap()
        })
        .collect();
    assert_eq!(columns, [3, 3, 3]);

    assert_eq!(layout.scene.collectives.len(), 1);
    assert_eq!(layout.scene.collectives[0].column, 3);

    // The node after the barrier continues past the shared column.
    let teardown = graph.nodes_at(LocationRef(1))[1];
    assert_eq!(layout.column_of(teardown), Some(4));
}

#[test]
fn administrative_slots_consume_no_column() {
    let (graph, layout) = layout_of(
        "
slots:
  - { location: 0, region: MPI_Init, start: 0us, end: 1us }
  - { location: 0, region: compute, start: 2us, end: 3us }
",
    );
    let init = graph.nodes_at(LocationRef(0))[0];
    let compute = graph.nodes_at(LocationRef(0))[1];

    assert_eq!(layout.column_of(init), None);
    assert_eq!(layout.column_of(compute), Some(1));
    assert_eq!(layout.scene.nodes.len(), 1);
}

#[test]
fn wait_pushes_the_completion_past_its_own_column() {
    let (graph, layout) = layout_of(
        "
slots:
  - { location: 0, region: MPI_Isend, start: 2us, end: 3us }
  - { location: 0, region: MPI_Wait, start: 7us, end: 8us }
  - { location: 1, region: MPI_Recv, start: 4us, end: 6us }
communications:
  - start: { location: 0, start: 2us, end: 3us, kind: non_blocking }
    end:   { location: 1, start: 4us, end: 6us, kind: blocking }
",
    );
    let isend = graph.nodes_at(LocationRef(0))[0];
    let wait = graph.nodes_at(LocationRef(0))[1];
    let recv = graph.nodes_at(LocationRef(1))[0];

    assert_eq!(layout.column_of(isend), Some(1));
    assert_eq!(layout.column_of(wait), Some(2));
    assert!(layout.column_of(recv).unwrap() > layout.column_of(wait).unwrap());
    assert_eq!(mark_of(&layout, wait).class, NodeClass::Wait);
    assert_eq!(layout.scene.edges.len(), 1);
}

#[test]
fn self_message_emits_exactly_one_edge() {
    let (graph, layout) = layout_of(
        "
slots:
  - { location: 0, region: MPI_Send, start: 10us, end: 12us }
  - { location: 0, region: MPI_Recv, start: 13us, end: 15us }
communications:
  - start: { location: 0, start: 10us, end: 12us, kind: blocking }
    end:   { location: 0, start: 13us, end: 15us, kind: blocking }
",
    );
    let send = graph.nodes_at(LocationRef(0))[0];
    let recv = graph.nodes_at(LocationRef(0))[1];

    assert_eq!(layout.scene.edges.len(), 1);
    let edge = &layout.scene.edges[0];
    let send_mark = mark_of(&layout, send);
    let recv_mark = mark_of(&layout, recv);
    assert_eq!((edge.from_x, edge.from_y), (send_mark.x, send_mark.y));
    assert_eq!((edge.to_x, edge.to_y), (recv_mark.x, recv_mark.y));
    assert!(recv_mark.column > send_mark.column);
}

#[test]
fn columns_increase_within_every_row() {
    let (graph, layout) = layout_of(
        "
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
",
    );

    for location in graph.locations() {
        let columns: Vec<_> = graph
            .nodes_at(location)
            .iter()
            .filter_map(|&id| layout.column_of(id))
            .collect();
        assert!(
            columns.windows(2).all(|pair| pair[0] < pair[1]),
            "columns at location {location} are not increasing: {columns:?}"
        );
    }
}

#[test]
fn layout_is_deterministic() {
    let yaml = "
slots:
  - { location: 0, region: MPI_Send, start: 10us, end: 12us }
  - { location: 0, region: MPI_Barrier, start: 20us, end: 21us }
  - { location: 1, region: MPI_Recv, start: 11us, end: 13us }
  - { location: 1, region: MPI_Barrier, start: 20us, end: 21us }
communications:
  - start: { location: 0, start: 10us, end: 12us, kind: blocking }
    end:   { location: 1, start: 11us, end: 13us, kind: blocking }
collectives:
  - operation: barrier
    members:
      - { location: 0, start: 20us, end: 21us }
      - { location: 1, start: 20us, end: 21us }
";
    let (_, first) = layout_of(yaml);
    let (_, second) = layout_of(yaml);
    assert_eq!(first.scene, second.scene);
}

#[test]
fn hit_testing_resolves_node_marks() {
    let (graph, layout) = layout_of(SEND_RECV);
    let send = graph.nodes_at(LocationRef(0))[0];
    let mark = mark_of(&layout, send);

    assert_eq!(
        layout.scene.hit_test(mark.x + 3, mark.y - 3),
        Some(Selection::Node(send))
    );
    assert_eq!(layout.scene.hit_test(mark.x + 1000, mark.y), None);
}

#[test]
fn rows_are_emitted_per_location() {
    let (_, layout) = layout_of(SEND_RECV);
    assert_eq!(layout.scene.rows.len(), 2);
    assert_eq!(layout.scene.rows[0].location, LocationRef(0));
    assert_eq!(layout.scene.rows[0].y, 0);
    assert_eq!(layout.scene.rows[1].location, LocationRef(1));
    assert_eq!(layout.scene.rows[1].y, 80);
}
