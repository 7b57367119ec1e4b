// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! The rendering-ready scene description produced by the layout.
//!
//! The scene is deliberately free of any drawing-toolkit types: marks carry
//! logical columns/rows plus pixel coordinates derived from the
//! [`SceneConfig`], and every mark is tagged with the graph ids a
//! presentation layer needs to route pointer-driven selection back to the
//! underlying timed element.

use gantry_graph::{CollectiveRef, CommRef, NodeId};
use gantry_models::types::LocationRef;
use serde::{Deserialize, Serialize};

/// Geometry of the produced scene.
///
/// Passed explicitly to the layout engine at construction time; there is no
/// process-wide settings object. Deserializable so front-ends can load it
/// from a file.
#[derive(Copy, Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Horizontal distance between two columns.
    pub x_offset: i64,

    /// Vertical distance between two location rows.
    pub y_offset: i64,

    /// Radius of a node mark.
    pub radius: i64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            x_offset: 50,
            y_offset: 80,
            radius: 15,
        }
    }
}

/// Visual classification of a node mark.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeClass {
    /// The issuing endpoint of a point-to-point message.
    Send,
    /// The completing endpoint of a point-to-point message.
    Receive,
    /// A collective participant.
    Collective,
    /// A wait call completing non-blocking operations.
    Wait,
    /// Everything else, including unmatched communication slots.
    Other,
}

/// One placed node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NodeMark {
    /// The graph node this mark stands for.
    pub node: NodeId,

    /// Location of the node.
    pub location: LocationRef,

    /// Row index of the location (dense, top to bottom).
    pub row: usize,

    /// Logical happened-before column.
    pub column: i64,

    /// Centre x coordinate.
    pub x: i64,

    /// Centre y coordinate.
    pub y: i64,

    /// Radius of the mark.
    pub radius: i64,

    /// Visual classification.
    pub class: NodeClass,

    /// Region name, used for labels and tooltips.
    pub label: String,

    /// Whether the mark should be visually emphasised (blocking
    /// point-to-point endpoints).
    pub emphasised: bool,
}

/// One directed point-to-point edge from the send mark to the receive mark.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EdgeMark {
    /// The communication this edge stands for.
    pub communication: CommRef,

    /// Centre x coordinate of the issuing endpoint.
    pub from_x: i64,

    /// Centre y coordinate of the issuing endpoint.
    pub from_y: i64,

    /// Centre x coordinate of the completing endpoint.
    pub to_x: i64,

    /// Centre y coordinate of the completing endpoint.
    pub to_y: i64,
}

/// A vertical span marking one collective operation across its member rows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CollectiveMark {
    /// The collective this span stands for.
    pub collective: CollectiveRef,

    /// Shared column of all members.
    pub column: i64,

    /// X coordinate of the span.
    pub x: i64,

    /// Top y coordinate of the span.
    pub y_start: i64,

    /// Bottom y coordinate of the span.
    pub y_end: i64,
}

/// One location row with its label position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RowMark {
    /// Location of the row.
    pub location: LocationRef,

    /// Dense row index.
    pub row: usize,

    /// Y coordinate of the row line.
    pub y: i64,
}

/// What a pointer position resolves to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    /// A node mark.
    Node(NodeId),
    /// A collective span.
    Collective(CollectiveRef),
}

// Horizontal slop when hit-testing the thin collective span lines.
const LINE_SLOP: i64 = 4;

/// The full scene description handed to the presentation layer.
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct Scene {
    /// All placed nodes.
    pub nodes: Vec<NodeMark>,

    /// All point-to-point edges.
    pub edges: Vec<EdgeMark>,

    /// All collective spans.
    pub collectives: Vec<CollectiveMark>,

    /// All location rows.
    pub rows: Vec<RowMark>,
}

impl Scene {
    /// Resolve a pointer position to the element it selects, if any.
    ///
    /// Node marks take precedence over collective spans. The presentation
    /// proxy maps the returned ids back onto the timed elements of the
    /// trace.
    #[must_use]
    pub fn hit_test(&self, x: i64, y: i64) -> Option<Selection> {
        for mark in &self.nodes {
            let dx = x - mark.x;
            let dy = y - mark.y;
            if dx * dx + dy * dy <= mark.radius * mark.radius {
                return Some(Selection::Node(mark.node));
            }
        }

        for mark in &self.collectives {
            if (x - mark.x).abs() <= LINE_SLOP && (mark.y_start..=mark.y_end).contains(&y) {
                return Some(Selection::Collective(mark.collective));
            }
        }

        None
    }
}
