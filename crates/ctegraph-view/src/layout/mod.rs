//! Layout adapter: positions the nodes of a lineage graph.
//!
//! [`layout_graph`] translates a [`LineageGraph`] into the engine contract,
//! awaits the engine, and maps the coordinates back. A node the engine does
//! not place keeps its pre-layout position instead of disappearing.

mod engine;
mod layered;

use std::collections::{BTreeMap, HashMap};

use ctegraph_core::{LineageGraph, Node, NodeKind};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use engine::{
    LaidOutNode, LayoutEdge, LayoutEngine, LayoutError, LayoutGraph, LayoutNode, LayoutResult,
    OPT_ALGORITHM, OPT_DIRECTION, OPT_LAYER_SPACING, OPT_NODE_SPACING,
};
pub use layered::LayeredLayout;

/// Primary direction edges flow in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Down,
    Right,
}

impl Direction {
    fn as_option(self) -> &'static str {
        match self {
            Self::Down => "DOWN",
            Self::Right => "RIGHT",
        }
    }

    fn from_option(value: &str) -> Option<Self> {
        match value {
            "DOWN" => Some(Self::Down),
            "RIGHT" => Some(Self::Right),
            _ => None,
        }
    }
}

/// Presentation defaults for a layout run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LayoutOptions {
    pub direction: Direction,
    /// Minimum gap between consecutive layers.
    pub layer_spacing: f64,
    /// Minimum gap between neighbours within a layer.
    pub node_spacing: f64,
    pub node_height: f64,
    /// Estimated rendered width of one label character.
    pub char_width: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            direction: Direction::Down,
            layer_spacing: 100.0,
            node_spacing: 80.0,
            node_height: 30.0,
            char_width: 10.0,
        }
    }
}

impl LayoutOptions {
    pub fn node_width(&self, label: &str) -> f64 {
        self.char_width * label.chars().count() as f64
    }

    pub fn to_engine_options(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (OPT_ALGORITHM.to_string(), "layered".to_string()),
            (
                OPT_DIRECTION.to_string(),
                self.direction.as_option().to_string(),
            ),
            (OPT_LAYER_SPACING.to_string(), self.layer_spacing.to_string()),
            (OPT_NODE_SPACING.to_string(), self.node_spacing.to_string()),
        ])
    }
}

/// Canvas coordinates of a laid-out node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A lineage node with a place on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PositionedNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub label: String,
    pub position: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}

impl PositionedNode {
    /// A node before layout: at the origin, with no width hint.
    pub fn unplaced(node: &Node) -> Self {
        Self {
            id: node.id.clone(),
            kind: node.kind,
            label: node.label.clone(),
            position: Point::default(),
            width: None,
        }
    }

    fn placed(node: &Node, position: Point, width: Option<f64>) -> Self {
        Self {
            position,
            width,
            ..Self::unplaced(node)
        }
    }
}

impl LayoutGraph {
    /// Engine input for `graph`: one sized child per node, one record per edge.
    pub fn from_lineage(graph: &LineageGraph, options: &LayoutOptions) -> Self {
        Self {
            id: "root".to_string(),
            layout_options: options.to_engine_options(),
            children: graph
                .nodes
                .iter()
                .map(|node| LayoutNode {
                    id: node.id.clone(),
                    width: options.node_width(&node.label),
                    height: options.node_height,
                })
                .collect(),
            edges: graph
                .edges
                .iter()
                .map(|edge| LayoutEdge {
                    id: edge.id.clone(),
                    sources: vec![edge.source.clone()],
                    targets: vec![edge.target.clone()],
                })
                .collect(),
        }
    }
}

/// Lays out `graph` with `engine`, returning one positioned node per graph
/// node in graph order.
///
/// Response entries with no id, or an id the graph does not have, are
/// ignored. Nodes the engine leaves without a coordinate stay unplaced.
pub async fn layout_graph(
    engine: &dyn LayoutEngine,
    graph: &LineageGraph,
    options: &LayoutOptions,
) -> Result<Vec<PositionedNode>, LayoutError> {
    let input = LayoutGraph::from_lineage(graph, options);
    let result = engine.layout(input).await?;

    let placed: HashMap<&str, &LaidOutNode> = result
        .children
        .iter()
        .filter_map(|child| child.id.as_deref().map(|id| (id, child)))
        .collect();

    let mut unplaced = 0usize;
    let nodes = graph
        .nodes
        .iter()
        .map(|node| match placed.get(node.id.as_str()) {
            Some(LaidOutNode {
                x: Some(x),
                y: Some(y),
                width,
                ..
            }) => PositionedNode::placed(node, Point { x: *x, y: *y }, *width),
            _ => {
                unplaced += 1;
                PositionedNode::unplaced(node)
            }
        })
        .collect();

    if unplaced > 0 {
        debug!(unplaced, "layout engine left nodes without coordinates");
    }

    Ok(nodes)
}
