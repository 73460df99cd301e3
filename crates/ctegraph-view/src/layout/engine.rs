//! Contract between the layout adapter and a layout engine.
//!
//! The shapes mirror the JSON graph format of layered graph-drawing engines
//! such as ELK, so an out-of-process engine can be driven by serializing a
//! [`LayoutGraph`] and deserializing a [`LayoutResult`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Option key selecting the layout algorithm.
pub const OPT_ALGORITHM: &str = "elk.algorithm";
/// Option key for the primary flow direction (`DOWN` or `RIGHT`).
pub const OPT_DIRECTION: &str = "elk.direction";
/// Option key for the minimum gap between consecutive layers.
pub const OPT_LAYER_SPACING: &str = "elk.layered.spacing.nodeNodeBetweenLayers";
/// Option key for the minimum gap between siblings in one layer.
pub const OPT_NODE_SPACING: &str = "elk.spacing.nodeNode";

/// Graph handed to a layout engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LayoutGraph {
    pub id: String,
    pub layout_options: BTreeMap<String, String>,
    pub children: Vec<LayoutNode>,
    pub edges: Vec<LayoutEdge>,
}

/// A node to place, with its size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LayoutNode {
    pub id: String,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LayoutEdge {
    pub id: String,
    pub sources: Vec<String>,
    pub targets: Vec<String>,
}

/// What an engine hands back: a coordinate per child it managed to place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LayoutResult {
    #[serde(default)]
    pub children: Vec<LaidOutNode>,
}

/// One child of a layout response. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LaidOutNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}

impl LaidOutNode {
    pub fn placed(id: impl Into<String>, x: f64, y: f64, width: f64) -> Self {
        Self {
            id: Some(id.into()),
            x: Some(x),
            y: Some(y),
            width: Some(width),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("layout engine failed: {0}")]
    Engine(String),

    #[error("invalid layout graph: {0}")]
    InvalidGraph(String),
}

/// Assigns 2-D coordinates to the children of a [`LayoutGraph`].
///
/// Engines are stateless per call; a single handle is shared by every
/// rebuild.
#[async_trait]
pub trait LayoutEngine: Send + Sync {
    async fn layout(&self, graph: LayoutGraph) -> Result<LayoutResult, LayoutError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_graph_wire_format() {
        let graph = LayoutGraph {
            id: "root".to_string(),
            layout_options: BTreeMap::from([(OPT_ALGORITHM.to_string(), "layered".to_string())]),
            children: vec![LayoutNode {
                id: "a".to_string(),
                width: 10.0,
                height: 30.0,
            }],
            edges: vec![LayoutEdge {
                id: "a->(main)".to_string(),
                sources: vec!["a".to_string()],
                targets: vec!["(main)".to_string()],
            }],
        };

        let json = serde_json::to_value(&graph).unwrap();
        assert_eq!(json["layoutOptions"]["elk.algorithm"], "layered");
        assert_eq!(json["children"][0]["width"], 10.0);
        assert_eq!(json["edges"][0]["sources"][0], "a");
    }

    #[test]
    fn test_layout_result_tolerates_missing_fields() {
        let json = r#"{"children": [{"id": "a", "x": 1.5, "y": 2}, {"x": 3}, {"id": "b"}]}"#;
        let result: LayoutResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.children.len(), 3);
        assert_eq!(result.children[0].y, Some(2.0));
        assert_eq!(result.children[1].id, None);
        assert_eq!(result.children[2].x, None);

        let empty: LayoutResult = serde_json::from_str("{}").unwrap();
        assert!(empty.children.is_empty());
    }
}
