//! Lineage graph produced for a single query.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Reserved id of the synthetic node standing for the query's final result.
pub const MAIN_NODE_ID: &str = "(main)";

/// Display label of the synthetic result node.
pub const MAIN_NODE_LABEL: &str = "(main)";

/// What a node in the lineage graph stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A name that is read from but never defined in the query.
    Table,
    /// A common table expression declared in the `WITH` clause.
    Cte,
    /// The synthetic result of the final query body.
    Query,
}

/// A table, CTE, or the final query result.
///
/// Node identity is the `id`; a graph never holds two nodes with the same id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: NodeKind,

    pub label: String,
}

impl Node {
    pub fn table(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            id: name,
            kind: NodeKind::Table,
        }
    }

    pub fn cte(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            id: name,
            kind: NodeKind::Cte,
        }
    }

    /// The synthetic sink every final-query dependency points to.
    pub fn main() -> Self {
        Self {
            id: MAIN_NODE_ID.to_string(),
            kind: NodeKind::Query,
            label: MAIN_NODE_LABEL.to_string(),
        }
    }

    pub fn is_main(&self) -> bool {
        self.id == MAIN_NODE_ID
    }
}

/// A directed dependency edge, pointing from the table read to its reader.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// Derived from `source` and `target`, so identical input yields identical ids.
    pub id: String,
    pub source: String,
    pub target: String,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: edge_id(&source, &target),
            source,
            target,
        }
    }
}

/// Deterministic edge identifier for a `(source, target)` pair.
pub(crate) fn edge_id(source: &str, target: &str) -> String {
    format!("{source}->{target}")
}

/// Nodes and edges describing which tables and CTEs feed which.
///
/// Nodes are in discovery order; edges are in the order dependencies were
/// encountered. The same `(source, target)` pair may appear more than once
/// when a body reads the same table twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineageGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl LineageGraph {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Edges whose target is `id`, i.e. what `id` reads from.
    pub fn incoming<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |edge| edge.target == id)
    }

    /// Edges whose source is `id`, i.e. what reads from `id`.
    pub fn outgoing<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |edge| edge.source == id)
    }

    pub fn main_node(&self) -> Option<&Node> {
        self.node(MAIN_NODE_ID)
    }
}
