//! Types shared by the lineage builder and its consumers.
//!
//! `Dialect` selects the parser grammar; the graph types describe the
//! table-level dependency structure of one query.

mod dialect;
mod graph;

pub use dialect::Dialect;
pub use graph::{Edge, LineageGraph, Node, NodeKind, MAIN_NODE_ID, MAIN_NODE_LABEL};
