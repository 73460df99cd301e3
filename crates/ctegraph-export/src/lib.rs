//! Text exports for ctegraph lineage graphs.
//!
//! Renders a `LineageGraph` as JSON or as a Mermaid flowchart.

mod error;
mod json;
mod mermaid;

pub use error::ExportError;
pub use json::export_json;
pub use mermaid::export_mermaid;
