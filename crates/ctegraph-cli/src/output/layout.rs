//! JSON output for laid-out graphs.

use anyhow::{Context, Result};
use ctegraph_view::Snapshot;

/// Format positioned nodes and edges as JSON.
///
/// If `compact` is true, outputs minified JSON without whitespace.
pub fn format_layout(snapshot: &Snapshot, compact: bool) -> Result<String> {
    let json = if compact {
        serde_json::to_string(snapshot)
    } else {
        serde_json::to_string_pretty(snapshot)
    };
    json.context("Failed to serialize layout")
}
