use ctegraph_core::LineageGraph;

use crate::ExportError;

pub fn export_json(graph: &LineageGraph, compact: bool) -> Result<String, ExportError> {
    let json = if compact {
        serde_json::to_string(graph)?
    } else {
        serde_json::to_string_pretty(graph)?
    };
    Ok(json)
}
