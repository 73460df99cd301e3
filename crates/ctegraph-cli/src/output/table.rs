//! Human-readable table output formatting.

use ctegraph_core::{LineageGraph, NodeKind};
use ctegraph_view::Snapshot;
use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "Node")]
    id: String,
    #[tabled(rename = "Type")]
    kind: &'static str,
    #[tabled(rename = "Reads from")]
    reads: String,
}

#[derive(Tabled)]
struct PlacedRow {
    #[tabled(rename = "Node")]
    id: String,
    #[tabled(rename = "Type")]
    kind: &'static str,
    #[tabled(rename = "X")]
    x: String,
    #[tabled(rename = "Y")]
    y: String,
}

/// Format the lineage graph as text with optional colors.
///
/// One row per node, in discovery order, listing the sources it reads.
pub fn format_table(graph: &LineageGraph, use_colors: bool) -> String {
    let colored = use_colors && std::io::stdout().is_terminal();

    let rows = graph.nodes.iter().map(|node| NodeRow {
        id: node.id.clone(),
        kind: kind_name(node.kind),
        reads: graph
            .incoming(&node.id)
            .map(|edge| edge.source.as_str())
            .collect::<Vec<_>>()
            .join(", "),
    });

    let summary = format!(
        "{} nodes | {} edges | {} CTEs",
        graph.nodes.len(),
        graph.edges.len(),
        graph
            .nodes
            .iter()
            .filter(|node| node.kind == NodeKind::Cte)
            .count()
    );

    render(&summary, Table::new(rows), colored)
}

/// Format a laid-out snapshot: every node with its position.
pub fn format_snapshot(snapshot: &Snapshot, use_colors: bool) -> String {
    let colored = use_colors && std::io::stdout().is_terminal();

    let rows = snapshot.nodes.iter().map(|node| PlacedRow {
        id: node.id.clone(),
        kind: kind_name(node.kind),
        x: format!("{:.0}", node.position.x),
        y: format!("{:.0}", node.position.y),
    });

    let summary = format!(
        "{} nodes | {} edges",
        snapshot.nodes.len(),
        snapshot.edges.len()
    );

    render(&summary, Table::new(rows), colored)
}

fn render(summary: &str, mut table: Table, colored: bool) -> String {
    let title = "ctegraph lineage";
    let line = "═".repeat(50);
    table.with(Style::rounded());

    let lines = if colored {
        vec![
            title.bold().to_string(),
            line.dimmed().to_string(),
            summary.cyan().to_string(),
            String::new(),
            table.to_string(),
        ]
    } else {
        vec![
            title.to_string(),
            line,
            summary.to_string(),
            String::new(),
            table.to_string(),
        ]
    };
    lines.join("\n")
}

fn kind_name(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Table => "table",
        NodeKind::Cte => "cte",
        NodeKind::Query => "query",
    }
}
