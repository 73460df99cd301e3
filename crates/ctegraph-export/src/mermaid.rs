use std::collections::{HashMap, HashSet};

use ctegraph_core::{LineageGraph, Node, NodeKind};

/// Renders `graph` as a top-down Mermaid flowchart.
///
/// Tables are boxes, CTEs rounded boxes and the final query a stadium, so the
/// three kinds stay apart even without styling.
pub fn export_mermaid(graph: &LineageGraph) -> String {
    let ids = MermaidIds::assign(graph);
    let mut lines = vec!["flowchart TD".to_string()];

    for node in &graph.nodes {
        lines.push(format!("    {}", node_shape(ids.get(&node.id), node)));
    }

    for edge in &graph.edges {
        lines.push(format!(
            "    {} --> {}",
            ids.get(&edge.source),
            ids.get(&edge.target)
        ));
    }

    lines.join("\n")
}

fn node_shape(id: &str, node: &Node) -> String {
    let label = escape_label(&node.label);
    match node.kind {
        NodeKind::Table => format!("{id}[\"{label}\"]"),
        NodeKind::Cte => format!("{id}(\"{label}\")"),
        NodeKind::Query => format!("{id}([\"{label}\"])"),
    }
}

/// Mermaid ids for one export, distinct per node id.
///
/// Sanitizing is lossy (`a-b` and `a_b` both become `a_b`), so a clash gets a
/// numeric suffix. The result node is assigned first and keeps the bare form.
struct MermaidIds {
    by_node: HashMap<String, String>,
}

impl MermaidIds {
    fn assign(graph: &LineageGraph) -> Self {
        let mut by_node = HashMap::with_capacity(graph.nodes.len());
        let mut taken = HashSet::with_capacity(graph.nodes.len());

        let main_first = graph
            .nodes
            .iter()
            .filter(|node| node.is_main())
            .chain(graph.nodes.iter().filter(|node| !node.is_main()));
        for node in main_first {
            if by_node.contains_key(&node.id) {
                continue;
            }
            let base = sanitize_id(&node.id);
            let mut candidate = base.clone();
            let mut suffix = 2;
            while !taken.insert(candidate.clone()) {
                candidate = format!("{base}_{suffix}");
                suffix += 1;
            }
            by_node.insert(node.id.clone(), candidate);
        }

        Self { by_node }
    }

    fn get<'a>(&'a self, id: &'a str) -> &'a str {
        // Every edge endpoint is a node; fall back to the raw id otherwise.
        self.by_node.get(id).map_or(id, String::as_str)
    }
}

fn sanitize_id(id: &str) -> String {
    let sanitized: String = id
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    // Mermaid reserves `end` as a keyword.
    if sanitized.eq_ignore_ascii_case("end") {
        format!("{sanitized}_")
    } else {
        sanitized
    }
}

fn escape_label(label: &str) -> String {
    label.replace('"', "#quot;").replace('\n', " ")
}
