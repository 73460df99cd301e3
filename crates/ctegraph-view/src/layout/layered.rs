//! Built-in layered layout engine.
//!
//! Good enough to draw CTE lineage without an external engine: nodes are
//! assigned to layers by longest path from the sources, ordered within a
//! layer by the average position of their predecessors, and each layer is
//! centred on the widest one. Cycles (a CTE reading a table of its own name)
//! are collapsed into one layer through the strongly connected components.

use std::collections::HashMap;

use async_trait::async_trait;
use petgraph::algo::{condensation, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction as EdgeDirection;

use super::engine::{
    LaidOutNode, LayoutEngine, LayoutError, LayoutGraph, LayoutNode, LayoutResult, OPT_DIRECTION,
    OPT_LAYER_SPACING, OPT_NODE_SPACING,
};
use super::{Direction, LayoutOptions};

#[derive(Debug, Clone, Copy, Default)]
pub struct LayeredLayout;

impl LayeredLayout {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LayoutEngine for LayeredLayout {
    async fn layout(&self, graph: LayoutGraph) -> Result<LayoutResult, LayoutError> {
        compute(&graph)
    }
}

/// Spacing and direction read from the graph's options, falling back to the
/// adapter defaults for anything missing or unparseable.
struct Settings {
    direction: Direction,
    layer_spacing: f64,
    node_spacing: f64,
}

impl Settings {
    fn from_graph(graph: &LayoutGraph) -> Self {
        let defaults = LayoutOptions::default();
        let number = |key: &str, default: f64| {
            graph
                .layout_options
                .get(key)
                .and_then(|value| value.parse::<f64>().ok())
                .filter(|value| value.is_finite() && *value >= 0.0)
                .unwrap_or(default)
        };
        Self {
            direction: graph
                .layout_options
                .get(OPT_DIRECTION)
                .and_then(|value| Direction::from_option(value))
                .unwrap_or(defaults.direction),
            layer_spacing: number(OPT_LAYER_SPACING, defaults.layer_spacing),
            node_spacing: number(OPT_NODE_SPACING, defaults.node_spacing),
        }
    }
}

fn compute(graph: &LayoutGraph) -> Result<LayoutResult, LayoutError> {
    let settings = Settings::from_graph(graph);

    let mut index: HashMap<&str, NodeIndex> = HashMap::with_capacity(graph.children.len());
    let mut dag: DiGraph<usize, ()> =
        DiGraph::with_capacity(graph.children.len(), graph.edges.len());
    for (position, child) in graph.children.iter().enumerate() {
        if index.insert(child.id.as_str(), dag.add_node(position)).is_some() {
            return Err(LayoutError::InvalidGraph(format!(
                "duplicate child id {}",
                child.id
            )));
        }
    }
    for edge in &graph.edges {
        for source in &edge.sources {
            for target in &edge.targets {
                if let (Some(&s), Some(&t)) =
                    (index.get(source.as_str()), index.get(target.as_str()))
                {
                    dag.add_edge(s, t, ());
                }
            }
        }
    }

    let layers = assign_layers(&dag)?;
    let ordered = order_layers(&dag, &layers);
    Ok(place(graph, &settings, &ordered))
}

/// Layer of every child (by child position), via longest path over the
/// component DAG.
fn assign_layers(dag: &DiGraph<usize, ()>) -> Result<Vec<usize>, LayoutError> {
    let components = condensation(dag.clone(), true);
    let order = toposort(&components, None)
        .map_err(|_| LayoutError::InvalidGraph("cycle survived condensation".to_string()))?;

    let mut component_layer = vec![0usize; components.node_count()];
    for component in order {
        let next = component_layer[component.index()] + 1;
        for successor in components.neighbors(component) {
            let layer = &mut component_layer[successor.index()];
            *layer = (*layer).max(next);
        }
    }

    let mut layers = vec![0usize; dag.node_count()];
    for component in components.node_indices() {
        for &child in &components[component] {
            layers[child] = component_layer[component.index()];
        }
    }
    Ok(layers)
}

/// Child positions grouped by layer, each layer ordered by the mean slot of
/// its predecessors in earlier layers (ties keep input order).
fn order_layers(dag: &DiGraph<usize, ()>, layers: &[usize]) -> Vec<Vec<usize>> {
    let depth = layers.iter().copied().max().map_or(0, |max| max + 1);
    let mut ordered: Vec<Vec<usize>> = vec![Vec::new(); depth];
    for (child, &layer) in layers.iter().enumerate() {
        ordered[layer].push(child);
    }

    let mut slot = vec![0usize; layers.len()];
    for layer in ordered.iter_mut() {
        let mut keyed: Vec<(f64, usize)> = layer
            .iter()
            .map(|&child| {
                let preds: Vec<usize> = dag
                    .neighbors_directed(NodeIndex::new(child), EdgeDirection::Incoming)
                    .map(|pred| pred.index())
                    .filter(|&pred| layers[pred] < layers[child])
                    .collect();
                let key = if preds.is_empty() {
                    child as f64
                } else {
                    preds.iter().map(|&pred| slot[pred] as f64).sum::<f64>() / preds.len() as f64
                };
                (key, child)
            })
            .collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        *layer = keyed.into_iter().map(|(_, child)| child).collect();
        for (position, &child) in layer.iter().enumerate() {
            slot[child] = position;
        }
    }
    ordered
}

fn place(graph: &LayoutGraph, settings: &Settings, ordered: &[Vec<usize>]) -> LayoutResult {
    let widest = ordered
        .iter()
        .map(|layer| layer_extent(graph, settings, layer))
        .fold(0.0, f64::max);

    let mut placed = vec![LaidOutNode::default(); graph.children.len()];
    let mut offset = 0.0;
    for layer in ordered {
        let mut cursor = (widest - layer_extent(graph, settings, layer)) / 2.0;
        let mut thickness: f64 = 0.0;
        for &child in layer {
            let node = &graph.children[child];
            let (along, across) = extents(settings.direction, node);
            let (x, y) = match settings.direction {
                Direction::Down => (cursor, offset),
                Direction::Right => (offset, cursor),
            };
            placed[child] = LaidOutNode::placed(node.id.clone(), x, y, node.width);
            cursor += along + settings.node_spacing;
            thickness = thickness.max(across);
        }
        offset += thickness + settings.layer_spacing;
    }

    LayoutResult { children: placed }
}

/// Size of a node along its layer, and across it (the layer's thickness).
fn extents(direction: Direction, node: &LayoutNode) -> (f64, f64) {
    match direction {
        Direction::Down => (node.width, node.height),
        Direction::Right => (node.height, node.width),
    }
}

fn layer_extent(graph: &LayoutGraph, settings: &Settings, layer: &[usize]) -> f64 {
    let sizes: f64 = layer
        .iter()
        .map(|&child| extents(settings.direction, &graph.children[child]).0)
        .sum();
    sizes + settings.node_spacing * layer.len().saturating_sub(1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutEdge;

    fn node(id: &str, width: f64) -> LayoutNode {
        LayoutNode {
            id: id.to_string(),
            width,
            height: 30.0,
        }
    }

    fn edge(source: &str, target: &str) -> LayoutEdge {
        LayoutEdge {
            id: format!("{source}->{target}"),
            sources: vec![source.to_string()],
            targets: vec![target.to_string()],
        }
    }

    fn graph(children: Vec<LayoutNode>, edges: Vec<LayoutEdge>) -> LayoutGraph {
        LayoutGraph {
            id: "root".to_string(),
            layout_options: LayoutOptions::default().to_engine_options(),
            children,
            edges,
        }
    }

    fn coords(result: &LayoutResult, id: &str) -> (f64, f64) {
        let child = result
            .children
            .iter()
            .find(|c| c.id.as_deref() == Some(id))
            .unwrap();
        (child.x.unwrap(), child.y.unwrap())
    }

    #[test]
    fn test_chain_stacks_downwards() {
        let g = graph(
            vec![node("b", 10.0), node("a", 10.0), node("(main)", 60.0)],
            vec![edge("a", "b"), edge("b", "(main)")],
        );
        let result = compute(&g).unwrap();
        assert_eq!(coords(&result, "a").1, 0.0);
        assert_eq!(coords(&result, "b").1, 130.0);
        assert_eq!(coords(&result, "(main)").1, 260.0);
    }

    #[test]
    fn test_siblings_do_not_overlap() {
        let g = graph(
            vec![node("a", 40.0), node("b", 40.0), node("(main)", 60.0)],
            vec![edge("a", "(main)"), edge("b", "(main)")],
        );
        let result = compute(&g).unwrap();
        let (ax, _) = coords(&result, "a");
        let (bx, _) = coords(&result, "b");
        assert_eq!(ax, 0.0);
        assert_eq!(bx, 120.0);
        // The lone node below is centred under the 160-wide layer.
        assert_eq!(coords(&result, "(main)").0, 50.0);
    }

    #[test]
    fn test_cycle_shares_a_layer() {
        let g = graph(
            vec![node("a", 10.0), node("(main)", 60.0)],
            vec![edge("a", "a"), edge("a", "(main)")],
        );
        let result = compute(&g).unwrap();
        assert_eq!(coords(&result, "a").1, 0.0);
        assert_eq!(coords(&result, "(main)").1, 130.0);
    }

    #[test]
    fn test_right_direction_advances_on_x() {
        let mut g = graph(vec![node("a", 10.0), node("b", 10.0)], vec![edge("a", "b")]);
        g.layout_options
            .insert(OPT_DIRECTION.to_string(), "RIGHT".to_string());
        let result = compute(&g).unwrap();
        assert_eq!(coords(&result, "a"), (0.0, 0.0));
        assert_eq!(coords(&result, "b"), (110.0, 0.0));
    }

    #[test]
    fn test_duplicate_child_ids_rejected() {
        let g = graph(vec![node("a", 10.0), node("a", 10.0)], vec![]);
        assert!(matches!(compute(&g), Err(LayoutError::InvalidGraph(_))));
    }

    #[test]
    fn test_edges_to_unknown_nodes_are_ignored() {
        let g = graph(vec![node("a", 10.0)], vec![edge("ghost", "a")]);
        let result = compute(&g).unwrap();
        assert_eq!(coords(&result, "a"), (0.0, 0.0));
    }
}
