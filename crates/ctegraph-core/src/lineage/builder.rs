use indexmap::IndexMap;
#[cfg(feature = "tracing")]
use tracing::{debug, info_span};

use super::extract_sources;
use crate::error::LineageError;
use crate::parser::parse_sql_with_dialect;
use crate::syntax::LineageStatement;
use crate::types::{Dialect, Edge, LineageGraph, Node, NodeKind, MAIN_NODE_ID};

/// Builds the lineage graph of one query.
///
/// For each CTE in declaration order, every table its body reads gets an edge
/// into the CTE; every table the final body reads gets an edge into the
/// `(main)` node. Nodes are unique by id with the first occurrence keeping its
/// place. Edges are not collapsed: a body that reads the same table twice
/// yields two identical edges.
///
/// A table or CTE named like the `(main)` node is rejected, so the result
/// node never has outgoing edges.
pub fn build_lineage(statement: &LineageStatement) -> Result<LineageGraph, LineageError> {
    #[cfg(feature = "tracing")]
    let _span = info_span!("build_lineage", ctes = statement.ctes.len()).entered();

    let mut graph = GraphBuilder::default();

    for cte in &statement.ctes {
        graph.add_cte(&cte.name)?;
        for parent in extract_sources(&cte.body)? {
            graph.add_dependency(parent, &cte.name)?;
        }
    }

    graph.add_main();
    for parent in extract_sources(&statement.body)? {
        graph.add_dependency(parent, MAIN_NODE_ID)?;
    }

    let graph = graph.finish();

    #[cfg(feature = "tracing")]
    debug!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "built lineage graph"
    );

    Ok(graph)
}

/// Parses `sql` and builds the lineage graph of its first query.
pub fn build_lineage_from_sql(sql: &str, dialect: Dialect) -> Result<LineageGraph, LineageError> {
    let statements = parse_sql_with_dialect(sql, dialect)?;
    let statement = LineageStatement::from_statements(&statements)?;
    build_lineage(&statement)
}

/// Accumulates nodes keyed by id (in insertion order) alongside the edge list.
#[derive(Default)]
struct GraphBuilder {
    nodes: IndexMap<String, Node>,
    edges: Vec<Edge>,
}

impl GraphBuilder {
    fn add_cte(&mut self, name: &str) -> Result<(), LineageError> {
        reject_reserved(name)?;
        self.nodes
            .entry(name.to_string())
            .and_modify(|node| node.kind = NodeKind::Cte)
            .or_insert_with(|| Node::cte(name));
        Ok(())
    }

    fn add_main(&mut self) {
        self.nodes
            .entry(MAIN_NODE_ID.to_string())
            .and_modify(|node| node.kind = NodeKind::Query)
            .or_insert_with(Node::main);
    }

    fn add_dependency(&mut self, parent: String, child: &str) -> Result<(), LineageError> {
        reject_reserved(&parent)?;
        self.edges.push(Edge::new(parent.as_str(), child));
        if !self.nodes.contains_key(&parent) {
            let node = Node::table(parent.as_str());
            self.nodes.insert(parent, node);
        }
        Ok(())
    }

    fn finish(self) -> LineageGraph {
        LineageGraph {
            nodes: self.nodes.into_values().collect(),
            edges: self.edges,
        }
    }
}

fn reject_reserved(name: &str) -> Result<(), LineageError> {
    if name == MAIN_NODE_ID {
        return Err(LineageError::ReservedName {
            name: name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{CteDefinition, QueryBody, TableExpr};

    fn ids(graph: &LineageGraph) -> Vec<&str> {
        graph.nodes.iter().map(|node| node.id.as_str()).collect()
    }

    #[test]
    fn test_main_node_follows_ctes() {
        let statement = LineageStatement {
            ctes: vec![CteDefinition::new(
                "b",
                QueryBody::select_from(TableExpr::identifier("a")),
            )],
            body: QueryBody::select_from(TableExpr::identifier("b")),
        };

        let graph = build_lineage(&statement).unwrap();
        assert_eq!(ids(&graph), vec!["b", "a", "(main)"]);
        assert_eq!(graph.edges, vec![Edge::new("a", "b"), Edge::new("b", "(main)")]);
    }

    #[test]
    fn test_table_later_declared_as_cte_becomes_cte() {
        let statement = LineageStatement {
            ctes: vec![
                CteDefinition::new("b", QueryBody::select_from(TableExpr::identifier("a"))),
                CteDefinition::new("a", QueryBody::Simple { from: None }),
            ],
            body: QueryBody::select_from(TableExpr::identifier("b")),
        };

        let graph = build_lineage(&statement).unwrap();
        assert_eq!(ids(&graph), vec!["b", "a", "(main)"]);
        assert_eq!(graph.node("a").unwrap().kind, NodeKind::Cte);
    }

    #[test]
    fn test_error_in_cte_aborts_build() {
        let statement = LineageStatement {
            ctes: vec![CteDefinition::new(
                "b",
                QueryBody::Other {
                    kind: "values".into(),
                },
            )],
            body: QueryBody::select_from(TableExpr::identifier("b")),
        };

        assert!(matches!(
            build_lineage(&statement),
            Err(LineageError::UnresolvedQueryBody { .. })
        ));
    }

    #[test]
    fn test_cte_named_like_main_is_rejected() {
        let statement = LineageStatement {
            ctes: vec![CteDefinition::new(
                MAIN_NODE_ID,
                QueryBody::select_from(TableExpr::identifier("a")),
            )],
            body: QueryBody::select_from(TableExpr::identifier(MAIN_NODE_ID)),
        };

        assert_eq!(
            build_lineage(&statement),
            Err(LineageError::ReservedName {
                name: MAIN_NODE_ID.to_string()
            })
        );
    }

    #[test]
    fn test_build_from_sql_reports_parse_errors() {
        let err = build_lineage_from_sql("SELECT * FROM", Dialect::Bigquery).unwrap_err();
        assert!(matches!(err, LineageError::Parse(_)));
    }
}
