pub mod error;
pub mod lineage;
pub mod parser;
pub mod syntax;
pub mod types;

// Re-export main types and functions
pub use error::{LineageError, ParseError, Position};
pub use lineage::{build_lineage, build_lineage_from_sql, extract_sources, resolve_table_expr};
pub use parser::{parse_sql, parse_sql_with_dialect};
pub use syntax::{AliasTarget, CteDefinition, LineageStatement, QueryBody, TableExpr};
pub use types::{Dialect, Edge, LineageGraph, Node, NodeKind, MAIN_NODE_ID, MAIN_NODE_LABEL};
