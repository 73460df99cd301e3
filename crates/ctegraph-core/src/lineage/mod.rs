//! Table-level lineage for a single query.
//!
//! Three layers, leaves first: [`resolve_table_expr`] names the base tables a
//! table expression reads, [`extract_sources`] does the same for a whole query
//! body, and [`build_lineage`] assembles both into a deduplicated graph with a
//! single `(main)` sink.

mod builder;
mod resolver;
mod sources;

pub use builder::{build_lineage, build_lineage_from_sql};
pub use resolver::resolve_table_expr;
pub use sources::extract_sources;
