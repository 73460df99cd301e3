#![no_main]

use arbitrary::Arbitrary;
use ctegraph_core::{build_lineage_from_sql, Dialect};
use libfuzzer_sys::fuzz_target;

const DIALECTS: [Dialect; 4] = [
    Dialect::Bigquery,
    Dialect::Generic,
    Dialect::Postgres,
    Dialect::Snowflake,
];

#[derive(Arbitrary, Debug)]
struct Input {
    dialect: u8,
    sql: String,
}

fuzz_target!(|input: Input| {
    let dialect = DIALECTS[usize::from(input.dialect) % DIALECTS.len()];
    if let Ok(graph) = build_lineage_from_sql(&input.sql, dialect) {
        // Every edge endpoint is a node, and the final query is always one.
        assert!(graph.main_node().is_some());
        for edge in &graph.edges {
            assert!(graph.node(&edge.source).is_some());
            assert!(graph.node(&edge.target).is_some());
        }
    }
});
