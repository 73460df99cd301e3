//! Output formatting modules.
//!
//! JSON and Mermaid renderings of a plain lineage graph come from
//! `ctegraph-export`; this module adds the terminal tables and the JSON
//! rendering of a laid-out snapshot.

pub mod layout;
pub mod table;

pub use layout::format_layout;
pub use table::{format_snapshot, format_table};
