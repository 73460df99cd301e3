//! CLI argument parsing using clap.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// ctegraph - CTE lineage for SQL queries
#[derive(Parser, Debug)]
#[command(name = "ctegraph")]
#[command(about = "Show which tables and CTEs a SQL query reads from", long_about = None)]
#[command(version)]
pub struct Args {
    /// SQL file to analyze (reads from stdin if omitted)
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// SQL dialect
    #[arg(short, long, default_value = "bigquery", value_enum)]
    pub dialect: DialectArg,

    /// Output format
    #[arg(short, long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    /// Compact JSON output (no pretty-printing)
    #[arg(short, long)]
    pub compact: bool,

    /// Suppress warnings and status lines on stderr
    #[arg(short, long)]
    pub quiet: bool,

    /// Re-render whenever FILE changes
    #[arg(long, requires = "file")]
    pub watch: bool,

    /// Start an HTTP server exposing the lineage API
    #[cfg(feature = "serve")]
    #[arg(long)]
    pub serve: bool,

    /// Port for HTTP server (default: 3000)
    #[cfg(feature = "serve")]
    #[arg(long, default_value = "3000")]
    pub port: u16,
}

/// SQL dialect options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DialectArg {
    Generic,
    Ansi,
    Bigquery,
    Clickhouse,
    Databricks,
    Duckdb,
    Hive,
    Mssql,
    Mysql,
    Postgres,
    Redshift,
    Snowflake,
    Sqlite,
}

impl From<DialectArg> for ctegraph_core::Dialect {
    fn from(d: DialectArg) -> Self {
        match d {
            DialectArg::Generic => ctegraph_core::Dialect::Generic,
            DialectArg::Ansi => ctegraph_core::Dialect::Ansi,
            DialectArg::Bigquery => ctegraph_core::Dialect::Bigquery,
            DialectArg::Clickhouse => ctegraph_core::Dialect::Clickhouse,
            DialectArg::Databricks => ctegraph_core::Dialect::Databricks,
            DialectArg::Duckdb => ctegraph_core::Dialect::Duckdb,
            DialectArg::Hive => ctegraph_core::Dialect::Hive,
            DialectArg::Mssql => ctegraph_core::Dialect::Mssql,
            DialectArg::Mysql => ctegraph_core::Dialect::Mysql,
            DialectArg::Postgres => ctegraph_core::Dialect::Postgres,
            DialectArg::Redshift => ctegraph_core::Dialect::Redshift,
            DialectArg::Snowflake => ctegraph_core::Dialect::Snowflake,
            DialectArg::Sqlite => ctegraph_core::Dialect::Sqlite,
        }
    }
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables of nodes and edges
    Table,
    /// Lineage graph as JSON
    Json,
    /// Mermaid flowchart
    Mermaid,
    /// Positioned nodes and edges from the built-in layered layout, as JSON
    Layout,
}
