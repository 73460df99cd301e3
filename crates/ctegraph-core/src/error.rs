//! Error types for parsing query text and building its lineage graph.
//!
//! A lineage build is all-or-nothing: [`ParseError`] means the text did not
//! parse under the selected dialect, and the remaining [`LineageError`]
//! variants mean the syntax tree contained a shape the builder does not model.
//! Neither produces a partial graph.

use crate::types::Dialect;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// The query text could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Human-readable error message from the parser.
    pub message: String,
    /// Where the parser gave up, if it said so.
    pub position: Option<Position>,
    /// The dialect the text was parsed with.
    pub dialect: Option<Dialect>,
}

/// 1-indexed location of a parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: None,
            dialect: None,
        }
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Recovers `Line: X, Column: Y` from a `sqlparser` message.
    ///
    /// Coupled to `sqlparser`'s message format; returns `None` when the format
    /// is not found rather than guessing.
    fn position_from_message(message: &str) -> Option<Position> {
        static POSITION_REGEX: OnceLock<Regex> = OnceLock::new();
        let re = POSITION_REGEX.get_or_init(|| {
            Regex::new(r"Line:\s*(\d+)\s*,\s*Column:\s*(\d+)").expect("valid regex")
        });

        let caps = re.captures(message)?;
        let line = caps.get(1)?.as_str().parse().ok()?;
        let column = caps.get(2)?.as_str().parse().ok()?;
        Some(Position { line, column })
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parse error")?;

        if let Some(dialect) = self.dialect {
            write!(f, " ({dialect:?})")?;
        }

        if let Some(pos) = self.position {
            write!(f, " at line {}, column {}", pos.line, pos.column)?;
        }

        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for ParseError {}

impl From<sqlparser::parser::ParserError> for ParseError {
    fn from(err: sqlparser::parser::ParserError) -> Self {
        let message = err.to_string();
        let position = Self::position_from_message(&message);
        Self {
            message,
            position,
            dialect: None,
        }
    }
}

/// Failure to produce a lineage graph from query text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineageError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The text parsed but holds no query statement to trace.
    #[error("no query statement found in input")]
    NoQuery,

    /// A table expression (or an aliased expression inside one) of a kind
    /// the resolver cannot name.
    #[error("unexpected table expression kind: {kind}")]
    UnresolvedTableExpr { kind: String },

    /// A query body that is neither a plain select nor a set operation.
    #[error("unexpected query body kind: {kind}")]
    UnresolvedQueryBody { kind: String },

    /// A table or CTE uses the id held by the query-result node.
    #[error("`{name}` is reserved for the query result and cannot name a table or CTE")]
    ReservedName { name: String },
}
