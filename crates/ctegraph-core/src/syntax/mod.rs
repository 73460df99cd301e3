//! Closed syntax model consumed by the lineage builder.
//!
//! The parser's AST is far richer than what table-level lineage needs. It is
//! lowered into the handful of shapes below, each with an explicit `Other`
//! case, so the resolver and extractor dispatch with exhaustive matches and
//! unmodelled input is a visible case instead of a silent fallthrough.

mod lower;

/// The data source portion of a query body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableExpr {
    /// A bare, unqualified name: `FROM orders`.
    Identifier(String),
    /// A bare qualified name: `FROM shop.orders`. Parts are left to right.
    Member(Vec<String>),
    /// A named expression: `FROM orders AS o`.
    Alias { target: AliasTarget, alias: String },
    /// Two table expressions joined; chains lean left and may be thousands
    /// of levels deep, so nothing walks them recursively.
    Join {
        left: Box<TableExpr>,
        right: Box<TableExpr>,
    },
    /// Any source the lineage model does not describe.
    Other { kind: String },
}

/// The expression wrapped by an alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasTarget {
    Identifier(String),
    Member(Vec<String>),
    Other { kind: String },
}

/// One query body: a plain select or a set operation over two bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryBody {
    Simple { from: Option<TableExpr> },
    Compound {
        left: Box<QueryBody>,
        right: Box<QueryBody>,
    },
    Other { kind: String },
}

/// A common table expression: its name and the body that defines it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CteDefinition {
    pub name: String,
    pub body: QueryBody,
}

/// A full query: CTE definitions in declaration order plus the final body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineageStatement {
    pub ctes: Vec<CteDefinition>,
    pub body: QueryBody,
}

impl TableExpr {
    pub fn identifier(name: impl Into<String>) -> Self {
        Self::Identifier(name.into())
    }

    /// `name AS alias` over a plain identifier.
    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::Alias {
            target: AliasTarget::Identifier(name.into()),
            alias: alias.into(),
        }
    }

    pub fn join(left: TableExpr, right: TableExpr) -> Self {
        Self::Join {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            Self::Identifier(_) => "identifier",
            Self::Member(_) => "member_expr",
            Self::Alias { .. } => "alias",
            Self::Join { .. } => "join_expr",
            Self::Other { kind } => kind,
        }
    }
}

impl Drop for TableExpr {
    fn drop(&mut self) {
        // Detach join operands onto a heap stack so a long chain is freed
        // without one stack frame per join.
        let mut pending = Vec::new();
        detach_operands(self, &mut pending);
        while let Some(mut expr) = pending.pop() {
            detach_operands(&mut expr, &mut pending);
        }
    }
}

fn detach_operands(expr: &mut TableExpr, pending: &mut Vec<TableExpr>) {
    if let TableExpr::Join { left, right } = expr {
        pending.push(std::mem::replace(&mut **left, TableExpr::leaf()));
        pending.push(std::mem::replace(&mut **right, TableExpr::leaf()));
    }
}

impl TableExpr {
    /// Placeholder left behind by [`detach_operands`]; allocates nothing.
    fn leaf() -> Self {
        Self::Other {
            kind: String::new(),
        }
    }
}

impl AliasTarget {
    pub fn kind(&self) -> &str {
        match self {
            Self::Identifier(_) => "identifier",
            Self::Member(_) => "member_expr",
            Self::Other { kind } => kind,
        }
    }
}

impl QueryBody {
    pub fn select_from(from: TableExpr) -> Self {
        Self::Simple { from: Some(from) }
    }

    pub fn compound(left: QueryBody, right: QueryBody) -> Self {
        Self::Compound {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            Self::Simple { .. } => "select_stmt",
            Self::Compound { .. } => "compound_select_stmt",
            Self::Other { kind } => kind,
        }
    }
}

impl CteDefinition {
    pub fn new(name: impl Into<String>, body: QueryBody) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }
}
