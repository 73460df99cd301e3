//! Lowering from the `sqlparser` AST into the lineage syntax model.
//!
//! Lowering never fails: shapes the model does not describe become `Other`
//! and it is up to the resolver and extractor to decide whether that is an
//! error.

use sqlparser::ast::{
    ObjectName, Query, SetExpr, Statement, TableAlias, TableFactor, TableWithJoins,
};

use super::{AliasTarget, CteDefinition, LineageStatement, QueryBody, TableExpr};
use crate::error::LineageError;

impl LineageStatement {
    /// Lowers the first query statement in `statements`.
    ///
    /// Anything after it is ignored; lineage is traced for one query at a time.
    pub fn from_statements(statements: &[Statement]) -> Result<Self, LineageError> {
        statements
            .iter()
            .find_map(|statement| match statement {
                Statement::Query(query) => Some(Self::from_query(query)),
                _ => None,
            })
            .ok_or(LineageError::NoQuery)
    }

    pub fn from_query(query: &Query) -> Self {
        let ctes = query
            .with
            .as_ref()
            .map(|with| {
                with.cte_tables
                    .iter()
                    .map(|cte| {
                        CteDefinition::new(
                            cte.alias.name.value.clone(),
                            lower_body(&cte.query.body),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            ctes,
            body: lower_body(&query.body),
        }
    }
}

fn lower_body(body: &SetExpr) -> QueryBody {
    match body {
        SetExpr::Select(select) => QueryBody::Simple {
            from: lower_from(&select.from),
        },
        SetExpr::SetOperation { left, right, .. } => {
            QueryBody::compound(lower_body(left), lower_body(right))
        }
        // Parentheses around a body carry no lineage of their own.
        SetExpr::Query(query) => lower_body(&query.body),
        SetExpr::Values(_) => other_body("values"),
        SetExpr::Insert(_) => other_body("insert_stmt"),
        SetExpr::Update(_) => other_body("update_stmt"),
        SetExpr::Delete(_) => other_body("delete_stmt"),
        SetExpr::Merge(_) => other_body("merge_stmt"),
        SetExpr::Table(_) => other_body("table_stmt"),
    }
}

fn other_body(kind: &str) -> QueryBody {
    QueryBody::Other {
        kind: kind.to_string(),
    }
}

/// Comma-separated `FROM` items are folded into the same left-leaning chain
/// as explicit joins.
fn lower_from(from: &[TableWithJoins]) -> Option<TableExpr> {
    from.iter().map(lower_table_with_joins).reduce(TableExpr::join)
}

fn lower_table_with_joins(table: &TableWithJoins) -> TableExpr {
    table
        .joins
        .iter()
        .fold(lower_factor(&table.relation), |left, join| {
            TableExpr::join(left, lower_factor(&join.relation))
        })
}

fn lower_factor(factor: &TableFactor) -> TableExpr {
    match factor {
        TableFactor::Table {
            name, alias, args, ..
        } => {
            let target = match (args, object_name_parts(name)) {
                (None, Some(parts)) => name_target(parts),
                _ => other_target("table_function"),
            };
            apply_alias(target, alias.as_ref())
        }
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => lower_table_with_joins(table_with_joins),
        TableFactor::Derived { alias, .. } => apply_alias(other_target("derived"), alias.as_ref()),
        TableFactor::TableFunction { alias, .. } => {
            apply_alias(other_target("table_function"), alias.as_ref())
        }
        TableFactor::Function { alias, .. } => {
            apply_alias(other_target("function"), alias.as_ref())
        }
        TableFactor::UNNEST { alias, .. } => apply_alias(other_target("unnest"), alias.as_ref()),
        _ => TableExpr::Other {
            kind: "table_factor".to_string(),
        },
    }
}

fn other_target(kind: &str) -> AliasTarget {
    AliasTarget::Other {
        kind: kind.to_string(),
    }
}

fn name_target(mut parts: Vec<String>) -> AliasTarget {
    if parts.len() == 1 {
        AliasTarget::Identifier(parts.remove(0))
    } else {
        AliasTarget::Member(parts)
    }
}

fn apply_alias(target: AliasTarget, alias: Option<&TableAlias>) -> TableExpr {
    match alias {
        Some(alias) => TableExpr::Alias {
            target,
            alias: alias.name.value.clone(),
        },
        None => match target {
            AliasTarget::Identifier(name) => TableExpr::Identifier(name),
            AliasTarget::Member(parts) => TableExpr::Member(parts),
            AliasTarget::Other { kind } => TableExpr::Other { kind },
        },
    }
}

/// Name parts of a table reference, with BigQuery's backquoted
/// `project.dataset.table` paths split on dots.
fn object_name_parts(name: &ObjectName) -> Option<Vec<String>> {
    let mut parts = Vec::with_capacity(name.0.len());
    for part in &name.0 {
        let ident = part.as_ident()?;
        if ident.quote_style == Some('`') && ident.value.contains('.') {
            parts.extend(ident.value.split('.').map(str::to_string));
        } else {
            parts.push(ident.value.clone());
        }
    }
    (!parts.is_empty()).then_some(parts)
}
