use crate::error::LineageError;
use crate::syntax::{AliasTarget, TableExpr};

/// Names of the base tables `expr` reads, left to right.
///
/// Joins of any depth flatten into one list in operand order. Sources the
/// model does not describe contribute nothing; an alias over such a source
/// is an error since the caller asked for a name and there is none.
pub fn resolve_table_expr(expr: &TableExpr) -> Result<Vec<String>, LineageError> {
    let mut names = Vec::new();
    // Right operands wait on the stack while the left spine is walked, so
    // chain depth costs heap, not call frames.
    let mut pending = vec![expr];
    while let Some(expr) = pending.pop() {
        match expr {
            TableExpr::Identifier(name) => names.push(name.clone()),
            TableExpr::Member(parts) => names.push(last_part(parts, expr.kind())?),
            TableExpr::Alias { target, .. } => names.push(alias_target_name(target)?),
            TableExpr::Join { left, right } => {
                pending.push(right);
                pending.push(left);
            }
            TableExpr::Other { .. } => {}
        }
    }
    Ok(names)
}

fn alias_target_name(target: &AliasTarget) -> Result<String, LineageError> {
    match target {
        AliasTarget::Identifier(name) => Ok(name.clone()),
        AliasTarget::Member(parts) => last_part(parts, target.kind()),
        AliasTarget::Other { kind } => Err(LineageError::UnresolvedTableExpr {
            kind: kind.clone(),
        }),
    }
}

/// The right-most member of a qualified name: `ds.orders` reads `orders`.
fn last_part(parts: &[String], kind: &str) -> Result<String, LineageError> {
    parts
        .last()
        .cloned()
        .ok_or_else(|| LineageError::UnresolvedTableExpr {
            kind: kind.to_string(),
        })
}
