use super::resolve_table_expr;
use crate::error::LineageError;
use crate::syntax::QueryBody;

/// Names of the tables a query body reads, in order of appearance.
///
/// A select without `FROM` reads nothing. Set operations read their left
/// operand's sources first, then the right's.
pub fn extract_sources(body: &QueryBody) -> Result<Vec<String>, LineageError> {
    let mut sources = Vec::new();
    let mut pending = vec![body];
    while let Some(body) = pending.pop() {
        match body {
            QueryBody::Simple { from: Some(from) } => sources.extend(resolve_table_expr(from)?),
            QueryBody::Simple { from: None } => {}
            QueryBody::Compound { left, right } => {
                pending.push(right);
                pending.push(left);
            }
            QueryBody::Other { kind } => {
                return Err(LineageError::UnresolvedQueryBody { kind: kind.clone() });
            }
        }
    }
    Ok(sources)
}
