use crate::DataType;
use crate::criteria::{Criteria, Direction};
use crate::error::{Error, Result};
use crate::query::Query;
use crate::schema::Schema;

/// Build the primary key lookup: `SELECT * FROM <table> WHERE pk = ?`.
#[must_use]
pub fn find_by_id<E>(schema: &Schema<E>, id: DataType) -> Query {
    let sql = format!("SELECT * FROM {} WHERE {} = ?", schema.table(), schema.primary_key().column());

    tracing::debug!(table = schema.table(), sql = %sql, param_count = 1, "find_by_id generated SQL");

    Query {
        sql,
        params: vec![id],
    }
}

/// Append `LIMIT 1` to a caller supplied query. The fragment is passed
/// through untouched, so it must be a complete `SELECT` including its `FROM`.
#[must_use]
pub fn find_first(sql: &str, params: Vec<DataType>) -> Query {
    let sql = format!("{sql} LIMIT 1");

    tracing::debug!(sql = %sql, param_count = params.len(), "find_first generated SQL");

    Query { sql, params }
}

/// Build a multi-predicate query:
///
/// ```text
/// SELECT * FROM <table> WHERE 1 = 1 AND c_k = ? … ORDER BY c_o <dir> LIMIT ?
/// ```
///
/// Predicates appear in `criteria` order; the row limit is the last parameter.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `size` is zero or a field name is
/// empty or unknown.
pub fn find_by_map<E>(
    schema: &Schema<E>, criteria: &Criteria, order_field: &str, direction: Direction, size: u32,
) -> Result<Query> {
    if size == 0 {
        return Err(Error::InvalidArgument("size must be at least 1".to_string()));
    }
    let order_column = schema.resolve(order_field)?.column();
    let predicates = criteria.resolve(schema)?;

    let mut clauses = Vec::with_capacity(predicates.len() + 1);
    let mut params = Vec::with_capacity(predicates.len() + 1);
    clauses.push("1 = 1".to_string());
    for (column, value) in predicates {
        clauses.push(format!("{column} = ?"));
        params.push(value);
    }
    params.push(DataType::from(size));

    let sql = format!(
        "SELECT * FROM {} WHERE {} ORDER BY {order_column} {direction} LIMIT ?",
        schema.table(),
        clauses.join(" AND ")
    );

    tracing::debug!(
        table = schema.table(),
        sql = %sql,
        param_count = params.len(),
        "find_by_map generated SQL"
    );

    Ok(Query { sql, params })
}
