use crate::error::Result;
use crate::query::{Query, placeholders};
use crate::schema::{FieldDescriptor, Schema};

/// Build the `INSERT` for a live instance.
///
/// Every field is written, primary key included, in declaration order:
///
/// ```text
/// INSERT INTO <table> (c1,c2,…,cN) VALUES (?,?,…,?)
/// ```
///
/// # Errors
///
/// Returns [`crate::Error::AccessorFailure`] if a getter fails.
pub fn insert<E>(schema: &Schema<E>, entity: &E) -> Result<Query> {
    let fields = schema.fields();
    let columns = fields.iter().map(FieldDescriptor::column).collect::<Vec<_>>().join(",");
    let params = fields.iter().map(|field| field.get(entity)).collect::<Result<Vec<_>>>()?;

    let sql = format!(
        "INSERT INTO {} ({columns}) VALUES ({})",
        schema.table(),
        placeholders(fields.len())
    );

    tracing::debug!(
        table = schema.table(),
        sql = %sql,
        param_count = params.len(),
        "insert generated SQL"
    );

    Ok(Query { sql, params })
}
