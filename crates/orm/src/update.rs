use crate::error::{Error, Result};
use crate::query::Query;
use crate::schema::Schema;

/// Build the `UPDATE` by primary key for a live instance.
///
/// Non-key columns form the `SET` list in declaration order and the key is
/// the only predicate:
///
/// ```text
/// UPDATE <table> SET c_i = ?, c_j = ? WHERE pk = ?
/// ```
///
/// # Errors
///
/// Returns [`Error::MissingPrimaryKey`] if the key is null,
/// [`Error::InvalidArgument`] if the entity has no non-key fields and
/// [`Error::AccessorFailure`] if a getter fails.
pub fn update<E>(schema: &Schema<E>, entity: &E) -> Result<Query> {
    let primary_key = schema.primary_key();
    let key = primary_key.get(entity)?;
    if key.is_null() {
        return Err(Error::MissingPrimaryKey {
            table: schema.table(),
            field: primary_key.name(),
        });
    }

    let mut assignments = Vec::with_capacity(schema.fields().len());
    let mut params = Vec::with_capacity(schema.fields().len());
    for field in schema.fields().iter().filter(|field| field.name() != primary_key.name()) {
        assignments.push(format!("{} = ?", field.column()));
        params.push(field.get(entity)?);
    }
    if assignments.is_empty() {
        return Err(Error::InvalidArgument(format!(
            "`{}` has no columns to update",
            schema.entity()
        )));
    }
    params.push(key);

    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        schema.table(),
        assignments.join(", "),
        primary_key.column()
    );

    tracing::debug!(
        table = schema.table(),
        sql = %sql,
        param_count = params.len(),
        "update generated SQL"
    );

    Ok(Query { sql, params })
}
