use crate::Row;
use crate::error::{Error, Result};
use crate::schema::Schema;

/// Materialize a row into a fresh entity instance.
///
/// Null values and columns without a mapped field are skipped, leaving the
/// field at its constructed default.
///
/// # Errors
///
/// Returns [`Error::ConstructionFailure`] if the instance cannot be created
/// and [`Error::BindFailure`] if a setter rejects its value.
pub fn bind<E>(schema: &Schema<E>, row: Row) -> Result<E> {
    let mut entity = schema.instantiate()?;

    for column in row {
        if column.value.is_null() {
            continue;
        }
        let Some(field) = schema.field_for_column(&column.name) else {
            continue;
        };
        field.apply(&mut entity, column.value).map_err(|cause| Error::BindFailure {
            field: field.name(),
            cause,
        })?;
    }

    Ok(entity)
}

/// Bind every row, preserving order. The first failure aborts the batch.
///
/// # Errors
///
/// Returns the first error from [`bind`].
pub fn bind_many<E>(schema: &Schema<E>, rows: Vec<Row>) -> Result<Vec<E>> {
    rows.into_iter().map(|row| bind(schema, row)).collect()
}
