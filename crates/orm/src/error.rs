//! Errors

use thiserror::Error;

/// Result type used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by registry, builder, binder and repository operations.
#[derive(Error, Debug)]
pub enum Error {
    // --- Registry misuse ---
    /// The entity type has no registered schema.
    #[error("entity `{0}` is not registered")]
    NotRegistered(&'static str),

    /// The entity type (or the global registry) was registered twice.
    #[error("`{0}` is already registered")]
    AlreadyRegistered(&'static str),

    /// A schema descriptor violates the descriptor invariants.
    #[error("invalid schema for `{entity}`: {reason}")]
    InvalidSchema { entity: &'static str, reason: String },

    // --- Caller errors ---
    /// `update` was called on an instance whose primary key is null.
    #[error("primary key `{field}` of `{table}` is null")]
    MissingPrimaryKey { table: &'static str, field: &'static str },

    /// Ordering direction other than `asc` or `desc`.
    #[error("invalid direction `{0}`, expected `asc` or `desc`")]
    InvalidDirection(String),

    /// Bad size, empty or unknown field name, or an unusable value.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // --- Result shape ---
    /// A single-row lookup returned no rows.
    #[error("no matching row in `{table}`")]
    NotFound { table: &'static str },

    /// A primary key lookup returned more than one row.
    #[error("primary key lookup on `{table}` returned {rows} rows")]
    PrimaryKeyAmbiguous { table: &'static str, rows: usize },

    // --- Entity access ---
    /// A getter or setter failed.
    #[error("accessor for `{field}` failed")]
    AccessorFailure {
        field: String,
        #[source]
        cause: anyhow::Error,
    },

    /// A fresh entity instance could not be constructed.
    #[error("could not construct `{entity}`")]
    ConstructionFailure {
        entity: &'static str,
        #[source]
        cause: anyhow::Error,
    },

    /// A column value could not be bound to its field.
    #[error("binding field `{field}` failed")]
    BindFailure {
        field: &'static str,
        #[source]
        cause: anyhow::Error,
    },

    // --- Upstream ---
    /// Propagated from the SQL handle.
    #[error("sql handle failed")]
    SqlFailure(#[source] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use anyhow::anyhow;

    use super::Error;

    #[test]
    fn error_display() {
        let err = Error::MissingPrimaryKey {
            table: "user",
            field: "id",
        };
        assert_eq!(err.to_string(), "primary key `id` of `user` is null");

        let err = Error::InvalidDirection("up".to_string());
        assert_eq!(err.to_string(), "invalid direction `up`, expected `asc` or `desc`");
    }

    #[test]
    fn cause_is_source() {
        let err = Error::BindFailure {
            field: "age",
            cause: anyhow!("expected int32 data type"),
        };
        assert_eq!(err.to_string(), "binding field `age` failed");
        assert_eq!(err.source().map(ToString::to_string).as_deref(), Some("expected int32 data type"));

        let err = Error::SqlFailure(anyhow!("no such table: user"));
        assert_eq!(err.source().map(ToString::to_string).as_deref(), Some("no such table: user"));
    }
}
