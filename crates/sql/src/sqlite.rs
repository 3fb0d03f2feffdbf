//! Default `SQLite` implementation of [`SqlHandle`].
//!
//! This is a lightweight implementation for development and test use.

#![allow(clippy::significant_drop_tightening)]

use std::sync::Arc;

use anyhow::{Context, Result};
use fromenv::FromEnv;
use futures::FutureExt;
use rusqlite::types::{FromSql, FromSqlResult, ToSqlOutput, Value, ValueRef};
use rusqlite::{Connection as SqliteConnection, ToSql, params_from_iter};
use tracing::instrument;

use crate::config::Backend;
use crate::handle::{FutureResult, SqlHandle};
use crate::types::{DataType, Field, Row};

/// Options used to connect to the SQL database.
///
/// This struct is used to load connection options from environment variables.
#[derive(Debug, Clone, FromEnv)]
pub struct ConnectOptions {
    /// Database path or URI.
    #[env(from = "SQL_DATABASE", default = "file::memory:?cache=shared")]
    pub database: String,
}

impl crate::config::FromEnv for ConnectOptions {
    fn from_env() -> Result<Self> {
        Self::from_env().finalize().context("issue loading connection options")
    }
}

/// `SQLite` backed [`SqlHandle`].
#[derive(Debug, Clone)]
pub struct SqliteHandle {
    // Mutex is necessary since rusqlite::Connection isn't `Sync`
    conn: Arc<parking_lot::Mutex<SqliteConnection>>,
}

impl Backend for SqliteHandle {
    type ConnectOptions = ConnectOptions;

    #[instrument]
    async fn connect_with(options: Self::ConnectOptions) -> Result<Self> {
        tracing::debug!("initializing SQLite connection to: {}", options.database);

        let conn = Arc::new(parking_lot::Mutex::new(
            SqliteConnection::open(&options.database).context("failed to open SQLite database")?,
        ));

        Ok(Self { conn })
    }
}

impl SqliteHandle {
    /// Open a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if `SQLite` cannot allocate the database.
    pub fn in_memory() -> Result<Self> {
        let conn =
            SqliteConnection::open_in_memory().context("failed to open in-memory database")?;
        Ok(Self {
            conn: Arc::new(parking_lot::Mutex::new(conn)),
        })
    }

    /// Execute one or more `;`-separated statements without parameters,
    /// typically schema set-up.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        tracing::debug!("executing batch: {sql}");
        self.conn.lock().execute_batch(sql).context("failed to execute batch")
    }
}

impl SqlHandle for SqliteHandle {
    fn query_for_list(&self, sql: String, params: Vec<DataType>) -> FutureResult<Vec<Row>> {
        tracing::debug!(sql = %sql, param_count = params.len(), "executing query");
        let conn = Arc::clone(&self.conn);

        async move {
            let conn = conn.lock();
            let mut stmt = conn.prepare(&sql).context("failed to prepare statement")?;
            let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

            let rows = stmt
                .query_map(params_from_iter(&params), |row| {
                    let fields = columns
                        .iter()
                        .enumerate()
                        .map(|(index, name)| {
                            Ok(Field {
                                name: name.clone(),
                                value: row.get(index)?,
                            })
                        })
                        .collect::<rusqlite::Result<Vec<_>>>()?;
                    Ok(Row { fields })
                })
                .context("failed to execute query")?;

            rows.collect::<rusqlite::Result<Vec<_>>>().context("failed to read row")
        }
        .boxed()
    }

    fn update(&self, sql: String, params: Vec<DataType>) -> FutureResult<u64> {
        tracing::debug!(sql = %sql, param_count = params.len(), "executing statement");
        let conn = Arc::clone(&self.conn);

        async move {
            let affected = conn
                .lock()
                .execute(&sql, params_from_iter(&params))
                .context("failed to execute statement")?;
            u64::try_from(affected).context("affected row count out of range")
        }
        .boxed()
    }
}

// Parameters bind through rusqlite's own conversions, which reject a `u64`
// above `i64::MAX` instead of wrapping it. NULL in any variant binds as NULL.
impl ToSql for DataType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Self::Boolean(Some(v)) => v.to_sql(),
            Self::Int32(Some(v)) => v.to_sql(),
            Self::Int64(Some(v)) => v.to_sql(),
            Self::Uint32(Some(v)) => v.to_sql(),
            Self::Uint64(Some(v)) => v.to_sql(),
            Self::Float(Some(v)) => v.to_sql(),
            Self::Double(Some(v)) => v.to_sql(),
            Self::Str(Some(v))
            | Self::Date(Some(v))
            | Self::Time(Some(v))
            | Self::Timestamp(Some(v)) => v.to_sql(),
            Self::Binary(Some(v)) => v.to_sql(),
            _ => Ok(ToSqlOutput::Owned(Value::Null)),
        }
    }
}

// SQLite reports storage classes, not declared types: INTEGER widens to
// `Int64`, REAL to `Double`, and NULL carries no type.
impl FromSql for DataType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(match value {
            ValueRef::Null => Self::Str(None),
            ValueRef::Integer(v) => Self::Int64(Some(v)),
            ValueRef::Real(v) => Self::Double(Some(v)),
            ValueRef::Text(_) => Self::Str(Some(value.as_str()?.to_string())),
            ValueRef::Blob(v) => Self::Binary(Some(v.to_vec())),
        })
    }
}
