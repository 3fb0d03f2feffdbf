//! Lightweight ORM over a generic [`SqlHandle`].
//!
//! Entities are plain structs described by a [`Schema`]: table name, primary
//! key and an ordered list of fields with their column mapping and accessors.
//! Schemas are collected in a [`Registry`] at start-up. A [`Repository`] then
//! generates positional-parameter SQL for the entity, executes it through the
//! handle, and binds result rows back into fresh instances.
//!
//! # Quick Start
//!
//! ## Define an Entity
//!
//! ```ignore
//! use keyset_orm::entity;
//!
//! entity! {
//!     table = "user",
//!     primary_key = id,
//!     #[derive(Debug, Clone, Default)]
//!     pub struct User {
//!         pub id: i64,
//!         pub name: String => "user_name",
//!         pub age: i32,
//!     }
//! }
//! ```
//!
//! ## Register and Connect
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use keyset_orm::{Registry, Repository};
//! use keyset_sql::{Backend, SqliteHandle};
//!
//! let mut builder = Registry::builder();
//! builder.register_entity::<User>()?;
//! builder.build().install()?;
//!
//! let handle = Arc::new(SqliteHandle::connect().await?);
//! let users = Repository::<User>::new(handle)?;
//! ```
//!
//! ## CRUD Operations
//!
//! ```ignore
//! // INSERT INTO user (id,user_name,age) VALUES (?,?,?)
//! users.save(&User { id: 1, name: "a".to_string(), age: 30 }).await?;
//!
//! // UPDATE user SET user_name = ?, age = ? WHERE id = ?
//! users.update(&User { id: 1, name: "b".to_string(), age: 31 }).await?;
//!
//! // SELECT * FROM user WHERE id = ?
//! let user = users.find_by_id(1_i64).await?;
//!
//! // SELECT * FROM user WHERE 1 = 1 AND user_name = ? ORDER BY age desc LIMIT ?
//! let matches = users
//!     .find_by_map(&Criteria::new().eq("name", "b"), "age", Direction::Desc, 10)
//!     .await?;
//!
//! // fire-and-forget, failures are logged
//! users.async_save(User { id: 2, name: "c".to_string(), age: 20 });
//! ```
//!
//! ## Keyset Pagination
//!
//! ```ignore
//! // SELECT * FROM user WHERE id > ? ORDER BY id asc LIMIT 21
//! let mut page = users.scroll("id", 0_i64, Direction::Asc, &Criteria::new(), 20).await?;
//! while page.has_more() {
//!     let Some(cursor) = page.last_value().cloned() else { break };
//!     page = users.scroll("id", cursor, Direction::Asc, &Criteria::new(), 20).await?;
//! }
//! ```
//!
//! ## Custom Types
//!
//! ```ignore
//! impl FromValue for UserId {
//!     fn from_value(value: DataType) -> anyhow::Result<Self> {
//!         Ok(UserId(String::from_value(value)?))
//!     }
//! }
//! ```

#![forbid(unsafe_code)]

mod bind;
mod criteria;
mod entity;
mod error;
mod executor;
mod insert;
mod query;
mod registry;
mod repository;
mod schema;
mod scroll;
mod select;
mod update;

pub use bind::{bind, bind_many};
pub use criteria::{Criteria, Direction};
pub use entity::{Entity, FromValue};
pub use error::{Error, Result};
pub use executor::{Executor, TokioExecutor};
// Re-export the SQL surface used in parameters, rows and custom value conversions.
pub use keyset_sql::{DataType, Field, FutureResult, Row, SqlHandle};
pub use query::Query;
pub use registry::{Registry, RegistryBuilder};
pub use repository::Repository;
pub use schema::{FieldDescriptor, Schema, SchemaBuilder};
pub use scroll::ScrollResult;

/// SQL builders used by [`Repository`], exposed for callers that execute
/// statements themselves.
pub mod sql {
    pub use crate::insert::insert;
    pub use crate::scroll::scroll;
    pub use crate::select::{find_by_id, find_by_map, find_first};
    pub use crate::update::update;
}
