#![doc = include_str!("../README.md")]

//! # SQL handle
//!
//! The execution surface used by the ORM: a thread-safe handle that runs
//! parameterized statements and returns column→value rows.

#![forbid(unsafe_code)]

mod config;
mod handle;
mod sqlite;
mod types;

pub use self::config::{Backend, FromEnv};
pub use self::handle::{FutureResult, SqlHandle};
pub use self::sqlite::{ConnectOptions, SqliteHandle};
pub use self::types::{DataType, Field, Row};
