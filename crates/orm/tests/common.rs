//! Common test helpers shared across integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use futures::FutureExt;
use keyset_orm::{DataType, FutureResult, Query, Row, Schema, SqlHandle, entity};
use keyset_sql::SqliteHandle;
use parking_lot::Mutex;

// Common test entities used across multiple test files

entity! {
    table = "user",
    primary_key = id,
    #[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
    pub struct User {
        pub id: i64,
        pub name: String => "user_name",
        pub age: i32,
    }
}

entity! {
    table = "audit_event",
    primary_key = seq,
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct AuditEvent {
        pub seq: i64,
        pub actor: Option<String>,
        pub kind: String,
    }
}

entity! {
    table = "sample",
    primary_key = id,
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Sample {
        pub id: i64,
        pub flag: bool,
        pub small: i16,
        pub medium: u32,
        pub large: u64,
        pub ratio: f32,
        pub weight: f64,
        pub score: f64,
        pub initial: char,
        pub label: Option<String>,
        pub payload: Vec<u8>,
        pub born: NaiveDate,
        pub alarm: NaiveTime,
        pub seen_at: NaiveDateTime,
        pub created_at: DateTime<Utc>,
        pub meta: serde_json::Value,
        pub note: Option<f64>,
    }
}

entity! {
    table = "counter",
    primary_key = id,
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Counter {
        pub id: i64,
        pub hits: u64,
    }
}

pub fn user(id: i64, name: &str, age: i32) -> User {
    User {
        id,
        name: name.to_string(),
        age,
    }
}

/// A `Sample` with a non-default value in every field except `note`.
pub fn sample(id: i64) -> Sample {
    let born = NaiveDate::from_ymd_opt(1990, 6, 15).unwrap();
    let alarm = NaiveTime::from_hms_milli_opt(10, 30, 45, 123).unwrap();
    Sample {
        id,
        flag: true,
        small: -7,
        medium: 4_000_000_000,
        large: u64::try_from(i64::MAX).unwrap(),
        ratio: 1.5,
        weight: 72.25,
        score: 30.0,
        initial: 'é',
        label: Some("first".to_string()),
        payload: vec![0, 159, 146, 150],
        born,
        alarm,
        seen_at: born.and_time(alarm),
        created_at: "2024-01-15T10:30:45.250Z".parse().unwrap(),
        meta: serde_json::json!({"tags": ["a", "b"], "level": 3}),
        note: None,
    }
}

pub fn user_schema() -> Arc<Schema<User>> {
    Arc::new(<User as keyset_orm::Entity>::schema().unwrap())
}

pub fn user_row(id: i64, name: &str, age: i64) -> Row {
    Row::new().with("id", id).with("user_name", name).with("age", age)
}

/// [`SqlHandle`] that records every statement and answers queries from a
/// queue of canned result sets.
#[derive(Debug, Default)]
pub struct RecordingHandle {
    queries: Mutex<Vec<Query>>,
    results: Mutex<Vec<Vec<Row>>>,
    affected: u64,
}

impl RecordingHandle {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            affected: 1,
            ..Self::default()
        })
    }

    /// Queue a result set for the next `query_for_list`.
    pub fn returning(self: &Arc<Self>, rows: Vec<Row>) -> Arc<Self> {
        self.results.lock().push(rows);
        Arc::clone(self)
    }

    pub fn queries(&self) -> Vec<Query> {
        self.queries.lock().clone()
    }

    pub fn last(&self) -> Query {
        self.queries.lock().last().cloned().expect("no statement recorded")
    }

    fn record(&self, sql: String, params: Vec<DataType>) {
        self.queries.lock().push(Query { sql, params });
    }
}

impl SqlHandle for RecordingHandle {
    fn query_for_list(&self, sql: String, params: Vec<DataType>) -> FutureResult<Vec<Row>> {
        self.record(sql, params);
        let mut results = self.results.lock();
        let rows = if results.is_empty() { Vec::new() } else { results.remove(0) };
        async move { Ok::<_, anyhow::Error>(rows) }.boxed()
    }

    fn update(&self, sql: String, params: Vec<DataType>) -> FutureResult<u64> {
        self.record(sql, params);
        let affected = self.affected;
        async move { Ok::<_, anyhow::Error>(affected) }.boxed()
    }
}

/// Route `tracing` output to the test harness, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// In-memory `SQLite` with a table for each test entity.
///
/// `sample.score` has NUMERIC affinity, so integral reals are stored as
/// integers.
pub fn sqlite() -> Arc<SqliteHandle> {
    let handle = SqliteHandle::in_memory().unwrap();
    handle
        .execute_batch(
            "CREATE TABLE user (id INTEGER PRIMARY KEY, user_name TEXT NOT NULL, age INTEGER NOT NULL);
             CREATE TABLE audit_event (seq INTEGER PRIMARY KEY, actor TEXT, kind TEXT NOT NULL);
             CREATE TABLE sample (
                 id INTEGER PRIMARY KEY, flag BOOLEAN, small INTEGER, medium INTEGER,
                 large INTEGER, ratio REAL, weight REAL, score NUMERIC, initial TEXT,
                 label TEXT, payload BLOB, born DATE, alarm TEXT, seen_at TEXT,
                 created_at TEXT, meta TEXT, note REAL
             );
             CREATE TABLE counter (id INTEGER PRIMARY KEY, hits INTEGER NOT NULL);",
        )
        .unwrap();
    Arc::new(handle)
}
