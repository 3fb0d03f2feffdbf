//! End-to-end tests against an in-memory `SQLite` database.

#![allow(missing_docs)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{AuditEvent, Counter, Sample, User, init_tracing, sample, sqlite, user, user_schema};
use futures::future::BoxFuture;
use keyset_orm::{Criteria, DataType, Direction, Entity, Error, Executor, Repository, SqlHandle};
use parking_lot::Mutex;

fn users() -> Repository<User> {
    Repository::from_schema(user_schema(), sqlite())
}

async fn seed(users: &Repository<User>, rows: &[(i64, &str, i32)]) {
    for &(id, name, age) in rows {
        users.save(&user(id, name, age)).await.unwrap();
    }
}

#[tokio::test]
async fn save_then_find_round_trips() {
    let users = users();
    let saved = user(7, "a", 30);

    assert_eq!(users.save(&saved).await.unwrap(), 1);
    let found = users.find_by_id(7_i64).await.unwrap();

    let schema = users.schema();
    for field in schema.fields() {
        assert_eq!(
            schema.get_value(&found, field.name()).unwrap(),
            schema.get_value(&saved, field.name()).unwrap(),
            "field `{}` differs",
            field.name()
        );
    }
}

#[tokio::test]
async fn every_field_type_round_trips() {
    let samples = Repository::from_schema(Arc::new(Sample::schema().unwrap()), sqlite());
    let saved = sample(1);

    samples.save(&saved).await.unwrap();
    let found = samples.find_by_id(1_i64).await.unwrap();

    let schema = samples.schema();
    for field in schema.fields() {
        assert_eq!(
            schema.get_value(&found, field.name()).unwrap(),
            schema.get_value(&saved, field.name()).unwrap(),
            "field `{}` differs",
            field.name()
        );
    }
    assert_eq!(found, saved);
}

#[tokio::test]
async fn integral_reals_read_back_as_floats() {
    let handle = sqlite();
    let shared = Arc::clone(&handle);
    let samples = Repository::from_schema(Arc::new(Sample::schema().unwrap()), shared);
    samples.save(&sample(1)).await.unwrap();

    // NUMERIC affinity stores 30.0 as the integer 30
    let rows = handle
        .query_for_list("SELECT score FROM sample".to_string(), vec![])
        .await
        .unwrap();
    assert_eq!(rows[0].get("score"), Some(&DataType::Int64(Some(30))));

    let found = samples.find_by_id(1_i64).await.unwrap();
    assert!((found.score - 30.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn unsigned_overflow_is_sql_failure() {
    let handle = sqlite();
    let shared = Arc::clone(&handle);
    let counters = Repository::from_schema(Arc::new(Counter::schema().unwrap()), shared);

    let err = counters.save(&Counter { id: 1, hits: u64::MAX }).await.unwrap_err();
    assert!(matches!(err, Error::SqlFailure(_)));

    let rows = handle
        .query_for_list("SELECT * FROM counter".to_string(), vec![])
        .await
        .unwrap();
    assert!(rows.is_empty());

    let largest = Counter {
        id: 2,
        hits: u64::try_from(i64::MAX).unwrap(),
    };
    counters.save(&largest).await.unwrap();
    assert_eq!(counters.find_by_id(2_i64).await.unwrap(), largest);
}

#[tokio::test]
async fn duplicate_key_is_sql_failure() {
    let users = users();
    seed(&users, &[(1, "a", 30)]).await;

    let err = users.save(&user(1, "b", 31)).await.unwrap_err();
    assert!(matches!(err, Error::SqlFailure(_)));
}

#[tokio::test]
async fn update_is_idempotent() {
    let users = users();
    seed(&users, &[(7, "a", 30)]).await;

    let changed = user(7, "b", 31);
    assert_eq!(users.update(&changed).await.unwrap(), 1);
    let first = users.find_by_id(7_i64).await.unwrap();

    assert_eq!(users.update(&changed).await.unwrap(), 1);
    let second = users.find_by_id(7_i64).await.unwrap();

    assert_eq!(first, changed);
    assert_eq!(first, second);
}

#[tokio::test]
async fn update_of_missing_row_affects_nothing() {
    let users = users();
    assert_eq!(users.update(&user(99, "x", 1)).await.unwrap(), 0);
}

#[tokio::test]
async fn find_first_with_caller_sql() {
    let users = users();
    seed(&users, &[(1, "a", 30), (2, "b", 40), (3, "c", 50)]).await;

    let found = users
        .find_first("SELECT * FROM user WHERE age >= ? ORDER BY age DESC", vec![DataType::from(35)])
        .await
        .unwrap();
    assert_eq!(found, user(3, "c", 50));
}

#[tokio::test]
async fn find_by_map_filters_and_orders() {
    let users = users();
    seed(&users, &[(1, "b", 30), (2, "b", 40), (3, "c", 50), (4, "b", 20)]).await;

    let criteria = Criteria::new().eq("name", "b");
    let found = users.find_by_map(&criteria, "age", Direction::Desc, 2).await.unwrap();
    assert_eq!(found, [user(2, "b", 40), user(1, "b", 30)]);

    let criteria = Criteria::new().eq("name", "b").eq("age", 20);
    let found = users.find_by_map(&criteria, "id", Direction::Asc, 10).await.unwrap();
    assert_eq!(found, [user(4, "b", 20)]);
}

#[tokio::test]
async fn scroll_pages_are_monotonic() {
    let users = users();
    let rows: Vec<(i64, &str, i32)> = (1..=10).map(|id| (id, "b", 20)).collect();
    seed(&users, &rows).await;

    let mut cursor = DataType::from(0_i64);
    let mut seen = Vec::new();
    loop {
        let page = users.scroll("id", cursor.clone(), Direction::Asc, &Criteria::new(), 3).await.unwrap();

        let ids: Vec<i64> = page.data().iter().map(|u| u.id).collect();
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
        if let (Some(first), DataType::Int64(Some(after))) = (ids.first(), &cursor) {
            assert!(first > after);
        }
        seen.extend(ids);

        if !page.has_more() {
            break;
        }
        cursor = page.last_value().cloned().unwrap();
    }

    assert_eq!(seen, (1..=10).collect::<Vec<_>>());
}

#[tokio::test]
async fn scroll_descending() {
    let users = users();
    seed(&users, &[(1, "b", 30), (2, "b", 40), (3, "b", 50)]).await;

    let page = users.scroll("id", 3_i64, Direction::Desc, &Criteria::new(), 5).await.unwrap();
    assert_eq!(page.data(), [user(2, "b", 40), user(1, "b", 30)]);
    assert!(!page.has_more());
    assert_eq!(page.last_value(), Some(&DataType::Int64(Some(1))));
}

#[tokio::test]
async fn scroll_has_more_tracks_row_count() {
    let users = users();
    seed(&users, &[(1, "b", 26), (2, "b", 27), (3, "c", 28), (4, "b", 28), (5, "b", 29)]).await;
    let criteria = Criteria::new().eq("name", "b");

    // four rows match after the cursor
    for page_size in 1..=5_u32 {
        let page = users.scroll("age", 25, Direction::Asc, &criteria, page_size).await.unwrap();
        assert_eq!(page.has_more(), 4 > page_size);
        assert_eq!(page.len(), usize::try_from(page_size.min(4)).unwrap());
    }

    let page = users.scroll("age", 29, Direction::Asc, &criteria, 2).await.unwrap();
    assert!(page.is_empty());
    assert!(!page.has_more());
    assert_eq!(page.last_value(), None);
}

#[tokio::test]
async fn nullable_columns_bind_to_none() {
    let handle = sqlite();
    let shared = Arc::clone(&handle);
    let events = Repository::from_schema(Arc::new(AuditEvent::schema().unwrap()), shared);

    let event = AuditEvent {
        seq: 1,
        actor: None,
        kind: "login".to_string(),
    };
    events.save(&event).await.unwrap();
    assert_eq!(events.find_by_id(1_i64).await.unwrap(), event);

    let rows = handle
        .query_for_list("SELECT * FROM audit_event".to_string(), vec![])
        .await
        .unwrap();
    assert!(rows[0].get("actor").is_some_and(DataType::is_null));
}

#[tokio::test(flavor = "multi_thread")]
async fn async_save_completes_in_background() {
    let users = users();
    users.async_save(user(5, "a", 30));
    users.async_save(user(6, "b", 31));

    let mut found = Vec::new();
    for _ in 0..100 {
        found = users.find_by_map(&Criteria::new(), "id", Direction::Asc, 10).await.unwrap();
        if found.len() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(found, [user(5, "a", 30), user(6, "b", 31)]);
}

/// Holds submitted tasks until the test runs them.
#[derive(Default)]
struct QueuedExecutor {
    tasks: Mutex<Vec<BoxFuture<'static, ()>>>,
}

impl QueuedExecutor {
    async fn run_all(&self) {
        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            task.await;
        }
    }
}

impl Executor for QueuedExecutor {
    fn execute(&self, task: BoxFuture<'static, ()>) {
        self.tasks.lock().push(task);
    }
}

#[tokio::test]
async fn async_writes_use_executor() {
    let executor = Arc::new(QueuedExecutor::default());
    let queued = Arc::clone(&executor);
    let users = users().with_executor(queued);

    users.async_save(user(1, "a", 30));
    users.find_by_id(1_i64).await.unwrap_err();

    executor.run_all().await;
    assert_eq!(users.find_by_id(1_i64).await.unwrap(), user(1, "a", 30));

    users.async_update(user(1, "b", 31));
    executor.run_all().await;
    assert_eq!(users.find_by_id(1_i64).await.unwrap(), user(1, "b", 31));
}

#[tokio::test]
async fn async_write_failures_are_not_returned() {
    init_tracing();
    let executor = Arc::new(QueuedExecutor::default());
    let queued = Arc::clone(&executor);
    let users = users().with_executor(queued);
    seed(&users, &[(1, "a", 30)]).await;

    // duplicate key, logged and dropped
    users.async_save(user(1, "b", 31));
    executor.run_all().await;

    assert_eq!(users.find_by_id(1_i64).await.unwrap(), user(1, "a", 30));
}
