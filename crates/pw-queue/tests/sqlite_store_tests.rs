//! SQLite queue store tests
//!
//! Exercises the persisted single-record layout against a real on-disk
//! database file.

#![cfg(feature = "sqlite")]

use pw_common::QueueItem;
use pw_queue::{HeadFailure, QueueStore, SqliteQueueStore};
use serde_json::json;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tempfile::TempDir;

async fn open_pool(dir: &TempDir) -> SqlitePool {
    let options = SqliteConnectOptions::new()
        .filename(dir.path().join("queue.db"))
        .create_if_missing(true);
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .unwrap()
}

fn item(action: &str) -> QueueItem {
    QueueItem::new(action, "api/v1/events", json!({"title": "x"}), "POST")
}

#[tokio::test]
async fn save_then_load_roundtrips_exactly() {
    let dir = TempDir::new().unwrap();
    let store = SqliteQueueStore::new(open_pool(&dir).await, "test_queue");
    store.init_schema().await.unwrap();

    // Absent record reads as empty.
    assert!(store.load().await.unwrap().is_empty());

    let items = vec![item("a"), item("b"), item("c")];
    store.save(&items).await.unwrap();
    assert_eq!(store.load().await.unwrap(), items);

    // Overwrite with the empty sequence.
    store.save(&[]).await.unwrap();
    assert!(store.load().await.unwrap().is_empty());
}

#[tokio::test]
async fn add_appends_and_survives_reopen() {
    let dir = TempDir::new().unwrap();

    {
        let store = SqliteQueueStore::new(open_pool(&dir).await, "test_queue");
        store.init_schema().await.unwrap();
        store.add(item("first")).await.unwrap();
        store.add(item("second")).await.unwrap();
    }

    // A fresh store over the same file sees the same queue.
    let reopened = SqliteQueueStore::new(open_pool(&dir).await, "test_queue");
    let queue = reopened.load().await.unwrap();
    assert_eq!(queue.len(), 2);
    assert_eq!(queue[0].action, "first");
    assert_eq!(queue[1].action, "second");
}

#[tokio::test]
async fn add_rejects_malformed_items() {
    let dir = TempDir::new().unwrap();
    let store = SqliteQueueStore::new(open_pool(&dir).await, "test_queue");
    store.init_schema().await.unwrap();

    let malformed = QueueItem::new("event_save", "api/v1/events", json!({}), "");
    assert!(store.add(malformed).await.is_err());
    assert!(store.load().await.unwrap().is_empty());
}

#[tokio::test]
async fn complete_head_removes_in_fifo_order() {
    let dir = TempDir::new().unwrap();
    let store = SqliteQueueStore::new(open_pool(&dir).await, "test_queue");
    store.init_schema().await.unwrap();

    store.add(item("a")).await.unwrap();
    store.add(item("b")).await.unwrap();

    assert_eq!(store.complete_head().await.unwrap().unwrap().action, "a");
    assert_eq!(store.complete_head().await.unwrap().unwrap().action, "b");
    assert!(store.complete_head().await.unwrap().is_none());
}

#[tokio::test]
async fn fail_head_persists_attempts_and_dead_letters() {
    let dir = TempDir::new().unwrap();
    let store = SqliteQueueStore::new(open_pool(&dir).await, "test_queue");
    store.init_schema().await.unwrap();

    store.add(item("stuck")).await.unwrap();
    store.add(item("next")).await.unwrap();

    assert_eq!(
        store.fail_head(Some(2)).await.unwrap(),
        HeadFailure::Retained
    );
    assert_eq!(store.load().await.unwrap()[0].attempts, 1);

    let outcome = store.fail_head(Some(2)).await.unwrap();
    assert!(matches!(outcome, HeadFailure::DeadLettered(_)));

    let queue = store.load().await.unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].action, "next");

    let dead = store.dead_letters().await.unwrap();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].action, "stuck");
    assert_eq!(dead[0].attempts, 2);
}

#[tokio::test]
async fn record_keys_are_isolated() {
    let dir = TempDir::new().unwrap();
    let pool = open_pool(&dir).await;

    let one = SqliteQueueStore::new(pool.clone(), "queue_one");
    one.init_schema().await.unwrap();
    let two = SqliteQueueStore::new(pool, "queue_two");

    one.add(item("only_in_one")).await.unwrap();

    assert_eq!(one.load().await.unwrap().len(), 1);
    assert!(two.load().await.unwrap().is_empty());
}
