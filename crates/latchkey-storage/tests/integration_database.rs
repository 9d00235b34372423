//! Integration tests for the credential database
//!
//! These tests use in-memory and temporary-file SQLite databases to check
//! migrations, schema reset, and lookups racing admin writes.
//!
//! Run with: cargo test --package latchkey-storage --test integration_database

use latchkey_core::CredentialCode;
use latchkey_storage::connection::{Database, DatabaseConfig};
use latchkey_storage::models::NewUser;
use latchkey_storage::repositories::{KeyCodeRepository, SqliteKeyCodeRepository};
use latchkey_storage::{CredentialRecord, CredentialStore, SqliteCredentialStore, transaction};
use tokio::task::JoinSet;

fn code(s: &str) -> CredentialCode {
    CredentialCode::new(s).unwrap()
}

async fn enroll(db: &Database, email: &str, key: &str, enabled: bool) {
    let mut tx = db.pool().begin().await.unwrap();
    transaction::enroll_user(&mut tx, &NewUser::new("Test", "User", email), &code(key), enabled)
        .await
        .unwrap();
    tx.commit().await.unwrap();
}

#[tokio::test]
async fn test_in_memory_database() {
    let db = Database::in_memory().await.unwrap();
    db.health_check().await.unwrap();
    db.close().await;
}

#[tokio::test]
async fn test_migration_idempotency() {
    let db = Database::in_memory().await.unwrap();

    db.migrate().await.unwrap();
    db.migrate().await.unwrap();

    let result: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('users', 'key_codes')",
    )
    .fetch_one(db.pool())
    .await
    .unwrap();

    assert_eq!(result.0, 2);

    db.close().await;
}

#[tokio::test]
async fn test_reset_empties_schema() {
    let db = Database::in_memory().await.unwrap();
    enroll(&db, "ada@example.org", "12345", true).await;

    db.reset().await.unwrap();

    let store = SqliteCredentialStore::new(db.pool().clone());
    assert_eq!(store.lookup(&code("12345")).await.unwrap(), None);

    // The schema is usable again straight away
    enroll(&db, "ada@example.org", "12345", true).await;
    assert_eq!(
        store.lookup(&code("12345")).await.unwrap(),
        Some(CredentialRecord::linked(true))
    );

    db.close().await;
}

#[tokio::test]
async fn test_default_enabled_column() {
    let db = Database::in_memory().await.unwrap();

    sqlx::query("INSERT INTO key_codes (code) VALUES ('777')")
        .execute(db.pool())
        .await
        .unwrap();

    let keys = SqliteKeyCodeRepository::new(db.pool().clone());
    assert!(keys.find_by_code(&code("777")).await.unwrap().unwrap().enabled);

    db.close().await;
}

#[tokio::test]
async fn test_data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keys.db");
    let config = DatabaseConfig::new(path.to_string_lossy()).max_connections(2);

    let db = Database::new(config.clone()).await.unwrap();
    enroll(&db, "ada@example.org", "12345", true).await;
    db.close().await;

    let db = Database::new(config).await.unwrap();
    let store = SqliteCredentialStore::new(db.pool().clone());
    assert_eq!(
        store.lookup(&code("12345")).await.unwrap(),
        Some(CredentialRecord::linked(true))
    );
    db.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_lookups_during_admin_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keys.db");
    let db = Database::new(DatabaseConfig::new(path.to_string_lossy()).max_connections(4))
        .await
        .unwrap();

    enroll(&db, "ada@example.org", "12345", true).await;

    let mut tasks = JoinSet::new();

    let writer_db = db.clone();
    tasks.spawn(async move {
        let keys = SqliteKeyCodeRepository::new(writer_db.pool().clone());
        for i in 0..20 {
            keys.set_enabled(&code("12345"), i % 2 == 1).await.unwrap();
        }
    });

    for _ in 0..3 {
        let reader_db = db.clone();
        tasks.spawn(async move {
            let store = SqliteCredentialStore::new(reader_db.pool().clone());
            for _ in 0..20 {
                // Whatever the interleaving, the record is always whole
                let record = store.lookup(&code("12345")).await.unwrap().unwrap();
                assert!(record.identity_present);
            }
        });
    }

    while let Some(result) = tasks.join_next().await {
        result.unwrap();
    }

    let store = SqliteCredentialStore::new(db.pool().clone());
    assert_eq!(
        store.lookup(&code("12345")).await.unwrap(),
        Some(CredentialRecord::linked(true))
    );

    db.close().await;
}
