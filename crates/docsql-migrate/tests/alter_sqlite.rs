//! SchemaMigrator against an in-memory SQLite database.

use docsql_core::{Properties, Row, Storage, StorageError, StorageOutcome};
use docsql_migrate::prelude::*;
use docsql_sqlite::SqliteStorage;
use serde_json::{json, Value};

fn users_v1() -> Properties {
    Properties::from_json(&json!({
        "firstName": { "type": "String", "unique": true, "defaultsTo": "X" },
        "lastName": { "type": "String" },
        "nickname": { "type": "String" },
        "ssn": { "type": "String", "primaryKey": true }
    }))
    .unwrap()
}

fn users_v2() -> Properties {
    Properties::from_json(&json!({
        "firstName": { "type": "String", "unique": true, "defaultsTo": "X" },
        "lastName": { "type": "String" },
        "ssn": { "type": "String", "primaryKey": true },
        "age": { "type": "Number", "defaultsTo": 20 }
    }))
    .unwrap()
}

async fn exec(storage: &mut SqliteStorage, sql: &str) -> StorageOutcome {
    storage.execute(sql).await.unwrap()
}

async fn select(storage: &mut SqliteStorage, sql: &str) -> Vec<Row> {
    exec(storage, sql).await.into_rows()
}

async fn tables(storage: &mut SqliteStorage) -> Vec<String> {
    select(
        storage,
        "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
    )
    .await
    .into_iter()
    .filter_map(|row| row.get("name").and_then(Value::as_str).map(String::from))
    .collect()
}

async fn seeded() -> SqliteStorage {
    let mut storage = SqliteStorage::in_memory().await.unwrap();
    SchemaMigrator::new()
        .alter(&mut storage, "users", &users_v1())
        .await
        .unwrap();
    exec(
        &mut storage,
        "INSERT INTO users (firstName, lastName, nickname, ssn) VALUES \
         ('benson', 'lukas', 'ben', '1'), ('john', 'doe', 'jd', '2')",
    )
    .await;
    storage
}

#[tokio::test]
async fn test_missing_table_is_created_with_index() {
    let mut storage = SqliteStorage::in_memory().await.unwrap();
    let outcome = SchemaMigrator::new()
        .alter(&mut storage, "users", &users_v1())
        .await
        .unwrap();
    assert_eq!(outcome.kind, MigrationKind::Created);
    assert_eq!(outcome.to_string(), "users migrated successfully");

    let indexes = select(
        &mut storage,
        "SELECT name FROM sqlite_master WHERE type = 'index' AND name = 'users_ssn_index'",
    )
    .await;
    assert_eq!(indexes.len(), 1);

    let inserted = exec(&mut storage, "INSERT INTO users (ssn) VALUES ('9')").await;
    assert_eq!(inserted.rows_affected(), 1);
    let rows = select(&mut storage, "SELECT firstName FROM users").await;
    assert_eq!(rows[0]["firstName"], json!("X"));
}

#[tokio::test]
async fn test_new_column_is_added_in_place() {
    let mut storage = seeded().await;
    let mut properties = users_v1();
    properties
        .push(docsql_core::Property::new("age", docsql_core::PropertyType::Number).defaults_to(20))
        .unwrap();

    let outcome = SchemaMigrator::new()
        .alter(&mut storage, "users", &properties)
        .await
        .unwrap();
    assert_eq!(
        outcome.kind,
        MigrationKind::Altered {
            added: vec!["age".to_string()]
        }
    );

    let rows = select(&mut storage, "SELECT ssn, age FROM users ORDER BY ssn").await;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["age"], json!(20.0));
}

#[tokio::test]
async fn test_removed_column_rebuilds_and_keeps_rows() {
    let mut storage = seeded().await;

    let outcome = SchemaMigrator::new()
        .alter(&mut storage, "users", &users_v2())
        .await
        .unwrap();
    assert_eq!(outcome.kind, MigrationKind::Rebuilt { copied: 2 });
    assert_eq!(tables(&mut storage).await, ["users"]);

    let rows = select(&mut storage, "SELECT * FROM users ORDER BY ssn").await;
    assert_eq!(rows.len(), 2);
    let columns: Vec<&String> = rows[0].keys().collect();
    assert_eq!(columns, ["firstName", "lastName", "ssn", "age"]);
    assert_eq!(rows[0]["firstName"], json!("benson"));
    assert_eq!(rows[0]["ssn"], json!("1"));
    assert_eq!(rows[0]["age"], json!(20.0));
    assert_eq!(rows[1]["lastName"], json!("doe"));
    assert_eq!(rows[1]["ssn"], json!("2"));

    let indexes = select(
        &mut storage,
        "SELECT name FROM sqlite_master WHERE type = 'index' AND name = 'users_ssn_index'",
    )
    .await;
    assert_eq!(indexes.len(), 1);
}

#[tokio::test]
async fn test_second_alter_is_unchanged() {
    let mut storage = seeded().await;
    let migrator = SchemaMigrator::new();
    migrator
        .alter(&mut storage, "users", &users_v2())
        .await
        .unwrap();

    let outcome = migrator
        .alter(&mut storage, "users", &users_v2())
        .await
        .unwrap();
    assert_eq!(outcome.kind, MigrationKind::Unchanged);

    let plan = migrator
        .plan_for(&mut storage, "users", &users_v2())
        .await
        .unwrap();
    assert_eq!(plan.kind(), PlanKind::Unchanged);
    assert!(plan.reasons().is_empty());
}

#[tokio::test]
async fn test_leftover_shadow_is_dropped() {
    let mut storage = seeded().await;
    exec(
        &mut storage,
        "CREATE TABLE users_shadow (firstName TEXT, ssn TEXT PRIMARY KEY)",
    )
    .await;
    exec(&mut storage, "INSERT INTO users_shadow (ssn) VALUES ('1')").await;

    let outcome = SchemaMigrator::new()
        .alter(&mut storage, "users", &users_v2())
        .await
        .unwrap();
    assert_eq!(outcome.kind, MigrationKind::Rebuilt { copied: 2 });
    assert_eq!(tables(&mut storage).await, ["users"]);
}

#[tokio::test]
async fn test_interrupted_rename_is_resumed() {
    let mut storage = seeded().await;
    // the old table was dropped but the shadow never renamed
    exec(
        &mut storage,
        "CREATE TABLE users_shadow (firstName TEXT UNIQUE DEFAULT \"X\", lastName TEXT, ssn TEXT PRIMARY KEY, age REAL DEFAULT 20)",
    )
    .await;
    exec(
        &mut storage,
        "INSERT INTO users_shadow (firstName, lastName, ssn) SELECT firstName, lastName, ssn FROM users",
    )
    .await;
    exec(&mut storage, "DROP TABLE users").await;

    let outcome = SchemaMigrator::new()
        .alter(&mut storage, "users", &users_v2())
        .await
        .unwrap();
    assert_eq!(outcome.kind, MigrationKind::Unchanged);
    assert_eq!(tables(&mut storage).await, ["users"]);
    let rows = select(&mut storage, "SELECT ssn FROM users ORDER BY ssn").await;
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn test_duplicate_primary_keys_fail_before_drop() {
    let mut storage = seeded().await;
    // the new primary key has one default for every existing row
    let properties = Properties::from_json(&json!({
        "firstName": { "type": "String" },
        "code": { "type": "String", "primaryKey": true, "defaultsTo": "A" }
    }))
    .unwrap();

    let err = SchemaMigrator::new()
        .alter(&mut storage, "users", &properties)
        .await
        .unwrap_err();
    assert!(matches!(err, MigrateError::Migration(_)));

    let rows = select(&mut storage, "SELECT * FROM users").await;
    assert_eq!(rows.len(), 2);
    assert!(rows[0].contains_key("nickname"));
}

#[tokio::test]
async fn test_null_primary_keys_fail() {
    let mut storage = seeded().await;
    let properties = Properties::from_json(&json!({
        "firstName": { "type": "String" },
        "code": { "type": "String", "primaryKey": true }
    }))
    .unwrap();

    let err = SchemaMigrator::new()
        .alter(&mut storage, "users", &properties)
        .await
        .unwrap_err();
    assert!(matches!(err, MigrateError::Migration(_)));
}

#[tokio::test]
async fn test_small_batches_copy_every_row() {
    let mut storage = seeded().await;
    exec(
        &mut storage,
        "INSERT INTO users (firstName, ssn) VALUES ('a', '3'), ('b', '4'), ('c', '5')",
    )
    .await;
    let migrator = SchemaMigrator::with_options(MigratorOptions {
        batch_size: 2,
        ..MigratorOptions::default()
    });

    let outcome = migrator
        .alter(&mut storage, "users", &users_v2())
        .await
        .unwrap();
    assert_eq!(outcome.kind, MigrationKind::Rebuilt { copied: 5 });
    let rows = select(&mut storage, "SELECT COUNT(*) AS count FROM users").await;
    assert_eq!(rows[0]["count"], json!(5));
}

fn emails(unique: bool) -> Properties {
    Properties::from_json(&json!({
        "name": { "type": "String" },
        "email": { "type": "String", "unique": unique }
    }))
    .unwrap()
}

#[tokio::test]
async fn test_adding_unique_rebuilds() {
    let mut storage = SqliteStorage::in_memory().await.unwrap();
    let migrator = SchemaMigrator::new();
    migrator
        .alter(&mut storage, "people", &emails(false))
        .await
        .unwrap();
    exec(&mut storage, "INSERT INTO people (name, email) VALUES ('a', 'a@x')").await;

    let outcome = migrator
        .alter(&mut storage, "people", &emails(true))
        .await
        .unwrap();
    assert_eq!(outcome.kind, MigrationKind::Rebuilt { copied: 1 });

    let duplicate = storage
        .execute("INSERT INTO people (name, email) VALUES ('b', 'a@x')")
        .await;
    assert!(duplicate.is_err());

    let again = migrator
        .alter(&mut storage, "people", &emails(true))
        .await
        .unwrap();
    assert_eq!(again.kind, MigrationKind::Unchanged);
}

#[tokio::test]
async fn test_removing_unique_rebuilds() {
    let mut storage = SqliteStorage::in_memory().await.unwrap();
    let migrator = SchemaMigrator::new();
    migrator
        .alter(&mut storage, "people", &emails(true))
        .await
        .unwrap();
    exec(&mut storage, "INSERT INTO people (name, email) VALUES ('a', 'a@x')").await;

    let outcome = migrator
        .alter(&mut storage, "people", &emails(false))
        .await
        .unwrap();
    assert_eq!(outcome.kind, MigrationKind::Rebuilt { copied: 1 });

    exec(&mut storage, "INSERT INTO people (name, email) VALUES ('b', 'a@x')").await;
    let rows = select(&mut storage, "SELECT COUNT(*) AS count FROM people").await;
    assert_eq!(rows[0]["count"], json!(2));
}

#[tokio::test]
async fn test_rebuild_keeps_blob_values() {
    let mut storage = seeded().await;
    exec(
        &mut storage,
        "UPDATE users SET lastName = X'00FF' WHERE ssn = '1'",
    )
    .await;

    let outcome = SchemaMigrator::new()
        .alter(&mut storage, "users", &users_v2())
        .await
        .unwrap();
    assert_eq!(outcome.kind, MigrationKind::Rebuilt { copied: 2 });

    let rows = select(
        &mut storage,
        "SELECT typeof(lastName) AS kind, hex(lastName) AS bytes FROM users WHERE ssn = '1'",
    )
    .await;
    assert_eq!(rows[0]["kind"], json!("blob"));
    assert_eq!(rows[0]["bytes"], json!("00FF"));
}

#[tokio::test]
async fn test_keyword_names_are_rejected_before_sql() {
    let mut storage = SqliteStorage::in_memory().await.unwrap();
    let mut properties = Properties::new();
    let err = properties
        .push(docsql_core::Property::new("order", docsql_core::PropertyType::Number))
        .unwrap_err();
    assert!(matches!(err, docsql_core::SchemaError::InvalidIdentifier(_)));

    let err = SchemaMigrator::new()
        .alter(&mut storage, "group", &users_v1())
        .await
        .unwrap_err();
    assert!(matches!(err, MigrateError::Schema(_)));
    assert!(tables(&mut storage).await.is_empty());
}

/// Fails every statement that writes.
struct ReadOnly(SqliteStorage);

impl Storage for ReadOnly {
    async fn execute(&mut self, sql: &str) -> std::result::Result<StorageOutcome, StorageError> {
        if sql.starts_with("SELECT") || sql.starts_with("PRAGMA") {
            self.0.execute(sql).await
        } else {
            Err(StorageError::new("attempt to write a readonly database"))
        }
    }
}

#[tokio::test]
async fn test_storage_errors_propagate() {
    let mut storage = ReadOnly(SqliteStorage::in_memory().await.unwrap());
    let err = SchemaMigrator::new()
        .alter(&mut storage, "users", &users_v1())
        .await
        .unwrap_err();
    assert!(
        matches!(err, MigrateError::Storage(ref e) if e.message() == "attempt to write a readonly database")
    );
}

#[tokio::test]
async fn test_empty_schema_is_rejected() {
    let mut storage = SqliteStorage::in_memory().await.unwrap();
    let err = SchemaMigrator::new()
        .alter(&mut storage, "users", &Properties::new())
        .await
        .unwrap_err();
    assert!(matches!(err, MigrateError::Migration(_)));
    assert!(tables(&mut storage).await.is_empty());
}
