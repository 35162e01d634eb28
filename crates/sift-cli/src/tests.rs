//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::io::Write;
use std::path::Path;

use sift_core::analytics::NarrativeWriter;
use sift_core::models::CategorySource;
use sift_core::{Config, Database};
use tempfile::TempDir;

use crate::commands::{self, truncate, Engines};

fn setup_test_db() -> Database {
    Database::in_memory().unwrap()
}

fn test_config(dir: &Path) -> Config {
    Config {
        model_dir: dir.join("models"),
        database_path: dir.join("sift.db").to_string_lossy().into_owned(),
        ..Default::default()
    }
}

fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(content.as_bytes()).unwrap();
    path
}

// ========== Helpers ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("a much longer description", 10), "a much ...");
    assert_eq!(truncate("café au lait", 6), "caf...");
}

#[test]
fn test_resolve_month() {
    assert_eq!(commands::resolve_month(Some("2024-01".into())), "2024-01");
    let current = commands::resolve_month(None);
    assert_eq!(current.len(), 7);
    assert_eq!(&current[4..5], "-");
}

#[test]
fn test_load_config_db_override() {
    let dir = TempDir::new().unwrap();
    let config_path = write_file(
        dir.path(),
        "config.toml",
        "database_path = \"from-file.db\"\nconfidence_threshold = 0.8\n",
    );
    let db_path = dir.path().join("override.db");

    let config = commands::load_config(Some(&config_path), Some(&db_path)).unwrap();
    assert_eq!(config.database_path, db_path.to_string_lossy());
    assert_eq!(config.confidence_threshold, 0.8);
}

#[test]
fn test_cmd_init_creates_database_and_model_dir() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());

    commands::cmd_init(&config).unwrap();
    assert!(Path::new(&config.database_path).exists());
    assert!(config.model_dir.is_dir());
}

// ========== Categorize / Transactions ==========

#[tokio::test]
async fn test_cmd_categorize() {
    let dir = TempDir::new().unwrap();
    let engines = Engines::with_ai(&test_config(dir.path()), None);
    let result = commands::cmd_categorize(&engines.cascade, "Shell gas station", false).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cmd_add_and_list() {
    let dir = TempDir::new().unwrap();
    let db = setup_test_db();
    let engines = Engines::with_ai(&test_config(dir.path()), None);

    commands::cmd_add(
        &db,
        &engines.cascade,
        "alice",
        "2024-01-07",
        2000.0,
        "Rent payment",
        false,
    )
    .await
    .unwrap();

    let txs = db.recent_transactions("alice", 10).unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].category, "Rent");
    assert_eq!(txs[0].source, CategorySource::Rules);

    assert!(commands::cmd_transactions_list(&db, "alice", 10, false).is_ok());
    assert!(commands::cmd_transactions_list(&db, "bob", 10, true).is_ok());
}

#[tokio::test]
async fn test_cmd_add_invalid_date() {
    let dir = TempDir::new().unwrap();
    let db = setup_test_db();
    let engines = Engines::with_ai(&test_config(dir.path()), None);

    let result = commands::cmd_add(
        &db,
        &engines.cascade,
        "alice",
        "not-a-date",
        10.0,
        "Coffee",
        false,
    )
    .await;
    assert!(result.is_err());
    assert_eq!(db.count_transactions("alice").unwrap(), 0);
}

// ========== Import ==========

#[tokio::test]
async fn test_cmd_import() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let db = setup_test_db();
    let engines = Engines::with_ai(&config, None);
    let csv = write_file(
        dir.path(),
        "jan.csv",
        "Date,Amount,Description\n\
         2024-01-05,120,Walmart supermarket\n\
         2024-01-06,45,Shell gas station\n\
         2024-01-07,,Missing amount\n",
    );

    commands::cmd_import(&db, &engines.cascade, &config, "alice", &csv, false)
        .await
        .unwrap();
    assert_eq!(db.count_transactions("alice").unwrap(), 2);
}

#[tokio::test]
async fn test_cmd_import_missing_file() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let db = setup_test_db();
    let engines = Engines::with_ai(&config, None);

    let result = commands::cmd_import(
        &db,
        &engines.cascade,
        &config,
        "alice",
        &dir.path().join("nope.csv"),
        false,
    )
    .await;
    assert!(result.is_err());
}

// ========== Training ==========

#[test]
fn test_cmd_train() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let engines = Engines::with_ai(&config, None);

    let mut csv = String::from("description,category\n");
    for i in 0..10 {
        csv.push_str(&format!("netflix streaming {},Entertainment\n", i));
        csv.push_str(&format!("pharmacy prescription {},Health\n", i));
    }
    let path = write_file(dir.path(), "labelled.csv", &csv);

    commands::cmd_train(&engines.classifier, &path, "description", "category", false).unwrap();
    assert!(engines.classifier.is_available());
}

#[test]
fn test_cmd_train_missing_column() {
    let dir = TempDir::new().unwrap();
    let engines = Engines::with_ai(&test_config(dir.path()), None);
    let path = write_file(dir.path(), "bad.csv", "memo,amount\nnetflix,10\n");

    let result = commands::cmd_train(&engines.classifier, &path, "description", "category", false);
    assert!(result.is_err());
    assert!(!engines.classifier.is_available());
}

// ========== Reports ==========

#[tokio::test]
async fn test_report_commands() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let db = setup_test_db();
    let engines = Engines::with_ai(&config, None);
    let csv = write_file(
        dir.path(),
        "jan.csv",
        "date,amount,description\n\
         2024-01-05,120,Walmart supermarket\n\
         2024-01-07,2000,Rent payment\n",
    );
    commands::cmd_import(&db, &engines.cascade, &config, "alice", &csv, true)
        .await
        .unwrap();

    assert!(commands::cmd_dashboard(&db, "alice", "2024-01", false).is_ok());
    assert!(commands::cmd_trend(&db, "alice", false).is_ok());
    assert!(commands::cmd_anomalies(&db, "alice", "2024-01", false).is_ok());

    let writer = NarrativeWriter::disabled();
    assert!(commands::cmd_insights(&db, &writer, "alice", "2024-01", false)
        .await
        .is_ok());
    assert!(commands::cmd_summary(&db, &writer, "alice", "2024-01", true)
        .await
        .is_ok());
}

#[test]
fn test_report_invalid_month() {
    let db = setup_test_db();
    assert!(commands::cmd_dashboard(&db, "alice", "January", false).is_err());
    assert!(commands::cmd_anomalies(&db, "alice", "2024-00", false).is_err());
}

#[test]
fn test_cmd_budget_lifecycle() {
    let db = setup_test_db();

    commands::cmd_budget_show(&db, "alice").unwrap();
    commands::cmd_budget_set(&db, "alice", 1500.0).unwrap();
    assert_eq!(db.get_budget("alice").unwrap(), Some(1500.0));

    commands::cmd_budget_clear(&db, "alice").unwrap();
    assert_eq!(db.get_budget("alice").unwrap(), None);

    // Clearing twice is not an error
    assert!(commands::cmd_budget_clear(&db, "alice").is_ok());
    assert!(commands::cmd_budget_set(&db, "alice", -1.0).is_err());
}
