//! Sift Core Library
//!
//! Shared functionality for the Sift spending tool:
//! - Database access and migrations
//! - Categorization cascade (keyword rules, statistical model, Gemini)
//! - TF-IDF + logistic regression trainer and model artifacts
//! - CSV ingestion
//! - Dashboards, anomaly detection and insight reports

pub mod ai;
pub mod analytics;
pub mod categorize;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod ml;
pub mod models;
pub mod period;
pub mod rules;

/// Test utilities including mock Gemini server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{AIBackend, AIClient, GeminiBackend, MockBackend};
pub use categorize::{Cascade, GenerativeFallback, Stage, StageOutcome};
pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
pub use ingest::IngestSummary;
pub use ml::{Classifier, ModelStore, ModelTrainer, TrainingOptions, TrainingReport};
pub use period::MonthRange;
pub use rules::RuleMatcher;
