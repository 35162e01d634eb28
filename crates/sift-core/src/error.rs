//! Error types for Sift

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Month must be YYYY-MM, got {0:?}")]
    InvalidMonth(String),

    #[error("Dataset not found: {0}")]
    DatasetNotFound(String),

    #[error("Missing {kind} column: {column}. Columns: {available:?}")]
    MissingColumn {
        kind: &'static str,
        column: String,
        available: Vec<String>,
    },

    #[error("Training error: {0}")]
    Training(String),

    #[error("Model artifact error: {0}")]
    ModelArtifact(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Whether this error was caused by bad caller input (as opposed to an
    /// infrastructure failure). Used by the server to pick a 400 over a 500.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidMonth(_)
                | Error::DatasetNotFound(_)
                | Error::MissingColumn { .. }
                | Error::Training(_)
                | Error::InvalidData(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
