//! Runtime configuration
//!
//! Resolution order (later wins):
//! 1. Built-in defaults
//! 2. TOML file (explicit path, else `<data_local_dir>/sift/config.toml`)
//! 3. Environment overrides
//!
//! Environment variables:
//! - `SIFT_MODEL_DIR`: directory holding the classifier artifact
//! - `SIFT_CONFIDENCE_THRESHOLD`: ML acceptance threshold (0.0 - 1.0)
//! - `SIFT_GATE_ML`: whether low-confidence ML predictions escalate (true/false)
//! - `GEMINI_API_KEY`: generative provider credential (absent = provider unavailable)
//! - `GEMINI_MODEL`: generative model name
//! - `GEMINI_HOST`: generative API base URL
//! - `SIFT_DB`: SQLite database path

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

pub const DEFAULT_GEMINI_HOST: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Configuration passed to every component at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding `expense_model.json` / `model.json`
    pub model_dir: PathBuf,
    /// ML predictions below this are tentative when gating is on
    pub confidence_threshold: f64,
    pub gate_ml_on_confidence: bool,
    /// Absent means the generative stage is unavailable
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_host: String,
    pub generative_timeout_secs: u64,
    /// Budget for one row during bulk ingestion
    pub ingest_item_timeout_secs: u64,
    pub narrative_timeout_secs: u64,
    pub database_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("./artifacts"),
            confidence_threshold: 0.65,
            gate_ml_on_confidence: true,
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_host: DEFAULT_GEMINI_HOST.to_string(),
            generative_timeout_secs: 5,
            ingest_item_timeout_secs: 2,
            narrative_timeout_secs: 5,
            database_path: "sift.db".to_string(),
        }
    }
}

impl Config {
    /// Load defaults, then the config file, then the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match default_config_path() {
                Some(p) if p.exists() => Self::from_file(&p)?,
                _ => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML config file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let mut config: Config = toml::from_str(&content)?;
        config.gemini_api_key = config
            .gemini_api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        debug!(path = %path.display(), "Loaded config file");
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in `load`)
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("SIFT_MODEL_DIR") {
            self.model_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup("SIFT_CONFIDENCE_THRESHOLD") {
            self.confidence_threshold = raw.trim().parse().map_err(|_| {
                Error::Config(format!("SIFT_CONFIDENCE_THRESHOLD is not a number: {}", raw))
            })?;
        }
        if let Some(raw) = lookup("SIFT_GATE_ML") {
            self.gate_ml_on_confidence = parse_bool(&raw)
                .ok_or_else(|| Error::Config(format!("SIFT_GATE_ML is not a boolean: {}", raw)))?;
        }
        if let Some(key) = lookup("GEMINI_API_KEY") {
            let key = key.trim().to_string();
            self.gemini_api_key = if key.is_empty() { None } else { Some(key) };
        }
        if let Some(model) = lookup("GEMINI_MODEL") {
            self.gemini_model = model;
        }
        if let Some(host) = lookup("GEMINI_HOST") {
            self.gemini_host = host;
        }
        if let Some(db) = lookup("SIFT_DB") {
            self.database_path = db;
        }
        self.validate()
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(Error::Config(format!(
                "confidence_threshold must be within [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        Ok(())
    }

    pub fn generative_timeout(&self) -> Duration {
        Duration::from_secs(self.generative_timeout_secs)
    }

    pub fn ingest_item_timeout(&self) -> Duration {
        Duration::from_secs(self.ingest_item_timeout_secs)
    }

    pub fn narrative_timeout(&self) -> Duration {
        Duration::from_secs(self.narrative_timeout_secs)
    }
}

/// Default config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("sift").join("config.toml"))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.confidence_threshold, 0.65);
        assert!(config.gate_ml_on_confidence);
        assert!(config.gemini_api_key.is_none());
        assert_eq!(config.gemini_model, "gemini-1.5-flash");
        assert_eq!(config.generative_timeout(), Duration::from_secs(5));
        assert_eq!(config.ingest_item_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "confidence_threshold = 0.8\nmodel_dir = \"/tmp/models\"").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.confidence_threshold, 0.8);
        assert_eq!(config.model_dir, PathBuf::from("/tmp/models"));
        assert_eq!(config.narrative_timeout_secs, 5);
    }

    #[test]
    fn test_blank_file_api_key_is_unset() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "gemini_api_key = \"  \"").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert!(config.gemini_api_key.is_none());
        assert!(crate::ai::AIClient::from_config(&config).is_none());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("GEMINI_API_KEY", "secret"),
            ("SIFT_GATE_ML", "false"),
            ("SIFT_CONFIDENCE_THRESHOLD", "0.5"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.gemini_api_key.as_deref(), Some("secret"));
        assert!(!config.gate_ml_on_confidence);
        assert_eq!(config.confidence_threshold, 0.5);
    }

    #[test]
    fn test_blank_api_key_means_unavailable() {
        let mut config = Config::default();
        config
            .apply_env(|k| (k == "GEMINI_API_KEY").then(|| "  ".to_string()))
            .unwrap();
        assert!(config.gemini_api_key.is_none());
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        let mut config = Config::default();
        let err = config
            .apply_env(|k| (k == "SIFT_CONFIDENCE_THRESHOLD").then(|| "1.5".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
