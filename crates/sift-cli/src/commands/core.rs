//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `load_config` / `open_db` - Shared setup for every command
//! - `Engines` - Classifier, cascade and narrative writer built from config
//! - `cmd_init`, `cmd_status`, `cmd_categorize`

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use sift_core::analytics::NarrativeWriter;
use sift_core::{AIBackend, AIClient, Cascade, Classifier, Config, Database, ModelStore};

use super::print_json;

/// Load configuration, letting `--db` win over the file and environment
pub fn load_config(config_path: Option<&Path>, db_path: Option<&Path>) -> Result<Config> {
    let mut config = Config::load(config_path).context("Failed to load configuration")?;
    if let Some(db) = db_path {
        config.database_path = db
            .to_str()
            .context("Database path must be valid UTF-8")?
            .to_string();
    }
    Ok(config)
}

/// Open the database named by the configuration
pub fn open_db(config: &Config) -> Result<Database> {
    Database::new(&config.database_path)
        .with_context(|| format!("Failed to open database at {}", config.database_path))
}

/// `YYYY-MM` given on the command line, or the current UTC month
pub fn resolve_month(month: Option<String>) -> String {
    month.unwrap_or_else(|| Utc::now().format("%Y-%m").to_string())
}

/// Everything that categorizes or writes prose, wired from one config
pub struct Engines {
    pub ai: Option<AIClient>,
    pub classifier: Classifier,
    pub cascade: Cascade,
    pub narratives: NarrativeWriter,
}

impl Engines {
    pub fn from_config(config: &Config) -> Self {
        Self::with_ai(config, AIClient::from_config(config))
    }

    pub fn with_ai(config: &Config, ai: Option<AIClient>) -> Self {
        let classifier = Classifier::new(ModelStore::new(&config.model_dir));
        let cascade = Cascade::new(config, classifier.clone(), ai.clone());
        let narratives = NarrativeWriter::from_config(config, ai.clone());
        Self {
            ai,
            classifier,
            cascade,
            narratives,
        }
    }
}

pub fn cmd_init(config: &Config) -> Result<()> {
    println!(
        "🔧 Initializing database at {}...",
        config.database_path
    );

    open_db(config)?;
    std::fs::create_dir_all(&config.model_dir).with_context(|| {
        format!(
            "Failed to create model directory {}",
            config.model_dir.display()
        )
    })?;
    println!("   Model directory: {}", config.model_dir.display());

    if config.gemini_api_key.is_some() {
        println!("   🤖 Gemini: configured ({})", config.gemini_model);
    } else {
        println!("   💡 Tip: Set GEMINI_API_KEY to enable the generative fallback");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Import transactions: sift import --file statement.csv");
    println!("  2. Train a classifier:  sift train --file labelled.csv");
    println!("  3. Start web API:       sift serve");

    Ok(())
}

pub async fn cmd_categorize(cascade: &Cascade, description: &str, json: bool) -> Result<()> {
    let result = cascade.categorize(description).await;

    if json {
        return print_json(&result);
    }

    println!();
    println!("🏷️  {}", description);
    println!("   Category:    {}", result.category);
    println!("   Confidence:  {:.2}", result.confidence);
    println!("   Source:      {}", result.source);
    println!("   Explanation: {}", result.explanation);

    Ok(())
}

pub async fn cmd_status(config: &Config, owner: &str) -> Result<()> {
    println!();
    println!("📊 Sift Status");
    println!("   ─────────────────────────────────────────────────────────────");

    let db_path = Path::new(&config.database_path);
    println!("   Database: {}", db_path.display());
    if db_path.exists() {
        if let Ok(metadata) = std::fs::metadata(db_path) {
            let size_kb = metadata.len() as f64 / 1024.0;
            if size_kb < 1024.0 {
                println!("   Size: {:.1} KB", size_kb);
            } else {
                println!("   Size: {:.1} MB", size_kb / 1024.0);
            }
        }
        match open_db(config) {
            Ok(db) => {
                if let Ok(count) = db.count_transactions(owner) {
                    println!("   Transactions ({}): {}", owner, count);
                }
            }
            Err(e) => println!("   ❌ Error opening database: {}", e),
        }
    } else {
        println!("   Size: (database not initialized)");
    }

    let engines = Engines::from_config(config);
    println!();
    if engines.classifier.is_available() {
        println!("   ✅ Classifier: loaded from {}", config.model_dir.display());
    } else {
        println!(
            "   ⚠️  Classifier: no artifact in {} (run `sift train`)",
            config.model_dir.display()
        );
    }
    println!(
        "   ML gating: {} (threshold {:.2})",
        if config.gate_ml_on_confidence { "on" } else { "off" },
        config.confidence_threshold
    );

    match &engines.ai {
        Some(client) => {
            if client.health_check().await {
                println!("   ✅ Gemini: {} ({})", client.model(), client.host());
            } else {
                println!(
                    "   ❌ Gemini: configured but not responding ({})",
                    client.host()
                );
            }
        }
        None => println!("   ⚠️  Gemini: not configured (set GEMINI_API_KEY)"),
    }

    println!();
    Ok(())
}
