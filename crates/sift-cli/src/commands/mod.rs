//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (config, open_db, engines) plus init, status, categorize
//! - `import` - CSV ingestion
//! - `reports` - Dashboard, trend, anomalies, insights, summary and budget
//! - `serve` - Web server command
//! - `training` - Classifier training
//! - `transactions` - Transaction commands (add, list)

pub mod core;
pub mod import;
pub mod reports;
pub mod serve;
pub mod training;
pub mod transactions;

// Re-export command functions for main.rs
pub use core::*;
pub use import::*;
pub use reports::*;
pub use serve::*;
pub use training::*;
pub use transactions::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Print a value as pretty JSON
pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
