//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Sift - Categorize transactions and explain your spending
#[derive(Parser)]
#[command(name = "sift")]
#[command(about = "Transaction categorization and spending analytics", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path (overrides the config file and SIFT_DB)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Config file (defaults to the platform data directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Owner whose transactions are read and written
    #[arg(long, default_value = "default", global = true)]
    pub owner: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print JSON instead of formatted output
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and model directory
    Init,

    /// Import transactions from a CSV with date, amount and description columns
    Import {
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Categorize and store a single transaction
    Add {
        /// Transaction date (YYYY-MM-DD and common variants)
        #[arg(long)]
        date: String,

        /// Amount (positive for expenses)
        #[arg(long, allow_hyphen_values = true)]
        amount: f64,

        /// Free-text description
        #[arg(long)]
        description: String,
    },

    /// Categorize a description without storing anything
    Categorize {
        /// Description to categorize
        description: String,
    },

    /// Train the statistical classifier from a labelled CSV
    Train {
        /// Labelled CSV file
        #[arg(short, long)]
        file: PathBuf,

        /// Column holding the description text
        #[arg(long, default_value = "description")]
        text_column: String,

        /// Column holding the category label
        #[arg(long, default_value = "category")]
        label_column: String,
    },

    /// Show total spend, top category and mean confidence for a month
    Dashboard {
        /// Month as YYYY-MM (defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Show total spend per month
    Trend,

    /// List unusually large transactions in a month
    Anomalies {
        /// Month as YYYY-MM (defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Full insight report: income vs expense, budget, health score, signals
    Insights {
        /// Month as YYYY-MM (defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Category breakdown with a narrative summary
    Summary {
        /// Month as YYYY-MM (defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Show or change the monthly budget
    Budget {
        #[command(subcommand)]
        action: Option<BudgetAction>,
    },

    /// List recent transactions
    Transactions {
        /// Maximum number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },

    /// Show database, classifier and generative backend status
    Status,

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

#[derive(Subcommand)]
pub enum BudgetAction {
    /// Set the monthly budget
    Set {
        /// Budget amount
        amount: f64,
    },
    /// Remove the monthly budget
    Clear,
}
