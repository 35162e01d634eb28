//! Sift CLI - Transaction categorization and spending analytics
//!
//! Usage:
//!   sift init                   Initialize database
//!   sift import --file CSV      Ingest and categorize transactions
//!   sift train --file CSV       Train the statistical classifier
//!   sift insights --month M     Advanced insight report
//!   sift serve --port 3000      Start web server

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = commands::load_config(cli.config.as_deref(), cli.db.as_deref())?;
    let owner = cli.owner.as_str();
    let json = cli.json;

    match cli.command {
        Commands::Init => commands::cmd_init(&config),
        Commands::Status => commands::cmd_status(&config, owner).await,
        Commands::Serve { port, host } => commands::cmd_serve(config, &host, port).await,
        Commands::Categorize { description } => {
            let engines = commands::Engines::from_config(&config);
            commands::cmd_categorize(&engines.cascade, &description, json).await
        }
        Commands::Train {
            file,
            text_column,
            label_column,
        } => {
            let engines = commands::Engines::from_config(&config);
            commands::cmd_train(&engines.classifier, &file, &text_column, &label_column, json)
        }
        Commands::Import { file } => {
            let db = commands::open_db(&config)?;
            let engines = commands::Engines::from_config(&config);
            commands::cmd_import(&db, &engines.cascade, &config, owner, &file, json).await
        }
        Commands::Add {
            date,
            amount,
            description,
        } => {
            let db = commands::open_db(&config)?;
            let engines = commands::Engines::from_config(&config);
            commands::cmd_add(&db, &engines.cascade, owner, &date, amount, &description, json)
                .await
        }
        Commands::Transactions { limit } => {
            let db = commands::open_db(&config)?;
            commands::cmd_transactions_list(&db, owner, limit, json)
        }
        Commands::Dashboard { month } => {
            let db = commands::open_db(&config)?;
            let month = commands::resolve_month(month);
            commands::cmd_dashboard(&db, owner, &month, json)
        }
        Commands::Trend => {
            let db = commands::open_db(&config)?;
            commands::cmd_trend(&db, owner, json)
        }
        Commands::Anomalies { month } => {
            let db = commands::open_db(&config)?;
            let month = commands::resolve_month(month);
            commands::cmd_anomalies(&db, owner, &month, json)
        }
        Commands::Insights { month } => {
            let db = commands::open_db(&config)?;
            let engines = commands::Engines::from_config(&config);
            let month = commands::resolve_month(month);
            commands::cmd_insights(&db, &engines.narratives, owner, &month, json).await
        }
        Commands::Summary { month } => {
            let db = commands::open_db(&config)?;
            let engines = commands::Engines::from_config(&config);
            let month = commands::resolve_month(month);
            commands::cmd_summary(&db, &engines.narratives, owner, &month, json).await
        }
        Commands::Budget { action } => {
            let db = commands::open_db(&config)?;
            match action {
                None => commands::cmd_budget_show(&db, owner),
                Some(BudgetAction::Set { amount }) => commands::cmd_budget_set(&db, owner, amount),
                Some(BudgetAction::Clear) => commands::cmd_budget_clear(&db, owner),
            }
        }
    }
}
