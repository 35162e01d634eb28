//! Transaction command implementations

use anyhow::{Context, Result};
use sift_core::{ingest, Cascade, Database};

use super::{print_json, truncate};

pub async fn cmd_add(
    db: &Database,
    cascade: &Cascade,
    owner: &str,
    date: &str,
    amount: f64,
    description: &str,
    json: bool,
) -> Result<()> {
    let date = ingest::parse_date(date).with_context(|| format!("Invalid date: {}", date))?;
    let tx = ingest::create_transaction(db, cascade, owner, date, description, amount).await?;

    if json {
        return print_json(&tx);
    }

    println!(
        "✅ Added #{}: {} → {} ({:.2}, {})",
        tx.id, tx.description, tx.category, tx.confidence, tx.source
    );
    Ok(())
}

pub fn cmd_transactions_list(db: &Database, owner: &str, limit: i64, json: bool) -> Result<()> {
    let transactions = db.recent_transactions(owner, limit)?;

    if json {
        return print_json(&transactions);
    }

    if transactions.is_empty() {
        println!("No transactions found. Import some with:");
        println!("  sift import --file statement.csv");
        return Ok(());
    }

    println!();
    println!("📝 Recent Transactions");
    println!("   ─────────────────────────────────────────────────────────────");

    for tx in transactions {
        println!(
            "   {} │ {:>10.2} │ {:<14} │ {}",
            tx.date.format("%Y-%m-%d"),
            tx.amount,
            truncate(&tx.category, 14),
            truncate(&tx.description, 40)
        );
    }

    Ok(())
}
