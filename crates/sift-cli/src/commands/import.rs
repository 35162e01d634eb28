//! CSV ingestion command

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use sift_core::{ingest, Cascade, Config, Database};

use super::print_json;

pub async fn cmd_import(
    db: &Database,
    cascade: &Cascade,
    config: &Config,
    owner: &str,
    file: &Path,
    json: bool,
) -> Result<()> {
    let csv_file =
        File::open(file).with_context(|| format!("Failed to open file: {}", file.display()))?;

    if !json {
        println!("📥 Importing {} for {}...", file.display(), owner);
    }

    let summary = ingest::ingest_csv(
        db,
        cascade,
        owner,
        BufReader::new(csv_file),
        config.ingest_item_timeout(),
    )
    .await
    .context("Import failed")?;

    if json {
        return print_json(&summary);
    }

    println!();
    println!("✅ Import complete");
    println!("   Inserted: {}", summary.inserted);
    if summary.skipped > 0 {
        println!("   Skipped:  {} (missing date, amount or description)", summary.skipped);
    }
    if let (Some(min), Some(max)) = (&summary.min_month, &summary.max_month) {
        println!("   Months:   {} to {}", min, max);
    }
    if let Some(latest) = &summary.latest_month {
        println!();
        println!("   View it with: sift dashboard --month {}", latest);
    }

    Ok(())
}
