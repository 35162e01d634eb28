//! Writing categorized transactions: single creates and CSV bulk ingestion

use std::collections::BTreeSet;
use std::io::Read;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use csv::ReaderBuilder;
use serde::Serialize;
use tracing::{debug, info};

use crate::categorize::Cascade;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{NewTransaction, Transaction};
use crate::period::month_label;

/// Outcome of a bulk CSV ingestion
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestSummary {
    pub inserted: usize,
    pub skipped: usize,
    pub min_month: Option<String>,
    pub max_month: Option<String>,
    pub latest_month: Option<String>,
}

/// Categorize then persist one transaction
pub async fn create_transaction(
    db: &Database,
    cascade: &Cascade,
    owner: &str,
    date: NaiveDateTime,
    description: &str,
    amount: f64,
) -> Result<Transaction> {
    let description = description.trim();
    if description.is_empty() {
        return Err(Error::InvalidData("Description must not be blank".into()));
    }
    if !amount.is_finite() {
        return Err(Error::InvalidData(format!("Invalid amount: {}", amount)));
    }

    let categorization = cascade.categorize(description).await;
    db.insert_transaction(&NewTransaction {
        owner: owner.to_string(),
        date,
        description: description.to_string(),
        amount,
        categorization,
    })
}

/// Ingest a CSV with `date`, `amount` and `description` columns (any case)
///
/// Rows with a blank description, a zero or unparseable amount, or a
/// missing or unparseable date are skipped. Each kept row is categorized
/// under `item_timeout`; expiry and task failures are recorded as
/// `timeout`/`fallback` sentinels rather than aborting the upload.
pub async fn ingest_csv<R: Read>(
    db: &Database,
    cascade: &Cascade,
    owner: &str,
    reader: R,
    item_timeout: Duration,
) -> Result<IngestSummary> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    let find = |name: &str| headers.iter().position(|h| h == name);

    let (date_idx, amount_idx, desc_idx) =
        match (find("date"), find("amount"), find("description")) {
            (Some(d), Some(a), Some(s)) => (d, a, s),
            (d, a, s) => {
                let missing: Vec<&str> = [("date", d), ("amount", a), ("description", s)]
                    .iter()
                    .filter(|(_, idx)| idx.is_none())
                    .map(|(name, _)| *name)
                    .collect();
                return Err(Error::InvalidData(format!(
                    "Missing required columns: {}. Found: {}",
                    missing.join(", "),
                    headers.join(", ")
                )));
            }
        };

    let mut pending = Vec::new();
    let mut months = BTreeSet::new();
    let mut skipped = 0;

    for record in rdr.records() {
        let record = record?;
        let description = record.get(desc_idx).unwrap_or("").trim();
        if description.is_empty() {
            skipped += 1;
            continue;
        }

        let amount = match record.get(amount_idx).and_then(parse_amount) {
            Some(a) if a != 0.0 => a,
            _ => {
                debug!(description, "Skipping row with zero or unparseable amount");
                skipped += 1;
                continue;
            }
        };

        let date = match record.get(date_idx).and_then(parse_date) {
            Some(d) => d,
            None => {
                debug!(description, "Skipping row with unparseable date");
                skipped += 1;
                continue;
            }
        };

        months.insert(month_label(date));
        let categorization = cascade.categorize_bounded(description, item_timeout).await;
        pending.push(NewTransaction {
            owner: owner.to_string(),
            date,
            description: description.to_string(),
            amount,
            categorization,
        });
    }

    let inserted = db.insert_transactions(&pending)?;
    let min_month = months.iter().next().cloned();
    let max_month = months.iter().next_back().cloned();

    info!(owner, inserted, skipped, "CSV ingested");

    Ok(IngestSummary {
        inserted,
        skipped,
        min_month,
        latest_month: max_month.clone(),
        max_month,
    })
}

/// Parse a date cell into a naive timestamp
///
/// Offsets are converted to UTC first, then dropped.
pub fn parse_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).naive_utc());
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",   // 2024-01-15 10:30:00
        "%Y-%m-%dT%H:%M:%S",   // 2024-01-15T10:30:00
        "%Y-%m-%d %H:%M:%S%.f", // 2024-01-15 10:30:00.123
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    for fmt in &datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    let date_formats = [
        "%Y-%m-%d", // 2024-01-15
        "%m/%d/%Y", // 01/15/2024
        "%d-%m-%Y", // 15-01-2024
    ];
    for fmt in &date_formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    None
}

/// Parse an amount string, handling currency symbols and commas
pub fn parse_amount(s: &str) -> Option<f64> {
    let cleaned: String = s
        .trim()
        .replace(['$', ',', ' '], "")
        .replace('(', "-")
        .replace(')', "");

    cleaned.parse::<f64>().ok().filter(|a| a.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::ml::{Classifier, ModelStore};
    use crate::models::CategorySource;
    use crate::period::MonthRange;

    fn setup() -> (Database, Cascade, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::in_memory().unwrap();
        let classifier = Classifier::new(ModelStore::new(dir.path()));
        let cascade = Cascade::new(&Config::default(), classifier, None);
        (db, cascade, dir)
    }

    #[test]
    fn test_parse_date_formats() {
        let expect = |s: &str, want: &str| {
            let got = parse_date(s).unwrap();
            assert_eq!(got.format("%Y-%m-%d %H:%M:%S").to_string(), want, "input {s}");
        };
        expect("2024-01-15", "2024-01-15 00:00:00");
        expect("2024-01-15 10:30:00", "2024-01-15 10:30:00");
        expect("2024-01-15T10:30:00", "2024-01-15 10:30:00");
        expect("01/15/2024", "2024-01-15 00:00:00");
        expect("15-01-2024", "2024-01-15 00:00:00");
        // Offset converted to UTC, then dropped
        expect("2024-01-31T23:30:00-02:00", "2024-02-01 01:30:00");

        assert!(parse_date("").is_none());
        assert!(parse_date("yesterday").is_none());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$1,234.56"), Some(1234.56));
        assert_eq!(parse_amount("(45.00)"), Some(-45.0));
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("NaN"), None);
    }

    #[tokio::test]
    async fn test_ingest_skips_bad_rows() {
        let (db, cascade, _dir) = setup();
        let csv = "Date,Amount,Description\n\
                   2024-01-05,120,Walmart supermarket\n\
                   2024-01-06,45,   \n\
                   2024-01-07,0,Shell gas station\n\
                   not-a-date,30,Uber ride\n\
                   ,30,Uber ride\n\
                   2024-02-01,abc,Coffee\n\
                   2024-03-02,2000,Rent payment\n";

        let summary = ingest_csv(&db, &cascade, "alice", csv.as_bytes(), Duration::from_secs(2))
            .await
            .unwrap();

        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.skipped, 5);
        assert_eq!(summary.min_month.as_deref(), Some("2024-01"));
        assert_eq!(summary.max_month.as_deref(), Some("2024-03"));
        assert_eq!(summary.latest_month, summary.max_month);

        let recent = db.recent_transactions("alice", 10).unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent.iter().all(|t| t.source == CategorySource::Rules));
    }

    #[tokio::test]
    async fn test_ingest_missing_columns() {
        let (db, cascade, _dir) = setup();
        let csv = "when,amount,memo\n2024-01-01,5,x\n";
        let err = ingest_csv(&db, &cascade, "alice", csv.as_bytes(), Duration::from_secs(2))
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("date"));
        assert!(msg.contains("description"));
        assert!(msg.contains("Found: when, amount, memo"));
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_ingest_unmatched_rows_get_default() {
        let (db, cascade, _dir) = setup();
        let csv = "date,amount,description\n2024-05-10,15.5,Quarterly membership dues\n";
        ingest_csv(&db, &cascade, "bob", csv.as_bytes(), Duration::from_secs(2))
            .await
            .unwrap();

        let may = MonthRange::parse("2024-05").unwrap();
        let txs = db.transactions_in_month("bob", &may).unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].category, "Other");
        assert_eq!(txs[0].source, CategorySource::Default);
        assert_eq!(txs[0].confidence, 0.25);
    }

    #[tokio::test]
    async fn test_create_transaction() {
        let (db, cascade, _dir) = setup();
        let date = parse_date("2024-01-07").unwrap();
        let tx = create_transaction(&db, &cascade, "alice", date, "Rent payment", 2000.0)
            .await
            .unwrap();
        assert_eq!(tx.category, "Rent");
        assert_eq!(tx.explanation, "Matched rule: Rent");

        let err = create_transaction(&db, &cascade, "alice", date, "  ", 5.0)
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }
}
