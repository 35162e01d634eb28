//! Z-score outliers within a month

use crate::db::Database;
use crate::error::Result;
use crate::models::{AnomalyPoint, Transaction};
use crate::period::MonthRange;

/// Fewer transactions than this yields no anomalies
pub const MIN_SAMPLE: usize = 5;
/// Flag amounts at least this many standard deviations above the mean
pub const Z_THRESHOLD: f64 = 2.5;

/// Outlier transactions for an owner's month, highest z-score first
pub fn detect_anomalies(db: &Database, owner: &str, month: &str) -> Result<Vec<AnomalyPoint>> {
    let range = MonthRange::parse(month)?;
    let transactions = db.transactions_in_month(owner, &range)?;
    Ok(zscore_outliers(&transactions))
}

/// Population mean/std over the amounts; a zero std is treated as 1.0
pub fn zscore_outliers(transactions: &[Transaction]) -> Vec<AnomalyPoint> {
    if transactions.len() < MIN_SAMPLE {
        return Vec::new();
    }

    let n = transactions.len() as f64;
    let mean = transactions.iter().map(|t| t.amount).sum::<f64>() / n;
    let variance = transactions
        .iter()
        .map(|t| (t.amount - mean).powi(2))
        .sum::<f64>()
        / n;
    let std = if variance > 0.0 { variance.sqrt() } else { 1.0 };

    let mut out: Vec<AnomalyPoint> = transactions
        .iter()
        .filter_map(|t| {
            let z = (t.amount - mean) / std;
            (z >= Z_THRESHOLD).then(|| AnomalyPoint {
                id: t.id,
                date: t.date,
                amount: t.amount,
                description: t.description.clone(),
                zscore: z,
            })
        })
        .collect();

    out.sort_by(|a, b| b.zscore.total_cmp(&a.zscore));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategorySource;
    use chrono::{Duration, NaiveDate, Utc};

    fn tx(id: i64, amount: f64) -> Transaction {
        Transaction {
            id,
            owner: "alice".into(),
            date: (NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(id))
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            description: format!("tx {}", id),
            amount,
            category: "Other".into(),
            confidence: 0.25,
            source: CategorySource::Default,
            explanation: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_fewer_than_five_is_empty() {
        let txs: Vec<Transaction> = [10.0, 10.0, 10.0, 10_000.0]
            .iter()
            .enumerate()
            .map(|(i, &a)| tx(i as i64, a))
            .collect();
        assert!(zscore_outliers(&txs).is_empty());
    }

    #[test]
    fn test_single_outlier_flagged() {
        let mut txs: Vec<Transaction> = (0..9).map(|i| tx(i, 10.0)).collect();
        txs.push(tx(9, 1000.0));

        let out = zscore_outliers(&txs);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, 9);
        // 9 equal values and one outlier: z = 3.0 exactly
        assert!((out[0].zscore - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_constant_amounts_no_anomalies() {
        let txs: Vec<Transaction> = (0..6).map(|i| tx(i, 42.0)).collect();
        assert!(zscore_outliers(&txs).is_empty());
    }

    #[test]
    fn test_sorted_by_zscore_desc() {
        let mut txs: Vec<Transaction> = (0..30).map(|i| tx(i, 10.0)).collect();
        txs.push(tx(30, 500.0));
        txs.push(tx(31, 900.0));

        let out = zscore_outliers(&txs);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].id, 31);
        assert_eq!(out[1].id, 30);
        assert!(out[0].zscore >= out[1].zscore);
        assert!(out.iter().all(|a| a.zscore >= 2.5));
    }

    #[test]
    fn test_invalid_month() {
        let db = Database::in_memory().unwrap();
        assert!(detect_anomalies(&db, "alice", "2024-13").is_err());
        assert!(detect_anomalies(&db, "alice", "2024-02").unwrap().is_empty());
    }
}
