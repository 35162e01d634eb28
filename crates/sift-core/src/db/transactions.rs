//! Transaction operations

use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, parse_naive, Database};
use crate::error::Result;
use crate::models::{CategorySource, NewTransaction, Transaction};
use crate::period::{MonthRange, DATE_FORMAT};

const TRANSACTION_COLUMNS: &str =
    "id, owner, date, description, amount, category, confidence, source, explanation, created_at";

impl Database {
    /// Insert a categorized transaction and return the stored row
    pub fn insert_transaction(&self, tx: &NewTransaction) -> Result<Transaction> {
        let conn = self.conn()?;
        let cat = &tx.categorization;

        conn.execute(
            r#"
            INSERT INTO transactions (owner, date, description, amount, category, confidence, source, explanation)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                tx.owner,
                tx.date.format(DATE_FORMAT).to_string(),
                tx.description,
                tx.amount,
                cat.category,
                cat.confidence,
                cat.source.as_str(),
                cat.explanation,
            ],
        )?;

        let id = conn.last_insert_rowid();
        drop(conn);

        self.get_transaction(id)?
            .ok_or_else(|| crate::error::Error::NotFound(format!("transaction {}", id)))
    }

    /// Insert many categorized transactions in one SQLite transaction
    pub fn insert_transactions(&self, txs: &[NewTransaction]) -> Result<usize> {
        let mut conn = self.conn()?;
        let db_tx = conn.transaction()?;
        {
            let mut stmt = db_tx.prepare(
                r#"
                INSERT INTO transactions (owner, date, description, amount, category, confidence, source, explanation)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )?;
            for tx in txs {
                let cat = &tx.categorization;
                stmt.execute(params![
                    tx.owner,
                    tx.date.format(DATE_FORMAT).to_string(),
                    tx.description,
                    tx.amount,
                    cat.category,
                    cat.confidence,
                    cat.source.as_str(),
                    cat.explanation,
                ])?;
            }
        }
        db_tx.commit()?;
        Ok(txs.len())
    }

    /// Get a single transaction by ID
    pub fn get_transaction(&self, id: i64) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM transactions WHERE id = ?", TRANSACTION_COLUMNS);
        let tx = conn
            .query_row(&sql, params![id], Self::row_to_transaction)
            .optional()?;
        Ok(tx)
    }

    /// Most recent transactions for an owner, newest date first
    pub fn recent_transactions(&self, owner: &str, limit: i64) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM transactions WHERE owner = ? ORDER BY date DESC, id DESC LIMIT ?",
            TRANSACTION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let transactions = stmt
            .query_map(params![owner, limit], Self::row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(transactions)
    }

    /// All of an owner's transactions inside `[start, end)`, in insertion order
    pub fn transactions_in_month(&self, owner: &str, range: &MonthRange) -> Result<Vec<Transaction>> {
        let (start, end) = range.sql_bounds();
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM transactions WHERE owner = ? AND date >= ? AND date < ? ORDER BY id",
            TRANSACTION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let transactions = stmt
            .query_map(params![owner, start, end], Self::row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(transactions)
    }

    /// Count transactions for an owner
    pub fn count_transactions(&self, owner: &str) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE owner = ?",
            params![owner],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub(crate) fn row_to_transaction(row: &rusqlite::Row) -> rusqlite::Result<Transaction> {
        let date_str: String = row.get(2)?;
        let source_str: String = row.get(7)?;
        let created_at_str: String = row.get(9)?;
        Ok(Transaction {
            id: row.get(0)?,
            owner: row.get(1)?,
            date: parse_naive(&date_str).unwrap_or_default(),
            description: row.get(3)?,
            amount: row.get(4)?,
            category: row.get(5)?,
            confidence: row.get(6)?,
            source: source_str.parse().unwrap_or(CategorySource::Default),
            explanation: row.get(8)?,
            created_at: parse_datetime(&created_at_str),
        })
    }
}
