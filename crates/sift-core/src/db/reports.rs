//! Grouped aggregations for dashboards and reports

use rusqlite::params;
use serde::Serialize;

use super::Database;
use crate::error::Result;
use crate::models::{CategoryTotal, TrendPoint};
use crate::period::MonthRange;

/// Per-month, per-category totals used by the advanced report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryMonthTotal {
    pub month: String,
    pub category: String,
    /// Signed sum of amounts
    pub total: f64,
    /// Sum of absolute amounts
    pub abs_total: f64,
    pub count: i64,
}

impl Database {
    /// Sum of amounts in the month (0.0 when empty)
    pub fn month_total(&self, owner: &str, range: &MonthRange) -> Result<f64> {
        let (start, end) = range.sql_bounds();
        let conn = self.conn()?;
        let total: f64 = conn.query_row(
            "SELECT COALESCE(SUM(amount), 0.0) FROM transactions WHERE owner = ? AND date >= ? AND date < ?",
            params![owner, start, end],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// Per-category sums for the month, in order of first appearance
    pub fn category_totals(&self, owner: &str, range: &MonthRange) -> Result<Vec<CategoryTotal>> {
        let (start, end) = range.sql_bounds();
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT category, SUM(amount)
            FROM transactions
            WHERE owner = ? AND date >= ? AND date < ?
            GROUP BY category
            ORDER BY MIN(id)
            "#,
        )?;
        let totals = stmt
            .query_map(params![owner, start, end], |row| {
                Ok(CategoryTotal {
                    category: row.get(0)?,
                    total: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(totals)
    }

    /// Mean confidence for the month, `None` when there are no rows
    pub fn avg_confidence(&self, owner: &str, range: &MonthRange) -> Result<Option<f64>> {
        let (start, end) = range.sql_bounds();
        let conn = self.conn()?;
        let avg: Option<f64> = conn.query_row(
            "SELECT AVG(confidence) FROM transactions WHERE owner = ? AND date >= ? AND date < ? AND confidence IS NOT NULL",
            params![owner, start, end],
            |row| row.get(0),
        )?;
        Ok(avg)
    }

    /// Total spend per calendar month, ascending
    pub fn monthly_totals(&self, owner: &str) -> Result<Vec<TrendPoint>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT strftime('%Y-%m', date) AS month, SUM(amount)
            FROM transactions
            WHERE owner = ?
            GROUP BY month
            ORDER BY month ASC
            "#,
        )?;
        let points = stmt
            .query_map(params![owner], |row| {
                Ok(TrendPoint {
                    month: row.get(0)?,
                    total_spend: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(points)
    }

    /// Month/category totals for an arbitrary `[start, end)` window of stored dates
    pub fn category_month_totals(
        &self,
        owner: &str,
        start: &str,
        end: &str,
    ) -> Result<Vec<CategoryMonthTotal>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT strftime('%Y-%m', date) AS month, category, SUM(amount), SUM(ABS(amount)), COUNT(*)
            FROM transactions
            WHERE owner = ? AND date >= ? AND date < ?
            GROUP BY month, category
            ORDER BY month ASC, MIN(id) ASC
            "#,
        )?;
        let totals = stmt
            .query_map(params![owner, start, end], |row| {
                Ok(CategoryMonthTotal {
                    month: row.get(0)?,
                    category: row.get(1)?,
                    total: row.get(2)?,
                    abs_total: row.get(3)?,
                    count: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(totals)
    }
}
