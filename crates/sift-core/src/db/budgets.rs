//! Monthly budget per owner

use rusqlite::{params, OptionalExtension};

use super::Database;
use crate::error::{Error, Result};

impl Database {
    /// Set (or replace) the owner's monthly budget
    pub fn set_budget(&self, owner: &str, amount: f64) -> Result<()> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(Error::InvalidData(format!(
                "Budget must be a non-negative number, got {}",
                amount
            )));
        }
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO budgets (owner, amount) VALUES (?, ?)
            ON CONFLICT(owner) DO UPDATE SET amount = excluded.amount, updated_at = CURRENT_TIMESTAMP
            "#,
            params![owner, amount],
        )?;
        Ok(())
    }

    pub fn get_budget(&self, owner: &str) -> Result<Option<f64>> {
        let conn = self.conn()?;
        let amount = conn
            .query_row(
                "SELECT amount FROM budgets WHERE owner = ?",
                params![owner],
                |row| row.get(0),
            )
            .optional()?;
        Ok(amount)
    }

    /// Remove the owner's budget; returns whether one existed
    pub fn clear_budget(&self, owner: &str) -> Result<bool> {
        let conn = self.conn()?;
        let n = conn.execute("DELETE FROM budgets WHERE owner = ?", params![owner])?;
        Ok(n > 0)
    }
}
