//! Dashboard KPIs, trend series and month summaries

use crate::db::Database;
use crate::error::Result;
use crate::models::{CategoryTotal, DashboardSummary, MonthSummary, TrendPoint};
use crate::period::MonthRange;

/// Total spend, top category and mean confidence for a month
pub fn dashboard_summary(db: &Database, owner: &str, month: &str) -> Result<DashboardSummary> {
    let range = MonthRange::parse(month)?;

    let totals = db.category_totals(owner, &range)?;
    let total_spend: f64 = totals.iter().map(|c| c.total).sum();
    let (top_category, top_category_spend) = top_category(&totals);
    let avg_confidence = db.avg_confidence(owner, &range)?;

    Ok(DashboardSummary {
        month: range.label(),
        total_spend,
        top_category,
        top_category_spend,
        avg_confidence,
    })
}

/// Largest positive total; earlier categories win ties
fn top_category(totals: &[CategoryTotal]) -> (Option<String>, f64) {
    let mut top: Option<&CategoryTotal> = None;
    let mut top_spend = 0.0;
    for c in totals {
        if c.total > top_spend {
            top_spend = c.total;
            top = Some(c);
        }
    }
    (top.map(|c| c.category.clone()), top_spend)
}

/// Total spend per calendar month, ascending
pub fn trend(db: &Database, owner: &str) -> Result<Vec<TrendPoint>> {
    db.monthly_totals(owner)
}

/// Total plus per-category spend for a month
pub fn month_summary(db: &Database, owner: &str, month: &str) -> Result<MonthSummary> {
    let range = MonthRange::parse(month)?;
    let by_category = db.category_totals(owner, &range)?;
    let total_spend = by_category.iter().map(|c| c.total).sum();
    Ok(MonthSummary {
        month: range.label(),
        total_spend,
        by_category,
    })
}
