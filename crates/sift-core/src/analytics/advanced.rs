//! Advanced insight report: income vs. expense, budget, health score,
//! wasteful spending, prediction and yearly rollup
//!
//! Only the month parse and the month's own totals can fail the report.
//! Every other part degrades to "no signal" with a warning.

use tracing::warn;

use crate::ai::prompts::{self, NarrativeFacts};
use crate::db::{CategoryMonthTotal, Database};
use crate::error::Result;
use crate::models::{CategoryTotal, Transaction};
use crate::period::MonthRange;

use super::narrative::{fallback_insight_text, NarrativeWriter};
use super::types::{
    AdvancedReport, BudgetStatus, BudgetTracking, ExpensePrediction, IncomeExpense, MonthFlow,
    WastefulSignal, YearlyRollup,
};

/// Category names counted as income (case-insensitive exact match)
pub const INCOME_CATEGORIES: &[&str] = &[
    "salary",
    "income",
    "freelance",
    "bonus",
    "interest",
    "dividends",
    "refund",
];

/// Spending up to this percent of budget is `near_limit`
pub const NEAR_LIMIT_PCT: f64 = 110.0;
/// Minimum month-over-month increase, in percent, for a category spike
pub const SPIKE_MIN_PCT: f64 = 25.0;
/// Minimum absolute increase for a category spike
pub const SPIKE_MIN_AMOUNT: f64 = 500.0;
pub const RECURRING_PREFIX_LEN: usize = 24;
pub const RECURRING_MIN_COUNT: usize = 3;
/// Months (query month included) considered for the prediction
pub const PREDICTION_WINDOW: usize = 3;
pub const YEARLY_TOP_CATEGORIES: usize = 5;

pub fn is_income_category(category: &str) -> bool {
    let lower = category.trim().to_lowercase();
    lower.contains("salary") || lower.contains("income") || INCOME_CATEGORIES.contains(&lower.as_str())
}

/// Build the full report for one owner and month
pub async fn advanced_report(
    db: &Database,
    writer: &NarrativeWriter,
    owner: &str,
    month: &str,
) -> Result<AdvancedReport> {
    let range = MonthRange::parse(month)?;
    let label = range.label();

    let (start, end) = range.sql_bounds();
    let current = db.category_month_totals(owner, &start, &end)?;
    let totals = income_expense(&current);

    let budget = match db.get_budget(owner) {
        Ok(amount) => budget_tracking(amount, totals.expense),
        Err(e) => {
            warn!(owner, error = %e, "Budget lookup failed");
            budget_tracking(None, totals.expense)
        }
    };

    let window = range.trailing(PREDICTION_WINDOW);
    let history = match window.last() {
        Some(oldest) => {
            let (window_start, _) = oldest.sql_bounds();
            db.category_month_totals(owner, &window_start, &end)
                .map_err(|e| warn!(owner, error = %e, "History lookup failed"))
                .ok()
        }
        None => None,
    };

    let mut wasteful_signals = Vec::new();
    if let (Some(history), Some(previous)) = (&history, range.previous()) {
        let prev_label = previous.label();
        let prev_rows: Vec<CategoryMonthTotal> = history
            .iter()
            .filter(|r| r.month == prev_label)
            .cloned()
            .collect();
        wasteful_signals.extend(category_spikes(&current, &prev_rows));
    }
    match db.transactions_in_month(owner, &range) {
        Ok(transactions) => wasteful_signals.extend(recurring_charges(&transactions)),
        Err(e) => warn!(owner, error = %e, "Transaction lookup failed"),
    }

    let prediction = match &history {
        Some(history) => {
            let expenses: Vec<f64> = window
                .iter()
                .filter_map(|m| month_expense(history, &m.label()))
                .collect();
            predict_expense(&expenses)
        }
        None => predict_expense(&[]),
    };

    let (year_start, year_end) = range.year_bounds();
    let yearly = match db.category_month_totals(owner, &year_start, &year_end) {
        Ok(rows) => yearly_rollup(range.year, &rows),
        Err(e) => {
            warn!(owner, error = %e, "Yearly rollup failed");
            YearlyRollup {
                year: range.year,
                ..YearlyRollup::default()
            }
        }
    };

    let score = health_score(
        totals.savings_rate,
        budget.budget,
        totals.expense,
        wasteful_signals.len(),
    );

    let top: Vec<CategoryTotal> = totals
        .expense_by_category
        .iter()
        .take(3)
        .cloned()
        .collect();
    let facts = NarrativeFacts {
        month: &label,
        income: totals.income,
        expense: totals.expense,
        savings_rate: totals.savings_rate,
        health_score: score,
        budget_status: budget.status.as_str(),
        top_categories: &top,
        wasteful_signals: wasteful_signals.len(),
    };
    let narrative = writer
        .write(
            &prompts::insight_narrative_prompt(&facts),
            fallback_insight_text(&facts),
        )
        .await;

    Ok(AdvancedReport {
        month: label,
        totals,
        budget,
        health_score: score,
        wasteful_signals,
        prediction,
        yearly,
        narrative,
    })
}

/// Split one month's category rows into income and expense (absolute amounts)
///
/// Per-category lists are sorted largest first.
pub fn income_expense(rows: &[CategoryMonthTotal]) -> IncomeExpense {
    let mut income_by_category = Vec::new();
    let mut expense_by_category = Vec::new();
    for row in rows {
        let entry = CategoryTotal {
            category: row.category.clone(),
            total: row.abs_total,
        };
        if is_income_category(&row.category) {
            income_by_category.push(entry);
        } else {
            expense_by_category.push(entry);
        }
    }
    income_by_category.sort_by(|a, b| b.total.total_cmp(&a.total));
    expense_by_category.sort_by(|a, b| b.total.total_cmp(&a.total));

    let income: f64 = income_by_category.iter().map(|c| c.total).sum();
    let expense: f64 = expense_by_category.iter().map(|c| c.total).sum();
    let savings = income - expense;
    let savings_rate = (income > 0.0).then(|| savings / income * 100.0);

    IncomeExpense {
        income,
        expense,
        savings,
        savings_rate,
        income_by_category,
        expense_by_category,
    }
}

pub fn budget_tracking(budget: Option<f64>, spent: f64) -> BudgetTracking {
    let Some(amount) = budget else {
        return BudgetTracking {
            status: BudgetStatus::NoBudget,
            budget: None,
            spent,
            used_pct: None,
            remaining: None,
        };
    };

    let used_pct = (amount > 0.0).then(|| spent / amount * 100.0);
    // Compared on scaled amounts so 110% lands exactly on the boundary
    let status = if spent <= amount {
        BudgetStatus::WithinBudget
    } else if spent * 100.0 <= amount * NEAR_LIMIT_PCT {
        BudgetStatus::NearLimit
    } else {
        BudgetStatus::OverBudget
    };

    BudgetTracking {
        status,
        budget: Some(amount),
        spent,
        used_pct,
        remaining: Some(amount - spent),
    }
}

/// Financial health score in `[0, 100]`
pub fn health_score(
    savings_rate: Option<f64>,
    budget: Option<f64>,
    expense: f64,
    wasteful_count: usize,
) -> u8 {
    let mut score = 100.0_f64;

    match savings_rate {
        Some(rate) if rate < 0.0 => score -= 50.0,
        Some(rate) if rate < 5.0 => score -= 25.0,
        Some(rate) if rate < 15.0 => score -= 10.0,
        Some(_) => {}
        None => score -= 15.0,
    }

    if let Some(budget) = budget {
        if expense > budget {
            let overage_pct = if budget > 0.0 {
                (expense - budget) / budget * 100.0
            } else {
                f64::INFINITY
            };
            score -= (overage_pct / 2.0).min(25.0);
        }
    }

    if wasteful_count >= 3 {
        score -= 10.0;
    }

    score.clamp(0.0, 100.0).round() as u8
}

/// Expense categories whose spend jumped versus the previous month
pub fn category_spikes(
    current: &[CategoryMonthTotal],
    previous: &[CategoryMonthTotal],
) -> Vec<WastefulSignal> {
    current
        .iter()
        .filter(|row| !is_income_category(&row.category))
        .filter_map(|row| {
            let prior = previous
                .iter()
                .find(|p| p.category == row.category)
                .map(|p| p.abs_total)?;
            if prior <= 0.0 {
                return None;
            }
            let increase = row.abs_total - prior;
            let increase_pct = increase / prior * 100.0;
            let min_amount = SPIKE_MIN_AMOUNT.max(prior * 0.10);
            (increase_pct >= SPIKE_MIN_PCT && increase >= min_amount).then(|| {
                WastefulSignal::CategorySpike {
                    category: row.category.clone(),
                    previous: prior,
                    current: row.abs_total,
                    increase_pct,
                }
            })
        })
        .collect()
}

/// Expense descriptions sharing a prefix at least three times in the month
pub fn recurring_charges(transactions: &[Transaction]) -> Vec<WastefulSignal> {
    let mut groups: Vec<(String, usize, f64)> = Vec::new();
    for tx in transactions {
        if is_income_category(&tx.category) {
            continue;
        }
        let prefix: String = tx
            .description
            .trim()
            .to_lowercase()
            .chars()
            .take(RECURRING_PREFIX_LEN)
            .collect();
        let prefix = prefix.trim_end().to_string();
        if prefix.is_empty() {
            continue;
        }
        match groups.iter_mut().find(|(p, _, _)| *p == prefix) {
            Some((_, count, total)) => {
                *count += 1;
                *total += tx.amount.abs();
            }
            None => groups.push((prefix, 1, tx.amount.abs())),
        }
    }

    groups
        .into_iter()
        .filter(|(_, count, _)| *count >= RECURRING_MIN_COUNT)
        .map(|(prefix, count, total)| WastefulSignal::Recurring {
            prefix,
            count,
            total,
        })
        .collect()
}

/// Expense for `month`, `None` when the month has no rows at all
fn month_expense(rows: &[CategoryMonthTotal], month: &str) -> Option<f64> {
    let mut seen = false;
    let mut expense = 0.0;
    for row in rows.iter().filter(|r| r.month == month) {
        seen = true;
        if !is_income_category(&row.category) {
            expense += row.abs_total;
        }
    }
    seen.then_some(expense)
}

/// Mean expense over the months that have data
pub fn predict_expense(monthly_expenses: &[f64]) -> ExpensePrediction {
    let n = monthly_expenses.len();
    if n < 2 {
        return ExpensePrediction {
            predicted_expense: None,
            months_used: n,
            basis: "insufficient history".to_string(),
        };
    }
    let mean = monthly_expenses.iter().sum::<f64>() / n as f64;
    ExpensePrediction {
        predicted_expense: Some(mean),
        months_used: n,
        basis: format!("average of last {} months", n),
    }
}

/// Year totals, per-month flows and top expense categories
pub fn yearly_rollup(year: i32, rows: &[CategoryMonthTotal]) -> YearlyRollup {
    let mut months: Vec<MonthFlow> = Vec::new();
    let mut by_category: Vec<CategoryTotal> = Vec::new();

    for row in rows {
        let idx = match months.iter().position(|m| m.month == row.month) {
            Some(idx) => idx,
            None => {
                months.push(MonthFlow {
                    month: row.month.clone(),
                    income: 0.0,
                    expense: 0.0,
                });
                months.len() - 1
            }
        };
        let flow = &mut months[idx];

        if is_income_category(&row.category) {
            flow.income += row.abs_total;
            continue;
        }
        flow.expense += row.abs_total;
        match by_category.iter_mut().find(|c| c.category == row.category) {
            Some(c) => c.total += row.abs_total,
            None => by_category.push(CategoryTotal {
                category: row.category.clone(),
                total: row.abs_total,
            }),
        }
    }

    months.sort_by(|a, b| a.month.cmp(&b.month));
    by_category.sort_by(|a, b| b.total.total_cmp(&a.total));
    by_category.truncate(YEARLY_TOP_CATEGORIES);

    let income: f64 = months.iter().map(|m| m.income).sum();
    let expense: f64 = months.iter().map(|m| m.expense).sum();

    YearlyRollup {
        year,
        income,
        expense,
        savings: income - expense,
        months,
        top_categories: by_category,
    }
}
