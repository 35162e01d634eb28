//! Report types for the analytics engine

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::CategoryTotal;

/// Where spending sits relative to the monthly budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    /// No budget set
    NoBudget,
    /// Spending at or under the budget
    WithinBudget,
    /// Over budget by at most 10%
    NearLimit,
    /// More than 10% over budget
    OverBudget,
}

impl BudgetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetStatus::NoBudget => "no_budget",
            BudgetStatus::WithinBudget => "within_budget",
            BudgetStatus::NearLimit => "near_limit",
            BudgetStatus::OverBudget => "over_budget",
        }
    }
}

impl fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BudgetStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "no_budget" => Ok(BudgetStatus::NoBudget),
            "within_budget" => Ok(BudgetStatus::WithinBudget),
            "near_limit" => Ok(BudgetStatus::NearLimit),
            "over_budget" => Ok(BudgetStatus::OverBudget),
            _ => Err(format!("Unknown budget status: {}", s)),
        }
    }
}

/// Income/expense split for one month (absolute amounts)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeExpense {
    pub income: f64,
    pub expense: f64,
    pub savings: f64,
    /// Percent of income saved; `None` without income
    pub savings_rate: Option<f64>,
    pub income_by_category: Vec<CategoryTotal>,
    pub expense_by_category: Vec<CategoryTotal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetTracking {
    pub status: BudgetStatus,
    pub budget: Option<f64>,
    pub spent: f64,
    /// `spent / budget * 100`
    pub used_pct: Option<f64>,
    pub remaining: Option<f64>,
}

/// A spending pattern worth a second look
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WastefulSignal {
    /// Category expense jumped versus the previous month
    CategorySpike {
        category: String,
        previous: f64,
        current: f64,
        increase_pct: f64,
    },
    /// Same description prefix charged repeatedly this month
    Recurring {
        prefix: String,
        count: usize,
        total: f64,
    },
}

/// Next-month expense estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpensePrediction {
    pub predicted_expense: Option<f64>,
    pub months_used: usize,
    pub basis: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthFlow {
    pub month: String,
    pub income: f64,
    pub expense: f64,
}

/// Calendar-year totals for the query month's year
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YearlyRollup {
    pub year: i32,
    pub income: f64,
    pub expense: f64,
    pub savings: f64,
    pub months: Vec<MonthFlow>,
    pub top_categories: Vec<CategoryTotal>,
}

/// Generated (or fallback) prose
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
    pub text: String,
    pub ai_generated: bool,
}

/// Full insight report for one owner and month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvancedReport {
    pub month: String,
    pub totals: IncomeExpense,
    pub budget: BudgetTracking,
    pub health_score: u8,
    pub wasteful_signals: Vec<WastefulSignal>,
    pub prediction: ExpensePrediction,
    pub yearly: YearlyRollup,
    pub narrative: Narrative,
}

/// Category breakdown plus a narrative summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub month: String,
    pub total_spend: f64,
    /// Descending by total
    pub breakdown: Vec<CategoryTotal>,
    pub summary: String,
    pub ai_generated: bool,
}
