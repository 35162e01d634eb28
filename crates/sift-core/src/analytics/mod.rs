//! Analytics - dashboards, anomalies and insight reports
//!
//! Every operation is scoped to one owner. Month arguments are `YYYY-MM`
//! strings, validated before any query runs.
//!
//! ## Reports
//!
//! - **Dashboard** - total spend, top category, mean confidence
//! - **Trend** - total spend per calendar month
//! - **Anomalies** - z-score outliers within a month
//! - **Advanced report** - income vs. expense, budget, health score,
//!   wasteful spending, prediction and yearly rollup
//! - **Monthly summary** - category breakdown with a narrative
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sift_core::analytics::{advanced_report, NarrativeWriter};
//!
//! let writer = NarrativeWriter::from_config(&config, AIClient::from_config(&config));
//! let report = advanced_report(&db, &writer, "alice", "2024-03").await?;
//! ```

pub mod advanced;
pub mod anomalies;
pub mod dashboard;
pub mod narrative;
pub mod types;

pub use advanced::{advanced_report, budget_tracking, health_score, is_income_category};
pub use anomalies::{detect_anomalies, zscore_outliers};
pub use dashboard::{dashboard_summary, month_summary, trend};
pub use narrative::{monthly_summary, NarrativeWriter};
pub use types::{
    AdvancedReport, BudgetStatus, BudgetTracking, ExpensePrediction, IncomeExpense, MonthFlow,
    MonthlySummary, Narrative, WastefulSignal, YearlyRollup,
};
