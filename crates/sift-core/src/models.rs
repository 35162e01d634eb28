//! Domain models for Sift

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical label for anything the cascade could not place
pub const DEFAULT_CATEGORY: &str = "Other";

/// Confidence carried by every sentinel result (default, timeout, fallback)
pub const SENTINEL_CONFIDENCE: f64 = 0.25;

/// Which cascade stage (or sentinel condition) produced a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategorySource {
    /// Matched the static rule table
    Rules,
    /// Predicted by the trained statistical classifier
    Ml,
    /// Classified by the generative language model
    Gemini,
    /// Categorization did not finish within the caller's time budget
    Timeout,
    /// Categorization failed unexpectedly; recorded so ingestion can continue
    Fallback,
    /// No stage produced a result
    Default,
}

impl CategorySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rules => "rules",
            Self::Ml => "ml",
            Self::Gemini => "gemini",
            Self::Timeout => "timeout",
            Self::Fallback => "fallback",
            Self::Default => "default",
        }
    }

    /// True for the sources that mean "no resolver actually decided"
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Self::Timeout | Self::Fallback | Self::Default)
    }
}

impl std::str::FromStr for CategorySource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rules" => Ok(Self::Rules),
            "ml" => Ok(Self::Ml),
            "gemini" => Ok(Self::Gemini),
            "timeout" => Ok(Self::Timeout),
            "fallback" => Ok(Self::Fallback),
            "default" => Ok(Self::Default),
            _ => Err(format!("Unknown category source: {}", s)),
        }
    }
}

impl std::fmt::Display for CategorySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of categorizing one description
///
/// Always complete: every field is populated even when nothing matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizeResult {
    pub category: String,
    pub confidence: f64,
    pub source: CategorySource,
    pub explanation: String,
}

impl CategorizeResult {
    pub fn new(
        category: impl Into<String>,
        confidence: f64,
        source: CategorySource,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            confidence: confidence.clamp(0.0, 1.0),
            source,
            explanation: explanation.into(),
        }
    }

    /// Result when every stage declined
    pub fn default_sentinel() -> Self {
        Self::new(
            DEFAULT_CATEGORY,
            SENTINEL_CONFIDENCE,
            CategorySource::Default,
            "No rule match; ML unavailable/low confidence; Gemini unavailable",
        )
    }

    /// Result when categorization exceeded its time budget
    pub fn timeout_sentinel() -> Self {
        Self::new(
            DEFAULT_CATEGORY,
            SENTINEL_CONFIDENCE,
            CategorySource::Timeout,
            "Categorization timed out",
        )
    }

    /// Result when categorization failed unexpectedly
    pub fn fallback_sentinel(reason: &str) -> Self {
        let reason: String = reason.chars().take(100).collect();
        Self::new(
            DEFAULT_CATEGORY,
            SENTINEL_CONFIDENCE,
            CategorySource::Fallback,
            format!("Categorization failed: {}", reason),
        )
    }
}

/// A categorized transaction as persisted in the store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub owner: String,
    pub date: NaiveDateTime,
    pub description: String,
    pub amount: f64,
    pub category: String,
    pub confidence: f64,
    pub source: CategorySource,
    pub explanation: String,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// `YYYY-MM` bucket of the transaction date
    pub fn month(&self) -> String {
        self.date.format("%Y-%m").to_string()
    }
}

/// Transaction ready to be written (already categorized)
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub owner: String,
    pub date: NaiveDateTime,
    pub description: String,
    pub amount: f64,
    pub categorization: CategorizeResult,
}

/// Summed amount for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

/// Dashboard KPIs for one month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub month: String,
    pub total_spend: f64,
    pub top_category: Option<String>,
    pub top_category_spend: f64,
    pub avg_confidence: Option<f64>,
}

/// Total spend for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub month: String,
    pub total_spend: f64,
}

/// A transaction whose amount is a statistical outlier for its month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyPoint {
    pub id: i64,
    pub date: NaiveDateTime,
    pub amount: f64,
    pub description: String,
    pub zscore: f64,
}

/// Total and per-category spend for one month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthSummary {
    pub month: String,
    pub total_spend: f64,
    pub by_category: Vec<CategoryTotal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_source_roundtrip() {
        for source in [
            CategorySource::Rules,
            CategorySource::Ml,
            CategorySource::Gemini,
            CategorySource::Timeout,
            CategorySource::Fallback,
            CategorySource::Default,
        ] {
            let parsed: CategorySource = source.as_str().parse().unwrap();
            assert_eq!(parsed, source);
        }
        assert!("llm".parse::<CategorySource>().is_err());
    }

    #[test]
    fn test_sentinels() {
        let d = CategorizeResult::default_sentinel();
        assert_eq!(d.category, "Other");
        assert_eq!(d.confidence, 0.25);
        assert_eq!(d.source, CategorySource::Default);

        let t = CategorizeResult::timeout_sentinel();
        assert_eq!(t.source, CategorySource::Timeout);
        assert_eq!(t.confidence, 0.25);

        let long_reason = "x".repeat(500);
        let f = CategorizeResult::fallback_sentinel(&long_reason);
        assert_eq!(f.source, CategorySource::Fallback);
        assert!(f.explanation.len() < 130);
    }

    #[test]
    fn test_confidence_is_clamped() {
        let r = CategorizeResult::new("Rent", 1.7, CategorySource::Gemini, "");
        assert_eq!(r.confidence, 1.0);
        let r = CategorizeResult::new("Rent", -0.2, CategorySource::Gemini, "");
        assert_eq!(r.confidence, 0.0);
    }

    #[test]
    fn test_serde_source_lowercase() {
        let json = serde_json::to_string(&CategorySource::Gemini).unwrap();
        assert_eq!(json, "\"gemini\"");
    }
}
