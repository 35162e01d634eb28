//! Keyword rule table
//!
//! Rules are evaluated top to bottom and the first match wins, so table
//! position is the precedence contract. Matching is case-insensitive and
//! respects word boundaries ("rental" does not hit `rent`).

use std::sync::OnceLock;

use regex::Regex;

use crate::error::Result;
use crate::models::{CategorizeResult, CategorySource};

/// Confidence assigned to every rule match
pub const RULE_CONFIDENCE: f64 = 0.95;

/// Built-in rules: `(category, keywords)`
pub const DEFAULT_RULES: &[(&str, &[&str])] = &[
    ("Fuel", &["fuel", "petrol", "diesel", "gas station"]),
    ("Rent", &["rent", "landlord", "lease"]),
    (
        "Groceries",
        &["grocery", "supermarket", "market", "walmart", "costco", "aldi"],
    ),
    (
        "Restaurant",
        &["restaurant", "cafe", "coffee", "pizza", "burger", "dinner", "lunch"],
    ),
    ("EMI", &["emi", "installment", "loan payment", "mortgage"]),
    (
        "Transport",
        &["uber", "lyft", "taxi", "bus", "metro", "train", "transport"],
    ),
    ("Phone", &["phone", "mobile", "recharge", "top up", "airtime"]),
];

#[derive(Debug, Clone)]
struct Rule {
    category: String,
    pattern: Regex,
}

/// Ordered `(category, pattern)` table
#[derive(Debug, Clone)]
pub struct RuleMatcher {
    rules: Vec<Rule>,
}

impl RuleMatcher {
    /// Build a matcher from `(category, keywords)` pairs, preserving order
    pub fn from_keywords(table: &[(&str, &[&str])]) -> Result<Self> {
        let rules = table
            .iter()
            .map(|(category, keywords)| {
                Ok(Rule {
                    category: category.to_string(),
                    pattern: keyword_pattern(keywords)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// The process-wide built-in table
    pub fn builtin() -> &'static RuleMatcher {
        static BUILTIN: OnceLock<RuleMatcher> = OnceLock::new();
        BUILTIN.get_or_init(|| {
            RuleMatcher::from_keywords(DEFAULT_RULES).expect("valid built-in rule patterns")
        })
    }

    /// First matching rule's category, or `None` for blank/unmatched text
    pub fn matches(&self, description: &str) -> Option<CategorizeResult> {
        let text = description.trim();
        if text.is_empty() {
            return None;
        }

        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(text))
            .map(|rule| {
                CategorizeResult::new(
                    rule.category.clone(),
                    RULE_CONFIDENCE,
                    CategorySource::Rules,
                    format!("Matched rule: {}", rule.category),
                )
            })
    }

    /// Categories in precedence order
    pub fn categories(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.category.as_str()).collect()
    }
}

/// `(?i)\b(?:kw1|kw2 with spaces)\b`, keywords escaped, inner spaces optional
fn keyword_pattern(keywords: &[&str]) -> Result<Regex> {
    let alternatives: Vec<String> = keywords
        .iter()
        .map(|kw| {
            kw.split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s*")
        })
        .collect();
    Ok(Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|")))?)
}
