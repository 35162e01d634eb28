//! Prompt templates for the generative provider

use crate::models::CategoryTotal;

/// Closed vocabulary offered to the model
pub const CATEGORIES: &[&str] = &[
    "Fuel",
    "Rent",
    "Groceries",
    "Restaurant",
    "EMI",
    "Transport",
    "Phone",
    "Utilities",
    "Shopping",
    "Entertainment",
    "Health",
    "Travel",
    "Education",
    "Income",
    "Other",
];

pub fn categorize_prompt(description: &str) -> String {
    format!(
        r#"You categorize personal finance transactions.
Choose exactly one category from this list: {categories}.
If none fits, use "Other".

Transaction description: "{description}"

Respond with a single JSON object and nothing else:
{{"category": "<one of the categories>", "confidence": <number between 0 and 1>, "explanation": "<short reason>"}}"#,
        categories = CATEGORIES.join(", "),
        description = description.replace('"', "'"),
    )
}

pub fn monthly_summary_prompt(month: &str, total_spend: f64, breakdown: &[CategoryTotal]) -> String {
    let lines: Vec<String> = breakdown
        .iter()
        .map(|c| format!("- {}: {:.2}", c.category, c.total))
        .collect();
    format!(
        r#"Write a short, friendly summary (under 120 words) of this person's spending for {month}.
Total spend: {total_spend:.2}
By category:
{lines}

Mention the largest categories and one practical suggestion. Plain text, no markdown."#,
        lines = if lines.is_empty() {
            "- (no transactions)".to_string()
        } else {
            lines.join("\n")
        },
    )
}

pub struct NarrativeFacts<'a> {
    pub month: &'a str,
    pub income: f64,
    pub expense: f64,
    pub savings_rate: Option<f64>,
    pub health_score: u8,
    pub budget_status: &'a str,
    pub top_categories: &'a [CategoryTotal],
    pub wasteful_signals: usize,
}

pub fn insight_narrative_prompt(facts: &NarrativeFacts<'_>) -> String {
    let top: Vec<String> = facts
        .top_categories
        .iter()
        .map(|c| format!("{} ({:.2})", c.category, c.total))
        .collect();
    format!(
        r#"You are a personal finance assistant. In 2-3 sentences, explain this month's financial health.
Month: {month}
Income: {income:.2}
Expenses: {expense:.2}
Savings rate: {rate}
Health score: {score}/100
Budget status: {budget}
Top expense categories: {top}
Wasteful spending signals: {signals}

Plain text only."#,
        month = facts.month,
        income = facts.income,
        expense = facts.expense,
        rate = facts
            .savings_rate
            .map(|r| format!("{:.1}%", r))
            .unwrap_or_else(|| "n/a".to_string()),
        score = facts.health_score,
        budget = facts.budget_status,
        top = if top.is_empty() {
            "none".to_string()
        } else {
            top.join(", ")
        },
        signals = facts.wasteful_signals,
    )
}
