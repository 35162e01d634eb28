//! Language-model prose over computed figures, with deterministic fallbacks

use std::time::Duration;

use tracing::{debug, warn};

use crate::ai::prompts::{self, NarrativeFacts};
use crate::ai::{AIBackend, AIClient};
use crate::config::Config;
use crate::db::Database;
use crate::error::Result;
use crate::models::CategoryTotal;
use crate::period::MonthRange;

use super::types::{MonthlySummary, Narrative};

/// Writes narratives under a short timeout; never fails
#[derive(Clone)]
pub struct NarrativeWriter {
    client: Option<AIClient>,
    timeout: Duration,
}

impl NarrativeWriter {
    pub fn new(client: Option<AIClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn from_config(config: &Config, client: Option<AIClient>) -> Self {
        Self::new(client, config.narrative_timeout())
    }

    /// A writer that always uses the fallback text
    pub fn disabled() -> Self {
        Self::new(None, Duration::ZERO)
    }

    pub fn is_available(&self) -> bool {
        self.client.is_some()
    }

    /// Generate from `prompt`, or return `fallback` when the model is
    /// missing, errors, times out or answers with nothing
    pub async fn write(&self, prompt: &str, fallback: String) -> Narrative {
        let Some(client) = &self.client else {
            return Narrative {
                text: fallback,
                ai_generated: false,
            };
        };

        match tokio::time::timeout(self.timeout, client.write_text(prompt)).await {
            Ok(Ok(text)) if !text.is_empty() => {
                debug!(model = client.model(), "Narrative generated");
                Narrative {
                    text,
                    ai_generated: true,
                }
            }
            Ok(Ok(_)) => {
                warn!("Narrative generation returned empty text");
                Narrative {
                    text: fallback,
                    ai_generated: false,
                }
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Narrative generation failed");
                Narrative {
                    text: fallback,
                    ai_generated: false,
                }
            }
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs_f64(), "Narrative generation timed out");
                Narrative {
                    text: fallback,
                    ai_generated: false,
                }
            }
        }
    }
}

/// One-sentence description of the month's health, built from the figures
pub fn fallback_insight_text(facts: &NarrativeFacts<'_>) -> String {
    let mut text = format!(
        "In {}, you earned {:.2} and spent {:.2}",
        facts.month, facts.income, facts.expense
    );
    match facts.savings_rate {
        Some(rate) => text.push_str(&format!(", a savings rate of {:.1}%", rate)),
        None => text.push_str(", with no recorded income"),
    }
    text.push_str(&format!(". Health score: {}/100", facts.health_score));
    if let Some(top) = facts.top_categories.first() {
        text.push_str(&format!(
            "; largest expense category: {} ({:.2})",
            top.category, top.total
        ));
    }
    text.push('.');
    text
}

/// Deterministic month summary used when the model is unavailable
pub fn fallback_summary_text(month: &str, total_spend: f64, breakdown: &[CategoryTotal]) -> String {
    match breakdown.first() {
        Some(top) => format!(
            "Total spend for {} was {:.2} across {} categories; the largest was {} at {:.2}.",
            month,
            total_spend,
            breakdown.len(),
            top.category,
            top.total
        ),
        None => format!("No transactions recorded for {}.", month),
    }
}

/// Category breakdown (largest first) with a narrative summary
pub async fn monthly_summary(
    db: &Database,
    writer: &NarrativeWriter,
    owner: &str,
    month: &str,
) -> Result<MonthlySummary> {
    let range = MonthRange::parse(month)?;
    let mut breakdown = db.category_totals(owner, &range)?;
    breakdown.sort_by(|a, b| b.total.total_cmp(&a.total));
    let total_spend: f64 = breakdown.iter().map(|c| c.total).sum();
    let label = range.label();

    let prompt = prompts::monthly_summary_prompt(&label, total_spend, &breakdown);
    let fallback = fallback_summary_text(&label, total_spend, &breakdown);
    let narrative = writer.write(&prompt, fallback).await;

    Ok(MonthlySummary {
        month: label,
        total_spend,
        breakdown,
        summary: narrative.text,
        ai_generated: narrative.ai_generated,
    })
}
