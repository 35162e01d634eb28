//! Categorization cascade
//!
//! Stages run in a fixed order: rules, statistical classifier, generative
//! fallback. The first accepted result wins; if every stage declines the
//! `default` sentinel is returned. Stage failures never escape as errors.

mod generative;

pub use generative::GenerativeFallback;

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::ai::AIClient;
use crate::config::Config;
use crate::ml::Classifier;
use crate::models::CategorizeResult;
use crate::rules::RuleMatcher;

/// What one stage produced for a description
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    Resolved(CategorizeResult),
    /// Stage had nothing to say (no match, no model, no credential)
    Declined,
    /// Stage errored; the message is for logs only
    Failed(String),
    TimedOut,
}

/// Closed set of cascade stages
#[derive(Clone)]
pub enum Stage {
    Rules(Arc<RuleMatcher>),
    Ml(Classifier),
    Generative(GenerativeFallback),
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Rules(_) => "rules",
            Stage::Ml(_) => "ml",
            Stage::Generative(_) => "gemini",
        }
    }

    pub async fn run(&self, description: &str) -> StageOutcome {
        match self {
            Stage::Rules(matcher) => matcher
                .matches(description)
                .map_or(StageOutcome::Declined, StageOutcome::Resolved),
            Stage::Ml(classifier) => classifier
                .predict(description)
                .map_or(StageOutcome::Declined, StageOutcome::Resolved),
            Stage::Generative(fallback) => fallback.classify(description).await,
        }
    }
}

/// Single entry point for categorizing a description
#[derive(Clone)]
pub struct Cascade {
    stages: Vec<Stage>,
    confidence_threshold: f64,
    gate_ml: bool,
}

impl Cascade {
    /// Built-in rules, the given classifier, and the generative stage when a client exists
    pub fn new(config: &Config, classifier: Classifier, ai: Option<AIClient>) -> Self {
        Self::with_rules(config, RuleMatcher::builtin().clone(), classifier, ai)
    }

    pub fn with_rules(
        config: &Config,
        rules: RuleMatcher,
        classifier: Classifier,
        ai: Option<AIClient>,
    ) -> Self {
        Self {
            stages: vec![
                Stage::Rules(Arc::new(rules)),
                Stage::Ml(classifier),
                Stage::Generative(GenerativeFallback::from_config(config, ai)),
            ],
            confidence_threshold: config.confidence_threshold,
            gate_ml: config.gate_ml_on_confidence,
        }
    }

    /// Explicit stage list, gating settings taken from `config`
    pub fn from_stages(stages: Vec<Stage>, config: &Config) -> Self {
        Self {
            stages,
            confidence_threshold: config.confidence_threshold,
            gate_ml: config.gate_ml_on_confidence,
        }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Categorize one description; always returns a complete result
    ///
    /// With gating on, an ML prediction under the threshold is held back
    /// while the generative stage is tried, and returned only if that stage
    /// produces nothing.
    ///
    /// Blank text never matches a rule but still reaches the later stages.
    pub async fn categorize(&self, description: &str) -> CategorizeResult {
        let mut tentative: Option<CategorizeResult> = None;
        let mut timed_out = false;

        for stage in &self.stages {
            match stage.run(description).await {
                StageOutcome::Resolved(result) => {
                    if matches!(stage, Stage::Ml(_))
                        && self.gate_ml
                        && result.confidence < self.confidence_threshold
                    {
                        debug!(
                            category = %result.category,
                            confidence = result.confidence,
                            threshold = self.confidence_threshold,
                            "ML prediction below threshold, escalating"
                        );
                        tentative = Some(result);
                        continue;
                    }
                    debug!(source = stage.name(), category = %result.category, "Categorized");
                    return result;
                }
                StageOutcome::Declined => {}
                StageOutcome::Failed(e) => {
                    debug!(source = stage.name(), error = %e, "Stage failed, continuing");
                }
                StageOutcome::TimedOut => timed_out = true,
            }
        }

        if let Some(result) = tentative {
            return result;
        }
        if timed_out {
            return CategorizeResult::timeout_sentinel();
        }
        CategorizeResult::default_sentinel()
    }

    /// Categorize under a time budget, isolating panics
    ///
    /// Expiry yields the `timeout` sentinel; a panic inside the task yields
    /// the `fallback` sentinel.
    pub async fn categorize_bounded(&self, description: &str, budget: Duration) -> CategorizeResult {
        let cascade = self.clone();
        let text = description.to_string();
        let handle = tokio::spawn(async move { cascade.categorize(&text).await });
        let abort = handle.abort_handle();

        match tokio::time::timeout(budget, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                let reason = if e.is_panic() {
                    panic_message(e.into_panic())
                } else {
                    e.to_string()
                };
                warn!(error = %reason, "Categorization task failed");
                CategorizeResult::fallback_sentinel(&reason)
            }
            Err(_) => {
                abort.abort();
                warn!(budget_secs = budget.as_secs_f64(), "Categorization timed out");
                CategorizeResult::timeout_sentinel()
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}
