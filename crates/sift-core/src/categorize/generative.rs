//! Last-resort categorization through the language model

use std::time::Duration;

use tracing::{debug, warn};

use crate::ai::{AIBackend, AIClient};
use crate::config::Config;

use super::StageOutcome;

/// Generative stage: declines without a client, never returns an error
#[derive(Clone)]
pub struct GenerativeFallback {
    client: Option<AIClient>,
    timeout: Duration,
}

impl GenerativeFallback {
    pub fn new(client: Option<AIClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn from_config(config: &Config, client: Option<AIClient>) -> Self {
        Self::new(client, config.generative_timeout())
    }

    pub fn is_available(&self) -> bool {
        self.client.is_some()
    }

    pub fn client(&self) -> Option<&AIClient> {
        self.client.as_ref()
    }

    pub async fn classify(&self, description: &str) -> StageOutcome {
        let Some(client) = &self.client else {
            return StageOutcome::Declined;
        };

        match tokio::time::timeout(self.timeout, client.classify_description(description)).await {
            Ok(Ok(result)) => {
                debug!(model = client.model(), category = %result.category, "Generative stage resolved");
                StageOutcome::Resolved(result)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Generative categorization failed");
                StageOutcome::Failed(e.to_string())
            }
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs_f64(), "Generative categorization timed out");
                StageOutcome::TimedOut
            }
        }
    }
}
