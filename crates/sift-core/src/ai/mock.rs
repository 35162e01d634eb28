//! Mock backend for testing
//!
//! Returns a canned response (or error) and counts calls, so tests can
//! observe whether a cascade stage was reached.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::types::ResponseFormat;
use super::AIBackend;

#[derive(Clone)]
enum MockReply {
    Text(String),
    Fail(String),
    Panic(String),
}

/// Mock AI backend for testing
#[derive(Clone)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    reply: MockReply,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Healthy mock that answers with an `Other` category reply
    pub fn new() -> Self {
        Self {
            healthy: true,
            reply: MockReply::Text(
                r#"{"category": "Other", "confidence": 0.4, "explanation": "Mock classification"}"#
                    .to_string(),
            ),
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create an unhealthy mock backend whose calls fail
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new().with_error("mock backend unavailable")
        }
    }

    /// Answer every prompt with `text`
    pub fn with_response(mut self, text: &str) -> Self {
        self.reply = MockReply::Text(text.to_string());
        self
    }

    /// Answer with a category reply
    pub fn with_category(self, category: &str, confidence: f64) -> Self {
        let body = serde_json::json!({
            "category": category,
            "confidence": confidence,
            "explanation": format!("Mock says {}", category),
        });
        self.with_response(&body.to_string())
    }

    /// Fail every call with a provider error
    pub fn with_error(mut self, message: &str) -> Self {
        self.reply = MockReply::Fail(message.to_string());
        self
    }

    /// Panic inside `complete` (exercises task-failure isolation)
    pub fn with_panic(mut self, message: &str) -> Self {
        self.reply = MockReply::Panic(message.to_string());
        self
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `complete` calls across all clones
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn complete(&self, _prompt: &str, _format: ResponseFormat) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.reply {
            MockReply::Text(text) => Ok(text.clone()),
            MockReply::Fail(message) => Err(Error::InvalidData(message.clone())),
            MockReply::Panic(message) => panic!("{}", message),
        }
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counts_calls_across_clones() {
        let mock = MockBackend::new().with_category("Travel", 0.9);
        let clone = mock.clone();

        let reply = clone.complete("x", ResponseFormat::Json).await.unwrap();
        assert!(reply.contains("Travel"));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unhealthy() {
        let mock = MockBackend::unhealthy();
        assert!(!mock.health_check().await);
        assert!(mock.complete("x", ResponseFormat::Text).await.is_err());
    }
}
