//! Generative language-model backend abstraction
//!
//! # Architecture
//!
//! - `AIBackend` trait: one "complete this prompt" call plus health/identity
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `GeminiBackend`, `MockBackend`
//!
//! # Usage
//!
//! ```rust,ignore
//! // None when no API key is configured
//! let ai = AIClient::from_config(&config);
//!
//! if let Some(ref client) = ai {
//!     let reply = client.classify_description("NETFLIX.COM").await?;
//!     println!("Category: {}", reply.category);
//! }
//! ```

mod gemini;
mod mock;
pub mod parsing;
pub mod prompts;
pub mod types;

pub use gemini::GeminiBackend;
pub use mock::MockBackend;
pub use types::*;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::Result;
use crate::models::CategorizeResult;

/// Trait defining the interface for all AI backends
///
/// Backends should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Send one prompt and return the model's text
    async fn complete(&self, prompt: &str, format: ResponseFormat) -> Result<String>;

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Get the model name (for logging)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    /// Google Gemini (HTTP API)
    Gemini(GeminiBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Create an AI client from configuration
    ///
    /// Returns None if no Gemini API key is configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        GeminiBackend::from_config(config).map(AIClient::Gemini)
    }

    /// Create a Gemini backend directly
    pub fn gemini(host: &str, model: &str, api_key: &str) -> Self {
        AIClient::Gemini(GeminiBackend::new(host, model, api_key))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    /// Create a new instance with a different model
    pub fn with_model(&self, model: &str) -> Self {
        match self {
            AIClient::Gemini(b) => AIClient::Gemini(b.with_model(model)),
            AIClient::Mock(b) => AIClient::Mock(b.clone()),
        }
    }

    /// Ask for a category from the closed vocabulary
    ///
    /// Transport errors propagate; an unparseable reply does not (it maps to
    /// `Other` at 0.3).
    pub async fn classify_description(&self, description: &str) -> Result<CategorizeResult> {
        let prompt = prompts::categorize_prompt(description);
        let raw = self.complete(&prompt, ResponseFormat::Json).await?;
        Ok(parsing::category_result_from_reply(&raw))
    }

    /// Free-text generation, trimmed
    pub async fn write_text(&self, prompt: &str) -> Result<String> {
        let raw = self.complete(prompt, ResponseFormat::Text).await?;
        Ok(raw.trim().to_string())
    }
}

// Implement AIBackend for AIClient by delegating to the inner backend
#[async_trait]
impl AIBackend for AIClient {
    async fn complete(&self, prompt: &str, format: ResponseFormat) -> Result<String> {
        match self {
            AIClient::Gemini(b) => b.complete(prompt, format).await,
            AIClient::Mock(b) => b.complete(prompt, format).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::Gemini(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::Gemini(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::Gemini(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}
