//! Gemini backend implementation
//!
//! HTTP client for the `generateContent` endpoint of the Generative Language API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};

use super::types::ResponseFormat;
use super::AIBackend;

/// Gemini backend keyed by an API key
#[derive(Clone)]
pub struct GeminiBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiBackend {
    pub fn new(base_url: &str, model: &str, api_key: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// `None` when no API key is configured
    pub fn from_config(config: &Config) -> Option<Self> {
        let key = config.gemini_api_key.as_deref()?;
        Some(Self::new(&config.gemini_host, &config.gemini_model, key))
    }

    /// Create a new instance with a different model
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..self.clone()
        }
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/v1beta/models/{}:{}", self.base_url, self.model, method)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[async_trait]
impl AIBackend for GeminiBackend {
    async fn complete(&self, prompt: &str, format: ResponseFormat) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: match format {
                ResponseFormat::Json => Some(GenerationConfig {
                    response_mime_type: "application/json".to_string(),
                }),
                ResponseFormat::Text => None,
            },
        };

        let response = self
            .http_client
            .post(self.endpoint("generateContent"))
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let body: GenerateResponse = response.json().await?;
        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .ok_or_else(|| Error::InvalidData("Gemini returned no candidates".into()))?;

        debug!(model = %self.model, chars = text.len(), "Gemini response");
        Ok(text)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/v1beta/models/{}", self.base_url, self.model))
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}
