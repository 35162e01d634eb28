//! Types shared by AI backends

use serde::{Deserialize, Serialize};

/// Shape the backend should ask the provider for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Free text
    Text,
    /// A single JSON object
    Json,
}

/// Category reply as the model returns it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryReply {
    pub category: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub explanation: Option<String>,
}
