//! Test utilities for sift-core
//!
//! This module provides testing infrastructure including a mock Gemini server
//! that can be used for development and integration tests.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::oneshot;

/// Key the mock server rejects with 403
pub const REJECTED_API_KEY: &str = "rejected-key";

/// Mock Gemini server for testing and development
pub struct MockGeminiServer {
    addr: SocketAddr,
    requests: Arc<AtomicUsize>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockGeminiServer {
    /// Start the mock server on an available port
    pub async fn start() -> anyhow::Result<Self> {
        let requests = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route(
                "/v1beta/models/:target",
                get(handle_model).post(handle_generate),
            )
            .with_state(requests.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await;
        });

        Ok(Self {
            addr,
            requests,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of `generateContent` calls served
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockGeminiServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn key_status(params: &HashMap<String, String>) -> Option<StatusCode> {
    match params.get("key").map(String::as_str) {
        None | Some("") => Some(StatusCode::BAD_REQUEST),
        Some(REJECTED_API_KEY) => Some(StatusCode::FORBIDDEN),
        Some(_) => None,
    }
}

/// Model metadata endpoint (health check)
async fn handle_model(
    Path(target): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<serde_json::Value>) {
    if let Some(status) = key_status(&params) {
        return (status, Json(json!({"error": {"code": status.as_u16()}})));
    }
    (
        StatusCode::OK,
        Json(json!({ "name": format!("models/{}", target) })),
    )
}

/// `generateContent` endpoint
async fn handle_generate(
    State(requests): State<Arc<AtomicUsize>>,
    Path(target): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    Json(request): Json<GenerateRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    if let Some(status) = key_status(&params) {
        return (status, Json(json!({"error": {"code": status.as_u16()}})));
    }
    if !target.ends_with(":generateContent") {
        return (StatusCode::NOT_FOUND, Json(json!({"error": {"code": 404}})));
    }
    requests.fetch_add(1, Ordering::SeqCst);

    let prompt: String = request
        .contents
        .iter()
        .flat_map(|c| c.parts.iter().map(|p| p.text.as_str()))
        .collect();
    let wants_json = request
        .generation_config
        .map(|g| g.response_mime_type == "application/json")
        .unwrap_or(false);

    let text = if wants_json {
        classify_mock(&prompt)
    } else {
        "Spending looks steady this month. Consider trimming dining out.".to_string()
    };

    let body = GenerateResponse {
        candidates: vec![Candidate {
            content: Content {
                parts: vec![Part { text }],
            },
        }],
    };
    match serde_json::to_value(body) {
        Ok(value) => (StatusCode::OK, Json(value)),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({}))),
    }
}

/// Keyword classification keyed on the quoted transaction description
fn classify_mock(prompt: &str) -> String {
    let description = extract_description(prompt).to_lowercase();

    let (category, confidence) = if description.contains("netflix") || description.contains("spotify") {
        ("Entertainment", 0.92)
    } else if description.contains("pharmacy") || description.contains("clinic") {
        ("Health", 0.88)
    } else if description.contains("airline") || description.contains("hotel") {
        ("Travel", 0.85)
    } else {
        ("Other", 0.4)
    };

    json!({
        "category": category,
        "confidence": confidence,
        "explanation": format!("mock classification of '{}'", description),
    })
    .to_string()
}

fn extract_description(prompt: &str) -> &str {
    const MARKER: &str = "Transaction description: \"";
    if let Some(start) = prompt.find(MARKER) {
        let rest = &prompt[start + MARKER.len()..];
        if let Some(end) = rest.find('"') {
            return &rest[..end];
        }
    }
    prompt
}

// Request/Response types for the mock server

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(default)]
    contents: Vec<Content>,
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

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Serialize)]
struct Candidate {
    content: Content,
}
