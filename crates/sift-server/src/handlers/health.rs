//! Health handler

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;
use sift_core::AIBackend;

#[derive(Debug, Serialize)]
pub struct GenerativeStatus {
    pub configured: bool,
    pub healthy: bool,
    pub model: Option<String>,
    pub host: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_available: bool,
    pub generative: GenerativeStatus,
}

/// GET /api/health - Classifier and generative backend availability
pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let generative = match &state.ai {
        Some(client) => GenerativeStatus {
            configured: true,
            healthy: client.health_check().await,
            model: Some(client.model().to_string()),
            host: Some(client.host().to_string()),
        },
        None => GenerativeStatus {
            configured: false,
            healthy: false,
            model: None,
            host: None,
        },
    };

    Json(HealthResponse {
        status: "ok",
        model_available: state.classifier.is_available(),
        generative,
    })
}
