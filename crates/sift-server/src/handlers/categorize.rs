//! Categorize-only handler

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::{AppError, AppState};
use sift_core::models::CategorizeResult;

#[derive(Debug, Deserialize)]
pub struct CategorizeRequest {
    pub description: String,
}

/// POST /api/categorize - Run the cascade without persisting anything
pub async fn categorize(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CategorizeRequest>,
) -> Result<Json<CategorizeResult>, AppError> {
    if req.description.trim().is_empty() {
        return Err(AppError::bad_request("description must not be blank"));
    }
    Ok(Json(state.cascade.categorize(&req.description).await))
}
