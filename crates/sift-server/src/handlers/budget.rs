//! Budget handlers

use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};

use crate::{owner_from, AppError, AppState};

#[derive(Debug, Serialize)]
pub struct BudgetResponse {
    pub owner: String,
    pub amount: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct SetBudgetRequest {
    pub amount: f64,
}

/// GET /api/budget - Monthly budget for the caller
pub async fn get_budget(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<BudgetResponse>, AppError> {
    let owner = owner_from(&headers);
    let amount = state.db.get_budget(&owner)?;
    Ok(Json(BudgetResponse { owner, amount }))
}

/// PUT /api/budget - Set the monthly budget
pub async fn set_budget(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<SetBudgetRequest>,
) -> Result<Json<BudgetResponse>, AppError> {
    let owner = owner_from(&headers);
    state.db.set_budget(&owner, req.amount)?;
    Ok(Json(BudgetResponse {
        owner,
        amount: Some(req.amount),
    }))
}

/// DELETE /api/budget - Remove the monthly budget
pub async fn clear_budget(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<BudgetResponse>, AppError> {
    let owner = owner_from(&headers);
    if !state.db.clear_budget(&owner)? {
        return Err(AppError::not_found("No budget set"));
    }
    Ok(Json(BudgetResponse {
        owner,
        amount: None,
    }))
}
