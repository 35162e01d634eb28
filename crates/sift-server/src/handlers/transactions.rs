//! Transaction handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;

use crate::{owner_from, AppError, AppState, MAX_PAGE_LIMIT};
use sift_core::ingest::{self, parse_date};
use sift_core::models::Transaction;

const DEFAULT_PAGE_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    pub limit: Option<i64>,
}

/// GET /api/transactions - Most recent transactions, newest first
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<ListTransactionsQuery>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    let owner = owner_from(&headers);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
        return Err(AppError::bad_request(&format!(
            "limit must be between 1 and {}",
            MAX_PAGE_LIMIT
        )));
    }
    Ok(Json(state.db.recent_transactions(&owner, limit)?))
}

/// GET /api/transactions/:id - One transaction owned by the caller
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Transaction>, AppError> {
    let owner = owner_from(&headers);
    // Another owner's transaction is indistinguishable from a missing one
    let tx = state
        .db
        .get_transaction(id)?
        .filter(|tx| tx.owner == owner)
        .ok_or_else(|| AppError::not_found("Transaction not found"))?;
    Ok(Json(tx))
}

#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    pub date: String,
    pub description: String,
    pub amount: f64,
}

/// POST /api/transactions - Categorize then store one transaction
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<Transaction>), AppError> {
    let owner = owner_from(&headers);
    let date = parse_date(&req.date)
        .ok_or_else(|| AppError::bad_request(&format!("Invalid date: {}", req.date)))?;

    let tx = ingest::create_transaction(
        &state.db,
        &state.cascade,
        &owner,
        date,
        &req.description,
        req.amount,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(tx)))
}
