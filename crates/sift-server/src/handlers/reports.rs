//! Analytics handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::{owner_from, AppError, AppState};
use sift_core::analytics::{self, AdvancedReport, MonthlySummary};
use sift_core::models::{AnomalyPoint, DashboardSummary, MonthSummary, TrendPoint};

/// Query parameters for month-scoped reports
#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    /// `YYYY-MM`; defaults to the current UTC month
    pub month: Option<String>,
}

impl MonthQuery {
    fn resolve(self) -> String {
        self.month
            .unwrap_or_else(|| Utc::now().format("%Y-%m").to_string())
    }
}

/// GET /api/dashboard - Total spend, top category and mean confidence
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<MonthQuery>,
) -> Result<Json<DashboardSummary>, AppError> {
    let owner = owner_from(&headers);
    let summary = analytics::dashboard_summary(&state.db, &owner, &params.resolve())?;
    Ok(Json(summary))
}

/// GET /api/trend - Total spend per month
pub async fn get_trend(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<TrendPoint>>, AppError> {
    let owner = owner_from(&headers);
    Ok(Json(analytics::trend(&state.db, &owner)?))
}

/// GET /api/anomalies - Z-score outliers in a month
pub async fn get_anomalies(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<MonthQuery>,
) -> Result<Json<Vec<AnomalyPoint>>, AppError> {
    let owner = owner_from(&headers);
    let anomalies = analytics::detect_anomalies(&state.db, &owner, &params.resolve())?;
    Ok(Json(anomalies))
}

/// GET /api/insights - Advanced insight report
pub async fn get_insights(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<MonthQuery>,
) -> Result<Json<AdvancedReport>, AppError> {
    let owner = owner_from(&headers);
    let report =
        analytics::advanced_report(&state.db, &state.narratives, &owner, &params.resolve())
            .await?;
    Ok(Json(report))
}

/// GET /api/summary - Category breakdown with a narrative summary
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<MonthQuery>,
) -> Result<Json<MonthlySummary>, AppError> {
    let owner = owner_from(&headers);
    let summary =
        analytics::monthly_summary(&state.db, &state.narratives, &owner, &params.resolve())
            .await?;
    Ok(Json(summary))
}

/// GET /api/months/:month - Total and per-category spend
pub async fn get_month_summary(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(month): Path<String>,
) -> Result<Json<MonthSummary>, AppError> {
    let owner = owner_from(&headers);
    Ok(Json(analytics::month_summary(&state.db, &owner, &month)?))
}
