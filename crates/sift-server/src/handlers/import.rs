//! CSV ingestion handler

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::HeaderMap,
    Json,
};
use tracing::info;

use crate::{owner_from, AppError, AppState, MAX_UPLOAD_SIZE};
use sift_core::ingest::{self, IngestSummary};

/// Read the `file` field of a multipart form, enforcing the upload limit
pub(crate) async fn read_upload(
    multipart: &mut Multipart,
    extra: &mut Vec<(String, String)>,
) -> Result<Vec<u8>, AppError> {
    let mut file_data: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(&format!("Failed to read form field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "file" {
            let bytes = field
                .bytes()
                .await
                .map_err(|_| AppError::bad_request("Failed to read file data"))?;
            if bytes.len() > MAX_UPLOAD_SIZE {
                return Err(AppError::bad_request(&format!(
                    "File too large. Maximum size is {} MB",
                    MAX_UPLOAD_SIZE / 1024 / 1024
                )));
            }
            file_data = Some(bytes.to_vec());
        } else {
            let value = field
                .text()
                .await
                .map_err(|_| AppError::bad_request(&format!("Failed to read {}", name)))?;
            extra.push((name, value));
        }
    }

    file_data.ok_or_else(|| AppError::bad_request("Missing file field"))
}

/// POST /api/import - Ingest a CSV with date, amount and description columns
///
/// Expects multipart form with:
/// - file: CSV file (required, max 10MB)
pub async fn import_csv(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<IngestSummary>, AppError> {
    let owner = owner_from(&headers);
    let mut ignored = Vec::new();
    let file_data = read_upload(&mut multipart, &mut ignored).await?;
    import_csv_core(&state, &owner, file_data).await
}

/// Core import logic - separated from multipart form parsing for testability
pub async fn import_csv_core(
    state: &AppState,
    owner: &str,
    file_data: Vec<u8>,
) -> Result<Json<IngestSummary>, AppError> {
    let summary = ingest::ingest_csv(
        &state.db,
        &state.cascade,
        owner,
        file_data.as_slice(),
        state.config.ingest_item_timeout(),
    )
    .await?;

    info!(
        owner,
        inserted = summary.inserted,
        skipped = summary.skipped,
        "Import complete"
    );
    Ok(Json(summary))
}
