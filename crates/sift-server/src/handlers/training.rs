//! Model training handler

use std::io::Write;
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use tracing::info;

use super::import::read_upload;
use crate::{AppError, AppState};
use sift_core::{ModelTrainer, TrainingOptions, TrainingReport};

/// POST /api/train - Train the classifier from an uploaded labelled CSV
///
/// Expects multipart form with:
/// - file: CSV file (required, max 10MB)
/// - text_column: defaults to `description`
/// - label_column: defaults to `category`
///
/// The upload is written to a temp file that is removed once training ends.
/// A successful run replaces the served model immediately.
pub async fn train_model(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<TrainingReport>, AppError> {
    let mut fields = Vec::new();
    let file_data = read_upload(&mut multipart, &mut fields).await?;

    let mut options = TrainingOptions::default();
    for (name, value) in fields {
        let value = value.trim().to_string();
        if value.is_empty() {
            continue;
        }
        match name.as_str() {
            "text_column" => options.text_column = value,
            "label_column" => options.label_column = value,
            _ => {}
        }
    }

    train_core(&state, file_data, options).await
}

/// Core training logic - separated from multipart form parsing for testability
pub async fn train_core(
    state: &AppState,
    file_data: Vec<u8>,
    options: TrainingOptions,
) -> Result<Json<TrainingReport>, AppError> {
    let mut upload = tempfile::Builder::new()
        .prefix("sift-train-")
        .suffix(".csv")
        .tempfile()?;
    upload.write_all(&file_data)?;
    upload.flush()?;

    let path = upload.path().to_path_buf();
    let classifier = state.classifier.clone();
    let report = tokio::task::spawn_blocking(move || {
        ModelTrainer::with_classifier(classifier).train(&path, &options)
    })
    .await
    .map_err(|e| AppError::internal(&format!("Training task failed: {}", e)))??;

    // Removes the temp file
    drop(upload);

    info!(
        accuracy = report.accuracy,
        train_rows = report.train_rows,
        test_rows = report.test_rows,
        "Model trained"
    );
    Ok(Json(report))
}
