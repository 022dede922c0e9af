//! Forecast upload handlers

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{allowed_file, AppError, AppState, MAX_UPLOAD_SIZE};

#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    /// Category → "Rp. ..." or "Error: ..."
    pub forecasts: BTreeMap<String, String>,
}

fn too_large() -> AppError {
    AppError::bad_request(&format!(
        "File too large. Maximum size is {} MB",
        MAX_UPLOAD_SIZE / 1024 / 1024
    ))
}

fn check_filename(filename: &str) -> Result<(), AppError> {
    if filename.is_empty() {
        return Err(AppError::bad_request("No selected file"));
    }
    if !allowed_file(filename) {
        return Err(AppError::bad_request(
            "Invalid file type. Only .csv files are accepted",
        ));
    }
    Ok(())
}

/// POST /api/forecast - Forecast a ledger uploaded as multipart field `file`
pub async fn forecast_upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ForecastResponse>, AppError> {
    let mut file_data: Option<Vec<u8>> = None;

    // Extract fields from multipart form
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(&format!("Failed to read form field: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        check_filename(field.file_name().unwrap_or(""))?;

        let bytes = field
            .bytes()
            .await
            .map_err(|_| AppError::bad_request("Failed to read file data"))?;

        // Check file size limit
        if bytes.len() > MAX_UPLOAD_SIZE {
            return Err(too_large());
        }

        file_data = Some(bytes.to_vec());
    }

    let file_data = file_data.ok_or_else(|| AppError::bad_request("No file part"))?;
    forecast_core(&state, file_data).await
}

/// Request body for JSON uploads
#[derive(Debug, Deserialize)]
pub struct ForecastJsonRequest {
    pub filename: String,
    /// Base64-encoded CSV content
    pub csv_data: String,
}

/// POST /api/forecast/json - Forecast a ledger sent as base64 JSON
pub async fn forecast_json(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ForecastJsonRequest>,
) -> Result<Json<ForecastResponse>, AppError> {
    use base64::Engine;

    check_filename(&req.filename)?;

    // Decode base64 CSV data
    let file_data = base64::engine::general_purpose::STANDARD
        .decode(&req.csv_data)
        .map_err(|e| AppError::bad_request(&format!("Invalid base64 data: {}", e)))?;

    // Check file size limit
    if file_data.len() > MAX_UPLOAD_SIZE {
        return Err(too_large());
    }

    forecast_core(&state, file_data).await
}

/// Shared forecast logic for both upload styles
///
/// Fitting is CPU-bound, so the engine runs on a blocking worker thread.
async fn forecast_core(
    state: &AppState,
    file_data: Vec<u8>,
) -> Result<Json<ForecastResponse>, AppError> {
    let engine = state.engine.clone();
    let size = file_data.len();

    let forecasts = tokio::task::spawn_blocking(move || engine.forecast_csv(file_data.as_slice()))
        .await?
        .map_err(|e| AppError::bad_request(&e.to_string()))?;

    info!(
        bytes = size,
        categories = forecasts.len(),
        "Forecast request complete"
    );

    Ok(Json(ForecastResponse { forecasts }))
}
