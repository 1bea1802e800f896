//! File upload endpoint
//!
//! Accepts one Fordonsfil per multipart request (field name `file`) and
//! feeds it through the reconciliation engine.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::ingest::{ingest_text, BatchSummary};
use crate::AppState;

/// Response for POST /api/upload
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(flatten)]
    pub summary: BatchSummary,
}

/// POST /api/upload
///
/// Multipart form with a `file` field. The body is decoded as UTF-8
/// (lossy) and ingested line by line; per-line failures only increment
/// the error count.
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            file_name = field.file_name().map(|s| s.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Read error: {}", e)))?;
            file_data = Some(bytes.to_vec());
        }
    }

    let bytes = file_data.ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;

    info!(
        "Upload received: {} ({} bytes)",
        file_name.as_deref().unwrap_or("unnamed"),
        bytes.len()
    );

    let text = String::from_utf8_lossy(&bytes);
    let summary = ingest_text(&state.db, &text).await?;

    Ok(Json(UploadResponse {
        success: true,
        summary,
    }))
}
