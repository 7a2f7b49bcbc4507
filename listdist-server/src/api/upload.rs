//! Upload and distribution endpoints
//!
//! POST /api/upload                 - multipart upload, field `file`
//! GET  /api/upload/distributions   - assignments grouped by agent

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Extension, Json,
};
use listdist_common::api::CallerIdentity;
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::ingest::{ingest_upload, read_distributions, AgentDistribution, IngestError, StagedUpload};
use crate::AppState;

/// Multipart field that carries the list
const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub total_items: usize,
    pub agents_count: usize,
    /// Assignments actually written; below `total_items` when rows were skipped
    pub inserted: usize,
}

/// POST /api/upload
pub async fn upload_file(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let staged = stage_file_field(&state, &mut multipart).await?;
    let summary = ingest_upload(&state.db, staged, &caller).await?;

    Ok(Json(UploadResponse {
        message: "File uploaded and distributed successfully".to_string(),
        total_items: summary.total_items,
        agents_count: summary.agents_count,
        inserted: summary.inserted,
    }))
}

/// Stream the `file` field into a staged upload
///
/// Other fields are skipped. The type check happens on the field headers,
/// before any content is read.
async fn stage_file_field(state: &AppState, multipart: &mut Multipart) -> ApiResult<StagedUpload> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, state.max_upload_bytes))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let mut staged = StagedUpload::create(
            &state.uploads_dir,
            field.file_name(),
            field.content_type(),
            state.max_upload_bytes,
        )?;

        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| multipart_error(e, state.max_upload_bytes))?
        {
            staged.write_chunk(&chunk).await?;
        }
        staged.finish().await?;

        return Ok(staged);
    }

    Err(IngestError::MissingFile.into())
}

/// Body-limit hits surface as multipart errors with status 413
fn multipart_error(err: MultipartError, limit: u64) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        IngestError::PayloadTooLarge { limit }.into()
    } else {
        ApiError::BadRequest(format!("Malformed multipart body: {}", err.body_text()))
    }
}

/// GET /api/upload/distributions
pub async fn get_distributions(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<AgentDistribution>>> {
    let distributions = read_distributions(&state.db).await?;
    Ok(Json(distributions))
}
