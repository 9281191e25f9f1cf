//! File routes — processing echo and multipart upload.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use tracing::{error, warn};

use crate::error::ApiError;
use crate::services::files::{self as files_svc, ProcessFileReply, UploadReply};
use crate::state::AppState;

const UPLOAD_FIELD: &str = "file";
const DEFAULT_UPLOAD_NAME: &str = "upload";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProcessFileRequest {
    pub file_path: String,
    pub file_type: String,
}

/// `POST /api/process-file`
pub async fn process_file(Json(req): Json<ProcessFileRequest>) -> Json<ProcessFileReply> {
    Json(files_svc::process_file(&req.file_path, &req.file_type))
}

/// `POST /api/ai/upload` — store the multipart field named `file`.
pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Result<Json<UploadReply>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!(error = %e, "upload: malformed multipart body");
        ApiError::new(e.status(), e.body_text(), "E_BAD_REQUEST")
    })? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let name = field.file_name().unwrap_or(DEFAULT_UPLOAD_NAME).to_string();
        let content_type = field.content_type().unwrap_or(DEFAULT_CONTENT_TYPE).to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::new(e.status(), e.body_text(), "E_BAD_REQUEST"))?;

        return files_svc::store_upload(&state.upload_dir, &name, &content_type, &bytes)
            .await
            .map(Json)
            .map_err(|e| {
                error!(error = %e, "upload: store failed");
                ApiError::from_code(StatusCode::INTERNAL_SERVER_ERROR, "Failed to store upload", &e)
            });
    }
    Err(ApiError::bad_request("No file uploaded"))
}

#[cfg(test)]
#[path = "files_test.rs"]
mod tests;
