//! File endpoints: the processing echo and upload storage.
//!
//! Uploads are written under the configured upload directory with a fresh
//! UUID name and served back from `/uploads/<stored>`.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

/// Public URL prefix the upload directory is mounted under.
pub const UPLOADS_URL_PREFIX: &str = "/uploads";
const MAX_EXTENSION_LEN: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

impl crate::error::ErrorCode for FileError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "E_FILE_IO",
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct FileRef {
    pub url: String,
    #[serde(rename = "type")]
    pub file_type: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ProcessFileReply {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub file: FileRef,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct StoredFile {
    pub url: String,
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct UploadReply {
    pub success: bool,
    pub file: StoredFile,
}

/// Echo the file reference back. No content is read.
#[must_use]
pub fn process_file(path: &str, file_type: &str) -> ProcessFileReply {
    info!(path, file_type, "files: process request");
    ProcessFileReply {
        text: format!("Processed file at {path} of type {file_type}"),
        kind: "text",
        file: FileRef { url: path.to_string(), file_type: file_type.to_string() },
    }
}

/// Write an upload to `dir` under a generated name.
///
/// # Errors
///
/// Returns [`FileError::Io`] if the directory cannot be created or the file
/// cannot be written.
pub async fn store_upload(
    dir: &Path,
    original_name: &str,
    content_type: &str,
    bytes: &[u8],
) -> Result<UploadReply, FileError> {
    let stored = stored_name(Uuid::new_v4(), original_name);
    tokio::fs::create_dir_all(dir).await?;
    let target: PathBuf = dir.join(&stored);
    tokio::fs::write(&target, bytes).await?;

    info!(stored = %stored, size = bytes.len(), content_type, "files: upload stored");
    Ok(UploadReply {
        success: true,
        file: StoredFile {
            url: format!("{UPLOADS_URL_PREFIX}/{stored}"),
            name: original_name.to_string(),
            file_type: content_type.to_string(),
        },
    })
}

/// `<uuid><.ext>`, keeping only a short alphanumeric extension from the
/// client-supplied name.
pub(crate) fn stored_name(id: Uuid, original_name: &str) -> String {
    let base = original_name.rsplit(['/', '\\']).next().unwrap_or("");
    let ext = Path::new(base)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= MAX_EXTENSION_LEN && e.chars().all(|c| c.is_ascii_alphanumeric()));
    match ext {
        Some(ext) => format!("{id}.{}", ext.to_ascii_lowercase()),
        None => id.to_string(),
    }
}

#[cfg(test)]
#[path = "files_test.rs"]
mod tests;
