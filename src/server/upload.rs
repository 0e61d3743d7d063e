use std::collections::HashMap;
use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use axum::extract::multipart::{Field, MultipartError};
use axum::http::StatusCode;
use tokio::io::AsyncWriteExt as _;

use crate::server::error::ApiError;

pub const FILE_TOO_LARGE: &str = "File too large";

/// Kind of file a multipart field must carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadKind {
    Video,
    Image,
    Audio,
}

impl UploadKind {
    /// File field names accepted by the compose endpoints.
    pub fn for_field(name: &str) -> Option<Self> {
        match name {
            "video" => Some(Self::Video),
            "sketch" => Some(Self::Image),
            "music" => Some(Self::Audio),
            _ => None,
        }
    }

    pub fn accepts(self, content_type: &str) -> bool {
        let prefix = match self {
            Self::Video => "video/",
            Self::Image => "image/",
            Self::Audio => "audio/",
        };
        content_type.trim().to_ascii_lowercase().starts_with(prefix)
    }

    fn rejection(self) -> &'static str {
        match self {
            Self::Video => "Invalid video file",
            Self::Image => "Invalid image file",
            Self::Audio => "Invalid audio file",
        }
    }
}

/// Files that are deleted when the guard drops. Deletion errors are ignored.
#[derive(Debug, Default)]
pub struct TempFiles {
    paths: Vec<PathBuf>,
}

impl TempFiles {
    pub fn track(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl Drop for TempFiles {
    fn drop(&mut self) {
        for path in self.paths.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => tracing::trace!(path = %path.display(), "temp file removed"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::debug!(path = %path.display(), error = %e, "temp cleanup failed"),
            }
        }
    }
}

/// One stored upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredFile {
    pub path: PathBuf,
    pub original_name: String,
    pub content_type: String,
    pub size: u64,
}

/// A parsed compose form. Dropping it removes every stored upload.
#[derive(Debug, Default)]
pub struct ComposeForm {
    pub video: Option<StoredFile>,
    pub sketch: Option<StoredFile>,
    pub music: Option<StoredFile>,
    pub fields: HashMap<String, String>,
    pub files: TempFiles,
}

/// Reduce a client file name to `[A-Za-z0-9._-]`, without leading dots.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(100)
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// `<uuid>-<sanitized original name>`.
pub fn upload_file_name(original: &str) -> String {
    format!("{}-{}", uuid::Uuid::new_v4(), sanitize_file_name(original))
}

/// Stream a compose form to `upload_dir`, enforcing MIME prefixes and the per-file cap.
///
/// On any error the files written so far are removed before returning.
#[tracing::instrument(level = "debug", skip_all)]
pub async fn read_compose_form(
    mut multipart: Multipart,
    upload_dir: &Path,
    max_bytes: u64,
) -> Result<ComposeForm, ApiError> {
    let mut form = ComposeForm::default();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        match UploadKind::for_field(&name) {
            Some(kind) => {
                let slot = match kind {
                    UploadKind::Video => &form.video,
                    UploadKind::Image => &form.sketch,
                    UploadKind::Audio => &form.music,
                };
                if slot.is_some() {
                    return Err(ApiError::bad_request(format!("Unexpected field: {name}")));
                }
                let stored = store_field(field, kind, upload_dir, max_bytes, &mut form.files).await?;
                tracing::debug!(field = %name, size = stored.size, "upload stored");
                match kind {
                    UploadKind::Video => form.video = Some(stored),
                    UploadKind::Image => form.sketch = Some(stored),
                    UploadKind::Audio => form.music = Some(stored),
                }
            }
            None => {
                let value = field.text().await.map_err(multipart_error)?;
                form.fields.insert(name, value);
            }
        }
    }
    Ok(form)
}

async fn store_field(
    mut field: Field<'_>,
    kind: UploadKind,
    upload_dir: &Path,
    max_bytes: u64,
    files: &mut TempFiles,
) -> Result<StoredFile, ApiError> {
    let content_type = field.content_type().unwrap_or_default().to_string();
    if !kind.accepts(&content_type) {
        return Err(ApiError::bad_request(kind.rejection()));
    }
    let original_name = field.file_name().unwrap_or("upload").to_string();
    let path = upload_dir.join(upload_file_name(&original_name));
    files.track(&path);

    let mut file = tokio::fs::File::create(&path).await.map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "cannot create upload file");
        ApiError::internal("Internal server error")
    })?;
    let mut size = 0u64;
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        size += chunk.len() as u64;
        if size > max_bytes {
            return Err(ApiError::bad_request(FILE_TOO_LARGE));
        }
        file.write_all(&chunk).await.map_err(|e| {
            tracing::error!(error = %e, "upload write failed");
            ApiError::internal("Internal server error")
        })?;
    }
    file.flush().await.map_err(|e| {
        tracing::error!(error = %e, "upload flush failed");
        ApiError::internal("Internal server error")
    })?;

    Ok(StoredFile {
        path,
        original_name,
        content_type,
        size,
    })
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::bad_request(FILE_TOO_LARGE)
    } else {
        ApiError::bad_request(format!("Invalid multipart request: {}", err.body_text()))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/server/upload.rs"]
mod tests;
