//! Web front door handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{multipart::MultipartError, Multipart, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use futures::StreamExt;
use serde::Serialize;
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{info, warn};

use super::state::AppState;
use crate::formats;
use crate::job::{ConversionOutcome, ConversionRequest};

const GUI_HTML: &str = include_str!("../../resources/gui.html");

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct FormatsResponse {
    pub default: String,
    pub formats: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error carried back to the client as `{"error": "..."}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        Self {
            status: e.status(),
            message: e.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

/// Fields parsed from the upload form
struct UploadForm {
    upload_dir: TempDir,
    file: Option<PathBuf>,
    bytes: u64,
    target_format: String,
    output_folder: Option<PathBuf>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /
pub async fn index() -> Html<&'static str> {
    Html(GUI_HTML)
}

/// GET /api/formats
pub async fn list_formats(State(state): State<Arc<AppState>>) -> Json<FormatsResponse> {
    let config = state.config();
    Json(FormatsResponse {
        default: config.default_format().to_string(),
        formats: config.supported_formats.clone(),
    })
}

/// POST /api/convert
///
/// Convert an uploaded video and stream the result back.
pub async fn convert_upload(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let form = read_form(multipart).await?;

    let target = formats::normalize(&form.target_format);
    if !state.config().supports(&target) {
        return Err(ApiError::bad_request(format!(
            "Unsupported target format: {}",
            form.target_format
        )));
    }

    let source = form
        .file
        .ok_or_else(|| ApiError::bad_request("No file provided"))?;
    if form.bytes == 0 {
        return Err(ApiError::bad_request("Uploaded file is empty"));
    }
    if !state.config().is_source_file(&source) {
        return Err(ApiError::bad_request(format!(
            "Not a recognized video file: {}",
            source.file_name().unwrap_or_default().to_string_lossy()
        )));
    }
    info!(
        "Received upload {} ({} bytes) -> {}",
        source.display(),
        form.bytes,
        target
    );

    let result = {
        let _slot = state
            .conversion_slots()
            .acquire_owned()
            .await
            .map_err(|_| ApiError::internal("Server is shutting down"))?;
        state
            .converter()
            .convert(&ConversionRequest::new(&source, &target))
            .await
    };

    let served = match (result.outcome(), result.output()) {
        (ConversionOutcome::Failed, _) => {
            return Err(ApiError::internal(
                result.error().unwrap_or("Conversion failed").to_string(),
            ))
        }
        (_, Some(output)) => match form.output_folder.as_deref() {
            Some(folder) => move_to_folder(output, folder).await,
            None => output.to_path_buf(),
        },
        // Already in the requested format
        (_, None) => source,
    };

    stream_file(&served, &target, form.upload_dir).await
}

// ============================================================================
// Helpers
// ============================================================================

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let upload_dir = tempfile::Builder::new()
        .prefix("video_converter_")
        .tempdir()
        .map_err(|e| ApiError::internal(format!("Failed to create temporary directory: {}", e)))?;

    let mut form = UploadForm {
        upload_dir,
        file: None,
        bytes: 0,
        target_format: formats::DEFAULT_FORMAT.to_string(),
        output_folder: None,
    };

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let file_name = field
                    .file_name()
                    .and_then(sanitize_file_name)
                    .ok_or_else(|| ApiError::bad_request("Missing file name"))?;
                let path = form.upload_dir.path().join(file_name);

                let mut out = tokio::fs::File::create(&path)
                    .await
                    .map_err(|e| ApiError::internal(format!("Failed to write upload: {}", e)))?;
                let mut bytes = 0u64;
                while let Some(chunk) = field.chunk().await? {
                    bytes += chunk.len() as u64;
                    out.write_all(&chunk)
                        .await
                        .map_err(|e| ApiError::internal(format!("Failed to write upload: {}", e)))?;
                }
                out.flush()
                    .await
                    .map_err(|e| ApiError::internal(format!("Failed to write upload: {}", e)))?;

                form.file = Some(path);
                form.bytes = bytes;
            }
            "target_format" => {
                let text = field.text().await?;
                if !text.trim().is_empty() {
                    form.target_format = text;
                }
            }
            "output_folder" => {
                let text = field.text().await?;
                if !text.trim().is_empty() {
                    form.output_folder = Some(PathBuf::from(text.trim()));
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Last path component of a client-supplied name, safe to use in a header
fn sanitize_file_name(raw: &str) -> Option<String> {
    let name = raw.rsplit(['/', '\\']).next()?.trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }

    Some(
        name.chars()
            .map(|c| if c.is_control() || c == '"' || c == ':' { '_' } else { c })
            .collect(),
    )
}

/// Move the output into `folder`, keeping it in place if that is not possible
async fn move_to_folder(output: &Path, folder: &Path) -> PathBuf {
    let is_dir = tokio::fs::metadata(folder)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);
    let Some(file_name) = output.file_name() else {
        return output.to_path_buf();
    };
    if !is_dir {
        warn!("Ignoring invalid output folder: {}", folder.display());
        return output.to_path_buf();
    }

    let destination = folder.join(file_name);
    if tokio::fs::try_exists(&destination).await.unwrap_or(true) {
        warn!("Not overwriting {}, keeping output in place", destination.display());
        return output.to_path_buf();
    }

    let moved = match tokio::fs::rename(output, &destination).await {
        Ok(()) => Ok(()),
        // Different filesystem: copy, then drop the original
        Err(_) => match tokio::fs::copy(output, &destination).await {
            Ok(_) => tokio::fs::remove_file(output).await,
            Err(e) => Err(e),
        },
    };

    match moved {
        Ok(()) => {
            info!("Output moved to {}", destination.display());
            destination
        }
        Err(e) => {
            warn!("Failed to move output, using temporary location: {}", e);
            output.to_path_buf()
        }
    }
}

async fn stream_file(path: &Path, format: &str, upload_dir: TempDir) -> Result<Response, ApiError> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to open output: {}", e)))?;
    let len = file
        .metadata()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to read output: {}", e)))?
        .len();
    let download_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("converted.{}", format));

    let stream = ReaderStream::new(file).map(move |chunk| {
        // The upload directory lives as long as the response body
        let _upload_dir = &upload_dir;
        chunk
    });

    info!("Sending {} ({} bytes)", download_name, len);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, formats::mime_type(format).to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", download_name),
            ),
            (header::CONTENT_LENGTH, len.to_string()),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}
