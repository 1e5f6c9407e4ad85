use super::dto::{JobStatusResponse, ProcessQuery, ProcessResponse, UploadResponse};
use super::model::{DEFAULT_RESOLUTION, Resolution};
use super::service::JobService;
use crate::common::response::{ApiError, ErrorResponse};
use crate::state::AppState;
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;
use tracing::{error, info};

/// Upload a video
/// Stores the `file` field of a multipart body under a fresh identifier
#[utoipa::path(
    post,
    path = "/upload/",
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Upload stored", body = UploadResponse),
        (status = 400, description = "Unsupported format or missing file field", body = ErrorResponse),
        (status = 413, description = "Upload too large", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    ),
    tag = "Jobs"
)]
pub async fn upload_video(State(state): State<AppState>, mut multipart: Multipart) -> impl IntoResponse {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return ApiError(format!("Invalid multipart body: {}", e.body_text()), e.status()).into_response();
            }
        };

        if field.name() != Some("file") {
            continue;
        }

        let file_name = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return ApiError("Missing file name".to_string(), StatusCode::BAD_REQUEST).into_response(),
        };

        if let Err(e) = JobService::check_format(&file_name) {
            info!("Rejected upload {}: {}", file_name, e);
            return ApiError::from(e).into_response();
        }

        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Upload of {} interrupted: {}", file_name, e.body_text());
                return ApiError(format!("Upload failed: {}", e.body_text()), e.status()).into_response();
            }
        };

        return match JobService::upload(state, bytes, &file_name).await {
            Ok(res) => (StatusCode::OK, Json(res)).into_response(),
            Err(e) => ApiError::from(e).into_response(),
        };
    }

    ApiError("No file field found in multipart request".to_string(), StatusCode::BAD_REQUEST).into_response()
}

/// Process an uploaded video
/// Transcodes to the requested preset and returns the download path
#[utoipa::path(
    get,
    path = "/process/{file_id}",
    params(
        ("file_id" = String, Path, description = "Identifier returned by upload"),
        ProcessQuery
    ),
    responses(
        (status = 200, description = "Processed", body = ProcessResponse),
        (status = 404, description = "Unknown identifier", body = ErrorResponse),
        (status = 500, description = "Transcode failed", body = ErrorResponse)
    ),
    tag = "Jobs"
)]
pub async fn process_video(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
    Query(query): Query<ProcessQuery>,
) -> impl IntoResponse {
    let resolution = Resolution::parse(query.resolution.as_deref().unwrap_or(DEFAULT_RESOLUTION));

    match JobService::process(state, &file_id, resolution).await {
        Ok(res) => (StatusCode::OK, Json(res)).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Download a processed video
#[utoipa::path(
    get,
    path = "/download/{filename}",
    params(
        ("filename" = String, Path, description = "Artifact name, e.g. `{file_id}_processed.mp4`")
    ),
    responses(
        (status = 200, description = "Video stream", body = Vec<u8>, content_type = "video/mp4"),
        (status = 404, description = "File not found", body = ErrorResponse)
    ),
    tag = "Jobs"
)]
pub async fn download_file(State(state): State<AppState>, Path(filename): Path<String>) -> Response {
    let path = match JobService::artifact(state, &filename).await {
        Ok(path) => path,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return ApiError("File not found".to_string(), StatusCode::NOT_FOUND).into_response();
        }
        Err(e) => {
            error!("Failed to open {}: {}", path.display(), e);
            return ApiError(format!("Storage error: {}", e), StatusCode::INTERNAL_SERVER_ERROR).into_response();
        }
    };

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "video/mp4")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename.replace('"', "")),
        );

    if let Ok(meta) = file.metadata().await {
        builder = builder.header(header::CONTENT_LENGTH, meta.len());
    }

    let body = Body::from_stream(ReaderStream::new(file));

    builder
        .body(body)
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// Job state
#[utoipa::path(
    get,
    path = "/status/{file_id}",
    params(
        ("file_id" = String, Path, description = "Identifier returned by upload")
    ),
    responses(
        (status = 200, description = "Current state", body = JobStatusResponse),
        (status = 404, description = "Unknown identifier", body = ErrorResponse)
    ),
    tag = "Jobs"
)]
pub async fn job_status(State(state): State<AppState>, Path(file_id): Path<String>) -> impl IntoResponse {
    match JobService::status(state, &file_id).await {
        Ok(res) => (StatusCode::OK, Json(res)).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}
