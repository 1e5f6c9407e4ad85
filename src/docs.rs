use crate::common::response::ErrorResponse;
use crate::modules::jobs::dto::{JobStatusResponse, ProcessResponse, UploadResponse};
use crate::modules::jobs::model::JobState;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(title = "Video Processing API"),
    paths(
        crate::modules::jobs::handler::upload_video,
        crate::modules::jobs::handler::process_video,
        crate::modules::jobs::handler::download_file,
        crate::modules::jobs::handler::job_status,
    ),
    components(
        schemas(
            UploadResponse, ProcessResponse, JobStatusResponse, JobState, ErrorResponse,
        )
    ),
    tags(
        (name = "Jobs", description = "Upload, process and download videos")
    )
)]
pub struct ApiDoc;
