use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};

pub mod dto;
pub mod error;
pub mod handler;
pub mod model;
pub mod repository;
pub mod service;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(handler::upload_video))
        .route("/upload/", post(handler::upload_video))
        .route("/process/{file_id}", get(handler::process_video))
        .route("/download/{filename}", get(handler::download_file))
        .route("/status/{file_id}", get(handler::job_status))
}
