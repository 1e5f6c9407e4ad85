use crate::common::response::ApiError;
use crate::docs::ApiDoc;
use crate::state::AppState;
use axum::Router;
use axum::http::{StatusCode, Uri};
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub fn configure_routes() -> Router<AppState> {
    // The browser uploader is served from another origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(|| async { "ok" }))
        .merge(crate::modules::jobs::router())
        .fallback(not_found)
        .layer(cors)
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError(format!("No route for {}", uri.path()), StatusCode::NOT_FOUND)
}
