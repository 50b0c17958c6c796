use axum::{
    middleware::from_fn,
    routing::{delete, get, post},
    Router,
};
use service_core::middleware::request_id_middleware;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    app::health_check,
    documents::{delete_document, download_document, list_documents},
    jobs::{cancel_job, delete_job, get_job, list_jobs, retry_job, start_job},
};
use crate::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/documents", get(list_documents))
        .route("/documents/:id", delete(delete_document))
        .route("/documents/:id/download", get(download_document))
        .route("/jobs", get(list_jobs))
        .route("/jobs/:id", get(get_job).delete(delete_job))
        .route("/jobs/:id/start", post(start_job))
        .route("/jobs/:id/cancel", post(cancel_job))
        .route("/jobs/:id/retry", post(retry_job))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}
