pub mod health;
pub mod resumes;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/resumes", post(resumes::handle_upload))
        .route("/api/v1/resumes/:id", get(resumes::handle_status))
        // Raised past the upload cap so rejection happens in the handler
        // with a JSON error instead of a bare 413.
        .layer(DefaultBodyLimit::max(resumes::MAX_UPLOAD_BYTES + 64 * 1024))
        .with_state(state)
}
