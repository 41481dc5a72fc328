use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{handlers, state::AppState};

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = body_limit(state.config().upload_limit_bytes);

    let api_routes = Router::new()
        .route("/formats", get(handlers::list_formats))
        .route("/convert", post(handlers::convert_upload))
        .layer(DefaultBodyLimit::max(upload_limit));

    Router::new()
        .route("/", get(handlers::index))
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Request body cap for the api routes, saturating where `usize` is narrower
fn body_limit(bytes: u64) -> usize {
    usize::try_from(bytes).unwrap_or(usize::MAX)
}
