use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub(crate) mod api_error;
pub(crate) mod handlers;
pub(crate) mod state;

use handlers::{method_not_allowed_handler, mutate_handler, readiness_handler};
use state::ApiServerState;

pub(crate) fn router(state: Arc<ApiServerState>) -> Router {
    Router::new()
        .route(
            "/mutate",
            post(mutate_handler).fallback(method_not_allowed_handler),
        )
        .route("/readiness", get(readiness_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
