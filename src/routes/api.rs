use axum::{
    Router,
    routing::get,
};
use tower_http::trace::TraceLayer;

use crate::handlers::actions;
use crate::state::AppState;
use std::sync::Arc;

/// Create the action router
///
/// Note: Authentication middleware is applied by the caller once state is available
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/actions", get(actions::list_actions))
        .route(
            "/actions/{id}",
            get(actions::get_action).post(actions::invoke_action),
        )
        .layer(TraceLayer::new_for_http())
}
