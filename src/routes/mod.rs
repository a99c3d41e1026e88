pub mod api;

use std::sync::Arc;

use axum::{Router, middleware, routing::get};

use crate::handlers;
use crate::middleware::auth_middleware;
use crate::state::AppState;

/// Public health check plus the authenticated action routes.
///
/// CORS and security headers are layered on by the binary.
pub fn create_app(state: Arc<AppState>) -> Router {
    let protected_routes = api::create_api_router().layer(middleware::from_fn_with_state(
        state.clone(),
        auth_middleware,
    ));

    Router::new()
        .route("/", get(handlers::api::health_check))
        .merge(protected_routes)
        .with_state(state)
}
