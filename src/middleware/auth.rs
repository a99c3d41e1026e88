use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::errors::AuthError;
use crate::state::AppState;

/// Extract the bearer token from the Authorization header
fn extract_token(request: &Request) -> Result<&str, AuthError> {
    let header = request
        .headers()
        .get("authorization")
        .ok_or(AuthError::MissingAuthHeader)?;
    let value = header.to_str().map_err(|_| AuthError::InvalidAuthHeader)?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AuthError::InvalidAuthHeader)
}

/// Constant-time comparison so the secret cannot be guessed byte by byte.
fn token_matches(token: &str, secret: &str) -> bool {
    token.as_bytes().ct_eq(secret.as_bytes()).into()
}

/// Bearer token check against the configured API secret.
///
/// Without an `api_secret` every request passes. The secret protects the action routes
/// only; the health check stays public.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let Some(secret) = state.config.api_secret.as_deref().filter(|s| !s.is_empty()) else {
        return Ok(next.run(request).await);
    };

    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let token = extract_token(&request)?;

    if token_matches(token, secret) {
        tracing::debug!(method = %method, path = %path, "API secret authentication successful");
        Ok(next.run(request).await)
    } else {
        tracing::warn!(method = %method, path = %path, "API secret authentication failed: token mismatch");
        Err(AuthError::Unauthorized("Invalid API secret".to_string()))
    }
}
