use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingAuthHeader,

    #[error("Invalid Authorization header format, expected 'Bearer <token>'")]
    InvalidAuthHeader,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string(), "kind": "unauthorized" }));
        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}
