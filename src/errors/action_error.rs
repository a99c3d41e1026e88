use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Errors raised while validating or executing an action.
///
/// Configuration errors (`InvalidConfiguration`, `UnknownAction`) are raised before any
/// outbound call and are never converted into a soft context value. Everything else is a
/// remote failure and follows the caller's `stopOnError` choice.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Missing or invalid argument or secret field. The message is shown to the flow author as-is.
    #[error("{0}")]
    InvalidConfiguration(String),

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// The request never produced a response (DNS, TLS, connect, timeout)
    #[error("Request failed: {0}")]
    Network(String),

    /// The remote service answered with a non-success status
    #[error("Request failed with status code {status}: {body}")]
    RemoteStatus { status: u16, body: String },

    /// The response body could not be decoded
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("maximum polling retries reached! ({0} attempts)")]
    PollingExhausted(u32),

    /// Failure reported by a provider SDK or protocol (SMTP, presigning)
    #[error("{0}")]
    Provider(String),
}

pub type ActionResult<T> = Result<T, ActionError>;

impl ActionError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    /// True for errors that must surface regardless of `stopOnError`.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ActionError::InvalidConfiguration(_) | ActionError::UnknownAction(_)
        )
    }

    /// Short machine-readable classification used in HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            ActionError::InvalidConfiguration(_) => "invalid_configuration",
            ActionError::UnknownAction(_) => "unknown_action",
            ActionError::Network(_) => "network",
            ActionError::RemoteStatus { .. } => "remote_status",
            ActionError::MalformedResponse(_) => "malformed_response",
            ActionError::PollingExhausted(_) => "polling_exhausted",
            ActionError::Provider(_) => "provider",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ActionError::InvalidConfiguration(_) => StatusCode::BAD_REQUEST,
            ActionError::UnknownAction(_) => StatusCode::NOT_FOUND,
            ActionError::PollingExhausted(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ActionError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), error = %self, "Action failed");
        } else {
            tracing::debug!(kind = self.kind(), error = %self, "Action rejected");
        }
        let body = Json(json!({
            "error": self.to_string(),
            "kind": self.kind(),
        }));
        (status, body).into_response()
    }
}
