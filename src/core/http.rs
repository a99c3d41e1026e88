//! Outbound HTTP used by every connector.
//!
//! One pooled `reqwest` client is shared by all actions. Options that change TLS behaviour
//! apply to a single call only and never touch the shared client.

use std::time::Duration;

use bytes::Bytes;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;
use tracing::debug;

use crate::errors::{ActionError, ActionResult};

/// Longest remote error body kept in an error message.
const MAX_ERROR_BODY: usize = 1024;

/// Per-call transport settings.
#[derive(Debug, Clone, Default)]
pub struct TransportOptions {
    /// Skip certificate verification for this request only (self-signed on-prem servers)
    pub accept_invalid_certs: bool,
    /// Overrides the transport-wide timeout
    pub timeout: Option<Duration>,
}

impl TransportOptions {
    pub fn insecure() -> Self {
        Self {
            accept_invalid_certs: true,
            timeout: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Request on the shared client.
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Request honouring `options`. Certificate relaxation builds a dedicated client that is
    /// dropped with the request.
    pub fn request_with(
        &self,
        method: Method,
        url: &str,
        options: &TransportOptions,
    ) -> ActionResult<RequestBuilder> {
        let builder = if options.accept_invalid_certs {
            Client::builder()
                .timeout(options.timeout.unwrap_or(self.timeout))
                .danger_accept_invalid_certs(true)
                .build()
                .map_err(|e| ActionError::Network(format!("Failed to build client: {e}")))?
                .request(method, url)
        } else {
            self.client.request(method, url)
        };

        Ok(match options.timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        })
    }

    /// Send and decode a JSON body. An empty body decodes to `null`.
    pub async fn send_json(&self, request: RequestBuilder) -> ActionResult<Value> {
        let text = self.send_text(request).await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ActionError::MalformedResponse(e.to_string()))
    }

    pub async fn send_text(&self, request: RequestBuilder) -> ActionResult<String> {
        let response = self.send(request).await?;
        response
            .text()
            .await
            .map_err(|e| ActionError::MalformedResponse(e.to_string()))
    }

    pub async fn send_bytes(&self, request: RequestBuilder) -> ActionResult<Bytes> {
        let response = self.send(request).await?;
        response
            .bytes()
            .await
            .map_err(|e| ActionError::Network(e.to_string()))
    }

    /// Send and fail on any non-success status.
    pub async fn send(&self, request: RequestBuilder) -> ActionResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| ActionError::Network(e.to_string()))?;

        let status = response.status();
        debug!(status = %status, url = %response.url(), "Remote call completed");

        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(ActionError::RemoteStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}
