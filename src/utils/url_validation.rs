//! URL validation for outbound service endpoints
//!
//! Endpoints come from two places: the server configuration and per-call arguments or
//! secrets (on-prem SharePoint, Elasticsearch hosts, flow webhooks). Both must be absolute
//! `http`/`https` URLs with a host before any request is built from them.

use thiserror::Error;
use url::Url;

/// Errors that can occur during URL validation
#[derive(Debug, Error)]
pub enum UrlValidationError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(#[from] url::ParseError),

    #[error("URL scheme must be http or https, got: {0}")]
    UnsupportedScheme(String),

    #[error("URL must have a host")]
    MissingHost,
}

/// Validates an outbound service URL.
///
/// Plain `http` is accepted because several services (on-prem RPA servers, internal search
/// clusters) are commonly reached without TLS.
pub fn validate_service_url(url: &str) -> Result<Url, UrlValidationError> {
    let parsed = Url::parse(url.trim())?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(UrlValidationError::UnsupportedScheme(other.to_string())),
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(parsed)
}

/// Validates `url` and strips trailing slashes so that paths can be appended with `/`.
pub fn service_base(url: &str) -> Result<String, UrlValidationError> {
    validate_service_url(url)?;
    Ok(url.trim().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_urls() {
        assert!(validate_service_url("https://graph.microsoft.com/v1.0").is_ok());
        assert!(validate_service_url("http://localhost:9200").is_ok());
        assert!(validate_service_url("  https://example.com/path  ").is_ok());
    }

    #[test]
    fn test_unsupported_scheme() {
        let err = validate_service_url("ftp://example.com").unwrap_err();
        assert!(matches!(err, UrlValidationError::UnsupportedScheme(s) if s == "ftp"));
    }

    #[test]
    fn test_invalid_format() {
        assert!(matches!(
            validate_service_url("not a url"),
            Err(UrlValidationError::InvalidFormat(_))
        ));
        assert!(matches!(
            validate_service_url("example.com/path"),
            Err(UrlValidationError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_service_base_strips_slashes() {
        assert_eq!(
            service_base("https://tenant.sharepoint.com/sites/team//").unwrap(),
            "https://tenant.sharepoint.com/sites/team"
        );
    }
}
