pub mod url_validation;
pub use url_validation::{UrlValidationError, service_base, validate_service_url};
