//! Configuration module for the connector server
//!
//! Configuration comes from .env files, YAML files and environment variables.
//! Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `endpoints`: third-party base URLs and their defaults
//!
//! # Example
//! ```rust,no_run
//! use flow_connectors::config::ConnectorConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ConnectorConfig::from_env()?;
//!
//! // Load from YAML file with environment variable base
//! let config_path = PathBuf::from("config.yaml");
//! let config = ConnectorConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::env;
use std::path::PathBuf;
use std::time::Duration;

mod endpoints;
mod yaml;

pub use endpoints::Endpoints;
pub use yaml::YamlConfig;

use crate::core::{HttpTransport, PollPolicy};
use crate::utils::validate_service_url;

/// Server and connector configuration
#[derive(Debug, Clone)]
pub struct ConnectorConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // Security configuration
    /// CORS allowed origins (comma-separated list or "*" for all)
    /// Default: None (CORS disabled, same-origin only)
    pub cors_allowed_origins: Option<String>,
    /// Bearer token the flow engine must present on `/actions`. None disables auth.
    pub api_secret: Option<String>,

    // Outbound HTTP
    pub http_timeout_seconds: u64,

    // Polling (queue item lookups)
    pub poll_max_attempts: u32,
    pub poll_delay_ms: u64,

    pub endpoints: Endpoints,

    /// Replaces the embedded German zipcode dataset
    pub zipcode_dataset: Option<PathBuf>,
}

/// Zeroize the API secret when the configuration is dropped.
impl Drop for ConnectorConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut secret) = self.api_secret {
            secret.zeroize();
        }
    }
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            cors_allowed_origins: None,
            api_secret: None,
            http_timeout_seconds: 30,
            poll_max_attempts: 15,
            poll_delay_ms: 1000,
            endpoints: Endpoints::default(),
            zipcode_dataset: None,
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>, String> {
    match env_string(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| format!("Invalid value for {name}: {raw}")),
        None => Ok(None),
    }
}

fn override_with(target: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *target = value;
    }
}

impl ConnectorConfig {
    /// Load configuration from environment variables, falling back to defaults
    ///
    /// Recognised variables: `HOST`, `PORT`, `CORS_ALLOWED_ORIGINS`, `API_SECRET`,
    /// `HTTP_TIMEOUT_SECONDS`, `POLL_MAX_ATTEMPTS`, `POLL_DELAY_MS`, `ZIPCODE_DATASET` and one `<NAME>_URL`
    /// variable per endpoint (e.g. `UIPATH_AUTH_URL`, `MICROSOFT_GRAPH_URL`).
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Self::load_env()?;
        config.validate()?;
        Ok(config)
    }

    fn load_env() -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = Self::default();

        override_with(&mut config.host, env_string("HOST"));
        if let Some(port) = env_parse("PORT")? {
            config.port = port;
        }
        config.cors_allowed_origins = env_string("CORS_ALLOWED_ORIGINS");
        config.api_secret = env_string("API_SECRET");
        if let Some(timeout) = env_parse("HTTP_TIMEOUT_SECONDS")? {
            config.http_timeout_seconds = timeout;
        }
        if let Some(attempts) = env_parse("POLL_MAX_ATTEMPTS")? {
            config.poll_max_attempts = attempts;
        }
        if let Some(delay) = env_parse("POLL_DELAY_MS")? {
            config.poll_delay_ms = delay;
        }
        config.zipcode_dataset = env_string("ZIPCODE_DATASET").map(PathBuf::from);

        let e = &mut config.endpoints;
        override_with(&mut e.uipath_auth_url, env_string("UIPATH_AUTH_URL"));
        override_with(
            &mut e.uipath_orchestrator_url,
            env_string("UIPATH_ORCHESTRATOR_URL"),
        );
        override_with(&mut e.microsoft_graph_url, env_string("MICROSOFT_GRAPH_URL"));
        override_with(&mut e.microsoft_token_url, env_string("MICROSOFT_TOKEN_URL"));
        override_with(&mut e.twilio_url, env_string("TWILIO_URL"));
        override_with(&mut e.tvmaze_url, env_string("TVMAZE_URL"));
        override_with(&mut e.openweathermap_url, env_string("OPENWEATHERMAP_URL"));
        override_with(&mut e.newsapi_url, env_string("NEWSAPI_URL"));
        override_with(&mut e.ibm_iam_url, env_string("IBM_IAM_URL"));
        override_with(&mut e.google_maps_url, env_string("GOOGLE_MAPS_URL"));
        override_with(&mut e.azure_blob_url, env_string("AZURE_BLOB_URL"));

        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        // .env is loaded in main.rs before this runs
        let yaml_config = YamlConfig::from_file(path)?;
        let mut config = Self::load_env()?;
        config.apply_yaml(yaml_config);
        config.validate()?;
        Ok(config)
    }

    fn apply_yaml(&mut self, yaml: YamlConfig) {
        if let Some(server) = yaml.server {
            override_with(&mut self.host, server.host);
            if let Some(port) = server.port {
                self.port = port;
            }
        }
        if let Some(security) = yaml.security {
            if security.cors_allowed_origins.is_some() {
                self.cors_allowed_origins = security.cors_allowed_origins;
            }
            if security.api_secret.is_some() {
                self.api_secret = security.api_secret;
            }
        }
        if let Some(timeout) = yaml.http.and_then(|h| h.timeout_seconds) {
            self.http_timeout_seconds = timeout;
        }
        if let Some(polling) = yaml.polling {
            if let Some(attempts) = polling.max_attempts {
                self.poll_max_attempts = attempts;
            }
            if let Some(delay) = polling.delay_ms {
                self.poll_delay_ms = delay;
            }
        }
        if let Some(path) = yaml.datasets.and_then(|d| d.zipcodes) {
            self.zipcode_dataset = Some(path);
        }
        if let Some(y) = yaml.endpoints {
            let e = &mut self.endpoints;
            override_with(&mut e.uipath_auth_url, y.uipath_auth_url);
            override_with(&mut e.uipath_orchestrator_url, y.uipath_orchestrator_url);
            override_with(&mut e.microsoft_graph_url, y.microsoft_graph_url);
            override_with(&mut e.microsoft_token_url, y.microsoft_token_url);
            override_with(&mut e.twilio_url, y.twilio_url);
            override_with(&mut e.tvmaze_url, y.tvmaze_url);
            override_with(&mut e.openweathermap_url, y.openweathermap_url);
            override_with(&mut e.newsapi_url, y.newsapi_url);
            override_with(&mut e.ibm_iam_url, y.ibm_iam_url);
            override_with(&mut e.google_maps_url, y.google_maps_url);
            override_with(&mut e.azure_blob_url, y.azure_blob_url);
        }
    }

    /// Reject configurations that cannot work at runtime.
    pub fn validate(&self) -> Result<(), String> {
        if self.http_timeout_seconds == 0 {
            return Err("http timeout must be greater than zero".to_string());
        }
        if self.poll_max_attempts == 0 {
            return Err("polling max_attempts must be greater than zero".to_string());
        }
        for (name, url) in self.endpoints.entries() {
            // the account placeholder is not a valid host character
            let url = url.replace("{account}", "account");
            validate_service_url(&url).map_err(|e| format!("Invalid endpoint {name}: {e}"))?;
        }
        Ok(())
    }

    /// Get the server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn has_api_secret_auth(&self) -> bool {
        self.api_secret.as_deref().is_some_and(|s| !s.is_empty())
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::new(
            self.poll_max_attempts,
            Duration::from_millis(self.poll_delay_ms),
        )
    }

    pub fn transport(&self) -> HttpTransport {
        HttpTransport::new(Duration::from_secs(self.http_timeout_seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    // Helper to clean up environment variables
    fn cleanup_env_vars() {
        unsafe {
            env::remove_var("HOST");
            env::remove_var("PORT");
            env::remove_var("API_SECRET");
            env::remove_var("CORS_ALLOWED_ORIGINS");
            env::remove_var("HTTP_TIMEOUT_SECONDS");
            env::remove_var("POLL_MAX_ATTEMPTS");
            env::remove_var("POLL_DELAY_MS");
            env::remove_var("UIPATH_AUTH_URL");
            env::remove_var("TWILIO_URL");
            env::remove_var("ZIPCODE_DATASET");
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        cleanup_env_vars();

        let config = ConnectorConfig::from_env().unwrap();
        assert_eq!(config.address(), "0.0.0.0:3001");
        assert_eq!(config.poll_policy(), PollPolicy::default());
        assert!(!config.has_api_secret_auth());
        assert_eq!(config.endpoints, Endpoints::default());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        cleanup_env_vars();
        unsafe {
            env::set_var("PORT", "8080");
            env::set_var("API_SECRET", "engine-token");
            env::set_var("POLL_DELAY_MS", "10");
            env::set_var("UIPATH_AUTH_URL", "http://localhost:9999/oauth/token");
        }

        let config = ConnectorConfig::from_env().unwrap();
        assert_eq!(config.port, 8080);
        assert!(config.has_api_secret_auth());
        assert_eq!(config.poll_policy().delay, Duration::from_millis(10));
        assert_eq!(
            config.endpoints.uipath_auth_url,
            "http://localhost:9999/oauth/token"
        );

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_number() {
        cleanup_env_vars();
        unsafe {
            env::set_var("PORT", "not-a-port");
        }

        let result = ConnectorConfig::from_env();
        assert!(result.unwrap_err().to_string().contains("Invalid value for PORT"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_yaml_overrides_env() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        let yaml_content = r#"
server:
  host: "127.0.0.1"
  port: 8080
polling:
  max_attempts: 5
endpoints:
  twilio_url: "http://localhost:4010"
datasets:
  zipcodes: "/srv/data/zipcodes_de.json"
"#;
        fs::write(&config_path, yaml_content).unwrap();

        unsafe {
            env::set_var("HOST", "10.0.0.1");
            env::set_var("POLL_MAX_ATTEMPTS", "20");
            env::set_var("POLL_DELAY_MS", "250");
        }

        let config = ConnectorConfig::from_file(&config_path).unwrap();

        // YAML overrides ENV
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.poll_max_attempts, 5);
        // ENV value kept where YAML is silent
        assert_eq!(config.poll_delay_ms, 250);
        assert_eq!(config.endpoints.twilio_url, "http://localhost:4010");
        assert_eq!(
            config.zipcode_dataset,
            Some(PathBuf::from("/srv/data/zipcodes_de.json"))
        );

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_rejects_bad_endpoint() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(&config_path, "endpoints:\n  tvmaze_url: \"ftp://tvmaze\"\n").unwrap();

        let err = ConnectorConfig::from_file(&config_path).unwrap_err();
        assert!(err.to_string().contains("tvmaze_url"));
    }

    #[test]
    #[serial]
    fn test_from_file_missing_file() {
        cleanup_env_vars();

        let config_path = PathBuf::from("/nonexistent/config.yaml");
        let result = ConnectorConfig::from_file(&config_path);
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
    }

    #[test]
    fn test_validate_zero_attempts() {
        let mut config = ConnectorConfig::default();
        config.poll_max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_azure_blob_template() {
        let endpoints = Endpoints::default();
        assert_eq!(
            endpoints.azure_blob_for("myaccount"),
            "https://myaccount.blob.core.windows.net"
        );
    }
}
