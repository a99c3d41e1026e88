use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present here override
/// environment variables.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 3001
///
/// security:
///   cors_allowed_origins: "*"
///   api_secret: "flow-engine-token"
///
/// http:
///   timeout_seconds: 30
///
/// polling:
///   max_attempts: 15
///   delay_ms: 1000
///
/// endpoints:
///   uipath_orchestrator_url: "https://cloud.uipath.com"
///   microsoft_graph_url: "https://graph.microsoft.com/v1.0"
///
/// datasets:
///   zipcodes: "/srv/data/zipcodes_de.json"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub security: Option<SecurityYaml>,
    pub http: Option<HttpYaml>,
    pub polling: Option<PollingYaml>,
    pub endpoints: Option<EndpointsYaml>,
    pub datasets: Option<DatasetsYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SecurityYaml {
    pub cors_allowed_origins: Option<String>,
    pub api_secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct HttpYaml {
    pub timeout_seconds: Option<u64>,
}

/// Polling budget for actions that wait on a remote resource
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PollingYaml {
    pub max_attempts: Option<u32>,
    pub delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct EndpointsYaml {
    pub uipath_auth_url: Option<String>,
    pub uipath_orchestrator_url: Option<String>,
    pub microsoft_graph_url: Option<String>,
    pub microsoft_token_url: Option<String>,
    pub twilio_url: Option<String>,
    pub tvmaze_url: Option<String>,
    pub openweathermap_url: Option<String>,
    pub newsapi_url: Option<String>,
    pub ibm_iam_url: Option<String>,
    pub google_maps_url: Option<String>,
    pub azure_blob_url: Option<String>,
}

/// Local lookup tables replacing the embedded ones
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DatasetsYaml {
    pub zipcodes: Option<PathBuf>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be read
    /// - The YAML is malformed
    /// - Fields have invalid types
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_empty_yaml() {
        let config: YamlConfig = serde_yaml::from_str("").unwrap_or_default();
        assert!(config.server.is_none());
        assert!(config.endpoints.is_none());
    }

    #[test]
    fn test_partial_sections() {
        let yaml = r#"
polling:
  max_attempts: 3
endpoints:
  twilio_url: "http://localhost:4010"
"#;
        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();
        let polling = config.polling.unwrap();
        assert_eq!(polling.max_attempts, Some(3));
        assert_eq!(polling.delay_ms, None);
        assert_eq!(
            config.endpoints.unwrap().twilio_url,
            Some("http://localhost:4010".to_string())
        );
    }

    #[test]
    fn test_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        fs::write(&config_path, "server:\n  host: \"localhost\"\n  port: 3000\n").unwrap();

        let config = YamlConfig::from_file(&config_path).unwrap();
        assert_eq!(
            config.server.as_ref().unwrap().host,
            Some("localhost".to_string())
        );
        assert_eq!(config.server.as_ref().unwrap().port, Some(3000));
    }

    #[test]
    fn test_from_file_not_found() {
        let path = PathBuf::from("/nonexistent/config.yaml");
        let result = YamlConfig::from_file(&path);

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
    }
}
