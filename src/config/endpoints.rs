//! Base URLs of the third-party services.
//!
//! Defaults point at the public production endpoints. Overrides exist for private clouds,
//! regional deployments and test doubles.

pub const DEFAULT_UIPATH_AUTH_URL: &str = "https://account.uipath.com/oauth/token";
pub const DEFAULT_UIPATH_ORCHESTRATOR_URL: &str = "https://platform.uipath.com";
pub const DEFAULT_MICROSOFT_GRAPH_URL: &str = "https://graph.microsoft.com/v1.0";
pub const DEFAULT_MICROSOFT_TOKEN_URL: &str =
    "https://login.microsoftonline.com/common/oauth2/v2.0/token";
pub const DEFAULT_TWILIO_URL: &str = "https://api.twilio.com";
pub const DEFAULT_TVMAZE_URL: &str = "https://api.tvmaze.com";
pub const DEFAULT_OPENWEATHERMAP_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_NEWSAPI_URL: &str = "https://newsapi.org/v2";
pub const DEFAULT_IBM_IAM_URL: &str = "https://iam.cloud.ibm.com/identity/token";
pub const DEFAULT_GOOGLE_MAPS_URL: &str = "https://maps.googleapis.com/maps/api";
/// `{account}` is replaced with the storage account name
pub const DEFAULT_AZURE_BLOB_URL: &str = "https://{account}.blob.core.windows.net";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub uipath_auth_url: String,
    pub uipath_orchestrator_url: String,
    pub microsoft_graph_url: String,
    pub microsoft_token_url: String,
    pub twilio_url: String,
    pub tvmaze_url: String,
    pub openweathermap_url: String,
    pub newsapi_url: String,
    pub ibm_iam_url: String,
    pub google_maps_url: String,
    pub azure_blob_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            uipath_auth_url: DEFAULT_UIPATH_AUTH_URL.to_string(),
            uipath_orchestrator_url: DEFAULT_UIPATH_ORCHESTRATOR_URL.to_string(),
            microsoft_graph_url: DEFAULT_MICROSOFT_GRAPH_URL.to_string(),
            microsoft_token_url: DEFAULT_MICROSOFT_TOKEN_URL.to_string(),
            twilio_url: DEFAULT_TWILIO_URL.to_string(),
            tvmaze_url: DEFAULT_TVMAZE_URL.to_string(),
            openweathermap_url: DEFAULT_OPENWEATHERMAP_URL.to_string(),
            newsapi_url: DEFAULT_NEWSAPI_URL.to_string(),
            ibm_iam_url: DEFAULT_IBM_IAM_URL.to_string(),
            google_maps_url: DEFAULT_GOOGLE_MAPS_URL.to_string(),
            azure_blob_url: DEFAULT_AZURE_BLOB_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// All endpoints as `(name, url)` pairs, used by validation.
    pub fn entries(&self) -> [(&'static str, &str); 11] {
        [
            ("uipath_auth_url", &self.uipath_auth_url),
            ("uipath_orchestrator_url", &self.uipath_orchestrator_url),
            ("microsoft_graph_url", &self.microsoft_graph_url),
            ("microsoft_token_url", &self.microsoft_token_url),
            ("twilio_url", &self.twilio_url),
            ("tvmaze_url", &self.tvmaze_url),
            ("openweathermap_url", &self.openweathermap_url),
            ("newsapi_url", &self.newsapi_url),
            ("ibm_iam_url", &self.ibm_iam_url),
            ("google_maps_url", &self.google_maps_url),
            ("azure_blob_url", &self.azure_blob_url),
        ]
    }

    /// Blob service URL for a storage account.
    pub fn azure_blob_for(&self, account: &str) -> String {
        self.azure_blob_url
            .replace("{account}", account)
            .trim_end_matches('/')
            .to_string()
    }
}
