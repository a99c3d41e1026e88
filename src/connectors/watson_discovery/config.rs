use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::core::{Invocation, non_empty, require_str};
use crate::errors::{ActionError, ActionResult};
use crate::utils::service_base;

pub(super) const SECRET_INVALID: &str = "Secret not defined or invalid - needs iam_apikey and url.";
/// API version date used when the flow does not pin one.
pub const DEFAULT_VERSION: &str = "2018-12-03";

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct WatsonSecret {
    pub iam_apikey: String,
    pub url: String,
}

impl WatsonSecret {
    pub fn from_invocation(invocation: &Invocation) -> ActionResult<Self> {
        let secret = invocation.secret(SECRET_INVALID)?;
        let (Some(iam_apikey), Some(url)) = (secret.get("iam_apikey"), secret.get("url")) else {
            return Err(ActionError::config(SECRET_INVALID));
        };
        let url = service_base(url)
            .map_err(|e| ActionError::config(format!("Invalid Discovery url: {e}")))?;
        Ok(Self {
            iam_apikey: iam_apikey.to_string(),
            url,
        })
    }
}

impl fmt::Debug for WatsonSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatsonSecret")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryArgs {
    #[serde(alias = "environment_id")]
    pub environment_id: Option<String>,
    #[serde(alias = "collection_id")]
    pub collection_id: Option<String>,
    pub version: Option<String>,
    #[serde(alias = "natural_language_query")]
    pub natural_language_query: Option<String>,
    pub query: Option<String>,
    #[serde(alias = "other_parameters", default)]
    pub other_parameters: Value,
}

/// A validated Discovery query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryQuery {
    pub environment_id: String,
    pub collection_id: String,
    /// Query string pairs, `version` first.
    pub params: Vec<(String, String)>,
}

impl DiscoveryArgs {
    pub fn validate(&self) -> ActionResult<DiscoveryQuery> {
        let environment_id = require_str(&self.environment_id, "No environment id defined.")?;
        let collection_id = require_str(&self.collection_id, "No collection id defined.")?;
        let version = non_empty(&self.version).unwrap_or(DEFAULT_VERSION);

        let mut params = vec![("version".to_string(), version.to_string())];
        let extra = match &self.other_parameters {
            Value::Object(map) => map.clone(),
            _ => Default::default(),
        };
        if !extra.contains_key("count") {
            params.push(("count".to_string(), "1".to_string()));
        }
        for (name, value) in extra {
            let value = match value {
                Value::String(s) => s,
                Value::Null => continue,
                other => other.to_string(),
            };
            params.push((name, value));
        }

        if let Some(nlq) = non_empty(&self.natural_language_query) {
            params.push(("natural_language_query".to_string(), nlq.to_string()));
        } else if let Some(query) = non_empty(&self.query) {
            params.push(("query".to_string(), query.to_string()));
        }

        Ok(DiscoveryQuery {
            environment_id: environment_id.to_string(),
            collection_id: collection_id.to_string(),
            params,
        })
    }
}
