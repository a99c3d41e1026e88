use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::core::Invocation;
use crate::errors::{ActionError, ActionResult};
use crate::utils::service_base;

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AutomationAnywhereSecret {
    pub username: String,
    pub password: String,
    /// Control Room base URL without trailing slash
    pub url: String,
}

impl AutomationAnywhereSecret {
    pub const FIELDS: [&'static str; 3] = ["username", "url", "password"];

    /// All three fields are required. Checked in the order username, url, password.
    pub fn from_invocation(invocation: &Invocation) -> ActionResult<Self> {
        let secret = invocation.secret("Secret not defined.")?;
        let username = secret.require("username")?.to_string();
        let url = secret.require("url")?;
        let password = secret.require("password")?.to_string();
        let url = service_base(url)
            .map_err(|e| ActionError::config(format!("Secret field 'url' is invalid: {e}")))?;
        Ok(Self {
            username,
            password,
            url,
        })
    }
}

impl fmt::Debug for AutomationAnywhereSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutomationAnywhereSecret")
            .field("username", &self.username)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployAutomationArgs {
    pub file_id: Option<Value>,
    pub device_ids: Option<Value>,
}

impl DeployAutomationArgs {
    /// File id and device ids as the Control Room expects them.
    pub fn validate(&self) -> ActionResult<(Value, Vec<Value>)> {
        let file_id = match &self.file_id {
            Some(Value::Number(n)) => Value::Number(n.clone()),
            Some(Value::String(s)) if !s.trim().is_empty() => Value::String(s.trim().to_string()),
            _ => return Err(ActionError::config("No file id defined.")),
        };

        let device_ids: Vec<Value> = match &self.device_ids {
            Some(Value::Array(items)) => items
                .iter()
                .filter(|v| !v.is_null() && v.as_str() != Some(""))
                .cloned()
                .collect(),
            Some(Value::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| Value::String(s.to_string()))
                .collect(),
            Some(Value::Number(n)) => vec![Value::Number(n.clone())],
            _ => Vec::new(),
        };
        if device_ids.is_empty() {
            return Err(ActionError::config("No device ids defined."));
        }

        Ok((file_id, device_ids))
    }
}
