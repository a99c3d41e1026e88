use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::core::{Invocation, non_empty, require_str};
use crate::errors::{ActionError, ActionResult};

pub const DEFAULT_REGION: &str = "eu-central-1";
pub const DEFAULT_BUCKET: &str = "bucket-name";
pub const DEFAULT_KEY: &str = "uploaded-file";
pub const DEFAULT_SAS_MINUTES: i64 = 5;
pub const MAX_SAS_MINUTES: i64 = 60;

const NO_SECRET: &str = "secret is not defined";

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AwsUploadSecret {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl AwsUploadSecret {
    pub fn from_invocation(invocation: &Invocation) -> ActionResult<Self> {
        let secret = invocation.secret(NO_SECRET)?;
        let access_key_id = secret
            .get("access_key_id")
            .ok_or_else(|| ActionError::config("access_key_id is not defined in selected secret"))?
            .to_string();
        let secret_access_key = secret
            .get("secret_access_key")
            .ok_or_else(|| {
                ActionError::config("secret_access_key is not defined in selected secret")
            })?
            .to_string();
        Ok(Self {
            access_key_id,
            secret_access_key,
        })
    }
}

impl fmt::Debug for AwsUploadSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsUploadSecret")
            .field("access_key_id", &self.access_key_id)
            .finish_non_exhaustive()
    }
}

/// Base64 storage account key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AzureUploadSecret {
    pub account_key: String,
}

impl AzureUploadSecret {
    pub fn from_invocation(invocation: &Invocation) -> ActionResult<Self> {
        let secret = invocation.secret(NO_SECRET)?;
        let account_key = secret
            .get("secret_access_key")
            .ok_or_else(|| {
                ActionError::config("secret_access_key is not defined in selected secret")
            })?
            .trim()
            .to_string();
        Ok(Self { account_key })
    }
}

impl fmt::Debug for AzureUploadSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureUploadSecret").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3UploadArgs {
    pub signature_version: Option<String>,
    pub region: Option<String>,
    pub bucket: Option<String>,
    pub key: Option<String>,
}

impl S3UploadArgs {
    /// Only SigV4 is signed; `v3` buckets no longer exist.
    pub fn check_signature_version(&self) -> ActionResult<()> {
        match non_empty(&self.signature_version) {
            None => Ok(()),
            Some(version) if version.eq_ignore_ascii_case("v4") => Ok(()),
            Some(version) => Err(ActionError::config(format!(
                "Signature version '{version}' is not supported. Use v4."
            ))),
        }
    }

    pub fn region(&self) -> &str {
        non_empty(&self.region).unwrap_or(DEFAULT_REGION)
    }

    pub fn bucket(&self) -> &str {
        non_empty(&self.bucket).unwrap_or(DEFAULT_BUCKET)
    }

    pub fn key(&self) -> &str {
        non_empty(&self.key).unwrap_or(DEFAULT_KEY)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureUploadArgs {
    #[serde(alias = "accountName")]
    pub account_storage_name: Option<String>,
    pub container_name: Option<String>,
    /// Minutes the SAS stays valid
    #[serde(alias = "Timeout")]
    pub timeout: Option<Value>,
}

impl AzureUploadArgs {
    pub fn account(&self) -> ActionResult<&str> {
        require_str(
            &self.account_storage_name,
            "No storage account name defined.",
        )
    }

    /// The given name, or a fresh UUID when none is set.
    pub fn container(&self) -> String {
        non_empty(&self.container_name)
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
    }

    /// SAS lifetime in minutes. Values outside 1..=60 fall back to the default.
    pub fn lifetime_minutes(&self) -> i64 {
        let minutes = match &self.timeout {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        minutes
            .map(|m| m.floor() as i64)
            .filter(|m| (1..=MAX_SAS_MINUTES).contains(m))
            .unwrap_or(DEFAULT_SAS_MINUTES)
    }
}
