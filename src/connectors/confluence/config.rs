use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::core::{Invocation, require_str};
use crate::errors::{ActionError, ActionResult};
use crate::utils::service_base;

pub(super) const SECRET_INVALID: &str = "Secret not defined or invalid.";
const SPACE_MISSING: &str = "Please provide a valid Confluence Space (e.g. KNOW)";

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ConfluenceSecret {
    pub username: String,
    pub password: String,
    pub base_url: String,
}

impl ConfluenceSecret {
    pub const FIELDS: [&'static str; 3] = ["username", "password", "baseUrl"];

    pub fn from_invocation(invocation: &Invocation) -> ActionResult<Self> {
        let secret = invocation.secret(SECRET_INVALID)?;
        let (Some(username), Some(password), Some(base_url)) = (
            secret.get("username"),
            secret.get("password"),
            secret.get("baseUrl"),
        ) else {
            return Err(ActionError::config(SECRET_INVALID));
        };
        let base_url = service_base(base_url)
            .map_err(|e| ActionError::config(format!("Invalid Confluence baseUrl: {e}")))?;
        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
            base_url,
        })
    }
}

impl fmt::Debug for ConfluenceSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfluenceSecret")
            .field("username", &self.username)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// `maxResults` as a positive page size. Zero or garbage means "server default".
fn max_results(value: &Option<Value>) -> Option<u32> {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    parsed
        .filter(|n| *n > 0)
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagesArgs {
    pub confluence_space: Option<String>,
    pub max_results: Option<Value>,
}

impl PagesArgs {
    pub fn validate(&self) -> ActionResult<(&str, Option<u32>)> {
        let space = require_str(&self.confluence_space, SPACE_MISSING)?;
        Ok((space, max_results(&self.max_results)))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchArgs {
    #[serde(alias = "text")]
    pub search_input: Option<String>,
    pub max_results: Option<Value>,
}

impl SearchArgs {
    /// CQL full-text query over pages.
    pub fn cql(&self) -> ActionResult<String> {
        let text = require_str(&self.search_input, "Please provide a valid searchInput")?;
        let escaped = text.replace('\\', "\\\\").replace('"', "\\\"");
        Ok(format!("type=page and text~\"{escaped}\" order by id asc"))
    }

    pub fn limit(&self) -> Option<u32> {
        max_results(&self.max_results)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LexiconArgs {
    pub confluence_space: Option<String>,
    pub lexicon_id: Option<String>,
    pub lexicon_tag_name: Option<String>,
}

/// Validated lexicon generation target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexiconTarget<'a> {
    pub space: &'a str,
    pub lexicon_id: &'a str,
    pub tag: &'a str,
}

impl LexiconArgs {
    pub fn validate(&self) -> ActionResult<LexiconTarget<'_>> {
        Ok(LexiconTarget {
            space: require_str(&self.confluence_space, SPACE_MISSING)?,
            lexicon_id: require_str(
                &self.lexicon_id,
                "Please provide a valid LexiconId. You can find the lexicon id by opening a lexicon and clicking on the top right menu (3 dots)",
            )?,
            tag: require_str(&self.lexicon_tag_name, "Please provide a valid Tag name")?,
        })
    }
}
