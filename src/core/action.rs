//! The action contract shared by every connector.
//!
//! An action validates its arguments and secret, talks to one remote system and settles the
//! outcome into the conversation state. [`StorePolicy::settle`] implements the soft/fatal rule
//! driven by `stopOnError`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::secret::Secret;
use super::state::{ConversationState, StoreTarget};
use crate::errors::{ActionError, ActionResult};
use crate::registry::ActionMetadata;

#[async_trait]
pub trait Action: Send + Sync {
    fn metadata(&self) -> ActionMetadata;

    /// Run the action against `state`.
    ///
    /// Configuration errors are always returned. Remote failures are returned only when the
    /// caller asked for `stopOnError`, otherwise they are recorded in the store.
    async fn execute(
        &self,
        state: &mut ConversationState,
        invocation: Invocation,
    ) -> ActionResult<()>;
}

pub type BoxedAction = Arc<dyn Action>;

/// Arguments and resolved secret for one call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Invocation {
    #[serde(default)]
    pub args: Value,
    #[serde(default)]
    pub secret: Option<Secret>,
}

impl Invocation {
    pub fn new(args: Value) -> Self {
        Self { args, secret: None }
    }

    pub fn with_secret(mut self, secret: Secret) -> Self {
        self.secret = Some(secret);
        self
    }

    /// Deserialize the arguments into a typed struct.
    pub fn args<T: DeserializeOwned>(&self) -> ActionResult<T> {
        let args = match &self.args {
            Value::Null => json!({}),
            other => other.clone(),
        };
        serde_json::from_value(args)
            .map_err(|e| ActionError::config(format!("Invalid arguments: {e}")))
    }

    pub fn policy(&self) -> ActionResult<StorePolicy> {
        self.args()
    }

    /// The secret, or a configuration error carrying `missing`.
    pub fn secret(&self, missing: &str) -> ActionResult<&Secret> {
        self.secret
            .as_ref()
            .ok_or_else(|| ActionError::config(missing))
    }
}

fn default_write_to_context() -> bool {
    true
}

/// Where and how an action records its outcome.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorePolicy {
    #[serde(default, alias = "store")]
    pub context_store: Option<String>,
    #[serde(default = "default_write_to_context")]
    pub write_to_context: bool,
    #[serde(default)]
    pub stop_on_error: bool,
}

impl Default for StorePolicy {
    fn default() -> Self {
        Self {
            context_store: None,
            write_to_context: true,
            stop_on_error: false,
        }
    }
}

impl StorePolicy {
    pub fn key(&self) -> ActionResult<&str> {
        self.require_key("No context store key defined.")
    }

    /// Like [`StorePolicy::key`] with a connector-specific message.
    pub fn require_key(&self, message: &str) -> ActionResult<&str> {
        self.context_store
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ActionError::config(message))
    }

    pub fn target(&self) -> StoreTarget {
        if self.write_to_context {
            StoreTarget::Context
        } else {
            StoreTarget::Input
        }
    }

    /// Write the outcome of a remote call into the state.
    ///
    /// * `Ok(value)` is stored under the key.
    /// * Configuration errors are returned untouched.
    /// * Other errors are returned when `stop_on_error` is set, otherwise `{ "error": message }`
    ///   is stored and the call succeeds.
    pub fn settle(
        &self,
        state: &mut ConversationState,
        outcome: ActionResult<Value>,
    ) -> ActionResult<()> {
        let key = self.key()?;
        match outcome {
            Ok(value) => {
                debug!(store = %key, "Storing action result");
                state.store(self.target(), key, value);
                Ok(())
            }
            Err(err) if err.is_configuration() => Err(err),
            Err(err) if self.stop_on_error => {
                warn!(store = %key, error = %err, "Action failed, stopping flow");
                Err(err)
            }
            Err(err) => {
                warn!(store = %key, error = %err, "Action failed, recording error");
                state.store(self.target(), key, json!({ "error": err.to_string() }));
                Ok(())
            }
        }
    }
}

/// Trimmed, non-empty string argument or a configuration error with `message`.
pub fn require_str<'a>(value: &'a Option<String>, message: &str) -> ActionResult<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ActionError::config(message))
}

/// Non-empty trimmed string, `None` otherwise.
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Strings from a JSON array, a comma-separated string or a single scalar.
/// Blank entries are dropped.
pub fn string_list(value: Option<&Value>) -> Vec<String> {
    let raw: Vec<String> = match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
        Some(Value::Number(n)) => vec![n.to_string()],
        _ => Vec::new(),
    };
    raw.into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(stop_on_error: bool) -> StorePolicy {
        StorePolicy {
            context_store: Some("result".to_string()),
            write_to_context: true,
            stop_on_error,
        }
    }

    #[test]
    fn test_policy_aliases() {
        let inv = Invocation::new(json!({"store": "weather", "stopOnError": true}));
        let policy = inv.policy().unwrap();
        assert_eq!(policy.key().unwrap(), "weather");
        assert!(policy.stop_on_error);
        assert!(policy.write_to_context);

        let inv = Invocation::new(json!({"contextStore": "news", "writeToContext": false}));
        let policy = inv.policy().unwrap();
        assert_eq!(policy.key().unwrap(), "news");
        assert_eq!(policy.target(), StoreTarget::Input);
        assert!(!policy.stop_on_error);
    }

    #[test]
    fn test_missing_key() {
        let policy = Invocation::new(Value::Null).policy().unwrap();
        assert_eq!(
            policy.key().unwrap_err().to_string(),
            "No context store key defined."
        );
    }

    #[test]
    fn test_settle_success() {
        let mut state = ConversationState::new();
        policy(false)
            .settle(&mut state, Ok(json!({"ok": true})))
            .unwrap();
        assert_eq!(state.context["result"], json!({"ok": true}));
    }

    #[test]
    fn test_settle_soft_error() {
        let mut state = ConversationState::new();
        policy(false)
            .settle(&mut state, Err(ActionError::Network("refused".into())))
            .unwrap();
        assert_eq!(
            state.context["result"],
            json!({"error": "Request failed: refused"})
        );
    }

    #[test]
    fn test_settle_fatal_error() {
        let mut state = ConversationState::new();
        let result = policy(true).settle(&mut state, Err(ActionError::PollingExhausted(15)));
        assert!(matches!(result, Err(ActionError::PollingExhausted(15))));
        assert!(state.context.is_empty());
    }

    #[test]
    fn test_settle_never_swallows_configuration_errors() {
        let mut state = ConversationState::new();
        let result = policy(false).settle(&mut state, Err(ActionError::config("No filter defined")));
        assert!(result.is_err());
        assert!(state.context.is_empty());
    }

    #[test]
    fn test_string_list() {
        assert_eq!(
            string_list(Some(&json!("a@b.com, c@d.com ,"))),
            vec!["a@b.com", "c@d.com"]
        );
        assert_eq!(string_list(Some(&json!(["x", 3, null]))), vec!["x", "3"]);
        assert!(string_list(None).is_empty());
    }

    #[test]
    fn test_require_str() {
        assert_eq!(require_str(&Some(" q ".into()), "missing").unwrap(), "q");
        assert!(require_str(&Some("   ".into()), "missing").is_err());
        assert!(require_str(&None, "missing").is_err());
    }
}
