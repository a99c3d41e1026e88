use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::core::{Invocation, require_str};
use crate::errors::{ActionError, ActionResult};

pub(super) const SECRET_INVALID: &str = "Secret not defined or invalid.";

// =============================================================================
// Secret
// =============================================================================

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct UiPathSecret {
    pub client_id: String,
    pub refresh_token: String,
    pub account_logical_name: String,
    pub service_instance_logical_name: String,
}

impl UiPathSecret {
    pub const FIELDS: [&'static str; 4] = [
        "client_id",
        "refresh_token",
        "account_logical_name",
        "service_instance_logical_name",
    ];

    pub fn from_invocation(invocation: &Invocation) -> ActionResult<Self> {
        let secret = invocation.secret(SECRET_INVALID)?;
        Ok(Self {
            client_id: secret.require("client_id")?.to_string(),
            refresh_token: secret.require("refresh_token")?.to_string(),
            account_logical_name: secret.require("account_logical_name")?.to_string(),
            service_instance_logical_name: secret
                .require("service_instance_logical_name")?
                .to_string(),
        })
    }
}

impl fmt::Debug for UiPathSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiPathSecret")
            .field("account_logical_name", &self.account_logical_name)
            .field(
                "service_instance_logical_name",
                &self.service_instance_logical_name,
            )
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Enumerations
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueuePriority {
    Low,
    Normal,
    High,
}

impl QueuePriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueuePriority::Low => "Low",
            QueuePriority::Normal => "Normal",
            QueuePriority::High => "High",
        }
    }
}

impl FromStr for QueuePriority {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(QueuePriority::Low),
            "normal" => Ok(QueuePriority::Normal),
            "high" => Ok(QueuePriority::High),
            other => Err(ActionError::config(format!(
                "Invalid priority '{other}'. Please select Low, Normal or High."
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStrategy {
    Specific,
    All,
}

impl JobStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStrategy::Specific => "Specific",
            JobStrategy::All => "All",
        }
    }
}

impl FromStr for JobStrategy {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "specific" => Ok(JobStrategy::Specific),
            "all" => Ok(JobStrategy::All),
            other => Err(ActionError::config(format!(
                "Invalid strategy '{other}'. Please specify Specific or All."
            ))),
        }
    }
}

// =============================================================================
// Arguments
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddQueueItemArgs {
    pub queue_name: Option<String>,
    pub priority: Option<String>,
    #[serde(alias = "payload")]
    pub specific_content: Option<Value>,
}

/// Validated form of [`AddQueueItemArgs`].
#[derive(Debug, Clone)]
pub struct QueueItemRequest {
    pub queue_name: String,
    pub priority: QueuePriority,
    pub content: serde_json::Map<String, Value>,
}

impl AddQueueItemArgs {
    pub fn validate(&self) -> ActionResult<QueueItemRequest> {
        let queue_name = require_str(
            &self.queue_name,
            "No queue provided. Please provide a valid queue name.",
        )?;
        let priority: QueuePriority =
            require_str(&self.priority, "Please select a priority.")?.parse()?;
        let content = match &self.specific_content {
            None | Some(Value::Null) => return Err(ActionError::config("No payload provided.")),
            Some(Value::Object(map)) => map.clone(),
            Some(_) => {
                return Err(ActionError::config(
                    "The payload must be a JSON object.",
                ));
            }
        };
        Ok(QueueItemRequest {
            queue_name: queue_name.to_string(),
            priority,
            content,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetQueueItemArgs {
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartJobArgs {
    pub release_key: Option<String>,
    /// A single id, a number, or a comma-separated list
    #[serde(alias = "robotIds")]
    pub robot_id: Option<Value>,
    pub strategy: Option<String>,
    pub input_arguments: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct StartJobRequest {
    pub release_key: String,
    pub robot_ids: Vec<i64>,
    pub strategy: JobStrategy,
    pub input_arguments: String,
}

impl StartJobArgs {
    pub fn validate(&self) -> ActionResult<StartJobRequest> {
        let release_key = require_str(
            &self.release_key,
            "Please provide a valid Release Key. Use the GetReleases operation to get a list of releases.",
        )?;
        let robot_ids = parse_robot_ids(self.robot_id.as_ref())
            .ok_or_else(|| ActionError::config("Please provide a valid Robot ID."))?;
        let strategy: JobStrategy = require_str(
            &self.strategy,
            "No Strategy specified. Please specify a Strategy.",
        )?
        .parse()?;

        // Orchestrator expects the arguments as a JSON-encoded string
        let input_arguments = match &self.input_arguments {
            None | Some(Value::Null) => "{}".to_string(),
            Some(Value::String(raw)) if raw.trim().is_empty() => "{}".to_string(),
            Some(Value::String(raw)) => raw.clone(),
            Some(other) => other.to_string(),
        };

        Ok(StartJobRequest {
            release_key: release_key.to_string(),
            robot_ids,
            strategy,
            input_arguments,
        })
    }
}

fn parse_robot_ids(value: Option<&Value>) -> Option<Vec<i64>> {
    let ids: Vec<i64> = match value? {
        Value::Number(n) => vec![n.as_i64()?],
        Value::String(s) => s
            .split(',')
            .map(|part| part.trim().parse().ok())
            .collect::<Option<Vec<_>>>()?,
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?,
        _ => return None,
    };
    if ids.is_empty() { None } else { Some(ids) }
}
