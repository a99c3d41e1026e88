//! Kofax RPA robot execution through the Management Console REST API.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use super::ConnectorContext;
use crate::core::{
    Action, BoxedAction, ConversationState, HttpTransport, Invocation, non_empty, require_str,
};
use crate::errors::{ActionError, ActionResult};
use crate::registry::ActionMetadata;
use crate::utils::service_base;

const SECRET_INVALID: &str = "Secret not defined or invalid.";

pub fn actions(ctx: &ConnectorContext) -> Vec<BoxedAction> {
    vec![Arc::new(RunRobot::new(ctx))]
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRobotArgs {
    pub robot: Option<String>,
    pub project: Option<String>,
    pub variable_name: Option<String>,
    pub value: Option<Value>,
}

impl RunRobotArgs {
    /// Robot path relative to `/rest/run/`. The `.robot` suffix is added when missing.
    pub fn robot_path(&self) -> ActionResult<String> {
        let robot = require_str(&self.robot, "No robot name defined.")?;
        let robot = robot.strip_suffix(".robot").unwrap_or(robot);
        Ok(match non_empty(&self.project) {
            Some(project) => format!("{project}/{robot}.robot"),
            None => format!("{robot}.robot"),
        })
    }

    /// Robot input. Empty when no variable name is given.
    pub fn parameters(&self) -> Value {
        let Some(variable) = non_empty(&self.variable_name) else {
            return json!({ "parameters": [] });
        };
        let value = match &self.value {
            Some(Value::String(s)) => Value::String(s.clone()),
            Some(Value::Null) | None => Value::String(String::new()),
            Some(other) => Value::String(other.to_string()),
        };
        json!({
            "parameters": [{
                "variableName": variable,
                "attribute": [{
                    "type": "text",
                    "name": variable,
                    "value": value,
                }]
            }]
        })
    }
}

pub struct RunRobot {
    transport: HttpTransport,
}

impl RunRobot {
    pub fn new(ctx: &ConnectorContext) -> Self {
        Self {
            transport: ctx.transport.clone(),
        }
    }
}

#[async_trait]
impl Action for RunRobot {
    fn metadata(&self) -> ActionMetadata {
        ActionMetadata::new("kofax", "run_robot")
            .with_display_name("Run Robot")
            .with_description("Runs a robot and stores its returned values")
            .with_aliases(&["RunRobot"])
            .with_secret_fields(&["server"])
    }

    async fn execute(
        &self,
        state: &mut ConversationState,
        invocation: Invocation,
    ) -> ActionResult<()> {
        let secret = invocation.secret(SECRET_INVALID)?;
        let server = secret
            .get("server")
            .ok_or_else(|| ActionError::config(SECRET_INVALID))?;
        let server = service_base(server)
            .map_err(|e| ActionError::config(format!("Invalid Kofax server: {e}")))?;
        let args: RunRobotArgs = invocation.args()?;
        let robot_path = args.robot_path()?;
        let policy = invocation.policy()?;
        policy.key()?;

        info!(robot = %robot_path, "Running Kofax robot");
        let request = self
            .transport
            .request(Method::POST, &format!("{server}/rest/run/{robot_path}"))
            .header("Accept", "application/json")
            .json(&args.parameters());
        let outcome = self
            .transport
            .send_json(request)
            .await
            .map(|response| response.get("values").cloned().unwrap_or(Value::Null));
        policy.settle(state, outcome)
    }
}
