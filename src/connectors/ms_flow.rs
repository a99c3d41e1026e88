//! Microsoft Power Automate (Flow) HTTP trigger.
//!
//! When a callback URL is given the payload is enriched with the identifiers the flow needs
//! to inject its answer back into the conversation.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;

use super::ConnectorContext;
use crate::core::{
    Action, BoxedAction, ConversationState, HttpTransport, Invocation, LogLevel, non_empty,
    require_str,
};
use crate::errors::{ActionError, ActionResult};
use crate::registry::ActionMetadata;
use crate::utils::validate_service_url;

pub fn actions(ctx: &ConnectorContext) -> Vec<BoxedAction> {
    vec![Arc::new(StartFlow::new(ctx))]
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartFlowArgs {
    #[serde(alias = "flowURL")]
    pub flow_url: Option<String>,
    #[serde(default)]
    pub payload: Value,
    #[serde(alias = "callbackURL")]
    pub callback_url: Option<String>,
}

impl StartFlowArgs {
    /// Body for the trigger. Keys of an object payload win over the callback defaults.
    pub fn body(&self, state: &ConversationState) -> Value {
        let Some(callback) = non_empty(&self.callback_url) else {
            return self.payload.clone();
        };
        let mut body = Map::new();
        for key in ["userId", "sessionId", "URLToken"] {
            body.insert(
                key.to_string(),
                state.input.get(key).cloned().unwrap_or(Value::Null),
            );
        }
        body.insert("callbackURL".to_string(), Value::String(callback.to_string()));
        match &self.payload {
            Value::Object(payload) => {
                body.extend(payload.clone());
                Value::Object(body)
            }
            Value::Null => Value::Object(body),
            other => other.clone(),
        }
    }
}

pub struct StartFlow {
    transport: HttpTransport,
}

impl StartFlow {
    pub fn new(ctx: &ConnectorContext) -> Self {
        Self {
            transport: ctx.transport.clone(),
        }
    }
}

#[async_trait]
impl Action for StartFlow {
    fn metadata(&self) -> ActionMetadata {
        ActionMetadata::new("ms_flow", "start_flow")
            .with_display_name("Start Flow")
            .with_description("Triggers a flow through its HTTP request URL")
            .with_aliases(&["startFlow"])
    }

    async fn execute(
        &self,
        state: &mut ConversationState,
        invocation: Invocation,
    ) -> ActionResult<()> {
        let args: StartFlowArgs = invocation.args()?;
        let flow_url = require_str(&args.flow_url, "No flow URL defined.")?;
        let flow_url = validate_service_url(flow_url)
            .map_err(|e| ActionError::config(format!("Invalid flow URL: {e}")))?;
        let policy = invocation.policy()?;
        policy.key()?;

        info!(host = flow_url.host_str().unwrap_or_default(), "Starting flow");
        let request = self
            .transport
            .request(Method::POST, flow_url.as_str())
            .json(&args.body(state));
        let outcome = self.transport.send_json(request).await;
        if let Err(err) = &outcome {
            state.log(LogLevel::Error, err.to_string());
        }
        policy.settle(state, outcome)
    }
}
