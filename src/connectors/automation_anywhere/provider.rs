use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use super::config::{AutomationAnywhereSecret, DeployAutomationArgs};
use crate::connectors::ConnectorContext;
use crate::core::{Action, ConversationState, HttpTransport, Invocation, StorePolicy};
use crate::errors::{ActionError, ActionResult};
use crate::registry::ActionMetadata;

const CONNECTOR: &str = "automation_anywhere";
const STORE_MISSING: &str = "Context store not defined.";

#[derive(Debug, Deserialize)]
struct AuthenticationResponse {
    token: String,
}

#[derive(Debug, Clone)]
pub struct ControlRoomClient {
    transport: HttpTransport,
}

impl ControlRoomClient {
    pub fn new(ctx: &ConnectorContext) -> Self {
        Self {
            transport: ctx.transport.clone(),
        }
    }

    async fn authenticate(&self, secret: &AutomationAnywhereSecret) -> ActionResult<String> {
        let request = self
            .transport
            .request(Method::POST, &format!("{}/v1/authentication", secret.url))
            .json(&json!({
                "username": secret.username,
                "password": secret.password,
            }));
        let body = self.transport.send_json(request).await?;
        let auth: AuthenticationResponse = serde_json::from_value(body).map_err(|e| {
            ActionError::MalformedResponse(format!("Control Room authentication: {e}"))
        })?;
        Ok(auth.token)
    }

    /// Authenticate, then POST `body` to `path`.
    pub async fn post(
        &self,
        secret: &AutomationAnywhereSecret,
        path: &str,
        body: &Value,
    ) -> ActionResult<Value> {
        let token = self.authenticate(secret).await?;
        let request = self
            .transport
            .request(Method::POST, &format!("{}{}", secret.url, path))
            .header("X-Authorization", token)
            .json(body);
        self.transport.send_json(request).await
    }
}

fn validate_common(
    invocation: &Invocation,
) -> ActionResult<(StorePolicy, AutomationAnywhereSecret)> {
    let policy = invocation.policy()?;
    // secret presence is checked before the store key, field checks after
    invocation.secret("Secret not defined.")?;
    policy.require_key(STORE_MISSING)?;
    let secret = AutomationAnywhereSecret::from_invocation(invocation)?;
    Ok((policy, secret))
}

// =============================================================================
// Deploy
// =============================================================================

pub struct DeployAutomation {
    client: ControlRoomClient,
}

impl DeployAutomation {
    pub fn new(client: ControlRoomClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Action for DeployAutomation {
    fn metadata(&self) -> ActionMetadata {
        ActionMetadata::new(CONNECTOR, "deploy_automation")
            .with_display_name("Deploy Automation")
            .with_description("Deploys a bot file to the given devices")
            .with_aliases(&["deployAutomation"])
            .with_secret_fields(&AutomationAnywhereSecret::FIELDS)
    }

    async fn execute(
        &self,
        state: &mut ConversationState,
        invocation: Invocation,
    ) -> ActionResult<()> {
        let (policy, secret) = validate_common(&invocation)?;
        let (file_id, device_ids) = invocation.args::<DeployAutomationArgs>()?.validate()?;

        info!(file_id = %file_id, devices = device_ids.len(), "Deploying automation");
        let body = json!({
            "fileId": file_id,
            "deviceIds": device_ids,
            "runWithRdp": false,
        });
        let outcome = self
            .client
            .post(&secret, "/v2/automations/deploy", &body)
            .await;
        policy.settle(state, outcome)
    }
}

// =============================================================================
// Listings
// =============================================================================

/// The three Control Room listings. Each is an empty-filter POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Automations,
    BotExecutions,
    Devices,
}

impl ListKind {
    fn path(&self) -> &'static str {
        match self {
            ListKind::Automations => "/v2/repository/file/list",
            ListKind::BotExecutions => "/v2/activity/list",
            ListKind::Devices => "/v2/devices/list",
        }
    }

    fn names(&self) -> (&'static str, &'static str, &'static str) {
        match self {
            ListKind::Automations => ("list_automations", "List Automations", "listAutomations"),
            ListKind::BotExecutions => (
                "list_bot_executions",
                "List Bot Executions",
                "listBotExecutions",
            ),
            ListKind::Devices => ("list_devices", "List Devices", "listDevices"),
        }
    }
}

pub struct ListAction {
    client: ControlRoomClient,
    kind: ListKind,
}

impl ListAction {
    pub fn new(client: ControlRoomClient, kind: ListKind) -> Self {
        Self { client, kind }
    }
}

#[async_trait]
impl Action for ListAction {
    fn metadata(&self) -> ActionMetadata {
        let (id, display, legacy) = self.kind.names();
        ActionMetadata::new(CONNECTOR, id)
            .with_display_name(display)
            .with_description(format!("POST {}", self.kind.path()))
            .with_aliases(&[legacy])
            .with_secret_fields(&AutomationAnywhereSecret::FIELDS)
    }

    async fn execute(
        &self,
        state: &mut ConversationState,
        invocation: Invocation,
    ) -> ActionResult<()> {
        let (policy, secret) = validate_common(&invocation)?;
        let outcome = self.client.post(&secret, self.kind.path(), &json!({})).await;
        policy.settle(state, outcome)
    }
}
