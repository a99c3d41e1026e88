use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};
use uuid::Uuid;

use super::config::{AddQueueItemArgs, GetQueueItemArgs, StartJobArgs, UiPathSecret};
use crate::connectors::ConnectorContext;
use crate::core::{
    Action, ConversationState, HttpTransport, Invocation, PollPolicy, poll_until, require_str,
};
use crate::errors::{ActionError, ActionResult};
use crate::registry::ActionMetadata;

const CONNECTOR: &str = "uipath";

// =============================================================================
// Orchestrator client
// =============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Thin client for the Orchestrator OData API of one tenant.
#[derive(Debug, Clone)]
pub struct UiPathClient {
    transport: HttpTransport,
    auth_url: String,
    orchestrator_url: String,
}

impl UiPathClient {
    pub fn new(ctx: &ConnectorContext) -> Self {
        Self {
            transport: ctx.transport.clone(),
            auth_url: ctx.endpoints.uipath_auth_url.clone(),
            orchestrator_url: ctx
                .endpoints
                .uipath_orchestrator_url
                .trim_end_matches('/')
                .to_string(),
        }
    }

    /// Exchange the refresh token for an access token. Fetched once per action call.
    pub async fn access_token(&self, secret: &UiPathSecret) -> ActionResult<String> {
        let request = self.transport.request(Method::POST, &self.auth_url).json(&json!({
            "grant_type": "refresh_token",
            "client_id": secret.client_id,
            "refresh_token": secret.refresh_token,
        }));
        let body = self.transport.send_json(request).await?;
        let token: TokenResponse = serde_json::from_value(body).map_err(|e| {
            ActionError::MalformedResponse(format!("UiPath token response: {e}"))
        })?;
        debug!("UiPath access token fetched");
        Ok(token.access_token)
    }

    fn odata_url(&self, secret: &UiPathSecret, path: &str) -> String {
        format!(
            "{}/{}/{}/odata/{}",
            self.orchestrator_url,
            secret.account_logical_name,
            secret.service_instance_logical_name,
            path
        )
    }

    /// Authenticated OData call.
    pub async fn odata(
        &self,
        secret: &UiPathSecret,
        token: &str,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> ActionResult<Value> {
        let mut request = self
            .transport
            .request(method, &self.odata_url(secret, path))
            .bearer_auth(token)
            .header("X-UIPATH-TenantName", &secret.service_instance_logical_name);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        self.transport.send_json(request).await
    }

    /// Token exchange followed by one OData call.
    async fn call(
        &self,
        secret: &UiPathSecret,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> ActionResult<Value> {
        let token = self.access_token(secret).await?;
        self.odata(secret, &token, method, path, &[], body).await
    }
}

fn metadata(action: &str, display: &str, legacy: &str, description: &str) -> ActionMetadata {
    ActionMetadata::new(CONNECTOR, action)
        .with_display_name(display)
        .with_description(description)
        .with_aliases(&[legacy])
        .with_secret_fields(&UiPathSecret::FIELDS)
}

// =============================================================================
// Add Queue Item
// =============================================================================

pub struct AddQueueItem {
    client: UiPathClient,
}

impl AddQueueItem {
    pub fn new(client: UiPathClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Action for AddQueueItem {
    fn metadata(&self) -> ActionMetadata {
        metadata(
            "add_queue_item",
            "Add Queue Item",
            "AddQueueItem",
            "Adds a payload to an Orchestrator queue, tagged with a fresh ResultId",
        )
    }

    async fn execute(
        &self,
        state: &mut ConversationState,
        invocation: Invocation,
    ) -> ActionResult<()> {
        let policy = invocation.policy()?;
        let secret = UiPathSecret::from_invocation(&invocation)?;
        let request = invocation.args::<AddQueueItemArgs>()?.validate()?;
        policy.key()?;

        let result_id = Uuid::new_v4().to_string();
        let mut content = request.content;
        content.insert("ResultId".to_string(), Value::String(result_id.clone()));
        content.insert(
            "ResultId@odata.type".to_string(),
            Value::String("#String".to_string()),
        );
        let body = json!({
            "itemData": {
                "Name": request.queue_name,
                "Priority": request.priority.as_str(),
                "SpecificContent": content,
            }
        });

        info!(queue = %request.queue_name, result_id = %result_id, "Adding UiPath queue item");
        let outcome = self
            .client
            .call(
                &secret,
                Method::POST,
                "Queues/UiPathODataSvc.AddQueueItem",
                Some(&body),
            )
            .await;
        policy.settle(state, outcome)
    }
}

// =============================================================================
// Get Queue Item (polling)
// =============================================================================

pub struct GetQueueItem {
    client: UiPathClient,
    poll: PollPolicy,
}

impl GetQueueItem {
    pub fn new(client: UiPathClient, poll: PollPolicy) -> Self {
        Self { client, poll }
    }

    async fn find(&self, secret: &UiPathSecret, filter: &str) -> ActionResult<Value> {
        let token = self.client.access_token(secret).await?;
        let token = token.as_str();
        let client = &self.client;
        poll_until(&self.poll, move |attempt| async move {
            let page = client
                .odata(
                    secret,
                    token,
                    Method::GET,
                    "QueueItems",
                    &[("$filter", filter), ("$top", "1")],
                    None,
                )
                .await?;
            let item = page
                .get("value")
                .and_then(Value::as_array)
                .and_then(|items| items.first())
                .cloned();
            if item.is_none() {
                debug!(attempt, "Could not find item in return queue");
            }
            Ok(item)
        })
        .await
    }
}

#[async_trait]
impl Action for GetQueueItem {
    fn metadata(&self) -> ActionMetadata {
        metadata(
            "get_queue_item",
            "Get Queue Item",
            "GetQueueItem",
            "Polls the Orchestrator queue items until one matches the OData filter",
        )
    }

    async fn execute(
        &self,
        state: &mut ConversationState,
        invocation: Invocation,
    ) -> ActionResult<()> {
        let policy = invocation.policy()?;
        let secret = UiPathSecret::from_invocation(&invocation)?;
        let args: GetQueueItemArgs = invocation.args()?;
        let filter = require_str(&args.filter, "No filter defined")?;
        policy.key()?;

        let outcome = self.find(&secret, filter).await;
        policy.settle(state, outcome)
    }
}

// =============================================================================
// Releases and Jobs
// =============================================================================

pub struct GetReleases {
    client: UiPathClient,
}

impl GetReleases {
    pub fn new(client: UiPathClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Action for GetReleases {
    fn metadata(&self) -> ActionMetadata {
        metadata(
            "get_releases",
            "Get Releases",
            "GetReleases",
            "Lists the process releases of the tenant",
        )
    }

    async fn execute(
        &self,
        state: &mut ConversationState,
        invocation: Invocation,
    ) -> ActionResult<()> {
        let policy = invocation.policy()?;
        let secret = UiPathSecret::from_invocation(&invocation)?;
        policy.key()?;

        let outcome = self.client.call(&secret, Method::GET, "Releases", None).await;
        policy.settle(state, outcome)
    }
}

pub struct GetJobs {
    client: UiPathClient,
}

impl GetJobs {
    pub fn new(client: UiPathClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Action for GetJobs {
    fn metadata(&self) -> ActionMetadata {
        metadata(
            "get_jobs",
            "Get Jobs",
            "GetJobs",
            "Lists the jobs of the tenant",
        )
    }

    async fn execute(
        &self,
        state: &mut ConversationState,
        invocation: Invocation,
    ) -> ActionResult<()> {
        let policy = invocation.policy()?;
        let secret = UiPathSecret::from_invocation(&invocation)?;
        policy.key()?;

        let outcome = self.client.call(&secret, Method::GET, "Jobs", None).await;
        policy.settle(state, outcome)
    }
}

pub struct StartJob {
    client: UiPathClient,
}

impl StartJob {
    pub fn new(client: UiPathClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Action for StartJob {
    fn metadata(&self) -> ActionMetadata {
        metadata(
            "start_job",
            "Start Job",
            "StartJob",
            "Starts a job for a release on the given robots",
        )
    }

    async fn execute(
        &self,
        state: &mut ConversationState,
        invocation: Invocation,
    ) -> ActionResult<()> {
        let policy = invocation.policy()?;
        let secret = UiPathSecret::from_invocation(&invocation)?;
        let request = invocation.args::<StartJobArgs>()?.validate()?;
        policy.key()?;

        let body = json!({
            "startInfo": {
                "ReleaseKey": request.release_key,
                "Strategy": request.strategy.as_str(),
                "RobotIds": request.robot_ids,
                "NoOfRobots": 0,
                "Source": "Manual",
                "InputArguments": request.input_arguments,
            }
        });

        info!(release_key = %request.release_key, "Starting UiPath job");
        let outcome = self
            .client
            .call(
                &secret,
                Method::POST,
                "Jobs/UiPath.Server.Configuration.OData.StartJobs",
                Some(&body),
            )
            .await;
        policy.settle(state, outcome)
    }
}
