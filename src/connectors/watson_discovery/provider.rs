use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::config::{DiscoveryArgs, DiscoveryQuery, WatsonSecret};
use crate::connectors::ConnectorContext;
use crate::core::{Action, ConversationState, HttpTransport, Invocation};
use crate::errors::{ActionError, ActionResult};
use crate::registry::ActionMetadata;

#[derive(Debug, Deserialize)]
struct IamToken {
    access_token: String,
}

#[derive(Debug, Clone)]
pub struct DiscoveryClient {
    transport: HttpTransport,
    iam_url: String,
}

impl DiscoveryClient {
    pub fn new(ctx: &ConnectorContext) -> Self {
        Self {
            transport: ctx.transport.clone(),
            iam_url: ctx.endpoints.ibm_iam_url.clone(),
        }
    }

    async fn iam_token(&self, secret: &WatsonSecret) -> ActionResult<String> {
        let request = self
            .transport
            .request(Method::POST, &self.iam_url)
            .header("Accept", "application/json")
            .form(&[
                ("grant_type", "urn:ibm:params:oauth:grant-type:apikey"),
                ("apikey", secret.iam_apikey.as_str()),
            ]);
        let body = self.transport.send_json(request).await?;
        let token: IamToken = serde_json::from_value(body)
            .map_err(|e| ActionError::MalformedResponse(format!("IAM token: {e}")))?;
        Ok(token.access_token)
    }

    pub async fn query(&self, secret: &WatsonSecret, query: &DiscoveryQuery) -> ActionResult<Value> {
        let token = self.iam_token(secret).await?;
        let url = format!(
            "{}/v1/environments/{}/collections/{}/query",
            secret.url, query.environment_id, query.collection_id
        );
        let request = self
            .transport
            .request(Method::GET, &url)
            .bearer_auth(token)
            .query(&query.params);
        self.transport.send_json(request).await
    }
}

pub struct Discovery {
    client: DiscoveryClient,
}

impl Discovery {
    pub fn new(client: DiscoveryClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Action for Discovery {
    fn metadata(&self) -> ActionMetadata {
        ActionMetadata::new("watson_discovery", "discovery")
            .with_display_name("Discovery Query")
            .with_description("Runs a (natural language) query against a Discovery collection")
            .with_secret_fields(&["iam_apikey", "url"])
    }

    async fn execute(
        &self,
        state: &mut ConversationState,
        invocation: Invocation,
    ) -> ActionResult<()> {
        let secret = WatsonSecret::from_invocation(&invocation)?;
        let query = invocation.args::<DiscoveryArgs>()?.validate()?;
        let policy = invocation.policy()?;
        policy.key()?;

        info!(
            environment = %query.environment_id,
            collection = %query.collection_id,
            "Querying Watson Discovery"
        );
        let outcome = self.client.query(&secret, &query).await;
        policy.settle(state, outcome)
    }
}
