use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;
use tracing::info;

use super::config::{
    AzureAdSecret, STORE_MISSING, StartAuthenticationArgs, TokenRequestArgs,
};
use crate::connectors::ConnectorContext;
use crate::core::{Action, ConversationState, HttpTransport, Invocation};
use crate::errors::ActionResult;
use crate::registry::ActionMetadata;

const CONNECTOR: &str = "azure_ad";

/// Emits the `microsoft-auth` plugin directive. No remote call.
pub struct StartAuthentication;

#[async_trait]
impl Action for StartAuthentication {
    fn metadata(&self) -> ActionMetadata {
        ActionMetadata::new(CONNECTOR, "start_authentication")
            .with_display_name("Start Authentication")
            .with_description("Opens the Microsoft login in the webchat")
            .with_aliases(&["startAuthentication"])
            .with_secret_fields(&AzureAdSecret::FIELDS)
            .output_only()
    }

    async fn execute(
        &self,
        state: &mut ConversationState,
        invocation: Invocation,
    ) -> ActionResult<()> {
        let secret = AzureAdSecret::from_invocation(&invocation)?;
        let args: StartAuthenticationArgs = invocation.args()?;
        let (redirect_uri, scope) = args.validate()?;
        invocation.policy()?.require_key(STORE_MISSING)?;

        state.output(
            Some(String::new()),
            json!({
                "_plugin": {
                    "type": "microsoft-auth",
                    "clientId": secret.client_id,
                    "redirectUri": redirect_uri,
                    "scope": scope,
                }
            }),
        );
        Ok(())
    }
}

pub struct GetAuthenticationToken {
    transport: HttpTransport,
    token_url: String,
}

impl GetAuthenticationToken {
    pub fn new(ctx: &ConnectorContext) -> Self {
        Self {
            transport: ctx.transport.clone(),
            token_url: ctx.endpoints.microsoft_token_url.clone(),
        }
    }
}

#[async_trait]
impl Action for GetAuthenticationToken {
    fn metadata(&self) -> ActionMetadata {
        ActionMetadata::new(CONNECTOR, "get_authentication_token")
            .with_display_name("Get Authentication Token")
            .with_description("Exchanges the Microsoft authorization code for an access token")
            .with_aliases(&["getAuthenticationToken"])
            .with_secret_fields(&AzureAdSecret::FIELDS)
    }

    async fn execute(
        &self,
        state: &mut ConversationState,
        invocation: Invocation,
    ) -> ActionResult<()> {
        let secret = AzureAdSecret::from_invocation(&invocation)?;
        let args: TokenRequestArgs = invocation.args()?;
        let request = args.validate()?;
        let policy = invocation.policy()?;
        policy.require_key(STORE_MISSING)?;

        info!(scope = %request.scope, "Exchanging Microsoft authorization code");
        let form = [
            ("client_id", secret.client_id.as_str()),
            ("grant_type", "authorization_code"),
            ("scope", request.scope),
            ("code", request.code),
            ("redirect_uri", request.redirect_uri),
            ("client_secret", secret.client_secret.as_str()),
        ];
        let http = self
            .transport
            .request(Method::POST, &self.token_url)
            .form(&form);
        let outcome = self.transport.send_json(http).await;
        policy.settle(state, outcome)
    }
}
