//! SharePoint REST API with user credentials.
//!
//! Credentials are sent as HTTP basic authentication, which on-prem farms accept when basic
//! auth is enabled on the web application. `allowInvalidCerts` relaxes TLS verification for
//! that call only.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use tracing::info;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::ConnectorContext;
use crate::core::{
    Action, BoxedAction, ConversationState, HttpTransport, Invocation, TransportOptions,
    non_empty, require_str,
};
use crate::errors::{ActionError, ActionResult};
use crate::registry::ActionMetadata;
use crate::utils::service_base;

const ODATA_VERBOSE: &str = "application/json;odata=verbose";

pub fn actions(ctx: &ConnectorContext) -> Vec<BoxedAction> {
    vec![
        Arc::new(SharePointAction::new(ctx, SharePointQuery::SiteInfo)),
        Arc::new(SharePointAction::new(ctx, SharePointQuery::ListItems)),
    ]
}

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
struct SharePointSecret {
    username: String,
    password: String,
}

impl fmt::Debug for SharePointSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharePointSecret")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharePointArgs {
    pub url: Option<String>,
    pub list: Option<String>,
    pub filter: Option<String>,
    #[serde(default)]
    pub allow_invalid_certs: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharePointQuery {
    SiteInfo,
    ListItems,
}

impl SharePointQuery {
    /// Site-relative API path.
    pub fn api_path(&self, args: &SharePointArgs) -> ActionResult<String> {
        match self {
            SharePointQuery::SiteInfo => Ok("/_api/web".to_string()),
            SharePointQuery::ListItems => {
                let list = require_str(&args.list, "The sharepoint list is not defined.")?;
                let filter = non_empty(&args.filter).unwrap_or_default();
                if !filter.is_empty() && !filter.starts_with('?') {
                    return Err(ActionError::config(
                        "You have to insert an '?' at the beginning of your filter.",
                    ));
                }
                // OData string literals escape a quote by doubling it
                let list = list.replace('\'', "''");
                Ok(format!("/_api/lists/getbytitle('{list}')/items{filter}"))
            }
        }
    }
}

pub struct SharePointAction {
    transport: HttpTransport,
    query: SharePointQuery,
}

impl SharePointAction {
    pub fn new(ctx: &ConnectorContext, query: SharePointQuery) -> Self {
        Self {
            transport: ctx.transport.clone(),
            query,
        }
    }
}

#[async_trait]
impl Action for SharePointAction {
    fn metadata(&self) -> ActionMetadata {
        let meta = match self.query {
            SharePointQuery::SiteInfo => ActionMetadata::new("sharepoint", "get_site_info")
                .with_display_name("Get Site Info")
                .with_description("Site information from /_api/web")
                .with_aliases(&["getSharepointSiteInfo"]),
            SharePointQuery::ListItems => ActionMetadata::new("sharepoint", "get_list_items")
                .with_display_name("Get List Items")
                .with_description("Items of a list, optionally filtered with an OData query")
                .with_aliases(&["getSharepointListItems"]),
        };
        meta.with_secret_fields(&["username", "password"])
    }

    async fn execute(
        &self,
        state: &mut ConversationState,
        invocation: Invocation,
    ) -> ActionResult<()> {
        let secret = invocation.secret("Secret not defined.")?;
        let secret = SharePointSecret {
            username: secret.require("username")?.to_string(),
            password: secret.require("password")?.to_string(),
        };
        let args: SharePointArgs = invocation.args()?;
        let site = require_str(&args.url, "The request url is not defined.")?;
        let path = self.query.api_path(&args)?;
        let policy = invocation.policy()?;
        policy.require_key("Context store not defined.")?;
        let site = service_base(site)
            .map_err(|e| ActionError::config(format!("Invalid SharePoint url: {e}")))?;

        let options = if args.allow_invalid_certs {
            TransportOptions::insecure()
        } else {
            TransportOptions::default()
        };
        info!(site = %site, path = %path, insecure = args.allow_invalid_certs, "Querying SharePoint");
        let outcome = match self
            .transport
            .request_with(Method::GET, &format!("{site}{path}"), &options)
        {
            Ok(request) => {
                let request = request
                    .basic_auth(&secret.username, Some(&secret.password))
                    .header("Accept", ODATA_VERBOSE);
                self.transport.send_json(request).await
            }
            Err(err) => Err(err),
        };
        policy.settle(state, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Secret;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn secret() -> Secret {
        Secret::new()
            .with("username", "CONTOSO\\bot")
            .with("password", "pw")
    }

    #[test]
    fn test_list_path() {
        let args = SharePointArgs {
            list: Some("Ada's Tasks".into()),
            filter: Some("?$select=Title".into()),
            ..Default::default()
        };
        assert_eq!(
            SharePointQuery::ListItems.api_path(&args).unwrap(),
            "/_api/lists/getbytitle('Ada''s Tasks')/items?$select=Title"
        );
    }

    #[test]
    fn test_filter_must_start_with_question_mark() {
        let args = SharePointArgs {
            list: Some("Tasks".into()),
            filter: Some("$top=5".into()),
            ..Default::default()
        };
        assert_eq!(
            SharePointQuery::ListItems.api_path(&args).unwrap_err().to_string(),
            "You have to insert an '?' at the beginning of your filter."
        );
    }

    #[tokio::test]
    async fn test_site_info() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sites/dev/_api/web"))
            .and(header("accept", ODATA_VERBOSE))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"d": {"Title": "Dev Site"}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let action = SharePointAction::new(&ConnectorContext::default(), SharePointQuery::SiteInfo);
        let mut state = ConversationState::new();
        let inv = Invocation::new(json!({
            "url": format!("{}/sites/dev/", server.uri()),
            "contextStore": "site"
        }))
        .with_secret(secret());
        action.execute(&mut state, inv).await.unwrap();
        assert_eq!(state.context["site"]["d"]["Title"], "Dev Site");
    }

    #[tokio::test]
    async fn test_list_items_with_relaxed_certs() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/_api/lists/getbytitle('Tasks')/items"))
            .and(query_param("$top", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"d": {"results": []}})))
            .expect(1)
            .mount(&server)
            .await;

        let action = SharePointAction::new(&ConnectorContext::default(), SharePointQuery::ListItems);
        let mut state = ConversationState::new();
        let inv = Invocation::new(json!({
            "url": server.uri(),
            "list": "Tasks",
            "filter": "?$top=2",
            "allowInvalidCerts": true,
            "contextStore": "items"
        }))
        .with_secret(secret());
        action.execute(&mut state, inv).await.unwrap();
        assert_eq!(state.context["items"], json!({"d": {"results": []}}));
    }

    #[tokio::test]
    async fn test_missing_password() {
        let action = SharePointAction::new(&ConnectorContext::default(), SharePointQuery::SiteInfo);
        let mut state = ConversationState::new();
        let inv = Invocation::new(json!({"contextStore": "site"}))
            .with_secret(Secret::new().with("username", "bot"));
        let err = action.execute(&mut state, inv).await.unwrap_err();
        assert_eq!(err.to_string(), "Secret is missing the 'password' field.");
    }
}
