//! newsapi.org top headlines.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;

use super::ConnectorContext;
use crate::core::{Action, BoxedAction, ConversationState, HttpTransport, Invocation, non_empty};
use crate::errors::{ActionError, ActionResult};
use crate::registry::ActionMetadata;

pub fn actions(ctx: &ConnectorContext) -> Vec<BoxedAction> {
    vec![Arc::new(GetNewsHeadlines::new(ctx))]
}

/// All filters are optional. newsapi.org rejects `sources` combined with `country` or
/// `category`; that error is reported by the remote side.
#[derive(Debug, Default, Deserialize)]
pub struct HeadlineArgs {
    pub sources: Option<String>,
    #[serde(alias = "q")]
    pub query: Option<String>,
    pub category: Option<String>,
    pub language: Option<String>,
    pub country: Option<String>,
}

impl HeadlineArgs {
    /// Query pairs for the non-empty filters.
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("sources", &self.sources),
            ("q", &self.query),
            ("category", &self.category),
            ("language", &self.language),
            ("country", &self.country),
        ]
        .into_iter()
        .filter_map(|(name, value)| non_empty(value).map(|v| (name, v)))
        .collect()
    }
}

pub struct GetNewsHeadlines {
    transport: HttpTransport,
    base_url: String,
}

impl GetNewsHeadlines {
    pub fn new(ctx: &ConnectorContext) -> Self {
        Self {
            transport: ctx.transport.clone(),
            base_url: ctx.endpoints.newsapi_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Action for GetNewsHeadlines {
    fn metadata(&self) -> ActionMetadata {
        ActionMetadata::new("news", "get_news_headlines")
            .with_display_name("Get News Headlines")
            .with_description("Top headlines filtered by source, query, category, language or country")
            .with_aliases(&["getNewsHeadlines"])
            .with_secret_fields(&["apiKey"])
    }

    async fn execute(
        &self,
        state: &mut ConversationState,
        invocation: Invocation,
    ) -> ActionResult<()> {
        let secret = invocation.secret("No secret defined")?;
        let api_key = secret
            .get("apiKey")
            .ok_or_else(|| ActionError::config("The secret is missing the 'apiKey' field."))?;
        let policy = invocation.policy()?;
        policy.key()?;
        let args: HeadlineArgs = invocation.args()?;

        let filters = args.query_pairs();
        debug!(filters = filters.len(), "Fetching top headlines");
        let request = self
            .transport
            .request(Method::GET, &format!("{}/top-headlines", self.base_url))
            .header("X-Api-Key", api_key)
            .query(&filters);
        let outcome = self.transport.send_json(request).await;
        policy.settle(state, outcome)
    }
}
