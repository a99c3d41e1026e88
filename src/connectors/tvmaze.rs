//! TVmaze show lookup. Public API, no secret.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;

use super::ConnectorContext;
use crate::core::{Action, BoxedAction, ConversationState, HttpTransport, Invocation, require_str};
use crate::errors::ActionResult;
use crate::registry::ActionMetadata;

pub fn actions(ctx: &ConnectorContext) -> Vec<BoxedAction> {
    vec![Arc::new(SearchSingleShow::new(ctx))]
}

#[derive(Debug, Default, Deserialize)]
struct SearchArgs {
    query: Option<String>,
}

pub struct SearchSingleShow {
    transport: HttpTransport,
    base_url: String,
}

impl SearchSingleShow {
    pub fn new(ctx: &ConnectorContext) -> Self {
        Self {
            transport: ctx.transport.clone(),
            base_url: ctx.endpoints.tvmaze_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Action for SearchSingleShow {
    fn metadata(&self) -> ActionMetadata {
        ActionMetadata::new("tvmaze", "search_single_show")
            .with_display_name("Search Single Show")
            .with_description("Best matching show for a search query")
            .with_aliases(&["searchSingleShow"])
    }

    async fn execute(
        &self,
        state: &mut ConversationState,
        invocation: Invocation,
    ) -> ActionResult<()> {
        let args: SearchArgs = invocation.args()?;
        let query = require_str(&args.query, "No search query defined.")?;
        let policy = invocation.policy()?;
        policy.key()?;

        let request = self
            .transport
            .request(Method::GET, &format!("{}/singlesearch/shows", self.base_url))
            .query(&[("q", query)]);
        let outcome = self.transport.send_json(request).await;
        policy.settle(state, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::test_support::context_for;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_search_is_idempotent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/singlesearch/shows"))
            .and(query_param("q", "the office"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": 526, "name": "The Office"})),
            )
            .expect(2)
            .mount(&server)
            .await;

        let action = SearchSingleShow::new(&context_for(&server.uri()));
        let inv = Invocation::new(json!({"query": "the office", "store": "show"}));

        let mut first = ConversationState::new();
        action.execute(&mut first, inv.clone()).await.unwrap();
        let mut second = ConversationState::new();
        action.execute(&mut second, inv).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.context["show"]["name"], "The Office");
    }

    #[tokio::test]
    async fn test_unknown_show_is_soft_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let action = SearchSingleShow::new(&context_for(&server.uri()));
        let mut state = ConversationState::new();
        let inv = Invocation::new(json!({"query": "zzzz", "store": "show"}));
        action.execute(&mut state, inv).await.unwrap();
        assert!(
            state.context["show"]["error"]
                .as_str()
                .unwrap()
                .contains("404")
        );
    }
}
