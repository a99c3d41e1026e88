//! Elasticsearch search over the REST API.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::ConnectorContext;
use crate::core::{
    Action, BoxedAction, ConversationState, HttpTransport, Invocation, non_empty, require_str,
};
use crate::errors::{ActionError, ActionResult};
use crate::registry::ActionMetadata;
use crate::utils::service_base;

const STORE_MISSING: &str = "No context store defined";

pub fn actions(ctx: &ConnectorContext) -> Vec<BoxedAction> {
    vec![
        Arc::new(SimpleSearch::new(ctx)),
        Arc::new(SearchWithDsl::new(ctx)),
    ]
}

/// Cluster URL from the `host` secret field.
fn cluster(invocation: &Invocation) -> ActionResult<String> {
    let host = invocation
        .secret("No secret defined")?
        .get("host")
        .ok_or_else(|| ActionError::config("The secret is missing the 'host' field"))?;
    service_base(host).map_err(|e| ActionError::config(format!("Invalid Elasticsearch host: {e}")))
}

// =============================================================================
// Query string search
// =============================================================================

#[derive(Debug, Default, Deserialize)]
struct SimpleSearchArgs {
    query: Option<String>,
}

pub struct SimpleSearch {
    transport: HttpTransport,
}

impl SimpleSearch {
    pub fn new(ctx: &ConnectorContext) -> Self {
        Self {
            transport: ctx.transport.clone(),
        }
    }
}

#[async_trait]
impl Action for SimpleSearch {
    fn metadata(&self) -> ActionMetadata {
        ActionMetadata::new("elasticsearch", "simple_search")
            .with_display_name("Simple Search")
            .with_description("Lucene query string search across all indices")
            .with_aliases(&["simpleSearch"])
            .with_secret_fields(&["host"])
    }

    async fn execute(
        &self,
        state: &mut ConversationState,
        invocation: Invocation,
    ) -> ActionResult<()> {
        let host = cluster(&invocation)?;
        let args: SimpleSearchArgs = invocation.args()?;
        let query = require_str(&args.query, "No search query defined")?;
        let policy = invocation.policy()?;
        policy.require_key(STORE_MISSING)?;

        debug!(host = %host, "Elasticsearch query string search");
        let request = self
            .transport
            .request(Method::GET, &format!("{host}/_search"))
            .query(&[("q", query)]);
        let outcome = self.transport.send_json(request).await;
        policy.settle(state, outcome)
    }
}

// =============================================================================
// Query DSL search
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct DslSearchArgs {
    pub index: Option<String>,
    /// Mapping type, only meaningful on clusters older than 7.0
    #[serde(rename = "type")]
    pub doc_type: Option<String>,
    #[serde(default)]
    pub body: Value,
}

impl DslSearchArgs {
    /// Search path and parsed body. A string body must hold a JSON object.
    pub fn validate(&self) -> ActionResult<(String, Value)> {
        let index = require_str(&self.index, "No elastic search index defined")?;
        let body = match &self.body {
            Value::Null => return Err(ActionError::config("No DSL query body defined")),
            Value::String(raw) if raw.trim().is_empty() => {
                return Err(ActionError::config("No DSL query body defined"));
            }
            Value::String(raw) => serde_json::from_str(raw).map_err(|e| {
                ActionError::config(format!("The DSL query body is not valid JSON: {e}"))
            })?,
            other => other.clone(),
        };
        let path = match non_empty(&self.doc_type) {
            Some(doc_type) => format!("/{index}/{doc_type}/_search"),
            None => format!("/{index}/_search"),
        };
        Ok((path, body))
    }
}

pub struct SearchWithDsl {
    transport: HttpTransport,
}

impl SearchWithDsl {
    pub fn new(ctx: &ConnectorContext) -> Self {
        Self {
            transport: ctx.transport.clone(),
        }
    }
}

#[async_trait]
impl Action for SearchWithDsl {
    fn metadata(&self) -> ActionMetadata {
        ActionMetadata::new("elasticsearch", "search_with_dsl")
            .with_display_name("Search With DSL")
            .with_description("Query DSL search on one index")
            .with_aliases(&["searchWithDSL"])
            .with_secret_fields(&["host"])
    }

    async fn execute(
        &self,
        state: &mut ConversationState,
        invocation: Invocation,
    ) -> ActionResult<()> {
        let host = cluster(&invocation)?;
        let args: DslSearchArgs = invocation.args()?;
        let (path, body) = args.validate()?;
        let policy = invocation.policy()?;
        policy.require_key(STORE_MISSING)?;

        debug!(host = %host, path = %path, "Elasticsearch DSL search");
        let request = self
            .transport
            .request(Method::POST, &format!("{host}{path}"))
            .json(&body);
        let outcome = self.transport.send_json(request).await;
        policy.settle(state, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Secret;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn with_host(args: Value, host: &str) -> Invocation {
        Invocation::new(args).with_secret(Secret::new().with("host", host))
    }

    #[test]
    fn test_dsl_body_from_string() {
        let args = DslSearchArgs {
            index: Some("faq".into()),
            doc_type: None,
            body: json!(r#"{"query": {"match": {"answer": "refund"}}}"#),
        };
        let (path, body) = args.validate().unwrap();
        assert_eq!(path, "/faq/_search");
        assert_eq!(body["query"]["match"]["answer"], "refund");
    }

    #[test]
    fn test_dsl_validation() {
        let args = DslSearchArgs {
            index: Some("faq".into()),
            doc_type: Some("doc".into()),
            body: json!("{not json"),
        };
        assert!(
            args.validate()
                .unwrap_err()
                .to_string()
                .starts_with("The DSL query body is not valid JSON")
        );

        let args = DslSearchArgs {
            index: Some("faq".into()),
            ..Default::default()
        };
        assert_eq!(args.validate().unwrap_err().to_string(), "No DSL query body defined");
    }

    #[tokio::test]
    async fn test_simple_search() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/_search"))
            .and(query_param("q", "title:rust"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"hits": {"total": {"value": 3}}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let action = SimpleSearch::new(&ConnectorContext::default());
        let mut state = ConversationState::new();
        let inv = with_host(json!({"query": "title:rust", "contextStore": "es"}), &server.uri());
        action.execute(&mut state, inv).await.unwrap();
        assert_eq!(state.context["es"]["hits"]["total"]["value"], 3);
    }

    #[tokio::test]
    async fn test_dsl_search_does_not_touch_the_index() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/faq/_search"))
            .and(body_json(json!({"query": {"match_all": {}}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hits": {"hits": []}})))
            .expect(1)
            .mount(&server)
            .await;

        let action = SearchWithDsl::new(&ConnectorContext::default());
        let mut state = ConversationState::new();
        let inv = with_host(
            json!({"index": "faq", "body": {"query": {"match_all": {}}}, "contextStore": "es"}),
            &server.uri(),
        );
        action.execute(&mut state, inv).await.unwrap();
        assert_eq!(state.context["es"]["hits"]["hits"], json!([]));
    }

    #[tokio::test]
    async fn test_missing_host() {
        let action = SimpleSearch::new(&ConnectorContext::default());
        let mut state = ConversationState::new();
        let inv = Invocation::new(json!({"query": "x", "contextStore": "es"}))
            .with_secret(Secret::new());
        let err = action.execute(&mut state, inv).await.unwrap_err();
        assert_eq!(err.to_string(), "The secret is missing the 'host' field");
    }
}
