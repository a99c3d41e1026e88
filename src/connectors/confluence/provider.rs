use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use super::config::{ConfluenceSecret, LexiconArgs, PagesArgs, SearchArgs};
use crate::connectors::ConnectorContext;
use crate::core::{Action, ConversationState, HttpTransport, Invocation};
use crate::errors::{ActionError, ActionResult};
use crate::registry::ActionMetadata;

const CONNECTOR: &str = "confluence";
/// Labels of the knowledge base page templates, not product terms.
const TEMPLATE_LABELS: [&str; 2] = ["kb-how-to-article", "kb-troubleshooting-article"];

#[derive(Debug, Clone)]
pub struct ConfluenceClient {
    transport: HttpTransport,
}

impl ConfluenceClient {
    pub fn new(ctx: &ConnectorContext) -> Self {
        Self {
            transport: ctx.transport.clone(),
        }
    }

    async fn get(
        &self,
        secret: &ConfluenceSecret,
        path: &str,
        query: &[(&str, String)],
    ) -> ActionResult<Value> {
        let request = self
            .transport
            .request(Method::GET, &format!("{}/wiki/rest/api{path}", secret.base_url))
            .basic_auth(&secret.username, Some(&secret.password))
            .header("Accept", "application/json")
            .query(query);
        self.transport.send_json(request).await
    }
}

#[derive(Debug, Deserialize)]
struct ContentPage {
    id: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: Value,
    #[serde(default)]
    metadata: Value,
}

#[derive(Debug, Deserialize)]
struct ContentList {
    #[serde(default)]
    results: Vec<ContentPage>,
}

fn content_list(body: Value) -> ActionResult<ContentList> {
    serde_json::from_value(body)
        .map_err(|e| ActionError::MalformedResponse(format!("Confluence content: {e}")))
}

// =============================================================================
// Pages
// =============================================================================

pub struct GetAllPages {
    client: ConfluenceClient,
}

impl GetAllPages {
    pub fn new(client: ConfluenceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Action for GetAllPages {
    fn metadata(&self) -> ActionMetadata {
        ActionMetadata::new(CONNECTOR, "get_all_pages")
            .with_display_name("Get All Pages")
            .with_description("Pages of a space with their storage-format body")
            .with_aliases(&["getAllPages"])
            .with_secret_fields(&ConfluenceSecret::FIELDS)
    }

    async fn execute(
        &self,
        state: &mut ConversationState,
        invocation: Invocation,
    ) -> ActionResult<()> {
        let secret = ConfluenceSecret::from_invocation(&invocation)?;
        let args: PagesArgs = invocation.args()?;
        let (space, limit) = args.validate()?;
        let policy = invocation.policy()?;
        policy.key()?;

        let mut query = vec![
            ("type", "page".to_string()),
            ("spaceKey", space.to_string()),
            ("start", "0".to_string()),
            ("expand", "body.storage".to_string()),
        ];
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }

        let outcome = match self.client.get(&secret, "/content", &query).await {
            Ok(body) => content_list(body).map(|list| {
                let pages: Vec<Value> = list
                    .results
                    .into_iter()
                    .map(|page| {
                        json!({
                            "id": page.id,
                            "type": page.kind,
                            "status": page.status,
                            "title": page.title,
                            "webLink": format!(
                                "{}/wiki/spaces/{space}/pages/{}",
                                secret.base_url, page.id
                            ),
                            "htmlBody": page
                                .body
                                .pointer("/storage/value")
                                .cloned()
                                .unwrap_or(Value::Null),
                        })
                    })
                    .collect();
                Value::Array(pages)
            }),
            Err(err) => Err(err),
        };
        policy.settle(state, outcome)
    }
}

// =============================================================================
// Search
// =============================================================================

pub struct SearchText {
    client: ConfluenceClient,
}

impl SearchText {
    pub fn new(client: ConfluenceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Action for SearchText {
    fn metadata(&self) -> ActionMetadata {
        ActionMetadata::new(CONNECTOR, "search_text")
            .with_display_name("Search Text")
            .with_description("CQL full-text search over pages")
            .with_aliases(&["searchText"])
            .with_secret_fields(&ConfluenceSecret::FIELDS)
    }

    async fn execute(
        &self,
        state: &mut ConversationState,
        invocation: Invocation,
    ) -> ActionResult<()> {
        let secret = ConfluenceSecret::from_invocation(&invocation)?;
        let args: SearchArgs = invocation.args()?;
        let cql = args.cql()?;
        let policy = invocation.policy()?;
        policy.key()?;

        let mut query = vec![("cql", cql), ("expand", "body.storage".to_string())];
        if let Some(limit) = args.limit() {
            query.push(("limit", limit.to_string()));
        }
        let outcome = self.client.get(&secret, "/content/search", &query).await;
        policy.settle(state, outcome)
    }
}

// =============================================================================
// Lexicon
// =============================================================================

/// Distinct label names of the pages, template labels excluded, in page order.
fn collect_labels(list: &ContentList) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for page in &list.results {
        let names = page
            .metadata
            .pointer("/labels/results")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|label| label.get("name").and_then(Value::as_str));
        for name in names {
            if !TEMPLATE_LABELS.contains(&name) && !labels.iter().any(|l| l == name) {
                labels.push(name.to_string());
            }
        }
    }
    labels
}

pub struct GenerateLexicon {
    client: ConfluenceClient,
}

impl GenerateLexicon {
    pub fn new(client: ConfluenceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Action for GenerateLexicon {
    fn metadata(&self) -> ActionMetadata {
        ActionMetadata::new(CONNECTOR, "generate_lexicon")
            .with_display_name("Generate Lexicon")
            .with_description("Adds the page labels of a space as lexicon keyphrases")
            .with_aliases(&["generateLexicon"])
            .with_secret_fields(&ConfluenceSecret::FIELDS)
    }

    async fn execute(
        &self,
        state: &mut ConversationState,
        invocation: Invocation,
    ) -> ActionResult<()> {
        let secret = ConfluenceSecret::from_invocation(&invocation)?;
        let args: LexiconArgs = invocation.args()?;
        let target = args.validate()?;
        let policy = invocation.policy()?;
        policy.key()?;

        let query = [
            ("spaceKey", target.space.to_string()),
            ("expand", "metadata.labels".to_string()),
        ];
        let labels = match self.client.get(&secret, "/content", &query).await {
            Ok(body) => content_list(body).map(|list| collect_labels(&list)),
            Err(err) => Err(err),
        };

        let outcome = labels.map(|labels| {
            info!(
                lexicon = %target.lexicon_id,
                count = labels.len(),
                "Adding Confluence labels to lexicon"
            );
            for label in &labels {
                state.add_lexicon_keyphrase(
                    target.lexicon_id,
                    label.as_str(),
                    vec![target.tag.to_string()],
                    Vec::new(),
                );
            }
            json!({
                "status": {
                    "message": format!(
                        "Added the following labels with {}-tag to lexicon {}",
                        target.tag, target.lexicon_id
                    ),
                    "results": labels,
                }
            })
        });
        policy.settle(state, outcome)
    }
}
