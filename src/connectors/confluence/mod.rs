//! Confluence Cloud knowledge base.
//!
//! Pages are read with basic auth (`username` + API token as `password`) from
//! `{baseUrl}/wiki/rest/api`. `generate_lexicon` turns the page labels of a space into
//! lexicon keyphrases.

mod config;
mod provider;


pub use config::{ConfluenceSecret, LexiconArgs, PagesArgs, SearchArgs};
pub use provider::{ConfluenceClient, GenerateLexicon, GetAllPages, SearchText};

use super::ConnectorContext;
use crate::core::BoxedAction;
use std::sync::Arc;

pub fn actions(ctx: &ConnectorContext) -> Vec<BoxedAction> {
    let client = ConfluenceClient::new(ctx);
    vec![
        Arc::new(GetAllPages::new(client.clone())),
        Arc::new(SearchText::new(client.clone())),
        Arc::new(GenerateLexicon::new(client)),
    ]
}
