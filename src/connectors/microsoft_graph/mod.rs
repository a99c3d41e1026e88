//! Microsoft Graph connector.
//!
//! Uses a delegated access token obtained through the `azure_ad` connector. All calls go to
//! `https://graph.microsoft.com/v1.0` unless the endpoint is overridden.

mod config;
mod provider;

#[cfg(test)]
mod tests;

pub use config::{GraphArgs, GraphRequest, UserSource};
pub use provider::{GraphAction, GraphClient, GraphOperation};

use super::ConnectorContext;
use crate::core::BoxedAction;
use std::sync::Arc;

pub fn actions(ctx: &ConnectorContext) -> Vec<BoxedAction> {
    let client = GraphClient::new(ctx);
    GraphOperation::ALL
        .iter()
        .map(|op| Arc::new(GraphAction::new(client.clone(), *op)) as BoxedAction)
        .collect()
}
