//! IBM Watson Discovery v1 queries.
//!
//! Every call exchanges the IAM API key for a bearer token first, then runs
//! `GET {url}/v1/environments/{environment}/collections/{collection}/query`.

mod config;
mod provider;


pub use config::{DiscoveryArgs, DiscoveryQuery, WatsonSecret};
pub use provider::{Discovery, DiscoveryClient};

use super::ConnectorContext;
use crate::core::BoxedAction;
use std::sync::Arc;

pub fn actions(ctx: &ConnectorContext) -> Vec<BoxedAction> {
    vec![Arc::new(Discovery::new(DiscoveryClient::new(ctx)))]
}
