//! Built-in connectors.
//!
//! Each connector lives in its own module with the same layout: `config.rs` holds the typed
//! arguments and secret, `provider.rs` the actions, `tests.rs` the unit tests.

pub mod automation_anywhere;
pub mod aws_polly;
pub mod azure_ad;
pub mod confluence;
pub mod detect_language;
pub mod elasticsearch;
pub mod file_upload;
pub mod google_maps;
pub mod kofax;
pub mod mail;
pub mod microsoft_graph;
pub mod ms_flow;
pub mod news;
pub mod open_weather_map;
pub mod sharepoint;
pub mod tvmaze;
pub mod twilio;
pub mod uipath;
pub mod watson_discovery;
pub mod webchat;
pub mod zipcode;

use std::sync::Arc;

use crate::config::{ConnectorConfig, Endpoints};
use crate::core::{BoxedAction, HttpTransport, PollPolicy};
use zipcode::ZipcodeDirectory;

/// Shared resources handed to every connector when it is registered.
#[derive(Debug, Clone)]
pub struct ConnectorContext {
    pub transport: HttpTransport,
    pub endpoints: Endpoints,
    pub poll: PollPolicy,
    pub zipcodes: Arc<ZipcodeDirectory>,
}

impl Default for ConnectorContext {
    fn default() -> Self {
        Self {
            transport: HttpTransport::default(),
            endpoints: Endpoints::default(),
            poll: PollPolicy::default(),
            zipcodes: ZipcodeDirectory::embedded(),
        }
    }
}

impl ConnectorContext {
    /// Fails only when a configured dataset file cannot be loaded.
    pub fn from_config(config: &ConnectorConfig) -> Result<Self, String> {
        let zipcodes = match &config.zipcode_dataset {
            Some(path) => Arc::new(ZipcodeDirectory::from_file(path)?),
            None => ZipcodeDirectory::embedded(),
        };
        Ok(Self {
            transport: config.transport(),
            endpoints: config.endpoints.clone(),
            poll: config.poll_policy(),
            zipcodes,
        })
    }
}

/// Every built-in action.
pub fn builtin_actions(ctx: &ConnectorContext) -> Vec<BoxedAction> {
    let mut actions = Vec::new();
    actions.extend(automation_anywhere::actions(ctx));
    actions.extend(aws_polly::actions(ctx));
    actions.extend(azure_ad::actions(ctx));
    actions.extend(confluence::actions(ctx));
    actions.extend(detect_language::actions(ctx));
    actions.extend(elasticsearch::actions(ctx));
    actions.extend(file_upload::actions(ctx));
    actions.extend(google_maps::actions(ctx));
    actions.extend(kofax::actions(ctx));
    actions.extend(mail::actions(ctx));
    actions.extend(microsoft_graph::actions(ctx));
    actions.extend(ms_flow::actions(ctx));
    actions.extend(news::actions(ctx));
    actions.extend(open_weather_map::actions(ctx));
    actions.extend(sharepoint::actions(ctx));
    actions.extend(tvmaze::actions(ctx));
    actions.extend(twilio::actions(ctx));
    actions.extend(uipath::actions(ctx));
    actions.extend(watson_discovery::actions(ctx));
    actions.extend(webchat::actions(ctx));
    actions.extend(zipcode::actions(ctx));
    actions
}
