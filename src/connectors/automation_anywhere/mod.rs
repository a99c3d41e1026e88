//! Automation Anywhere Control Room connector.
//!
//! Every action authenticates with `POST {url}/v1/authentication` and passes the returned
//! token in the `X-Authorization` header of a single Control Room call.

mod config;
mod provider;


pub use config::{AutomationAnywhereSecret, DeployAutomationArgs};
pub use provider::{ControlRoomClient, DeployAutomation, ListAction, ListKind};

use super::ConnectorContext;
use crate::core::BoxedAction;
use std::sync::Arc;

pub fn actions(ctx: &ConnectorContext) -> Vec<BoxedAction> {
    let client = ControlRoomClient::new(ctx);
    vec![
        Arc::new(DeployAutomation::new(client.clone())),
        Arc::new(ListAction::new(client.clone(), ListKind::Automations)),
        Arc::new(ListAction::new(client.clone(), ListKind::BotExecutions)),
        Arc::new(ListAction::new(client, ListKind::Devices)),
    ]
}
