//! Azure AD sign-in.
//!
//! `start_authentication` asks the webchat to open the Microsoft login popup,
//! `get_authentication_token` exchanges the returned authorization code for tokens. The
//! resulting `access_token` feeds the `microsoft_graph` actions.

mod config;
mod provider;


pub use config::{AzureAdSecret, StartAuthenticationArgs, TokenRequestArgs};
pub use provider::{GetAuthenticationToken, StartAuthentication};

use super::ConnectorContext;
use crate::core::BoxedAction;
use std::sync::Arc;

pub fn actions(ctx: &ConnectorContext) -> Vec<BoxedAction> {
    vec![
        Arc::new(StartAuthentication),
        Arc::new(GetAuthenticationToken::new(ctx)),
    ]
}
