//! Email over SMTP with an optional attachment downloaded from a URL.
//!
//! Delivery goes through the [`MailDelivery`] trait. [`SmtpDelivery`] speaks SMTP with
//! `lettre`; tests substitute a recording implementation.

mod config;
mod delivery;
mod provider;


pub use config::{MailArgs, SmtpSettings, validate_email};
pub use delivery::{MailDelivery, SmtpDelivery};
pub use provider::SendEmailWithAttachment;

use super::ConnectorContext;
use crate::core::BoxedAction;
use std::sync::Arc;

pub fn actions(ctx: &ConnectorContext) -> Vec<BoxedAction> {
    vec![Arc::new(SendEmailWithAttachment::new(
        ctx,
        Arc::new(SmtpDelivery),
    ))]
}
