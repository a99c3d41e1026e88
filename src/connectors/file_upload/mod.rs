//! File upload prompts for the webchat.
//!
//! Neither action uploads anything. They hand the webchat short-lived credentials (presigned
//! S3 URLs or an Azure container SAS) through a `file-upload` plugin output.

mod config;
mod provider;
mod signing;

#[cfg(test)]
mod tests;

pub use config::{AzureUploadArgs, S3UploadArgs};
pub use provider::{UploadToAwsBucket, UploadToAzureContainer};
pub use signing::ContainerSas;

use super::ConnectorContext;
use crate::core::BoxedAction;
use std::sync::Arc;

pub fn actions(ctx: &ConnectorContext) -> Vec<BoxedAction> {
    vec![
        Arc::new(UploadToAwsBucket),
        Arc::new(UploadToAzureContainer::new(ctx)),
    ]
}
