//! UiPath Orchestrator connector.
//!
//! Authenticates with a refresh token against the UiPath cloud identity endpoint and calls
//! the Orchestrator OData API of one tenant.
//!
//! # Actions
//!
//! | Id | Legacy name | Call |
//! |----|-------------|------|
//! | `uipath.add_queue_item` | `AddQueueItem` | `POST odata/Queues/UiPathODataSvc.AddQueueItem` |
//! | `uipath.get_queue_item` | `GetQueueItem` | polls `GET odata/QueueItems?$filter=..&$top=1` |
//! | `uipath.get_releases` | `GetReleases` | `GET odata/Releases` |
//! | `uipath.get_jobs` | `GetJobs` | `GET odata/Jobs` |
//! | `uipath.start_job` | `StartJob` | `POST odata/Jobs/UiPath.Server.Configuration.OData.StartJobs` |
//!
//! # Secret
//!
//! ```json
//! {
//!   "client_id": "...",
//!   "refresh_token": "...",
//!   "account_logical_name": "cognigy",
//!   "service_instance_logical_name": "DefaultTenant"
//! }
//! ```
//!
//! Queue lookups poll with the configured budget (15 attempts, one second apart by default)
//! and fail with "maximum polling retries reached!" once it is spent.

mod config;
mod provider;


pub use config::{
    AddQueueItemArgs, GetQueueItemArgs, JobStrategy, QueuePriority, StartJobArgs, UiPathSecret,
};
pub use provider::{AddQueueItem, GetJobs, GetQueueItem, GetReleases, StartJob, UiPathClient};

use super::ConnectorContext;
use crate::core::BoxedAction;
use std::sync::Arc;

pub fn actions(ctx: &ConnectorContext) -> Vec<BoxedAction> {
    let client = UiPathClient::new(ctx);
    vec![
        Arc::new(AddQueueItem::new(client.clone())),
        Arc::new(GetQueueItem::new(client.clone(), ctx.poll)),
        Arc::new(GetReleases::new(client.clone())),
        Arc::new(GetJobs::new(client.clone())),
        Arc::new(StartJob::new(client)),
    ]
}
