pub mod config;
pub mod connectors;
pub mod core;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod registry;
pub mod routes;
pub mod state;
pub mod utils;

// Re-export commonly used items for convenience
pub use config::ConnectorConfig;
pub use connectors::ConnectorContext;
pub use crate::core::{
    Action, BoxedAction, ConversationState, Emission, HttpTransport, Invocation, Secret,
    StorePolicy,
};
pub use errors::{ActionError, ActionResult};
pub use registry::{ActionMetadata, ActionRegistry};
pub use state::AppState;
