//! Shared application state for the HTTP server.

use std::sync::Arc;

use crate::config::ConnectorConfig;
use crate::connectors::ConnectorContext;
use crate::registry::ActionRegistry;

pub struct AppState {
    pub config: ConnectorConfig,
    pub registry: Arc<ActionRegistry>,
}

impl AppState {
    /// Builds the registry from the configured endpoints, timeouts and datasets.
    pub fn new(config: ConnectorConfig) -> Result<Arc<Self>, String> {
        let ctx = ConnectorContext::from_config(&config)?;
        let registry = Arc::new(ActionRegistry::with_builtin(&ctx));
        Ok(Arc::new(Self { config, registry }))
    }

    pub fn with_registry(config: ConnectorConfig, registry: Arc<ActionRegistry>) -> Arc<Self> {
        Arc::new(Self { config, registry })
    }
}
