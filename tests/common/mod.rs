//! Helpers shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use flow_connectors::config::{ConnectorConfig, Endpoints};
use flow_connectors::core::{HttpTransport, PollPolicy};
use flow_connectors::{ActionRegistry, AppState, ConnectorContext};

/// Every endpoint pointed at one mock server, with a fast 15-probe poll.
pub fn context_for(base: &str) -> ConnectorContext {
    let base = base.trim_end_matches('/');
    ConnectorContext {
        transport: HttpTransport::new(Duration::from_secs(5)),
        endpoints: Endpoints {
            uipath_auth_url: format!("{base}/oauth/token"),
            uipath_orchestrator_url: base.to_string(),
            microsoft_graph_url: format!("{base}/v1.0"),
            microsoft_token_url: format!("{base}/common/oauth2/v2.0/token"),
            twilio_url: base.to_string(),
            tvmaze_url: base.to_string(),
            openweathermap_url: format!("{base}/data/2.5"),
            newsapi_url: format!("{base}/v2"),
            ibm_iam_url: format!("{base}/identity/token"),
            google_maps_url: format!("{base}/maps/api"),
            azure_blob_url: format!("{base}/{{account}}"),
        },
        poll: PollPolicy::new(15, Duration::from_millis(1)),
        ..ConnectorContext::default()
    }
}

pub fn registry_for(base: &str) -> ActionRegistry {
    ActionRegistry::with_builtin(&context_for(base))
}

/// Server state whose registry talks to `base`.
pub fn app_state_for(base: &str, api_secret: Option<&str>) -> Arc<AppState> {
    let mut config = ConnectorConfig::default();
    config.api_secret = api_secret.map(str::to_string);
    AppState::with_registry(config, Arc::new(registry_for(base)))
}
