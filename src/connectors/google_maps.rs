//! Google Maps webchat plugin.
//!
//! Emits a `google-maps` plugin directive. A search query is geocoded first; without one, or
//! when geocoding finds nothing, the given coordinates (or the defaults) are used.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::ConnectorContext;
use crate::core::{Action, BoxedAction, ConversationState, HttpTransport, Invocation, non_empty};
use crate::errors::ActionResult;
use crate::registry::ActionMetadata;

pub const DEFAULT_LATITUDE: f64 = 51.2141562;
pub const DEFAULT_LONGITUDE: f64 = 6.7488952;
pub const DEFAULT_ZOOM: f64 = 10.0;

pub fn actions(ctx: &ConnectorContext) -> Vec<BoxedAction> {
    vec![Arc::new(ShowGoogleMaps::new(ctx))]
}

/// Numbers arrive either as JSON numbers or as strings from script fields.
fn number(value: &Option<Value>) -> Option<f64> {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapArgs {
    #[serde(alias = "searchquery")]
    pub search_query: Option<String>,
    #[serde(alias = "latitude")]
    pub center_lat: Option<Value>,
    #[serde(alias = "longitude")]
    pub center_lng: Option<Value>,
    pub zoom: Option<Value>,
}

impl MapArgs {
    pub fn center(&self) -> (f64, f64) {
        (
            number(&self.center_lat).unwrap_or(DEFAULT_LATITUDE),
            number(&self.center_lng).unwrap_or(DEFAULT_LONGITUDE),
        )
    }

    pub fn zoom(&self) -> f64 {
        number(&self.zoom).unwrap_or(DEFAULT_ZOOM)
    }
}

pub struct ShowGoogleMaps {
    transport: HttpTransport,
    base_url: String,
}

impl ShowGoogleMaps {
    pub fn new(ctx: &ConnectorContext) -> Self {
        Self {
            transport: ctx.transport.clone(),
            base_url: ctx.endpoints.google_maps_url.trim_end_matches('/').to_string(),
        }
    }

    /// Location of the first geocoding result, if any.
    async fn geocode(&self, api_key: &str, address: &str) -> ActionResult<Option<(f64, f64)>> {
        let request = self
            .transport
            .request(Method::GET, &format!("{}/geocode/json", self.base_url))
            .query(&[("key", api_key), ("address", address)]);
        let body = self.transport.send_json(request).await?;
        let location = body.pointer("/results/0/geometry/location");
        Ok(location.and_then(|loc| {
            Some((loc.get("lat")?.as_f64()?, loc.get("lng")?.as_f64()?))
        }))
    }
}

#[async_trait]
impl Action for ShowGoogleMaps {
    fn metadata(&self) -> ActionMetadata {
        ActionMetadata::new("google_maps", "show_google_maps")
            .with_display_name("Show Google Maps")
            .with_description("Shows a map centered on an address or coordinates")
            .with_aliases(&["showGoogleMaps"])
            .with_secret_fields(&["api_key"])
            .output_only()
    }

    async fn execute(
        &self,
        state: &mut ConversationState,
        invocation: Invocation,
    ) -> ActionResult<()> {
        let api_key = invocation
            .secret("Secret not defined.")?
            .require("api_key")?
            .to_string();
        let args: MapArgs = invocation.args()?;
        let policy = invocation.policy()?;

        let (mut lat, mut lng) = args.center();
        if let Some(address) = non_empty(&args.search_query) {
            match self.geocode(&api_key, address).await {
                Ok(Some(location)) => (lat, lng) = location,
                Ok(None) => debug!(address = %address, "No geocoding result, keeping center"),
                Err(err) if policy.stop_on_error => return Err(err),
                Err(err) => warn!(error = %err, "Geocoding failed, keeping center"),
            }
        }

        state.output(
            Some(String::new()),
            json!({
                "_plugin": {
                    "type": "google-maps",
                    "center": {"lat": lat, "lng": lng},
                    "zoom": args.zoom(),
                    "bootstrapURLKeys": api_key,
                }
            }),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::test_support::context_for;
    use crate::core::Secret;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn invocation(args: Value) -> Invocation {
        Invocation::new(args).with_secret(Secret::new().with("api_key", "maps-key"))
    }

    #[test]
    fn test_number_parsing() {
        let args: MapArgs = serde_json::from_value(json!({
            "latitude": "48.1",
            "longitude": 11.5,
            "zoom": "not a number"
        }))
        .unwrap();
        assert_eq!(args.center(), (48.1, 11.5));
        assert_eq!(args.zoom(), DEFAULT_ZOOM);
    }

    #[tokio::test]
    async fn test_defaults_without_query() {
        let action = ShowGoogleMaps::new(&context_for("http://127.0.0.1:9"));
        let mut state = ConversationState::new();
        action.execute(&mut state, invocation(json!({}))).await.unwrap();

        let plugin = &state.outputs().next().unwrap()["_plugin"];
        assert_eq!(plugin["type"], "google-maps");
        assert_eq!(plugin["center"]["lat"], DEFAULT_LATITUDE);
        assert_eq!(plugin["zoom"], DEFAULT_ZOOM);
        assert_eq!(plugin["bootstrapURLKeys"], "maps-key");
    }

    #[tokio::test]
    async fn test_geocoded_center() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/maps/api/geocode/json"))
            .and(query_param("address", "Speditionstraße 1, Düsseldorf"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"geometry": {"location": {"lat": 51.2139586, "lng": 6.7489951}}}],
                "status": "OK"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let action = ShowGoogleMaps::new(&context_for(&server.uri()));
        let mut state = ConversationState::new();
        let inv = invocation(json!({"searchQuery": "Speditionstraße 1, Düsseldorf", "zoom": 15}));
        action.execute(&mut state, inv).await.unwrap();

        let plugin = &state.outputs().next().unwrap()["_plugin"];
        assert_eq!(plugin["center"], json!({"lat": 51.2139586, "lng": 6.7489951}));
        assert_eq!(plugin["zoom"], 15.0);
    }

    #[tokio::test]
    async fn test_geocoding_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let action = ShowGoogleMaps::new(&context_for(&server.uri()));

        let mut state = ConversationState::new();
        action
            .execute(&mut state, invocation(json!({"searchQuery": "Nowhere"})))
            .await
            .unwrap();
        assert_eq!(
            state.outputs().next().unwrap()["_plugin"]["center"]["lng"],
            DEFAULT_LONGITUDE
        );

        let mut state = ConversationState::new();
        let inv = invocation(json!({"searchQuery": "Nowhere", "stopOnError": true}));
        assert!(action.execute(&mut state, inv).await.is_err());
        assert!(state.emissions.is_empty());
    }
}
