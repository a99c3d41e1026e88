use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use super::config::{WeatherArgs, WeatherRequest, WeatherSecret};
use crate::connectors::ConnectorContext;
use crate::core::{Action, ConversationState, HttpTransport, Invocation};
use crate::errors::{ActionError, ActionResult};
use crate::registry::ActionMetadata;

#[derive(Debug, Clone)]
pub struct WeatherClient {
    transport: HttpTransport,
    base_url: String,
}

impl WeatherClient {
    pub fn new(ctx: &ConnectorContext) -> Self {
        Self {
            transport: ctx.transport.clone(),
            base_url: ctx
                .endpoints
                .openweathermap_url
                .trim_end_matches('/')
                .to_string(),
        }
    }

    /// `GET /weather` for one city.
    pub async fn current(
        &self,
        secret: &WeatherSecret,
        request: &WeatherRequest,
    ) -> ActionResult<Value> {
        debug!(city = %request.city, units = request.units.as_query(), "Fetching weather");
        let http = self
            .transport
            .request(Method::GET, &format!("{}/weather", self.base_url))
            .query(&[
                ("q", request.city.as_str()),
                ("lang", request.language.as_str()),
                ("units", request.units.as_query()),
                ("appid", secret.api_key.as_str()),
            ]);
        self.transport.send_json(http).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherQuery {
    AllWeather,
    Temperature,
}

impl WeatherQuery {
    fn project(&self, response: Value) -> ActionResult<Value> {
        match self {
            WeatherQuery::AllWeather => Ok(response),
            WeatherQuery::Temperature => response
                .pointer("/main/temp")
                .cloned()
                .ok_or_else(|| {
                    ActionError::MalformedResponse("weather response without main.temp".into())
                }),
        }
    }
}

pub struct WeatherAction {
    client: WeatherClient,
    query: WeatherQuery,
}

impl WeatherAction {
    pub fn new(client: WeatherClient, query: WeatherQuery) -> Self {
        Self { client, query }
    }
}

#[async_trait]
impl Action for WeatherAction {
    fn metadata(&self) -> ActionMetadata {
        let meta = match self.query {
            WeatherQuery::AllWeather => ActionMetadata::new("open_weather_map", "get_all_weather")
                .with_display_name("Get All Weather")
                .with_description("Current weather of a city")
                .with_aliases(&["getAllWeather"]),
            WeatherQuery::Temperature => {
                ActionMetadata::new("open_weather_map", "get_temperature")
                    .with_display_name("Get Temperature")
                    .with_description("Current temperature of a city")
                    .with_aliases(&["getTemperature"])
            }
        };
        meta.with_secret_fields(&["api_key"])
    }

    async fn execute(
        &self,
        state: &mut ConversationState,
        invocation: Invocation,
    ) -> ActionResult<()> {
        let secret = WeatherSecret::from_invocation(&invocation)?;
        let request = invocation.args::<WeatherArgs>()?.validate()?;
        let policy = invocation.policy()?;
        policy.key()?;

        let outcome = match self.client.current(&secret, &request).await {
            Ok(response) => self.query.project(response),
            Err(err) => Err(err),
        };
        policy.settle(state, outcome)
    }
}
