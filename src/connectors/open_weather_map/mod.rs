//! OpenWeatherMap current weather.
//!
//! | Action            | Stores                               |
//! |-------------------|--------------------------------------|
//! | `get_all_weather` | the full `/weather` response         |
//! | `get_temperature` | `main.temp` in the requested units   |

mod config;
mod provider;


pub use config::{Units, WeatherArgs, WeatherSecret};
pub use provider::{WeatherAction, WeatherClient, WeatherQuery};

use super::ConnectorContext;
use crate::core::BoxedAction;
use std::sync::Arc;

pub fn actions(ctx: &ConnectorContext) -> Vec<BoxedAction> {
    let client = WeatherClient::new(ctx);
    vec![
        Arc::new(WeatherAction::new(client.clone(), WeatherQuery::AllWeather)),
        Arc::new(WeatherAction::new(client, WeatherQuery::Temperature)),
    ]
}
