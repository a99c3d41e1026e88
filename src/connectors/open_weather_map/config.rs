use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::core::{Invocation, require_str};
use crate::errors::{ActionError, ActionResult};

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct WeatherSecret {
    pub api_key: String,
}

impl WeatherSecret {
    pub fn from_invocation(invocation: &Invocation) -> ActionResult<Self> {
        let secret = invocation.secret("No secret defined")?;
        let api_key = secret
            .get("api_key")
            .ok_or_else(|| ActionError::config("The secret is missing the 'api_key' field."))?;
        Ok(Self {
            api_key: api_key.to_string(),
        })
    }
}

impl fmt::Debug for WeatherSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WeatherSecret { .. }")
    }
}

/// Unit system of the returned measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Units {
    Metric,
    Imperial,
    /// Kelvin, the API default
    Internal,
}

impl Units {
    pub fn as_query(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
            Units::Internal => "standard",
        }
    }
}

impl FromStr for Units {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            "internal" | "standard" => Ok(Units::Internal),
            other => Err(ActionError::config(format!(
                "Unknown units '{other}'. Use metric, imperial or internal."
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeatherArgs {
    pub city: Option<String>,
    pub language: Option<String>,
    pub units: Option<String>,
}

/// Validated lookup parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherRequest {
    pub city: String,
    pub language: String,
    pub units: Units,
}

impl WeatherArgs {
    pub fn validate(&self) -> ActionResult<WeatherRequest> {
        let language = require_str(&self.language, "No language is defined.")?;
        let city = require_str(&self.city, "No city is defined.")?;
        let units = require_str(&self.units, "No units defined.")?.parse()?;
        Ok(WeatherRequest {
            city: city.to_string(),
            language: language.to_string(),
            units,
        })
    }
}
