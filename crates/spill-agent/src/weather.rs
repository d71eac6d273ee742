//! The weather lookup tool.

use crate::error::AgentError;
use crate::tool::{Tool, ToolContext};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

/// Canned answer returned for every location.
pub const WEATHER_REPORT: &str = "sunny with a temperature of 70 degrees.";

const DESCRIPTION: &str = "Called when the user asks for weather related information. \
Ensure the user's location (city or region) is provided. \
When given a location, please estimate the latitude and longitude of the location and \
do not ask the user for them.";

#[derive(Debug, Deserialize)]
struct LookupWeatherArgs {
    location: String,
    latitude: String,
    longitude: String,
}

/// Informational tool with no side effects: reports the same weather
/// everywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct LookupWeather;

#[async_trait]
impl Tool for LookupWeather {
    fn name(&self) -> &str {
        "lookup_weather"
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "The location they are asking for"
                },
                "latitude": {
                    "type": "string",
                    "description": "The latitude of the location, do not ask user for it"
                },
                "longitude": {
                    "type": "string",
                    "description": "The longitude of the location, do not ask user for it"
                }
            },
            "required": ["location", "latitude", "longitude"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<Value, AgentError> {
        let args: LookupWeatherArgs =
            serde_json::from_value(args).map_err(|e| AgentError::InvalidToolArguments {
                tool: self.name().to_string(),
                message: e.to_string(),
            })?;

        tracing::info!(
            room = %ctx.room,
            latitude = %args.latitude,
            longitude = %args.longitude,
            "Looking up weather for {}",
            args.location
        );

        Ok(Value::String(WEATHER_REPORT.to_string()))
    }
}
