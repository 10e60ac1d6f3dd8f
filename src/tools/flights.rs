//! Flight search tool
//!
//! Wraps a `FlightSearch` client behind the `flights_finder` tool.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::core::ToolPayload;
use crate::search::{FlightQuery, FlightSearch};
use crate::tools::registry::{ToolError, ToolHandler, ToolSpec};
use crate::tools::schema::{ArgSchema, ParamType};

pub const FLIGHTS_TOOL: &str = "flights_finder";

/// Tool for finding flights
pub struct FlightsFinder {
    client: Arc<dyn FlightSearch>,
}

impl FlightsFinder {
    pub fn new(client: Arc<dyn FlightSearch>) -> Self {
        Self { client }
    }

    /// Argument schema
    pub fn schema() -> ArgSchema {
        ArgSchema::new()
            .required(
                "departure_airport",
                ParamType::String,
                "Departure airport code (IATA)",
            )
            .required(
                "arrival_airport",
                ParamType::String,
                "Arrival airport code (IATA)",
            )
            .required("outbound_date", ParamType::Date, "Outbound date (YYYY-MM-DD)")
            .optional(
                "return_date",
                ParamType::Date,
                "Return date (YYYY-MM-DD); omit for one-way trips",
            )
            .optional("adults", ParamType::Integer, "Number of adults (default 1)")
            .optional("children", ParamType::Integer, "Number of children (default 0)")
            .optional(
                "infants_in_seat",
                ParamType::Integer,
                "Number of infants in seat (default 0)",
            )
            .optional(
                "infants_on_lap",
                ParamType::Integer,
                "Number of infants on lap (default 0)",
            )
    }

    /// Registry entry for this tool
    pub fn spec(client: Arc<dyn FlightSearch>) -> ToolSpec {
        ToolSpec::new(
            FLIGHTS_TOOL,
            "Find flights using the Google Flights engine. Returns offers with price, airline and booking link.",
            Self::schema(),
            Arc::new(Self::new(client)),
        )
    }
}

#[async_trait]
impl ToolHandler for FlightsFinder {
    async fn call(&self, args: Value) -> Result<ToolPayload, ToolError> {
        let query: FlightQuery = serde_json::from_value(args)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        if let Some(return_date) = query.return_date {
            if return_date < query.outbound_date {
                return Err(ToolError::InvalidArguments(
                    "return_date is before outbound_date".to_string(),
                ));
            }
        }
        if query.adults == 0 {
            return Err(ToolError::InvalidArguments(
                "at least one adult is required".to_string(),
            ));
        }

        let offers = self
            .client
            .search_flights(&query)
            .await
            .map_err(|e| ToolError::Execution(e.to_string()))?;

        Ok(ToolPayload::Flights(offers))
    }
}
