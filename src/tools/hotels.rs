//! Hotel search tool

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::core::ToolPayload;
use crate::search::{HotelQuery, HotelSearch};
use crate::tools::registry::{ToolError, ToolHandler, ToolSpec};
use crate::tools::schema::{ArgSchema, ParamType};

pub const HOTELS_TOOL: &str = "hotels_finder";

/// Tool for finding hotels
pub struct HotelsFinder {
    client: Arc<dyn HotelSearch>,
}

impl HotelsFinder {
    pub fn new(client: Arc<dyn HotelSearch>) -> Self {
        Self { client }
    }

    pub fn schema() -> ArgSchema {
        ArgSchema::new()
            .required(
                "q",
                ParamType::String,
                "Location for hotels (e.g., \"New York\")",
            )
            .required("check_in_date", ParamType::Date, "Check-in date (YYYY-MM-DD)")
            .required("check_out_date", ParamType::Date, "Check-out date (YYYY-MM-DD)")
            .optional(
                "sort_by",
                ParamType::Integer,
                "Sorting: 3 = lowest price, 8 = highest rating (default), 13 = most reviewed",
            )
            .optional("adults", ParamType::Integer, "Number of adults (default 1)")
            .optional("children", ParamType::Integer, "Number of children (default 0)")
            .optional("rooms", ParamType::Integer, "Number of rooms (default 1)")
            .optional(
                "hotel_class",
                ParamType::String,
                "Filter by hotel class (e.g., \"3\" or \"4,5\")",
            )
    }

    pub fn spec(client: Arc<dyn HotelSearch>) -> ToolSpec {
        ToolSpec::new(
            HOTELS_TOOL,
            "Find hotels using the Google Hotels engine. Returns properties with nightly rate, rating and link.",
            Self::schema(),
            Arc::new(Self::new(client)),
        )
    }
}

#[async_trait]
impl ToolHandler for HotelsFinder {
    async fn call(&self, args: Value) -> Result<ToolPayload, ToolError> {
        let query: HotelQuery = serde_json::from_value(args)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        if query.check_out_date <= query.check_in_date {
            return Err(ToolError::InvalidArguments(
                "check_out_date must be after check_in_date".to_string(),
            ));
        }
        if query.q.trim().is_empty() {
            return Err(ToolError::InvalidArguments("q must not be empty".to_string()));
        }

        let offers = self
            .client
            .search_hotels(&query)
            .await
            .map_err(|e| ToolError::Execution(e.to_string()))?;

        Ok(ToolPayload::Hotels(offers))
    }
}
