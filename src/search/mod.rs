//! Search providers - flight and hotel lookup
//!
//! The agent only depends on the two narrow traits below; `SerpApiClient`
//! is the production implementation.

pub mod serpapi;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::{Offer, Result};

pub use serpapi::SerpApiClient;

fn one() -> u32 {
    1
}

/// Criteria for a flight search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightQuery {
    /// Departure airport IATA code
    pub departure_airport: String,
    /// Arrival airport IATA code
    pub arrival_airport: String,
    pub outbound_date: NaiveDate,
    /// Absent for one-way trips
    #[serde(default)]
    pub return_date: Option<NaiveDate>,
    #[serde(default = "one")]
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub infants_in_seat: u32,
    #[serde(default)]
    pub infants_on_lap: u32,
}

impl FlightQuery {
    pub fn is_one_way(&self) -> bool {
        self.return_date.is_none()
    }
}

/// Criteria for a hotel search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelQuery {
    /// Location, e.g. "New York"
    pub q: String,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    /// Provider sort order (3 = lowest price, 8 = highest rating, 13 = most reviewed)
    #[serde(default)]
    pub sort_by: Option<u32>,
    #[serde(default = "one")]
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default = "one")]
    pub rooms: u32,
    /// Comma separated star classes, e.g. "3,4"
    #[serde(default)]
    pub hotel_class: Option<String>,
}

/// Flight search capability
#[async_trait]
pub trait FlightSearch: Send + Sync {
    async fn search_flights(&self, query: &FlightQuery) -> Result<Vec<Offer>>;
}

/// Hotel search capability
#[async_trait]
pub trait HotelSearch: Send + Sync {
    async fn search_hotels(&self, query: &HotelQuery) -> Result<Vec<Offer>>;
}
