//! SerpAPI client for the Google Flights and Google Hotels engines

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::core::config::SearchConfig;
use crate::core::{ItineraError, Offer, Result};
use crate::search::{FlightQuery, FlightSearch, HotelQuery, HotelSearch};

/// SerpAPI search client
#[derive(Clone)]
pub struct SerpApiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    currency: String,
    language: String,
    country: String,
    max_hotel_results: usize,
}

impl SerpApiClient {
    /// Create a client from configuration
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("itinera/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            currency: config.currency.clone(),
            language: config.language.clone(),
            country: config.country.clone(),
            max_hotel_results: config.max_hotel_results,
        })
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ItineraError::search("SERPAPI_API_KEY not set"))
    }

    /// Build the request URL; shared parameters first, engine-specific after
    fn build_url(&self, engine: &str, params: &[(&str, String)]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ItineraError::config(format!("Invalid search base URL: {}", e)))?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("engine", engine)
                .append_pair("api_key", self.api_key()?)
                .append_pair("hl", &self.language)
                .append_pair("gl", &self.country)
                .append_pair("currency", &self.currency);
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    async fn fetch(&self, url: Url) -> Result<Value> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ItineraError::search("search request timed out")
            } else {
                ItineraError::from(e)
            }
        })?;

        let status = response.status();
        let body = response.text().await?;
        debug!(status = %status, len = body.len(), "serpapi response");

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| ItineraError::search(format!("invalid response ({}): {}", status, e)))?;

        // SerpAPI reports most failures as {"error": "..."}
        if let Some(error) = value.get("error").and_then(|e| e.as_str()) {
            return Err(ItineraError::search(error.to_string()));
        }
        if !status.is_success() {
            return Err(ItineraError::search(format!("status {}", status.as_u16())));
        }

        Ok(value)
    }
}

fn flight_params(query: &FlightQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("departure_id", query.departure_airport.to_uppercase()),
        ("arrival_id", query.arrival_airport.to_uppercase()),
        ("outbound_date", query.outbound_date.format("%Y-%m-%d").to_string()),
        // 1 = round trip, 2 = one way
        ("type", if query.is_one_way() { "2" } else { "1" }.to_string()),
        ("adults", query.adults.to_string()),
        ("children", query.children.to_string()),
        ("infants_in_seat", query.infants_in_seat.to_string()),
        ("infants_on_lap", query.infants_on_lap.to_string()),
    ];
    if let Some(date) = query.return_date {
        params.push(("return_date", date.format("%Y-%m-%d").to_string()));
    }
    params
}

fn hotel_params(query: &HotelQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("q", query.q.clone()),
        ("check_in_date", query.check_in_date.format("%Y-%m-%d").to_string()),
        ("check_out_date", query.check_out_date.format("%Y-%m-%d").to_string()),
        ("adults", query.adults.to_string()),
        ("children", query.children.to_string()),
        ("rooms", query.rooms.to_string()),
        ("sort_by", query.sort_by.unwrap_or(8).to_string()),
    ];
    if let Some(ref class) = query.hotel_class {
        params.push(("hotel_class", class.clone()));
    }
    params
}

fn str_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(|v| v.as_str())
}

fn format_minutes(minutes: u64) -> String {
    format!("{}h {:02}m", minutes / 60, minutes % 60)
}

/// Normalize a Google Flights response
pub fn parse_flights(body: &Value, currency: &str) -> Vec<Offer> {
    let link = str_at(body, "/search_metadata/google_flights_url").map(str::to_string);

    let groups = ["best_flights", "other_flights"]
        .iter()
        .filter_map(|key| body.get(*key).and_then(|v| v.as_array()))
        .find(|list| !list.is_empty());

    let Some(groups) = groups else {
        return Vec::new();
    };

    groups
        .iter()
        .filter_map(|group| {
            let price = group.get("price").and_then(|p| p.as_f64())?;
            let legs = group.get("flights").and_then(|f| f.as_array())?;
            let first = legs.first()?;
            let last = legs.last()?;

            let mut airlines: Vec<&str> = legs
                .iter()
                .filter_map(|leg| leg.get("airline").and_then(|a| a.as_str()))
                .collect();
            airlines.dedup();

            let stops = match legs.len() - 1 {
                0 => "nonstop".to_string(),
                1 => "1 stop".to_string(),
                n => format!("{} stops", n),
            };

            let mut description = format!(
                "{} {} → {} {}, {}",
                str_at(first, "/departure_airport/id").unwrap_or("?"),
                str_at(first, "/departure_airport/time").unwrap_or(""),
                str_at(last, "/arrival_airport/id").unwrap_or("?"),
                str_at(last, "/arrival_airport/time").unwrap_or(""),
                stops,
            );
            if let Some(minutes) = group.get("total_duration").and_then(|d| d.as_u64()) {
                description.push_str(&format!(", {}", format_minutes(minutes)));
            }

            Some(Offer {
                provider: airlines.join(" / "),
                price,
                currency: currency.to_string(),
                description,
                link: link.clone(),
                logo: group
                    .get("airline_logo")
                    .or_else(|| first.get("airline_logo"))
                    .and_then(|l| l.as_str())
                    .map(str::to_string),
            })
        })
        .collect()
}

/// Normalize a Google Hotels response, keeping at most `limit` properties
pub fn parse_hotels(body: &Value, currency: &str, limit: usize) -> Vec<Offer> {
    let Some(properties) = body.get("properties").and_then(|p| p.as_array()) else {
        return Vec::new();
    };

    properties
        .iter()
        .filter_map(|property| {
            let name = property.get("name").and_then(|n| n.as_str())?;
            let price = property
                .pointer("/rate_per_night/extracted_lowest")
                .and_then(|p| p.as_f64())?;

            let mut details = Vec::new();
            if let Some(class) = property.get("extracted_hotel_class").and_then(|c| c.as_u64()) {
                details.push(format!("{}-star", class));
            }
            if let Some(rating) = property.get("overall_rating").and_then(|r| r.as_f64()) {
                match property.get("reviews").and_then(|r| r.as_u64()) {
                    Some(reviews) => details.push(format!("rated {} ({} reviews)", rating, reviews)),
                    None => details.push(format!("rated {}", rating)),
                }
            }
            details.push(format!("{} per night", price));
            if let Some(total) = property
                .pointer("/total_rate/extracted_lowest")
                .and_then(|t| t.as_f64())
            {
                details.push(format!("total {}", total));
            }

            Some(Offer {
                provider: name.to_string(),
                price,
                currency: currency.to_string(),
                description: details.join(", "),
                link: property
                    .get("link")
                    .and_then(|l| l.as_str())
                    .map(str::to_string),
                logo: property
                    .get("logo")
                    .and_then(|l| l.as_str())
                    .or_else(|| str_at(property, "/images/0/thumbnail"))
                    .map(str::to_string),
            })
        })
        .take(limit)
        .collect()
}

#[async_trait]
impl FlightSearch for SerpApiClient {
    async fn search_flights(&self, query: &FlightQuery) -> Result<Vec<Offer>> {
        let url = self.build_url("google_flights", &flight_params(query))?;
        let body = self.fetch(url).await?;
        Ok(parse_flights(&body, &self.currency))
    }
}

#[async_trait]
impl HotelSearch for SerpApiClient {
    async fn search_hotels(&self, query: &HotelQuery) -> Result<Vec<Offer>> {
        let url = self.build_url("google_hotels", &hotel_params(query))?;
        let body = self.fetch(url).await?;
        Ok(parse_hotels(&body, &self.currency, self.max_hotel_results))
    }
}
