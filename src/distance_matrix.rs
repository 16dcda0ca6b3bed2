// Distance Matrix client for traffic-aware commute times.
//
// Endpoint: https://maps.googleapis.com/maps/api/distancematrix/json
//
// Only the traffic-adjusted duration text of the first origin/destination pair
// is consumed by the dashboard. The rest of the response is modelled loosely:
// every field defaults so a malformed payload still deserializes and simply
// has nothing usable in it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};

pub const ELEMENT_OK: &str = "OK";

// ============================================================================
// Request
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Driving,
    Walking,
    Bicycling,
    Transit,
}

impl TravelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
            TravelMode::Walking => "walking",
            TravelMode::Bicycling => "bicycling",
            TravelMode::Transit => "transit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrafficModel {
    #[default]
    BestGuess,
    Pessimistic,
    Optimistic,
}

impl TrafficModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrafficModel::BestGuess => "best_guess",
            TrafficModel::Pessimistic => "pessimistic",
            TrafficModel::Optimistic => "optimistic",
        }
    }
}

/// Departure time sent with every query. Traffic-aware durations are only
/// returned when a departure time is given.
pub const DEPARTURE_NOW: &str = "now";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceMatrixRequest {
    pub origins: Vec<String>,
    pub destinations: Vec<String>,
    pub mode: TravelMode,
    pub traffic_model: TrafficModel,
}

impl DistanceMatrixRequest {
    /// Single pair, leaving now.
    pub fn single(
        origin: impl Into<String>,
        destination: impl Into<String>,
        mode: TravelMode,
        traffic_model: TrafficModel,
    ) -> Self {
        DistanceMatrixRequest {
            origins: vec![origin.into()],
            destinations: vec![destination.into()],
            mode,
            traffic_model,
        }
    }

    /// Single pair, driving, leaving now, best-guess traffic.
    #[cfg(test)]
    pub fn driving_now(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self::single(
            origin,
            destination,
            TravelMode::Driving,
            TrafficModel::BestGuess,
        )
    }

    fn query_pairs(&self, api_key: &str) -> Vec<(&'static str, String)> {
        vec![
            ("origins", self.origins.join("|")),
            ("destinations", self.destinations.join("|")),
            ("mode", self.mode.as_str().to_string()),
            ("departure_time", DEPARTURE_NOW.to_string()),
            ("traffic_model", self.traffic_model.as_str().to_string()),
            ("key", api_key.to_string()),
        ]
    }
}

// ============================================================================
// Response
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextValue {
    pub text: String,
    pub value: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixElement {
    pub status: String,
    pub duration: Option<TextValue>,
    pub duration_in_traffic: Option<TextValue>,
    pub distance: Option<TextValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixRow {
    pub elements: Vec<MatrixElement>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceMatrixResponse {
    pub status: String,
    pub error_message: Option<String>,
    pub origin_addresses: Vec<String>,
    pub destination_addresses: Vec<String>,
    pub rows: Vec<MatrixRow>,
}

impl DistanceMatrixResponse {
    pub fn first_element(&self) -> Option<&MatrixElement> {
        self.rows.first()?.elements.first()
    }

    /// Display text of the traffic-adjusted duration for the first pair, if
    /// that pair came back OK.
    pub fn traffic_duration_text(&self) -> Option<&str> {
        let element = self.first_element()?;
        if element.status != ELEMENT_OK {
            return None;
        }
        let text = element.duration_in_traffic.as_ref()?.text.as_str();
        if text.is_empty() { None } else { Some(text) }
    }
}

// ============================================================================
// Providers
// ============================================================================

#[async_trait]
pub trait DistanceMatrixProvider: Send + Sync {
    async fn query(&self, request: &DistanceMatrixRequest) -> Result<DistanceMatrixResponse>;
}

#[derive(Debug, Clone)]
pub struct GoogleDistanceMatrix {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GoogleDistanceMatrix {
    pub const BASE_URL: &'static str = "https://maps.googleapis.com/maps/api/distancematrix/json";

    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(GoogleDistanceMatrix {
            client,
            api_key: api_key.into(),
            base_url: Self::BASE_URL.to_string(),
        })
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Full request URL with the key replaced, for logs.
    pub fn redacted_url(&self, request: &DistanceMatrixRequest) -> String {
        match reqwest::Url::parse_with_params(&self.base_url, request.query_pairs("REDACTED")) {
            Ok(url) => url.to_string(),
            Err(e) => format!("{} (invalid: {})", self.base_url, e),
        }
    }
}

#[async_trait]
impl DistanceMatrixProvider for GoogleDistanceMatrix {
    async fn query(&self, request: &DistanceMatrixRequest) -> Result<DistanceMatrixResponse> {
        tracing::debug!(url = %self.redacted_url(request), "distance matrix request");

        let response = self
            .client
            .get(&self.base_url)
            .query(&request.query_pairs(&self.api_key))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::ProviderHttp {
                endpoint: "distancematrix",
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await?;
        let parsed: DistanceMatrixResponse = serde_json::from_str(&body)?;

        if parsed.status != ELEMENT_OK {
            return Err(Error::provider_status(
                parsed.status.clone(),
                parsed.error_message.clone().unwrap_or_default(),
            ));
        }

        Ok(parsed)
    }
}
