// Transit provider client.
//
// Endpoints consumed (JSON:API documents with a top-level `data` array):
// - Routes:   GET {base}/routes?filter[type]=<route type>
// - Stops:    GET {base}/stops?filter[route]=<route id>
// - Vehicles: GET {base}/vehicles?filter[route]=<route id>

use reqwest::Client;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

use crate::error::{ProviderError, Result};
use crate::models::{GeoPoint, Route, Stop, TransitMode, VehiclePosition};

/// Source of routes, stops and vehicle positions.
pub trait TransitProvider: Clone + Send + Sync + 'static {
    fn routes(&self, mode: TransitMode) -> impl Future<Output = Result<Vec<Route>>> + Send;
    fn stops(&self, route_id: &str) -> impl Future<Output = Result<Vec<Stop>>> + Send;
    fn vehicles(
        &self,
        route_id: &str,
    ) -> impl Future<Output = Result<Vec<VehiclePosition>>> + Send;
}

// ============================================================================
// HTTP Client
// ============================================================================

#[derive(Debug, Clone)]
pub struct TransitApiClient {
    client: Client,
    base_url: String,
}

impl TransitApiClient {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ProviderError::Fetch(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    async fn get_document(&self, path: &str, filter: (&str, &str)) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .query(&[filter])
            .send()
            .await
            .map_err(|e| ProviderError::Fetch(format!("Failed to fetch {}: {}", path, e)))?;

        if !response.status().is_success() {
            return Err(ProviderError::Fetch(format!(
                "API returned error for {}: {}",
                path,
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Fetch(format!("Failed to read {} response: {}", path, e)))?;

        serde_json::from_str(&body)
            .map_err(|e| ProviderError::MalformedData(format!("Invalid JSON response: {}", e)))
    }
}

impl TransitProvider for TransitApiClient {
    async fn routes(&self, mode: TransitMode) -> Result<Vec<Route>> {
        let route_type = mode.route_type().to_string();
        let document = self
            .get_document("routes", ("filter[type]", route_type.as_str()))
            .await?;
        parse_routes(&document)
    }

    async fn stops(&self, route_id: &str) -> Result<Vec<Stop>> {
        let document = self.get_document("stops", ("filter[route]", route_id)).await?;
        parse_located(&document, |id, location| Stop { id, location })
    }

    async fn vehicles(&self, route_id: &str) -> Result<Vec<VehiclePosition>> {
        let document = self.get_document("vehicles", ("filter[route]", route_id)).await?;
        parse_located(&document, |id, location| VehiclePosition { id, location })
    }
}

// ============================================================================
// Document Parsing
// ============================================================================

fn data_entries(document: &Value) -> Result<&Vec<Value>> {
    document["data"]
        .as_array()
        .ok_or_else(|| ProviderError::MalformedData("Missing data array".to_string()))
}

fn entry_id(entry: &Value) -> Result<String> {
    entry["id"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| ProviderError::MalformedData("Entry without id".to_string()))
}

pub fn parse_routes(document: &Value) -> Result<Vec<Route>> {
    data_entries(document)?
        .iter()
        .map(|entry| {
            let id = entry_id(entry)?;
            let attributes = &entry["attributes"];
            let display_name = ["long_name", "short_name"]
                .iter()
                .filter_map(|key| attributes[*key].as_str())
                .find(|name| !name.is_empty())
                .map(String::from)
                .unwrap_or_else(|| id.clone());

            Ok(Route { id, display_name })
        })
        .collect()
}

/// Parses stop or vehicle entries. Entries without usable coordinates are
/// skipped; the provider reports vehicles without a fix as nulls.
pub fn parse_located<T, F>(document: &Value, build: F) -> Result<Vec<T>>
where
    F: Fn(String, GeoPoint) -> T,
{
    let mut parsed = Vec::new();

    for entry in data_entries(document)? {
        let id = entry_id(entry)?;
        let attributes = &entry["attributes"];

        let longitude = coordinate(&attributes["longitude"]);
        let latitude = coordinate(&attributes["latitude"]);
        let location = match (longitude, latitude) {
            (Some(longitude), Some(latitude)) => GeoPoint {
                longitude,
                latitude,
            },
            _ => {
                tracing::debug!(%id, "skipping entry without coordinates");
                continue;
            }
        };

        if !location.is_valid() {
            tracing::debug!(%id, ?location, "skipping entry with out-of-range coordinates");
            continue;
        }

        parsed.push(build(id, location));
    }

    Ok(parsed)
}

fn coordinate(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
