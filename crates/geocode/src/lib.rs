use async_trait::async_trait;
use serde::Deserialize;
use shared::domain::Coordinates;
use thiserror::Error;
use tracing::warn;

/// Offset from an ASCII uppercase letter to its Unicode regional indicator
/// symbol; a pair of those renders as a flag emoji.
const REGIONAL_INDICATOR_OFFSET: u32 = 127_397;

/// Converts a two-letter ISO 3166-1 country code to its flag emoji.
///
/// Case-insensitive; surrounding whitespace is ignored. Returns `None` unless
/// the trimmed input is exactly two ASCII letters.
pub fn flag_emoji(country_code: &str) -> Option<String> {
    let code = country_code.trim();
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    code.chars()
        .map(|c| char::from_u32(c.to_ascii_uppercase() as u32 + REGIONAL_INDICATOR_OFFSET))
        .collect()
}

/// Place metadata resolved from a coordinate pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPlace {
    /// Best-effort settlement name; empty when the provider knows neither a
    /// city nor a locality for the position.
    pub city_name: String,
    pub country: String,
    pub country_code: String,
    pub emoji: String,
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("reverse geocode request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("that doesn't seem to be a city: no country at lat={lat} lng={lng}")]
    UnresolvableLocation { lat: f64, lng: f64 },
}

#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn resolve(&self, position: Coordinates) -> Result<ResolvedPlace, GeocodeError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReverseGeocodeResponse {
    #[serde(default)]
    city: String,
    #[serde(default)]
    locality: String,
    #[serde(default)]
    country_name: String,
    #[serde(default)]
    country_code: String,
}

/// Client for the BigDataCloud `reverse-geocode-client` endpoint.
pub struct BigDataCloudGeocoder {
    http: reqwest::Client,
    base_url: String,
}

impl BigDataCloudGeocoder {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ReverseGeocoder for BigDataCloudGeocoder {
    async fn resolve(&self, position: Coordinates) -> Result<ResolvedPlace, GeocodeError> {
        let response: ReverseGeocodeResponse = self
            .http
            .get(format!("{}/reverse-geocode-client", self.base_url))
            .query(&[("latitude", position.lat), ("longitude", position.lng)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.country_code.is_empty() {
            return Err(GeocodeError::UnresolvableLocation {
                lat: position.lat,
                lng: position.lng,
            });
        }

        let city_name = if response.city.is_empty() {
            response.locality
        } else {
            response.city
        };

        let emoji = flag_emoji(&response.country_code).unwrap_or_else(|| {
            warn!(
                country_code = %response.country_code,
                "geocode: provider returned a non-alpha-2 country code, skipping flag"
            );
            String::new()
        });

        Ok(ResolvedPlace {
            city_name,
            country: response.country_name,
            country_code: response.country_code,
            emoji,
        })
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
