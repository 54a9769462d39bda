//! HTTP directions client.
//!
//! Talks to an OSRM-compatible `/route/v1/{profile}` endpoint and maps
//! every failure onto a distinct [`DirectionsError`] variant. Retries,
//! timeouts and the request budget are applied by
//! [`GuardedDirections`](super::GuardedDirections), not here.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use tokio::sync::Semaphore;

use crate::domain::Coordinates;

use super::DirectionsPort;
use super::error::DirectionsError;
use super::types::{Geometry, OsrmResponse, Profile, RouteEstimate};

/// Default base URL (the public OSRM demo server).
const DEFAULT_BASE_URL: &str = "https://router.project-osrm.org";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Configuration for the HTTP directions client.
#[derive(Debug, Clone)]
pub struct DirectionsConfig {
    /// Optional API key, sent as the `x-api-key` header
    pub api_key: Option<String>,
    /// Base URL of the routing service
    pub base_url: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Transport-level request timeout in seconds
    pub timeout_secs: u64,
}

impl DirectionsConfig {
    /// Create a config pointing at the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for DirectionsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// OSRM-compatible HTTP directions client.
///
/// Uses a semaphore to limit concurrent requests to the provider.
#[derive(Debug, Clone)]
pub struct HttpDirections {
    http: reqwest::Client,
    base_url: String,
    semaphore: Arc<Semaphore>,
}

impl HttpDirections {
    /// Create a new client with the given configuration.
    pub fn new(config: DirectionsConfig) -> Result<Self, DirectionsError> {
        let mut headers = HeaderMap::new();

        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(key).map_err(|_| DirectionsError::Rejected {
                status: 0,
                message: "Invalid API key format".to_string(),
            })?;
            headers.insert("x-api-key", value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DirectionsError::ProviderUnavailable(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        })
    }

    /// Build the request URL for a route query.
    fn route_url(&self, origin: Coordinates, destination: Coordinates, profile: Profile) -> String {
        // OSRM takes lng,lat pairs
        format!(
            "{}/route/v1/{}/{:.6},{:.6};{:.6},{:.6}",
            self.base_url,
            profile.as_str(),
            origin.lng(),
            origin.lat(),
            destination.lng(),
            destination.lat()
        )
    }

    async fn fetch(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        profile: Profile,
    ) -> Result<RouteEstimate, DirectionsError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| DirectionsError::ProviderUnavailable("Semaphore closed".to_string()))?;

        let url = self.route_url(origin, destination, profile);

        let response = self
            .http
            .get(&url)
            .query(&[("overview", "simplified"), ("alternatives", "false")])
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(DirectionsError::Unauthorized);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(DirectionsError::RateLimited);
        }

        let body = response.text().await?;

        if status.is_server_error() {
            return Err(DirectionsError::ProviderUnavailable(format!(
                "HTTP {}",
                status.as_u16()
            )));
        }

        // OSRM reports unroutable input as 400 with a JSON error code,
        // so client errors are parsed before being classified.
        parse_route_response(status, &body)
    }
}

impl DirectionsPort for HttpDirections {
    async fn route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        profile: Profile,
    ) -> Result<RouteEstimate, DirectionsError> {
        self.fetch(origin, destination, profile).await
    }
}

/// Interpret a (non-5xx) response body.
fn parse_route_response(status: StatusCode, body: &str) -> Result<RouteEstimate, DirectionsError> {
    let parsed: Result<OsrmResponse, _> = serde_json::from_str(body);

    let response = match parsed {
        Ok(r) => r,
        Err(e) if status.is_success() => {
            return Err(DirectionsError::MalformedResponse {
                message: e.to_string(),
                body: Some(body.chars().take(500).collect()),
            });
        }
        Err(_) => {
            return Err(DirectionsError::Rejected {
                status: status.as_u16(),
                message: body.chars().take(500).collect(),
            });
        }
    };

    let OsrmResponse {
        code,
        message,
        routes,
    } = response;

    match code.as_str() {
        "Ok" => {}
        "InvalidQuery" | "InvalidValue" | "NoSegment" => {
            return Err(DirectionsError::InvalidCoordinates(
                message.unwrap_or_else(|| code.clone()),
            ));
        }
        "NoRoute" => {
            return Err(DirectionsError::MalformedResponse {
                message: "no route between points".to_string(),
                body: message,
            });
        }
        other => {
            return Err(DirectionsError::Rejected {
                status: status.as_u16(),
                message: format!("{other}: {}", message.unwrap_or_default()),
            });
        }
    }

    let route = routes
        .into_iter()
        .next()
        .ok_or_else(|| DirectionsError::MalformedResponse {
            message: "response contains no routes".to_string(),
            body: Some(body.chars().take(500).collect()),
        })?;

    let estimate = RouteEstimate {
        distance_meters: route.distance,
        duration_seconds: route.duration,
        geometry: route.geometry.map(Geometry),
    };

    if !estimate.is_well_formed() {
        return Err(DirectionsError::MalformedResponse {
            message: format!(
                "negative or non-finite values: distance={}, duration={}",
                estimate.distance_meters, estimate.duration_seconds
            ),
            body: None,
        });
    }

    Ok(estimate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64, lng: f64) -> Coordinates {
        Coordinates::new(lat, lng).unwrap()
    }

    #[test]
    fn config_builder() {
        let config = DirectionsConfig::new("http://localhost:5000")
            .with_api_key("test-key")
            .with_max_concurrent(10)
            .with_timeout(15);

        assert_eq!(config.api_key.as_deref(), Some("test-key"));
        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.max_concurrent, 10);
        assert_eq!(config.timeout_secs, 15);
    }

    #[test]
    fn config_defaults() {
        let config = DirectionsConfig::default();

        assert!(config.api_key.is_none());
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.max_concurrent, DEFAULT_MAX_CONCURRENT);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn client_creation() {
        let config = DirectionsConfig::new("http://localhost:5000").with_api_key("k");
        assert!(HttpDirections::new(config).is_ok());

        let config = DirectionsConfig::default().with_api_key("bad\nkey");
        assert!(HttpDirections::new(config).is_err());
    }

    #[test]
    fn url_uses_lng_lat_order() {
        let client = HttpDirections::new(DirectionsConfig::new("http://osrm.local/")).unwrap();
        let url = client.route_url(c(24.8607, 67.0011), c(24.8482, 67.0305), Profile::Walking);
        assert_eq!(
            url,
            "http://osrm.local/route/v1/walking/67.001100,24.860700;67.030500,24.848200"
        );
    }

    #[test]
    fn parse_ok_response() {
        let body = r#"{ "code": "Ok", "routes": [ { "distance": 812.5, "duration": 95.0, "geometry": "_p~iF~ps|U" } ] }"#;
        let estimate = parse_route_response(StatusCode::OK, body).unwrap();
        assert_eq!(estimate.distance_meters, 812.5);
        assert_eq!(estimate.duration_seconds, 95.0);
        assert_eq!(estimate.geometry, Some(Geometry("_p~iF~ps|U".into())));
    }

    #[test]
    fn parse_invalid_coordinates() {
        let body = r#"{ "code": "NoSegment", "message": "Could not find a matching segment" }"#;
        let err = parse_route_response(StatusCode::BAD_REQUEST, body).unwrap_err();
        assert!(matches!(err, DirectionsError::InvalidCoordinates(_)));
    }

    #[test]
    fn parse_no_route_is_malformed() {
        let body = r#"{ "code": "NoRoute" }"#;
        let err = parse_route_response(StatusCode::OK, body).unwrap_err();
        assert!(matches!(err, DirectionsError::MalformedResponse { .. }));
    }

    #[test]
    fn parse_garbage() {
        let err = parse_route_response(StatusCode::OK, "<html>").unwrap_err();
        assert!(matches!(err, DirectionsError::MalformedResponse { .. }));

        let err = parse_route_response(StatusCode::NOT_FOUND, "not here").unwrap_err();
        assert_eq!(
            err,
            DirectionsError::Rejected {
                status: 404,
                message: "not here".into()
            }
        );
    }

    #[test]
    fn parse_rejects_empty_routes_and_negative_values() {
        let err = parse_route_response(StatusCode::OK, r#"{ "code": "Ok", "routes": [] }"#)
            .unwrap_err();
        assert!(matches!(err, DirectionsError::MalformedResponse { .. }));

        let body = r#"{ "code": "Ok", "routes": [ { "distance": -3.0, "duration": 1.0 } ] }"#;
        let err = parse_route_response(StatusCode::OK, body).unwrap_err();
        assert!(matches!(err, DirectionsError::MalformedResponse { .. }));
    }

    // Integration tests against a live routing service would go here. They
    // need network access and should be marked #[ignore].
}
