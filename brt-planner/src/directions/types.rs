//! Directions request/response types.
//!
//! `Profile` and `RouteEstimate` are what the planner sees. The `Osrm*`
//! types mirror the JSON returned by an OSRM-compatible `/route/v1` endpoint.

use std::fmt;

use serde::Deserialize;

/// Routing profile requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Profile {
    Walking,
    Cycling,
    Driving,
}

impl Profile {
    /// Path segment used by the provider API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Walking => "walking",
            Profile::Cycling => "cycling",
            Profile::Driving => "driving",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque route geometry (an encoded polyline, as returned by the provider).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Geometry(pub String);

/// A provider's answer for one origin/destination pair.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteEstimate {
    /// Road distance in metres
    pub distance_meters: f64,
    /// Travel duration in seconds
    pub duration_seconds: f64,
    /// Route shape, if the provider sent one
    pub geometry: Option<Geometry>,
}

impl RouteEstimate {
    /// Create an estimate without geometry.
    pub fn new(distance_meters: f64, duration_seconds: f64) -> Self {
        Self {
            distance_meters,
            duration_seconds,
            geometry: None,
        }
    }

    /// Returns true if both values are finite and non-negative.
    pub fn is_well_formed(&self) -> bool {
        self.distance_meters.is_finite()
            && self.duration_seconds.is_finite()
            && self.distance_meters >= 0.0
            && self.duration_seconds >= 0.0
    }
}

/// OSRM `/route/v1` response body.
#[derive(Debug, Deserialize)]
pub struct OsrmResponse {
    /// "Ok" on success, otherwise an error code such as "NoRoute"
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub routes: Vec<OsrmRoute>,
}

/// One route alternative in an OSRM response.
#[derive(Debug, Deserialize)]
pub struct OsrmRoute {
    pub distance: f64,
    pub duration: f64,
    #[serde(default)]
    pub geometry: Option<String>,
}
