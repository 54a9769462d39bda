//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::domain::{BusRoute, Journey, JourneySegment, Stop, Waypoint};
use crate::planner::{PlanOutcome, PlanStage, PlanStatus, ProviderReport};

/// Request to search stops by name.
#[derive(Debug, Deserialize)]
pub struct StopSearchRequest {
    /// Search text (name prefix or substring)
    pub q: String,

    /// Maximum number of results
    pub limit: Option<usize>,
}

/// A stop in search results.
#[derive(Debug, Serialize)]
pub struct StopResult {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,

    /// Routes serving this stop
    pub routes: Vec<String>,
}

impl StopResult {
    pub fn from_stop(stop: &Stop) -> Self {
        Self {
            id: stop.id.to_string(),
            name: stop.name.clone(),
            lat: stop.coordinates.lat(),
            lng: stop.coordinates.lng(),
            routes: stop.routes.iter().cloned().collect(),
        }
    }
}

/// Response for stop search.
#[derive(Debug, Serialize)]
pub struct StopSearchResponse {
    pub stops: Vec<StopResult>,
}

/// A bus route with its stops in travel order.
#[derive(Debug, Serialize)]
pub struct RouteResult {
    pub name: String,
    pub color: Option<String>,
    pub stops: Vec<String>,
}

impl RouteResult {
    pub fn from_route(route: &BusRoute) -> Self {
        Self {
            name: route.name.clone(),
            color: route.color.clone(),
            stops: route.stops.iter().map(|id| id.to_string()).collect(),
        }
    }
}

/// Response listing every route.
#[derive(Debug, Serialize)]
pub struct RoutesResponse {
    pub routes: Vec<RouteResult>,
}

/// A point given as raw degrees.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Request to plan a journey.
#[derive(Debug, Deserialize)]
pub struct PlanJourneyRequest {
    /// Where the traveller is
    pub origin: LatLng,

    /// Where they want to go
    pub destination: LatLng,

    /// Optional display name for the destination
    #[serde(default)]
    pub destination_name: Option<String>,
}

/// Response for journey planning.
#[derive(Debug, Serialize)]
pub struct PlanJourneyResponse {
    pub status: PlanStatus,
    pub journey: JourneyResult,
    pub provider: ProviderReport,

    /// Caveats to show next to the journey
    pub notices: Vec<String>,

    /// Planner stages visited, in order
    pub stages: Vec<PlanStage>,
}

impl PlanJourneyResponse {
    pub fn from_outcome(outcome: &PlanOutcome) -> Self {
        Self {
            status: outcome.status,
            journey: JourneyResult::from_journey(&outcome.journey),
            provider: outcome.provider,
            notices: outcome.notices().into_iter().map(String::from).collect(),
            stages: outcome.stages.clone(),
        }
    }
}

/// Summary of a stop inside a journey.
#[derive(Debug, Serialize)]
pub struct StopSummary {
    pub id: String,
    pub name: String,
}

impl StopSummary {
    fn from_stop(stop: &Stop) -> Self {
        Self {
            id: stop.id.to_string(),
            name: stop.name.clone(),
        }
    }
}

/// A planned journey.
#[derive(Debug, Serialize)]
pub struct JourneyResult {
    pub boarding_stop: Option<StopSummary>,
    pub destination_stop: Option<StopSummary>,
    pub transfer_stop: Option<StopSummary>,
    pub routes_used: Vec<String>,
    pub segments: Vec<SegmentResult>,
    pub total_distance_m: f64,
    pub total_duration_mins: f64,

    /// Estimated fare in rupees
    pub estimated_fare: u32,

    /// Whether any distance is a local estimate
    pub has_estimates: bool,
    pub instructions: Vec<String>,
    pub instruction_text: String,
}

impl JourneyResult {
    pub fn from_journey(journey: &Journey) -> Self {
        Self {
            boarding_stop: journey.boarding_stop().map(StopSummary::from_stop),
            destination_stop: journey.destination_stop().map(StopSummary::from_stop),
            transfer_stop: journey.transfer_stop().map(StopSummary::from_stop),
            routes_used: journey.routes_used().to_vec(),
            segments: journey.segments().map(SegmentResult::from_segment).collect(),
            total_distance_m: journey.total_distance(),
            total_duration_mins: journey.total_duration_minutes(),
            estimated_fare: journey.estimated_fare(),
            has_estimates: journey.has_estimates(),
            instructions: journey.instructions().to_vec(),
            instruction_text: journey.instruction_text(),
        }
    }
}

/// A named point.
#[derive(Debug, Serialize)]
pub struct WaypointResult {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl WaypointResult {
    fn from_waypoint(waypoint: &Waypoint) -> Self {
        Self {
            name: waypoint.name.clone(),
            lat: waypoint.coordinates.lat(),
            lng: waypoint.coordinates.lng(),
        }
    }
}

/// One segment of a journey.
#[derive(Debug, Serialize)]
pub struct SegmentResult {
    /// "walk", "rickshaw", "ride-hail" or "bus"
    pub mode: &'static str,
    pub from: WaypointResult,
    pub to: WaypointResult,
    pub distance_m: f64,

    /// "measured" or "estimated"
    pub distance_source: String,
    pub duration_mins: f64,
    pub fare: u32,
}

impl SegmentResult {
    pub fn from_segment(segment: &JourneySegment) -> Self {
        Self {
            mode: segment.mode().label(),
            from: WaypointResult::from_waypoint(segment.from()),
            to: WaypointResult::from_waypoint(segment.to()),
            distance_m: segment.distance_meters(),
            distance_source: segment.distance().provenance().to_string(),
            duration_mins: segment.duration_minutes(),
            fare: segment.fare(),
        }
    }
}

/// Provider budget status.
#[derive(Debug, Serialize)]
pub struct BudgetResponse {
    /// "http" or "offline"
    pub provider: &'static str,
    pub quota_per_window: u32,
    pub remaining: u32,
    pub window_secs: u64,
    pub cached_routes: u64,
}

/// Result of a network reload.
#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub stops: usize,
    pub routes: usize,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
