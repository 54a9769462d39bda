//! Distance, bearing, travel-time and fare heuristics.
//!
//! Everything here is pure: no state, no I/O. These functions are the
//! fallback whenever the directions provider cannot give a real answer,
//! so they must stay cheap and deterministic.

use std::fmt;

use crate::domain::Coordinates;

/// Mean Earth radius used for Haversine distances, in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Multiplier approximating road distance from straight-line distance.
pub const ROAD_NETWORK_FACTOR: f64 = 1.3;

/// Fixed boarding/waiting time added to every bus leg, in minutes.
pub const BUS_BOARDING_MINS: f64 = 5.0;

/// Below this distance (metres) the access leg is walked.
pub const DEFAULT_WALK_LIMIT_M: f64 = 500.0;

/// Below this distance (metres) a rickshaw is suggested; above it, ride-hail.
pub const DEFAULT_RICKSHAW_LIMIT_M: f64 = 2_000.0;

/// How a traveller covers a segment of the journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TravelMode {
    Walking,
    Rickshaw,
    RideHail,
    Bus,
}

impl TravelMode {
    /// Average speed used for time estimates, in km/h.
    pub fn average_speed_kmh(self) -> f64 {
        match self {
            TravelMode::Walking => 5.0,
            TravelMode::Rickshaw => 20.0,
            TravelMode::RideHail => 25.0,
            TravelMode::Bus => 25.0,
        }
    }

    /// Lowercase label for display.
    pub fn label(self) -> &'static str {
        match self {
            TravelMode::Walking => "walk",
            TravelMode::Rickshaw => "rickshaw",
            TravelMode::RideHail => "ride-hail",
            TravelMode::Bus => "bus",
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Great-circle distance between two points in metres (Haversine).
///
/// Symmetric, and exactly zero for identical points.
///
/// # Examples
///
/// ```
/// use brt_planner::domain::Coordinates;
/// use brt_planner::geomath::distance;
///
/// let a = Coordinates::new(24.8607, 67.0011).unwrap();
/// let b = Coordinates::new(24.8482, 67.0305).unwrap();
/// let d = distance(a, b);
/// assert!((d - 3_280.0).abs() < 100.0);
/// assert_eq!(distance(a, a), 0.0);
/// ```
pub fn distance(a: Coordinates, b: Coordinates) -> f64 {
    let lat1 = a.lat().to_radians();
    let lat2 = b.lat().to_radians();
    let d_lat = (b.lat() - a.lat()).to_radians();
    let d_lng = (b.lng() - a.lng()).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    // Clamp guards against h drifting just above 1.0 for antipodal points
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c
}

/// Initial bearing from `a` towards `b`, in degrees within [0, 360).
pub fn initial_bearing(a: Coordinates, b: Coordinates) -> f64 {
    let lat1 = a.lat().to_radians();
    let lat2 = b.lat().to_radians();
    let d_lng = (b.lng() - a.lng()).to_radians();

    let y = d_lng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lng.cos();

    let bearing = y.atan2(x).to_degrees().rem_euclid(360.0);
    // rem_euclid can return exactly 360.0 for tiny negative inputs
    if bearing >= 360.0 { 0.0 } else { bearing }
}

/// Eight-way compass direction for instruction text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompassPoint {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl CompassPoint {
    /// Nearest compass point to a bearing in degrees.
    pub fn from_bearing(bearing: f64) -> Self {
        const POINTS: [CompassPoint; 8] = [
            CompassPoint::North,
            CompassPoint::NorthEast,
            CompassPoint::East,
            CompassPoint::SouthEast,
            CompassPoint::South,
            CompassPoint::SouthWest,
            CompassPoint::West,
            CompassPoint::NorthWest,
        ];
        let sector = ((bearing.rem_euclid(360.0) + 22.5) / 45.0).floor() as usize % 8;
        POINTS[sector]
    }

    /// Compass point from `a` towards `b`.
    pub fn between(a: Coordinates, b: Coordinates) -> Self {
        Self::from_bearing(initial_bearing(a, b))
    }
}

impl fmt::Display for CompassPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompassPoint::North => "north",
            CompassPoint::NorthEast => "north-east",
            CompassPoint::East => "east",
            CompassPoint::SouthEast => "south-east",
            CompassPoint::South => "south",
            CompassPoint::SouthWest => "south-west",
            CompassPoint::West => "west",
            CompassPoint::NorthWest => "north-west",
        };
        f.write_str(s)
    }
}

/// Estimated travel time in minutes for a distance covered by `mode`.
///
/// Linear in distance at the mode's average speed. Bus legs additionally
/// pay [`BUS_BOARDING_MINS`] for boarding and waiting.
pub fn estimated_travel_time(distance_m: f64, mode: TravelMode) -> f64 {
    let distance_km = distance_m.max(0.0) / 1000.0;
    let moving = distance_km / mode.average_speed_kmh() * 60.0;

    match mode {
        TravelMode::Bus => moving + BUS_BOARDING_MINS,
        _ => moving,
    }
}

/// Approximate road distance from a straight-line distance, using
/// [`ROAD_NETWORK_FACTOR`].
pub fn road_network_estimate(straight_line_m: f64) -> f64 {
    road_network_estimate_with(straight_line_m, ROAD_NETWORK_FACTOR)
}

/// Approximate road distance with an explicit correction factor.
pub fn road_network_estimate_with(straight_line_m: f64, factor: f64) -> f64 {
    straight_line_m.max(0.0) * factor
}

/// Distance thresholds for choosing how to cover a first/last-mile leg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeThresholds {
    /// Legs shorter than this are walked (metres)
    pub walk_limit_m: f64,
    /// Legs shorter than this (but not walkable) use a rickshaw (metres)
    pub rickshaw_limit_m: f64,
}

impl Default for ModeThresholds {
    fn default() -> Self {
        Self {
            walk_limit_m: DEFAULT_WALK_LIMIT_M,
            rickshaw_limit_m: DEFAULT_RICKSHAW_LIMIT_M,
        }
    }
}

/// Suggested mode for an access leg of the given road distance.
pub fn suggest_access_mode(distance_m: f64, thresholds: &ModeThresholds) -> TravelMode {
    if distance_m < thresholds.walk_limit_m {
        TravelMode::Walking
    } else if distance_m < thresholds.rickshaw_limit_m {
        TravelMode::Rickshaw
    } else {
        TravelMode::RideHail
    }
}

/// Rough fare in whole rupees for a distance covered by `mode`.
///
/// Bus: Rs 15 for the first 3 km, Rs 5 for each further started km,
/// capped at Rs 55. Rickshaw: Rs 50 + Rs 30/km. Ride-hail: Rs 100 + Rs 35/km.
pub fn estimated_fare(distance_m: f64, mode: TravelMode) -> u32 {
    let km = distance_m.max(0.0) / 1000.0;
    match mode {
        TravelMode::Walking => 0,
        TravelMode::Bus => {
            let extra_km = (km - 3.0).max(0.0).ceil();
            (15.0 + 5.0 * extra_km).min(55.0) as u32
        }
        TravelMode::Rickshaw => (50.0 + 30.0 * km).ceil() as u32,
        TravelMode::RideHail => (100.0 + 35.0 * km).ceil() as u32,
    }
}
