//! Journey types.
//!
//! A `Journey` is a door-to-door trip: a first-mile segment to the
//! boarding stop, at most one bus leg (possibly via a transfer stop), and
//! a last-mile walk from the destination stop. A walking-only journey has
//! a single segment and no bus leg.

use chrono::Duration;

use crate::geomath::{BUS_BOARDING_MINS, TravelMode, estimated_fare, estimated_travel_time};

use super::{Coordinates, DomainError, RoadDistance, Stop};

/// Tolerance when checking that consecutive segments share an endpoint.
const ENDPOINT_TOLERANCE_DEG: f64 = 1e-9;

/// A named point a segment starts or ends at.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    /// Display name ("your location", a stop name, ...)
    pub name: String,
    /// Location
    pub coordinates: Coordinates,
}

impl Waypoint {
    /// Create a waypoint.
    pub fn new(name: impl Into<String>, coordinates: Coordinates) -> Self {
        Self {
            name: name.into(),
            coordinates,
        }
    }

    /// Waypoint at a bus stop.
    pub fn at_stop(stop: &Stop) -> Self {
        Self::new(stop.name.clone(), stop.coordinates)
    }
}

fn from_minutes(minutes: f64) -> Duration {
    Duration::milliseconds((minutes * 60_000.0).round() as i64)
}

/// One segment of a journey.
///
/// The duration is always derived locally from the mode-speed heuristic,
/// never copied from the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct JourneySegment {
    mode: TravelMode,
    from: Waypoint,
    to: Waypoint,
    distance: RoadDistance,
    duration: Duration,
    fare: u32,
}

impl JourneySegment {
    /// Create a segment, deriving its duration and fare from the distance.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the distance is negative or not finite.
    pub fn new(
        mode: TravelMode,
        from: Waypoint,
        to: Waypoint,
        distance: RoadDistance,
    ) -> Result<Self, DomainError> {
        let meters = distance.meters();
        if !meters.is_finite() || meters < 0.0 {
            return Err(DomainError::InvalidDistance(meters));
        }

        let duration = from_minutes(estimated_travel_time(meters, mode));

        Ok(Self {
            mode,
            from,
            to,
            distance,
            duration,
            fare: estimated_fare(meters, mode),
        })
    }

    /// How the segment is travelled.
    pub fn mode(&self) -> TravelMode {
        self.mode
    }

    /// Start of the segment.
    pub fn from(&self) -> &Waypoint {
        &self.from
    }

    /// End of the segment.
    pub fn to(&self) -> &Waypoint {
        &self.to
    }

    /// Road distance with provenance.
    pub fn distance(&self) -> &RoadDistance {
        &self.distance
    }

    /// Distance in metres.
    pub fn distance_meters(&self) -> f64 {
        self.distance.meters()
    }

    /// Estimated duration.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Estimated duration in (fractional) minutes.
    pub fn duration_minutes(&self) -> f64 {
        self.duration.num_milliseconds() as f64 / 60_000.0
    }

    /// Estimated fare in rupees.
    pub fn fare(&self) -> u32 {
        self.fare
    }

    /// Add the boarding wait for changing buses part way along the leg.
    pub fn with_transfer_wait(mut self) -> Self {
        self.duration = self.duration + from_minutes(BUS_BOARDING_MINS);
        self
    }
}

/// The pieces of a journey that uses the bus.
#[derive(Debug, Clone)]
pub struct TransitParts {
    pub boarding_stop: Stop,
    pub destination_stop: Stop,
    pub transfer_stop: Option<Stop>,
    pub routes_used: Vec<String>,
    pub to_stop: JourneySegment,
    pub bus_leg: JourneySegment,
    pub from_stop: JourneySegment,
}

/// A complete door-to-door journey.
///
/// # Invariants
///
/// - A transit journey boards and alights at different stops, names at
///   least one route, and its segments connect end to start.
/// - A walking-only journey has no bus leg and no routes; its boarding and
///   destination stop, when known, are the same stop.
///
/// Journeys are plain values: they compare structurally and are never
/// mutated once handed to a caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Journey {
    boarding_stop: Option<Stop>,
    destination_stop: Option<Stop>,
    transfer_stop: Option<Stop>,
    routes_used: Vec<String>,
    to_stop: JourneySegment,
    bus_leg: Option<JourneySegment>,
    from_stop: Option<JourneySegment>,
    instructions: Vec<String>,
}

impl Journey {
    /// Constructs a journey that rides the bus.
    ///
    /// # Errors
    ///
    /// Returns `Err` if:
    /// - boarding and destination are the same stop
    /// - no route is named
    /// - segments don't connect (access → boarding stop → destination stop → egress)
    pub fn transit(parts: TransitParts) -> Result<Self, DomainError> {
        if parts.boarding_stop.id == parts.destination_stop.id {
            return Err(DomainError::SameBoardingAndDestination(
                parts.boarding_stop.id.clone(),
            ));
        }

        if parts.routes_used.is_empty() {
            return Err(DomainError::NoRoutesUsed);
        }

        let boarding = parts.boarding_stop.coordinates;
        let alighting = parts.destination_stop.coordinates;

        if !parts
            .to_stop
            .to
            .coordinates
            .approx_eq(&boarding, ENDPOINT_TOLERANCE_DEG)
        {
            return Err(DomainError::SegmentsNotConnected(
                "first segment must end at the boarding stop",
            ));
        }
        if !parts
            .bus_leg
            .from
            .coordinates
            .approx_eq(&boarding, ENDPOINT_TOLERANCE_DEG)
        {
            return Err(DomainError::SegmentsNotConnected(
                "bus leg must start at the boarding stop",
            ));
        }
        if !parts
            .bus_leg
            .to
            .coordinates
            .approx_eq(&alighting, ENDPOINT_TOLERANCE_DEG)
        {
            return Err(DomainError::SegmentsNotConnected(
                "bus leg must end at the destination stop",
            ));
        }
        if !parts
            .from_stop
            .from
            .coordinates
            .approx_eq(&alighting, ENDPOINT_TOLERANCE_DEG)
        {
            return Err(DomainError::SegmentsNotConnected(
                "last segment must start at the destination stop",
            ));
        }

        Ok(Journey {
            boarding_stop: Some(parts.boarding_stop),
            destination_stop: Some(parts.destination_stop),
            transfer_stop: parts.transfer_stop,
            routes_used: parts.routes_used,
            to_stop: parts.to_stop,
            bus_leg: Some(parts.bus_leg),
            from_stop: Some(parts.from_stop),
            instructions: Vec::new(),
        })
    }

    /// Constructs a walking-only journey.
    ///
    /// `stop` is the stop nearest the destination, if one was found. It
    /// becomes both the boarding and destination stop, which is what marks
    /// the bus leg as empty.
    pub fn walking(segment: JourneySegment, stop: Option<Stop>) -> Self {
        Journey {
            boarding_stop: stop.clone(),
            destination_stop: stop,
            transfer_stop: None,
            routes_used: Vec::new(),
            to_stop: segment,
            bus_leg: None,
            from_stop: None,
            instructions: Vec::new(),
        }
    }

    /// Attach rendered step-by-step instructions.
    pub(crate) fn with_instructions(mut self, instructions: Vec<String>) -> Self {
        self.instructions = instructions;
        self
    }

    /// Stop where the bus is boarded.
    pub fn boarding_stop(&self) -> Option<&Stop> {
        self.boarding_stop.as_ref()
    }

    /// Stop where the bus is left.
    pub fn destination_stop(&self) -> Option<&Stop> {
        self.destination_stop.as_ref()
    }

    /// Stop where the traveller changes routes, for one-transfer journeys.
    pub fn transfer_stop(&self) -> Option<&Stop> {
        self.transfer_stop.as_ref()
    }

    /// Routes ridden, in order.
    pub fn routes_used(&self) -> &[String] {
        &self.routes_used
    }

    /// First-mile segment (or the whole walk for walking-only journeys).
    pub fn to_stop(&self) -> &JourneySegment {
        &self.to_stop
    }

    /// The bus leg, if any.
    pub fn bus_leg(&self) -> Option<&JourneySegment> {
        self.bus_leg.as_ref()
    }

    /// Last-mile walk, if any.
    pub fn from_stop(&self) -> Option<&JourneySegment> {
        self.from_stop.as_ref()
    }

    /// All segments in travel order.
    pub fn segments(&self) -> impl Iterator<Item = &JourneySegment> {
        std::iter::once(&self.to_stop)
            .chain(self.bus_leg.as_ref())
            .chain(self.from_stop.as_ref())
    }

    /// Returns true if the journey has no bus leg.
    pub fn is_walk_only(&self) -> bool {
        self.bus_leg.is_none()
    }

    /// Total distance over all segments, in metres.
    pub fn total_distance(&self) -> f64 {
        self.segments().map(|s| s.distance_meters()).sum()
    }

    /// Total estimated duration.
    pub fn total_duration(&self) -> Duration {
        self.segments()
            .fold(Duration::zero(), |acc, s| acc + s.duration())
    }

    /// Total estimated duration in (fractional) minutes.
    pub fn total_duration_minutes(&self) -> f64 {
        self.total_duration().num_milliseconds() as f64 / 60_000.0
    }

    /// Total estimated fare in rupees.
    pub fn estimated_fare(&self) -> u32 {
        self.segments().map(|s| s.fare()).sum()
    }

    /// Returns true if any segment distance is an estimate.
    pub fn has_estimates(&self) -> bool {
        self.segments().any(|s| !s.distance().is_measured())
    }

    /// Rendered step-by-step instructions.
    pub fn instructions(&self) -> &[String] {
        &self.instructions
    }

    /// Instructions as a single numbered block of text.
    pub fn instruction_text(&self) -> String {
        self.instructions
            .iter()
            .enumerate()
            .map(|(i, step)| format!("{}. {}", i + 1, step))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
