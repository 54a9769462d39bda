//! Door-to-door journey planning.
//!
//! The planner walks a fixed sequence of stages:
//!
//! 1. `ExactStopCheck`: is the destination already at a stop?
//! 2. `NearestStopSearch`: if not, which stop is nearest it?
//! 3. `BoardingSearch`: where should the traveller board?
//! 4. `JourneyAssembly`, or `WalkOnlyFallback` when no bus helps.
//!
//! Provider trouble never fails a plan. Every leg degrades to a local
//! estimate, and the outcome reports which legs were estimated and why.
//! The only errors are invalid input and internally inconsistent journeys.

use futures::future::join;
use serde::Serialize;
use tracing::{debug, warn};

use crate::directions::{DirectionsPort, Profile};
use crate::domain::{
    Coordinates, DomainError, InvalidCoordinates, Journey, JourneySegment, Stop, TransitParts,
    Waypoint,
};
use crate::geomath::{self, TravelMode};
use crate::network::TransitGraph;

use super::boarding::{BoardingSelection, BoardingSelector, SelectionError};
use super::candidates::{SearchMode, find_stop, prefilter};
use super::config::PlannerConfig;
use super::instructions;
use super::measure::{LegMeasurer, ProviderReport};

const ORIGIN_LABEL: &str = "your location";
const DESTINATION_LABEL: &str = "your destination";

/// Error from journey planning.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanError {
    /// Coordinates out of range; rejected before any provider call
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidCoordinates),

    /// The assembled journey broke a journey invariant
    #[error("could not assemble journey: {0}")]
    Assembly(#[from] DomainError),
}

/// Request for journey planning.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    /// Where the traveller is.
    pub origin: Coordinates,

    /// Where the traveller wants to go.
    pub destination: Coordinates,

    /// Display name for the destination, if known.
    pub destination_name: Option<String>,
}

impl PlanRequest {
    /// Create a new plan request.
    pub fn new(origin: Coordinates, destination: Coordinates) -> Self {
        Self {
            origin,
            destination,
            destination_name: None,
        }
    }

    /// Create a request from raw degrees, validating them.
    pub fn from_degrees(
        origin_lat: f64,
        origin_lng: f64,
        destination_lat: f64,
        destination_lng: f64,
    ) -> Result<Self, PlanError> {
        Ok(Self::new(
            Coordinates::new(origin_lat, origin_lng)?,
            Coordinates::new(destination_lat, destination_lng)?,
        ))
    }

    /// Name the destination in instructions.
    pub fn with_destination_name(mut self, name: impl Into<String>) -> Self {
        self.destination_name = Some(name.into());
        self
    }

    fn destination_label(&self) -> &str {
        self.destination_name.as_deref().unwrap_or(DESTINATION_LABEL)
    }
}

/// Planner stages, in the order they can be visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStage {
    ExactStopCheck,
    NearestStopSearch,
    BoardingSearch,
    JourneyAssembly,
    WalkOnlyFallback,
    Done,
}

/// Why a plan ended up walking-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WalkOnlyReason {
    /// No stop within range of the destination
    NoStopsInRange,
    /// No bus route reaches the destination stop from near the traveller
    NoBusRoute,
    /// The traveller's nearest stop is the destination stop
    AlreadyAtDestinationStop,
}

impl WalkOnlyReason {
    pub fn message(&self) -> &'static str {
        match self {
            WalkOnlyReason::NoStopsInRange => "no transit route found",
            WalkOnlyReason::NoBusRoute => "destination unreachable by any bus",
            WalkOnlyReason::AlreadyAtDestinationStop => "already at the nearest stop to the destination",
        }
    }
}

/// What kind of journey was planned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum PlanStatus {
    /// One bus route
    Transit,
    /// Two bus routes via a transfer stop
    Transfer,
    /// No bus leg
    WalkOnly(WalkOnlyReason),
}

/// Result of journey planning.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOutcome {
    pub journey: Journey,
    pub status: PlanStatus,
    pub provider: ProviderReport,
    /// Stages visited, in order.
    pub stages: Vec<PlanStage>,
}

impl PlanOutcome {
    /// Caveats worth showing next to the journey, if any.
    pub fn notices(&self) -> Vec<&'static str> {
        let mut notices = Vec::new();
        if let PlanStatus::WalkOnly(reason) = self.status {
            notices.push(reason.message());
        }
        if self.provider.degraded() {
            notices.push("provider unavailable, using estimated distances");
        }
        notices
    }
}

/// Journey planner.
pub struct Planner<'a, P: DirectionsPort> {
    graph: &'a TransitGraph,
    directions: &'a P,
    config: &'a PlannerConfig,
}

impl<'a, P: DirectionsPort> Planner<'a, P> {
    /// Create a new planner.
    pub fn new(graph: &'a TransitGraph, directions: &'a P, config: &'a PlannerConfig) -> Self {
        Self {
            graph,
            directions,
            config,
        }
    }

    /// Plan a journey from `request.origin` to `request.destination`.
    pub async fn plan(&self, request: &PlanRequest) -> Result<PlanOutcome, PlanError> {
        let measurer = LegMeasurer::new(self.directions, self.config.road_network_factor);
        let mut stages = vec![PlanStage::ExactStopCheck];

        let exact = find_stop(
            self.graph,
            &measurer,
            self.config,
            request.destination,
            SearchMode::ExactStop,
        )
        .await;

        let destination_stop = match exact {
            Some(found) => {
                debug!(stop = %found.stop.id, "Destination is at a stop");
                found.stop
            }
            None => {
                stages.push(PlanStage::NearestStopSearch);
                let nearest = find_stop(
                    self.graph,
                    &measurer,
                    self.config,
                    request.destination,
                    SearchMode::NearestStop,
                )
                .await;

                match nearest {
                    Some(found) => found.stop,
                    None => {
                        return self.walk_only(
                            request,
                            None,
                            WalkOnlyReason::NoStopsInRange,
                            &measurer,
                            stages,
                        );
                    }
                }
            }
        };

        let origin_stop = prefilter(self.graph, request.origin, self.config.nearest_stop_radius_m)
            .into_iter()
            .next();
        if origin_stop.is_some_and(|c| c.stop.id == destination_stop.id) {
            return self.walk_only(
                request,
                Some(destination_stop),
                WalkOnlyReason::AlreadyAtDestinationStop,
                &measurer,
                stages,
            );
        }

        stages.push(PlanStage::BoardingSearch);
        let selector = BoardingSelector::new(self.graph, self.config);
        let selection = match selector
            .select(&measurer, request.origin, destination_stop)
            .await
        {
            Ok(selection) => selection,
            Err(SelectionError::NoRoute(stop)) => {
                debug!(%stop, "No bus route to destination stop");
                return self.walk_only(
                    request,
                    Some(destination_stop),
                    WalkOnlyReason::NoBusRoute,
                    &measurer,
                    stages,
                );
            }
        };

        stages.push(PlanStage::JourneyAssembly);
        self.assemble(request, destination_stop, selection, &measurer, stages)
            .await
    }

    async fn assemble(
        &self,
        request: &PlanRequest,
        destination_stop: &Stop,
        selection: BoardingSelection<'_>,
        measurer: &LegMeasurer<'_, P>,
        mut stages: Vec<PlanStage>,
    ) -> Result<PlanOutcome, PlanError> {
        let boarding = selection.choice.boarding();

        let (access, egress) = join(
            measurer.measure(request.origin, boarding.coordinates, Profile::Walking),
            measurer.measure(
                destination_stop.coordinates,
                request.destination,
                Profile::Walking,
            ),
        )
        .await;

        let access_mode = geomath::suggest_access_mode(access.meters(), &self.config.modes);
        let to_stop = JourneySegment::new(
            access_mode,
            Waypoint::new(ORIGIN_LABEL, request.origin),
            Waypoint::at_stop(boarding),
            access,
        )?;
        let mut bus_leg = JourneySegment::new(
            TravelMode::Bus,
            Waypoint::at_stop(boarding),
            Waypoint::at_stop(destination_stop),
            selection.ride,
        )?;
        if selection.choice.transfer().is_some() {
            bus_leg = bus_leg.with_transfer_wait();
        }
        let from_stop = JourneySegment::new(
            TravelMode::Walking,
            Waypoint::at_stop(destination_stop),
            Waypoint::new(request.destination_label(), request.destination),
            egress,
        )?;

        for segment in [&to_stop, &bus_leg, &from_stop] {
            self.cross_check(segment);
        }

        let status = match selection.choice.transfer() {
            Some(_) => PlanStatus::Transfer,
            None => PlanStatus::Transit,
        };

        let journey = Journey::transit(TransitParts {
            boarding_stop: boarding.clone(),
            destination_stop: destination_stop.clone(),
            transfer_stop: selection.choice.transfer().cloned(),
            routes_used: selection.choice.routes(),
            to_stop,
            bus_leg,
            from_stop,
        })?;
        let steps = instructions::render(&journey);
        let journey = journey.with_instructions(steps);

        stages.push(PlanStage::Done);
        let provider = measurer.report();
        debug!(
            boarding = %boarding.id,
            destination = %destination_stop.id,
            total_m = journey.total_distance(),
            calls = provider.calls_attempted,
            estimated = provider.estimated_legs,
            "Planned transit journey"
        );

        Ok(PlanOutcome {
            journey,
            status,
            provider,
            stages,
        })
    }

    /// A single-segment journey over the estimated road distance.
    fn walk_only(
        &self,
        request: &PlanRequest,
        stop: Option<&Stop>,
        reason: WalkOnlyReason,
        measurer: &LegMeasurer<'_, P>,
        mut stages: Vec<PlanStage>,
    ) -> Result<PlanOutcome, PlanError> {
        stages.push(PlanStage::WalkOnlyFallback);

        let distance = measurer.estimate(request.origin, request.destination);
        let mode = geomath::suggest_access_mode(distance.meters(), &self.config.modes);
        let segment = JourneySegment::new(
            mode,
            Waypoint::new(ORIGIN_LABEL, request.origin),
            Waypoint::new(request.destination_label(), request.destination),
            distance,
        )?;

        let journey = Journey::walking(segment, stop.cloned());
        let steps = instructions::render(&journey);
        let journey = journey.with_instructions(steps);

        stages.push(PlanStage::Done);
        debug!(
            reason = reason.message(),
            total_m = journey.total_distance(),
            %mode,
            "Planned walking-only journey"
        );

        Ok(PlanOutcome {
            journey,
            status: PlanStatus::WalkOnly(reason),
            provider: measurer.report(),
            stages,
        })
    }

    /// Log provider durations that disagree wildly with the local estimate.
    fn cross_check(&self, segment: &JourneySegment) {
        let Some(provider_secs) = segment.distance().provider_duration_secs() else {
            return;
        };
        let local_secs = segment.duration().num_milliseconds() as f64 / 1000.0;
        if provider_secs <= 0.0 || local_secs <= 0.0 {
            return;
        }

        let ratio = provider_secs / local_secs;
        let factor = self.config.duration_disagreement_factor;
        if ratio > factor || ratio < 1.0 / factor {
            warn!(
                mode = %segment.mode(),
                from = %segment.from().name,
                to = %segment.to().name,
                provider_secs,
                local_secs,
                "Provider duration disagrees with local estimate"
            );
        }
    }
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
