//! Two-stage candidate stop narrowing.
//!
//! Stage 1 ([`prefilter`]) measures straight-line distance to every stop and
//! keeps those within a radius, nearest first. It does no I/O. Stage 2
//! ([`refine`]) asks the directions provider about the nearest `K` only,
//! concurrently, and re-ranks them by road distance.

use futures::future::join_all;
use tracing::debug;

use crate::directions::{DirectionsPort, Profile};
use crate::domain::{Coordinates, RoadDistance, Stop};
use crate::geomath;
use crate::network::TransitGraph;

use super::config::PlannerConfig;
use super::measure::LegMeasurer;

/// A stop near a query point, by straight-line distance.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'g> {
    pub stop: &'g Stop,
    pub local_distance: f64,
}

/// A candidate with a road distance from the query point.
#[derive(Debug, Clone, Copy)]
pub struct RefinedCandidate<'g> {
    pub stop: &'g Stop,
    pub local_distance: f64,
    pub road: RoadDistance,
}

/// What a stop search is for; decides the pre-filter radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Is the point already at a stop?
    ExactStop,
    /// Which stop is nearest the point?
    NearestStop,
}

impl SearchMode {
    pub fn radius(self, config: &PlannerConfig) -> f64 {
        match self {
            SearchMode::ExactStop => config.exact_stop_radius_m,
            SearchMode::NearestStop => config.nearest_stop_radius_m,
        }
    }
}

/// Stops within `radius_m` of `point`, nearest first.
///
/// Ties keep the graph's stop order.
pub fn prefilter(graph: &TransitGraph, point: Coordinates, radius_m: f64) -> Vec<Candidate<'_>> {
    let mut candidates: Vec<Candidate<'_>> = graph
        .stops()
        .iter()
        .map(|stop| Candidate {
            stop,
            local_distance: geomath::distance(point, stop.coordinates),
        })
        .filter(|c| c.local_distance <= radius_m)
        .collect();

    candidates.sort_by(|a, b| a.local_distance.total_cmp(&b.local_distance));
    candidates
}

/// Refine the first `k` candidates with driving distances from `point`.
///
/// Returns at most `k` candidates sorted by road distance (ties by local
/// distance, then input order). A failed provider call yields an estimated
/// distance, never a dropped candidate.
pub async fn refine<'g, P: DirectionsPort>(
    measurer: &LegMeasurer<'_, P>,
    point: Coordinates,
    candidates: &[Candidate<'g>],
    k: usize,
) -> Vec<RefinedCandidate<'g>> {
    let futures: Vec<_> = candidates
        .iter()
        .take(k)
        .map(|c| async move {
            let road = measurer
                .measure(point, c.stop.coordinates, Profile::Driving)
                .await;
            RefinedCandidate {
                stop: c.stop,
                local_distance: c.local_distance,
                road,
            }
        })
        .collect();

    let mut refined = join_all(futures).await;
    refined.sort_by(|a, b| {
        a.road
            .meters()
            .total_cmp(&b.road.meters())
            .then(a.local_distance.total_cmp(&b.local_distance))
    });
    refined
}

/// Best stop for `point` in the given mode.
///
/// In [`SearchMode::ExactStop`] the best candidate only counts if its road
/// distance is within the exact-stop threshold.
pub async fn find_stop<'g, P: DirectionsPort>(
    graph: &'g TransitGraph,
    measurer: &LegMeasurer<'_, P>,
    config: &PlannerConfig,
    point: Coordinates,
    mode: SearchMode,
) -> Option<RefinedCandidate<'g>> {
    let candidates = prefilter(graph, point, mode.radius(config));
    if candidates.is_empty() {
        debug!(%point, ?mode, "No stops within radius");
        return None;
    }

    let refined = refine(measurer, point, &candidates, config.candidate_limit.max(1)).await;
    let best = refined.into_iter().next()?;

    match mode {
        SearchMode::ExactStop if best.road.meters() > config.exact_stop_threshold_m => {
            debug!(
                %point,
                stop = %best.stop.id,
                road = best.road.meters(),
                "Nearest stop is beyond exact-stop threshold"
            );
            None
        }
        _ => Some(best),
    }
}
