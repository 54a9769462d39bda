//! Per-request leg measurement.
//!
//! Every road distance the planner uses goes through a [`LegMeasurer`]. It
//! asks the directions provider, falls back to a road-network estimate when
//! the provider can't answer, and tags the result with its provenance.
//! Within one request the same leg is only ever asked for once, and once
//! the provider reports the budget is exhausted no further calls are made.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::directions::{DirectionsError, DirectionsPort, Profile};
use crate::domain::{Coordinates, RoadDistance};
use crate::geomath;

type LegKey = (u64, u64, u64, u64, Profile);

fn leg_key(from: Coordinates, to: Coordinates, profile: Profile) -> LegKey {
    (
        from.lat().to_bits(),
        from.lng().to_bits(),
        to.lat().to_bits(),
        to.lng().to_bits(),
        profile,
    )
}

/// How the provider behaved during one planning request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProviderReport {
    /// Provider calls issued (cache and budget layers may answer some).
    pub calls_attempted: usize,
    /// Legs answered by the provider.
    pub measured_legs: usize,
    /// Legs that fell back to a local estimate.
    pub estimated_legs: usize,
    /// The request budget ran out during this request.
    pub rate_limited: bool,
    /// The provider failed at least once (timeout, 5xx, bad response).
    pub unavailable: bool,
}

impl ProviderReport {
    /// Returns true if any leg used an estimate because of the provider.
    pub fn degraded(&self) -> bool {
        self.rate_limited || self.unavailable
    }
}

/// Measures legs for one planning request.
pub struct LegMeasurer<'a, P> {
    directions: &'a P,
    road_factor: f64,
    memo: Mutex<HashMap<LegKey, Arc<OnceCell<RoadDistance>>>>,
    rate_limited: AtomicBool,
    unavailable: AtomicBool,
    calls: AtomicUsize,
    measured: AtomicUsize,
    estimated: AtomicUsize,
}

impl<'a, P: DirectionsPort> LegMeasurer<'a, P> {
    pub fn new(directions: &'a P, road_factor: f64) -> Self {
        Self {
            directions,
            road_factor,
            memo: Mutex::new(HashMap::new()),
            rate_limited: AtomicBool::new(false),
            unavailable: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            measured: AtomicUsize::new(0),
            estimated: AtomicUsize::new(0),
        }
    }

    /// Local estimate for a leg, without asking the provider.
    pub fn estimate(&self, from: Coordinates, to: Coordinates) -> RoadDistance {
        RoadDistance::estimated(geomath::road_network_estimate_with(
            geomath::distance(from, to),
            self.road_factor,
        ))
    }

    /// Road distance for a leg, measured if possible.
    ///
    /// Never fails: any provider error degrades to [`Self::estimate`].
    /// Concurrent requests for the same leg share one provider call.
    pub async fn measure(&self, from: Coordinates, to: Coordinates, profile: Profile) -> RoadDistance {
        let cell = self.cell(leg_key(from, to, profile));

        *cell
            .get_or_init(|| async {
                let distance = if self.rate_limited.load(Ordering::Acquire) {
                    debug!(%from, %to, %profile, "Budget exhausted earlier in request, estimating");
                    self.estimate(from, to)
                } else {
                    self.ask(from, to, profile).await
                };

                if distance.is_measured() {
                    self.measured.fetch_add(1, Ordering::Relaxed);
                } else {
                    self.estimated.fetch_add(1, Ordering::Relaxed);
                }
                distance
            })
            .await
    }

    async fn ask(&self, from: Coordinates, to: Coordinates, profile: Profile) -> RoadDistance {
        self.calls.fetch_add(1, Ordering::Relaxed);

        match self.directions.route(from, to, profile).await {
            Ok(estimate) if estimate.distance_meters > 0.0 => {
                RoadDistance::measured(estimate.distance_meters, estimate.duration_seconds)
            }
            Ok(estimate) => {
                debug!(
                    %from, %to, %profile,
                    distance = estimate.distance_meters,
                    "Non-positive provider distance, estimating"
                );
                self.estimate(from, to)
            }
            Err(DirectionsError::RateLimited) => {
                self.rate_limited.store(true, Ordering::Release);
                warn!(%from, %to, %profile, "Directions rate limited, using estimated distances");
                self.estimate(from, to)
            }
            Err(e) => {
                if !matches!(e, DirectionsError::InvalidCoordinates(_)) {
                    self.unavailable.store(true, Ordering::Release);
                }
                warn!(
                    %from, %to, %profile,
                    kind = e.kind(),
                    error = %e,
                    "Directions request failed, using estimate"
                );
                self.estimate(from, to)
            }
        }
    }

    /// The memo slot for a leg, created empty on first use.
    fn cell(&self, key: LegKey) -> Arc<OnceCell<RoadDistance>> {
        let mut memo = match self.memo.lock() {
            Ok(memo) => memo,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(memo.entry(key).or_default())
    }

    /// Summary of provider behaviour so far.
    pub fn report(&self) -> ProviderReport {
        ProviderReport {
            calls_attempted: self.calls.load(Ordering::Relaxed),
            measured_legs: self.measured.load(Ordering::Relaxed),
            estimated_legs: self.estimated.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Acquire),
            unavailable: self.unavailable.load(Ordering::Acquire),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directions::{RouteEstimate, StaticDirections};
    use crate::domain::Provenance;

    /// Hands control back to the runtime before answering, so concurrent
    /// measures overlap.
    struct Yielding(StaticDirections);

    impl DirectionsPort for Yielding {
        async fn route(
            &self,
            origin: Coordinates,
            destination: Coordinates,
            profile: Profile,
        ) -> Result<RouteEstimate, DirectionsError> {
            tokio::task::yield_now().await;
            self.0.route(origin, destination, profile).await
        }
    }

    fn c(lat: f64, lng: f64) -> Coordinates {
        Coordinates::new(lat, lng).unwrap()
    }

    #[tokio::test]
    async fn measures_with_provider() {
        let stub = StaticDirections::new();
        let measurer = LegMeasurer::new(&stub, 1.3);
        let (a, b) = (c(24.8607, 67.0011), c(24.8482, 67.0305));

        let d = measurer.measure(a, b, Profile::Driving).await;

        assert_eq!(d.provenance(), Provenance::Measured);
        assert!(d.provider_duration_secs().is_some());
        let report = measurer.report();
        assert_eq!(report.calls_attempted, 1);
        assert_eq!(report.measured_legs, 1);
        assert!(!report.degraded());
    }

    #[tokio::test]
    async fn repeated_leg_is_not_asked_twice() {
        let stub = StaticDirections::new();
        let measurer = LegMeasurer::new(&stub, 1.3);
        let (a, b) = (c(24.8607, 67.0011), c(24.8482, 67.0305));

        let first = measurer.measure(a, b, Profile::Driving).await;
        let second = measurer.measure(a, b, Profile::Driving).await;

        assert_eq!(first, second);
        assert_eq!(stub.calls(), 1);

        // Different profile is a different leg
        measurer.measure(a, b, Profile::Walking).await;
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn concurrent_measures_of_one_leg_share_a_call() {
        let stub = Yielding(StaticDirections::new());
        let measurer = LegMeasurer::new(&stub, 1.3);
        let (a, b) = (c(24.8607, 67.0011), c(24.8482, 67.0305));

        let (first, second) = futures::future::join(
            measurer.measure(a, b, Profile::Driving),
            measurer.measure(a, b, Profile::Driving),
        )
        .await;

        assert_eq!(first, second);
        assert_eq!(stub.0.calls(), 1);
        let report = measurer.report();
        assert_eq!(report.calls_attempted, 1);
        assert_eq!(report.measured_legs, 1);
    }

    #[tokio::test]
    async fn failure_falls_back_to_estimate() {
        let stub =
            StaticDirections::new().failing_with(DirectionsError::ProviderUnavailable("HTTP 500".into()));
        let measurer = LegMeasurer::new(&stub, 1.3);
        let (a, b) = (c(24.8607, 67.0011), c(24.8482, 67.0305));

        let d = measurer.measure(a, b, Profile::Driving).await;

        assert_eq!(d.provenance(), Provenance::Estimated);
        let expected = geomath::distance(a, b) * 1.3;
        assert!((d.meters() - expected).abs() < 1e-9);
        let report = measurer.report();
        assert!(report.unavailable);
        assert!(!report.rate_limited);
        assert_eq!(report.estimated_legs, 1);
    }

    #[tokio::test]
    async fn zero_distance_answer_is_estimated() {
        let stub = StaticDirections::new();
        let measurer = LegMeasurer::new(&stub, 1.3);
        let a = c(24.8482, 67.0305);

        let d = measurer.measure(a, a, Profile::Driving).await;

        assert_eq!(d.provenance(), Provenance::Estimated);
        assert_eq!(d.meters(), 0.0);
    }

    #[tokio::test]
    async fn rate_limit_stops_further_calls() {
        let stub = StaticDirections::new().failing_with(DirectionsError::RateLimited);
        let measurer = LegMeasurer::new(&stub, 1.3);

        measurer
            .measure(c(24.86, 67.00), c(24.85, 67.03), Profile::Driving)
            .await;
        let d = measurer
            .measure(c(24.87, 67.01), c(24.84, 67.02), Profile::Driving)
            .await;

        assert!(!d.is_measured());
        assert_eq!(stub.calls(), 1);
        let report = measurer.report();
        assert!(report.rate_limited);
        assert_eq!(report.calls_attempted, 1);
        assert_eq!(report.estimated_legs, 2);
    }
}
