//! Deterministic in-process directions provider.
//!
//! Answers every request from straight-line distance times a fixed road
//! factor, at a fixed speed per profile. Used for offline development and
//! in tests, where failures can be scripted per request.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::domain::Coordinates;
use crate::geomath;

use super::DirectionsPort;
use super::error::DirectionsError;
use super::types::{Profile, RouteEstimate};

/// Default detour factor applied to straight-line distance.
const DEFAULT_FACTOR: f64 = 1.25;

type FailureRule = Box<dyn Fn(Coordinates, Coordinates, Profile) -> Option<DirectionsError> + Send + Sync>;

/// A recorded request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedRequest {
    pub origin: Coordinates,
    pub destination: Coordinates,
    pub profile: Profile,
}

/// Directions provider that computes answers locally.
///
/// Identical requests always get identical answers, which makes planner
/// output reproducible.
pub struct StaticDirections {
    factor: f64,
    rules: Vec<FailureRule>,
    calls: AtomicUsize,
    log: Mutex<Vec<RecordedRequest>>,
}

impl StaticDirections {
    /// Create a provider with the default detour factor.
    pub fn new() -> Self {
        Self {
            factor: DEFAULT_FACTOR,
            rules: Vec::new(),
            calls: AtomicUsize::new(0),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Use a different detour factor.
    pub fn with_factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    /// Fail every request with `error`.
    pub fn failing_with(self, error: DirectionsError) -> Self {
        self.with_rule(move |_, _, _| Some(error.clone()))
    }

    /// Fail requests for which `rule` returns an error.
    ///
    /// Rules are checked in the order they were added.
    pub fn with_rule<F>(mut self, rule: F) -> Self
    where
        F: Fn(Coordinates, Coordinates, Profile) -> Option<DirectionsError> + Send + Sync + 'static,
    {
        self.rules.push(Box::new(rule));
        self
    }

    /// Number of requests received (including failed ones).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of requests received for one profile.
    pub fn calls_for(&self, profile: Profile) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.profile == profile)
            .count()
    }

    /// All requests received, in arrival order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        match self.log.lock() {
            Ok(log) => log.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn speed_mps(profile: Profile) -> f64 {
        let kmh = match profile {
            Profile::Walking => 5.0,
            Profile::Cycling => 15.0,
            Profile::Driving => 30.0,
        };
        kmh / 3.6
    }

    fn answer(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        profile: Profile,
    ) -> Result<RouteEstimate, DirectionsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let request = RecordedRequest {
            origin,
            destination,
            profile,
        };
        match self.log.lock() {
            Ok(mut log) => log.push(request),
            Err(poisoned) => poisoned.into_inner().push(request),
        }

        if let Some(err) = self
            .rules
            .iter()
            .find_map(|rule| rule(origin, destination, profile))
        {
            return Err(err);
        }

        let distance = geomath::distance(origin, destination) * self.factor;
        Ok(RouteEstimate::new(distance, distance / Self::speed_mps(profile)))
    }
}

impl Default for StaticDirections {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectionsPort for StaticDirections {
    async fn route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        profile: Profile,
    ) -> Result<RouteEstimate, DirectionsError> {
        self.answer(origin, destination, profile)
    }
}
