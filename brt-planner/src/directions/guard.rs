//! Budget, timeout and retry policy around a directions provider.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::Coordinates;

use super::DirectionsPort;
use super::budget::RequestBudget;
use super::error::DirectionsError;
use super::types::{Profile, RouteEstimate};

/// Retry and timeout policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuardConfig {
    /// Upper bound on a single attempt
    pub timeout: Duration,
    /// Extra attempts after the first, for retryable failures only
    pub max_retries: u32,
    /// Base backoff; attempt `n` waits `n * backoff`
    pub backoff: Duration,
}

impl GuardConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            max_retries: 2,
            backoff: Duration::from_millis(250),
        }
    }
}

/// A directions provider wrapped with the shared request budget.
///
/// Every attempt, retries included, takes one call from the budget. When
/// the budget is exhausted the call fails with
/// [`DirectionsError::RateLimited`] without reaching the provider.
pub struct GuardedDirections<P> {
    inner: P,
    budget: Arc<RequestBudget>,
    config: GuardConfig,
}

impl<P: DirectionsPort> GuardedDirections<P> {
    pub fn new(inner: P, budget: Arc<RequestBudget>) -> Self {
        Self {
            inner,
            budget,
            config: GuardConfig::default(),
        }
    }

    pub fn with_config(mut self, config: GuardConfig) -> Self {
        self.config = config;
        self
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn budget(&self) -> &Arc<RequestBudget> {
        &self.budget
    }

    async fn attempt(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        profile: Profile,
    ) -> Result<RouteEstimate, DirectionsError> {
        if !self.budget.try_acquire() {
            debug!(quota = self.budget.quota(), "Directions budget exhausted");
            return Err(DirectionsError::RateLimited);
        }

        let estimate =
            match tokio::time::timeout(self.config.timeout, self.inner.route(origin, destination, profile))
                .await
            {
                Ok(result) => result?,
                Err(_) => {
                    return Err(DirectionsError::ProviderUnavailable(format!(
                        "timed out after {}ms",
                        self.config.timeout.as_millis()
                    )));
                }
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
}

impl<P: DirectionsPort> DirectionsPort for GuardedDirections<P> {
    async fn route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        profile: Profile,
    ) -> Result<RouteEstimate, DirectionsError> {
        let mut retries = 0;
        loop {
            match self.attempt(origin, destination, profile).await {
                Err(e) if e.is_retryable() && retries < self.config.max_retries => {
                    retries += 1;
                    warn!(
                        attempt = retries,
                        error = %e,
                        %origin,
                        %destination,
                        "Directions request failed, retrying"
                    );
                    tokio::time::sleep(self.config.backoff * retries).await;
                }
                result => return result,
            }
        }
    }
}
