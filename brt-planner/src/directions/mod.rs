//! Road directions provider.
//!
//! The planner only sees [`DirectionsPort`]. Implementations:
//! - [`HttpDirections`]: an OSRM-compatible HTTP service
//! - [`StaticDirections`]: deterministic local answers (offline mode, tests)
//!
//! Providers are composed by wrapping: a [`GuardedDirections`] applies the
//! process-wide [`RequestBudget`], timeouts and retries, and
//! [`CachedDirections`](crate::cache::CachedDirections) sits in front of it
//! so repeated questions cost nothing.

mod budget;
mod client;
mod error;
mod guard;
mod mock;
mod types;

use std::future::Future;
use std::sync::Arc;

use crate::domain::Coordinates;

pub use budget::{DEFAULT_QUOTA_PER_MINUTE, RequestBudget};
pub use client::{DirectionsConfig, HttpDirections};
pub use error::DirectionsError;
pub use guard::{GuardConfig, GuardedDirections};
pub use mock::{RecordedRequest, StaticDirections};
pub use types::{Geometry, OsrmResponse, OsrmRoute, Profile, RouteEstimate};

/// Answers "how far by road, and how long" for one origin/destination pair.
pub trait DirectionsPort: Send + Sync {
    fn route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        profile: Profile,
    ) -> impl Future<Output = Result<RouteEstimate, DirectionsError>> + Send;
}

impl<P: DirectionsPort> DirectionsPort for Arc<P> {
    fn route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        profile: Profile,
    ) -> impl Future<Output = Result<RouteEstimate, DirectionsError>> + Send {
        (**self).route(origin, destination, profile)
    }
}

/// Either backend, chosen at startup.
pub enum AnyDirections {
    Http(HttpDirections),
    Offline(StaticDirections),
}

impl AnyDirections {
    /// Short name for logs and the budget endpoint.
    pub fn name(&self) -> &'static str {
        match self {
            AnyDirections::Http(_) => "http",
            AnyDirections::Offline(_) => "offline",
        }
    }
}

impl DirectionsPort for AnyDirections {
    async fn route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        profile: Profile,
    ) -> Result<RouteEstimate, DirectionsError> {
        match self {
            AnyDirections::Http(client) => client.route(origin, destination, profile).await,
            AnyDirections::Offline(stub) => stub.route(origin, destination, profile).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shared_port_delegates() {
        let stub = Arc::new(StaticDirections::new());
        let shared = Arc::clone(&stub);
        let a = Coordinates::new(24.8607, 67.0011).unwrap();
        let b = Coordinates::new(24.8482, 67.0305).unwrap();

        shared.route(a, b, Profile::Driving).await.unwrap();
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn offline_backend_delegates() {
        let port = AnyDirections::Offline(StaticDirections::new());
        assert_eq!(port.name(), "offline");

        let a = Coordinates::new(24.8607, 67.0011).unwrap();
        let b = Coordinates::new(24.8482, 67.0305).unwrap();
        let estimate = port.route(a, b, Profile::Walking).await.unwrap();
        assert!(estimate.distance_meters > 0.0);
    }
}
