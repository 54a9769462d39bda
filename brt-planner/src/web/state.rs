//! Application state for the web layer.

use std::sync::Arc;

use crate::cache::CachedDirections;
use crate::directions::{AnyDirections, GuardedDirections, RequestBudget};
use crate::network::NetworkStore;
use crate::planner::PlannerConfig;

/// The directions stack every request plans against: cache, then budget
/// guard, then the configured provider.
pub type SharedDirections = CachedDirections<GuardedDirections<AnyDirections>>;

/// Shared application state.
///
/// Contains all the services needed to handle requests.
#[derive(Clone)]
pub struct AppState {
    /// Reloadable transit network
    pub network: NetworkStore,

    /// Cached, budget-guarded directions provider
    pub directions: Arc<SharedDirections>,

    /// Journey planner configuration
    pub config: Arc<PlannerConfig>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(network: NetworkStore, directions: SharedDirections, config: PlannerConfig) -> Self {
        Self {
            network,
            directions: Arc::new(directions),
            config: Arc::new(config),
        }
    }

    /// The process-wide provider budget.
    pub fn budget(&self) -> &RequestBudget {
        self.directions.inner().budget()
    }

    /// Name of the provider behind the cache and guard.
    pub fn provider_name(&self) -> &'static str {
        self.directions.inner().inner().name()
    }
}
