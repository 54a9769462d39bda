//! Configuration for the journey planner.

use crate::geomath::{ModeThresholds, ROAD_NETWORK_FACTOR};

/// Configuration parameters for journey planning.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Maximum number of candidate stops refined with provider calls per
    /// stage (K).
    pub candidate_limit: usize,

    /// Pre-filter radius when checking whether the destination is already
    /// at a stop (metres).
    pub exact_stop_radius_m: f64,

    /// Pre-filter radius when looking for the stop nearest the destination
    /// (metres).
    pub nearest_stop_radius_m: f64,

    /// Boarding stops further than this from the user are not considered
    /// (metres).
    pub boarding_radius_m: f64,

    /// A point is "at" a stop when the refined distance is within this
    /// (metres). Absorbs GPS error.
    pub exact_stop_threshold_m: f64,

    /// Factor turning straight-line distance into an estimated road distance.
    pub road_network_factor: f64,

    /// Distance thresholds for choosing walk, rickshaw or ride-hail.
    pub modes: ModeThresholds,

    /// Provider durations that differ from the local estimate by more than
    /// this factor are logged.
    pub duration_disagreement_factor: f64,
}

impl PlannerConfig {
    /// Set K.
    pub fn with_candidate_limit(mut self, k: usize) -> Self {
        self.candidate_limit = k;
        self
    }

    /// Set both pre-filter radii.
    pub fn with_radii(mut self, exact_stop_m: f64, nearest_stop_m: f64) -> Self {
        self.exact_stop_radius_m = exact_stop_m;
        self.nearest_stop_radius_m = nearest_stop_m;
        self
    }

    /// Set how far from the user a boarding stop may be.
    pub fn with_boarding_radius(mut self, meters: f64) -> Self {
        self.boarding_radius_m = meters;
        self
    }

    /// Set the exact-stop threshold.
    pub fn with_exact_stop_threshold(mut self, meters: f64) -> Self {
        self.exact_stop_threshold_m = meters;
        self
    }

    /// Set the road-network factor.
    pub fn with_road_network_factor(mut self, factor: f64) -> Self {
        self.road_network_factor = factor;
        self
    }

    /// Set the access-mode thresholds.
    pub fn with_modes(mut self, modes: ModeThresholds) -> Self {
        self.modes = modes;
        self
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            candidate_limit: 3,
            exact_stop_radius_m: 1_000.0,
            nearest_stop_radius_m: 10_000.0,
            boarding_radius_m: 10_000.0,
            exact_stop_threshold_m: 200.0,
            road_network_factor: ROAD_NETWORK_FACTOR,
            modes: ModeThresholds::default(),
            duration_disagreement_factor: 3.0,
        }
    }
}
