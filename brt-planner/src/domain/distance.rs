//! Distances tagged with where they came from.

use std::fmt;

/// Where a distance value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provenance {
    /// The directions provider answered for this leg.
    Measured,
    /// Derived locally from straight-line distance and the road factor.
    Estimated,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Measured => f.write_str("measured"),
            Provenance::Estimated => f.write_str("estimated"),
        }
    }
}

/// A road distance in metres together with its provenance.
///
/// Measured distances also keep the provider's duration, which is only
/// ever used as a cross-check against the local speed heuristics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadDistance {
    meters: f64,
    provenance: Provenance,
    provider_duration_secs: Option<f64>,
}

impl RoadDistance {
    /// A distance reported by the directions provider.
    pub fn measured(meters: f64, duration_secs: f64) -> Self {
        Self {
            meters,
            provenance: Provenance::Measured,
            provider_duration_secs: Some(duration_secs),
        }
    }

    /// A locally estimated distance.
    pub fn estimated(meters: f64) -> Self {
        Self {
            meters,
            provenance: Provenance::Estimated,
            provider_duration_secs: None,
        }
    }

    /// Distance in metres.
    pub fn meters(&self) -> f64 {
        self.meters
    }

    /// Where the distance came from.
    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    /// Returns true if the provider answered for this distance.
    pub fn is_measured(&self) -> bool {
        self.provenance == Provenance::Measured
    }

    /// Duration reported by the provider, if measured.
    pub fn provider_duration_secs(&self) -> Option<f64> {
        self.provider_duration_secs
    }

    /// Sum of two distances. The result is measured only if both are.
    pub fn combine(&self, other: &RoadDistance) -> RoadDistance {
        match (self.provider_duration_secs, other.provider_duration_secs) {
            (Some(a), Some(b)) => RoadDistance::measured(self.meters + other.meters, a + b),
            _ => RoadDistance::estimated(self.meters + other.meters),
        }
    }
}
