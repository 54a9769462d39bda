//! Bus stop types.

use std::collections::BTreeSet;
use std::fmt;

use super::Coordinates;

/// Error returned when parsing an invalid stop identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid stop id: {reason}")]
pub struct InvalidStopId {
    reason: &'static str,
}

/// Stable identifier of a bus stop.
///
/// Ids are opaque strings from the network dataset. They are trimmed and
/// must be non-empty.
///
/// # Examples
///
/// ```
/// use brt_planner::domain::StopId;
///
/// let id = StopId::parse(" GL-14 ").unwrap();
/// assert_eq!(id.as_str(), "GL-14");
/// assert!(StopId::parse("   ").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StopId(String);

impl StopId {
    /// Parse a stop id, trimming surrounding whitespace.
    pub fn parse(s: &str) -> Result<Self, InvalidStopId> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(InvalidStopId {
                reason: "must not be empty",
            });
        }
        Ok(StopId(trimmed.to_string()))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StopId({})", self.0)
    }
}

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A bus stop in the transit network.
///
/// Stops are created once when the network is loaded and never mutated
/// afterwards. `routes` lists every route serving the stop, in name order.
#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    /// Stable identifier, unique across the network
    pub id: StopId,
    /// Display name
    pub name: String,
    /// Location of the stop
    pub coordinates: Coordinates,
    /// Names of the routes serving this stop
    pub routes: BTreeSet<String>,
}

impl Stop {
    /// Create a stop that is not yet served by any route.
    pub fn new(id: StopId, name: impl Into<String>, coordinates: Coordinates) -> Self {
        Self {
            id,
            name: name.into(),
            coordinates,
            routes: BTreeSet::new(),
        }
    }

    /// Returns true if the named route serves this stop.
    pub fn is_served_by(&self, route: &str) -> bool {
        self.routes.contains(route)
    }
}
