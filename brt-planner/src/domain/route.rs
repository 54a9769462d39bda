//! Bus route types.

use super::StopId;

/// A fixed bus route.
///
/// `stops` is the physical travel order declared by the network dataset.
/// It is the single source of truth for whether one stop comes before
/// another on this route, so it is never re-sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusRoute {
    /// Unique route name (e.g. "Green Line")
    pub name: String,
    /// Stops in travel order
    pub stops: Vec<StopId>,
    /// Optional display colour, as given by the dataset
    pub color: Option<String>,
}

impl BusRoute {
    /// Create a route from its ordered stop ids.
    pub fn new(name: impl Into<String>, stops: Vec<StopId>, color: Option<String>) -> Self {
        Self {
            name: name.into(),
            stops,
            color,
        }
    }

    /// Number of stops on the route.
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    /// Returns true if the route has no stops.
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// First stop in travel order.
    pub fn origin(&self) -> Option<&StopId> {
        self.stops.first()
    }

    /// Last stop in travel order.
    pub fn terminus(&self) -> Option<&StopId> {
        self.stops.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> StopId {
        StopId::parse(s).unwrap()
    }

    #[test]
    fn keeps_declared_order() {
        let route = BusRoute::new("Red Line", vec![id("C"), id("A"), id("B")], None);
        assert_eq!(route.origin(), Some(&id("C")));
        assert_eq!(route.terminus(), Some(&id("B")));
        assert_eq!(route.len(), 3);
    }

    #[test]
    fn empty_route() {
        let route = BusRoute::new("Ghost", vec![], Some("#000000".into()));
        assert!(route.is_empty());
        assert!(route.origin().is_none());
        assert!(route.terminus().is_none());
    }
}
