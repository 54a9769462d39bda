//! Domain types for the BRT journey planner.
//!
//! This module contains the core domain model: validated coordinates,
//! stops, routes and journeys. All types enforce their invariants at
//! construction time, so code that receives them can trust their validity.

mod coords;
mod distance;
mod error;
mod journey;
mod route;
mod stop;

pub use coords::{Coordinates, InvalidCoordinates};
pub use distance::{Provenance, RoadDistance};
pub use error::DomainError;
pub use journey::{Journey, JourneySegment, TransitParts, Waypoint};
pub use route::BusRoute;
pub use stop::{InvalidStopId, Stop, StopId};
