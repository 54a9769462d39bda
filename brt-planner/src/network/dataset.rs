//! Serialized form of the transit network.
//!
//! The dataset is a list of routes, each an ordered list of stops. The
//! order of stops inside a route is the authoritative direction of travel.
//!
//! ```json
//! {
//!   "routes": [
//!     {
//!       "name": "Red Line",
//!       "color": "#E4002B",
//!       "stops": [
//!         { "id": "JC", "name": "Jama Cloth", "lat": 24.8635, "lng": 67.0050 },
//!         { "id": "FH", "name": "Frere Hall", "lat": 24.8482, "lng": 67.0305,
//!           "routes": ["Red Line"] }
//!       ]
//!     }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

/// Top-level network dataset.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NetworkDataset {
    pub routes: Vec<RouteRecord>,
}

/// One route and its stops in travel order.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub stops: Vec<StopRecord>,
}

/// A stop as listed within a route.
///
/// `routes` is the set of routes the dataset says serve this stop. It may
/// be omitted; the routes that actually list the stop are always added.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StopRecord {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<String>,
}
