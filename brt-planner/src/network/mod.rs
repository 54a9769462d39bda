//! Transit network: the stop/route dataset and its in-memory graph.
//!
//! The graph is loaded once and treated as read-only. A data refresh builds
//! a fresh graph and replaces the old one through [`NetworkStore`].

mod dataset;
mod error;
mod graph;
mod store;

pub use dataset::{NetworkDataset, RouteRecord, StopRecord};
pub use error::{DataIntegrityError, NetworkError};
pub use graph::TransitGraph;
pub use store::NetworkStore;
