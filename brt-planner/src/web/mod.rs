//! Web layer for the BRT journey planner.
//!
//! Provides JSON endpoints for stop lookup and journey planning.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::{AppState, SharedDirections};
