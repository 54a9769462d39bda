//! Journey planner for the BRT network.
//!
//! This module answers: "I'm standing here and want to get there - which
//! stop should I board at, and which bus takes me?"
//!
//! Candidate stops are narrowed by straight-line distance first, and only
//! the best few are refined with road distances from the directions
//! provider. Any provider failure falls back to local estimates.

mod boarding;
mod candidates;
mod config;
mod instructions;
mod measure;
mod plan;

pub use boarding::{BoardingChoice, BoardingSelection, BoardingSelector, SelectionError};
pub use candidates::{Candidate, RefinedCandidate, SearchMode, find_stop, prefilter, refine};
pub use config::PlannerConfig;
pub use instructions::{format_distance, format_duration, render};
pub use measure::{LegMeasurer, ProviderReport};
pub use plan::{
    PlanError, PlanOutcome, PlanRequest, PlanStage, PlanStatus, Planner, WalkOnlyReason,
};
