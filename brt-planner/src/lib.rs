//! BRT journey planner server.
//!
//! A web application that answers: "I'm standing here and want to get
//! there - which bus stop do I walk to, and which bus do I take?"

pub mod cache;
pub mod directions;
pub mod domain;
pub mod geomath;
pub mod network;
pub mod planner;
pub mod web;
