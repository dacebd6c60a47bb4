//! Derived analytics over canonical instrument points.
//!
//! All functions here are synchronous and side-effect free:
//! quadrant classification, market sentiment, and leader ranking.

pub mod quadrant;
pub mod sentiment;
pub mod leaders;
