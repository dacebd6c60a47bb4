//! Command Center — RRG snapshot reconciliation and market analytics.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod ingest;
pub mod analytics;
pub mod feed;
pub mod engine;
pub mod dashboard;
