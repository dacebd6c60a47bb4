//! Integration tests for the Command Center engine.

mod fake_feed;
mod reconciliation;
