//! Background data sources.
//!
//! Defines the `SnapshotFeed` trait, the seam between the controller and
//! the remote analytics service. `http` provides the reqwest-backed
//! implementation; tests substitute their own.

pub mod http;

use anyhow::Result;
use async_trait::async_trait;

use crate::ingest::remote::ValidatedSentiment;
use crate::types::InstrumentPoint;

/// Abstraction over the remote rotation/sentiment service.
///
/// Implementors return payloads that have already passed schema
/// validation. Failures should be `CommandCenterError`s wrapped in
/// `anyhow` so the controller can tell transport faults from bad data.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotFeed: Send + Sync {
    /// Fetch the pre-aggregated market sentiment and top movers.
    async fn fetch_sentiment(&self) -> Result<ValidatedSentiment>;

    /// Fetch the rotation-grid dataset as canonical points.
    async fn fetch_rotation_grid(&self) -> Result<Vec<InstrumentPoint>>;

    /// Source name for logging.
    fn name(&self) -> &str;
}
