//! Dashboard API route handlers.
//!
//! All endpoints return JSON. The controller is shared via
//! `Arc<SnapshotController>`; handlers only read the published bundle,
//! except `POST /api/import`, which is the user's manual import action.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::engine::controller::{ImportSummary, SnapshotController};
use crate::types::{FeedStatus, Phase, Quadrant, SnapshotBundle};

pub type AppState = Arc<SnapshotController>;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ImportResponse {
    pub accepted: usize,
    pub skipped: usize,
    pub locked_gate: bool,
    pub bundle: SnapshotBundle,
}

impl From<ImportSummary> for ImportResponse {
    fn from(s: ImportSummary) -> Self {
        Self {
            accepted: s.accepted,
            skipped: s.skipped,
            locked_gate: s.locked_gate,
            bundle: s.bundle,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuadrantCount {
    pub quadrant: Quadrant,
    pub count: usize,
}

/// Compact view of the bundle for status badges.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryResponse {
    pub phase: Phase,
    pub revision: u64,
    pub sentiment_feed: FeedStatus,
    pub grid_feed: FeedStatus,
    pub quadrants: Vec<QuadrantCount>,
}

impl From<&SnapshotBundle> for SummaryResponse {
    fn from(b: &SnapshotBundle) -> Self {
        Self {
            phase: b.phase,
            revision: b.revision,
            sentiment_feed: b.sentiment_feed,
            grid_feed: b.grid_feed,
            quadrants: b
                .quadrant_counts()
                .into_iter()
                .map(|(quadrant, count)| QuadrantCount { quadrant, count })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/snapshot
pub async fn get_snapshot(State(state): State<AppState>) -> Json<SnapshotBundle> {
    Json(state.snapshot())
}

/// GET /api/summary
pub async fn get_summary(State(state): State<AppState>) -> Json<SummaryResponse> {
    Json(SummaryResponse::from(&state.snapshot()))
}

/// POST /api/import — body is the raw CSV text.
///
/// An empty body is still an import: it locks the gate and publishes the
/// neutral snapshot.
pub async fn post_import(State(state): State<AppState>, body: String) -> Json<ImportResponse> {
    Json(state.import_csv(&body).into())
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
