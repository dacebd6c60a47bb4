//! Market sentiment aggregation.
//!
//! Two mutually exclusive modes: a live pass-through of the remote
//! service's pre-aggregated reading, and a manual breadth score
//! synthesised from an imported snapshot.

use tracing::debug;

use crate::ingest::remote::ValidatedSentiment;
use crate::types::{InstrumentPoint, Provenance, SentimentSnapshot, SentimentStatus, BASELINE};

/// Scores strictly beyond ±BAND are directional; the band itself is Sideways.
pub const SENTIMENT_BAND: f64 = 0.2;

/// Map a breadth score to a status. Both boundaries are exclusive.
pub fn status_for_score(score: f64) -> SentimentStatus {
    if score > SENTIMENT_BAND {
        SentimentStatus::Bullish
    } else if score < -SENTIMENT_BAND {
        SentimentStatus::Bearish
    } else {
        SentimentStatus::Sideways
    }
}

/// Live mode: pass the validated remote reading through.
pub fn from_remote(payload: &ValidatedSentiment) -> SentimentSnapshot {
    SentimentSnapshot {
        status: payload.status,
        score: payload.score,
        color: payload.color.clone(),
        provenance: Provenance::Live,
    }
}

/// Manual mode: `score = (bullish / total) * 2 - 1`, bullish meaning `x > 100`.
///
/// An empty snapshot yields a neutral reading instead of dividing by zero.
pub fn from_points(points: &[InstrumentPoint]) -> SentimentSnapshot {
    let total = points.len();
    let bullish = points.iter().filter(|p| p.x > BASELINE).count();

    let score = if total == 0 {
        0.0
    } else {
        // Same value as (bullish / total) * 2 - 1, without the intermediate rounding.
        (2.0 * bullish as f64 - total as f64) / total as f64
    };
    let status = status_for_score(score);

    debug!(total, bullish, score, status = %status, "Manual sentiment computed");

    SentimentSnapshot {
        status,
        score,
        color: status.color().to_string(),
        provenance: Provenance::Manual,
    }
}
