//! Remote payload schemas and validation.
//!
//! The analytics service returns loosely-typed JSON. Payloads are
//! deserialised into strict structs here, then checked and coerced
//! before anything reaches the canonical model:
//!
//! - non-finite sentiment score → rejected
//! - score outside [-1, 1] → clamped
//! - unknown or blank status → derived from the score
//! - movers / grid rows with a blank ticker or non-finite numbers → dropped
//! - a supplied grid `quadrant` label → ignored, recomputed from (x, y)

use serde::Deserialize;
use tracing::{debug, warn};

use crate::analytics::quadrant::classify;
use crate::analytics::sentiment::status_for_score;
use crate::types::{CommandCenterError, InstrumentPoint, LeaderEntry, Quadrant, SentimentStatus};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// `GET /api/dashboard/sentiment`
#[derive(Debug, Clone, Deserialize)]
pub struct SentimentPayload {
    #[serde(default)]
    pub market_status: String,
    pub market_score: f64,
    #[serde(default)]
    pub market_color: String,
    #[serde(default)]
    pub top_movers: Vec<MoverPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoverPayload {
    #[serde(default)]
    pub ticker: String,
    pub score: Option<f64>,
    #[serde(default)]
    pub action: Option<String>,
}

/// `POST /api/dashboard/rrg`
#[derive(Debug, Clone, Deserialize)]
pub struct RotationGridPayload {
    #[serde(default)]
    pub data: Vec<GridRowPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GridRowPayload {
    #[serde(default)]
    pub ticker: String,
    pub x: Option<f64>,
    pub y: Option<f64>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub quadrant: Option<String>,
}

// ---------------------------------------------------------------------------
// Validated forms
// ---------------------------------------------------------------------------

/// A sentiment payload that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSentiment {
    pub status: SentimentStatus,
    pub score: f64,
    pub color: String,
    pub top_movers: Vec<LeaderEntry>,
}

impl SentimentPayload {
    pub fn validate(self) -> Result<ValidatedSentiment, CommandCenterError> {
        if !self.market_score.is_finite() {
            return Err(CommandCenterError::Schema(format!(
                "market_score is not finite: {}",
                self.market_score
            )));
        }

        let score = if (-1.0..=1.0).contains(&self.market_score) {
            self.market_score
        } else {
            warn!(score = self.market_score, "market_score outside [-1, 1], clamping");
            self.market_score.clamp(-1.0, 1.0)
        };

        let status = match self.market_status.parse::<SentimentStatus>() {
            Ok(s) => s,
            Err(_) => {
                let derived = status_for_score(score);
                warn!(
                    raw = %self.market_status,
                    derived = %derived,
                    "Unrecognised market_status, deriving from score"
                );
                derived
            }
        };

        let color = match self.market_color.trim() {
            "" => status.color().to_string(),
            c => c.to_string(),
        };

        let total_movers = self.top_movers.len();
        let top_movers: Vec<LeaderEntry> = self
            .top_movers
            .into_iter()
            .filter_map(MoverPayload::validate)
            .collect();
        if top_movers.len() < total_movers {
            debug!(
                dropped = total_movers - top_movers.len(),
                "Dropped malformed top movers"
            );
        }

        Ok(ValidatedSentiment {
            status,
            score,
            color,
            top_movers,
        })
    }
}

impl MoverPayload {
    fn validate(self) -> Option<LeaderEntry> {
        let ticker = self.ticker.trim();
        if ticker.is_empty() {
            return None;
        }
        let score = self.score.filter(|s| s.is_finite())?;
        let action = self
            .action
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());

        Some(LeaderEntry {
            ticker: ticker.to_string(),
            score: Some(score),
            action,
        })
    }
}

impl RotationGridPayload {
    /// Convert to canonical points, dropping rows that cannot be placed.
    pub fn into_points(self) -> Vec<InstrumentPoint> {
        let total = self.data.len();
        let points: Vec<InstrumentPoint> =
            self.data.into_iter().filter_map(GridRowPayload::into_point).collect();
        if points.len() < total {
            debug!(dropped = total - points.len(), "Dropped malformed grid rows");
        }
        points
    }
}

impl GridRowPayload {
    fn into_point(self) -> Option<InstrumentPoint> {
        let ticker = self.ticker.trim();
        if ticker.is_empty() {
            return None;
        }
        let x = self.x.filter(|v| v.is_finite())?;
        let y = self.y.filter(|v| v.is_finite())?;

        let computed = classify(x, y);
        if let Some(label) = self.quadrant.as_deref() {
            match label.parse::<Quadrant>() {
                Ok(q) if q == computed => {}
                _ => debug!(
                    ticker,
                    supplied = label,
                    computed = %computed,
                    "Remote quadrant disagrees with (x, y), using computed"
                ),
            }
        }

        Some(InstrumentPoint::new(ticker, self.group.as_deref(), x, y))
    }
}
