//! Shared types for the Command Center engine.
//!
//! These types form the canonical data model used across ingestion,
//! analytics, and the controller. Everything the rendering layer sees
//! is reachable from [`SnapshotBundle`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parity line for both RS-Ratio and RS-Momentum.
pub const BASELINE: f64 = 100.0;

/// Group assigned to instruments that arrive without one.
pub const DEFAULT_GROUP: &str = "Unclassified";

// ---------------------------------------------------------------------------
// Quadrant
// ---------------------------------------------------------------------------

/// RRG quadrant of an instrument's (strength, momentum) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quadrant {
    Leading,
    Weakening,
    Lagging,
    Improving,
}

impl Quadrant {
    pub const ALL: &'static [Quadrant] = &[
        Quadrant::Leading,
        Quadrant::Weakening,
        Quadrant::Lagging,
        Quadrant::Improving,
    ];

    /// Display hint for the chart layer.
    pub fn color(&self) -> &'static str {
        match self {
            Quadrant::Leading => "#00e676",
            Quadrant::Weakening => "#ffea00",
            Quadrant::Lagging => "#ff1744",
            Quadrant::Improving => "#2979ff",
        }
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quadrant::Leading => write!(f, "Leading"),
            Quadrant::Weakening => write!(f, "Weakening"),
            Quadrant::Lagging => write!(f, "Lagging"),
            Quadrant::Improving => write!(f, "Improving"),
        }
    }
}

/// Case-insensitive parse, used to compare against remotely supplied labels.
impl std::str::FromStr for Quadrant {
    type Err = CommandCenterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "leading" => Ok(Quadrant::Leading),
            "weakening" => Ok(Quadrant::Weakening),
            "lagging" => Ok(Quadrant::Lagging),
            "improving" => Ok(Quadrant::Improving),
            other => Err(CommandCenterError::Schema(format!("unknown quadrant: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Instruments
// ---------------------------------------------------------------------------

/// One instrument on the rotation grid, after normalisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentPoint {
    pub ticker: String,
    pub group: String,
    /// RS-Ratio
    pub x: f64,
    /// RS-Momentum
    pub y: f64,
    pub quadrant: Quadrant,
}

impl InstrumentPoint {
    /// Build a point, classifying it and defaulting a blank group.
    pub fn new(ticker: impl Into<String>, group: Option<&str>, x: f64, y: f64) -> Self {
        let group = match group.map(str::trim) {
            Some(g) if !g.is_empty() => g.to_string(),
            _ => DEFAULT_GROUP.to_string(),
        };
        Self {
            ticker: ticker.into(),
            group,
            x,
            y,
            quadrant: crate::analytics::quadrant::classify(x, y),
        }
    }

    /// Combined strength + momentum, the leader ranking key.
    pub fn strength(&self) -> f64 {
        self.x + self.y
    }
}

impl fmt::Display for InstrumentPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] ({:.2}, {:.2}) {}",
            self.ticker, self.group, self.x, self.y, self.quadrant
        )
    }
}

// ---------------------------------------------------------------------------
// Sentiment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentStatus {
    Bullish,
    Bearish,
    Sideways,
}

impl SentimentStatus {
    pub fn color(&self) -> &'static str {
        match self {
            SentimentStatus::Bullish => "#00e676",
            SentimentStatus::Bearish => "#ff1744",
            SentimentStatus::Sideways => "#ffd700",
        }
    }
}

impl fmt::Display for SentimentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SentimentStatus::Bullish => write!(f, "Bullish"),
            SentimentStatus::Bearish => write!(f, "Bearish"),
            SentimentStatus::Sideways => write!(f, "Sideways"),
        }
    }
}

impl std::str::FromStr for SentimentStatus {
    type Err = CommandCenterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bullish" | "bull" => Ok(SentimentStatus::Bullish),
            "bearish" | "bear" => Ok(SentimentStatus::Bearish),
            "sideways" | "neutral" => Ok(SentimentStatus::Sideways),
            other => Err(CommandCenterError::Schema(format!("unknown market status: {other}"))),
        }
    }
}

/// Where displayed data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provenance {
    Live,
    Manual,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Live => write!(f, "LIVE"),
            Provenance::Manual => write!(f, "MANUAL"),
        }
    }
}

/// Market-wide sentiment reading. `score` is always finite and in [-1, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSnapshot {
    pub status: SentimentStatus,
    pub score: f64,
    pub color: String,
    pub provenance: Provenance,
}

impl fmt::Display for SentimentSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:+.2} ({})", self.status, self.score, self.provenance)
    }
}

// ---------------------------------------------------------------------------
// Leaders
// ---------------------------------------------------------------------------

/// A ranked leader. Manual snapshots carry only the ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderEntry {
    pub ticker: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl LeaderEntry {
    pub fn ticker_only(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            score: None,
            action: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Reconciliation state
// ---------------------------------------------------------------------------

/// Which source is authoritative for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Live,
    ManualLocked,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Live => write!(f, "LIVE"),
            Phase::ManualLocked => write!(f, "MANUAL (locked)"),
        }
    }
}

/// Progress of one background source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedStatus {
    Loading,
    Ready,
    /// Transport failure; stays until a manual import supersedes it.
    Unavailable,
    /// Result discarded (or never awaited) because a manual snapshot won.
    Superseded,
}

// ---------------------------------------------------------------------------
// Published bundle
// ---------------------------------------------------------------------------

/// The single derived-state bundle handed to the rendering layer.
///
/// Always replaced as a whole value; readers never see a mix of two
/// publishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotBundle {
    pub points: Vec<InstrumentPoint>,
    /// `None` while the sentiment source is loading or unavailable.
    pub sentiment: Option<SentimentSnapshot>,
    pub leaders: Vec<LeaderEntry>,
    pub phase: Phase,
    pub sentiment_feed: FeedStatus,
    pub grid_feed: FeedStatus,
    pub revision: u64,
    pub updated_at: DateTime<Utc>,
}

impl SnapshotBundle {
    /// Session start: live phase, both sources loading.
    pub fn initial() -> Self {
        Self {
            points: Vec::new(),
            sentiment: None,
            leaders: Vec::new(),
            phase: Phase::Live,
            sentiment_feed: FeedStatus::Loading,
            grid_feed: FeedStatus::Loading,
            revision: 0,
            updated_at: Utc::now(),
        }
    }

    /// Count of points per quadrant, in `Quadrant::ALL` order.
    pub fn quadrant_counts(&self) -> Vec<(Quadrant, usize)> {
        Quadrant::ALL
            .iter()
            .map(|&q| (q, self.points.iter().filter(|p| p.quadrant == q).count()))
            .collect()
    }
}

impl fmt::Display for SnapshotBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sentiment = self
            .sentiment
            .as_ref()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "n/a".to_string());
        write!(
            f,
            "rev {} | {} | {} points | {} leaders | sentiment {}",
            self.revision,
            self.phase,
            self.points.len(),
            self.leaders.len(),
            sentiment,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for the Command Center engine.
#[derive(Debug, thiserror::Error)]
pub enum CommandCenterError {
    #[error("Transport error ({source_name}): {message}")]
    Transport { source_name: String, message: String },

    #[error("Request rejected ({source_name}): HTTP {status}: {message}")]
    Rejected { source_name: String, status: u16, message: String },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CommandCenterError {
    /// Transport failures may succeed on a later attempt; the rest will not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CommandCenterError::Transport { .. })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
