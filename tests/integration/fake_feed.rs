//! Controllable feed for integration testing.
//!
//! Provides a deterministic `SnapshotFeed` whose fetches stay pending
//! until the test releases them, so imports can be interleaved with
//! in-flight fetches in a known order.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use command_center::feed::SnapshotFeed;
use command_center::ingest::remote::ValidatedSentiment;
use command_center::types::*;

/// A feed whose two fetches block on individual release signals.
pub struct FakeFeed {
    sentiment: ValidatedSentiment,
    grid: Vec<InstrumentPoint>,
    sentiment_gate: Arc<Notify>,
    grid_gate: Arc<Notify>,
    calls: Arc<AtomicUsize>,
    /// If set, fetches resolve with this error once released.
    force_error: Arc<Mutex<Option<String>>>,
}

impl FakeFeed {
    pub fn new() -> Self {
        Self {
            sentiment: Self::default_sentiment(),
            grid: Self::default_grid(),
            sentiment_gate: Arc::new(Notify::new()),
            grid_gate: Arc::new(Notify::new()),
            calls: Arc::new(AtomicUsize::new(0)),
            force_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Handles the test keeps after the feed is moved into the controller.
    pub fn handles(&self) -> FeedHandles {
        FeedHandles {
            sentiment_gate: Arc::clone(&self.sentiment_gate),
            grid_gate: Arc::clone(&self.grid_gate),
            calls: Arc::clone(&self.calls),
            force_error: Arc::clone(&self.force_error),
        }
    }

    fn default_sentiment() -> ValidatedSentiment {
        ValidatedSentiment {
            status: SentimentStatus::Bearish,
            score: -0.55,
            color: "#ff1744".into(),
            top_movers: vec![
                LeaderEntry { ticker: "SSI".into(), score: Some(0.72), action: Some("BUY".into()) },
                LeaderEntry { ticker: "VND".into(), score: Some(0.31), action: Some("HOLD".into()) },
            ],
        }
    }

    fn default_grid() -> Vec<InstrumentPoint> {
        vec![
            InstrumentPoint::new("SSI", Some("Securities"), 107.0, 103.0),
            InstrumentPoint::new("VND", Some("Securities"), 99.0, 104.0),
            InstrumentPoint::new("MSN", Some("Consumer"), 96.0, 95.0),
        ]
    }

    fn error(&self) -> Option<anyhow::Error> {
        let guard = self.force_error.lock().unwrap();
        guard.as_ref().map(|msg| {
            anyhow!(CommandCenterError::Transport {
                source_name: "fake".into(),
                message: msg.clone(),
            })
        })
    }
}

/// Test-side controls for a `FakeFeed`.
#[derive(Clone)]
pub struct FeedHandles {
    pub sentiment_gate: Arc<Notify>,
    pub grid_gate: Arc<Notify>,
    pub calls: Arc<AtomicUsize>,
    pub force_error: Arc<Mutex<Option<String>>>,
}

impl FeedHandles {
    pub fn release_sentiment(&self) {
        self.sentiment_gate.notify_one();
    }

    pub fn release_grid(&self) {
        self.grid_gate.notify_one();
    }

    pub fn release_all(&self) {
        self.release_sentiment();
        self.release_grid();
    }

    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotFeed for FakeFeed {
    async fn fetch_sentiment(&self) -> Result<ValidatedSentiment> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sentiment_gate.notified().await;
        match self.error() {
            Some(e) => Err(e),
            None => Ok(self.sentiment.clone()),
        }
    }

    async fn fetch_rotation_grid(&self) -> Result<Vec<InstrumentPoint>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.grid_gate.notified().await;
        match self.error() {
            Some(e) => Err(e),
            None => Ok(self.grid.clone()),
        }
    }

    fn name(&self) -> &str {
        "fake"
    }
}
