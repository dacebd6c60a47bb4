//! Snapshot controller.
//!
//! Owns the reconciliation gate and the published bundle. Two one-shot
//! background fetches (sentiment, rotation grid) and the user-driven CSV
//! import all funnel into the same critical section: take the gate lock,
//! check the phase, build a new bundle, swap it in. A fetch that completes
//! after an import sees the locked gate and is dropped whole.
//!
//! Readers subscribe through a `watch` channel and only ever observe
//! complete bundles.

use anyhow::Result;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::analytics::{leaders, sentiment};
use crate::config::ApiConfig;
use crate::engine::gate::ReconciliationGate;
use crate::feed::SnapshotFeed;
use crate::ingest::csv::parse_snapshot_report;
use crate::ingest::remote::ValidatedSentiment;
use crate::types::{CommandCenterError, FeedStatus, InstrumentPoint, Phase, SnapshotBundle};

// ---------------------------------------------------------------------------
// Retry policy
// ---------------------------------------------------------------------------

/// Backoff for retryable fetch failures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Extra attempts after the first.
    pub max_retries: u32,
    pub base_backoff: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_backoff: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (1-based): base * 2^(attempt-1).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_backoff * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

impl From<&ApiConfig> for RetryPolicy {
    fn from(cfg: &ApiConfig) -> Self {
        Self {
            max_retries: cfg.max_retries,
            base_backoff: Duration::from_millis(cfg.base_backoff_ms),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// What a completion handler did with its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Published,
    /// Gate was locked; nothing changed.
    Discarded,
}

/// Result of a manual import.
#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub accepted: usize,
    pub skipped: usize,
    /// Whether this import closed the gate (first import of the session).
    pub locked_gate: bool,
    pub bundle: SnapshotBundle,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct SnapshotController {
    feed: Arc<dyn SnapshotFeed>,
    retry: RetryPolicy,
    /// Guards check-then-publish for every writer.
    gate: Mutex<ReconciliationGate>,
    publisher: watch::Sender<SnapshotBundle>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    /// Set by the first `start`; never cleared, so fetches run once per session.
    started: AtomicBool,
}

impl SnapshotController {
    pub fn new(feed: Arc<dyn SnapshotFeed>, retry: RetryPolicy) -> Self {
        let (publisher, _) = watch::channel(SnapshotBundle::initial());
        Self {
            feed,
            retry,
            gate: Mutex::new(ReconciliationGate::new()),
            publisher,
            tasks: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
        }
    }

    // -- Read side -------------------------------------------------------

    /// Subscribe to published bundles. The receiver is read-only.
    pub fn subscribe(&self) -> watch::Receiver<SnapshotBundle> {
        self.publisher.subscribe()
    }

    /// Clone of the current bundle.
    pub fn snapshot(&self) -> SnapshotBundle {
        self.publisher.borrow().clone()
    }

    pub fn phase(&self) -> Phase {
        self.lock_gate().phase()
    }

    // -- Background fetches ----------------------------------------------

    /// Launch both one-shot fetches. Any later call is a no-op, including
    /// after `settle` or `shutdown`.
    pub fn start(self: &Arc<Self>) {
        if self.started.swap(true, Ordering::SeqCst) {
            warn!("Background fetches already started this session");
            return;
        }
        let mut tasks = self.lock_tasks();

        info!(retries = self.retry.max_retries, "Launching background fetches");

        let this = Arc::clone(self);
        tasks.push(tokio::spawn(async move {
            let feed = Arc::clone(&this.feed);
            let result = this
                .fetch_with_retry("sentiment", || feed.fetch_sentiment())
                .await;
            this.apply_sentiment(result);
        }));

        let this = Arc::clone(self);
        tasks.push(tokio::spawn(async move {
            let feed = Arc::clone(&this.feed);
            let result = this
                .fetch_with_retry("rotation-grid", || feed.fetch_rotation_grid())
                .await;
            this.apply_grid(result);
        }));
    }

    /// Wait for any launched fetches to finish.
    pub async fn settle(&self) {
        let handles: Vec<JoinHandle<()>> = self.lock_tasks().drain(..).collect();
        for outcome in futures::future::join_all(handles).await {
            if let Err(e) = outcome {
                if !e.is_cancelled() {
                    error!(error = %e, "Background fetch task panicked");
                }
            }
        }
    }

    /// Abort in-flight fetches. Their parts of the bundle stay as they are.
    pub fn shutdown(&self) {
        let handles: Vec<JoinHandle<()>> = self.lock_tasks().drain(..).collect();
        let mut aborted = 0;
        for handle in handles {
            if !handle.is_finished() {
                handle.abort();
                aborted += 1;
            }
        }
        info!(aborted, "Snapshot controller shut down");
    }

    async fn fetch_with_retry<T, F, Fut>(&self, source: &'static str, op: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            let retryable = err
                .downcast_ref::<CommandCenterError>()
                .is_some_and(CommandCenterError::is_retryable);

            if !retryable || attempt >= self.retry.max_retries {
                return Err(err);
            }
            if self.phase() == Phase::ManualLocked {
                debug!(source, "Gate locked, not retrying");
                return Err(err);
            }

            attempt += 1;
            let delay = self.retry.delay_for(attempt);
            warn!(
                source,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Fetch failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    // -- Completion handlers ---------------------------------------------

    /// Sentiment fetch completion: publish sentiment + top movers, or mark
    /// the source unavailable. Dropped entirely once the gate is locked.
    pub fn apply_sentiment(&self, result: Result<ValidatedSentiment>) -> PublishOutcome {
        let gate = self.lock_gate();
        if gate.is_locked() {
            info!(ok = result.is_ok(), "Sentiment result discarded: manual snapshot is authoritative");
            return PublishOutcome::Discarded;
        }

        let mut next = self.snapshot();
        match result {
            Ok(payload) => {
                next.sentiment = Some(sentiment::from_remote(&payload));
                next.leaders = leaders::from_remote(&payload);
                next.sentiment_feed = FeedStatus::Ready;
                info!(
                    status = %payload.status,
                    score = payload.score,
                    movers = next.leaders.len(),
                    "Live sentiment received"
                );
            }
            Err(e) => {
                error!(error = %e, "Sentiment fetch failed, data unavailable");
                next.sentiment = None;
                next.leaders = Vec::new();
                next.sentiment_feed = FeedStatus::Unavailable;
            }
        }

        self.publish(&gate, next);
        PublishOutcome::Published
    }

    /// Rotation-grid fetch completion.
    pub fn apply_grid(&self, result: Result<Vec<InstrumentPoint>>) -> PublishOutcome {
        let gate = self.lock_gate();
        if gate.is_locked() {
            info!(ok = result.is_ok(), "Rotation grid discarded: manual snapshot is authoritative");
            return PublishOutcome::Discarded;
        }

        let mut next = self.snapshot();
        match result {
            Ok(points) => {
                info!(points = points.len(), "Live rotation grid received");
                next.points = points;
                next.grid_feed = FeedStatus::Ready;
            }
            Err(e) => {
                error!(error = %e, "Rotation grid fetch failed, data unavailable");
                next.points = Vec::new();
                next.grid_feed = FeedStatus::Unavailable;
            }
        }

        self.publish(&gate, next);
        PublishOutcome::Published
    }

    // -- Manual import ---------------------------------------------------

    /// Import a user-supplied CSV snapshot.
    ///
    /// Closes the gate for the rest of the session and republishes state
    /// computed only from the file. A file with no usable rows still
    /// locks the gate and publishes a neutral, empty snapshot.
    pub fn import_csv(&self, text: &str) -> ImportSummary {
        let report = parse_snapshot_report(text);
        let accepted = report.points.len();
        let skipped = report.skipped.len();

        let mut gate = self.lock_gate();
        let locked_gate = gate.lock();

        let next = SnapshotBundle {
            sentiment: Some(sentiment::from_points(&report.points)),
            leaders: leaders::from_points(&report.points),
            points: report.points,
            phase: gate.phase(),
            sentiment_feed: FeedStatus::Superseded,
            grid_feed: FeedStatus::Superseded,
            ..self.snapshot()
        };

        if accepted == 0 {
            warn!(skipped, "Manual import produced no valid rows");
        }
        info!(accepted, skipped, first = locked_gate, "Manual snapshot imported");

        let bundle = self.publish(&gate, next);
        ImportSummary {
            accepted,
            skipped,
            locked_gate,
            bundle,
        }
    }

    // -- Internals -------------------------------------------------------

    /// Swap in a new bundle. Requires the gate guard so every publish is
    /// serialised behind its phase check.
    fn publish(&self, _gate: &MutexGuard<'_, ReconciliationGate>, mut next: SnapshotBundle) -> SnapshotBundle {
        next.revision = self.publisher.borrow().revision + 1;
        next.updated_at = chrono::Utc::now();
        debug!(bundle = %next, "Publishing snapshot");
        self.publisher.send_replace(next.clone());
        next
    }

    fn lock_gate(&self) -> MutexGuard<'_, ReconciliationGate> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_tasks(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
