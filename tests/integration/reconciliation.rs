//! End-to-end reconciliation behaviour: background fetches racing a
//! manual import through the public controller API.

use std::sync::Arc;
use std::time::Duration;

use command_center::engine::controller::{RetryPolicy, SnapshotController};
use command_center::ingest::csv::parse_snapshot;
use command_center::types::*;

use crate::fake_feed::{FakeFeed, FeedHandles};

const MANUAL_CSV: &str = "\
ticker,group,rs_ratio,rs_momentum
A,Tech,110,108
B,Bank,105,112
C,Steel,90,95
D,Retail,101,99
E,Energy,99,103
";

fn setup() -> (Arc<SnapshotController>, FeedHandles) {
    let feed = FakeFeed::new();
    let handles = feed.handles();
    let ctl = Arc::new(SnapshotController::new(Arc::new(feed), RetryPolicy::none()));
    (ctl, handles)
}

async fn wait_for_calls(handles: &FeedHandles, n: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while handles.calls() < n {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("fetches never started");
}

#[tokio::test]
async fn test_import_during_flight_wins() {
    let (ctl, handles) = setup();
    ctl.start();
    wait_for_calls(&handles, 2).await;

    let imported = ctl.import_csv(MANUAL_CSV).bundle;

    handles.release_all();
    ctl.settle().await;

    assert_eq!(ctl.snapshot(), imported);
    assert_eq!(ctl.phase(), Phase::ManualLocked);
    let sentiment = ctl.snapshot().sentiment.unwrap();
    assert_eq!(sentiment.provenance, Provenance::Manual);
}

#[tokio::test]
async fn test_import_before_start_wins() {
    let (ctl, handles) = setup();
    let imported = ctl.import_csv(MANUAL_CSV).bundle;

    handles.release_all();
    ctl.start();
    ctl.settle().await;

    assert_eq!(ctl.snapshot(), imported);
}

#[tokio::test]
async fn test_fetches_complete_in_either_order() {
    let (ctl, handles) = setup();
    let mut rx = ctl.subscribe();
    ctl.start();

    handles.release_grid();
    rx.changed().await.unwrap();
    {
        let b = rx.borrow_and_update();
        assert_eq!(b.grid_feed, FeedStatus::Ready);
        assert_eq!(b.sentiment_feed, FeedStatus::Loading);
        assert_eq!(b.points.len(), 3);
    }

    handles.release_sentiment();
    rx.changed().await.unwrap();
    let b = rx.borrow_and_update().clone();
    assert_eq!(b.sentiment_feed, FeedStatus::Ready);
    assert_eq!(b.points.len(), 3);
    assert_eq!(b.leaders[0].ticker, "SSI");
    assert_eq!(b.leaders[0].score, Some(0.72));
    assert_eq!(b.sentiment.unwrap().provenance, Provenance::Live);
    assert_eq!(b.phase, Phase::Live);

    ctl.settle().await;
}

#[tokio::test]
async fn test_partial_live_then_import_then_late_fetch() {
    let (ctl, handles) = setup();
    let mut rx = ctl.subscribe();
    ctl.start();

    handles.release_sentiment();
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().sentiment_feed, FeedStatus::Ready);

    let imported = ctl.import_csv(MANUAL_CSV).bundle;
    handles.release_grid();
    ctl.settle().await;

    let b = ctl.snapshot();
    assert_eq!(b, imported);
    let tickers: Vec<_> = b.points.iter().map(|p| p.ticker.as_str()).collect();
    assert_eq!(tickers, vec!["A", "B", "C", "D", "E"]);
}

#[tokio::test]
async fn test_manual_snapshot_analytics() {
    let (ctl, _handles) = setup();
    let b = ctl.import_csv(MANUAL_CSV).bundle;

    // 3 of 5 above parity: (3/5)*2 - 1 = 0.2, which is not > 0.2.
    let s = b.sentiment.unwrap();
    assert!((s.score - 0.2).abs() < 1e-12);
    assert_eq!(s.status, SentimentStatus::Sideways);

    let leaders: Vec<_> = b.leaders.iter().map(|l| l.ticker.as_str()).collect();
    assert_eq!(leaders, vec!["A", "B"]);
    assert!(b.leaders.iter().all(|l| l.score.is_none() && l.action.is_none()));

    let quadrants: Vec<_> = b.points.iter().map(|p| p.quadrant).collect();
    assert_eq!(
        quadrants,
        vec![
            Quadrant::Leading,
            Quadrant::Leading,
            Quadrant::Lagging,
            Quadrant::Weakening,
            Quadrant::Improving,
        ]
    );
}

#[tokio::test]
async fn test_transport_failure_then_import() {
    let (ctl, handles) = setup();
    handles.set_error("connection refused");
    ctl.start();
    handles.release_all();
    ctl.settle().await;

    let b = ctl.snapshot();
    assert_eq!(b.sentiment_feed, FeedStatus::Unavailable);
    assert_eq!(b.grid_feed, FeedStatus::Unavailable);
    assert!(b.sentiment.is_none());
    assert_eq!(b.phase, Phase::Live);

    let b = ctl.import_csv("header\n").bundle;
    assert_eq!(b.phase, Phase::ManualLocked);
    let s = b.sentiment.unwrap();
    assert_eq!(s.status, SentimentStatus::Sideways);
    assert_eq!(s.score, 0.0);
    assert!(b.leaders.is_empty());
}

#[tokio::test]
async fn test_shutdown_leaves_loading() {
    let (ctl, handles) = setup();
    ctl.start();
    wait_for_calls(&handles, 2).await;
    ctl.shutdown();

    handles.release_all();
    ctl.settle().await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    let b = ctl.snapshot();
    assert_eq!(b.revision, 0);
    assert_eq!(b.sentiment_feed, FeedStatus::Loading);
    assert_eq!(b.grid_feed, FeedStatus::Loading);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_import_and_fetches() {
    for _ in 0..20 {
        let (ctl, handles) = setup();
        ctl.start();

        let importer = {
            let ctl = Arc::clone(&ctl);
            tokio::spawn(async move { ctl.import_csv(MANUAL_CSV) })
        };
        handles.release_all();

        let summary = importer.await.unwrap();
        ctl.settle().await;

        // Whatever interleaving happened, nothing published after the import.
        let b = ctl.snapshot();
        assert_eq!(b, summary.bundle);
        assert_eq!(b.phase, Phase::ManualLocked);
    }
}

#[test]
fn test_parse_two_rows_and_reparse() {
    let text = "ticker,group,rs,mom\nAAA,Tech,110,105\nBBB,Bank,95,98\n";
    let first = parse_snapshot(text);
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].quadrant, Quadrant::Leading);
    assert_eq!(first[1].quadrant, Quadrant::Lagging);
    assert_eq!(parse_snapshot(text), first);
}
