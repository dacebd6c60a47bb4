//! Sector leader ranking.

use crate::ingest::remote::ValidatedSentiment;
use crate::types::{InstrumentPoint, LeaderEntry, Quadrant};

/// Maximum leaders produced from a manual snapshot.
pub const MANUAL_LEADER_LIMIT: usize = 5;

/// Live mode: the service's top movers, in the order supplied.
pub fn from_remote(payload: &ValidatedSentiment) -> Vec<LeaderEntry> {
    payload.top_movers.clone()
}

/// Manual mode: Leading points ranked by `x + y`, best first.
///
/// The sort is stable so equal strength keeps file order. Entries carry
/// only the ticker; score and action stay absent.
pub fn from_points(points: &[InstrumentPoint]) -> Vec<LeaderEntry> {
    let mut leading: Vec<&InstrumentPoint> = points
        .iter()
        .filter(|p| p.quadrant == Quadrant::Leading)
        .collect();

    leading.sort_by(|a, b| b.strength().total_cmp(&a.strength()));

    leading
        .into_iter()
        .take(MANUAL_LEADER_LIMIT)
        .map(|p| LeaderEntry::ticker_only(p.ticker.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(t: &str, x: f64, y: f64) -> InstrumentPoint {
        InstrumentPoint::new(t, None, x, y)
    }

    fn tickers(leaders: &[LeaderEntry]) -> Vec<&str> {
        leaders.iter().map(|l| l.ticker.as_str()).collect()
    }

    #[test]
    fn test_ranks_by_combined_strength() {
        let points = vec![p("C", 90.0, 95.0), p("B", 105.0, 112.0), p("A", 110.0, 108.0)];
        let leaders = from_points(&points);
        assert_eq!(tickers(&leaders), vec!["A", "B"]);
        assert!(leaders.iter().all(|l| l.score.is_none() && l.action.is_none()));
    }

    #[test]
    fn test_ties_keep_file_order() {
        let points = vec![p("X", 110.0, 110.0), p("Y", 105.0, 115.0), p("Z", 115.0, 105.0)];
        assert_eq!(tickers(&from_points(&points)), vec!["X", "Y", "Z"]);
    }

    #[test]
    fn test_truncates_to_five() {
        let points: Vec<_> = (0..8)
            .map(|i| p(&format!("L{i}"), 101.0 + i as f64, 101.0))
            .collect();
        let leaders = from_points(&points);
        assert_eq!(leaders.len(), MANUAL_LEADER_LIMIT);
        assert_eq!(tickers(&leaders), vec!["L7", "L6", "L5", "L4", "L3"]);
    }

    #[test]
    fn test_excludes_non_leading() {
        let points = vec![p("W", 130.0, 99.0), p("I", 99.0, 130.0), p("B", 100.0, 150.0)];
        assert!(from_points(&points).is_empty());
    }

    #[test]
    fn test_empty() {
        assert!(from_points(&[]).is_empty());
    }

    #[test]
    fn test_from_remote_keeps_order() {
        let payload = ValidatedSentiment {
            status: crate::types::SentimentStatus::Sideways,
            score: 0.0,
            color: "#ffd700".into(),
            top_movers: vec![
                LeaderEntry { ticker: "FPT".into(), score: Some(0.1), action: Some("HOLD".into()) },
                LeaderEntry { ticker: "HPG".into(), score: Some(0.9), action: Some("BUY".into()) },
            ],
        };
        let leaders = from_remote(&payload);
        assert_eq!(tickers(&leaders), vec!["FPT", "HPG"]);
        assert_eq!(leaders[1].action.as_deref(), Some("BUY"));
    }
}
