//! CSV snapshot import.
//!
//! Expected shape: one header line (content ignored) followed by rows of
//! `ticker,group,rsRatio,rsMomentum[,...]`. Values may be quoted with
//! single or double quotes. Malformed rows are dropped one at a time and
//! never fail the import as a whole.

use tracing::debug;

use crate::types::InstrumentPoint;

/// Minimum fields a data row must have.
const MIN_FIELDS: usize = 4;

/// A data row as read from the file, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSnapshotRow {
    pub ticker: String,
    pub group: String,
    pub rs_ratio: f64,
    pub rs_momentum: f64,
}

impl From<RawSnapshotRow> for InstrumentPoint {
    fn from(row: RawSnapshotRow) -> Self {
        InstrumentPoint::new(row.ticker, Some(&row.group), row.rs_ratio, row.rs_momentum)
    }
}

/// Why a row was dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    /// 1-based line number in the original text (header is line 1).
    pub line: u64,
    pub reason: String,
}

/// Outcome of one import.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseReport {
    pub points: Vec<InstrumentPoint>,
    pub skipped: Vec<SkippedRow>,
}

impl ParseReport {
    pub fn rows_seen(&self) -> usize {
        self.points.len() + self.skipped.len()
    }
}

/// Parse an imported snapshot into canonical points, in file order.
pub fn parse_snapshot(text: &str) -> Vec<InstrumentPoint> {
    parse_snapshot_report(text).points
}

/// Parse an imported snapshot, keeping a record of every dropped row.
pub fn parse_snapshot_report(text: &str) -> ParseReport {
    let mut report = ParseReport::default();

    // Line 1 is the header whatever it contains.
    let body = match text.split_once('\n') {
        Some((_, rest)) => rest,
        None => return report,
    };

    let mut rdr = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(::csv::Trim::All)
        .from_reader(body.as_bytes());

    let mut record = ::csv::StringRecord::new();
    loop {
        let line = rdr.position().line() + 1;
        match rdr.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                report.skipped.push(SkippedRow { line, reason: format!("unreadable row: {e}") });
                continue;
            }
        }
        let line = record.position().map(|p| p.line() + 1).unwrap_or(line);

        match parse_row(&record) {
            Ok(row) => report.points.push(row.into()),
            Err(reason) => {
                debug!(line, reason = %reason, "Skipping snapshot row");
                report.skipped.push(SkippedRow { line, reason });
            }
        }
    }

    report
}

fn parse_row(record: &::csv::StringRecord) -> Result<RawSnapshotRow, String> {
    if record.len() < MIN_FIELDS {
        return Err(format!("expected at least {MIN_FIELDS} fields, got {}", record.len()));
    }

    let field = |i: usize| unquote(record.get(i).unwrap_or_default());

    Ok(RawSnapshotRow {
        ticker: field(0).to_string(),
        group: field(1).to_string(),
        rs_ratio: parse_number(field(2)).ok_or_else(|| format!("invalid rsRatio: {:?}", field(2)))?,
        rs_momentum: parse_number(field(3))
            .ok_or_else(|| format!("invalid rsMomentum: {:?}", field(3)))?,
    })
}

/// Strip surrounding quote characters (either kind) and whitespace.
///
/// Quotes carry no meaning here: a field is whatever sits between two
/// commas on one line, so an unbalanced quote only affects its own field.
fn unquote(field: &str) -> &str {
    field.trim().trim_matches(|c: char| c == '"' || c == '\'').trim()
}

fn parse_number(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}
