//! RRG quadrant classification.

use crate::types::{Quadrant, BASELINE};

/// Classify an (RS-Ratio, RS-Momentum) pair against the 100 parity line.
///
/// A value exactly on the baseline counts as "not above", so ties never
/// land in Leading or Weakening.
pub fn classify(x: f64, y: f64) -> Quadrant {
    match (x > BASELINE, y > BASELINE) {
        (true, true) => Quadrant::Leading,
        (true, false) => Quadrant::Weakening,
        (false, false) => Quadrant::Lagging,
        (false, true) => Quadrant::Improving,
    }
}
