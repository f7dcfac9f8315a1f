//! Signal classification.
//!
//! Two independent rules consume the same raw dBm value:
//!
//! - [`classify`] is the authoritative two-tier classifier feeding the
//!   exported `Gateway` column.
//! - [`SignalTier`] is a three-tier bucketing used only for map and report
//!   colouring. Its boundaries differ from the classifier's on purpose; the
//!   two must not be unified.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coverage verdict for a work order, exported as `YES`/`NO`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Coverage {
    #[serde(rename = "YES")]
    Good,
    #[serde(rename = "NO")]
    Poor,
}

impl fmt::Display for Coverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coverage::Good => write!(f, "YES"),
            Coverage::Poor => write!(f, "NO"),
        }
    }
}

/// Thresholds for the two-tier classifier, in dBm.
///
/// A value in `[good_min, good_max]` is good coverage; a value in
/// `[floor, good_min)` is insufficient; anything outside the union of the two
/// ranges carries no verdict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalThresholds {
    pub good_min: f64,
    pub good_max: f64,
    pub floor: f64,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            good_min: -70.0,
            good_max: -10.0,
            floor: -200.0,
        }
    }
}

/// Classify an aggregated signal value.
///
/// `None` in (no measurement nearby) is `None` out, as are values outside the
/// plausible dBm range defined by the thresholds.
pub fn classify(signal_dbm: Option<f64>, thresholds: &SignalThresholds) -> Option<Coverage> {
    let v = signal_dbm?;
    if !v.is_finite() {
        return None;
    }
    if v >= thresholds.good_min && v <= thresholds.good_max {
        Some(Coverage::Good)
    } else if v >= thresholds.floor && v < thresholds.good_min {
        Some(Coverage::Poor)
    } else {
        None
    }
}

/// Presentation tier for map markers and report colouring.
///
/// Not part of the exported data; consumes the raw dBm, never the `Gateway`
/// verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalTier {
    Strong,
    Fair,
    Weak,
}

/// Boundaries for the presentation legend, in dBm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegendThresholds {
    /// At or above this value a point renders as strong (green).
    pub strong_min: f64,
    /// At or above this value (and below `strong_min`) a point renders as
    /// fair (orange); below it, weak (red).
    pub fair_min: f64,
}

impl Default for LegendThresholds {
    fn default() -> Self {
        Self {
            strong_min: -69.0,
            fair_min: -80.0,
        }
    }
}

/// Bucket a raw dBm value for display. `None` (no data) renders unbucketed.
pub fn signal_tier(signal_dbm: Option<f64>, legend: &LegendThresholds) -> Option<SignalTier> {
    let v = signal_dbm?;
    if !v.is_finite() {
        return None;
    }
    if v >= legend.strong_min {
        Some(SignalTier::Strong)
    } else if v >= legend.fair_min {
        Some(SignalTier::Fair)
    } else {
        Some(SignalTier::Weak)
    }
}
