//! Coverage aggregation: join candidate points to signal measurements.
//!
//! Two strategies exist because the survey workflow changed over time: when
//! candidate and coverage files share an identical sampling grid, an exact
//! coordinate-bin lookup is enough; otherwise measurements within a small
//! radius of each candidate are averaged. Both are first-class and selected
//! by configuration; there is no fallback from one to the other.
//!
//! Aggregated means are rounded half-to-even (`f64::round_ties_even`) so
//! that boundary values reproduce identically across runs and platforms.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::geo::{project, project_all, ProximityIndex};
use crate::models::MeasurementPoint;

/// Default join radius in metres.
pub const DEFAULT_RADIUS_M: f64 = 15.0;

/// Decimal places of the exact-bin join key.
pub const DEFAULT_BIN_DECIMALS: u32 = 10;

/// Strategy selector, as written in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AggregationKind {
    RadiusAverage,
    ExactBin,
}

impl fmt::Display for AggregationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregationKind::RadiusAverage => write!(f, "radius-average"),
            AggregationKind::ExactBin => write!(f, "exact-bin"),
        }
    }
}

impl FromStr for AggregationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "radius-average" => Ok(AggregationKind::RadiusAverage),
            "exact-bin" => Ok(AggregationKind::ExactBin),
            other => Err(format!(
                "unknown aggregation strategy {other:?}, expected radius-average or exact-bin"
            )),
        }
    }
}

/// One aggregated signal per candidate, in candidate order. A pure function
/// of its inputs: no state survives between calls.
pub trait AggregationStrategy: Send + Sync {
    fn aggregate(
        &self,
        candidates: &[(f64, f64)],
        measurements: &[MeasurementPoint],
    ) -> Vec<Option<i32>>;
}

/// Average every measurement within `radius_m` of the candidate.
pub struct RadiusAverage {
    pub radius_m: f64,
}

impl AggregationStrategy for RadiusAverage {
    fn aggregate(
        &self,
        candidates: &[(f64, f64)],
        measurements: &[MeasurementPoint],
    ) -> Vec<Option<i32>> {
        if measurements.is_empty() {
            return vec![None; candidates.len()];
        }

        let coords: Vec<(f64, f64)> = measurements
            .iter()
            .map(|m| (m.latitude, m.longitude))
            .collect();
        let index = ProximityIndex::build(&project_all(&coords));

        candidates
            .iter()
            .map(|&(lat, lon)| {
                let matched = index.query_radius(project(lat, lon), self.radius_m);
                let values: Vec<f64> = matched
                    .into_iter()
                    .filter_map(|i| measurements[i].signal_dbm)
                    .collect();
                if values.is_empty() {
                    None
                } else {
                    let mean = values.iter().sum::<f64>() / values.len() as f64;
                    Some(round_half_even(mean))
                }
            })
            .collect()
    }
}

/// Join on coordinates rounded to a fixed number of decimal places.
///
/// Usable when both files were produced on the same sampling grid; a later
/// measurement in the same bin replaces an earlier one.
pub struct ExactBin {
    pub decimals: u32,
}

impl ExactBin {
    fn bin(&self, value: f64) -> i64 {
        let scale = 10f64.powi(self.decimals as i32);
        (value * scale).round() as i64
    }
}

impl AggregationStrategy for ExactBin {
    fn aggregate(
        &self,
        candidates: &[(f64, f64)],
        measurements: &[MeasurementPoint],
    ) -> Vec<Option<i32>> {
        let mut bins: HashMap<(i64, i64), Option<f64>> = HashMap::new();
        for m in measurements {
            bins.insert((self.bin(m.latitude), self.bin(m.longitude)), m.signal_dbm);
        }

        candidates
            .iter()
            .map(|&(lat, lon)| {
                bins.get(&(self.bin(lat), self.bin(lon)))
                    .copied()
                    .flatten()
                    .map(round_half_even)
            })
            .collect()
    }
}

/// Build the configured strategy.
pub fn strategy_for(kind: AggregationKind, radius_m: f64) -> Box<dyn AggregationStrategy> {
    match kind {
        AggregationKind::RadiusAverage => Box::new(RadiusAverage { radius_m }),
        AggregationKind::ExactBin => Box::new(ExactBin {
            decimals: DEFAULT_BIN_DECIMALS,
        }),
    }
}

fn round_half_even(value: f64) -> i32 {
    value.round_ties_even() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::EARTH_RADIUS_M;

    fn offset_deg(meters: f64) -> f64 {
        meters / (EARTH_RADIUS_M * std::f64::consts::PI / 180.0)
    }

    fn sample(lat: f64, lon: f64, dbm: Option<f64>) -> MeasurementPoint {
        MeasurementPoint {
            latitude: lat,
            longitude: lon,
            signal_dbm: dbm,
        }
    }

    #[test]
    fn test_radius_average_excludes_samples_beyond_radius() {
        let candidates = vec![(0.0, 0.0)];
        let measurements = vec![
            sample(offset_deg(3.0), 0.0, Some(-60.0)),
            sample(offset_deg(8.0), 0.0, Some(-80.0)),
            sample(offset_deg(20.0), 0.0, Some(-40.0)),
        ];

        let strategy = RadiusAverage { radius_m: 15.0 };
        let result = strategy.aggregate(&candidates, &measurements);

        // Only the 3 m and 8 m samples join: mean(-60, -80) = -70.
        assert_eq!(result, vec![Some(-70)]);
    }

    #[test]
    fn test_radius_average_ignores_samples_without_reading() {
        let candidates = vec![(0.0, 0.0)];
        let measurements = vec![
            sample(offset_deg(3.0), 0.0, None),
            sample(offset_deg(5.0), 0.0, Some(-62.0)),
        ];

        let strategy = RadiusAverage { radius_m: 15.0 };
        assert_eq!(strategy.aggregate(&candidates, &measurements), vec![Some(-62)]);
    }

    #[test]
    fn test_radius_average_all_matches_without_reading_is_absent() {
        let candidates = vec![(0.0, 0.0)];
        let measurements = vec![sample(offset_deg(3.0), 0.0, None)];

        let strategy = RadiusAverage { radius_m: 15.0 };
        assert_eq!(strategy.aggregate(&candidates, &measurements), vec![None]);
    }

    #[test]
    fn test_radius_average_no_measurements_at_all() {
        let strategy = RadiusAverage { radius_m: 15.0 };
        assert_eq!(strategy.aggregate(&[(0.0, 0.0), (1.0, 1.0)], &[]), vec![None, None]);
    }

    #[test]
    fn test_rounding_is_half_to_even() {
        let candidates = vec![(0.0, 0.0)];
        // mean(-70, -71) = -70.5 rounds to the even -70, not -71.
        let measurements = vec![
            sample(offset_deg(2.0), 0.0, Some(-70.0)),
            sample(offset_deg(4.0), 0.0, Some(-71.0)),
        ];
        let strategy = RadiusAverage { radius_m: 15.0 };
        assert_eq!(strategy.aggregate(&candidates, &measurements), vec![Some(-70)]);

        // mean(-69, -70) = -69.5 also rounds to -70.
        let measurements = vec![
            sample(offset_deg(2.0), 0.0, Some(-69.0)),
            sample(offset_deg(4.0), 0.0, Some(-70.0)),
        ];
        assert_eq!(strategy.aggregate(&candidates, &measurements), vec![Some(-70)]);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let candidates = vec![(0.0, 0.0), (offset_deg(100.0), 0.0)];
        let measurements = vec![
            sample(offset_deg(3.0), 0.0, Some(-60.0)),
            sample(offset_deg(8.0), 0.0, Some(-80.0)),
        ];
        let strategy = RadiusAverage { radius_m: 15.0 };

        let first = strategy.aggregate(&candidates, &measurements);
        let second = strategy.aggregate(&candidates, &measurements);
        assert_eq!(first, second);
    }

    #[test]
    fn test_exact_bin_matches_identical_grid() {
        let candidates = vec![(14.7000000001, -17.45), (14.71, -17.46)];
        let measurements = vec![
            sample(14.7000000001, -17.45, Some(-55.4)),
            sample(14.9, -17.9, Some(-90.0)),
        ];

        let strategy = ExactBin {
            decimals: DEFAULT_BIN_DECIMALS,
        };
        assert_eq!(
            strategy.aggregate(&candidates, &measurements),
            vec![Some(-55), None]
        );
    }

    #[test]
    fn test_exact_bin_later_measurement_wins() {
        let candidates = vec![(14.71, -17.46)];
        let measurements = vec![
            sample(14.71, -17.46, Some(-90.0)),
            sample(14.71, -17.46, Some(-50.0)),
        ];

        let strategy = ExactBin {
            decimals: DEFAULT_BIN_DECIMALS,
        };
        assert_eq!(strategy.aggregate(&candidates, &measurements), vec![Some(-50)]);
    }

    #[test]
    fn test_strategy_selector_round_trips() {
        assert_eq!(
            "radius-average".parse::<AggregationKind>().unwrap(),
            AggregationKind::RadiusAverage
        );
        assert_eq!(
            AggregationKind::ExactBin.to_string().parse::<AggregationKind>().unwrap(),
            AggregationKind::ExactBin
        );
        assert!("nearest".parse::<AggregationKind>().is_err());
    }
}
