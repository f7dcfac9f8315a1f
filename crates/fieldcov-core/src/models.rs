//! Domain models shared across the fieldcov crates.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::classify::Coverage;
use crate::grouping::GroupKey;

/// A candidate installation location, as parsed from one survey file.
///
/// Coordinates are WGS84-style degrees; no datum transform is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Provenance: the placemark name for KML input, a constant tag for
    /// tabular input.
    pub source_label: String,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64, source_label: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            source_label: source_label.into(),
        }
    }
}

/// A signal-strength sample from the coverage survey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Recorded RSSI/RSCP in dBm; a sample may carry no reading.
    pub signal_dbm: Option<f64>,
}

/// One uploaded candidate file: raw bytes plus the filename the grouping is
/// derived from. An explicit `group` bypasses filename derivation.
#[derive(Debug, Clone)]
pub struct CandidateSource {
    pub name: String,
    pub bytes: Vec<u8>,
    pub group: Option<GroupKey>,
}

impl CandidateSource {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
            group: None,
        }
    }

    pub fn with_group(mut self, group: GroupKey) -> Self {
        self.group = Some(group);
        self
    }
}

/// The uploaded coverage survey file.
#[derive(Debug, Clone)]
pub struct CoverageSource {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl CoverageSource {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Constant work-order fields attached to every record of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOrderDefaults {
    pub service_account: String,
    pub billing_account: String,
    pub order_type: String,
}

impl Default for WorkOrderDefaults {
    fn default() -> Self {
        Self {
            service_account: "ANER_Senegal".to_string(),
            billing_account: "ANER_Senegal".to_string(),
            order_type: "Installation".to_string(),
        }
    }
}

/// One row of the resulting work-order table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageRecord {
    /// 1-based position in parse order; stable only within one ingestion run.
    pub id: usize,
    pub latitude: f64,
    pub longitude: f64,
    pub source_label: String,
    pub child_location: String,
    pub parent_location: String,
    pub service_account: String,
    pub billing_account: String,
    pub order_type: String,
    /// Rounded mean of nearby measurements; absent when no coverage survey
    /// was supplied or no sample matched.
    pub signal_dbm: Option<i32>,
    pub coverage: Option<Coverage>,
    /// Promised visit window, filled by [`CoverageTable::fill_time_windows`].
    pub window_from: Option<NaiveDateTime>,
    pub window_to: Option<NaiveDateTime>,
}

/// Aggregate counters for the report header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    pub total_orders: usize,
    pub total_good: usize,
    pub total_poor: usize,
    pub total_no_data: usize,
}

/// The ordered output table of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageTable {
    pub records: Vec<CoverageRecord>,
}

impl CoverageTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Fill the promised visit window of every record, one slot per record in
    /// table order, `interval_minutes` apart starting at `start`.
    pub fn fill_time_windows(&mut self, start: NaiveDateTime, interval_minutes: i64) {
        for (i, record) in self.records.iter_mut().enumerate() {
            let from = start + Duration::minutes(interval_minutes * i as i64);
            record.window_from = Some(from);
            record.window_to = Some(from + Duration::minutes(interval_minutes));
        }
    }

    /// Counters used by the report header.
    pub fn summary(&self) -> TableSummary {
        let total_good = self
            .records
            .iter()
            .filter(|r| r.coverage == Some(Coverage::Good))
            .count();
        let total_poor = self
            .records
            .iter()
            .filter(|r| r.coverage == Some(Coverage::Poor))
            .count();
        TableSummary {
            total_orders: self.records.len(),
            total_good,
            total_poor,
            total_no_data: self.records.len() - total_good - total_poor,
        }
    }
}

/// Point count contributed by one candidate file, in upload order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCount {
    pub source: String,
    pub points: usize,
}

/// Everything one ingestion run hands back to the host application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestOutcome {
    pub table: CoverageTable,
    pub source_counts: Vec<SourceCount>,
    pub total_points: usize,
    pub group: GroupKey,
}
