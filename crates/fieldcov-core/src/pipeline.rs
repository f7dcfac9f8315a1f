//! Ingestion orchestration.
//!
//! One call parses every uploaded candidate file, validates the batch
//! grouping, joins the optional coverage survey, classifies, and hands back
//! the table plus per-source counters. The pipeline owns every intermediate
//! (parsed points, measurements, the spatial index) for exactly the duration
//! of the call; nothing survives between invocations.

use tracing::{debug, info};

use crate::aggregate::strategy_for;
use crate::classify::classify;
use crate::config::PipelineConfig;
use crate::error::{FieldcovError, Result};
use crate::formats::csv::read_measurements;
use crate::formats::FormatRegistry;
use crate::grouping::{validate_batch, GroupKey};
use crate::models::{
    CandidateSource, CoverageRecord, CoverageSource, CoverageTable, IngestOutcome, SourceCount,
};

pub struct IngestionPipeline {
    config: PipelineConfig,
    registry: FormatRegistry,
}

impl IngestionPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            registry: FormatRegistry::with_defaults(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one ingestion batch.
    ///
    /// Fails whole: any parse, naming, grouping, or coverage validation error
    /// aborts the call without a partial table.
    pub fn run(
        &self,
        candidates: &[CandidateSource],
        coverage: Option<&CoverageSource>,
    ) -> Result<IngestOutcome> {
        if candidates.is_empty() {
            return Err(FieldcovError::EmptyBatch);
        }

        // Grouping first: an inconsistent batch fails before any parsing.
        let groups: Vec<GroupKey> = candidates
            .iter()
            .map(|source| match &source.group {
                Some(group) => Ok(group.clone()),
                None => GroupKey::from_filename(&source.name),
            })
            .collect::<Result<_>>()?;
        let batch_group = validate_batch(&groups)?;

        info!(
            sources = candidates.len(),
            parent = %batch_group.parent,
            "processing candidate batch"
        );

        let mut records = Vec::new();
        let mut source_counts = Vec::new();
        for (source, group) in candidates.iter().zip(&groups) {
            let points = self.registry.read_source(&source.bytes, &source.name)?;
            debug!(source = %source.name, points = points.len(), "parsed candidate file");
            source_counts.push(SourceCount {
                source: source.name.clone(),
                points: points.len(),
            });
            let work_order = &self.config.work_order.value;
            for point in points {
                records.push(CoverageRecord {
                    id: records.len() + 1,
                    latitude: point.latitude,
                    longitude: point.longitude,
                    source_label: point.source_label,
                    child_location: group.child.clone(),
                    parent_location: group.parent.clone(),
                    service_account: work_order.service_account.clone(),
                    billing_account: work_order.billing_account.clone(),
                    order_type: work_order.order_type.clone(),
                    signal_dbm: None,
                    coverage: None,
                    window_from: None,
                    window_to: None,
                });
            }
        }

        match coverage {
            Some(source) => self.join_coverage(&mut records, source)?,
            // Supported no-data mode: the signal and verdict columns exist on
            // every record but stay explicitly absent.
            None => info!("no coverage survey supplied; table carries no signal data"),
        }

        let total_points = records.len();
        info!(total_points, "candidate batch ready");

        Ok(IngestOutcome {
            table: CoverageTable { records },
            source_counts,
            total_points,
            group: batch_group,
        })
    }

    fn join_coverage(&self, records: &mut [CoverageRecord], source: &CoverageSource) -> Result<()> {
        let measurements = read_measurements(&source.bytes)?;
        debug!(
            source = %source.name,
            samples = measurements.len(),
            strategy = %self.config.aggregation.value,
            "joining coverage survey"
        );

        let coords: Vec<(f64, f64)> = records
            .iter()
            .map(|r| (r.latitude, r.longitude))
            .collect();
        let strategy = strategy_for(self.config.aggregation.value, self.config.radius_m.value);
        let signals = strategy.aggregate(&coords, &measurements);

        let thresholds = &self.config.thresholds.value;
        for (record, signal) in records.iter_mut().zip(signals) {
            record.signal_dbm = signal;
            record.coverage = classify(signal.map(f64::from), thresholds);
        }
        Ok(())
    }
}

impl Default for IngestionPipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::with_defaults())
    }
}
