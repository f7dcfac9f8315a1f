//! Layered pipeline configuration.
//!
//! Values resolve in precedence order: built-in defaults, then a TOML file,
//! then `FIELDCOV_*` environment variables, then explicit CLI overrides.
//! Each value remembers which layer produced it.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::aggregate::{AggregationKind, DEFAULT_RADIUS_M};
use crate::classify::{LegendThresholds, SignalThresholds};
use crate::error::{FieldcovError, Result};
use crate::models::WorkOrderDefaults;

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    Default,
    File,
    Environment,
    Cli,
}

impl ConfigSource {
    /// Precedence level; higher wins.
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Take the new value only if it comes from a higher-precedence layer.
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Resolved configuration for one ingestion pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Coverage-join radius in metres.
    pub radius_m: ConfigValue<f64>,
    /// Which aggregation strategy joins measurements to candidates.
    pub aggregation: ConfigValue<AggregationKind>,
    /// Two-tier classifier thresholds (the exported verdict).
    pub thresholds: ConfigValue<SignalThresholds>,
    /// Three-tier presentation legend (map/report colouring only).
    pub legend: ConfigValue<LegendThresholds>,
    /// Constant work-order fields stamped on every record.
    pub work_order: ConfigValue<WorkOrderDefaults>,
    /// Visit-window length/step in minutes for the autofill helper.
    pub visit_interval_minutes: ConfigValue<i64>,
    /// Columns the editing layer must not modify. Threaded through untouched.
    pub protected_columns: ConfigValue<Vec<String>>,
    /// Columns the editing layer requires before export. Threaded through
    /// untouched.
    pub required_columns: ConfigValue<Vec<String>>,
}

impl PipelineConfig {
    /// Configuration with built-in defaults only.
    pub fn with_defaults() -> Self {
        Self {
            radius_m: ConfigValue::new(DEFAULT_RADIUS_M, ConfigSource::Default),
            aggregation: ConfigValue::new(AggregationKind::RadiusAverage, ConfigSource::Default),
            thresholds: ConfigValue::new(SignalThresholds::default(), ConfigSource::Default),
            legend: ConfigValue::new(LegendThresholds::default(), ConfigSource::Default),
            work_order: ConfigValue::new(WorkOrderDefaults::default(), ConfigSource::Default),
            visit_interval_minutes: ConfigValue::new(27, ConfigSource::Default),
            protected_columns: ConfigValue::new(
                [
                    "ID point",
                    "Latitude - Functional Location",
                    "Longitude - Functional Location",
                    "dBm",
                    "Gateway",
                ]
                .into_iter()
                .map(String::from)
                .collect(),
                ConfigSource::Default,
            ),
            required_columns: ConfigValue::new(Vec::new(), ConfigSource::Default),
        }
    }

    /// Layer a TOML file over the current values.
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| FieldcovError::ConfigInvalid {
            key: "file".to_string(),
            reason: format!("failed to read config file: {e}"),
        })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| FieldcovError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("failed to parse TOML: {e}"),
            })?;

        if let Some(radius_m) = file_config.radius_m {
            self.radius_m.update(radius_m, ConfigSource::File);
        }
        if let Some(aggregation) = file_config.aggregation {
            self.aggregation.update(aggregation, ConfigSource::File);
        }
        if let Some(thresholds) = file_config.thresholds {
            self.thresholds.update(thresholds, ConfigSource::File);
        }
        if let Some(legend) = file_config.legend {
            self.legend.update(legend, ConfigSource::File);
        }
        if let Some(work_order) = file_config.work_order {
            self.work_order.update(work_order, ConfigSource::File);
        }
        if let Some(minutes) = file_config.visit_interval_minutes {
            self.visit_interval_minutes.update(minutes, ConfigSource::File);
        }
        if let Some(columns) = file_config.protected_columns {
            self.protected_columns.update(columns, ConfigSource::File);
        }
        if let Some(columns) = file_config.required_columns {
            self.required_columns.update(columns, ConfigSource::File);
        }

        Ok(self)
    }

    /// Layer environment variables over the current values.
    pub fn load_from_env(mut self) -> Self {
        if let Ok(raw) = env::var("FIELDCOV_RADIUS_M") {
            match raw.parse::<f64>() {
                Ok(v) if v.is_finite() && v > 0.0 => {
                    self.radius_m.update(v, ConfigSource::Environment)
                }
                _ => tracing::warn!(
                    "invalid FIELDCOV_RADIUS_M value '{}': expected positive number of metres",
                    raw
                ),
            }
        }

        if let Ok(raw) = env::var("FIELDCOV_AGGREGATION") {
            match raw.parse::<AggregationKind>() {
                Ok(kind) => self.aggregation.update(kind, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "invalid FIELDCOV_AGGREGATION value '{}': expected radius-average or exact-bin",
                    raw
                ),
            }
        }

        if let Ok(raw) = env::var("FIELDCOV_VISIT_INTERVAL_MIN") {
            match raw.parse::<i64>() {
                Ok(v) if v > 0 => self
                    .visit_interval_minutes
                    .update(v, ConfigSource::Environment),
                _ => tracing::warn!(
                    "invalid FIELDCOV_VISIT_INTERVAL_MIN value '{}': expected positive minutes",
                    raw
                ),
            }
        }

        self
    }

    /// CLI override for the join radius.
    pub fn override_radius(&mut self, radius_m: f64) {
        self.radius_m.update(radius_m, ConfigSource::Cli);
    }

    /// CLI override for the aggregation strategy.
    pub fn override_aggregation(&mut self, kind: AggregationKind) {
        self.aggregation.update(kind, ConfigSource::Cli);
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// On-disk shape of the TOML config file; every key optional.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    radius_m: Option<f64>,
    aggregation: Option<AggregationKind>,
    thresholds: Option<SignalThresholds>,
    legend: Option<LegendThresholds>,
    work_order: Option<WorkOrderDefaults>,
    visit_interval_minutes: Option<i64>,
    protected_columns: Option<Vec<String>>,
    required_columns: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::with_defaults();
        assert_eq!(config.radius_m.value, 15.0);
        assert_eq!(config.aggregation.value, AggregationKind::RadiusAverage);
        assert_eq!(config.visit_interval_minutes.value, 27);
        assert_eq!(config.work_order.value.service_account, "ANER_Senegal");
        assert_eq!(config.radius_m.source, ConfigSource::Default);
    }

    #[test]
    fn test_file_layer_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
radius_m = 10.0
aggregation = "exact-bin"

[work_order]
service_account = "ANER_Casamance"
billing_account = "ANER_Casamance"
order_type = "Maintenance"
"#
        )
        .unwrap();

        let config = PipelineConfig::with_defaults()
            .load_from_file(file.path())
            .unwrap();

        assert_eq!(config.radius_m.value, 10.0);
        assert_eq!(config.radius_m.source, ConfigSource::File);
        assert_eq!(config.aggregation.value, AggregationKind::ExactBin);
        assert_eq!(config.work_order.value.order_type, "Maintenance");
        // Untouched keys keep their defaults.
        assert_eq!(config.visit_interval_minutes.value, 27);
    }

    #[test]
    fn test_cli_override_beats_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "radius_m = 10.0\n").unwrap();

        let mut config = PipelineConfig::with_defaults()
            .load_from_file(file.path())
            .unwrap();
        config.override_radius(25.0);

        assert_eq!(config.radius_m.value, 25.0);
        assert_eq!(config.radius_m.source, ConfigSource::Cli);
    }

    #[test]
    fn test_lower_precedence_does_not_override() {
        let mut value = ConfigValue::new(25.0, ConfigSource::Cli);
        value.update(10.0, ConfigSource::File);
        assert_eq!(value.value, 25.0);
        assert_eq!(value.source, ConfigSource::Cli);
    }

    #[test]
    fn test_unreadable_file_is_an_error() {
        let result = PipelineConfig::with_defaults().load_from_file("/nonexistent/fieldcov.toml");
        assert!(matches!(
            result,
            Err(FieldcovError::ConfigInvalid { .. })
        ));
    }
}
