use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::fs;
use std::path::Path;
use tabled::Tabled;

use fieldcov_core::grouping::GroupKey;
use fieldcov_core::models::{CandidateSource, CoverageSource};
use fieldcov_core::{IngestSession, IngestionPipeline, PipelineConfig};

use crate::cli::IngestArgs;
use crate::export;
use crate::output::OutputWriter;

#[derive(Tabled)]
struct SourceCountRow {
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Points")]
    points: usize,
}

pub fn execute(args: IngestArgs, output: &OutputWriter, config_path: Option<&Path>) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(radius) = args.radius {
        config.override_radius(radius);
    }
    if let Some(strategy) = args.strategy {
        config.override_aggregation(strategy.into());
    }
    let interval_minutes = config.visit_interval_minutes.value;
    tracing::debug!(
        radius_m = config.radius_m.value,
        strategy = %config.aggregation.value,
        "resolved pipeline configuration"
    );

    let explicit_group = match (&args.child, &args.parent) {
        (Some(child), Some(parent)) => Some(GroupKey::new(child.clone(), parent.clone())),
        _ => None,
    };

    let mut candidates = Vec::new();
    for path in &args.candidates {
        let bytes =
            fs::read(path).with_context(|| format!("reading candidate file {}", path.display()))?;
        let mut source = CandidateSource::new(file_name(path), bytes);
        if let Some(group) = &explicit_group {
            source = source.with_group(group.clone());
        }
        candidates.push(source);
    }

    let coverage = match &args.coverage {
        Some(path) => {
            let bytes = fs::read(path)
                .with_context(|| format!("reading coverage file {}", path.display()))?;
            Some(CoverageSource::new(file_name(path), bytes))
        }
        None => None,
    };

    let schedule_start = args
        .schedule_start
        .as_deref()
        .map(parse_schedule_start)
        .transpose()?;

    let mut session = IngestSession::new(IngestionPipeline::new(config));
    if let Err(err) = session.process(&candidates, coverage.as_ref()) {
        output.error(&err);
        return Err(err.into());
    }

    if let Some(start) = schedule_start {
        if let Some(table) = session.table_mut() {
            table.fill_time_windows(start, interval_minutes);
        }
    }

    let Some(outcome) = session.outcome() else {
        return Ok(());
    };

    if let Some(path) = &args.output {
        let file = fs::File::create(path)
            .with_context(|| format!("creating output file {}", path.display()))?;
        export::write_csv(&outcome.table, file)?;
    }

    if output.is_json() {
        return output.result(outcome);
    }

    output.success(format!(
        "{} point(s) ingested from {} file(s) under parent {}",
        outcome.total_points,
        outcome.source_counts.len(),
        outcome.group.parent
    ));
    output.table(
        outcome
            .source_counts
            .iter()
            .map(|c| SourceCountRow {
                source: c.source.clone(),
                points: c.points,
            })
            .collect(),
    );

    let summary = outcome.table.summary();
    if coverage.is_some() {
        output.info(format!(
            "coverage: {} YES, {} NO, {} without data",
            summary.total_good, summary.total_poor, summary.total_no_data
        ));
    } else {
        output.info("no coverage survey supplied; dBm and Gateway columns left empty");
    }

    match &args.output {
        Some(path) => {
            output.success(format!(
                "work-order table written to {} ({} rows)",
                path.display(),
                outcome.table.len()
            ));
        }
        None => {
            export::write_csv(&outcome.table, std::io::stdout().lock())?;
        }
    }

    Ok(())
}

fn load_config(config_path: Option<&Path>) -> Result<PipelineConfig> {
    let config = match config_path {
        Some(path) => PipelineConfig::with_defaults()
            .load_from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => PipelineConfig::with_defaults(),
    };
    Ok(config.load_from_env())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string()
}

fn parse_schedule_start(raw: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M"))
        .with_context(|| format!("invalid --schedule-start {raw:?}, expected YYYY-MM-DDTHH:MM"))
}
