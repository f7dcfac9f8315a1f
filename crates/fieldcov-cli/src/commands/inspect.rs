use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use tabled::Tabled;

use fieldcov_core::formats::FormatRegistry;
use fieldcov_core::grouping::GroupKey;

use crate::cli::InspectArgs;
use crate::output::OutputWriter;

#[derive(Tabled, Serialize)]
struct InspectRow {
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Format")]
    format: String,
    #[tabled(rename = "Child")]
    child: String,
    #[tabled(rename = "Parent")]
    parent: String,
    #[tabled(rename = "Points")]
    points: usize,
}

/// Examine candidate files one by one without running a join. Files that
/// fail to parse are reported and skipped so the rest of the batch can still
/// be checked.
pub fn execute(args: InspectArgs, output: &OutputWriter) -> Result<()> {
    let registry = FormatRegistry::with_defaults();
    let mut rows = Vec::new();

    for path in &args.candidates {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let bytes =
            fs::read(path).with_context(|| format!("reading candidate file {}", path.display()))?;

        let format = match registry.detect(&name) {
            Ok(reader) => reader.format_name().to_string(),
            Err(err) => {
                output.warning(format!("{name}: {err}"));
                continue;
            }
        };

        let (child, parent) = match GroupKey::from_filename(&name) {
            Ok(group) => (group.child, group.parent),
            Err(err) => {
                output.warning(err.to_string());
                (String::new(), String::new())
            }
        };

        match registry.read_source(&bytes, &name) {
            Ok(points) => rows.push(InspectRow {
                source: name,
                format,
                child,
                parent,
                points: points.len(),
            }),
            Err(err) => output.warning(err.to_string()),
        }
    }

    let total: usize = rows.iter().map(|r| r.points).sum();
    if output.is_json() {
        return output.result(&rows);
    }

    output.table(rows);
    output.info(format!("{total} point(s) across the batch"));
    Ok(())
}
