//! Delimited-text readers for the two tabular inputs.
//!
//! Column names follow the field survey exports: candidate files carry
//! `Latitud`/`Longitud`, the coverage survey additionally carries
//! `RSSI / RSCP (dBm)`.

use crate::error::{FieldcovError, Result};
use crate::formats::FormatReader;
use crate::models::{GeoPoint, MeasurementPoint};

pub const LATITUDE_COLUMN: &str = "Latitud";
pub const LONGITUDE_COLUMN: &str = "Longitud";
pub const SIGNAL_COLUMN: &str = "RSSI / RSCP (dBm)";

/// Provenance label for points imported from tabular files.
pub const CSV_SOURCE_LABEL: &str = "CSV import";

/// Candidate-point reader for delimited text.
#[derive(Debug)]
pub struct CsvReader;

impl FormatReader for CsvReader {
    fn read(&self, bytes: &[u8], source_name: &str) -> Result<Vec<GeoPoint>> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(bytes);

        let headers = reader.headers()?.clone();
        let columns = require_columns(
            &headers,
            &[LATITUDE_COLUMN, LONGITUDE_COLUMN],
            source_name,
        )?;
        let (lat_idx, lon_idx) = (columns[0], columns[1]);

        let mut points = Vec::new();
        // The header occupies line 1; data rows are numbered from 2.
        for (i, record) in reader.records().enumerate() {
            let record = record?;
            let row = i + 2;
            let latitude = parse_coordinate(record.get(lat_idx), row, source_name)?;
            let longitude = parse_coordinate(record.get(lon_idx), row, source_name)?;
            points.push(GeoPoint::new(latitude, longitude, CSV_SOURCE_LABEL));
        }

        if points.is_empty() {
            return Err(FieldcovError::NoUsablePoints {
                source_name: source_name.to_string(),
            });
        }
        Ok(points)
    }

    fn supported_extensions(&self) -> &[&str] {
        &["csv"]
    }

    fn format_name(&self) -> &str {
        "CSV"
    }
}

/// Parse the coverage survey: one `MeasurementPoint` per row, signal cell
/// optional (an empty or NaN cell is a sample without a reading).
pub fn read_measurements(bytes: &[u8]) -> Result<Vec<MeasurementPoint>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    let required = [LATITUDE_COLUMN, LONGITUDE_COLUMN, SIGNAL_COLUMN];
    let missing: Vec<String> = required
        .iter()
        .filter(|name| !headers.iter().any(|h| h == **name))
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(FieldcovError::CoverageColumns { missing });
    }
    let index_of = |name: &str| headers.iter().position(|h| h == name).unwrap_or(0);
    let (lat_idx, lon_idx, sig_idx) = (
        index_of(LATITUDE_COLUMN),
        index_of(LONGITUDE_COLUMN),
        index_of(SIGNAL_COLUMN),
    );

    let mut measurements = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let row = i + 2;
        let latitude = parse_measurement_value(record.get(lat_idx), row, LATITUDE_COLUMN)?
            .ok_or_else(|| FieldcovError::CoverageValue {
                row,
                reason: format!("empty {LATITUDE_COLUMN} cell"),
            })?;
        let longitude = parse_measurement_value(record.get(lon_idx), row, LONGITUDE_COLUMN)?
            .ok_or_else(|| FieldcovError::CoverageValue {
                row,
                reason: format!("empty {LONGITUDE_COLUMN} cell"),
            })?;
        let signal_dbm = parse_measurement_value(record.get(sig_idx), row, SIGNAL_COLUMN)?;
        measurements.push(MeasurementPoint {
            latitude,
            longitude,
            signal_dbm,
        });
    }
    Ok(measurements)
}

fn require_columns(
    headers: &csv::StringRecord,
    required: &[&str],
    source_name: &str,
) -> Result<Vec<usize>> {
    let mut indices = Vec::with_capacity(required.len());
    let mut missing = Vec::new();
    for name in required {
        match headers.iter().position(|h| h == *name) {
            Some(idx) => indices.push(idx),
            None => missing.push(name.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(FieldcovError::MissingColumns {
            source_name: source_name.to_string(),
            missing,
        });
    }
    Ok(indices)
}

fn parse_coordinate(cell: Option<&str>, row: usize, source_name: &str) -> Result<f64> {
    let raw = cell.unwrap_or("");
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(FieldcovError::InvalidCoordinate {
            source_name: source_name.to_string(),
            row,
            value: raw.to_string(),
        }),
    }
}

fn parse_measurement_value(cell: Option<&str>, row: usize, column: &str) -> Result<Option<f64>> {
    let raw = cell.unwrap_or("").trim();
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<f64>() {
        // A recorded NaN or infinity is a sample without a reading, same as
        // an empty cell.
        Ok(v) if !v.is_finite() => Ok(None),
        Ok(v) => Ok(Some(v)),
        Err(_) => Err(FieldcovError::CoverageValue {
            row,
            reason: format!("non-numeric {column} value {raw:?}"),
        }),
    }
}
