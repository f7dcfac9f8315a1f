//! Table export in the work-order spreadsheet template shape.

use anyhow::Result;
use serde::Serialize;
use std::io::Write;

use fieldcov_core::models::{CoverageRecord, CoverageTable};

/// One exported row; serde renames reproduce the spreadsheet template
/// headers the downstream tooling expects.
#[derive(Debug, Serialize)]
pub struct ExportRow {
    #[serde(rename = "ID point")]
    pub id: usize,
    #[serde(rename = "Name - Child Functional Location")]
    pub child_location: String,
    #[serde(rename = "Name - Parent Functional Location")]
    pub parent_location: String,
    #[serde(rename = "Latitude - Functional Location")]
    pub latitude: f64,
    #[serde(rename = "Longitude - Functional Location")]
    pub longitude: f64,
    #[serde(rename = "Location - Work Order")]
    pub location: String,
    #[serde(rename = "Summary - Work Order")]
    pub summary: String,
    #[serde(rename = "Service Account - Work Order")]
    pub service_account: String,
    #[serde(rename = "Billing Account - Work Order")]
    pub billing_account: String,
    #[serde(rename = "Work Order Type - Work Order")]
    pub order_type: String,
    #[serde(rename = "dBm")]
    pub signal_dbm: Option<i32>,
    #[serde(rename = "Gateway")]
    pub gateway: String,
    #[serde(rename = "Promised window From - Work Order")]
    pub window_from: String,
    #[serde(rename = "Promised window To - Work Order")]
    pub window_to: String,
    #[serde(rename = "Time window From - Work Order")]
    pub time_from: String,
    #[serde(rename = "Time window To - Work Order")]
    pub time_to: String,
}

impl From<&CoverageRecord> for ExportRow {
    fn from(record: &CoverageRecord) -> Self {
        Self {
            id: record.id,
            child_location: record.child_location.clone(),
            parent_location: record.parent_location.clone(),
            latitude: record.latitude,
            longitude: record.longitude,
            // The survey label doubles as the order's location and summary.
            location: record.source_label.clone(),
            summary: record.source_label.clone(),
            service_account: record.service_account.clone(),
            billing_account: record.billing_account.clone(),
            order_type: record.order_type.clone(),
            signal_dbm: record.signal_dbm,
            gateway: record
                .coverage
                .map(|c| c.to_string())
                .unwrap_or_default(),
            window_from: record
                .window_from
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
            window_to: record
                .window_to
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
            time_from: record
                .window_from
                .map(|t| t.format("%H:%M").to_string())
                .unwrap_or_default(),
            time_to: record
                .window_to
                .map(|t| t.format("%H:%M").to_string())
                .unwrap_or_default(),
        }
    }
}

/// Write the table as CSV with the template headers.
pub fn write_csv<W: Write>(table: &CoverageTable, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in &table.records {
        csv_writer.serialize(ExportRow::from(record))?;
    }
    csv_writer.flush()?;
    Ok(())
}
