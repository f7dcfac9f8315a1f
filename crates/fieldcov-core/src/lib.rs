//! fieldcov core: the spatial coverage-join pipeline.
//!
//! Parses candidate installation points out of survey files (CSV, KML, KMZ),
//! joins them with signal-strength measurements by spherical proximity,
//! classifies the aggregated signal, and returns one work-order table plus
//! summary counters. The surrounding application (upload handling, table
//! editing, spreadsheet/PDF export) lives outside this crate.

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod error;
pub mod formats;
pub mod geo;
pub mod grouping;
pub mod models;
pub mod pipeline;
pub mod session;

pub use config::PipelineConfig;
pub use error::{FieldcovError, Result};
pub use pipeline::IngestionPipeline;
pub use session::{IngestSession, SessionState};
