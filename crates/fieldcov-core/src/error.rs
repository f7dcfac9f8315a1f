//! Error types for fieldcov

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FieldcovError {
    // Candidate file format errors
    #[error("{source_name}: missing required column(s): {}", .missing.join(", "))]
    MissingColumns {
        source_name: String,
        missing: Vec<String>,
    },

    #[error("{source_name}: row {row}: invalid coordinate value {value:?}")]
    InvalidCoordinate {
        source_name: String,
        row: usize,
        value: String,
    },

    #[error("{source_name}: not a well-formed KML document: {reason}")]
    MalformedKml { source_name: String, reason: String },

    #[error("{source_name}: archive must contain exactly one KML document, found {count}")]
    ArchiveContents { source_name: String, count: usize },

    #[error("{source_name}: no usable points after filtering")]
    NoUsablePoints { source_name: String },

    #[error("unsupported file extension {extension:?}, expected one of: {}", .supported.join(", "))]
    UnsupportedFormat {
        extension: String,
        supported: Vec<String>,
    },

    #[error("no candidate files supplied")]
    EmptyBatch,

    // Filename grouping errors
    #[error("filename {filename:?} does not encode child and parent location (expected Child_Parent)")]
    InvalidFilename { filename: String },

    #[error("candidate files resolve to different parent locations: {}", .parents.join(", "))]
    GroupMismatch { parents: Vec<String> },

    // Coverage file validation errors
    #[error("coverage file missing required column(s): {}", .missing.join(", "))]
    CoverageColumns { missing: Vec<String> },

    #[error("coverage file row {row}: {reason}")]
    CoverageValue { row: usize, reason: String },

    // Configuration errors
    #[error("invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

pub type Result<T> = std::result::Result<T, FieldcovError>;
