//! Format abstraction for candidate survey files.
//!
//! Each supported input format implements the `FormatReader` trait; the
//! `FormatRegistry` detects the format from the upload's file extension and
//! dispatches to the matching reader. Readers consume raw in-memory byte
//! streams (the host hands over uploaded buffers, never paths), so the trait
//! is synchronous.

use crate::error::{FieldcovError, Result};
use crate::models::GeoPoint;

pub mod csv;
pub mod kml;
pub mod kmz;

use self::csv::CsvReader;
use self::kml::KmlReader;
use self::kmz::KmzReader;

/// A reader for one candidate-point input format.
pub trait FormatReader: Send + Sync + std::fmt::Debug {
    /// Decode one uploaded byte stream into candidate points.
    ///
    /// `source_name` is the upload's filename, used for error context and,
    /// in some formats, provenance labels.
    fn read(&self, bytes: &[u8], source_name: &str) -> Result<Vec<GeoPoint>>;

    /// Supported file extensions, lowercase (e.g. ["kml"]).
    fn supported_extensions(&self) -> &[&str];

    /// Human-readable format name (e.g. "KML").
    fn format_name(&self) -> &str;
}

/// Registry of format readers with extension-based detection.
pub struct FormatRegistry {
    readers: Vec<Box<dyn FormatReader>>,
}

impl FormatRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            readers: Vec::new(),
        }
    }

    /// Registry with the three built-in readers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(CsvReader));
        registry.register(Box::new(KmlReader));
        registry.register(Box::new(KmzReader));
        registry
    }

    pub fn register(&mut self, reader: Box<dyn FormatReader>) {
        self.readers.push(reader);
    }

    /// Find the reader responsible for a filename's extension.
    pub fn detect(&self, filename: &str) -> Result<&dyn FormatReader> {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        self.readers
            .iter()
            .find(|r| r.supported_extensions().contains(&extension.as_str()))
            .map(|r| r.as_ref())
            .ok_or_else(|| FieldcovError::UnsupportedFormat {
                extension,
                supported: self.supported_formats(),
            })
    }

    /// All supported extensions across registered readers.
    pub fn supported_formats(&self) -> Vec<String> {
        self.readers
            .iter()
            .flat_map(|r| r.supported_extensions())
            .map(|s| s.to_string())
            .collect()
    }

    /// Detect the format of `filename` and decode `bytes` with it.
    pub fn read_source(&self, bytes: &[u8], filename: &str) -> Result<Vec<GeoPoint>> {
        self.detect(filename)?.read(bytes, filename)
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
