//! KMZ reader: a zip archive wrapping exactly one KML document.

use std::io::{Cursor, Read};
use zip::ZipArchive;

use crate::error::{FieldcovError, Result};
use crate::formats::kml::KmlReader;
use crate::formats::FormatReader;
use crate::models::GeoPoint;

/// Candidate-point reader for zipped KML archives.
#[derive(Debug)]
pub struct KmzReader;

impl FormatReader for KmzReader {
    fn read(&self, bytes: &[u8], source_name: &str) -> Result<Vec<GeoPoint>> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;

        let mut kml_members = Vec::new();
        for index in 0..archive.len() {
            let member = archive.by_index(index)?;
            if member.name().to_ascii_lowercase().ends_with(".kml") {
                kml_members.push(index);
            }
        }
        let member_index = match kml_members.as_slice() {
            [index] => *index,
            _ => {
                return Err(FieldcovError::ArchiveContents {
                    source_name: source_name.to_string(),
                    count: kml_members.len(),
                })
            }
        };

        let mut member = archive.by_index(member_index)?;
        let mut content = Vec::with_capacity(member.size() as usize);
        member.read_to_end(&mut content)?;
        KmlReader.read(&content, source_name)
    }

    fn supported_extensions(&self) -> &[&str] {
        &["kmz"]
    }

    fn format_name(&self) -> &str {
        "KMZ"
    }
}
