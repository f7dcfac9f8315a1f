//! KML reader for candidate survey exports.
//!
//! The survey tool exports one placemark per surveyed run. Only placemarks
//! whose name carries the export prefix are candidates; placemarks traced
//! over obstacles (marked in the description, or drawn with the reserved
//! obstacle line colour) are dropped. Every coordinate tuple of a surviving
//! placemark's geometry becomes one candidate point.

use kml::types::{Coord, Geometry, Placemark};
use kml::Kml;
use std::collections::HashMap;

use crate::error::{FieldcovError, Result};
use crate::formats::FormatReader;
use crate::models::GeoPoint;

/// Placemarks are kept only when their name starts with this token.
pub const PLACEMARK_PREFIX: &str = "MapExport";

/// Case-insensitive description marker for obstacle traces.
pub const OBSTACLE_MARKER: &str = "obstacle";

/// Reserved line colour (KML aabbggrr) marking obstacle traces.
pub const EXCLUDED_LINE_COLOR: &str = "ff0000ff";

/// Candidate-point reader for hierarchical KML documents.
#[derive(Debug)]
pub struct KmlReader;

impl FormatReader for KmlReader {
    fn read(&self, bytes: &[u8], source_name: &str) -> Result<Vec<GeoPoint>> {
        let content = String::from_utf8_lossy(bytes);
        let document: Kml = content
            .parse()
            .map_err(|e: kml::Error| FieldcovError::MalformedKml {
                source_name: source_name.to_string(),
                reason: e.to_string(),
            })?;

        // First pass: the document-level style table, so placemark styleUrl
        // references can be resolved to a line colour.
        let mut styles = StyleTable::default();
        collect_styles(&document, &mut styles);

        let mut points = Vec::new();
        let mut kept = 0usize;
        walk_placemarks(&document, &mut |placemark| {
            if !keep_placemark(placemark, &styles) {
                return;
            }
            kept += 1;
            let label = placemark.name.clone().unwrap_or_default();
            if let Some(geometry) = &placemark.geometry {
                collect_coords(geometry, &mut |coord| {
                    // Tuples are lon,lat[,alt]; altitude is ignored and
                    // malformed (non-finite) tuples are skipped.
                    if coord.x.is_finite() && coord.y.is_finite() {
                        points.push(GeoPoint::new(coord.y, coord.x, label.clone()));
                    }
                });
            }
        });

        if kept == 0 || points.is_empty() {
            return Err(FieldcovError::NoUsablePoints {
                source_name: source_name.to_string(),
            });
        }
        Ok(points)
    }

    fn supported_extensions(&self) -> &[&str] {
        &["kml"]
    }

    fn format_name(&self) -> &str {
        "KML"
    }
}

/// Document-level style id → line colour map, with StyleMap aliases.
#[derive(Debug, Default)]
struct StyleTable {
    line_colors: HashMap<String, String>,
    aliases: HashMap<String, String>,
}

impl StyleTable {
    /// Resolve a placemark styleUrl (with or without a leading `#`) to a
    /// line colour, following one StyleMap indirection.
    fn line_color(&self, style_url: &str) -> Option<&str> {
        let id = style_url.trim_start_matches('#');
        self.line_colors
            .get(id)
            .or_else(|| {
                self.aliases
                    .get(id)
                    .and_then(|target| self.line_colors.get(target))
            })
            .map(String::as_str)
    }
}

fn collect_styles(node: &Kml, table: &mut StyleTable) {
    match node {
        Kml::KmlDocument(doc) => {
            for element in &doc.elements {
                collect_styles(element, table);
            }
        }
        Kml::Document { elements, .. } | Kml::Folder { elements, .. } => {
            for element in elements {
                collect_styles(element, table);
            }
        }
        Kml::Style(style) => {
            if let (Some(id), Some(line)) = (&style.id, &style.line) {
                table.line_colors.insert(id.clone(), line.color.clone());
            }
        }
        Kml::StyleMap(map) => {
            if let Some(id) = &map.id {
                if let Some(pair) = map.pairs.iter().find(|p| p.key == "normal") {
                    table
                        .aliases
                        .insert(id.clone(), pair.style_url.trim_start_matches('#').to_string());
                }
            }
        }
        _ => {}
    }
}

fn walk_placemarks(node: &Kml, visit: &mut dyn FnMut(&Placemark)) {
    match node {
        Kml::KmlDocument(doc) => {
            for element in &doc.elements {
                walk_placemarks(element, visit);
            }
        }
        Kml::Document { elements, .. } | Kml::Folder { elements, .. } => {
            for element in elements {
                walk_placemarks(element, visit);
            }
        }
        Kml::Placemark(placemark) => visit(placemark),
        _ => {}
    }
}

/// Inclusion filter: the name must carry the export prefix; obstacle traces
/// (by description marker or reserved line colour) are dropped.
fn keep_placemark(placemark: &Placemark, styles: &StyleTable) -> bool {
    let name = match &placemark.name {
        Some(name) => name,
        None => return false,
    };
    if !name.starts_with(PLACEMARK_PREFIX) {
        return false;
    }
    if let Some(description) = &placemark.description {
        if description.to_lowercase().contains(OBSTACLE_MARKER) {
            return false;
        }
    }
    if let Some(style_url) = style_reference(placemark) {
        if styles
            .line_color(style_url)
            .is_some_and(|color| color.eq_ignore_ascii_case(EXCLUDED_LINE_COLOR))
        {
            return false;
        }
    }
    true
}

/// The placemark's styleUrl, whether the parser surfaced it as a field or
/// left it among the unparsed child elements.
fn style_reference(placemark: &Placemark) -> Option<&str> {
    if let Some(url) = &placemark.style_url {
        return Some(url);
    }
    placemark
        .children
        .iter()
        .find(|element| element.name == "styleUrl")
        .and_then(|element| element.content.as_deref())
}

fn collect_coords(geometry: &Geometry, push: &mut dyn FnMut(&Coord)) {
    match geometry {
        Geometry::Point(point) => push(&point.coord),
        Geometry::LineString(line) => {
            for coord in &line.coords {
                push(coord);
            }
        }
        Geometry::LinearRing(ring) => {
            for coord in &ring.coords {
                push(coord);
            }
        }
        Geometry::Polygon(polygon) => {
            for coord in &polygon.outer.coords {
                push(coord);
            }
            for ring in &polygon.inner {
                for coord in &ring.coords {
                    push(coord);
                }
            }
        }
        Geometry::MultiGeometry(multi) => {
            for geometry in &multi.geometries {
                collect_coords(geometry, push);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAME: &str = "ChildB_ParentX.kml";

    fn wrap(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
{body}
  </Document>
</kml>"#
        )
    }

    #[test]
    fn test_linestring_emits_one_point_per_tuple() {
        let doc = wrap(
            r#"    <Placemark>
      <name>MapExport_1</name>
      <LineString>
        <coordinates>
          -17.45,14.70,0
          -17.46,14.71,0
          -17.47,14.72,0
        </coordinates>
      </LineString>
    </Placemark>"#,
        );
        let points = KmlReader.read(doc.as_bytes(), NAME).unwrap();
        assert_eq!(points.len(), 3);
        // Axis order in the file is lon,lat.
        assert_eq!(points[0].latitude, 14.70);
        assert_eq!(points[0].longitude, -17.45);
        assert_eq!(points[0].source_label, "MapExport_1");
    }

    #[test]
    fn test_wrong_prefix_is_dropped() {
        let doc = wrap(
            r#"    <Placemark>
      <name>Other_1</name>
      <Point><coordinates>-17.45,14.70</coordinates></Point>
    </Placemark>"#,
        );
        let err = KmlReader.read(doc.as_bytes(), NAME).unwrap_err();
        assert!(matches!(err, FieldcovError::NoUsablePoints { .. }));
    }

    #[test]
    fn test_obstacle_description_is_dropped_case_insensitively() {
        let doc = wrap(
            r#"    <Placemark>
      <name>MapExport_1</name>
      <description>OBSTACLE near pole</description>
      <Point><coordinates>-17.45,14.70</coordinates></Point>
    </Placemark>
    <Placemark>
      <name>MapExport_2</name>
      <description>clear span</description>
      <Point><coordinates>-17.46,14.71</coordinates></Point>
    </Placemark>"#,
        );
        let points = KmlReader.read(doc.as_bytes(), NAME).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].source_label, "MapExport_2");
    }

    #[test]
    fn test_reserved_line_color_is_dropped_via_style_url() {
        let doc = wrap(
            r#"    <Style id="blocked"><LineStyle><color>ff0000ff</color></LineStyle></Style>
    <Style id="clear"><LineStyle><color>ff00ff00</color></LineStyle></Style>
    <Placemark>
      <name>MapExport_1</name>
      <styleUrl>#blocked</styleUrl>
      <Point><coordinates>-17.45,14.70</coordinates></Point>
    </Placemark>
    <Placemark>
      <name>MapExport_2</name>
      <styleUrl>#clear</styleUrl>
      <Point><coordinates>-17.46,14.71</coordinates></Point>
    </Placemark>"#,
        );
        let points = KmlReader.read(doc.as_bytes(), NAME).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].source_label, "MapExport_2");
    }

    #[test]
    fn test_style_map_indirection_resolves_to_line_color() {
        let doc = wrap(
            r#"    <Style id="blocked-normal"><LineStyle><color>ff0000ff</color></LineStyle></Style>
    <StyleMap id="blocked">
      <Pair><key>normal</key><styleUrl>#blocked-normal</styleUrl></Pair>
      <Pair><key>highlight</key><styleUrl>#blocked-normal</styleUrl></Pair>
    </StyleMap>
    <Placemark>
      <name>MapExport_1</name>
      <styleUrl>#blocked</styleUrl>
      <Point><coordinates>-17.45,14.70</coordinates></Point>
    </Placemark>
    <Placemark>
      <name>MapExport_2</name>
      <Point><coordinates>-17.46,14.71</coordinates></Point>
    </Placemark>"#,
        );
        let points = KmlReader.read(doc.as_bytes(), NAME).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].source_label, "MapExport_2");
    }

    #[test]
    fn test_placemarks_inside_folders_are_walked() {
        let doc = wrap(
            r#"    <Folder>
      <name>Zone 3</name>
      <Placemark>
        <name>MapExport_9</name>
        <Point><coordinates>-17.45,14.70</coordinates></Point>
      </Placemark>
    </Folder>"#,
        );
        let points = KmlReader.read(doc.as_bytes(), NAME).unwrap();
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn test_polygon_rings_contribute_points() {
        let doc = wrap(
            r#"    <Placemark>
      <name>MapExport_1</name>
      <Polygon>
        <outerBoundaryIs>
          <LinearRing>
            <coordinates>
              -17.45,14.70 -17.46,14.70 -17.46,14.71 -17.45,14.70
            </coordinates>
          </LinearRing>
        </outerBoundaryIs>
      </Polygon>
    </Placemark>"#,
        );
        let points = KmlReader.read(doc.as_bytes(), NAME).unwrap();
        assert_eq!(points.len(), 4);
    }

    #[test]
    fn test_malformed_document_is_rejected() {
        let err = KmlReader.read(b"not xml at all", NAME).unwrap_err();
        assert!(matches!(err, FieldcovError::MalformedKml { .. }));
    }
}
