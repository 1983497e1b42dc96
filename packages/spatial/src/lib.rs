#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! In-memory boundary polygon index.
//!
//! Loads national/state boundary polygons from a `GeoJSON` file, builds
//! an R-tree spatial index, and provides fast point-in-polygon lookups.
//! Used by the gap scanner to clip grid cells to the national boundary
//! and by ingestion to attribute sites to a state.

use std::path::Path;

use geo::{Area, BoundingRect, Contains, MultiPolygon};
use geojson::{FeatureCollection, GeoJson};
use rstar::{AABB, RTree, RTreeObject};
use thiserror::Error;

/// Property keys tried, in order, when naming a boundary feature.
const NAME_KEYS: &[&str] = &["name", "NAME_1", "state", "admin1Name"];

/// Errors from boundary loading.
#[derive(Debug, Error)]
pub enum BoundaryError {
    /// The boundary file could not be read.
    #[error("failed to read boundary file: {0}")]
    Io(#[from] std::io::Error),

    /// The file was not valid `GeoJSON`.
    #[error("failed to parse boundary GeoJSON: {0}")]
    Parse(#[from] geojson::Error),

    /// The file parsed but contained no usable polygon.
    #[error("boundary GeoJSON contains no Polygon or MultiPolygon geometry")]
    NoPolygons,
}

/// A boundary polygon stored in the R-tree with its metadata.
#[derive(Debug)]
struct BoundaryEntry {
    name: Option<String>,
    area_deg2: f64,
    envelope: AABB<[f64; 2]>,
    polygon: MultiPolygon<f64>,
}

impl RTreeObject for BoundaryEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Pre-built spatial index over boundary polygons.
///
/// Constructed once per process and shared read-only across all
/// consumers.
#[derive(Debug)]
pub struct BoundaryIndex {
    regions: RTree<BoundaryEntry>,
    bbox: Option<(f64, f64, f64, f64)>,
}

impl BoundaryIndex {
    /// Loads boundary polygons from a `GeoJSON` file.
    ///
    /// Accepts a `FeatureCollection` (one entry per feature, named from
    /// its properties where possible), a single `Feature`, or a bare
    /// geometry.
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryError`] if the file cannot be read or parsed,
    /// or contains no polygonal geometry.
    pub fn load(path: &Path) -> Result<Self, BoundaryError> {
        let raw = std::fs::read_to_string(path)?;
        let index = Self::from_geojson_str(&raw)?;
        log::info!(
            "Loaded {} boundary polygon(s) from {}",
            index.regions.size(),
            path.display()
        );
        Ok(index)
    }

    /// Builds the index from `GeoJSON` text.
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryError`] if parsing fails or no polygon is found.
    pub fn from_geojson_str(raw: &str) -> Result<Self, BoundaryError> {
        let geojson: GeoJson = raw.parse()?;

        let mut entries = Vec::new();
        match geojson {
            GeoJson::FeatureCollection(FeatureCollection { features, .. }) => {
                for feature in features {
                    let name = feature_name(&feature);
                    let Some(geometry) = feature.geometry else {
                        continue;
                    };
                    match to_multipolygon(&geometry) {
                        Some(mp) => entries.push(make_entry(name, mp)),
                        None => {
                            log::warn!(
                                "Skipping non-polygonal boundary feature {:?}",
                                feature.id
                            );
                        }
                    }
                }
            }
            GeoJson::Feature(feature) => {
                let name = feature_name(&feature);
                if let Some(mp) = feature.geometry.as_ref().and_then(to_multipolygon) {
                    entries.push(make_entry(name, mp));
                }
            }
            GeoJson::Geometry(geometry) => {
                if let Some(mp) = to_multipolygon(&geometry) {
                    entries.push(make_entry(None, mp));
                }
            }
        }

        if entries.is_empty() {
            return Err(BoundaryError::NoPolygons);
        }

        let bbox = overall_bbox(&entries);

        Ok(Self {
            regions: RTree::bulk_load(entries),
            bbox,
        })
    }

    /// Number of boundary polygons in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.size()
    }

    /// Whether the index holds no polygons (loading rejects empty
    /// inputs, so this is only true for a default-constructed tree).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.size() == 0
    }

    /// Whether any boundary polygon contains the point.
    #[must_use]
    pub fn contains(&self, lng: f64, lat: f64) -> bool {
        let point = geo::Point::new(lng, lat);
        let query_env = AABB::from_point([lng, lat]);

        self.regions
            .locate_in_envelope_intersecting(&query_env)
            .any(|entry| entry.polygon.contains(&point))
    }

    /// Look up the region name for a point.
    ///
    /// State polygons can overlap slightly at shared borders; the
    /// smallest area wins.
    #[must_use]
    pub fn lookup_region(&self, lng: f64, lat: f64) -> Option<&str> {
        let point = geo::Point::new(lng, lat);
        let query_env = AABB::from_point([lng, lat]);

        let mut best: Option<&BoundaryEntry> = None;

        for entry in self.regions.locate_in_envelope_intersecting(&query_env) {
            if entry.polygon.contains(&point) {
                match best {
                    None => best = Some(entry),
                    Some(current) if entry.area_deg2 < current.area_deg2 => {
                        best = Some(entry);
                    }
                    _ => {}
                }
            }
        }

        best.and_then(|e| e.name.as_deref())
    }

    /// Bounding box over every polygon as `(west, south, east, north)`.
    #[must_use]
    pub const fn bounding_box(&self) -> Option<(f64, f64, f64, f64)> {
        self.bbox
    }
}

fn make_entry(name: Option<String>, polygon: MultiPolygon<f64>) -> BoundaryEntry {
    BoundaryEntry {
        name,
        area_deg2: polygon.unsigned_area(),
        envelope: compute_envelope(&polygon),
        polygon,
    }
}

/// First matching name property on a feature, if any.
fn feature_name(feature: &geojson::Feature) -> Option<String> {
    let properties = feature.properties.as_ref()?;
    NAME_KEYS
        .iter()
        .find_map(|key| properties.get(*key))
        .and_then(|value| value.as_str())
        .map(ToOwned::to_owned)
}

/// Convert a `GeoJSON` geometry into a [`MultiPolygon`].
/// Handles both `Polygon` and `MultiPolygon` geometry types.
fn to_multipolygon(geometry: &geojson::Geometry) -> Option<MultiPolygon<f64>> {
    let geo_geom: geo::Geometry<f64> = geometry.value.clone().try_into().ok()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}

/// Compute the bounding box envelope for a [`MultiPolygon`].
fn compute_envelope(mp: &MultiPolygon<f64>) -> AABB<[f64; 2]> {
    mp.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}

fn overall_bbox(entries: &[BoundaryEntry]) -> Option<(f64, f64, f64, f64)> {
    let mut iter = entries.iter().map(|e| {
        let lower = e.envelope.lower();
        let upper = e.envelope.upper();
        (lower[0], lower[1], upper[0], upper[1])
    });

    let first = iter.next()?;
    Some(iter.fold(first, |acc, next| {
        (
            acc.0.min(next.0),
            acc.1.min(next.1),
            acc.2.max(next.2),
            acc.3.max(next.3),
        )
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two adjacent unit squares named Lagos and Ogun.
    const TWO_STATES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"name": "Lagos"},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[3.0, 6.0], [4.0, 6.0], [4.0, 7.0], [3.0, 7.0], [3.0, 6.0]]]
                }
            },
            {
                "type": "Feature",
                "properties": {"name": "Ogun"},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[3.0, 7.0], [4.0, 7.0], [4.0, 8.0], [3.0, 8.0], [3.0, 7.0]]]
                }
            }
        ]
    }"#;

    #[test]
    fn loads_feature_collection() {
        let index = BoundaryIndex::from_geojson_str(TWO_STATES).unwrap();
        assert_eq!(index.len(), 2);
        assert!(!index.is_empty());
    }

    #[test]
    fn contains_inside_and_outside() {
        let index = BoundaryIndex::from_geojson_str(TWO_STATES).unwrap();
        assert!(index.contains(3.5, 6.5));
        assert!(index.contains(3.5, 7.5));
        assert!(!index.contains(5.0, 6.5));
    }

    #[test]
    fn region_lookup_names_the_state() {
        let index = BoundaryIndex::from_geojson_str(TWO_STATES).unwrap();
        assert_eq!(index.lookup_region(3.5, 6.5), Some("Lagos"));
        assert_eq!(index.lookup_region(3.5, 7.5), Some("Ogun"));
        assert_eq!(index.lookup_region(5.0, 6.5), None);
    }

    #[test]
    fn bounding_box_spans_all_polygons() {
        let index = BoundaryIndex::from_geojson_str(TWO_STATES).unwrap();
        let (west, south, east, north) = index.bounding_box().unwrap();
        assert!((west - 3.0).abs() < 1e-12);
        assert!((south - 6.0).abs() < 1e-12);
        assert!((east - 4.0).abs() < 1e-12);
        assert!((north - 8.0).abs() < 1e-12);
    }

    #[test]
    fn bare_geometry_is_accepted() {
        let raw = r#"{
            "type": "Polygon",
            "coordinates": [[[3.0, 6.0], [4.0, 6.0], [4.0, 7.0], [3.0, 7.0], [3.0, 6.0]]]
        }"#;
        let index = BoundaryIndex::from_geojson_str(raw).unwrap();
        assert_eq!(index.len(), 1);
        assert!(index.contains(3.5, 6.5));
        assert_eq!(index.lookup_region(3.5, 6.5), None);
    }

    #[test]
    fn rejects_non_polygonal_input() {
        let raw = r#"{"type": "Point", "coordinates": [3.0, 6.0]}"#;
        let err = BoundaryIndex::from_geojson_str(raw).unwrap_err();
        assert!(matches!(err, BoundaryError::NoPolygons));
    }
}
