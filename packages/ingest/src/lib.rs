#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Site data provider.
//!
//! Loads the site CSV against an explicit schema: each logical column
//! has a fixed set of accepted header spellings (the ones that occur in
//! real exports, e.g. `Network_Provider` vs `Operator`), and a file
//! missing a required column is rejected up front. Rows with
//! non-finite or out-of-range coordinates are dropped with a warning,
//! never carried into the analysis engine.

use std::io::Read;
use std::path::Path;

use coverage_map_site_models::{Operator, Site, Technology};
use coverage_map_spatial::BoundaryIndex;
use thiserror::Error;

/// Accepted header spellings for the latitude column.
const LATITUDE_HEADERS: &[&str] = &["Latitude", "latitude", "Lat", "lat"];
/// Accepted header spellings for the longitude column.
const LONGITUDE_HEADERS: &[&str] = &["Longitude", "longitude", "Lon", "lon", "Lng", "lng"];
/// Accepted header spellings for the operator column.
const OPERATOR_HEADERS: &[&str] = &[
    "Network_Provider",
    "network_provider",
    "Operator",
    "operator",
    "Provider",
    "provider",
];
/// Accepted header spellings for the technology column.
const TECHNOLOGY_HEADERS: &[&str] = &["Technology", "technology", "Tech", "tech"];
/// Accepted header spellings for the optional region column.
const REGION_HEADERS: &[&str] = &["State", "state", "Region", "region"];

/// Errors from site loading.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The CSV file could not be read.
    #[error("failed to read site CSV: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV was malformed at the format level.
    #[error("failed to parse site CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A required column was missing from the header row.
    #[error("missing required column {column} (accepted spellings: {accepted:?})")]
    MissingColumn {
        /// Logical column name.
        column: &'static str,
        /// Header spellings that would have matched.
        accepted: &'static [&'static str],
    },

    /// Every row was dropped during validation.
    #[error("no valid sites in file: all {dropped} row(s) failed validation")]
    NoValidSites {
        /// Number of rows rejected.
        dropped: usize,
    },
}

/// Outcome of a site load: the validated collection plus the number of
/// rows dropped on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    /// Validated, analysis-ready sites.
    pub sites: Vec<Site>,
    /// Rows rejected for unparseable or out-of-range coordinates.
    pub dropped: usize,
}

/// Resolved column indexes for one file's header row.
struct SchemaIndexes {
    latitude: usize,
    longitude: usize,
    operator: usize,
    technology: usize,
    region: Option<usize>,
}

impl SchemaIndexes {
    fn resolve(headers: &csv::StringRecord) -> Result<Self, IngestError> {
        Ok(Self {
            latitude: find_column(headers, "latitude", LATITUDE_HEADERS)?,
            longitude: find_column(headers, "longitude", LONGITUDE_HEADERS)?,
            operator: find_column(headers, "operator", OPERATOR_HEADERS)?,
            technology: find_column(headers, "technology", TECHNOLOGY_HEADERS)?,
            region: REGION_HEADERS
                .iter()
                .find_map(|name| headers.iter().position(|h| h.trim() == *name)),
        })
    }
}

fn find_column(
    headers: &csv::StringRecord,
    column: &'static str,
    accepted: &'static [&'static str],
) -> Result<usize, IngestError> {
    accepted
        .iter()
        .find_map(|name| headers.iter().position(|h| h.trim() == *name))
        .ok_or(IngestError::MissingColumn { column, accepted })
}

/// Loads and validates the site collection from a CSV file.
///
/// # Errors
///
/// Returns [`IngestError`] if the file cannot be read, a required
/// column is missing, or no row survives validation.
pub fn load_sites(path: &Path) -> Result<LoadReport, IngestError> {
    let file = std::fs::File::open(path)?;
    let report = load_sites_from_reader(file)?;
    log::info!(
        "Loaded {} sites from {} ({} row(s) dropped)",
        report.sites.len(),
        path.display(),
        report.dropped
    );
    Ok(report)
}

/// Loads and validates sites from any CSV reader.
///
/// # Errors
///
/// Returns [`IngestError`] under the same conditions as [`load_sites`].
pub fn load_sites_from_reader<R: Read>(reader: R) -> Result<LoadReport, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let schema = SchemaIndexes::resolve(csv_reader.headers()?)?;

    let mut sites = Vec::new();
    let mut dropped = 0_usize;

    for (row_number, record) in csv_reader.records().enumerate() {
        let record = record?;
        match parse_row(&schema, &record) {
            Ok(site) => sites.push(site),
            Err(reason) => {
                dropped += 1;
                // Header is row 1, so data rows start at 2.
                log::warn!("dropping row {}: {reason}", row_number + 2);
            }
        }
    }

    if sites.is_empty() {
        return Err(IngestError::NoValidSites { dropped });
    }

    Ok(LoadReport { sites, dropped })
}

fn parse_row(schema: &SchemaIndexes, record: &csv::StringRecord) -> Result<Site, String> {
    let latitude = parse_coordinate(record.get(schema.latitude), "latitude")?;
    let longitude = parse_coordinate(record.get(schema.longitude), "longitude")?;

    let operator = record
        .get(schema.operator)
        .map_or(Operator::Unknown, Operator::from_source);
    let technology = record
        .get(schema.technology)
        .map_or(Technology::Unknown, Technology::from_source);

    let region = schema
        .region
        .and_then(|index| record.get(index))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned);

    Site::new(latitude, longitude, operator, technology, region).map_err(|e| e.to_string())
}

fn parse_coordinate(field: Option<&str>, axis: &str) -> Result<f64, String> {
    let raw = field.map(str::trim).filter(|s| !s.is_empty());
    let Some(raw) = raw else {
        return Err(format!("{axis} is empty"));
    };
    raw.parse::<f64>()
        .map_err(|_| format!("{axis} is not numeric: {raw:?}"))
}

/// Fills in missing site regions by point-in-polygon lookup against
/// state boundary polygons. Returns the number of sites attributed.
///
/// Sites that already carry a region keep it; sites outside every
/// polygon stay unattributed.
pub fn attribute_regions(sites: &mut [Site], boundaries: &BoundaryIndex) -> usize {
    let mut attributed = 0;
    for site in sites.iter_mut() {
        if site.region.is_some() {
            continue;
        }
        if let Some(region) = boundaries.lookup_region(site.longitude, site.latitude) {
            site.region = Some(region.to_owned());
            attributed += 1;
        }
    }
    if attributed > 0 {
        log::info!("attributed {attributed} site(s) to a state by boundary lookup");
    }
    attributed
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD_CSV: &str = "\
Latitude,Longitude,Network_Provider,Technology,State
6.5244,3.3792,MTN,4G,Lagos
9.0765,7.3986,Glo,2G,FCT
6.4500,3.3900,9Mobile,3G,
";

    #[test]
    fn loads_valid_rows() {
        let report = load_sites_from_reader(GOOD_CSV.as_bytes()).unwrap();
        assert_eq!(report.sites.len(), 3);
        assert_eq!(report.dropped, 0);
        assert_eq!(report.sites[0].operator, Operator::Mtn);
        assert_eq!(report.sites[1].operator, Operator::Globacom);
        assert_eq!(report.sites[1].region.as_deref(), Some("FCT"));
        assert_eq!(report.sites[2].region, None);
    }

    #[test]
    fn accepts_alternate_header_spellings() {
        let csv = "lat,lng,Operator,tech\n6.5,3.4,Airtel,4G\n";
        let report = load_sites_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(report.sites.len(), 1);
        assert_eq!(report.sites[0].operator, Operator::Airtel);
        assert_eq!(report.sites[0].region, None);
    }

    #[test]
    fn drops_bad_coordinate_rows() {
        let csv = "\
Latitude,Longitude,Operator,Technology
6.5,3.4,MTN,4G
not-a-number,3.4,MTN,4G
95.0,3.4,MTN,4G
6.5,,MTN,4G
";
        let report = load_sites_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(report.sites.len(), 1);
        assert_eq!(report.dropped, 3);
    }

    #[test]
    fn missing_column_is_an_error() {
        let csv = "Latitude,Operator,Technology\n6.5,MTN,4G\n";
        let err = load_sites_from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            IngestError::MissingColumn {
                column: "longitude",
                ..
            }
        ));
    }

    #[test]
    fn all_rows_dropped_is_an_error() {
        let csv = "Latitude,Longitude,Operator,Technology\nx,y,MTN,4G\n";
        let err = load_sites_from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, IngestError::NoValidSites { dropped: 1 }));
    }

    #[test]
    fn unknown_operator_and_technology_fall_back() {
        let csv = "Latitude,Longitude,Operator,Technology\n6.5,3.4,Vodafone,5G\n";
        let report = load_sites_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(report.sites[0].operator, Operator::Unknown);
        assert_eq!(report.sites[0].technology, Technology::Unknown);
    }

    #[test]
    fn attributes_regions_from_boundaries() {
        let boundary = BoundaryIndex::from_geojson_str(
            r#"{
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "properties": {"name": "Lagos"},
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[3.0, 6.0], [4.0, 6.0], [4.0, 7.0], [3.0, 7.0], [3.0, 6.0]]]
                    }
                }]
            }"#,
        )
        .unwrap();

        let csv = "\
Latitude,Longitude,Operator,Technology,State
6.5,3.4,MTN,4G,
6.5,3.4,MTN,4G,Kept
9.1,7.4,Glo,2G,
";
        let mut report = load_sites_from_reader(csv.as_bytes()).unwrap();
        let attributed = attribute_regions(&mut report.sites, &boundary);
        assert_eq!(attributed, 1);
        assert_eq!(report.sites[0].region.as_deref(), Some("Lagos"));
        assert_eq!(report.sites[1].region.as_deref(), Some("Kept"));
        assert_eq!(report.sites[2].region, None);
    }
}
