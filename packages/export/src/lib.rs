#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CSV writers for analysis results.
//!
//! The column sets are load-bearing: downstream GIS tooling (ArcGIS,
//! QGIS) imports these files, so headers and order stay exactly as the
//! existing exports have them.

use std::io::Write;

use coverage_map_coverage_models::{CoverageResult, RegionCount};
use coverage_map_gap_models::{GapCandidate, GridCell};
use thiserror::Error;

/// Errors from result export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The CSV writer failed.
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    /// The underlying writer failed on flush.
    #[error("failed to flush CSV output: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes coverage rows as
/// `operator,technology,latitude,longitude,distance_km,confidence`.
///
/// # Errors
///
/// Returns [`ExportError`] if writing fails.
pub fn write_coverage_csv<W: Write>(out: W, result: &CoverageResult) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record([
        "operator",
        "technology",
        "latitude",
        "longitude",
        "distance_km",
        "confidence",
    ])?;

    for row in &result.rows {
        writer.write_record([
            row.site.operator.label().to_owned(),
            row.site.technology.label().to_owned(),
            row.site.latitude.to_string(),
            row.site.longitude.to_string(),
            format!("{:.3}", row.distance_km),
            row.confidence.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes scanned grid cells as `latitude,longitude,coverage_status`.
///
/// # Errors
///
/// Returns [`ExportError`] if writing fails.
pub fn write_coverage_grid_csv<W: Write>(out: W, cells: &[GridCell]) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["latitude", "longitude", "coverage_status"])?;

    for cell in cells {
        writer.write_record([
            cell.latitude.to_string(),
            cell.longitude.to_string(),
            cell.status.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes ranked tower recommendations as
/// `recommended_lat,recommended_lon,reason`.
///
/// # Errors
///
/// Returns [`ExportError`] if writing fails.
pub fn write_recommendations_csv<W: Write>(
    out: W,
    candidates: &[GapCandidate],
) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["recommended_lat", "recommended_lon", "reason"])?;

    for candidate in candidates {
        writer.write_record([
            candidate.latitude.to_string(),
            candidate.longitude.to_string(),
            candidate.reason.clone(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes per-state site counts as `state,total_sites`.
///
/// # Errors
///
/// Returns [`ExportError`] if writing fails.
pub fn write_state_density_csv<W: Write>(
    out: W,
    regions: &[RegionCount],
) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["state", "total_sites"])?;

    for region in regions {
        writer.write_record([region.region.clone(), region.total_sites.to_string()])?;
    }

    writer.flush()?;
    Ok(())
}
