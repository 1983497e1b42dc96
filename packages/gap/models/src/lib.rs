#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Gap scan parameter and result types.
//!
//! Plain data exchanged between the gap recommender and its callers:
//! scan parameters with documented defaults, the scanned grid cells,
//! and the ranked tower-site candidates.

use coverage_map_site_models::Technology;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

/// Geographic bounding box in degrees (south/west/north/east).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    /// Southern latitude bound.
    pub south: f64,
    /// Western longitude bound.
    pub west: f64,
    /// Northern latitude bound.
    pub north: f64,
    /// Eastern longitude bound.
    pub east: f64,
}

impl BoundingBox {
    /// Builds a box centered on a point with a half-extent in degrees
    /// on each axis.
    #[must_use]
    pub const fn around(latitude: f64, longitude: f64, half_extent_deg: f64) -> Self {
        Self {
            south: latitude - half_extent_deg,
            west: longitude - half_extent_deg,
            north: latitude + half_extent_deg,
            east: longitude + half_extent_deg,
        }
    }
}

/// Parameters for the grid-scan gap search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GapScanParams {
    /// Region to scan.
    pub bbox: BoundingBox,
    /// Grid step in degrees (default 0.05, roughly 5 km).
    pub step_deg: f64,
    /// A cell whose nearest site is farther than this is uncovered
    /// (default 8 km). Independent of any coverage query radius.
    pub min_signal_km: f64,
    /// Hard cap on grid cells; scans implying more are rejected before
    /// any distance work starts (default 250 000).
    pub max_cells: usize,
}

impl GapScanParams {
    /// Default scan over a bounding box.
    #[must_use]
    pub const fn over(bbox: BoundingBox) -> Self {
        Self {
            bbox,
            step_deg: 0.05,
            min_signal_km: 8.0,
            max_cells: 250_000,
        }
    }
}

/// Weights for the gap candidate score.
///
/// `score = extent_weight * normalized_extent
///        + distance_weight * normalized_distance`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringWeights {
    /// Weight on the uncovered extent around the cell.
    pub extent_weight: f64,
    /// Weight on the distance to the nearest site.
    pub distance_weight: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            extent_weight: 0.6,
            distance_weight: 0.4,
        }
    }
}

/// Distance bands for the static technology recommendation.
///
/// Candidates close to existing infrastructure get a high-capacity
/// urban-infill recommendation; remote ones get wide-area coverage
/// layers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnologyPolicy {
    /// Nearest-site distance (km) below which 4G infill is recommended.
    pub urban_infill_km: f64,
    /// Nearest-site distance (km) below which 3G is recommended; beyond
    /// it, a 2G wide-area layer.
    pub suburban_km: f64,
}

impl Default for TechnologyPolicy {
    fn default() -> Self {
        Self {
            urban_infill_km: 12.0,
            suburban_km: 25.0,
        }
    }
}

impl TechnologyPolicy {
    /// Recommended technology for a gap whose nearest site is
    /// `nearest_km` away.
    #[must_use]
    pub fn recommend(self, nearest_km: f64) -> Technology {
        if nearest_km < self.urban_infill_km {
            Technology::FourG
        } else if nearest_km < self.suburban_km {
            Technology::ThreeG
        } else {
            Technology::TwoG
        }
    }
}

/// Coverage status of one scanned grid cell.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr,
)]
pub enum CoverageStatus {
    /// Nearest site is within the minimum signal distance.
    #[strum(serialize = "Covered")]
    Covered,
    /// Nearest site is farther than the minimum signal distance.
    #[strum(serialize = "No Coverage")]
    NoCoverage,
}

/// One scanned grid cell with its nearest-site distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCell {
    /// Cell center latitude.
    pub latitude: f64,
    /// Cell center longitude.
    pub longitude: f64,
    /// Distance (km) from the cell center to the nearest site.
    pub nearest_site_distance_km: f64,
    /// Covered / uncovered classification at `min_signal_km`.
    pub status: CoverageStatus,
}

/// A recommended underserved location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GapCandidate {
    /// Candidate latitude (uncovered cell center).
    pub latitude: f64,
    /// Candidate longitude (uncovered cell center).
    pub longitude: f64,
    /// Distance (km) to the nearest existing site.
    pub nearest_site_distance_km: f64,
    /// Proxy for how significant the gap is: the count of uncovered
    /// cells in the candidate's neighborhood, scaled by cell area (km²).
    pub extent_km2: f64,
    /// Composite score the ranking is built from.
    pub score: f64,
    /// 1 = highest priority, assigned by descending score.
    pub priority_rank: usize,
    /// Static distance-banded technology recommendation.
    pub recommended_technology: Technology,
    /// Human-readable justification carried into exports.
    pub reason: String,
}

/// Result of one gap scan: the full grid plus the ranked candidates.
///
/// An empty `candidates` vector means the scanned region is fully
/// covered; callers render a "no gaps" outcome, never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GapScanResult {
    /// Every scanned cell, row-major from the south-west corner.
    pub cells: Vec<GridCell>,
    /// Uncovered cells ranked by descending score, rank 1 first.
    pub candidates: Vec<GapCandidate>,
}
