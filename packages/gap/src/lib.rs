#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Gap and tower-site recommender.
//!
//! Overlays a regular lat/lon grid on a bounding box, computes the
//! distance from every cell center to the nearest site in one pass per
//! cell, and turns cells beyond the minimum signal distance into ranked
//! new-tower candidates. Optionally clips the grid to a national
//! boundary so offshore cells never become recommendations.
//!
//! The grid is the expensive path: cost is `O(cells * sites)`, so the
//! cell count is capped up front and the scan refuses to start past the
//! cap instead of hanging.

use coverage_map_distance::{Point, min_distance_km};
use coverage_map_gap_models::{
    CoverageStatus, GapCandidate, GapScanParams, GapScanResult, GridCell, ScoringWeights,
    TechnologyPolicy,
};
use coverage_map_site_models::Site;
use coverage_map_spatial::BoundaryIndex;
use thiserror::Error;

/// Kilometers per degree of latitude (and of longitude at the equator).
const KM_PER_DEG: f64 = 111.32;

/// Errors from gap scan configuration.
///
/// "No gaps found" is not among them: a fully covered region yields an
/// empty candidate list.
#[derive(Debug, Error)]
pub enum GapError {
    /// The grid step was zero, negative, or non-finite.
    #[error("grid step must be a positive number of degrees, got {0}")]
    InvalidStep(f64),

    /// The minimum signal distance was zero, negative, or non-finite.
    #[error("minimum signal distance must be a positive number of kilometers, got {0}")]
    InvalidMinSignal(f64),

    /// The bounding box was empty or inverted.
    #[error(
        "bounding box must have south < north and west < east, \
         got south={south} north={north} west={west} east={east}"
    )]
    InvalidBounds {
        /// Southern latitude bound.
        south: f64,
        /// Western longitude bound.
        west: f64,
        /// Northern latitude bound.
        north: f64,
        /// Eastern longitude bound.
        east: f64,
    },

    /// The scan would need more cells than the configured cap.
    #[error(
        "grid of {cells} cells exceeds the configured maximum of {max}; \
         increase the step or shrink the bounding box"
    )]
    GridTooLarge {
        /// Number of cells the parameters imply.
        cells: usize,
        /// Configured cap.
        max: usize,
    },

    /// The site collection was empty.
    #[error("cannot scan for gaps against an empty site collection")]
    NoSites,
}

/// Scans the configured grid and returns every cell plus the ranked
/// uncovered candidates.
///
/// When a boundary index is supplied, cells whose centers fall outside
/// every boundary polygon are skipped entirely (they appear in neither
/// the cell list nor the candidates). Candidates are sorted by
/// descending score with rank 1 first; ties prefer the larger uncovered
/// extent, then the smaller longitude, so repeated runs always agree.
///
/// # Errors
///
/// Returns [`GapError`] for invalid parameters, a grid over the cell
/// cap, or an empty site collection. A covered region is `Ok` with no
/// candidates.
pub fn find_gaps(
    sites: &[Site],
    boundary: Option<&BoundaryIndex>,
    params: &GapScanParams,
    weights: ScoringWeights,
    policy: TechnologyPolicy,
) -> Result<GapScanResult, GapError> {
    validate(sites, params)?;

    let bbox = params.bbox;
    let rows = cell_count(bbox.north - bbox.south, params.step_deg);
    let cols = cell_count(bbox.east - bbox.west, params.step_deg);
    let cells = rows.checked_mul(cols).unwrap_or(usize::MAX);
    if cells > params.max_cells {
        return Err(GapError::GridTooLarge {
            cells,
            max: params.max_cells,
        });
    }

    // Row-major scan from the south-west corner. `None` marks cells
    // clipped out by the boundary so neighbor offsets still line up.
    let mut grid: Vec<Option<GridCell>> = Vec::with_capacity(cells);
    for row in 0..rows {
        #[allow(clippy::cast_precision_loss)]
        let latitude = bbox.south + (row as f64 + 0.5) * params.step_deg;
        for col in 0..cols {
            #[allow(clippy::cast_precision_loss)]
            let longitude = bbox.west + (col as f64 + 0.5) * params.step_deg;

            if boundary.is_some_and(|b| !b.contains(longitude, latitude)) {
                grid.push(None);
                continue;
            }

            // One pass over all sites per cell; sites are pre-validated
            // so the distance index cannot reject them.
            let nearest = min_distance_km(
                Point {
                    latitude,
                    longitude,
                },
                sites,
            )
            .unwrap_or(f64::INFINITY);

            let status = if nearest <= params.min_signal_km {
                CoverageStatus::Covered
            } else {
                CoverageStatus::NoCoverage
            };

            grid.push(Some(GridCell {
                latitude,
                longitude,
                nearest_site_distance_km: nearest,
                status,
            }));
        }
    }

    let candidates = rank_candidates(&grid, rows, cols, params, weights, policy);

    let scanned: Vec<GridCell> = grid.into_iter().flatten().collect();
    log::info!(
        "gap scan: {} cells scanned ({} clipped), {} uncovered candidates",
        scanned.len(),
        cells - scanned.len(),
        candidates.len(),
    );

    Ok(GapScanResult {
        cells: scanned,
        candidates,
    })
}

fn validate(sites: &[Site], params: &GapScanParams) -> Result<(), GapError> {
    if sites.is_empty() {
        return Err(GapError::NoSites);
    }
    if !params.step_deg.is_finite() || params.step_deg <= 0.0 {
        return Err(GapError::InvalidStep(params.step_deg));
    }
    if !params.min_signal_km.is_finite() || params.min_signal_km <= 0.0 {
        return Err(GapError::InvalidMinSignal(params.min_signal_km));
    }
    let bbox = params.bbox;
    if !(bbox.south < bbox.north && bbox.west < bbox.east)
        || !bbox.south.is_finite()
        || !bbox.west.is_finite()
        || !bbox.north.is_finite()
        || !bbox.east.is_finite()
    {
        return Err(GapError::InvalidBounds {
            south: bbox.south,
            west: bbox.west,
            north: bbox.north,
            east: bbox.east,
        });
    }
    Ok(())
}

fn cell_count(extent_deg: f64, step_deg: f64) -> usize {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let count = (extent_deg / step_deg).ceil() as usize;
    count.max(1)
}

/// Builds scored, ranked candidates from the scanned grid.
///
/// The extent proxy for a cell is the number of uncovered cells in its
/// 3x3 neighborhood (itself included) scaled by the cell's area in km²,
/// so a cell inside a wide dead zone outranks an isolated speck at the
/// same distance.
fn rank_candidates(
    grid: &[Option<GridCell>],
    rows: usize,
    cols: usize,
    params: &GapScanParams,
    weights: ScoringWeights,
    policy: TechnologyPolicy,
) -> Vec<GapCandidate> {
    let mut raw: Vec<(GridCell, f64)> = Vec::new();

    for row in 0..rows {
        for col in 0..cols {
            let Some(cell) = grid[row * cols + col] else {
                continue;
            };
            if cell.status != CoverageStatus::NoCoverage {
                continue;
            }

            let uncovered_neighbors = neighborhood_uncovered(grid, rows, cols, row, col);
            #[allow(clippy::cast_precision_loss)]
            let extent_km2 = uncovered_neighbors as f64 * cell_area_km2(cell.latitude, params);
            raw.push((cell, extent_km2));
        }
    }

    if raw.is_empty() {
        return Vec::new();
    }

    let max_extent = raw.iter().map(|(_, e)| *e).fold(0.0_f64, f64::max);
    let max_distance = raw
        .iter()
        .map(|(c, _)| c.nearest_site_distance_km)
        .filter(|d| d.is_finite())
        .fold(0.0_f64, f64::max);

    let mut candidates: Vec<GapCandidate> = raw
        .into_iter()
        .map(|(cell, extent_km2)| {
            let norm_extent = if max_extent > 0.0 {
                extent_km2 / max_extent
            } else {
                0.0
            };
            // With no site anywhere the distance is infinite; treat it
            // as the maximal normalized distance.
            let norm_distance = if cell.nearest_site_distance_km.is_finite() && max_distance > 0.0 {
                cell.nearest_site_distance_km / max_distance
            } else {
                1.0
            };
            let score =
                weights.extent_weight * norm_extent + weights.distance_weight * norm_distance;

            GapCandidate {
                latitude: cell.latitude,
                longitude: cell.longitude,
                nearest_site_distance_km: cell.nearest_site_distance_km,
                extent_km2,
                score,
                priority_rank: 0,
                recommended_technology: policy.recommend(cell.nearest_site_distance_km),
                reason: format!(
                    "nearest site {:.1} km away (> {:.1} km signal limit), ~{:.0} km² uncovered",
                    cell.nearest_site_distance_km, params.min_signal_km, extent_km2,
                ),
            }
        })
        .collect();

    candidates.sort_by(|a, b| {
        f64::total_cmp(&b.score, &a.score)
            .then_with(|| f64::total_cmp(&b.extent_km2, &a.extent_km2))
            .then_with(|| f64::total_cmp(&a.longitude, &b.longitude))
    });

    for (index, candidate) in candidates.iter_mut().enumerate() {
        candidate.priority_rank = index + 1;
    }

    candidates
}

/// Count of uncovered cells in the 3x3 neighborhood, itself included.
fn neighborhood_uncovered(
    grid: &[Option<GridCell>],
    rows: usize,
    cols: usize,
    row: usize,
    col: usize,
) -> usize {
    let mut count = 0;
    for dr in -1_i64..=1 {
        for dc in -1_i64..=1 {
            #[allow(clippy::cast_possible_wrap)]
            let (r, c) = (row as i64 + dr, col as i64 + dc);
            #[allow(clippy::cast_possible_wrap)]
            if r < 0 || c < 0 || r >= rows as i64 || c >= cols as i64 {
                continue;
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            if let Some(cell) = &grid[r as usize * cols + c as usize] {
                if cell.status == CoverageStatus::NoCoverage {
                    count += 1;
                }
            }
        }
    }
    count
}

/// Approximate area of one grid cell at the given latitude, in km².
fn cell_area_km2(latitude: f64, params: &GapScanParams) -> f64 {
    let north_south_km = params.step_deg * KM_PER_DEG;
    let east_west_km = params.step_deg * KM_PER_DEG * latitude.to_radians().cos();
    north_south_km * east_west_km
}
