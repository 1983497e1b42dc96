#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Great-circle distance index over site collections.
//!
//! Leaf crate of the analysis pipeline: computes haversine distances from
//! a query point to every site in one pass, and answers k-nearest-site
//! queries. The batch entry points exist because the gap scanner calls
//! them once per grid cell; per-pair call overhead matters there.

use coverage_map_site_models::Site;
use thiserror::Error;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Errors from distance computations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DistanceError {
    /// A coordinate was non-finite (NaN or infinite).
    #[error("{axis} must be a finite number, got {value}")]
    NonFiniteCoordinate {
        /// Which axis failed ("latitude" or "longitude").
        axis: &'static str,
        /// The offending value.
        value: f64,
    },
}

/// A query point in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Point {
    /// Builds a point, rejecting non-finite coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`DistanceError::NonFiniteCoordinate`] if either value is
    /// NaN or infinite.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, DistanceError> {
        if !latitude.is_finite() {
            return Err(DistanceError::NonFiniteCoordinate {
                axis: "latitude",
                value: latitude,
            });
        }
        if !longitude.is_finite() {
            return Err(DistanceError::NonFiniteCoordinate {
                axis: "longitude",
                value: longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// Precomputed trigonometry for one endpoint of a haversine pair.
///
/// The grid scanner computes distances from one origin to thousands of
/// sites; hoisting the origin's sin/cos out of the inner loop roughly
/// halves the per-site trig work.
#[derive(Debug, Clone, Copy)]
struct RadPoint {
    lat_rad: f64,
    lon_rad: f64,
    lat_sin: f64,
    lat_cos: f64,
}

impl From<Point> for RadPoint {
    fn from(p: Point) -> Self {
        let lat_rad = p.latitude.to_radians();
        Self {
            lat_rad,
            lon_rad: p.longitude.to_radians(),
            lat_sin: lat_rad.sin(),
            lat_cos: lat_rad.cos(),
        }
    }
}

fn haversine_rad(a: RadPoint, b: RadPoint) -> f64 {
    let dlat_half = (b.lat_rad - a.lat_rad) / 2.0;
    let dlon_half = (b.lon_rad - a.lon_rad) / 2.0;

    let radicand = dlat_half.sin().powi(2) + a.lat_cos * b.lat_cos * dlon_half.sin().powi(2);
    // Floating-point overshoot near antipodal points can push the
    // radicand a hair past 1.0, which would take sqrt/asin out of domain.
    let radicand = radicand.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_KM * radicand.sqrt().asin()
}

/// Great-circle distance in kilometers between two points (haversine on
/// a 6371 km mean Earth radius).
///
/// # Errors
///
/// Returns [`DistanceError::NonFiniteCoordinate`] if any input coordinate
/// is non-finite. Site collections are validated at ingestion, so callers
/// holding [`Site`] records can use the batch entry points instead.
pub fn distance_km(
    origin_lat: f64,
    origin_lon: f64,
    target_lat: f64,
    target_lon: f64,
) -> Result<f64, DistanceError> {
    let origin = Point::new(origin_lat, origin_lon)?;
    let target = Point::new(target_lat, target_lon)?;
    Ok(haversine_rad(origin.into(), target.into()))
}

/// Distances from `origin` to every site, aligned with the input order.
///
/// Single O(N) pass with the origin trigonometry hoisted out of the loop.
/// Sites are assumed pre-validated (finite coordinates).
#[must_use]
pub fn distances_to_all(origin: Point, sites: &[Site]) -> Vec<f64> {
    let origin: RadPoint = origin.into();
    sites
        .iter()
        .map(|site| {
            let target: RadPoint = Point {
                latitude: site.latitude,
                longitude: site.longitude,
            }
            .into();
            haversine_rad(origin, target)
        })
        .collect()
}

/// Minimum distance from `origin` to any site, or `None` for an empty
/// collection.
///
/// Runs in one pass without allocating; this is the inner loop of the
/// gap grid scan.
#[must_use]
pub fn min_distance_km(origin: Point, sites: &[Site]) -> Option<f64> {
    let origin: RadPoint = origin.into();
    sites
        .iter()
        .map(|site| {
            let target: RadPoint = Point {
                latitude: site.latitude,
                longitude: site.longitude,
            }
            .into();
            haversine_rad(origin, target)
        })
        .min_by(f64::total_cmp)
}

/// The `k` sites nearest to `origin`, ascending by distance.
///
/// Returns `(site index, distance_km)` pairs of length `min(k, N)`. Ties
/// in distance keep the input order (stable sort) so results are
/// reproducible across runs.
#[must_use]
pub fn k_nearest(origin: Point, sites: &[Site], k: usize) -> Vec<(usize, f64)> {
    let mut indexed: Vec<(usize, f64)> = distances_to_all(origin, sites)
        .into_iter()
        .enumerate()
        .collect();
    indexed.sort_by(|a, b| f64::total_cmp(&a.1, &b.1));
    indexed.truncate(k);
    indexed
}

#[cfg(test)]
mod tests {
    use super::*;
    use coverage_map_site_models::{Operator, Technology};

    fn site(lat: f64, lon: f64) -> Site {
        Site::new(lat, lon, Operator::Mtn, Technology::FourG, None).unwrap()
    }

    const LAGOS: (f64, f64) = (6.5244, 3.3792);
    const ABUJA: (f64, f64) = (9.0765, 7.3986);

    #[test]
    fn lagos_to_abuja_regression() {
        // Known fixture: ~536 km between Lagos and Abuja.
        let d = distance_km(LAGOS.0, LAGOS.1, ABUJA.0, ABUJA.1).unwrap();
        assert!((d - 536.0).abs() < 5.0, "expected ~536 km, got {d}");
    }

    #[test]
    fn distance_is_symmetric() {
        let ab = distance_km(LAGOS.0, LAGOS.1, ABUJA.0, ABUJA.1).unwrap();
        let ba = distance_km(ABUJA.0, ABUJA.1, LAGOS.0, LAGOS.1).unwrap();
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn distance_to_self_is_zero() {
        let d = distance_km(LAGOS.0, LAGOS.1, LAGOS.0, LAGOS.1).unwrap();
        assert!(d.abs() < 1e-9);
    }

    #[test]
    fn antipodal_points_stay_in_domain() {
        // Radicand overshoot must be clamped, not panic or return NaN.
        let d = distance_km(0.0, 0.0, 0.0, 180.0).unwrap();
        assert!(d.is_finite());
        // Half the Earth's circumference at the 6371 km radius.
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1.0);
    }

    #[test]
    fn rejects_non_finite_input() {
        let err = distance_km(f64::NAN, 3.0, 6.0, 3.0).unwrap_err();
        assert!(matches!(
            err,
            DistanceError::NonFiniteCoordinate {
                axis: "latitude",
                ..
            }
        ));
    }

    #[test]
    fn distances_align_with_input_order() {
        let sites = vec![site(ABUJA.0, ABUJA.1), site(LAGOS.0, LAGOS.1)];
        let origin = Point::new(LAGOS.0, LAGOS.1).unwrap();
        let distances = distances_to_all(origin, &sites);
        assert_eq!(distances.len(), 2);
        assert!(distances[0] > 500.0);
        assert!(distances[1] < 1e-9);
    }

    #[test]
    fn k_nearest_sorted_ascending() {
        let sites = vec![
            site(ABUJA.0, ABUJA.1),
            site(LAGOS.0, LAGOS.1),
            site(6.6, 3.4),
        ];
        let origin = Point::new(LAGOS.0, LAGOS.1).unwrap();
        let nearest = k_nearest(origin, &sites, 2);
        assert_eq!(nearest.len(), 2);
        assert_eq!(nearest[0].0, 1);
        assert_eq!(nearest[1].0, 2);
        assert!(nearest[0].1 <= nearest[1].1);
    }

    #[test]
    fn k_nearest_full_matches_distances_to_all() {
        let sites = vec![
            site(ABUJA.0, ABUJA.1),
            site(LAGOS.0, LAGOS.1),
            site(6.6, 3.4),
        ];
        let origin = Point::new(7.0, 5.0).unwrap();
        let all = distances_to_all(origin, &sites);
        let nearest = k_nearest(origin, &sites, sites.len());
        assert_eq!(nearest.len(), all.len());
        for (idx, d) in nearest {
            assert!((all[idx] - d).abs() < 1e-12);
        }
    }

    #[test]
    fn k_nearest_ties_keep_input_order() {
        // Two sites equidistant from the origin on opposite sides.
        let sites = vec![site(6.0, 3.1), site(6.0, 2.9), site(6.0, 3.0)];
        let origin = Point::new(6.0, 3.0).unwrap();
        let nearest = k_nearest(origin, &sites, 3);
        assert_eq!(nearest[0].0, 2);
        assert_eq!(nearest[1].0, 0);
        assert_eq!(nearest[2].0, 1);
    }

    #[test]
    fn min_distance_matches_k_nearest_head() {
        let sites = vec![site(ABUJA.0, ABUJA.1), site(6.6, 3.4)];
        let origin = Point::new(LAGOS.0, LAGOS.1).unwrap();
        let min = min_distance_km(origin, &sites).unwrap();
        let head = k_nearest(origin, &sites, 1)[0].1;
        assert!((min - head).abs() < 1e-12);
    }

    #[test]
    fn min_distance_empty_is_none() {
        let origin = Point::new(6.0, 3.0).unwrap();
        assert!(min_distance_km(origin, &[]).is_none());
    }
}
