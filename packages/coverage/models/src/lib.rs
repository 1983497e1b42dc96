#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Coverage query, result, and summary aggregate types.
//!
//! Plain data structures exchanged between the coverage classifier and
//! its callers. No rendering-specific types: any presentation layer can
//! consume these directly.

use std::collections::BTreeSet;

use coverage_map_site_models::{Operator, Site, Technology};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

/// Search radius for a coverage query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RadiusKm {
    /// Retain only sites within this many kilometers of the origin.
    Within(f64),
    /// No distance cut; every site is retained.
    Unlimited,
}

impl RadiusKm {
    /// Whether a site at `distance_km` falls inside this radius.
    #[must_use]
    pub fn contains(self, distance_km: f64) -> bool {
        match self {
            Self::Within(r) => distance_km <= r,
            Self::Unlimited => true,
        }
    }
}

/// A single coverage analysis request.
///
/// Created per user interaction; no persistence beyond the analysis
/// call that consumes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    /// Origin latitude in degrees.
    pub latitude: f64,
    /// Origin longitude in degrees.
    pub longitude: f64,
    /// Distance cut applied to the site collection.
    pub radius_km: RadiusKm,
    /// If set, only sites run by these operators are considered.
    pub operator_filter: Option<BTreeSet<Operator>>,
    /// If set, only sites with these technologies are considered.
    pub technology_filter: Option<BTreeSet<Technology>>,
}

impl Query {
    /// Builds an unfiltered query.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64, radius_km: RadiusKm) -> Self {
        Self {
            latitude,
            longitude,
            radius_km,
            operator_filter: None,
            technology_filter: None,
        }
    }
}

/// Coarse coverage-quality bucket derived from distance to a site.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "camelCase")]
pub enum ConfidenceTier {
    /// Within the high-confidence distance (default <= 5 km).
    High,
    /// Within the medium-confidence distance (default <= 15 km).
    Medium,
    /// Everything farther out.
    Low,
}

/// Distance breakpoints that map a site distance to a [`ConfidenceTier`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierThresholds {
    /// Upper bound (km, inclusive) for [`ConfidenceTier::High`].
    pub high_km: f64,
    /// Upper bound (km, inclusive) for [`ConfidenceTier::Medium`].
    pub medium_km: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            high_km: 5.0,
            medium_km: 15.0,
        }
    }
}

impl TierThresholds {
    /// Maps a distance to its tier.
    #[must_use]
    pub fn tier(self, distance_km: f64) -> ConfidenceTier {
        if distance_km <= self.high_km {
            ConfidenceTier::High
        } else if distance_km <= self.medium_km {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }
}

/// One retained site with its computed distance and tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageRow {
    /// The site this row describes.
    pub site: Site,
    /// Great-circle distance from the query origin, in kilometers.
    pub distance_km: f64,
    /// Coverage-quality bucket for that distance.
    pub confidence: ConfidenceTier,
}

/// Read-only view over the site collection for one query.
///
/// Rows are sorted ascending by distance (the canonical order); the
/// same query against the same site collection always yields the same
/// sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageResult {
    /// The query that produced this result.
    pub query: Query,
    /// Retained sites, ascending by distance.
    pub rows: Vec<CoverageRow>,
}

impl CoverageResult {
    /// Whether no site survived the filters and radius cut.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Aggregate statistics for one operator within a coverage result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorStats {
    /// The operator.
    pub operator: Operator,
    /// Number of retained sites run by this operator.
    pub site_count: u64,
    /// Mean distance (km) of those sites from the origin.
    pub mean_distance_km: f64,
    /// Most common technology among those sites.
    pub dominant_technology: Technology,
}

/// Aggregate statistics for one technology within a coverage result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnologyStats {
    /// The technology generation.
    pub technology: Technology,
    /// Number of retained sites with this technology.
    pub site_count: u64,
    /// Mean distance (km) of those sites from the origin.
    pub mean_distance_km: f64,
}

/// Site count for one administrative region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionCount {
    /// Region (state) name.
    pub region: String,
    /// Number of retained sites attributed to the region.
    pub total_sites: u64,
}

/// Summary of a coverage result.
///
/// "No coverage" is a first-class outcome, not an error: callers branch
/// on it to show the no-network message instead of a blank view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum CoverageSummary {
    /// No site survived the filters and radius cut.
    NoCoverage,
    /// At least one site retained.
    Covered {
        /// Operator predicted to serve the origin best.
        best_network: Operator,
        /// Per-operator aggregates, best first.
        by_operator: Vec<OperatorStats>,
        /// Per-technology aggregates, most common first.
        by_technology: Vec<TechnologyStats>,
        /// Per-region site counts, alphabetical; sites without a region
        /// are excluded.
        by_region: Vec<RegionCount>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_radius_contains_everything() {
        assert!(RadiusKm::Unlimited.contains(0.0));
        assert!(RadiusKm::Unlimited.contains(20_000.0));
    }

    #[test]
    fn bounded_radius_is_inclusive() {
        assert!(RadiusKm::Within(10.0).contains(10.0));
        assert!(!RadiusKm::Within(10.0).contains(10.001));
    }

    #[test]
    fn default_tier_breakpoints() {
        let t = TierThresholds::default();
        assert_eq!(t.tier(5.0), ConfidenceTier::High);
        assert_eq!(t.tier(5.1), ConfidenceTier::Medium);
        assert_eq!(t.tier(15.0), ConfidenceTier::Medium);
        assert_eq!(t.tier(15.1), ConfidenceTier::Low);
    }
}
