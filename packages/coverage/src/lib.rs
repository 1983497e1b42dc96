#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Coverage classifier.
//!
//! Turns a [`Query`] plus an immutable site collection into a
//! [`CoverageResult`] (distance-filtered rows, ascending by distance)
//! and a [`CoverageSummary`] (per-operator/technology/region aggregates
//! and the best-network prediction). Pure functions of their inputs;
//! nothing here mutates shared state, so concurrent queries over the
//! same site slice need no coordination.

use std::collections::BTreeMap;

use coverage_map_coverage_models::{
    CoverageResult, CoverageRow, CoverageSummary, OperatorStats, Query, RadiusKm, RegionCount,
    TechnologyStats, TierThresholds,
};
use coverage_map_distance::{Point, distances_to_all};
use coverage_map_site_models::{Operator, Site, Technology, validate_latitude, validate_longitude};
use thiserror::Error;

/// Errors from coverage classification.
#[derive(Debug, Error)]
pub enum CoverageError {
    /// The query origin had a non-finite or out-of-range coordinate.
    #[error("invalid query origin: {0}")]
    InvalidOrigin(#[from] coverage_map_site_models::InvalidCoordinateError),

    /// The query radius was zero, negative, or non-finite.
    #[error("radius must be a positive number of kilometers, got {0}")]
    InvalidRadius(f64),
}

/// Classifies the site collection against a query.
///
/// Applies the operator/technology filters, computes the distance from
/// the query origin to every remaining site in one pass, keeps sites
/// inside the radius (all of them for [`RadiusKm::Unlimited`]), assigns
/// each a confidence tier, and sorts ascending by distance. An empty
/// result is a valid outcome, not an error; [`summarize`] turns it into
/// [`CoverageSummary::NoCoverage`].
///
/// # Errors
///
/// Returns [`CoverageError`] if the origin is out of range or the
/// radius is not a positive finite number.
pub fn classify(
    query: &Query,
    sites: &[Site],
    thresholds: TierThresholds,
) -> Result<CoverageResult, CoverageError> {
    validate_latitude(query.latitude)?;
    validate_longitude(query.longitude)?;
    if let RadiusKm::Within(r) = query.radius_km {
        if !r.is_finite() || r <= 0.0 {
            return Err(CoverageError::InvalidRadius(r));
        }
    }

    let filtered: Vec<&Site> = sites
        .iter()
        .filter(|site| {
            query
                .operator_filter
                .as_ref()
                .is_none_or(|ops| ops.contains(&site.operator))
                && query
                    .technology_filter
                    .as_ref()
                    .is_none_or(|techs| techs.contains(&site.technology))
        })
        .collect();

    // One vectorized pass over the filtered sites; the origin was
    // validated above, so the index cannot reject it.
    let origin = Point {
        latitude: query.latitude,
        longitude: query.longitude,
    };
    let owned: Vec<Site> = filtered.iter().map(|s| (*s).clone()).collect();
    let distances = distances_to_all(origin, &owned);

    let mut rows: Vec<CoverageRow> = owned
        .into_iter()
        .zip(distances)
        .filter(|(_, d)| query.radius_km.contains(*d))
        .map(|(site, distance_km)| CoverageRow {
            confidence: thresholds.tier(distance_km),
            site,
            distance_km,
        })
        .collect();

    rows.sort_by(|a, b| f64::total_cmp(&a.distance_km, &b.distance_km));

    log::debug!(
        "classified {} of {} sites within {:?} of ({}, {})",
        rows.len(),
        sites.len(),
        query.radius_km,
        query.latitude,
        query.longitude,
    );

    Ok(CoverageResult {
        query: query.clone(),
        rows,
    })
}

/// Summarizes a coverage result into per-operator, per-technology, and
/// per-region aggregates plus the best-network prediction.
///
/// Best network is the operator with the most retained sites; ties
/// prefer the lower mean distance, then the lexicographically first
/// label, so repeated runs always agree.
#[must_use]
pub fn summarize(result: &CoverageResult) -> CoverageSummary {
    if result.is_empty() {
        return CoverageSummary::NoCoverage;
    }

    let mut by_operator = operator_stats(&result.rows);
    by_operator.sort_by(|a, b| {
        b.site_count
            .cmp(&a.site_count)
            .then_with(|| f64::total_cmp(&a.mean_distance_km, &b.mean_distance_km))
            .then_with(|| a.operator.label().cmp(b.operator.label()))
    });

    let mut by_technology = technology_stats(&result.rows);
    by_technology.sort_by(|a, b| {
        b.site_count
            .cmp(&a.site_count)
            .then_with(|| f64::total_cmp(&a.mean_distance_km, &b.mean_distance_km))
            .then_with(|| a.technology.label().cmp(b.technology.label()))
    });

    let by_region = region_counts(&result.rows);

    CoverageSummary::Covered {
        best_network: by_operator[0].operator,
        by_operator,
        by_technology,
        by_region,
    }
}

fn operator_stats(rows: &[CoverageRow]) -> Vec<OperatorStats> {
    // BTreeMap keeps grouping order independent of hash state.
    let mut groups: BTreeMap<Operator, Vec<&CoverageRow>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.site.operator).or_default().push(row);
    }

    groups
        .into_iter()
        .map(|(operator, rows)| OperatorStats {
            operator,
            site_count: rows.len() as u64,
            mean_distance_km: mean(rows.iter().map(|r| r.distance_km)),
            dominant_technology: dominant_technology(&rows),
        })
        .collect()
}

fn technology_stats(rows: &[CoverageRow]) -> Vec<TechnologyStats> {
    let mut groups: BTreeMap<Technology, Vec<&CoverageRow>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.site.technology).or_default().push(row);
    }

    groups
        .into_iter()
        .map(|(technology, rows)| TechnologyStats {
            technology,
            site_count: rows.len() as u64,
            mean_distance_km: mean(rows.iter().map(|r| r.distance_km)),
        })
        .collect()
}

fn region_counts(rows: &[CoverageRow]) -> Vec<RegionCount> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for row in rows {
        if let Some(region) = row.site.region.as_deref() {
            *counts.entry(region).or_default() += 1;
        }
    }

    counts
        .into_iter()
        .map(|(region, total_sites)| RegionCount {
            region: region.to_owned(),
            total_sites,
        })
        .collect()
}

/// Most common technology among an operator's rows; ties prefer the
/// lexicographically first label.
fn dominant_technology(rows: &[&CoverageRow]) -> Technology {
    let mut counts: BTreeMap<&str, (u64, Technology)> = BTreeMap::new();
    for row in rows {
        let entry = counts
            .entry(row.site.technology.label())
            .or_insert((0, row.site.technology));
        entry.0 += 1;
    }

    counts
        .into_iter()
        .max_by(|(label_a, (count_a, _)), (label_b, (count_b, _))| {
            count_a.cmp(count_b).then_with(|| label_b.cmp(label_a))
        })
        .map_or(Technology::Unknown, |(_, (_, tech))| tech)
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0_u64;
    for v in values {
        sum += v;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        {
            sum / count as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use coverage_map_coverage_models::ConfidenceTier;

    use super::*;

    fn site(lat: f64, lon: f64, operator: Operator, technology: Technology) -> Site {
        Site::new(lat, lon, operator, technology, None).unwrap()
    }

    fn lagos_cluster() -> Vec<Site> {
        vec![
            site(6.52, 3.38, Operator::Mtn, Technology::FourG),
            site(6.55, 3.40, Operator::Mtn, Technology::ThreeG),
            site(6.60, 3.35, Operator::Airtel, Technology::FourG),
            site(9.08, 7.40, Operator::Globacom, Technology::TwoG),
        ]
    }

    fn query(radius: RadiusKm) -> Query {
        Query::new(6.5244, 3.3792, radius)
    }

    #[test]
    fn unlimited_radius_retains_all_sites() {
        let sites = lagos_cluster();
        let result = classify(&query(RadiusKm::Unlimited), &sites, TierThresholds::default())
            .unwrap();
        assert_eq!(result.rows.len(), sites.len());
    }

    #[test]
    fn radius_cut_is_exact_and_idempotent() {
        let sites = lagos_cluster();
        let q = query(RadiusKm::Within(20.0));
        let result = classify(&q, &sites, TierThresholds::default()).unwrap();
        // The Abuja site is ~536 km out.
        assert_eq!(result.rows.len(), 3);
        assert!(result.rows.iter().all(|r| r.distance_km <= 20.0));

        // Re-filtering the retained sites at the same radius changes nothing.
        let retained: Vec<Site> = result.rows.iter().map(|r| r.site.clone()).collect();
        let again = classify(&q, &retained, TierThresholds::default()).unwrap();
        assert_eq!(again.rows, result.rows);
    }

    #[test]
    fn rows_sorted_ascending_by_distance() {
        let sites = lagos_cluster();
        let result = classify(&query(RadiusKm::Unlimited), &sites, TierThresholds::default())
            .unwrap();
        for pair in result.rows.windows(2) {
            assert!(pair[0].distance_km <= pair[1].distance_km);
        }
    }

    #[test]
    fn filters_apply_before_distance_cut() {
        let sites = lagos_cluster();
        let mut q = query(RadiusKm::Unlimited);
        q.operator_filter = Some(BTreeSet::from([Operator::Mtn]));
        q.technology_filter = Some(BTreeSet::from([Technology::FourG]));
        let result = classify(&q, &sites, TierThresholds::default()).unwrap();
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].site.operator, Operator::Mtn);
        assert_eq!(result.rows[0].site.technology, Technology::FourG);
    }

    #[test]
    fn tiers_follow_thresholds() {
        let sites = lagos_cluster();
        let result = classify(&query(RadiusKm::Unlimited), &sites, TierThresholds::default())
            .unwrap();
        assert_eq!(result.rows[0].confidence, ConfidenceTier::High);
        assert_eq!(result.rows.last().unwrap().confidence, ConfidenceTier::Low);
    }

    #[test]
    fn rejects_invalid_radius() {
        let sites = lagos_cluster();
        let err = classify(
            &query(RadiusKm::Within(-3.0)),
            &sites,
            TierThresholds::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CoverageError::InvalidRadius(r) if r == -3.0));
    }

    #[test]
    fn rejects_out_of_range_origin() {
        let sites = lagos_cluster();
        let q = Query::new(123.4, 3.0, RadiusKm::Unlimited);
        let err = classify(&q, &sites, TierThresholds::default()).unwrap_err();
        assert!(err.to_string().contains("latitude"));
    }

    #[test]
    fn empty_sites_is_no_coverage_not_error() {
        let result =
            classify(&query(RadiusKm::Within(10.0)), &[], TierThresholds::default()).unwrap();
        assert!(result.is_empty());
        assert_eq!(summarize(&result), CoverageSummary::NoCoverage);
    }

    #[test]
    fn best_network_prefers_count_then_mean_distance() {
        let sites = lagos_cluster();
        let result = classify(&query(RadiusKm::Within(20.0)), &sites, TierThresholds::default())
            .unwrap();
        let CoverageSummary::Covered {
            best_network,
            by_operator,
            ..
        } = summarize(&result)
        else {
            panic!("expected coverage");
        };
        assert_eq!(best_network, Operator::Mtn);
        assert_eq!(by_operator[0].site_count, 2);
        assert_eq!(by_operator[0].dominant_technology, Technology::ThreeG);
    }

    #[test]
    fn best_network_tie_breaks_deterministically() {
        // One site each, equidistant: Airtel wins lexicographically.
        let sites = vec![
            site(6.53, 3.38, Operator::Mtn, Technology::FourG),
            site(6.53, 3.38, Operator::Airtel, Technology::FourG),
        ];
        let result = classify(&query(RadiusKm::Unlimited), &sites, TierThresholds::default())
            .unwrap();
        let CoverageSummary::Covered { best_network, .. } = summarize(&result) else {
            panic!("expected coverage");
        };
        assert_eq!(best_network, Operator::Airtel);
    }

    #[test]
    fn region_counts_are_alphabetical() {
        let mut sites = lagos_cluster();
        sites[0].region = Some("Lagos".to_owned());
        sites[1].region = Some("Lagos".to_owned());
        sites[3].region = Some("FCT".to_owned());
        let result = classify(&query(RadiusKm::Unlimited), &sites, TierThresholds::default())
            .unwrap();
        let CoverageSummary::Covered { by_region, .. } = summarize(&result) else {
            panic!("expected coverage");
        };
        assert_eq!(
            by_region,
            vec![
                RegionCount {
                    region: "FCT".to_owned(),
                    total_sites: 1,
                },
                RegionCount {
                    region: "Lagos".to_owned(),
                    total_sites: 2,
                },
            ]
        );
    }
}
