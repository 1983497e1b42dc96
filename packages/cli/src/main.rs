#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the coverage analysis engine.
//!
//! Composes the pipeline end to end: load sites from CSV, optionally
//! attach boundary polygons, classify coverage at a query point or scan
//! for gaps, and write GIS-compatible CSV exports.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use coverage_map_coverage::{classify, summarize};
use coverage_map_coverage_models::{CoverageSummary, Query, RadiusKm, TierThresholds};
use coverage_map_distance::{Point, k_nearest};
use coverage_map_gap::find_gaps;
use coverage_map_gap_models::{BoundingBox, GapScanParams, ScoringWeights, TechnologyPolicy};
use coverage_map_ingest::{LoadReport, attribute_regions, load_sites};
use coverage_map_site_models::{Operator, Site, Technology};
use coverage_map_spatial::BoundaryIndex;

#[derive(Parser)]
#[command(name = "coverage_map", about = "Mobile network coverage analysis tool")]
struct Cli {
    /// Path to the site CSV (latitude, longitude, operator, technology,
    /// optional state).
    #[arg(long, global = true, default_value = "sites.csv")]
    sites: PathBuf,

    /// Optional national/state boundary GeoJSON.
    #[arg(long, global = true)]
    boundary: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify coverage around a query point
    Analyze {
        /// Query latitude in degrees
        #[arg(long)]
        lat: f64,
        /// Query longitude in degrees
        #[arg(long)]
        lon: f64,
        /// Search radius in kilometers; omit for no distance cut
        #[arg(long)]
        radius: Option<f64>,
        /// Comma-separated operators to include (e.g. "MTN,Airtel")
        #[arg(long)]
        operators: Option<String>,
        /// Comma-separated technologies to include (e.g. "3G,4G")
        #[arg(long)]
        technologies: Option<String>,
        /// Also print the k nearest sites regardless of radius
        #[arg(long)]
        nearest: Option<usize>,
        /// Write retained sites to this CSV
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Scan a region for coverage gaps and rank tower candidates
    Gaps {
        /// Scan center latitude; defaults to the boundary's bounding box
        #[arg(long)]
        lat: Option<f64>,
        /// Scan center longitude
        #[arg(long)]
        lon: Option<f64>,
        /// Half-extent of the scan box in degrees
        #[arg(long, default_value = "0.3")]
        extent: f64,
        /// Grid step in degrees
        #[arg(long, default_value = "0.05")]
        step: f64,
        /// Minimum signal distance in kilometers
        #[arg(long, default_value = "8.0")]
        min_signal: f64,
        /// Hard cap on grid cells
        #[arg(long, default_value = "250000")]
        max_cells: usize,
        /// Write the full scanned grid to this CSV
        #[arg(long)]
        grid_out: Option<PathBuf>,
        /// Write ranked tower recommendations to this CSV
        #[arg(long)]
        towers_out: Option<PathBuf>,
    },
    /// Load the site CSV and report per-state density
    Sites {
        /// Write the per-state density table to this CSV
        #[arg(long)]
        density_out: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let boundary = cli
        .boundary
        .as_deref()
        .map(BoundaryIndex::load)
        .transpose()?;
    let report = load_sites_with_regions(&cli.sites, boundary.as_ref())?;

    match cli.command {
        Commands::Analyze {
            lat,
            lon,
            radius,
            operators,
            technologies,
            nearest,
            out,
        } => run_analyze(
            &report.sites,
            lat,
            lon,
            radius,
            operators.as_deref(),
            technologies.as_deref(),
            nearest,
            out.as_deref(),
        ),
        Commands::Gaps {
            lat,
            lon,
            extent,
            step,
            min_signal,
            max_cells,
            grid_out,
            towers_out,
        } => run_gaps(
            &report.sites,
            boundary.as_ref(),
            ScanArea {
                lat,
                lon,
                extent,
                step,
                min_signal,
                max_cells,
            },
            grid_out.as_deref(),
            towers_out.as_deref(),
        ),
        Commands::Sites { density_out } => run_sites(&report, density_out.as_deref()),
    }
}

fn load_sites_with_regions(
    path: &Path,
    boundary: Option<&BoundaryIndex>,
) -> Result<LoadReport, Box<dyn std::error::Error>> {
    let mut report = load_sites(path)?;
    if let Some(boundary) = boundary {
        attribute_regions(&mut report.sites, boundary);
    }
    Ok(report)
}

#[allow(clippy::too_many_arguments)]
fn run_analyze(
    sites: &[Site],
    lat: f64,
    lon: f64,
    radius: Option<f64>,
    operators: Option<&str>,
    technologies: Option<&str>,
    nearest: Option<usize>,
    out: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let query = Query {
        latitude: lat,
        longitude: lon,
        radius_km: radius.map_or(RadiusKm::Unlimited, RadiusKm::Within),
        operator_filter: operators.map(parse_operators),
        technology_filter: technologies.map(parse_technologies),
    };

    let result = classify(&query, sites, TierThresholds::default())?;

    match summarize(&result) {
        CoverageSummary::NoCoverage => {
            println!("No network detected at ({lat}, {lon}) with the given filters.");
        }
        CoverageSummary::Covered {
            best_network,
            by_operator,
            by_technology,
            ..
        } => {
            println!(
                "{} site(s) in range; predicted best network: {}",
                result.rows.len(),
                best_network.label()
            );
            println!();
            println!("By operator:");
            for stats in &by_operator {
                println!(
                    "  {:<10} {:>4} site(s), mean {:.1} km, mostly {}",
                    stats.operator.label(),
                    stats.site_count,
                    stats.mean_distance_km,
                    stats.dominant_technology.label()
                );
            }
            println!("By technology:");
            for stats in &by_technology {
                println!(
                    "  {:<10} {:>4} site(s), mean {:.1} km",
                    stats.technology.label(),
                    stats.site_count,
                    stats.mean_distance_km
                );
            }
        }
    }

    if let Some(k) = nearest {
        let origin = Point::new(lat, lon)?;
        println!();
        println!("{k} nearest site(s):");
        for (index, distance_km) in k_nearest(origin, sites, k) {
            let site = &sites[index];
            println!(
                "  {:.1} km  {} {} ({}, {})",
                distance_km,
                site.operator.label(),
                site.technology.label(),
                site.latitude,
                site.longitude
            );
        }
    }

    if let Some(path) = out {
        let file = std::fs::File::create(path)?;
        coverage_map_export::write_coverage_csv(file, &result)?;
        println!();
        println!("Wrote coverage rows to {}", path.display());
    }

    Ok(())
}

/// Scan-area arguments for the `gaps` subcommand.
struct ScanArea {
    lat: Option<f64>,
    lon: Option<f64>,
    extent: f64,
    step: f64,
    min_signal: f64,
    max_cells: usize,
}

fn run_gaps(
    sites: &[Site],
    boundary: Option<&BoundaryIndex>,
    area: ScanArea,
    grid_out: Option<&Path>,
    towers_out: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let bbox = match (area.lat, area.lon) {
        (Some(lat), Some(lon)) => BoundingBox::around(lat, lon, area.extent),
        _ => {
            let (west, south, east, north) = boundary
                .and_then(BoundaryIndex::bounding_box)
                .ok_or("either --lat/--lon or --boundary is required for a gap scan")?;
            BoundingBox {
                south,
                west,
                north,
                east,
            }
        }
    };

    let params = GapScanParams {
        bbox,
        step_deg: area.step,
        min_signal_km: area.min_signal,
        max_cells: area.max_cells,
    };

    let result = find_gaps(
        sites,
        boundary,
        &params,
        ScoringWeights::default(),
        TechnologyPolicy::default(),
    )?;

    if result.candidates.is_empty() {
        println!(
            "No coverage gaps found: every scanned cell is within {:.1} km of a site.",
            params.min_signal_km
        );
    } else {
        println!(
            "{} gap candidate(s) found across {} scanned cell(s). Top priorities:",
            result.candidates.len(),
            result.cells.len()
        );
        for candidate in result.candidates.iter().take(10) {
            println!(
                "  #{:<3} ({:.4}, {:.4})  {}  — {}",
                candidate.priority_rank,
                candidate.latitude,
                candidate.longitude,
                candidate.recommended_technology.label(),
                candidate.reason
            );
        }
    }

    if let Some(path) = grid_out {
        let file = std::fs::File::create(path)?;
        coverage_map_export::write_coverage_grid_csv(file, &result.cells)?;
        println!("Wrote coverage grid to {}", path.display());
    }
    if let Some(path) = towers_out {
        let file = std::fs::File::create(path)?;
        coverage_map_export::write_recommendations_csv(file, &result.candidates)?;
        println!("Wrote tower recommendations to {}", path.display());
    }

    Ok(())
}

fn run_sites(
    report: &LoadReport,
    density_out: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!(
        "{} site(s) loaded, {} row(s) dropped during validation.",
        report.sites.len(),
        report.dropped
    );

    let regions = region_density(&report.sites);
    if regions.is_empty() {
        println!("No state information available for density reporting.");
    } else {
        println!();
        println!("Sites per state:");
        for region in &regions {
            println!("  {:<20} {:>6}", region.region, region.total_sites);
        }
    }

    if let Some(path) = density_out {
        let file = std::fs::File::create(path)?;
        coverage_map_export::write_state_density_csv(file, &regions)?;
        println!("Wrote state density to {}", path.display());
    }

    Ok(())
}

fn region_density(sites: &[Site]) -> Vec<coverage_map_coverage_models::RegionCount> {
    let mut counts = std::collections::BTreeMap::<&str, u64>::new();
    for site in sites {
        if let Some(region) = site.region.as_deref() {
            *counts.entry(region).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .map(|(region, total_sites)| coverage_map_coverage_models::RegionCount {
            region: region.to_owned(),
            total_sites,
        })
        .collect()
}

fn parse_operators(raw: &str) -> BTreeSet<Operator> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Operator::from_source)
        .collect()
}

fn parse_technologies(raw: &str) -> BTreeSet<Technology> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Technology::from_source)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_operator_list() {
        let ops = parse_operators("MTN, Glo,9mobile");
        assert!(ops.contains(&Operator::Mtn));
        assert!(ops.contains(&Operator::Globacom));
        assert!(ops.contains(&Operator::NineMobile));
        assert_eq!(ops.len(), 3);
    }

    #[test]
    fn parses_technology_list() {
        let techs = parse_technologies("3G,4G");
        assert!(techs.contains(&Technology::ThreeG));
        assert!(techs.contains(&Technology::FourG));
        assert_eq!(techs.len(), 2);
    }
}
