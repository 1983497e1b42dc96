#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Network site record types and the operator/technology taxonomies.
//!
//! This crate defines the canonical site record shared across the entire
//! coverage-map system. Every data source normalizes its operator and
//! technology spellings into the closed enums defined here before any
//! analysis runs.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A mobile network operator active in Nigeria.
///
/// Source data uses a handful of spellings ("Glo" vs "Globacom",
/// "9Mobile" vs "9mobile"); anything outside the known set maps to
/// [`Operator::Unknown`] at the ingestion boundary rather than being
/// carried through as a free-form string.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Operator {
    /// MTN Nigeria.
    #[strum(serialize = "MTN", serialize = "Mtn")]
    Mtn,
    /// Airtel Nigeria.
    #[strum(serialize = "Airtel")]
    Airtel,
    /// Globacom, commonly abbreviated "Glo".
    #[strum(serialize = "Globacom", serialize = "Glo")]
    Globacom,
    /// 9mobile (formerly Etisalat Nigeria).
    #[strum(serialize = "9mobile", serialize = "9Mobile")]
    NineMobile,
    /// Operator not present in the known set.
    #[strum(serialize = "unknown", serialize = "Unknown")]
    Unknown,
}

impl Operator {
    /// Canonical display label used in exports and summaries.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Mtn => "MTN",
            Self::Airtel => "Airtel",
            Self::Globacom => "Globacom",
            Self::NineMobile => "9mobile",
            Self::Unknown => "unknown",
        }
    }

    /// Parses an operator from a source-data spelling, falling back to
    /// [`Operator::Unknown`] instead of failing.
    #[must_use]
    pub fn from_source(s: &str) -> Self {
        s.trim().parse().unwrap_or(Self::Unknown)
    }
}

/// Mobile network technology generation.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Technology {
    /// 2G (GSM/EDGE).
    #[strum(serialize = "2G", serialize = "2g")]
    TwoG,
    /// 3G (UMTS/HSPA).
    #[strum(serialize = "3G", serialize = "3g")]
    ThreeG,
    /// 4G (LTE).
    #[strum(serialize = "4G", serialize = "4g")]
    FourG,
    /// Technology not present in the known set.
    #[strum(serialize = "unknown", serialize = "Unknown")]
    Unknown,
}

impl Technology {
    /// Canonical display label used in exports and summaries.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::TwoG => "2G",
            Self::ThreeG => "3G",
            Self::FourG => "4G",
            Self::Unknown => "unknown",
        }
    }

    /// Parses a technology from a source-data spelling, falling back to
    /// [`Technology::Unknown`] instead of failing.
    #[must_use]
    pub fn from_source(s: &str) -> Self {
        s.trim().parse().unwrap_or(Self::Unknown)
    }
}

/// A single network-equipment location record.
///
/// Sites are validated at the ingestion boundary: coordinates are finite
/// and in range, or the row never reaches the analysis engine. Site
/// collections are immutable for the lifetime of a process; reloading
/// replaces the whole collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    /// Latitude in degrees, -90..=90.
    pub latitude: f64,
    /// Longitude in degrees, -180..=180.
    pub longitude: f64,
    /// Network operator that owns the site.
    pub operator: Operator,
    /// Technology generation deployed at the site.
    pub technology: Technology,
    /// Administrative area (state) name, if known.
    pub region: Option<String>,
}

/// Error returned when a coordinate is non-finite or out of range.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidCoordinateError {
    /// Which axis failed ("latitude" or "longitude").
    pub axis: &'static str,
    /// The offending value.
    pub value: f64,
    /// Inclusive valid range for the axis.
    pub range: (f64, f64),
}

impl std::fmt::Display for InvalidCoordinateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} must be a finite number between {} and {}, got {}",
            self.axis, self.range.0, self.range.1, self.value
        )
    }
}

impl std::error::Error for InvalidCoordinateError {}

/// Validates a latitude value (finite, -90..=90 degrees).
///
/// # Errors
///
/// Returns [`InvalidCoordinateError`] if the value is non-finite or out
/// of range.
pub fn validate_latitude(value: f64) -> Result<f64, InvalidCoordinateError> {
    if value.is_finite() && (-90.0..=90.0).contains(&value) {
        Ok(value)
    } else {
        Err(InvalidCoordinateError {
            axis: "latitude",
            value,
            range: (-90.0, 90.0),
        })
    }
}

/// Validates a longitude value (finite, -180..=180 degrees).
///
/// # Errors
///
/// Returns [`InvalidCoordinateError`] if the value is non-finite or out
/// of range.
pub fn validate_longitude(value: f64) -> Result<f64, InvalidCoordinateError> {
    if value.is_finite() && (-180.0..=180.0).contains(&value) {
        Ok(value)
    } else {
        Err(InvalidCoordinateError {
            axis: "longitude",
            value,
            range: (-180.0, 180.0),
        })
    }
}

impl Site {
    /// Builds a validated site record.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCoordinateError`] if either coordinate is
    /// non-finite or out of range.
    pub fn new(
        latitude: f64,
        longitude: f64,
        operator: Operator,
        technology: Technology,
        region: Option<String>,
    ) -> Result<Self, InvalidCoordinateError> {
        Ok(Self {
            latitude: validate_latitude(latitude)?,
            longitude: validate_longitude(longitude)?,
            operator,
            technology,
            region,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_operator_spellings() {
        assert_eq!(Operator::from_source("MTN"), Operator::Mtn);
        assert_eq!(Operator::from_source("Glo"), Operator::Globacom);
        assert_eq!(Operator::from_source("Globacom"), Operator::Globacom);
        assert_eq!(Operator::from_source("9Mobile"), Operator::NineMobile);
    }

    #[test]
    fn unknown_operator_falls_back() {
        assert_eq!(Operator::from_source("Vodafone"), Operator::Unknown);
        assert_eq!(Operator::from_source(""), Operator::Unknown);
    }

    #[test]
    fn parses_technology_spellings() {
        assert_eq!(Technology::from_source("4G"), Technology::FourG);
        assert_eq!(Technology::from_source("2g"), Technology::TwoG);
        assert_eq!(Technology::from_source("5G"), Technology::Unknown);
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        let err = validate_latitude(123.4).unwrap_err();
        assert_eq!(err.axis, "latitude");
        assert_eq!(
            err.to_string(),
            "latitude must be a finite number between -90 and 90, got 123.4"
        );
    }

    #[test]
    fn rejects_non_finite_longitude() {
        assert!(validate_longitude(f64::NAN).is_err());
        assert!(validate_longitude(f64::INFINITY).is_err());
    }

    #[test]
    fn builds_valid_site() {
        let site = Site::new(
            6.5244,
            3.3792,
            Operator::Mtn,
            Technology::FourG,
            Some("Lagos".to_owned()),
        )
        .unwrap();
        assert_eq!(site.operator.label(), "MTN");
        assert_eq!(site.technology.label(), "4G");
    }
}
