//! Converts decoded observations into flat records in canonical units.
//!
//! Wind is in degrees and knots, visibility in statute miles and ceiling in feet.

use chrono::Timelike;
use thiserror::Error;

use crate::report::{CloudLayer, DecodedReport, SpeedUnit};

/// Visibility value for a report with no visibility group.
pub const VISIBILITY_NOT_REPORTED: f64 = -1.0;

const METRES_PER_STATUTE_MILE: f64 = 1609.344;
const KNOTS_PER_MPS: f64 = 1.943844;
const KMH_PER_KNOT: f64 = 1.852;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizeError {
    #[error("unrecognised visibility `{0}`")]
    Visibility(String),

    #[error("forecast normalization is not implemented")]
    ForecastUnsupported,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub station: String,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub wind_degrees: Option<u16>,
    pub wind_speed: Option<u16>,
    pub wind_gust: Option<u16>,
    /// Statute miles, [`VISIBILITY_NOT_REPORTED`] when absent, or the error for an
    /// encoding that could not be converted.
    pub visibility: Result<f64, NormalizeError>,
    /// Feet. `None` means no ceiling.
    pub ceiling: Option<u32>,
    pub weather_conditions: bool,
}

/// Flattens a decoded METAR. Field conversions are independent: a bad visibility group
/// leaves the other fields intact.
pub fn normalize_observation(
    station: &str,
    year: i32,
    month: u32,
    day: u32,
    report: &DecodedReport,
) -> NormalizedRecord {
    let (hour, minute) = report
        .time
        .map(|t| (t.hour(), t.minute()))
        .unwrap_or_default();
    let wind = report.wind.as_ref();

    NormalizedRecord {
        station: station.to_string(),
        year,
        month,
        day,
        hour,
        minute,
        wind_degrees: wind.and_then(|w| w.direction),
        wind_speed: wind.map(|w| to_knots(w.speed, w.unit)),
        wind_gust: wind.and_then(|w| w.gust.map(|g| to_knots(g, w.unit))),
        visibility: convert_visibility(report.visibility.as_deref().unwrap_or("")),
        ceiling: compute_ceiling(&report.clouds),
        weather_conditions: !report.weather.is_empty(),
    }
}

/// Reserved for per-window TAF normalization. Always fails for now.
#[allow(dead_code)]
pub fn normalize_forecast(_report: &DecodedReport) -> Result<Vec<NormalizedRecord>, NormalizeError> {
    Err(NormalizeError::ForecastUnsupported)
}

fn to_knots(speed: u16, unit: SpeedUnit) -> u16 {
    match unit {
        SpeedUnit::Knots => speed,
        SpeedUnit::MetresPerSecond => (speed as f64 * KNOTS_PER_MPS).round() as u16,
        SpeedUnit::KilometresPerHour => (speed as f64 / KMH_PER_KNOT).round() as u16,
    }
}

/// Height of the first broken or overcast layer, in ascending height order.
pub fn compute_ceiling(clouds: &[CloudLayer]) -> Option<u32> {
    clouds
        .iter()
        .filter(|layer| layer.cover.is_ceiling())
        .map(|layer| layer.height_ft)
        .min()
}

/// Converts a decoded visibility string to statute miles.
///
/// Rules, first match wins: empty is not reported, a trailing `m` is metres, `M1/4SM`
/// is a quarter mile, and an `SM` value is either `N D/D`, `N/D` or a plain number.
pub fn convert_visibility(visibility: &str) -> Result<f64, NormalizeError> {
    let invalid = || NormalizeError::Visibility(visibility.to_string());

    if visibility.is_empty() {
        return Ok(VISIBILITY_NOT_REPORTED);
    }

    if let Some(metres) = visibility.strip_suffix('m') {
        let metres = parse_count(metres.trim()).ok_or_else(invalid)?;
        return Ok(metres / METRES_PER_STATUTE_MILE);
    }

    if visibility == "M1/4SM" {
        return Ok(0.25);
    }

    let miles = visibility.strip_suffix("SM").ok_or_else(invalid)?;

    if let Some((whole, fraction)) = miles.split_once(' ') {
        let whole = parse_count(whole).ok_or_else(invalid)?;
        let fraction = parse_fraction(fraction).ok_or_else(invalid)?;
        return Ok(whole + fraction);
    }

    if miles.contains('/') {
        return parse_fraction(miles).ok_or_else(invalid);
    }

    parse_count(miles).ok_or_else(invalid)
}

/// Unsigned decimal digits only, so `inf`, `NaN`, exponents and signs are rejected.
fn parse_count(s: &str) -> Option<f64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn parse_fraction(s: &str) -> Option<f64> {
    let (numerator, denominator) = s.split_once('/')?;
    let numerator = parse_count(numerator)?;
    let denominator = parse_count(denominator)?;
    if denominator == 0.0 {
        return None;
    }

    Some(numerator / denominator)
}

// -- Tests -------------------------------------------------------------------
