//! Decoded report data structures and the decoder seam.

pub mod decoder;

use chrono::NaiveTime;
use thiserror::Error;

pub use decoder::TokenDecoder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Distinguishes periodic observations (METAR/SPECI) from forecast bulletins (TAF).
pub enum ReportKind {
    Observation,
    Forecast,
}

#[derive(Debug, Clone, PartialEq)]
/// One decodable report string, as cut out of a month's bulk text.
pub struct RawSegment {
    pub kind: ReportKind,
    pub text: String,
}

impl RawSegment {
    pub fn observation(text: impl Into<String>) -> Self {
        RawSegment {
            kind: ReportKind::Observation,
            text: text.into(),
        }
    }

    pub fn forecast(text: impl Into<String>) -> Self {
        RawSegment {
            kind: ReportKind::Forecast,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedUnit {
    Knots,
    MetresPerSecond,
    KilometresPerHour,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Wind {
    /// `None` when the direction is reported as variable.
    pub direction: Option<u16>,
    pub speed: u16,
    pub gust: Option<u16>,
    pub unit: SpeedUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudCover {
    Few,
    Scattered,
    Broken,
    Overcast,
}

impl CloudCover {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "FEW" => Some(CloudCover::Few),
            "SCT" => Some(CloudCover::Scattered),
            "BKN" => Some(CloudCover::Broken),
            "OVC" => Some(CloudCover::Overcast),
            _ => None,
        }
    }

    /// Broken and overcast layers constitute a ceiling.
    pub fn is_ceiling(&self) -> bool {
        matches!(self, CloudCover::Broken | CloudCover::Overcast)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CloudLayer {
    pub cover: CloudCover,
    pub height_ft: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Forecast validity window, as (day, hour) pairs.
pub struct ValidityPeriod {
    pub start_day: u32,
    pub start_hour: u32,
    pub end_day: u32,
    pub end_hour: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedReport {
    pub kind: ReportKind,
    /// Canonical re-encoded text. Used as the deduplication key.
    pub message: String,
    pub station: String,
    pub day: u32,
    pub time: Option<NaiveTime>,
    pub wind: Option<Wind>,
    pub visibility: Option<String>,
    pub clouds: Vec<CloudLayer>,
    pub weather: Vec<String>,
    pub validity: Option<ValidityPeriod>,
    /// Raw change groups: TAF FM/TEMPO/BECMG/PROB periods or the METAR trend.
    pub changes: Vec<String>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("empty report")]
    Empty,

    #[error("missing station identifier in `{0}`")]
    MissingStation(String),

    #[error("missing or invalid issue time in `{0}`")]
    MissingTime(String),

    #[error("invalid {group} group `{token}`")]
    InvalidGroup { group: &'static str, token: String },

    #[error("canonical text `{decoded}` does not match input `{input}`")]
    MessageMismatch { input: String, decoded: String },

    #[error("day {day} is outside {year}-{month:02}")]
    DayOutOfRange { day: u32, year: i32, month: u32 },
}

/// Turns one report string into a structured report.
pub trait ReportDecoder {
    fn decode(&self, kind: ReportKind, text: &str) -> Result<DecodedReport, DecodeError>;
}
