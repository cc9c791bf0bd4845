//! Splits one station-month of bulk text into individual report strings.
//!
//! Each non-comment line is prefixed with a `YYYYMMDDHHmm` timestamp and terminated with
//! `=`. METAR/SPECI lines stand alone; TAF bulletins may run over several lines.

use std::str::Lines;

use thiserror::Error;

use crate::report::RawSegment;

const OBSERVATION_PREFIX: usize = "YYYYMMDDHHmm METAR ".len();
const FORECAST_PREFIX: usize = "YYYYMMDDHHmm ".len();

const TERMINATOR: char = '=';
const NO_DATA: &str = "NIL=";
const FORECAST_KEYWORD: &str = "TAF";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SegmentError {
    #[error("forecast starting on line {line} is not terminated: `{text}`")]
    Unterminated { line: usize, text: String },

    #[error("line {line} is shorter than its timestamp prefix: `{text}`")]
    Truncated { line: usize, text: String },
}

/// Lazily yields one segment per encoded report.
pub struct Segments<'a> {
    lines: Lines<'a>,
    line_no: usize,
    /// A line read while joining a forecast that starts the next report.
    pending: Option<&'a str>,
}

pub fn segments(raw: &str) -> Segments<'_> {
    Segments {
        lines: raw.lines(),
        line_no: 0,
        pending: None,
    }
}

impl<'a> Segments<'a> {
    fn next_line(&mut self) -> Option<&'a str> {
        self.line_no += 1;
        if let Some(line) = self.pending.take() {
            return Some(line);
        }
        self.lines.next().map(str::trim)
    }

    fn push_back(&mut self, line: &'a str) {
        self.line_no -= 1;
        self.pending = Some(line);
    }

    fn observation(&self, line: &str) -> Result<RawSegment, SegmentError> {
        let text = line.get(OBSERVATION_PREFIX..).ok_or_else(|| SegmentError::Truncated {
            line: self.line_no,
            text: line.to_string(),
        })?;

        Ok(RawSegment::observation(text.trim_end_matches(TERMINATOR)))
    }

    fn forecast(&mut self, first: &'a str) -> Result<RawSegment, SegmentError> {
        let start = self.line_no;
        let mut parts = vec![first];
        let mut line = first;

        while !line.ends_with(TERMINATOR) {
            match self.next_line() {
                Some(next) if !has_timestamp_prefix(next) => {
                    parts.push(next);
                    line = next;
                }
                Some(next) => {
                    self.push_back(next);
                    return Err(SegmentError::Unterminated {
                        line: start,
                        text: parts.join(" "),
                    });
                }
                None => {
                    return Err(SegmentError::Unterminated {
                        line: start,
                        text: parts.join(" "),
                    })
                }
            }
        }

        let joined = parts.join(" ");
        let text = joined
            .get(FORECAST_PREFIX..)
            .ok_or_else(|| SegmentError::Truncated {
                line: start,
                text: joined.clone(),
            })?
            .trim_end_matches(TERMINATOR);

        if text.starts_with(FORECAST_KEYWORD) {
            Ok(RawSegment::forecast(text))
        } else {
            Ok(RawSegment::forecast(format!("{} {}", FORECAST_KEYWORD, text)))
        }
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Result<RawSegment, SegmentError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.next_line()?;

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if is_observation(line) {
                if line.ends_with(NO_DATA) {
                    continue;
                }
                return Some(self.observation(line));
            }

            return Some(self.forecast(line));
        }
    }
}

fn is_observation(line: &str) -> bool {
    line.contains("METAR") || line.contains("SPECI")
}

/// Every report starts with `YYYYMMDDHHmm `; forecast continuation lines do not.
fn has_timestamp_prefix(line: &str) -> bool {
    let bytes = line.as_bytes();
    bytes.len() > FORECAST_PREFIX
        && bytes[..FORECAST_PREFIX - 1].iter().all(u8::is_ascii_digit)
        && bytes[FORECAST_PREFIX - 1] == b' '
}

// -- Tests -------------------------------------------------------------------
