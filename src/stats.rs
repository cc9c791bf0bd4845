//! Frequency statistics over normalized observations.

use std::{cmp::Ordering, fmt};

use crate::normalize::NormalizedRecord;

/// Occurrence counts per value, ascending, with the absent value (`None`) first.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram<K> {
    bins: Vec<(Option<K>, usize)>,
}

impl<K: PartialOrd + Copy> Histogram<K> {
    pub fn from_values<I: IntoIterator<Item = Option<K>>>(values: I) -> Self {
        let mut bins: Vec<(Option<K>, usize)> = Vec::new();

        for value in values {
            match bins.iter_mut().find(|(key, _)| *key == value) {
                Some((_, count)) => *count += 1,
                None => bins.push((value, 1)),
            }
        }
        bins.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

        Histogram { bins }
    }

    pub fn bins(&self) -> &[(Option<K>, usize)] {
        &self.bins
    }

    pub fn total(&self) -> usize {
        self.bins.iter().map(|(_, count)| count).sum()
    }
}

impl<K: PartialOrd + Copy + fmt::Display> fmt::Display for Histogram<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, count) in self.bins() {
            match key {
                Some(key) => writeln!(f, "  {:>8}: {}", key, count)?,
                None => writeln!(f, "  {:>8}: {}", "absent", count)?,
            }
        }
        Ok(())
    }
}

/// One histogram per tracked METAR field.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationStats {
    pub wind_degrees: Histogram<u16>,
    pub wind_speed: Histogram<u16>,
    pub wind_gust: Histogram<u16>,
    /// Unrecognised visibility encodings count as absent.
    pub visibility: Histogram<f64>,
    pub ceiling: Histogram<u32>,
    pub weather_conditions: Histogram<bool>,
}

impl ObservationStats {
    pub fn from_records(records: &[NormalizedRecord]) -> Self {
        ObservationStats {
            wind_degrees: Histogram::from_values(records.iter().map(|r| r.wind_degrees)),
            wind_speed: Histogram::from_values(records.iter().map(|r| r.wind_speed)),
            wind_gust: Histogram::from_values(records.iter().map(|r| r.wind_gust)),
            visibility: Histogram::from_values(
                records.iter().map(|r| r.visibility.as_ref().ok().copied()),
            ),
            ceiling: Histogram::from_values(records.iter().map(|r| r.ceiling)),
            weather_conditions: Histogram::from_values(
                records.iter().map(|r| Some(r.weather_conditions)),
            ),
        }
    }
}

impl fmt::Display for ObservationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "observations: {}\n", self.weather_conditions.total())?;
        writeln!(f, "wind_degrees:\n{}", self.wind_degrees)?;
        writeln!(f, "wind_speed:\n{}", self.wind_speed)?;
        writeln!(f, "wind_gust:\n{}", self.wind_gust)?;
        writeln!(f, "visibility:\n{}", self.visibility)?;
        writeln!(f, "ceiling:\n{}", self.ceiling)?;
        write!(f, "weather_conditions:\n{}", self.weather_conditions)
    }
}

// -- Tests -------------------------------------------------------------------
