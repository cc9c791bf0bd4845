//! Calendar-shaped containers for decoded reports.
//!
//! A [`MonthArchive`] is created with a bucket for every day of its month and 24 hour
//! slots per day, so a day or hour with no data is an empty bucket, never a missing key.

mod ingest;

use std::collections::BTreeMap;
use std::ops::AddAssign;

use anyhow::{anyhow, Result};
use chrono::{Datelike, NaiveDate};
use tracing::info;

use crate::{
    report::{DecodedReport, ReportDecoder},
    segment::segments,
    store::RawStore,
};

pub const HOURS_PER_DAY: usize = 24;

/// Returns the number of days in the month, or `None` for an invalid month.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };

    Some(next.pred_opt()?.day())
}

/// Zero-padded day key, e.g. `"07"`.
pub fn day_key(day: u32) -> String {
    format!("{:02}", day)
}

/// Observations decoded for one hour of one day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HourSlot(Vec<DecodedReport>);

impl HourSlot {
    pub fn reports(&self) -> &[DecodedReport] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Appends the report unless one with the same message is already present.
    fn push_unique(&mut self, report: DecodedReport) -> bool {
        push_unique(&mut self.0, report)
    }
}

fn push_unique(reports: &mut Vec<DecodedReport>, report: DecodedReport) -> bool {
    if reports.iter().any(|r| r.message == report.message) {
        return false;
    }
    reports.push(report);
    true
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayBucket {
    observations: [HourSlot; HOURS_PER_DAY],
    forecasts: Vec<DecodedReport>,
}

impl Default for DayBucket {
    fn default() -> Self {
        DayBucket {
            observations: std::array::from_fn(|_| HourSlot::default()),
            forecasts: Vec::new(),
        }
    }
}

impl DayBucket {
    pub fn observations(&self) -> &[HourSlot; HOURS_PER_DAY] {
        &self.observations
    }

    pub fn forecasts(&self) -> &[DecodedReport] {
        &self.forecasts
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthArchive {
    year: i32,
    month: u32,
    days: BTreeMap<String, DayBucket>,
}

impl MonthArchive {
    /// Creates the archive with an empty bucket for every day of the month.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let num_days = days_in_month(year, month)?;
        let days = (1..=num_days)
            .map(|day| (day_key(day), DayBucket::default()))
            .collect();

        Some(MonthArchive { year, month, days })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self, key: &str) -> Option<&DayBucket> {
        self.days.get(key)
    }

    pub fn days(&self) -> impl Iterator<Item = (&String, &DayBucket)> {
        self.days.iter()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// Per-segment outcomes of one or more ingestion passes.
pub struct IngestSummary {
    pub inserted: usize,
    pub duplicates: usize,
    pub decode_failures: usize,
    pub malformed: usize,
}

impl AddAssign for IngestSummary {
    fn add_assign(&mut self, other: Self) {
        self.inserted += other.inserted;
        self.duplicates += other.duplicates;
        self.decode_failures += other.decode_failures;
        self.malformed += other.malformed;
    }
}

/// Every ingested month for one station, by year then month.
#[derive(Debug, Clone, PartialEq)]
pub struct StationArchive {
    station: String,
    years: BTreeMap<i32, BTreeMap<u32, MonthArchive>>,
}

impl StationArchive {
    pub fn new(station: &str) -> Self {
        StationArchive {
            station: station.to_string(),
            years: BTreeMap::new(),
        }
    }

    /// Decodes and buckets every month the raw store holds for the station.
    pub fn load<D: ReportDecoder + ?Sized>(
        store: &RawStore,
        station: &str,
        decoder: &D,
    ) -> Result<(Self, IngestSummary)> {
        let months = store.months(station)?;

        let (archive, summary) = months.into_iter().try_fold(
            (StationArchive::new(station), IngestSummary::default()),
            |(archive, mut summary), (year, month)| -> Result<_> {
                let raw = store.load(station, year, month)?;
                let mut month_archive = MonthArchive::new(year, month)
                    .ok_or_else(|| anyhow!("Invalid month {}-{:02}", year, month))?;

                let month_summary = month_archive.ingest(segments(&raw), decoder);
                info!(
                    station,
                    year,
                    month,
                    inserted = month_summary.inserted,
                    duplicates = month_summary.duplicates,
                    failures = month_summary.decode_failures + month_summary.malformed,
                    "Ingested month"
                );
                summary += month_summary;

                Ok((archive.with_month(month_archive), summary))
            },
        )?;

        Ok((archive, summary))
    }

    /// Adds (or replaces) a month.
    pub fn with_month(mut self, month: MonthArchive) -> Self {
        self.years
            .entry(month.year())
            .or_default()
            .insert(month.month(), month);
        self
    }

    pub fn station(&self) -> &str {
        &self.station
    }

    pub fn month(&self, year: i32, month: u32) -> Option<&MonthArchive> {
        self.years.get(&year)?.get(&month)
    }

    pub fn has_year(&self, year: i32) -> bool {
        self.years.contains_key(&year)
    }

    pub fn months(&self) -> impl Iterator<Item = &MonthArchive> {
        self.years.values().flat_map(|months| months.values())
    }

    /// Every stored observation in calendar order, with its (year, month, day).
    pub fn observations(&self) -> impl Iterator<Item = (i32, u32, u32, &DecodedReport)> {
        self.months().flat_map(|m| {
            m.days().flat_map(move |(key, bucket)| {
                let day: u32 = key.parse().unwrap_or_default();
                bucket
                    .observations
                    .iter()
                    .flat_map(|slot| slot.reports())
                    .map(move |report| (m.year(), m.month(), day, report))
            })
        })
    }
}

// -- Tests -------------------------------------------------------------------
