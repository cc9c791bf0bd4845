//! Checks how much of the calendar a station archive actually covers.

use thiserror::Error;

use crate::archive::{day_key, days_in_month, StationArchive};

/// Four TAF issues per day is the nominal cadence.
pub const EXPECTED_FORECASTS_PER_DAY: usize = 4;

/// A bucket the calendar expects is absent from the archive. This is an ingestion
/// problem, not missing data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoverageError {
    #[error("start year {start} is after end year {end}")]
    InvalidRange { start: i32, end: i32 },

    #[error("{station}: year {year} was never ingested")]
    MissingYear { station: String, year: i32 },

    #[error("{station}: month {year}-{month:02} was never ingested")]
    MissingMonth {
        station: String,
        year: i32,
        month: u32,
    },

    #[error("{station}: day {year}-{month:02}-{day} has no bucket")]
    MissingDay {
        station: String,
        year: i32,
        month: u32,
        day: String,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoverageReport {
    pub total_days: usize,
    pub total_hours: usize,
    pub missing_forecast_days: usize,
    pub missing_observation_hours: usize,
}

impl CoverageReport {
    pub fn missing_forecast_percent(&self) -> f64 {
        percent(self.missing_forecast_days, self.total_days)
    }

    pub fn missing_observation_percent(&self) -> f64 {
        percent(self.missing_observation_hours, self.total_hours)
    }
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 / total as f64 * 100.0
}

/// Counts empty hour slots and under-served forecast days across every calendar day of
/// `start_year..=end_year`.
pub fn validate(
    archive: &StationArchive,
    start_year: i32,
    end_year: i32,
) -> Result<CoverageReport, CoverageError> {
    if start_year > end_year {
        return Err(CoverageError::InvalidRange {
            start: start_year,
            end: end_year,
        });
    }

    let station = archive.station();
    let mut report = CoverageReport::default();

    for year in start_year..=end_year {
        if !archive.has_year(year) {
            return Err(CoverageError::MissingYear {
                station: station.to_string(),
                year,
            });
        }

        for month in 1..=12 {
            let month_archive =
                archive
                    .month(year, month)
                    .ok_or_else(|| CoverageError::MissingMonth {
                        station: station.to_string(),
                        year,
                        month,
                    })?;
            let num_days = days_in_month(year, month).unwrap_or_default();

            for day in 1..=num_days {
                let key = day_key(day);
                let bucket = month_archive
                    .day(&key)
                    .ok_or_else(|| CoverageError::MissingDay {
                        station: station.to_string(),
                        year,
                        month,
                        day: key.clone(),
                    })?;

                report.total_days += 1;
                if bucket.forecasts().len() < EXPECTED_FORECASTS_PER_DAY {
                    report.missing_forecast_days += 1;
                }

                for slot in bucket.observations() {
                    report.total_hours += 1;
                    if slot.is_empty() {
                        report.missing_observation_hours += 1;
                    }
                }
            }
        }
    }

    Ok(report)
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::*;
    use crate::{
        archive::MonthArchive,
        report::{DecodedReport, ReportKind},
    };

    fn report(kind: ReportKind, day: u32, hour: u32, tag: usize) -> DecodedReport {
        DecodedReport {
            kind,
            message: format!("{:?} {} {} {}", kind, day, hour, tag),
            station: "KCLM".to_string(),
            day,
            time: NaiveTime::from_hms_opt(hour, 0, 0),
            wind: None,
            visibility: None,
            clouds: vec![],
            weather: vec![],
            validity: None,
            changes: vec![],
        }
    }

    // A full year with every hour observed and four forecasts a day, except the
    // (month, day, hour) listed in `gaps`.
    fn full_year(year: i32, gaps: &[(u32, u32, u32)]) -> StationArchive {
        let mut archive = StationArchive::new("KCLM");
        for month in 1..=12 {
            let mut m = MonthArchive::new(year, month).unwrap();
            for day in 1..=days_in_month(year, month).unwrap() {
                for tag in 0..EXPECTED_FORECASTS_PER_DAY {
                    m.insert(report(ReportKind::Forecast, day, 0, tag)).unwrap();
                }
                for hour in 0..24 {
                    if !gaps.contains(&(month, day, hour)) {
                        m.insert(report(ReportKind::Observation, day, hour, 0))
                            .unwrap();
                    }
                }
            }
            archive = archive.with_month(m);
        }
        archive
    }

    #[test]
    fn should_report_single_missing_hour() {
        let archive = full_year(2023, &[(6, 15, 12)]);
        let report = validate(&archive, 2023, 2023).unwrap();

        assert_eq!(report.total_days, 365);
        assert_eq!(report.total_hours, 8760);
        assert_eq!(report.missing_observation_hours, 1);
        assert_eq!(report.missing_forecast_days, 0);
        assert!((report.missing_observation_percent() - 0.011415).abs() < 1e-5);
        assert_eq!(format!("{:.4}", report.missing_observation_percent()), "0.0114");
    }

    #[test]
    fn should_count_days_with_fewer_than_four_forecasts() {
        let mut archive = StationArchive::new("KCLM");
        for month in 1..=12 {
            let mut m = MonthArchive::new(2024, month).unwrap();
            if month == 2 {
                for tag in 0..3 {
                    m.insert(report(ReportKind::Forecast, 29, 0, tag)).unwrap();
                }
            }
            archive = archive.with_month(m);
        }

        let report = validate(&archive, 2024, 2024).unwrap();
        assert_eq!(report.total_days, 366);
        assert_eq!(report.missing_forecast_days, 366);
        assert_eq!(report.missing_observation_hours, 366 * 24);
        assert_eq!(report.missing_forecast_percent(), 100.0);
    }

    #[test]
    fn should_fail_on_missing_month() {
        let archive = StationArchive::new("KCLM").with_month(MonthArchive::new(2023, 1).unwrap());

        assert_eq!(
            validate(&archive, 2023, 2023),
            Err(CoverageError::MissingMonth {
                station: "KCLM".to_string(),
                year: 2023,
                month: 2,
            })
        );
    }

    #[test]
    fn should_fail_on_missing_year() {
        let archive = full_year(2023, &[]);

        assert!(matches!(
            validate(&archive, 2023, 2024),
            Err(CoverageError::MissingYear { year: 2024, .. })
        ));
    }

    #[test]
    fn should_reject_inverted_range() {
        let archive = StationArchive::new("KCLM");
        assert!(matches!(
            validate(&archive, 2024, 2023),
            Err(CoverageError::InvalidRange { .. })
        ));
    }

    #[test]
    fn should_not_mutate_archive() {
        let archive = full_year(2023, &[(1, 1, 0)]);
        let before = archive.clone();
        validate(&archive, 2023, 2023).unwrap();

        assert_eq!(archive, before);
    }
}
