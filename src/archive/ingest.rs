//! Decodes segments into a month's buckets, dropping duplicates and bad reports.

use chrono::Timelike;
use tracing::{debug, warn};

use super::{day_key, push_unique, IngestSummary, MonthArchive};
use crate::{
    report::{DecodeError, DecodedReport, RawSegment, ReportDecoder, ReportKind},
    segment::SegmentError,
};

impl MonthArchive {
    /// Decodes each segment and files it in its day/hour bucket.
    ///
    /// A segment that fails to decode, or whose canonical text differs from the input,
    /// is logged and skipped. Reports whose message already exists in the target bucket
    /// are discarded.
    pub fn ingest<I, D>(&mut self, segments: I, decoder: &D) -> IngestSummary
    where
        I: IntoIterator<Item = Result<RawSegment, SegmentError>>,
        D: ReportDecoder + ?Sized,
    {
        let mut summary = IngestSummary::default();

        for segment in segments {
            let segment = match segment {
                Ok(segment) => segment,
                Err(e) => {
                    warn!(year = self.year, month = self.month, "Malformed segment: {}", e);
                    summary.malformed += 1;
                    continue;
                }
            };

            match self.decode_and_insert(&segment, decoder) {
                Ok(true) => summary.inserted += 1,
                Ok(false) => {
                    debug!("Duplicate report: {}", segment.text);
                    summary.duplicates += 1;
                }
                Err(e) => {
                    warn!(year = self.year, month = self.month, "Error decoding `{}`: {}", segment.text, e);
                    summary.decode_failures += 1;
                }
            }
        }

        summary
    }

    fn decode_and_insert<D: ReportDecoder + ?Sized>(
        &mut self,
        segment: &RawSegment,
        decoder: &D,
    ) -> Result<bool, DecodeError> {
        let report = decoder.decode(segment.kind, &segment.text)?;
        if report.message != segment.text {
            return Err(DecodeError::MessageMismatch {
                input: segment.text.clone(),
                decoded: report.message,
            });
        }

        self.insert(report)
    }

    /// Files a decoded report. Returns `Ok(false)` when the bucket already holds a
    /// report with the same message.
    pub fn insert(&mut self, report: DecodedReport) -> Result<bool, DecodeError> {
        let (year, month) = (self.year, self.month);
        let bucket = self
            .days
            .get_mut(&day_key(report.day))
            .ok_or(DecodeError::DayOutOfRange {
                day: report.day,
                year,
                month,
            })?;

        debug!(
            station = %report.station,
            day = report.day,
            changes = report.changes.len(),
            "Filing {:?}",
            report.kind
        );

        match report.kind {
            ReportKind::Observation => {
                let time = report
                    .time
                    .ok_or_else(|| DecodeError::MissingTime(report.message.clone()))?;
                Ok(bucket.observations[time.hour() as usize].push_unique(report))
            }
            ReportKind::Forecast => Ok(push_unique(&mut bucket.forecasts, report)),
        }
    }
}

// -- Tests -------------------------------------------------------------------
