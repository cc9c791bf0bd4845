use anyhow::Result;

use crate::{
    archive::IngestSummary,
    cli::ValidateArgs,
    coverage::{self, CoverageReport},
};

use super::load_archives;

/// Validates coverage for each station. A station whose archive cannot be loaded or
/// validated is reported and skipped.
pub async fn validate(args: &ValidateArgs) -> Result<()> {
    let archives = load_archives(&args.store).await?;

    for (station, loaded) in archives {
        let (archive, summary) = match loaded {
            Ok(loaded) => loaded,
            Err(e) => {
                eprintln!("{}: {:#}", station, e);
                continue;
            }
        };

        match coverage::validate(&archive, args.years.start_year, args.years.end_year) {
            Ok(report) => println!("{}", format_report(&station, &summary, &report)),
            Err(e) => eprintln!("Validation failed: {}", e),
        }
    }

    Ok(())
}

fn format_report(station: &str, summary: &IngestSummary, report: &CoverageReport) -> String {
    format!(
        "{}: {} reports kept, {} duplicates, {} failed\n\
         Percentage of missing TAF days: {:.2}%\n\
         Percentage of missing METAR hours: {:.2}%",
        station,
        summary.inserted,
        summary.duplicates,
        summary.decode_failures + summary.malformed,
        report.missing_forecast_percent(),
        report.missing_observation_percent(),
    )
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_format_report() {
        let summary = IngestSummary {
            inserted: 10,
            duplicates: 2,
            decode_failures: 1,
            malformed: 1,
        };
        let report = CoverageReport {
            total_days: 365,
            total_hours: 8760,
            missing_forecast_days: 73,
            missing_observation_hours: 876,
        };

        assert_eq!(
            format_report("KCLM", &summary, &report),
            "KCLM: 10 reports kept, 2 duplicates, 2 failed\n\
             Percentage of missing TAF days: 20.00%\n\
             Percentage of missing METAR hours: 10.00%"
        );
    }
}
