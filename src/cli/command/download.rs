use std::time::Duration;

use anyhow::{bail, Result};
use tracing::{debug, warn};

use crate::{
    cli::{create_progress_bar, DownloadArgs},
    download::fetch_month,
    store::RawStore,
};

/// Downloads every requested station-month into the raw store. Returns the number of
/// months saved.
pub async fn download(args: &DownloadArgs) -> Result<usize> {
    if args.store.stations.is_empty() {
        bail!("At least one --station is required");
    }
    if args.years.start_year > args.years.end_year {
        bail!(
            "Start year {} is after end year {}",
            args.years.start_year,
            args.years.end_year
        );
    }

    let store = RawStore::new(&args.store.raw_dir);
    let client = reqwest::Client::new();
    let pause = Duration::from_secs(args.pause_secs);

    let months = pending_months(&store, args);
    let pb = create_progress_bar(months.len() as u64, "Downloading months...".to_string());
    let mut saved = 0;

    for (i, (station, year, month)) in months.iter().enumerate() {
        // Ogimet throttles clients that request too quickly
        if i > 0 {
            tokio::time::sleep(pause).await;
        }
        pb.set_message(format!("{} {}-{:02}", station, year, month));

        match fetch_month(&client, station, *year, *month).await {
            Ok(text) => {
                let path = store.save(station, *year, *month, &text)?;
                debug!(path = %path.display(), "Saved raw month");
                saved += 1;
            }
            Err(e) => warn!(station = %station, year, month, "{:#}", e),
        }

        pb.inc(1);
    }

    pb.finish_with_message("Months downloaded");

    Ok(saved)
}

fn pending_months(store: &RawStore, args: &DownloadArgs) -> Vec<(String, i32, u32)> {
    let mut months = vec![];

    for station in &args.store.stations {
        let station = station.to_uppercase();
        for year in args.years.start_year..=args.years.end_year {
            for month in 1..=12 {
                if args.overwrite || !store.contains(&station, year, month) {
                    months.push((station.clone(), year, month));
                }
            }
        }
    }

    months
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use tempfile::TempDir;

    use super::*;
    use crate::cli::{StoreArgs, YearRange};

    fn args(raw_dir: &std::path::Path, overwrite: bool) -> DownloadArgs {
        DownloadArgs {
            store: StoreArgs {
                raw_dir: raw_dir.to_path_buf(),
                stations: vec!["kclm".to_string()],
            },
            years: YearRange {
                start_year: 2011,
                end_year: 2012,
            },
            pause_secs: 0,
            overwrite,
        }
    }

    #[test]
    fn should_skip_months_already_stored() {
        let tmp_dir = TempDir::new().unwrap();
        let store = RawStore::new(tmp_dir.path());
        store.save("KCLM", 2011, 3, "x").unwrap();

        let months = pending_months(&store, &args(tmp_dir.path(), false));
        assert_eq!(months.len(), 23);
        assert_eq!(months[0], ("KCLM".to_string(), 2011, 1));
        assert!(!months.contains(&("KCLM".to_string(), 2011, 3)));

        let months = pending_months(&store, &args(tmp_dir.path(), true));
        assert_eq!(months.len(), 24);
    }

    #[tokio::test]
    async fn should_reject_inverted_years() {
        let tmp_dir = TempDir::new().unwrap();
        let mut args = args(tmp_dir.path(), false);
        args.years.start_year = 2013;

        assert!(download(&args).await.is_err());
    }
}
