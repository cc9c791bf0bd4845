pub mod download;
pub mod stats;
pub mod validate;

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use chrono::{Datelike, Local};
use futures::future::join_all;
use tokio::task;

pub use download::download;
pub use stats::stats;
pub use validate::validate;

use crate::{
    archive::{IngestSummary, StationArchive},
    report::TokenDecoder,
    store::RawStore,
};

use super::{create_progress_bar, StoreArgs};

pub fn make_parquet_file_name(station: &str) -> Result<PathBuf> {
    let today = Local::now();
    let file_name = format!(
        "metar-{}-{}-{:02}-{:02}.parquet",
        station.to_lowercase(),
        today.year(),
        today.month(),
        today.day()
    );

    let home = dirs::home_dir().ok_or_else(|| anyhow!("Unable to locate home directory"))?;

    Ok(home.join(file_name))
}

/// Uses the requested stations, or every station in the store when none are given.
fn resolve_stations(store: &RawStore, args: &StoreArgs) -> Result<Vec<String>> {
    if !args.stations.is_empty() {
        return Ok(args.stations.iter().map(|s| s.to_uppercase()).collect());
    }

    let stations = store.stations()?;
    if stations.is_empty() {
        return Err(anyhow!("No stations found in {}", store.root().display()));
    }

    Ok(stations)
}

/// Loads each station's archive on its own blocking task.
async fn load_archives(args: &StoreArgs) -> Result<Vec<(String, Result<(StationArchive, IngestSummary)>)>> {
    let store = RawStore::new(&args.raw_dir);
    let stations = resolve_stations(&store, args)?;

    let pb = create_progress_bar(stations.len() as u64, "Decoding stations".to_string());

    let tasks: Vec<_> = stations
        .iter()
        .map(|station| {
            let store = store.clone();
            let station = station.clone();
            let pb = pb.clone();
            task::spawn_blocking(move || {
                let loaded = StationArchive::load(&store, &station, &TokenDecoder);
                pb.inc(1);
                loaded
            })
        })
        .collect();

    let mut archives = Vec::with_capacity(stations.len());
    for (station, result) in stations.into_iter().zip(join_all(tasks).await) {
        let loaded = result.map_err(|e| anyhow!("Task join error: {}", e)).and_then(|r| r);
        archives.push((station, loaded));
    }
    pb.finish_with_message("Stations decoded");

    Ok(archives)
}
