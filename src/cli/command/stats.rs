use anyhow::Result;
use tracing::{info, warn};

use crate::{
    archive::StationArchive,
    cli::{create_spinner, StatsArgs},
    normalize::{normalize_observation, NormalizedRecord},
    parquet,
    stats::ObservationStats,
};

use super::{load_archives, make_parquet_file_name};

pub async fn stats(args: &StatsArgs) -> Result<()> {
    let archives = load_archives(&args.store).await?;

    for (station, loaded) in archives {
        let archive = match loaded {
            Ok((archive, _)) => archive,
            Err(e) => {
                eprintln!("{}: {:#}", station, e);
                continue;
            }
        };

        let records = normalize_archive(&archive);
        let unrecognised = records.iter().filter(|r| r.visibility.is_err()).count();
        if unrecognised > 0 {
            warn!(station = %station, unrecognised, "Some visibility groups could not be converted");
        }

        println!("{}: {} observations\n", station, records.len());
        println!("{}", ObservationStats::from_records(&records));

        if args.parquet {
            let file_name = make_parquet_file_name(&station)?;
            let bar = create_spinner("Writing parquet file...".to_string());
            parquet::save_observations(&records, &file_name)?;
            bar.finish_with_message("Parquet file written");
            info!(path = %file_name.display(), "Saved observations");
            println!("File saved to `{}`", file_name.display());
        }
    }

    Ok(())
}

fn normalize_archive(archive: &StationArchive) -> Vec<NormalizedRecord> {
    archive
        .observations()
        .map(|(year, month, day, report)| {
            normalize_observation(archive.station(), year, month, day, report)
        })
        .collect()
}

// -- Tests -------------------------------------------------------------------
