//! Command line interface.

pub mod command;

use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Parser)]
#[command(version, about, long_about = None)]
/// Contains the commands
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download monthly METAR/TAF text into the raw store
    Download(DownloadArgs),
    /// Report missing TAF days and METAR hours
    Validate(ValidateArgs),
    /// Print METAR field histograms
    Stats(StatsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Root directory of the raw store
    #[arg(long, default_value = "raw_data")]
    pub raw_dir: PathBuf,

    /// ICAO station identifiers (defaults to every station in the raw store)
    #[arg(short, long = "station")]
    pub stations: Vec<String>,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct YearRange {
    /// First year, inclusive
    #[arg(long, default_value_t = 2010)]
    pub start_year: i32,

    /// Last year, inclusive
    #[arg(long, default_value_t = 2024)]
    pub end_year: i32,
}

#[derive(Args, Debug, Clone)]
pub struct DownloadArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub years: YearRange,

    /// Seconds to wait between requests
    #[arg(long, default_value_t = 60)]
    pub pause_secs: u64,

    /// Download months that are already in the raw store
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub years: YearRange,
}

#[derive(Args, Debug, Clone)]
pub struct StatsArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Also save the normalized observations to a parquet file in the home directory
    #[arg(long)]
    pub parquet: bool,
}

/// Creates a spinner.
pub fn create_spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner().with_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));

    bar
}

/// Creates a progress bar.
pub fn create_progress_bar(size: u64, message: String) -> ProgressBar {
    ProgressBar::new(size).with_message(message).with_style(
        ProgressStyle::with_template("[{eta_precise}] {bar:40.cyan/blue} {msg}")
            .unwrap()
            .progress_chars("##-"),
    )
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_download_defaults() {
        let cli = Cli::parse_from(["metar-archive", "download", "-s", "KCLM", "-s", "KPAE"]);

        match cli.command {
            Commands::Download(args) => {
                assert_eq!(args.store.stations, vec!["KCLM", "KPAE"]);
                assert_eq!(args.store.raw_dir, PathBuf::from("raw_data"));
                assert_eq!(args.years.start_year, 2010);
                assert_eq!(args.years.end_year, 2024);
                assert_eq!(args.pause_secs, 60);
                assert!(!args.overwrite);
            }
            _ => panic!("expected download"),
        }
    }

    #[test]
    fn should_parse_stats() {
        let cli = Cli::parse_from(["metar-archive", "stats", "--raw-dir", "/tmp/raw", "--parquet"]);

        match cli.command {
            Commands::Stats(args) => {
                assert!(args.store.stations.is_empty());
                assert_eq!(args.store.raw_dir, PathBuf::from("/tmp/raw"));
                assert!(args.parquet);
            }
            _ => panic!("expected stats"),
        }
    }
}
