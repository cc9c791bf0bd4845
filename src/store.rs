//! Plain-text store of raw monthly bulk text, laid out as `<root>/<STATION>/<YYYY>_<MM>.txt`.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct RawStore {
    root: PathBuf,
}

impl RawStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        RawStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, station: &str, year: i32, month: u32) -> PathBuf {
        self.root
            .join(station)
            .join(format!("{}_{:02}.txt", year, month))
    }

    pub fn contains(&self, station: &str, year: i32, month: u32) -> bool {
        self.path_for(station, year, month).is_file()
    }

    /// Saves the month's text, creating the station directory if needed.
    pub fn save(&self, station: &str, year: i32, month: u32, text: &str) -> Result<PathBuf> {
        let file_path = self.path_for(station, year, month);
        if let Some(dir) = file_path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&file_path, text)
            .with_context(|| format!("Failed to write {}", file_path.display()))?;

        Ok(file_path)
    }

    pub fn load(&self, station: &str, year: i32, month: u32) -> Result<String> {
        let file_path = self.path_for(station, year, month);
        fs::read_to_string(&file_path)
            .with_context(|| format!("Failed to read {}", file_path.display()))
    }

    /// Lists the stored (year, month) pairs for a station, oldest first.
    pub fn months(&self, station: &str) -> Result<Vec<(i32, u32)>> {
        let dir = self.root.join(station);
        let mut months = Vec::new();

        for entry in fs::read_dir(&dir)
            .with_context(|| format!("No raw data for station {} in {}", station, dir.display()))?
        {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if let Some(key) = path.file_name().and_then(|n| n.to_str()).and_then(parse_file_name) {
                months.push(key);
            }
        }
        months.sort_unstable();

        Ok(months)
    }

    /// Lists the station directories in the store.
    pub fn stations(&self) -> Result<Vec<String>> {
        let mut stations = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.is_dir() {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    stations.push(name.to_string());
                }
            }
        }
        stations.sort();

        Ok(stations)
    }
}

// Parses "YYYY_MM.txt"
fn parse_file_name(name: &str) -> Option<(i32, u32)> {
    let stem = name.strip_suffix(".txt")?;
    let (year, month) = stem.split_once('_')?;
    let year = year.parse().ok()?;
    let month = month.parse().ok()?;

    (1..=12).contains(&month).then_some((year, month))
}

// -- Tests -------------------------------------------------------------------
