//! Writes scraped shows to `shows.json` and `shows.csv`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::models::Show;

pub const JSON_FILE: &str = "shows.json";
pub const CSV_FILE: &str = "shows.csv";

#[derive(Debug, Clone)]
pub struct Persister {
    output_dir: PathBuf,
}

impl Persister {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn json_path(&self) -> PathBuf {
        self.output_dir.join(JSON_FILE)
    }

    pub fn csv_path(&self) -> PathBuf {
        self.output_dir.join(CSV_FILE)
    }

    /// Write both files. An empty list still produces `[]` and an empty CSV.
    pub async fn save(&self, shows: &[Show]) -> Result<()> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.output_dir.display()))?;

        let json = serde_json::to_string_pretty(shows)?;
        write(&self.json_path(), json.as_bytes()).await?;
        info!("Shows saved to {}", self.json_path().display());

        let csv = to_csv(shows)?;
        write(&self.csv_path(), csv.as_bytes()).await?;
        info!("Shows saved to {}", self.csv_path().display());

        Ok(())
    }
}

async fn write(path: &Path, contents: &[u8]) -> Result<()> {
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Render shows as CSV with a header row, or an empty string when there are none
pub fn to_csv(shows: &[Show]) -> Result<String> {
    if shows.is_empty() {
        return Ok(String::new());
    }

    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(Show::CSV_HEADER)?;
    for show in shows {
        writer.write_record(show.to_csv_record())?;
    }

    Ok(String::from_utf8(writer.into_inner()?)?)
}
