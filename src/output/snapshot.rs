//! CSV snapshot writer
//!
//! Writes a single `sku` column. The file is replaced atomically: rows go to a
//! sibling temp file which is then renamed over the snapshot.

use crate::output::traits::{OutputResult, SnapshotWriter};
use std::path::{Path, PathBuf};

/// Header of the single identifier column
pub const IDENTIFIER_COLUMN: &str = "sku";

/// Snapshot writer producing a one-column CSV file
#[derive(Debug, Clone)]
pub struct CsvSnapshotWriter {
    path: PathBuf,
}

impl CsvSnapshotWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotWriter for CsvSnapshotWriter {
    fn write(&self, identifiers: &[String]) -> OutputResult<()> {
        let temp = self.temp_path();

        {
            let mut writer = csv::Writer::from_path(&temp)?;
            writer.write_record([IDENTIFIER_COLUMN])?;
            for id in identifiers {
                writer.write_record([id])?;
            }
            writer.flush()?;
        }

        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Reads a snapshot back into memory
pub fn read_snapshot(path: &Path) -> OutputResult<Vec<String>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut identifiers = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(id) = record.get(0) {
            identifiers.push(id.to_string());
        }
    }
    Ok(identifiers)
}
