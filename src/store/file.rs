use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::models::HarvestRecord;

/// The ledger as a pretty-printed JSON array on disk.
///
/// Every save replaces the whole document. The new content is written to a
/// temporary file in the same directory and renamed over the old one, so a
/// reader never sees a half-written ledger.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn save(&self, records: &[HarvestRecord]) -> Result<()> {
        let dir = self.ensure_dir()?;

        let tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut writer, records)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        tracing::debug!(path = %self.path.display(), count = records.len(), "Saved ledger");
        Ok(())
    }

    /// Read the ledger back. A missing document is an empty ledger.
    pub fn load(&self) -> Result<Vec<HarvestRecord>> {
        self.ensure_dir()?;
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)?;
        let records: Vec<HarvestRecord> =
            serde_json::from_str(&content).map_err(|source| Error::MalformedDocument {
                path: self.path.clone(),
                source,
            })?;

        tracing::debug!(path = %self.path.display(), count = records.len(), "Loaded ledger");
        Ok(records)
    }

    fn ensure_dir(&self) -> Result<&Path> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        Ok(dir)
    }
}
