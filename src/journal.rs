//! Append-only event log kept next to the ledger document.
//!
//! Each line is `[<local timestamp, second precision>] <message>`.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct EventLog {
    path: PathBuf,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, message: &str) -> Result<()> {
        self.append_at(Local::now().naive_local(), message)
    }

    pub fn append_at(&self, at: NaiveDateTime, message: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", format_line(at, message))?;
        Ok(())
    }

    /// Append, downgrading any failure to a warning. The event log is a side
    /// record and must not abort the action being logged.
    pub fn record(&self, message: &str) {
        if let Err(e) = self.append(message) {
            tracing::warn!(path = %self.path.display(), "Failed to write event log: {}", e);
        }
    }
}

fn format_line(at: NaiveDateTime, message: &str) -> String {
    format!("[{}] {}", at.format("%Y-%m-%dT%H:%M:%S"), message)
}
