//! A working session: one ledger plus the stores it synchronizes with.
//!
//! The session owns its ledger outright. Stores are touched only when an
//! action asks for it, and loading from either store replaces the ledger
//! wholesale.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::calc::LossRates;
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::journal::EventLog;
use crate::ledger::Ledger;
use crate::models::{HarvestRecord, LossSummary, NewHarvest, RowIdentifier};
use crate::store::{
    Connector, ExportOutcome, JsonFileStore, RelationalStore, SchemaStatus, SqliteConnector,
};

/// Which stored row to delete from the relational table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteTarget {
    Id(Uuid),
    /// 1-based position in the identifier listing (newest first).
    Position(usize),
}

impl FromStr for DeleteTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(id) = Uuid::parse_str(s) {
            return Ok(Self::Id(id));
        }
        s.parse::<usize>()
            .map(Self::Position)
            .map_err(|_| Error::InvalidInput(format!("'{}' is neither a record id nor a position", s)))
    }
}

impl fmt::Display for DeleteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{}", id),
            Self::Position(p) => write!(f, "#{}", p),
        }
    }
}

pub struct Session<C = SqliteConnector> {
    ledger: Ledger,
    rates: LossRates,
    file_store: JsonFileStore,
    relational: RelationalStore<C>,
    events: EventLog,
    /// Set while the saved document failed to parse, so a save cannot
    /// silently replace it.
    document_unreadable: bool,
}

impl Session<SqliteConnector> {
    /// Session whose relational store reads its settings from the environment.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config, RelationalStore::from_env())
    }
}

impl<C: Connector> Session<C> {
    pub fn new(config: &AppConfig, relational: RelationalStore<C>) -> Self {
        Self {
            ledger: Ledger::new(),
            rates: config.loss_rates,
            file_store: JsonFileStore::new(config.ledger_path()),
            relational,
            events: EventLog::new(config.log_path()),
            document_unreadable: false,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn rates(&self) -> &LossRates {
        &self.rates
    }

    pub fn file_store(&self) -> &JsonFileStore {
        &self.file_store
    }

    // ============================================================
    // Ledger operations
    // ============================================================

    pub fn register(&mut self, input: NewHarvest) -> Result<&HarvestRecord> {
        let record = HarvestRecord::register(input, &self.rates)?;
        self.events.record(&format!(
            "Registered harvest {} ({})",
            record.id(),
            record.plot_name()
        ));
        tracing::info!(id = %record.id(), plot = record.plot_name(), "Registered harvest");

        self.ledger.append(record);
        Ok(&self.ledger.records()[self.ledger.len() - 1])
    }

    pub fn summary(&self) -> LossSummary {
        self.ledger.summary()
    }

    /// Remove a record from the ledger only; stored copies are untouched.
    pub fn remove_local(&mut self, position: usize) -> Result<HarvestRecord> {
        let removed = self.ledger.remove_at(position)?;
        self.events.record(&format!(
            "Removed harvest {} ({}) from ledger",
            removed.id(),
            removed.plot_name()
        ));
        Ok(removed)
    }

    // ============================================================
    // File store operations
    // ============================================================

    /// Write the ledger to the document. Refused with `UnreadableDocument`
    /// after the document failed to load.
    pub fn save_file(&mut self) -> Result<usize> {
        if self.document_unreadable {
            return Err(Error::UnreadableDocument(self.file_store.path().to_path_buf()));
        }
        self.overwrite_file()
    }

    /// Write the ledger to the document even if it could not be read.
    pub fn overwrite_file(&mut self) -> Result<usize> {
        self.file_store.save(self.ledger.records())?;
        self.document_unreadable = false;
        self.events.record("Saved ledger document");
        Ok(self.ledger.len())
    }

    pub fn document_unreadable(&self) -> bool {
        self.document_unreadable
    }

    /// Replace the ledger with the saved document. On failure the ledger is
    /// left as it was.
    pub fn load_file(&mut self) -> Result<usize> {
        let records = match self.file_store.load() {
            Ok(records) => records,
            Err(e) => {
                if matches!(e, Error::MalformedDocument { .. }) {
                    self.document_unreadable = true;
                }
                return Err(e);
            }
        };
        self.document_unreadable = false;
        self.ledger.replace_all(records);
        self.events.record("Loaded ledger document");
        Ok(self.ledger.len())
    }

    // ============================================================
    // Relational store operations
    // ============================================================

    pub fn create_table(&self) -> Result<SchemaStatus> {
        let status = self.relational.ensure_schema()?;
        self.events.record(&status.to_string());
        Ok(status)
    }

    pub fn export(&self) -> Result<ExportOutcome> {
        let outcome = self.relational.upsert_all(self.ledger.records())?;
        self.events.record(&outcome.to_string());
        Ok(outcome)
    }

    pub fn query_table(&self) -> Result<Vec<HarvestRecord>> {
        self.relational.query_all()
    }

    pub fn table_identifiers(&self) -> Result<Vec<RowIdentifier>> {
        self.relational.list_identifiers()
    }

    /// Returns the number of rows removed; 0 when the target isn't stored.
    pub fn delete_from_table(&self, target: DeleteTarget) -> Result<usize> {
        let id = match target {
            DeleteTarget::Id(id) => id,
            DeleteTarget::Position(position) => {
                let ids = self.relational.list_identifiers()?;
                if position == 0 || position > ids.len() {
                    return Err(Error::IndexOutOfRange {
                        position,
                        len: ids.len(),
                    });
                }
                ids[position - 1].id
            }
        };

        let removed = self.relational.delete_by_id(id)?;
        self.events
            .record(&format!("Deleted {} row(s) for harvest {} from table", removed, id));
        Ok(removed)
    }

    pub fn clear_table(&self) -> Result<usize> {
        let removed = self.relational.delete_all()?;
        self.events
            .record(&format!("Deleted all {} row(s) from table", removed));
        Ok(removed)
    }

    /// Replace the ledger with the table contents.
    pub fn import_table(&mut self) -> Result<usize> {
        let records = self.relational.query_all()?;
        self.ledger.replace_all(records);
        self.events
            .record(&format!("Imported {} record(s) from table", self.ledger.len()));
        Ok(self.ledger.len())
    }
}
