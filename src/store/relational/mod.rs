//! Relational persistence of harvest records in the `COLHEITAS` table.
//!
//! Every operation opens its own connection, runs one batch of statements and
//! closes the connection again before returning, on success and on failure.
//! Connection parameters come from the environment:
//! - `CANE_DB_USER` - database principal
//! - `CANE_DB_PASSWORD` - credential
//! - `CANE_DB_DSN` - where the database lives (a file path for SQLite)

mod schema;

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{HarvestMethod, HarvestRecord, RowIdentifier};

pub use schema::{SchemaStatus, TABLE};

pub const USER_VAR: &str = "CANE_DB_USER";
pub const PASSWORD_VAR: &str = "CANE_DB_PASSWORD";
pub const DSN_VAR: &str = "CANE_DB_DSN";

/// Parameters needed to reach the relational backend.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub user: String,
    pub password: String,
    pub dsn: String,
}

impl ConnectionSettings {
    pub fn new(
        user: impl Into<String>,
        password: impl Into<String>,
        dsn: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
            dsn: dsn.into(),
        }
    }

    /// Read settings from the process environment. Every variable must be set
    /// and non-blank.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let (user, password, dsn) = (read(USER_VAR), read(PASSWORD_VAR), read(DSN_VAR));
        match (user, password, dsn) {
            (Some(user), Some(password), Some(dsn)) => Ok(Self::new(user, password, dsn)),
            (user, password, dsn) => {
                let missing: Vec<&str> = [
                    (USER_VAR, user.is_none()),
                    (PASSWORD_VAR, password.is_none()),
                    (DSN_VAR, dsn.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, absent)| absent.then_some(name))
                .collect();
                Err(Error::ConnectionUnavailable(format!(
                    "missing environment variable(s): {}",
                    missing.join(", ")
                )))
            }
        }
    }
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("dsn", &self.dsn)
            .finish()
    }
}

/// Source of fresh connections to the relational backend.
pub trait Connector {
    fn connect(&self) -> Result<Connection>;
}

/// Opens SQLite databases. The DSN is the database file path.
///
/// SQLite has no notion of principals, so user and password are required to
/// be present but are not checked by the backend.
#[derive(Debug, Clone, Default)]
pub struct SqliteConnector {
    settings: Option<ConnectionSettings>,
}

impl SqliteConnector {
    pub fn new(settings: ConnectionSettings) -> Self {
        Self {
            settings: Some(settings),
        }
    }

    /// Resolve settings from the environment on every connect, so a missing
    /// variable only fails the relational action that needed it.
    pub fn from_env() -> Self {
        Self { settings: None }
    }
}

impl Connector for SqliteConnector {
    fn connect(&self) -> Result<Connection> {
        let settings = match &self.settings {
            Some(settings) => settings.clone(),
            None => ConnectionSettings::from_env()?,
        };

        tracing::debug!(user = %settings.user, dsn = %settings.dsn, "Opening connection");
        let conn = Connection::open(PathBuf::from(&settings.dsn)).map_err(|e| {
            Error::ConnectionUnavailable(format!("cannot open '{}': {}", settings.dsn, e))
        })?;
        Ok(conn)
    }
}

/// Outcome of exporting records to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportOutcome {
    NothingToExport,
    /// `rows_affected` is what the backend reported and is informational only.
    Upserted { records: usize, rows_affected: usize },
}

impl fmt::Display for ExportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NothingToExport => f.write_str("Nothing to export."),
            Self::Upserted { records, .. } => {
                write!(f, "{} record(s) upserted into {}.", records, TABLE)
            }
        }
    }
}

/// Harvest records in a relational table, keyed by record id.
pub struct RelationalStore<C = SqliteConnector> {
    connector: C,
}

impl RelationalStore<SqliteConnector> {
    pub fn from_env() -> Self {
        Self::new(SqliteConnector::from_env())
    }
}

impl<C: Connector> RelationalStore<C> {
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Create the table unless it already exists. Only connection failures
    /// are returned as errors.
    pub fn ensure_schema(&self) -> Result<SchemaStatus> {
        self.with_connection(|conn| Ok(schema::create_table(conn)))
    }

    /// Insert or overwrite each record by id, in one transaction.
    pub fn upsert_all(&self, records: &[HarvestRecord]) -> Result<ExportOutcome> {
        if records.is_empty() {
            return Ok(ExportOutcome::NothingToExport);
        }

        self.with_connection(|conn| {
            let tx = conn.transaction()?;
            let mut rows_affected = 0;
            {
                let mut stmt = tx.prepare(schema::UPSERT_SQL)?;
                for r in records {
                    rows_affected += stmt.execute(params![
                        r.id.to_string(),
                        format_date(r.date),
                        &r.plot_name,
                        r.area_ha,
                        r.yield_t_per_ha,
                        r.method.as_str(),
                        r.price_per_ton,
                        r.loss_pct,
                        r.loss_tons,
                        r.loss_cost,
                        r.total_tons,
                    ])?;
                }
            }
            tx.commit()?;

            tracing::info!(records = records.len(), rows_affected, "Exported records");
            Ok(ExportOutcome::Upserted {
                records: records.len(),
                rows_affected,
            })
        })
    }

    /// Every stored row, in whatever order the backend returns them.
    pub fn query_all(&self) -> Result<Vec<HarvestRecord>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(schema::SELECT_ALL_SQL)?;
            let records = stmt
                .query_map([], row_to_record)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(records)
        })
    }

    /// `(id, date, plot)` for every row, newest harvest first.
    pub fn list_identifiers(&self) -> Result<Vec<RowIdentifier>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(schema::LIST_IDS_SQL)?;
            let ids = stmt
                .query_map([], |row| {
                    Ok(RowIdentifier {
                        id: parse_uuid(row, 0)?,
                        date: parse_date(row, 1)?,
                        plot_name: row.get(2)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(ids)
        })
    }

    /// Returns how many rows were removed: 0 or 1.
    pub fn delete_by_id(&self, id: Uuid) -> Result<usize> {
        self.with_connection(|conn| {
            let removed = conn.execute(schema::DELETE_BY_ID_SQL, [id.to_string()])?;
            tracing::info!(%id, removed, "Deleted record");
            Ok(removed)
        })
    }

    pub fn delete_all(&self) -> Result<usize> {
        self.with_connection(|conn| {
            let removed = conn.execute(schema::DELETE_ALL_SQL, [])?;
            tracing::info!(removed, "Deleted all records");
            Ok(removed)
        })
    }

    /// Run `op` on a fresh connection and close it afterwards whatever the
    /// outcome. A failed close is logged and dropped so it never hides the
    /// result of `op`.
    fn with_connection<T>(&self, op: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut conn = self.connector.connect()?;
        let result = op(&mut conn);
        if let Err((_, e)) = conn.close() {
            tracing::warn!("Failed to close connection: {}", e);
        }
        result
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn parse_uuid(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let s: String = row.get(idx)?;
    Uuid::parse_str(&s).map_err(|e| conversion_error(idx, e))
}

fn parse_date(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let s: String = row.get(idx)?;
    NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|e| conversion_error(idx, e))
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<HarvestRecord> {
    let method: String = row.get(5)?;
    let method = method
        .parse::<HarvestMethod>()
        .map_err(|e| conversion_error(5, e))?;

    Ok(HarvestRecord {
        id: parse_uuid(row, 0)?,
        date: parse_date(row, 1)?,
        plot_name: row.get(2)?,
        area_ha: row.get(3)?,
        yield_t_per_ha: row.get(4)?,
        method,
        price_per_ton: row.get(6)?,
        loss_pct: row.get(7)?,
        loss_tons: row.get(8)?,
        loss_cost: row.get(9)?,
        total_tons: row.get(10)?,
    })
}
