//! Persistence backends for the ledger.
//!
//! The two stores are independent: the JSON document always holds a whole
//! ledger, while the relational table is upserted and pruned record by record.
//! Neither store is kept in step with the other automatically.

pub mod file;
pub mod relational;

pub use file::JsonFileStore;
pub use relational::{
    ConnectionSettings, Connector, ExportOutcome, RelationalStore, SchemaStatus, SqliteConnector,
};
