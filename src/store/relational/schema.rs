use std::fmt;

use rusqlite::Connection;

pub const TABLE: &str = "COLHEITAS";

const CREATE_TABLE_SQL: &str = include_str!("sql/create_colheitas.sql");

pub const UPSERT_SQL: &str = "
    INSERT INTO COLHEITAS
        (ID, DATA_COLHEITA, TALHAO, AREA_HA, PROD_T_HA, METODO, PRECO_TON,
         PERDA_PCT, PERDA_TON, PERDA_REAIS, TOTAL_TON)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
    ON CONFLICT(ID) DO UPDATE SET
        DATA_COLHEITA = excluded.DATA_COLHEITA,
        TALHAO        = excluded.TALHAO,
        AREA_HA       = excluded.AREA_HA,
        PROD_T_HA     = excluded.PROD_T_HA,
        METODO        = excluded.METODO,
        PRECO_TON     = excluded.PRECO_TON,
        PERDA_PCT     = excluded.PERDA_PCT,
        PERDA_TON     = excluded.PERDA_TON,
        PERDA_REAIS   = excluded.PERDA_REAIS,
        TOTAL_TON     = excluded.TOTAL_TON";

pub const SELECT_ALL_SQL: &str = "
    SELECT ID, DATA_COLHEITA, TALHAO, AREA_HA, PROD_T_HA, METODO, PRECO_TON,
           PERDA_PCT, PERDA_TON, PERDA_REAIS, TOTAL_TON
    FROM COLHEITAS";

pub const LIST_IDS_SQL: &str = "
    SELECT ID, DATA_COLHEITA, TALHAO
    FROM COLHEITAS
    ORDER BY DATA_COLHEITA DESC";

pub const DELETE_BY_ID_SQL: &str = "DELETE FROM COLHEITAS WHERE ID = ?1";

pub const DELETE_ALL_SQL: &str = "DELETE FROM COLHEITAS";

/// Result of trying to create the harvest table.
///
/// None of these are errors from the caller's point of view: an existing table
/// is the expected state on every run after the first, and other DDL failures
/// are reported rather than raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaStatus {
    Created,
    AlreadyExists,
    Failed(String),
}

impl fmt::Display for SchemaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "Table {} created.", TABLE),
            Self::AlreadyExists => write!(f, "Table {} already exists.", TABLE),
            Self::Failed(msg) => write!(f, "Could not create table {}: {}", TABLE, msg),
        }
    }
}

pub fn create_table(conn: &Connection) -> SchemaStatus {
    match conn.execute_batch(CREATE_TABLE_SQL) {
        Ok(()) => {
            tracing::info!("Created table {}", TABLE);
            SchemaStatus::Created
        }
        Err(e) if is_already_exists(&e) => {
            tracing::debug!("Table {} already present", TABLE);
            SchemaStatus::AlreadyExists
        }
        Err(e) => {
            tracing::warn!("Failed to create table {}: {}", TABLE, e);
            SchemaStatus::Failed(e.to_string())
        }
    }
}

fn is_already_exists(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("already exists"))
}
