//! Process-scoped database handle
//!
//! `ParcelDb` owns the SQLite connection. Stores borrow it, so no store can
//! outlive the handle, and `close` releases it explicitly at shutdown.

use crate::config::ParcelConfig;
use crate::errors::{ParcelError, Result};
use crate::store::ParcelStore;
use rusqlite::Connection;
use std::path::Path;

/// Embedded schema SQL from PARCEL_SCHEMA.sql
const SCHEMA_SQL: &str = include_str!("../PARCEL_SCHEMA.sql");

/// Owned database handle
pub struct ParcelDb {
    conn: Connection,
}

impl ParcelDb {
    /// Open the database described by `cfg`
    ///
    /// Creates the database file (and its directory) if it doesn't exist.
    pub fn open(cfg: &ParcelConfig) -> Result<Self> {
        let path = cfg.resolved_db_path();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                ParcelError::storage_with_source(
                    format!("failed to create db directory: {}", parent.display()),
                    e,
                )
            })?;
        }

        let conn = Connection::open(&path).map_err(|e| {
            ParcelError::storage_with_source(format!("failed to open db at {}", path.display()), e)
        })?;

        let db = Self::init(conn, cfg)?;
        tracing::debug!(path = %path.display(), "parcel db opened");
        Ok(db)
    }

    /// Open a specific database path with default settings
    pub fn open_at_path(path: &Path) -> Result<Self> {
        let cfg = ParcelConfig {
            db_path: path.to_string_lossy().into_owned(),
            ..ParcelConfig::default()
        };
        Self::open(&cfg)
    }

    /// Open a private in-memory database with the schema applied
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| ParcelError::storage_with_source("failed to open in-memory db", e))?;

        Self::init(conn, &ParcelConfig::default())
    }

    fn init(conn: Connection, cfg: &ParcelConfig) -> Result<Self> {
        conn.busy_timeout(cfg.busy_timeout())
            .map_err(|e| ParcelError::storage_with_source("failed to set busy timeout", e))?;

        if cfg.create_schema {
            Self::apply_schema(&conn)?;
        }

        Ok(Self { conn })
    }

    fn apply_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| ParcelError::storage_with_source("failed to apply schema", e))
    }

    /// A store borrowing this handle
    pub fn store(&self) -> ParcelStore<'_> {
        ParcelStore::new(&self.conn)
    }

    /// The underlying connection, for collaborators that need raw access
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Close the connection, reporting any error SQLite raises while doing so
    pub fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, e)| ParcelError::storage_with_source("failed to close db", e))?;
        tracing::debug!("parcel db closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parcel::Parcel;

    #[test]
    fn test_schema_applies() {
        let db = ParcelDb::open_in_memory().expect("should connect");
        assert_eq!(db.store().count().expect("count"), 0);

        let tables: i64 = db
            .connection()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'parcel'",
                [],
                |row| row.get(0),
            )
            .expect("sqlite_master");
        assert_eq!(tables, 1);
    }

    #[test]
    fn test_schema_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("parcel.db");

        let db = ParcelDb::open_at_path(&path).expect("first open");
        let id = db.store().add(&Parcel::registered(1, "a")).expect("add");
        db.close().expect("close");

        let db = ParcelDb::open_at_path(&path).expect("second open");
        assert_eq!(db.store().get(id).expect("get").address, "a");
        db.close().expect("close");
    }

    #[test]
    fn test_without_schema_fails_on_use() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = ParcelConfig {
            db_path: dir.path().join("bare.db").to_string_lossy().into_owned(),
            create_schema: false,
            ..ParcelConfig::default()
        };

        let db = ParcelDb::open(&cfg).expect("open");
        let err = db.store().count().expect_err("table is missing");
        assert_eq!(err.category(), crate::ErrorCategory::StorageError);
    }
}
