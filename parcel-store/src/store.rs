//! Parcel table access
//!
//! Each operation is a single parameterized statement. Address changes and
//! deletes carry the `registered` guard inside the statement itself, so the
//! check and the write are one atomic step; a second read only runs after a
//! rejected write, to tell a missing parcel from a guarded one.

use crate::errors::{GuardedAction, ParcelError, Result};
use crate::parcel::{Parcel, ParcelStatus};
use rusqlite::{Connection, OptionalExtension, Row, params};

const SELECT_COLUMNS: &str = "SELECT number, client, address, status, created_at FROM parcel";

/// CRUD façade over the `parcel` table
///
/// Borrows a connection owned elsewhere (normally by [`crate::ParcelDb`]).
#[derive(Clone, Copy)]
pub struct ParcelStore<'conn> {
    conn: &'conn Connection,
}

fn parcel_from_row(row: &Row<'_>) -> rusqlite::Result<Parcel> {
    Ok(Parcel {
        number: row.get(0)?,
        client: row.get(1)?,
        address: row.get(2)?,
        status: row.get(3)?,
        created_at: row.get(4)?,
    })
}

impl<'conn> ParcelStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Insert a parcel and return its assigned number
    ///
    /// `parcel.number` is ignored; SQLite assigns the key.
    pub fn add(&self, parcel: &Parcel) -> Result<i64> {
        self.conn
            .execute(
                r#"
                INSERT INTO parcel (client, address, status, created_at)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![
                    parcel.client,
                    parcel.address,
                    parcel.status,
                    parcel.created_at
                ],
            )
            .map_err(|e| ParcelError::storage_with_source("failed to insert parcel", e))?;

        let number = self.conn.last_insert_rowid();
        tracing::debug!(
            number,
            client = parcel.client,
            status = %parcel.status,
            "Added parcel"
        );
        Ok(number)
    }

    /// Get a parcel by number
    pub fn get(&self, number: i64) -> Result<Parcel> {
        self.conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE number = ?1"),
                params![number],
                parcel_from_row,
            )
            .optional()
            .map_err(|e| ParcelError::storage_with_source("failed to get parcel", e))?
            .ok_or_else(|| ParcelError::not_found(number))
    }

    /// All parcels belonging to a client, oldest first
    ///
    /// An unknown client yields an empty vector.
    pub fn get_by_client(&self, client: i64) -> Result<Vec<Parcel>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_COLUMNS} WHERE client = ?1 ORDER BY number"))
            .map_err(|e| ParcelError::storage_with_source("failed to prepare query", e))?;

        let rows = stmt
            .query_map(params![client], parcel_from_row)
            .map_err(|e| ParcelError::storage_with_source("failed to query parcels", e))?;

        let mut parcels = Vec::new();
        for row in rows {
            parcels.push(
                row.map_err(|e| ParcelError::storage_with_source("failed to read parcel row", e))?,
            );
        }
        Ok(parcels)
    }

    /// Overwrite the status of a parcel
    ///
    /// Any status may follow any other. Fails with `NotFound` when no parcel
    /// has this number.
    pub fn set_status(&self, number: i64, status: ParcelStatus) -> Result<()> {
        let changed = self
            .conn
            .execute(
                r#"
                UPDATE parcel
                SET status = ?2
                WHERE number = ?1
                "#,
                params![number, status],
            )
            .map_err(|e| ParcelError::storage_with_source("failed to update status", e))?;

        if changed == 0 {
            return Err(ParcelError::not_found(number));
        }

        tracing::debug!(number, status = %status, "Updated parcel status");
        Ok(())
    }

    /// Change the delivery address of a `registered` parcel
    pub fn set_address(&self, number: i64, address: &str) -> Result<()> {
        let changed = self
            .conn
            .execute(
                r#"
                UPDATE parcel
                SET address = ?2
                WHERE number = ?1 AND status = ?3
                "#,
                params![number, address, ParcelStatus::Registered],
            )
            .map_err(|e| ParcelError::storage_with_source("failed to update address", e))?;

        if changed == 0 {
            return Err(self.rejection(number, GuardedAction::SetAddress));
        }

        tracing::debug!(number, "Updated parcel address");
        Ok(())
    }

    /// Delete a `registered` parcel
    pub fn delete(&self, number: i64) -> Result<()> {
        let deleted = self
            .conn
            .execute(
                r#"
                DELETE FROM parcel
                WHERE number = ?1 AND status = ?2
                "#,
                params![number, ParcelStatus::Registered],
            )
            .map_err(|e| ParcelError::storage_with_source("failed to delete parcel", e))?;

        if deleted == 0 {
            return Err(self.rejection(number, GuardedAction::Delete));
        }

        tracing::debug!(number, "Deleted parcel");
        Ok(())
    }

    /// Get parcel count (for metrics/debugging)
    pub fn count(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM parcel", [], |row| row.get(0))
            .map_err(|e| ParcelError::storage_with_source("failed to count parcels", e))
    }

    /// Explain why a guarded statement touched no row.
    fn rejection(&self, number: i64, action: GuardedAction) -> ParcelError {
        let status = self
            .conn
            .query_row(
                "SELECT status FROM parcel WHERE number = ?1",
                params![number],
                |row| row.get::<_, ParcelStatus>(0),
            )
            .optional();

        match status {
            Ok(None) => ParcelError::not_found(number),
            // Another writer moved the parcel back to registered between the
            // two statements; nothing was written.
            Ok(Some(ParcelStatus::Registered)) => ParcelError::Storage {
                message: format!("parcel {number} changed during {action}"),
                source: None,
            },
            Ok(Some(status)) => {
                tracing::debug!(number, status = %status, action = %action, "Guard rejected mutation");
                ParcelError::guard(number, action, status)
            }
            Err(e) => ParcelError::storage_with_source("failed to read parcel status", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCategory;
    use pretty_assertions::assert_eq;

    fn setup_test_db() -> Connection {
        let conn = Connection::open_in_memory().expect("open");
        conn.execute_batch(include_str!("../PARCEL_SCHEMA.sql"))
            .expect("schema");
        conn
    }

    fn sample_parcel() -> Parcel {
        Parcel {
            number: 0,
            client: 1,
            address: "123 Main St".to_string(),
            status: ParcelStatus::Registered,
            created_at: "2023-07-28T12:34:56Z".to_string(),
        }
    }

    #[test]
    fn test_walkthrough() {
        let conn = setup_test_db();
        let store = ParcelStore::new(&conn);

        let id = store.add(&sample_parcel()).expect("add");
        assert_eq!(id, 1);

        store.set_address(id, "456 Elm St").expect("address");
        assert_eq!(store.get(id).expect("get").address, "456 Elm St");

        store.set_status(id, ParcelStatus::Sent).expect("status");

        let err = store.set_address(id, "789 Oak St").expect_err("guarded");
        assert_eq!(err.category(), ErrorCategory::GuardViolation);

        let err = store.delete(id).expect_err("guarded");
        assert!(matches!(
            err,
            ParcelError::Guard {
                number: 1,
                action: GuardedAction::Delete,
                status: ParcelStatus::Sent,
            }
        ));

        let stored = store.get(id).expect("still there");
        assert_eq!(stored.address, "456 Elm St");
        assert_eq!(stored.status, ParcelStatus::Sent);
    }

    #[test]
    fn test_missing_parcel() {
        let conn = setup_test_db();
        let store = ParcelStore::new(&conn);

        assert!(matches!(
            store.get(99),
            Err(ParcelError::NotFound { number: 99 })
        ));
        assert!(matches!(
            store.set_status(99, ParcelStatus::Delivered),
            Err(ParcelError::NotFound { number: 99 })
        ));
        assert!(matches!(
            store.set_address(99, "x"),
            Err(ParcelError::NotFound { number: 99 })
        ));
        assert!(matches!(
            store.delete(99),
            Err(ParcelError::NotFound { number: 99 })
        ));
        assert_eq!(store.count().expect("count"), 0);
    }

    #[test]
    fn test_unknown_status_in_row_is_storage_error() {
        let conn = setup_test_db();
        conn.execute(
            "INSERT INTO parcel (client, address, status, created_at) VALUES (5, 'a', 'lost', 'now')",
            [],
        )
        .expect("raw insert");
        let store = ParcelStore::new(&conn);

        let err = store.get(1).expect_err("bad status");
        assert_eq!(err.category(), ErrorCategory::StorageError);
        let err = store.get_by_client(5).expect_err("bad status");
        assert_eq!(err.category(), ErrorCategory::StorageError);
        // The guarded statement itself refuses; the diagnostic read fails to decode.
        let err = store.delete(1).expect_err("bad status");
        assert_eq!(err.category(), ErrorCategory::StorageError);
    }

    #[test]
    fn test_status_stored_as_text() {
        let conn = setup_test_db();
        let store = ParcelStore::new(&conn);
        let id = store.add(&sample_parcel()).expect("add");
        store.set_status(id, ParcelStatus::Delivered).expect("status");

        let raw: String = conn
            .query_row("SELECT status FROM parcel WHERE number = ?1", [id], |row| {
                row.get(0)
            })
            .expect("raw read");
        assert_eq!(raw, "delivered");
    }
}
