//! SQLite-backed store for parcel shipment records
//!
//! Tracks parcels through the `registered` → `sent` → `delivered` lifecycle.
//! Address changes and deletion are only allowed while a parcel is still
//! `registered`; status updates are unconditional.
//!
//! ```rust,no_run
//! # fn example() -> parcel_store::Result<()> {
//! use parcel_store::{Parcel, ParcelConfig, ParcelDb, ParcelStatus};
//!
//! let db = ParcelDb::open(&ParcelConfig::load()?)?;
//! let store = db.store();
//! let id = store.add(&Parcel::registered(1, "123 Main St"))?;
//! store.set_status(id, ParcelStatus::Sent)?;
//! db.close()?;
//! # Ok(())
//! # }
//! ```

#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod config;
pub mod db;
pub mod errors;
pub mod parcel;
pub mod store;

pub use config::ParcelConfig;
pub use db::ParcelDb;
pub use errors::{ErrorCategory, GuardedAction, ParcelError, Result};
pub use parcel::{InvalidStatus, Parcel, ParcelStatus};
pub use store::ParcelStore;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
