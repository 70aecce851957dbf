//! Parcel record and status values

use chrono::{SecondsFormat, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Delivery status of a parcel
///
/// Transitions between statuses are not enforced. Only `Registered` parcels
/// accept address changes and deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParcelStatus {
    /// Accepted but not yet handed to a carrier
    Registered,
    /// In transit
    Sent,
    /// Handed to the recipient
    Delivered,
}

impl ParcelStatus {
    pub const ALL: [ParcelStatus; 3] = [Self::Registered, Self::Sent, Self::Delivered];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
        }
    }

    /// Parse from the persisted string representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "registered" => Some(Self::Registered),
            "sent" => Some(Self::Sent),
            "delivered" => Some(Self::Delivered),
            _ => None,
        }
    }
}

impl fmt::Display for ParcelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status string outside the known set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown parcel status {0:?} (expected registered, sent or delivered)")]
pub struct InvalidStatus(pub String);

impl FromStr for ParcelStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| InvalidStatus(s.to_string()))
    }
}

impl ToSql for ParcelStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ParcelStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        s.parse().map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// A row from the parcel table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parcel {
    /// Primary key; `0` until the store assigns one
    pub number: i64,
    pub client: i64,
    pub address: String,
    pub status: ParcelStatus,
    /// ISO-8601 creation timestamp, stored verbatim
    pub created_at: String,
}

impl Parcel {
    /// A fresh `registered` parcel stamped with the current UTC time.
    pub fn registered(client: i64, address: impl Into<String>) -> Self {
        Self {
            number: 0,
            client,
            address: address.into(),
            status: ParcelStatus::Registered,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    /// Whether address changes and deletion are currently allowed.
    pub fn is_mutable(&self) -> bool {
        self.status == ParcelStatus::Registered
    }
}
