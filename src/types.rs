//! Enumerations shared across the pool, connection and transaction layers.

use std::fmt;

/// Identifies the backend family a [`crate::server::StorageServer`] talks to.
///
/// The pool and connection machinery is generic over this tag; it never branches on it
/// directly, it's carried through purely so errors and connection strings can report which
/// backend they belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageType {
    Postgres,
    Oracle,
    MySql,
    SqlLite,
    Redis,
    Parquet,
    /// The columnar in-house format this library was originally written for.
    NvXcel,
    Unknown,
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StorageType::Postgres => "postgres",
            StorageType::Oracle => "oracle",
            StorageType::MySql => "mysql",
            StorageType::SqlLite => "sqlite",
            StorageType::Redis => "redis",
            StorageType::Parquet => "parquet",
            StorageType::NvXcel => "nvxcel",
            StorageType::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

bitflags::bitflags! {
    /// Which transaction modes a backend declares support for, and which single mode a
    /// [`crate::transaction::Transaction`] was started in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TransactionMode: u8 {
        const READ_WRITE      = 0b0001;
        const READ_COMMITTED  = 0b0010;
        const READ_ONLY       = 0b0100;
        const NON_TRANSACTION = 0b1000;
    }
}

impl Default for TransactionMode {
    fn default() -> Self {
        TransactionMode::empty()
    }
}

impl fmt::Display for TransactionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Whether a pooled connection counts toward the configured minimum or is a cleanup-eligible
/// surplus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionStandbyMode {
    None,
    Primary,
    Standby,
}

/// How a connection's address is shaped; informational, used only to steer connection-string
/// construction in [`crate::connection::build_connection_string`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionMode {
    Server,
    ServerCluster,
    File,
    Unknown,
}
