use serde::{Deserialize, Serialize};

use crate::config::cluster::ClusterEndpointList;
use crate::config::pool_config::ConnectionPoolConfig;
use crate::types::{ConnectionMode, StorageType, TransactionMode};

/// Immutable, loadable bundle describing a logical server: which backend it talks to, its
/// cluster endpoints, pool sizing and which transaction modes it declares support for.
///
/// Derives `serde::Deserialize` so a caller can load it from their own config file (TOML,
/// JSON, ...); parsing the file itself is the caller's responsibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub name: String,
    pub ty: StorageType,
    pub transaction_mode_supported: TransactionMode,
    pub connection_mode: ConnectionMode,
    pub pool_config: ConnectionPoolConfig,
    pub cluster_endpoints: ClusterEndpointList,
    /// Informational flag carried over from the original `StorageConfigBase`; pool growth is
    /// always enabled at the minimum-connections level regardless of this bit.
    pub connection_pooling_support: bool,
    /// Informational flag; asynchronous execution is out of scope for this library and this
    /// bit is never read internally.
    pub async_execution_support: bool,
}

impl StorageConfig {
    pub fn new(
        name: impl Into<String>,
        ty: StorageType,
        transaction_mode_supported: TransactionMode,
        connection_mode: ConnectionMode,
        pool_config: ConnectionPoolConfig,
        cluster_endpoints: ClusterEndpointList,
    ) -> Self {
        Self {
            name: name.into(),
            ty,
            transaction_mode_supported,
            connection_mode,
            pool_config,
            cluster_endpoints,
            connection_pooling_support: true,
            async_execution_support: false,
        }
    }

    /// True if `mode` is among the modes this backend declares support for.
    pub fn supports_mode(&self, mode: TransactionMode) -> bool {
        self.transaction_mode_supported.contains(mode)
    }
}

impl Serialize for ConnectionMode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let s = match self {
            ConnectionMode::Server => "server",
            ConnectionMode::ServerCluster => "server_cluster",
            ConnectionMode::File => "file",
            ConnectionMode::Unknown => "unknown",
        };
        serializer.serialize_str(s)
    }
}

impl<'de> Deserialize<'de> for ConnectionMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "server" => ConnectionMode::Server,
            "server_cluster" => ConnectionMode::ServerCluster,
            "file" => ConnectionMode::File,
            _ => ConnectionMode::Unknown,
        })
    }
}

impl Serialize for TransactionMode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.bits())
    }
}

impl<'de> Deserialize<'de> for TransactionMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u8::deserialize(deserializer)?;
        Ok(TransactionMode::from_bits_truncate(bits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::cluster::ClusterEndpointList;

    #[test]
    fn supports_mode_checks_bitmask_membership() {
        let config = StorageConfig::new(
            "primary",
            StorageType::Postgres,
            TransactionMode::READ_WRITE | TransactionMode::READ_ONLY,
            ConnectionMode::ServerCluster,
            ConnectionPoolConfig::default(),
            ClusterEndpointList::new(StorageType::Postgres),
        );

        assert!(config.supports_mode(TransactionMode::READ_WRITE));
        assert!(!config.supports_mode(TransactionMode::NON_TRANSACTION));
    }
}
