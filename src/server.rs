//! The top-level façade: wires a [`StorageConfig`] and a [`Driver`] to a running
//! [`ConnectionPool`] and hands out [`Transaction`]s.

use std::sync::Arc;
use std::time::Duration;

use crate::config::StorageConfig;
use crate::driver::Driver;
use crate::error::{StorageError, StorageResult};
use crate::pool::{ConnectionPool, PrimaryConnectionFactory, StandbyConnectionFactory};
use crate::transaction::Transaction;
use crate::types::{StorageType, TransactionMode};

/// A point-in-time snapshot of server identity, version and capability — the Rust counterpart
/// of the original's `StorageInfo`.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
    pub info: String,
    pub ty: StorageType,
    pub transaction_supported: bool,
}

/// Owns a [`ConnectionPool`] and the driver it was built against; the entry point most callers
/// reach for first.
pub struct StorageServer<D: Driver> {
    name: String,
    config: StorageConfig,
    driver: Arc<D>,
    pool: ConnectionPool<D>,
    connected: bool,
}

impl<D: Driver> StorageServer<D> {
    pub fn new(config: StorageConfig, driver: Arc<D>) -> Self {
        let name = config.name.clone();
        let pool = ConnectionPool::new(name.clone(), config.clone(), Arc::clone(&driver));
        Self { name, config, driver, pool, connected: false }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn configs(&self) -> &StorageConfig {
        &self.config
    }

    pub fn pool(&self) -> &ConnectionPool<D> {
        &self.pool
    }

    pub fn set_primary_factory(&mut self, factory: PrimaryConnectionFactory<D>) {
        self.pool.set_primary_factory(factory);
    }

    pub fn set_standby_factory(&mut self, factory: StandbyConnectionFactory<D>) {
        self.pool.set_standby_factory(factory);
    }

    /// Starts the underlying pool (primary connections + ping/cleanup services).
    pub fn try_connect(&mut self) -> bool {
        match self.pool.run() {
            Ok(()) => {
                self.connected = true;
                true
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to start connection pool");
                false
            }
        }
    }

    /// Stops the pool. `deadline` is accepted for interface parity with the original's
    /// graceful-shutdown signature; this crate's pool drains synchronously and immediately, so
    /// it is currently unused.
    pub fn shutdown(&mut self, _graceful: bool, _deadline: Duration) -> bool {
        if !self.connected {
            return false;
        }
        self.pool.stop();
        self.connected = false;
        true
    }

    /// Opens a transaction in `mode`, leasing a connection from the pool.
    ///
    /// `ReadCommitted` has no standalone driver-level counterpart in this crate's transaction
    /// model and is downgraded to `ReadOnly`.
    pub fn begin(&self, mode: TransactionMode) -> StorageResult<Transaction<D>> {
        if !self.connected {
            return Err(StorageError::connection(self.config.ty, "server is not connected"));
        }
        if !self.config.supports_mode(mode) {
            return Err(StorageError::unsupported_feature(
                self.config.ty,
                format!("backend does not support transaction mode {:?}", mode),
            ));
        }

        let effective_mode = if mode.contains(TransactionMode::READ_COMMITTED) {
            tracing::debug!(requested = ?mode, "degrading ReadCommitted to ReadOnly");
            TransactionMode::READ_ONLY
        } else {
            mode
        };

        let connection = self.pool.acquire().ok_or_else(|| {
            StorageError::connection(self.config.ty, "timed out waiting for a free connection")
        })?;

        Transaction::begin(self.config.ty, effective_mode, connection, Arc::clone(&self.driver))
    }

    pub fn info(&self) -> ServerInfo {
        ServerInfo {
            name: self.name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            info: format!("{} pool: {}/{} connections in use", self.name, self.pool.acquired_count(), self.pool.total_count()),
            ty: self.config.ty,
            transaction_supported: !self.config.transaction_mode_supported.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClusterEndpointList, ConnectionPoolConfig};
    use crate::connection::Connection;
    use crate::driver::mock::MockDriver;
    use crate::types::{ConnectionMode, ConnectionStandbyMode};
    use std::sync::atomic::{AtomicU64, Ordering};

    fn make_server() -> StorageServer<MockDriver> {
        let driver = Arc::new(MockDriver::new(StorageType::Postgres));
        let config = StorageConfig::new(
            "test",
            StorageType::Postgres,
            TransactionMode::READ_WRITE | TransactionMode::READ_ONLY,
            ConnectionMode::Server,
            ConnectionPoolConfig::builder().min_connections(1).max_connections(1).build(),
            ClusterEndpointList::new(StorageType::Postgres),
        );
        let mut server = StorageServer::new(config, Arc::clone(&driver));
        let counter = Arc::new(AtomicU64::new(1));
        server.set_primary_factory(Box::new(move |name, _config| {
            let key = counter.fetch_add(1, Ordering::SeqCst);
            Ok(Connection::new(name, StorageType::Postgres, ConnectionStandbyMode::Primary, "mock://", key))
        }));
        server
    }

    #[test]
    fn begin_fails_before_try_connect() {
        let server = make_server();
        assert!(server.begin(TransactionMode::READ_WRITE).is_err());
    }

    #[test]
    fn begin_rejects_an_unsupported_mode() {
        let mut server = make_server();
        assert!(server.try_connect());
        let err = server.begin(TransactionMode::NON_TRANSACTION).unwrap_err();
        assert_eq!(err.storage_type(), StorageType::Postgres);
    }

    #[test]
    fn begin_degrades_read_committed_to_read_only() {
        let driver = Arc::new(MockDriver::new(StorageType::Postgres));
        let config = StorageConfig::new(
            "test",
            StorageType::Postgres,
            TransactionMode::READ_COMMITTED | TransactionMode::READ_ONLY,
            ConnectionMode::Server,
            ConnectionPoolConfig::builder().min_connections(1).max_connections(1).build(),
            ClusterEndpointList::new(StorageType::Postgres),
        );
        let mut server = StorageServer::new(config, Arc::clone(&driver));
        let counter = Arc::new(AtomicU64::new(1));
        server.set_primary_factory(Box::new(move |name, _config| {
            let key = counter.fetch_add(1, Ordering::SeqCst);
            Ok(Connection::new(name, StorageType::Postgres, ConnectionStandbyMode::Primary, "mock://", key))
        }));
        assert!(server.try_connect());

        let tx = server.begin(TransactionMode::READ_COMMITTED).unwrap();
        assert_eq!(tx.mode(), TransactionMode::READ_ONLY);
        tx.commit().unwrap();
    }

    #[test]
    fn full_lifecycle_connect_begin_commit_shutdown() {
        let mut server = make_server();
        assert!(server.try_connect());

        let tx = server.begin(TransactionMode::READ_WRITE).unwrap();
        tx.commit().unwrap();

        let info = server.info();
        assert_eq!(info.name, "test");

        assert!(server.shutdown(true, Duration::ZERO));
        assert!(!server.shutdown(true, Duration::ZERO));
    }
}
