//! The transaction façade: `execute`/`execute_non_prepared` plus `commit`/`rollback`, holding a
//! leased connection for the duration of the transaction's life.

use crate::driver::Driver;
use crate::error::{StorageError, StorageResult};
use crate::logging::log_execution;
use crate::params::ParameterValue;
use crate::pool::PooledConnection;
use crate::result::ExecutionResult;
use crate::types::{StorageType, TransactionMode};

/// Tracks whether the transaction is still open, so `commit`/`rollback`/`execute` after the
/// fact fail loudly instead of silently no-op-ing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Open,
    Committed,
    RolledBack,
}

/// A single logical transaction against a leased connection.
///
/// `NonTransaction` mode skips `BEGIN`/`COMMIT` entirely (every statement auto-commits), mapping
/// the original's `NonTransaction` variant onto "no driver-level transaction at all" rather than
/// a transaction that immediately commits itself.
pub struct Transaction<D: Driver> {
    ty: StorageType,
    mode: TransactionMode,
    connection: PooledConnection<D>,
    driver: std::sync::Arc<D>,
    state: State,
    savepoints: Vec<String>,
}

impl<D: Driver> Transaction<D> {
    pub(crate) fn begin(
        ty: StorageType,
        mode: TransactionMode,
        connection: PooledConnection<D>,
        driver: std::sync::Arc<D>,
    ) -> StorageResult<Self> {
        if !mode.contains(TransactionMode::NON_TRANSACTION) {
            connection.with_connection_mut(|conn| {
                let session = conn.session_mut()?;
                driver.begin(session, mode)
            })?;
        }

        Ok(Self { ty, mode, connection, driver, state: State::Open, savepoints: Vec::new() })
    }

    pub fn storage_type(&self) -> StorageType {
        self.ty
    }

    pub fn mode(&self) -> TransactionMode {
        self.mode
    }

    /// Executes `query` (with no parameters) through the prepared-statement path.
    pub fn execute(&mut self, query: &str) -> StorageResult<ExecutionResult> {
        self.execute_with_params(query, &[])
    }

    /// Executes `query` through the prepared-statement path, binding `params` in order.
    pub fn execute_with_params(
        &mut self,
        query: &str,
        params: &[ParameterValue<'_>],
    ) -> StorageResult<ExecutionResult> {
        self.require_open()?;
        let ty = self.ty;
        let driver = self.driver.clone();
        let raw = log_execution!(query, self.connection.with_connection_mut(|conn| {
            let key = conn.prepare_statement(driver.as_ref(), query)?;
            let session = conn.session_mut()?;
            driver.execute_prepared(session, &key, params)
        }))?;
        Ok(ExecutionResult::new(ty, raw))
    }

    /// Executes `query` verbatim, bypassing the prepared-statement cache.
    pub fn execute_non_prepared(&mut self, query: &str) -> StorageResult<ExecutionResult> {
        self.execute_non_prepared_with_params(query, &[])
    }

    pub fn execute_non_prepared_with_params(
        &mut self,
        query: &str,
        params: &[ParameterValue<'_>],
    ) -> StorageResult<ExecutionResult> {
        self.require_open()?;
        let ty = self.ty;
        let driver = self.driver.clone();
        let raw = log_execution!(query, self.connection.with_connection_mut(|conn| {
            let session = conn.session_mut()?;
            driver.execute_ad_hoc(session, query, params)
        }))?;
        Ok(ExecutionResult::new(ty, raw))
    }

    /// Opens a named savepoint inside this (necessarily writable) transaction.
    ///
    /// Recovered from the original `nvserv` sub-transaction support.
    pub fn begin_sub(&mut self, name: impl Into<String>) -> StorageResult<()> {
        self.require_open()?;
        if !self.mode.contains(TransactionMode::READ_WRITE) {
            return Err(StorageError::unsupported_feature(
                self.ty,
                "savepoints require a read-write transaction",
            ));
        }
        let name = name.into();
        let driver = self.driver.clone();
        self.connection.with_connection_mut(|conn| {
            let session = conn.session_mut()?;
            driver.begin_savepoint(session, &name)
        })?;
        self.savepoints.push(name);
        Ok(())
    }

    pub fn commit_sub(&mut self, name: &str) -> StorageResult<()> {
        self.require_open()?;
        let driver = self.driver.clone();
        self.connection.with_connection_mut(|conn| {
            let session = conn.session_mut()?;
            driver.commit_savepoint(session, name)
        })?;
        self.savepoints.retain(|s| s != name);
        Ok(())
    }

    pub fn rollback_sub(&mut self, name: &str) -> StorageResult<()> {
        self.require_open()?;
        let driver = self.driver.clone();
        self.connection.with_connection_mut(|conn| {
            let session = conn.session_mut()?;
            driver.rollback_savepoint(session, name)
        })?;
        self.savepoints.retain(|s| s != name);
        Ok(())
    }

    pub fn commit(mut self) -> StorageResult<()> {
        self.require_open()?;
        if !self.mode.contains(TransactionMode::NON_TRANSACTION) {
            let driver = self.driver.clone();
            self.connection.with_connection_mut(|conn| {
                let session = conn.session_mut()?;
                driver.commit(session)
            })?;
        }
        self.state = State::Committed;
        Ok(())
    }

    pub fn rollback(mut self) -> StorageResult<()> {
        self.require_open()?;
        if !self.mode.contains(TransactionMode::NON_TRANSACTION) {
            let driver = self.driver.clone();
            self.connection.with_connection_mut(|conn| {
                let session = conn.session_mut()?;
                driver.rollback(session)
            })?;
        }
        self.state = State::RolledBack;
        Ok(())
    }

    fn require_open(&self) -> StorageResult<()> {
        match self.state {
            State::Open => Ok(()),
            State::Committed => {
                Err(StorageError::transaction(self.ty, "transaction already committed"))
            }
            State::RolledBack => {
                Err(StorageError::transaction(self.ty, "transaction already rolled back"))
            }
        }
    }
}

impl<D: Driver> Drop for Transaction<D> {
    /// An open transaction that is simply dropped (panic unwind, early return with `?`) is
    /// rolled back — callers must explicitly `commit()` to keep their writes.
    fn drop(&mut self) {
        if self.state == State::Open && !self.mode.contains(TransactionMode::NON_TRANSACTION) {
            let _ = self.connection.with_connection_mut(|conn| {
                if let Ok(session) = conn.session_mut() {
                    let _ = self.driver.rollback(session);
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClusterEndpointList, ConnectionPoolConfig, StorageConfig};
    use crate::connection::Connection;
    use crate::driver::mock::MockDriver;
    use crate::pool::ConnectionPool;
    use crate::result::{RawResultSet, RawRow, RawValue};
    use crate::types::{ConnectionMode, ConnectionStandbyMode};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    fn make_pool(driver: Arc<MockDriver>) -> ConnectionPool<MockDriver> {
        let config = StorageConfig::new(
            "test",
            StorageType::Postgres,
            TransactionMode::READ_WRITE | TransactionMode::NON_TRANSACTION,
            ConnectionMode::Server,
            ConnectionPoolConfig::builder().min_connections(1).max_connections(1).build(),
            ClusterEndpointList::new(StorageType::Postgres),
        );
        let mut pool = ConnectionPool::new("test", config, Arc::clone(&driver));
        let counter = Arc::new(AtomicU64::new(1));
        pool.set_primary_factory(Box::new(move |name, _config| {
            let key = counter.fetch_add(1, Ordering::SeqCst);
            Ok(Connection::new(name, StorageType::Postgres, ConnectionStandbyMode::Primary, "mock://", key))
        }));
        pool.run().unwrap();
        pool
    }

    #[test]
    fn commit_invokes_driver_commit_for_writable_transactions() {
        let driver = Arc::new(MockDriver::new(StorageType::Postgres));
        let pool = make_pool(Arc::clone(&driver));
        let leased = pool.acquire().unwrap();

        let mut tx = Transaction::begin(StorageType::Postgres, TransactionMode::READ_WRITE, leased, Arc::clone(&driver)).unwrap();
        driver.when("SELECT 1", RawResultSet::from_rows(vec![RawRow::new(vec!["x".into()], vec![RawValue::Int(1)])]));
        let result = tx.execute("SELECT 1").unwrap();
        assert_eq!(result.rows_affected(), 1);
        tx.commit().unwrap();
    }

    #[test]
    fn non_transaction_mode_skips_begin_and_commit() {
        let driver = Arc::new(MockDriver::new(StorageType::Postgres));
        let pool = make_pool(Arc::clone(&driver));
        let leased = pool.acquire().unwrap();

        let tx = Transaction::begin(StorageType::Postgres, TransactionMode::NON_TRANSACTION, leased, Arc::clone(&driver)).unwrap();
        tx.commit().unwrap();
    }

    #[test]
    fn repeated_execute_reuses_the_same_prepared_statement() {
        let driver = Arc::new(MockDriver::new(StorageType::Postgres));
        let pool = make_pool(Arc::clone(&driver));
        let leased = pool.acquire().unwrap();

        let mut tx = Transaction::begin(StorageType::Postgres, TransactionMode::READ_WRITE, leased, Arc::clone(&driver)).unwrap();
        tx.execute("SELECT 1").unwrap();
        tx.execute("SELECT 1").unwrap();
        tx.commit().unwrap();

        assert_eq!(driver.prepare_log().len(), 1, "same query text must only be prepared once");
        assert_eq!(driver.execute_log(), vec!["SELECT 1".to_string(), "SELECT 1".to_string()]);
    }

    #[test]
    fn dropping_an_open_transaction_rolls_back() {
        let driver = Arc::new(MockDriver::new(StorageType::Postgres));
        let pool = make_pool(Arc::clone(&driver));
        let leased = pool.acquire().unwrap();

        {
            let mut tx = Transaction::begin(StorageType::Postgres, TransactionMode::READ_WRITE, leased, Arc::clone(&driver)).unwrap();
            tx.execute("SELECT 1").unwrap();
        }
    }
}
