//! An in-memory [`Driver`] used by this crate's own test suite and available to downstream
//! integration tests that want to exercise the pool/transaction layers without a live backend.
//!
//! Unlike a wire-level mock (faking bytes on a socket, as `sqlx-core`'s historical `mock.rs`
//! does), this fakes the driver boundary directly: canned responses are registered per query
//! text and handed back verbatim.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::driver::Driver;
use crate::error::{StorageError, StorageResult};
use crate::params::ParameterValue;
use crate::result::RawResultSet;
use crate::types::{StorageType, TransactionMode};

/// State shared by every session opened from one [`MockDriver`], so assertions in a test can
/// observe calls made through connections handed out by a pool.
#[derive(Debug, Default)]
struct Shared {
    responses: HashMap<String, RawResultSet>,
    opened_sessions: u32,
    ping_failures_remaining: u32,
    execute_log: Vec<String>,
    prepare_log: Vec<String>,
}

/// A fake backend: configure canned query responses, then hand it to a [`crate::pool::ConnectionPool`]
/// or [`crate::server::StorageServer`] in place of a real driver.
#[derive(Debug, Clone)]
pub struct MockDriver {
    ty: StorageType,
    shared: Arc<Mutex<Shared>>,
}

impl MockDriver {
    pub fn new(ty: StorageType) -> Self {
        Self { ty, shared: Arc::new(Mutex::new(Shared::default())) }
    }

    /// Registers the result returned the next time `query` is executed (by prepared name or
    /// ad-hoc text, whichever the caller ends up using).
    pub fn when(&self, query: &str, result: RawResultSet) {
        self.shared.lock().unwrap().responses.insert(query.to_string(), result);
    }

    /// Makes the next `ping_count` pings fail with a connection error, to exercise the pool's
    /// standby-demotion and cleanup behaviour.
    pub fn fail_next_pings(&self, ping_count: u32) {
        self.shared.lock().unwrap().ping_failures_remaining = ping_count;
    }

    pub fn opened_session_count(&self) -> u32 {
        self.shared.lock().unwrap().opened_sessions
    }

    /// Queries executed so far, in call order, keyed by prepared name or ad-hoc text.
    pub fn execute_log(&self) -> Vec<String> {
        self.shared.lock().unwrap().execute_log.clone()
    }

    /// Prepared-statement names registered with the driver so far, in call order. A query
    /// executed twice through the same connection's cache shows up here only once.
    pub fn prepare_log(&self) -> Vec<String> {
        self.shared.lock().unwrap().prepare_log.clone()
    }
}

/// A live (fake) session: a statement table local to this connection plus a shared handle
/// back to the driver's canned responses.
#[derive(Debug, Default)]
pub struct MockSession {
    statements: HashMap<String, String>,
    in_transaction: bool,
    savepoints: Vec<String>,
}

impl Driver for MockDriver {
    type Session = MockSession;

    fn open(&self, _connection_string: &str, _timeout: Duration) -> StorageResult<Self::Session> {
        self.shared.lock().unwrap().opened_sessions += 1;
        Ok(MockSession::default())
    }

    fn close(&self, _session: &mut Self::Session) -> StorageResult<()> {
        Ok(())
    }

    fn ping(&self, _session: &mut Self::Session) -> StorageResult<()> {
        let mut shared = self.shared.lock().unwrap();
        if shared.ping_failures_remaining > 0 {
            shared.ping_failures_remaining -= 1;
            return Err(StorageError::connection(self.ty, "mock ping failure"));
        }
        Ok(())
    }

    fn prepare(&self, session: &mut Self::Session, name: &str, query: &str) -> StorageResult<()> {
        session.statements.insert(name.to_string(), query.to_string());
        self.shared.lock().unwrap().prepare_log.push(name.to_string());
        Ok(())
    }

    fn execute_prepared(
        &self,
        session: &mut Self::Session,
        name: &str,
        params: &[ParameterValue<'_>],
    ) -> StorageResult<RawResultSet> {
        let query = session.statements.get(name).cloned().ok_or_else(|| {
            StorageError::execution(self.ty, format!("no statement prepared under name {}", name))
        })?;
        self.run(&query, params)
    }

    fn execute_ad_hoc(
        &self,
        _session: &mut Self::Session,
        text: &str,
        params: &[ParameterValue<'_>],
    ) -> StorageResult<RawResultSet> {
        self.run(text, params)
    }

    fn begin(&self, session: &mut Self::Session, _mode: TransactionMode) -> StorageResult<()> {
        session.in_transaction = true;
        Ok(())
    }

    fn commit(&self, session: &mut Self::Session) -> StorageResult<()> {
        session.in_transaction = false;
        session.savepoints.clear();
        Ok(())
    }

    fn rollback(&self, session: &mut Self::Session) -> StorageResult<()> {
        session.in_transaction = false;
        session.savepoints.clear();
        Ok(())
    }

    fn begin_savepoint(&self, session: &mut Self::Session, name: &str) -> StorageResult<()> {
        session.savepoints.push(name.to_string());
        Ok(())
    }

    fn commit_savepoint(&self, session: &mut Self::Session, name: &str) -> StorageResult<()> {
        session.savepoints.retain(|s| s != name);
        Ok(())
    }

    fn rollback_savepoint(&self, session: &mut Self::Session, name: &str) -> StorageResult<()> {
        session.savepoints.retain(|s| s != name);
        Ok(())
    }
}

impl MockDriver {
    fn run(&self, key: &str, _params: &[ParameterValue<'_>]) -> StorageResult<RawResultSet> {
        let mut shared = self.shared.lock().unwrap();
        shared.execute_log.push(key.to_string());
        Ok(shared.responses.get(key).cloned().unwrap_or_else(RawResultSet::empty))
    }
}
