//! The backend collaborator this library delegates wire-level work to.
//!
//! A concrete database driver (Postgres, MySQL, ...) implements [`Driver`]; this crate itself
//! ships none beyond [`crate::driver::mock`], an in-memory stand-in used by the test suite and
//! as a reference for implementors.

use std::time::Duration;

use crate::error::StorageResult;
use crate::params::ParameterValue;
use crate::result::RawResultSet;
use crate::types::TransactionMode;

pub mod mock;

/// Everything the pool, connection and transaction layers need from a concrete backend.
///
/// `Session` is the driver's live connection handle (e.g. a TCP socket wrapper); this crate
/// treats it as opaque and never inspects it directly.
pub trait Driver: Send + Sync + 'static {
    type Session: Send;

    /// Opens a new session, honouring `timeout` as the connect deadline.
    fn open(&self, connection_string: &str, timeout: Duration) -> StorageResult<Self::Session>;

    /// Closes the session. Must be safe to call on an already-closed session.
    fn close(&self, session: &mut Self::Session) -> StorageResult<()>;

    /// A cheap keep-alive probe.
    fn ping(&self, session: &mut Self::Session) -> StorageResult<()>;

    /// Installs a server-side prepared statement under `name`. The cache above this trait
    /// guarantees this is called at most once per `(session, canonical query)`.
    fn prepare(&self, session: &mut Self::Session, name: &str, query: &str) -> StorageResult<()>;

    fn execute_prepared(
        &self,
        session: &mut Self::Session,
        name: &str,
        params: &[ParameterValue<'_>],
    ) -> StorageResult<RawResultSet>;

    fn execute_ad_hoc(
        &self,
        session: &mut Self::Session,
        text: &str,
        params: &[ParameterValue<'_>],
    ) -> StorageResult<RawResultSet>;

    fn begin(&self, session: &mut Self::Session, mode: TransactionMode) -> StorageResult<()>;

    fn commit(&self, session: &mut Self::Session) -> StorageResult<()>;

    fn rollback(&self, session: &mut Self::Session) -> StorageResult<()>;

    /// Opens a named savepoint inside the current writable transaction.
    fn begin_savepoint(&self, session: &mut Self::Session, name: &str) -> StorageResult<()>;

    fn commit_savepoint(&self, session: &mut Self::Session, name: &str) -> StorageResult<()>;

    fn rollback_savepoint(&self, session: &mut Self::Session, name: &str) -> StorageResult<()>;
}
