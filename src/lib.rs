#![forbid(unsafe_code)]

//! Connection pooling, per-connection prepared-statement caching and a blocking transaction
//! façade over pluggable SQL backends.
//!
//! A concrete backend is anything implementing [`driver::Driver`]; this crate owns the pool,
//! the cache, the transaction state machine and the background maintenance loop, and stays
//! agnostic to the wire protocol.

pub mod cache;
pub mod config;
pub mod connection;
pub mod driver;
pub mod error;
pub mod executor;
mod logging;
pub mod mapper;
pub mod params;
pub mod pool;
pub mod result;
pub mod server;
pub mod transaction;
pub mod types;

pub use cache::{PreparedStatementCache, PreparedStatementItem};
pub use config::{ClusterEndpoint, ClusterEndpointList, ConnectionPoolConfig, StorageConfig};
pub use connection::Connection;
pub use driver::Driver;
pub use error::{StorageError, StorageResult};
pub use executor::{EventLoopExecutor, TaskKind};
pub use mapper::{FromNamedRow, FromRow};
pub use params::{ParameterArgs, ParameterType, ParameterValue};
pub use pool::{ConnectionPool, PooledConnection};
pub use result::{ExecutionResult, FromRawValue, RawResultSet, RawRow, RawValue, RowResult};
pub use server::{ServerInfo, StorageServer};
pub use transaction::Transaction;
pub use types::{ConnectionMode, ConnectionStandbyMode, StorageType, TransactionMode};
