//! Configuration data types.
//!
//! Everything here is plain data: [`serde::Deserialize`] is derived so a caller can load it
//! from their own config file, but no parser is shipped — parsing file formats is out of
//! scope for this crate.

mod cluster;
mod pool_config;
mod storage_config;

pub use cluster::{ClusterEndpoint, ClusterEndpointList};
pub use pool_config::{ConnectionPoolConfig, ConnectionPoolConfigBuilder};
pub use storage_config::StorageConfig;
