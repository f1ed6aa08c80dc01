//! Crate-wide error taxonomy.

use crate::types::StorageType;

/// A specialized `Result` type used throughout this crate.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Errors surfaced by the pool, connection, cache and transaction layers.
///
/// Every variant carries the [`StorageType`] of the backend it originated from, matching the
/// original `StorageException` hierarchy's `Type()` accessor.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("[{ty}] connection error: {message}")]
    Connection { ty: StorageType, message: String },

    #[error("[{ty}] transaction error: {message}")]
    Transaction { ty: StorageType, message: String },

    #[error("[{ty}] execution error: {message}")]
    Execution { ty: StorageType, message: String },

    #[error("[{ty}] unsupported parameter type: {message}")]
    ParameterType { ty: StorageType, message: String },

    #[error("[{ty}] internal error: {message}")]
    Internal { ty: StorageType, message: String },

    #[error("[{ty}] unsupported feature: {message}")]
    UnsupportedFeature { ty: StorageType, message: String },

    #[error("[{ty}] invalid argument: {message}")]
    InvalidArgument { ty: StorageType, message: String },

    #[error("[{ty}] allocation into the connection pool failed: {message}")]
    BadAllocation { ty: StorageType, message: String },
}

impl StorageError {
    pub fn connection(ty: StorageType, message: impl Into<String>) -> Self {
        StorageError::Connection { ty, message: message.into() }
    }

    pub fn transaction(ty: StorageType, message: impl Into<String>) -> Self {
        StorageError::Transaction { ty, message: message.into() }
    }

    pub fn execution(ty: StorageType, message: impl Into<String>) -> Self {
        StorageError::Execution { ty, message: message.into() }
    }

    pub fn parameter_type(ty: StorageType, message: impl Into<String>) -> Self {
        StorageError::ParameterType { ty, message: message.into() }
    }

    pub fn internal(ty: StorageType, message: impl Into<String>) -> Self {
        StorageError::Internal { ty, message: message.into() }
    }

    pub fn unsupported_feature(ty: StorageType, message: impl Into<String>) -> Self {
        StorageError::UnsupportedFeature { ty, message: message.into() }
    }

    pub fn invalid_argument(ty: StorageType, message: impl Into<String>) -> Self {
        StorageError::InvalidArgument { ty, message: message.into() }
    }

    pub fn bad_allocation(ty: StorageType, message: impl Into<String>) -> Self {
        StorageError::BadAllocation { ty, message: message.into() }
    }

    /// The [`StorageType`] this error originated from.
    pub fn storage_type(&self) -> StorageType {
        match self {
            StorageError::Connection { ty, .. }
            | StorageError::Transaction { ty, .. }
            | StorageError::Execution { ty, .. }
            | StorageError::ParameterType { ty, .. }
            | StorageError::Internal { ty, .. }
            | StorageError::UnsupportedFeature { ty, .. }
            | StorageError::InvalidArgument { ty, .. }
            | StorageError::BadAllocation { ty, .. } => *ty,
        }
    }
}
