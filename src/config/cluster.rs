use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};
use crate::types::StorageType;

/// A single physical node address. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterEndpoint {
    pub ty: StorageType,
    pub dbname: String,
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
}

impl ClusterEndpoint {
    pub fn new(
        ty: StorageType,
        dbname: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        host: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            ty,
            dbname: dbname.into(),
            user: user.into(),
            password: password.into(),
            host: host.into(),
            port,
        }
    }
}

/// A list of [`ClusterEndpoint`]s tagged with the [`StorageType`] they all belong to.
///
/// Insertion rejects endpoints that don't agree with the list's tag, mirroring the original
/// `ClusterConfigList` guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterEndpointList {
    ty: StorageType,
    endpoints: Vec<ClusterEndpoint>,
}

impl ClusterEndpointList {
    pub fn new(ty: StorageType) -> Self {
        Self { ty, endpoints: Vec::new() }
    }

    pub fn storage_type(&self) -> StorageType {
        self.ty
    }

    pub fn push(&mut self, endpoint: ClusterEndpoint) -> StorageResult<()> {
        if endpoint.ty != self.ty {
            return Err(StorageError::invalid_argument(
                self.ty,
                format!(
                    "cluster endpoint list is set to only accept StorageType::{}, got {}",
                    self.ty, endpoint.ty
                ),
            ));
        }
        self.endpoints.push(endpoint);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClusterEndpoint> {
        self.endpoints.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }
}
