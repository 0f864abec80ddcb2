//! `ObjectStore` trait: the append-only persistence collaborator.

use async_trait::async_trait;

use crate::error::DatabaseError;

/// Minimal key/blob store backing the event log.
///
/// Keys are slash-separated (`<category>/<name>`). Objects are never
/// updated or deleted once written.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `body` under `key`.
    async fn put(&self, key: &str, body: &[u8]) -> Result<(), DatabaseError>;

    /// Return the bodies of every object whose key starts with `prefix`,
    /// ordered by key.
    async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<Vec<u8>>, DatabaseError>;
}
