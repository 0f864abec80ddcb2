//! libSQL backend: async `ObjectStore` implementation.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::ObjectStore;

/// libSQL object store.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlObjectStore {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlObjectStore {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let store = Self::from_database(db)?;
        store.init_schema().await?;
        info!(path = %path.display(), "Event store opened");
        Ok(store)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let store = Self::from_database(db)?;
        store.init_schema().await?;
        Ok(store)
    }

    /// Open `path`, treating `:memory:` as an ephemeral store.
    pub async fn open(path: &Path) -> Result<Self, DatabaseError> {
        if path.as_os_str() == ":memory:" {
            Self::new_memory().await
        } else {
            Self::new_local(path).await
        }
    }

    fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    async fn init_schema(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(&self.conn).await
    }
}

/// Category is the first key segment.
fn category_of(key: &str) -> &str {
    key.split_once('/').map(|(c, _)| c).unwrap_or("")
}

#[async_trait]
impl ObjectStore for LibSqlObjectStore {
    async fn put(&self, key: &str, body: &[u8]) -> Result<(), DatabaseError> {
        self.conn
            .execute(
                "INSERT INTO objects (key, category, body) VALUES (?1, ?2, ?3)",
                params![key, category_of(key), body.to_vec()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("Failed to write object {key}: {e}")))?;
        debug!(key = %key, bytes = body.len(), "Object stored");
        Ok(())
    }

    async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<Vec<u8>>, DatabaseError> {
        // substr comparison instead of LIKE: category names contain '_'.
        let mut rows = self
            .conn
            .query(
                "SELECT body FROM objects WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key",
                params![prefix],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("Failed to list {prefix}: {e}")))?;

        let mut bodies = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("Failed to read row: {e}")))?
        {
            let body: Vec<u8> = row
                .get(0)
                .map_err(|e| DatabaseError::Serialization(format!("Bad object body: {e}")))?;
            bodies.push(body);
        }
        Ok(bodies)
    }
}
