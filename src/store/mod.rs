//! Persistence layer: append-only object store backed by libSQL.

pub mod libsql_backend;
mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlObjectStore;
pub use traits::ObjectStore;
