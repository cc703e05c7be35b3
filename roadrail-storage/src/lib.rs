//! DuckDB storage layer for road/rail synchronization.
//!
//! Holds the persisted target graph written by the converters and the
//! published dynamic schema.
//!
//! # Architecture
//!
//! - Target entities are stored as JSON blobs with the lookup columns
//!   (container, class, code, cross-reference) extracted alongside
//! - Target ids come from a DuckDB sequence and are never reused
//! - Published schemas are stored one row per schema name
//! - Both stores can share one connection via `open_with_conn`

mod error;
mod schema_repository;
mod target_store;

pub use error::{StorageError, StorageResult};
pub use schema_repository::{DuckSchemaRepository, SchemaRepository};
pub use target_store::{DuckTargetStore, TargetStore};

use duckdb::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

/// Shared DuckDB connection handle.
pub type SharedConnection = Arc<Mutex<Connection>>;

/// Opens a file-backed database. When the open fails and a `<path>.wal`
/// journal sits next to the file, the journal is discarded and the open is
/// retried once; targets not yet checkpointed are lost and get re-created
/// or adopted by the next synchronization run.
pub(crate) fn open_file(path: &Path) -> StorageResult<Connection> {
    let err = match Connection::open(path) {
        Ok(conn) => return Ok(conn),
        Err(e) => e,
    };
    let mut journal = path.as_os_str().to_owned();
    journal.push(".wal");
    let journal = PathBuf::from(journal);
    if !journal.is_file() {
        return Err(err.into());
    }

    warn!(path = %path.display(), error = %err, "open failed, discarding leftover journal");
    std::fs::remove_file(&journal)?;
    Ok(Connection::open(path)?)
}

pub(crate) fn lock(conn: &SharedConnection) -> StorageResult<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|_| StorageError::LockPoisoned)
}
