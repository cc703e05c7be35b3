//! Persistent SyncInfo records: `(scope, kind, source_id) -> (target_id, fingerprint)`.
//!
//! Uses a separate SQLite file so incremental state is isolated from the
//! target store. Only the change detector writes records.

use crate::error::{SyncError, SyncResult};
use roadrail_types::{Fingerprint, Kind, ScopeId, SourceId, TargetId};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// One persisted mapping from a source entity to its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncInfoRecord {
    pub scope: ScopeId,
    pub kind: Kind,
    pub source_id: SourceId,
    pub target_id: TargetId,
    pub fingerprint: Fingerprint,
}

/// Storage for SyncInfo records and per-scope settings.
pub trait SyncInfoStore: Send + Sync {
    fn find(&self, scope: &ScopeId, kind: Kind, source_id: &SourceId) -> SyncResult<Option<SyncInfoRecord>>;
    /// Inserts or replaces the record for its `(scope, kind, source_id)` key.
    fn write(&self, record: &SyncInfoRecord) -> SyncResult<()>;
    /// All records of a scope, ordered by kind then source id.
    fn list_scope(&self, scope: &ScopeId) -> SyncResult<Vec<SyncInfoRecord>>;
    fn read_setting(&self, scope: &ScopeId, key: &str) -> SyncResult<Option<String>>;
    fn write_setting(&self, scope: &ScopeId, key: &str, value: &str) -> SyncResult<()>;
}

/// SyncInfo store backed by SQLite.
pub struct SqliteSyncInfoStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSyncInfoStore {
    /// Opens (or creates) a store at the given path.
    pub fn open(path: &Path) -> SyncResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| SyncError::SyncInfo(format!("failed to open sync info store: {e}")))?;
        Self::with_connection(conn)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> SyncResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            SyncError::SyncInfo(format!("failed to open in-memory sync info store: {e}"))
        })?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> SyncResult<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn lock(&self) -> SyncResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| SyncError::SyncInfo("sync info lock poisoned".to_string()))
    }

    fn init_schema(&self) -> SyncResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS sync_info (
                scope TEXT NOT NULL,
                kind TEXT NOT NULL,
                source_id TEXT NOT NULL,
                target_id INTEGER NOT NULL,
                digest TEXT NOT NULL,
                last_modified INTEGER NOT NULL,
                UNIQUE(scope, kind, source_id)
            );

            CREATE TABLE IF NOT EXISTS scope_settings (
                scope TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                UNIQUE(scope, key)
            );
            ",
        )
        .map_err(|e| SyncError::SyncInfo(format!("failed to init sync info schema: {e}")))?;
        Ok(())
    }
}

type RawRecord = (String, String, i64, String, i64);

fn decode(scope: &ScopeId, raw: RawRecord) -> SyncResult<SyncInfoRecord> {
    let (kind, source_id, target_id, digest, last_modified) = raw;
    Ok(SyncInfoRecord {
        scope: scope.clone(),
        kind: kind
            .parse()
            .map_err(|e| SyncError::SyncInfo(format!("invalid kind in sync info: {e}")))?,
        source_id: SourceId::new(source_id),
        target_id: TargetId::new(target_id)
            .map_err(|e| SyncError::SyncInfo(format!("{e}")))?,
        fingerprint: Fingerprint::from_parts(digest, last_modified),
    })
}

impl SyncInfoStore for SqliteSyncInfoStore {
    fn find(&self, scope: &ScopeId, kind: Kind, source_id: &SourceId) -> SyncResult<Option<SyncInfoRecord>> {
        let conn = self.lock()?;
        let raw: Option<RawRecord> = conn
            .query_row(
                "SELECT kind, source_id, target_id, digest, last_modified FROM sync_info
                 WHERE scope = ?1 AND kind = ?2 AND source_id = ?3",
                params![scope.as_str(), kind.as_str(), source_id.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
            )
            .optional()
            .map_err(|e| SyncError::SyncInfo(format!("failed to query sync info: {e}")))?;
        raw.map(|r| decode(scope, r)).transpose()
    }

    fn write(&self, record: &SyncInfoRecord) -> SyncResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO sync_info (scope, kind, source_id, target_id, digest, last_modified)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.scope.as_str(),
                record.kind.as_str(),
                record.source_id.as_str(),
                record.target_id.value(),
                record.fingerprint.digest(),
                record.fingerprint.last_modified(),
            ],
        )
        .map_err(|e| SyncError::SyncInfo(format!("failed to write sync info: {e}")))?;
        Ok(())
    }

    fn list_scope(&self, scope: &ScopeId) -> SyncResult<Vec<SyncInfoRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT kind, source_id, target_id, digest, last_modified FROM sync_info
                 WHERE scope = ?1 ORDER BY kind, source_id",
            )
            .map_err(|e| SyncError::SyncInfo(format!("failed to prepare sync info query: {e}")))?;
        let rows = stmt
            .query_map(params![scope.as_str()], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
            })
            .map_err(|e| SyncError::SyncInfo(format!("failed to query sync info: {e}")))?;

        let mut result = Vec::new();
        for row in rows {
            let raw: RawRecord =
                row.map_err(|e| SyncError::SyncInfo(format!("failed to read sync info row: {e}")))?;
            result.push(decode(scope, raw)?);
        }
        Ok(result)
    }

    fn read_setting(&self, scope: &ScopeId, key: &str) -> SyncResult<Option<String>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT value FROM scope_settings WHERE scope = ?1 AND key = ?2",
            params![scope.as_str(), key],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| SyncError::SyncInfo(format!("failed to read setting {key}: {e}")))
    }

    fn write_setting(&self, scope: &ScopeId, key: &str, value: &str) -> SyncResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO scope_settings (scope, key, value) VALUES (?1, ?2, ?3)",
            params![scope.as_str(), key, value],
        )
        .map_err(|e| SyncError::SyncInfo(format!("failed to write setting {key}: {e}")))?;
        Ok(())
    }
}
