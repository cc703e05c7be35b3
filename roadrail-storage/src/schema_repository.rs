use crate::{lock, SharedConnection, StorageResult};
use duckdb::{params, Connection, OptionalExt};
use roadrail_model::SchemaSnapshot;
use std::sync::{Arc, Mutex};

/// Where the published dynamic schema lives.
pub trait SchemaRepository: Send + Sync {
    /// The last published snapshot with this name, if any.
    fn load_persisted(&self, name: &str) -> StorageResult<Option<SchemaSnapshot>>;
    /// Replaces the persisted snapshot of the same name.
    fn publish(&self, snapshot: &SchemaSnapshot) -> StorageResult<()>;
}

/// DuckDB implementation of [`SchemaRepository`].
pub struct DuckSchemaRepository {
    conn: SharedConnection,
}

impl DuckSchemaRepository {
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::open_with_conn(Arc::new(Mutex::new(Connection::open_in_memory()?)))
    }

    pub fn open_with_conn(conn: SharedConnection) -> StorageResult<Self> {
        {
            let guard = lock(&conn)?;
            guard.execute_batch(
                "
                CREATE TABLE IF NOT EXISTS published_schemas (
                    name TEXT PRIMARY KEY,
                    version TEXT NOT NULL,
                    snapshot TEXT NOT NULL
                );
                ",
            )?;
        }
        Ok(Self { conn })
    }
}

impl SchemaRepository for DuckSchemaRepository {
    fn load_persisted(&self, name: &str) -> StorageResult<Option<SchemaSnapshot>> {
        let conn = lock(&self.conn)?;
        let json: Option<String> = conn
            .query_row(
                "SELECT snapshot FROM published_schemas WHERE name = ?",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        json.map(|j| serde_json::from_str(&j))
            .transpose()
            .map_err(Into::into)
    }

    fn publish(&self, snapshot: &SchemaSnapshot) -> StorageResult<()> {
        let json = serde_json::to_string(snapshot)?;
        let conn = lock(&self.conn)?;
        conn.execute(
            "INSERT OR REPLACE INTO published_schemas (name, version, snapshot) VALUES (?, ?, ?)",
            params![snapshot.name, snapshot.version.to_string(), json],
        )?;
        tracing::info!(schema = %snapshot.name, version = %snapshot.version, "schema published");
        Ok(())
    }
}
