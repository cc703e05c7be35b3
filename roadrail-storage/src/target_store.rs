use crate::{lock, open_file, SharedConnection, StorageError, StorageResult};
use duckdb::{params, params_from_iter, Connection, OptionalExt};
use roadrail_model::{Container, TargetData, TargetEntity, TargetQuery};
use roadrail_types::TargetId;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// The persisted target graph as seen by the converters.
///
/// Codes are unique within a container. Ids are assigned on creation and
/// are stable for the lifetime of the store.
pub trait TargetStore: Send + Sync {
    fn create_entity(&self, container: Container, data: &TargetData) -> StorageResult<TargetId>;
    fn update_entity(&self, id: TargetId, data: &TargetData) -> StorageResult<()>;
    fn get_entity(&self, id: TargetId) -> StorageResult<Option<TargetEntity>>;
    fn find_by_code(&self, container: Container, code: &str) -> StorageResult<Option<TargetId>>;
    /// Ids of all entities matching every set field of `query`, ascending.
    fn query(&self, query: &TargetQuery) -> StorageResult<Vec<TargetId>>;
    fn count(&self) -> StorageResult<usize>;
}

/// DuckDB implementation of [`TargetStore`].
pub struct DuckTargetStore {
    conn: SharedConnection,
}

impl DuckTargetStore {
    /// Opens (or creates) a store at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = open_file(path)?;
        Self::open_with_conn(Arc::new(Mutex::new(conn)))
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::open_with_conn(Arc::new(Mutex::new(Connection::open_in_memory()?)))
    }

    /// Uses an existing connection, creating the tables if needed.
    pub fn open_with_conn(conn: SharedConnection) -> StorageResult<Self> {
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// The underlying connection, for sharing with [`crate::DuckSchemaRepository`].
    #[must_use]
    pub fn connection(&self) -> SharedConnection {
        Arc::clone(&self.conn)
    }

    fn init_schema(&self) -> StorageResult<()> {
        let conn = lock(&self.conn)?;
        conn.execute_batch(
            "
            CREATE SEQUENCE IF NOT EXISTS target_id_seq START 1;

            CREATE TABLE IF NOT EXISTS target_entities (
                id BIGINT PRIMARY KEY,
                container TEXT NOT NULL,
                class_name TEXT NOT NULL,
                code TEXT NOT NULL,
                source_ref TEXT,
                data TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_target_container_code
                ON target_entities (container, code);
            CREATE INDEX IF NOT EXISTS idx_target_source_ref
                ON target_entities (source_ref);
            ",
        )?;
        Ok(())
    }
}

fn code_owner(conn: &Connection, container: &str, code: &str) -> StorageResult<Option<i64>> {
    conn.query_row(
        "SELECT id FROM target_entities WHERE container = ? AND code = ? ORDER BY id LIMIT 1",
        params![container, code],
        |row| row.get(0),
    )
    .optional()
    .map_err(Into::into)
}

fn to_target_id(raw: i64) -> StorageResult<TargetId> {
    TargetId::new(raw).map_err(|e| StorageError::InvalidData(e.to_string()))
}

impl TargetStore for DuckTargetStore {
    fn create_entity(&self, container: Container, data: &TargetData) -> StorageResult<TargetId> {
        let key = container.key();
        let json = serde_json::to_string(data)?;
        let conn = lock(&self.conn)?;

        if code_owner(&conn, &key, &data.code)?.is_some() {
            return Err(StorageError::DuplicateCode {
                container: key,
                code: data.code.clone(),
            });
        }

        let raw: i64 = conn.query_row("SELECT nextval('target_id_seq')", [], |row| row.get(0))?;
        conn.execute(
            "INSERT INTO target_entities (id, container, class_name, code, source_ref, data)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![raw, key, data.class_name, data.code, data.source_ref, json],
        )?;
        tracing::trace!(id = raw, container = %container, code = %data.code, "target created");
        to_target_id(raw)
    }

    fn update_entity(&self, id: TargetId, data: &TargetData) -> StorageResult<()> {
        let json = serde_json::to_string(data)?;
        let conn = lock(&self.conn)?;

        let container: Option<String> = conn
            .query_row(
                "SELECT container FROM target_entities WHERE id = ?",
                params![id.value()],
                |row| row.get(0),
            )
            .optional()?;
        let container = container.ok_or_else(|| StorageError::NotFound(id.to_string()))?;

        if let Some(owner) = code_owner(&conn, &container, &data.code)?
            && owner != id.value()
        {
            return Err(StorageError::DuplicateCode {
                container,
                code: data.code.clone(),
            });
        }

        conn.execute(
            "UPDATE target_entities SET class_name = ?, code = ?, source_ref = ?, data = ? WHERE id = ?",
            params![data.class_name, data.code, data.source_ref, json, id.value()],
        )?;
        Ok(())
    }

    fn get_entity(&self, id: TargetId) -> StorageResult<Option<TargetEntity>> {
        let conn = lock(&self.conn)?;
        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT container, data FROM target_entities WHERE id = ?",
                params![id.value()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((key, json)) = row else {
            return Ok(None);
        };
        let container = Container::parse_key(&key)
            .ok_or_else(|| StorageError::InvalidData(format!("unknown container key {key:?}")))?;
        let data: TargetData = serde_json::from_str(&json)?;
        Ok(Some(TargetEntity {
            id,
            container,
            data,
        }))
    }

    fn find_by_code(&self, container: Container, code: &str) -> StorageResult<Option<TargetId>> {
        let conn = lock(&self.conn)?;
        code_owner(&conn, &container.key(), code)?
            .map(to_target_id)
            .transpose()
    }

    fn query(&self, query: &TargetQuery) -> StorageResult<Vec<TargetId>> {
        let mut clauses = Vec::new();
        let mut values: Vec<String> = Vec::new();
        if let Some(container) = &query.container {
            clauses.push("container = ?");
            values.push(container.key());
        }
        if let Some(class_name) = &query.class_name {
            clauses.push("class_name = ?");
            values.push(class_name.clone());
        }
        if let Some(source_ref) = &query.source_ref {
            clauses.push("source_ref = ?");
            values.push(source_ref.clone());
        }

        let mut sql = String::from("SELECT id FROM target_entities");
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY id");

        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| row.get::<_, i64>(0))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(to_target_id(row?)?);
        }
        Ok(ids)
    }

    fn count(&self) -> StorageResult<usize> {
        let conn = lock(&self.conn)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM target_entities", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}
