//! SQLite property backend using rusqlite.
//!
//! This is the primary durable backend for desktop and mobile hosts.
//! Uses WAL mode by default. Several independent property sets can share
//! one database file through namespaces.
//!
//! # Example
//!
//! ```no_run
//! use foundation_store::{PropertyStore, SqliteProperties};
//!
//! let mut props = SqliteProperties::open("app.db").unwrap();
//! props.set_string("user", "ada").unwrap();
//!
//! assert_eq!(props.get_string("user").unwrap().as_deref(), Some("ada"));
//! ```

use std::path::Path;
use std::sync::Mutex;

use rusqlite::types::Value as SqlValue;
use rusqlite::{params, Connection, OptionalExtension};

use crate::traits::{Property, PropertyOp, PropertyStore};

/// SQLite configuration options.
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// SQLite journal mode. Defaults to WAL.
    pub journal_mode: JournalMode,
    /// Busy timeout in milliseconds. Defaults to 5000.
    pub busy_timeout_ms: u32,
    /// Namespace isolating this property set. Defaults to `"default"`.
    pub namespace: String,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            journal_mode: JournalMode::Wal,
            busy_timeout_ms: 5000,
            namespace: "default".to_string(),
        }
    }
}

/// SQLite journal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalMode {
    /// Write-Ahead Logging; allows concurrent reads during writes.
    Wal,
    /// Traditional rollback journal.
    Delete,
    /// In-memory journal (fastest, no crash recovery).
    Memory,
}

impl JournalMode {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Wal => "WAL",
            Self::Delete => "DELETE",
            Self::Memory => "MEMORY",
        }
    }
}

/// Error type for the SQLite backend.
#[derive(Debug, thiserror::Error)]
pub enum SqliteError {
    /// An error from rusqlite.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Lock poisoned.
    #[error("sqlite lock poisoned")]
    LockPoisoned,
    /// A row whose kind and stored value disagree.
    #[error("corrupt property {name:?}: kind {kind:?} does not match stored value")]
    Corrupt { name: String, kind: String },
}

/// SQLite property backend.
///
/// Wraps a `rusqlite::Connection` behind a `Mutex` for safe shared access.
/// Creates the schema automatically on first open.
pub struct SqliteProperties {
    conn: Mutex<Connection>,
    namespace: String,
}

impl SqliteProperties {
    /// Open (or create) a SQLite database at the given path with default config.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SqliteError> {
        Self::open_with_config(path, SqliteConfig::default())
    }

    /// Open with custom configuration.
    pub fn open_with_config<P: AsRef<Path>>(
        path: P,
        config: SqliteConfig,
    ) -> Result<Self, SqliteError> {
        let conn = Connection::open(path)?;
        Self::init_connection(&conn, &config)?;
        Self::create_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            namespace: config.namespace,
        })
    }

    /// Open an in-memory database (useful for testing).
    pub fn open_in_memory() -> Result<Self, SqliteError> {
        let config = SqliteConfig::default();
        let conn = Connection::open_in_memory()?;
        Self::init_connection(&conn, &config)?;
        Self::create_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            namespace: config.namespace,
        })
    }

    fn init_connection(conn: &Connection, config: &SqliteConfig) -> Result<(), SqliteError> {
        conn.execute_batch(&format!(
            "PRAGMA journal_mode = {};
             PRAGMA busy_timeout = {};
             PRAGMA synchronous = NORMAL;",
            config.journal_mode.as_str(),
            config.busy_timeout_ms,
        ))?;
        Ok(())
    }

    fn create_schema(conn: &Connection) -> Result<(), SqliteError> {
        // `value` has no declared type so SQLite keeps each value's storage class.
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS properties (
                namespace   TEXT NOT NULL,
                name        TEXT NOT NULL,
                kind        TEXT NOT NULL,
                value,
                updated_at  INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (namespace, name)
            );",
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, SqliteError> {
        self.conn.lock().map_err(|_| SqliteError::LockPoisoned)
    }

    fn now_ms() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }

    /// The namespace this handle reads and writes.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// All namespaces present in the database file.
    pub fn namespaces(&self) -> Result<Vec<String>, SqliteError> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT DISTINCT namespace FROM properties ORDER BY namespace")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    /// Get the database file size in bytes (0 for in-memory).
    pub fn file_size(&self) -> Result<u64, SqliteError> {
        let conn = self.lock()?;
        let page_count: i64 = conn.query_row("PRAGMA page_count", [], |row| row.get(0))?;
        let page_size: i64 = conn.query_row("PRAGMA page_size", [], |row| row.get(0))?;
        Ok((page_count * page_size) as u64)
    }

    /// Get the current journal mode.
    pub fn journal_mode(&self) -> Result<String, SqliteError> {
        let conn = self.lock()?;
        let mode: String = conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?;
        Ok(mode)
    }

    fn upsert(
        conn: &Connection,
        namespace: &str,
        name: &str,
        value: Property,
    ) -> Result<(), SqliteError> {
        let kind = value.kind();
        conn.execute(
            "INSERT INTO properties (namespace, name, kind, value, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(namespace, name)
             DO UPDATE SET kind = excluded.kind, value = excluded.value,
                           updated_at = excluded.updated_at",
            params![namespace, name, kind, encode_value(value), Self::now_ms() as i64],
        )?;
        Ok(())
    }

    fn delete(conn: &Connection, namespace: &str, name: &str) -> Result<(), SqliteError> {
        conn.execute(
            "DELETE FROM properties WHERE namespace = ?1 AND name = ?2",
            params![namespace, name],
        )?;
        Ok(())
    }
}

fn encode_value(value: Property) -> SqlValue {
    match value {
        Property::Bool(b) => SqlValue::Integer(i64::from(b)),
        Property::Int(i) => SqlValue::Integer(i),
        // SQLite turns a NaN REAL into NULL, so non-finite values go in as text.
        Property::Double(d) if !d.is_finite() => SqlValue::Text(d.to_string()),
        Property::Double(d) => SqlValue::Real(d),
        Property::String(s) => SqlValue::Text(s),
        // Lists of strings always serialize.
        Property::List(items) => {
            SqlValue::Text(serde_json::to_string(&items).unwrap_or_else(|_| "[]".into()))
        }
    }
}

fn decode_value(name: &str, kind: String, value: SqlValue) -> Result<Property, SqliteError> {
    let decoded = match (kind.as_str(), value) {
        ("bool", SqlValue::Integer(i)) => Some(Property::Bool(i != 0)),
        ("int", SqlValue::Integer(i)) => Some(Property::Int(i)),
        ("double", SqlValue::Real(d)) => Some(Property::Double(d)),
        ("double", SqlValue::Integer(i)) => Some(Property::Double(i as f64)),
        ("double", SqlValue::Text(s)) => s.parse().ok().map(Property::Double),
        ("string", SqlValue::Text(s)) => Some(Property::String(s)),
        ("list", SqlValue::Text(s)) => serde_json::from_str(&s).ok().map(Property::List),
        _ => None,
    };
    decoded.ok_or_else(|| SqliteError::Corrupt {
        name: name.to_string(),
        kind,
    })
}

impl PropertyStore for SqliteProperties {
    type Error = SqliteError;

    fn get_property(&self, name: &str) -> Result<Option<Property>, Self::Error> {
        let conn = self.lock()?;
        let row: Option<(String, SqlValue)> = conn
            .query_row(
                "SELECT kind, value FROM properties WHERE namespace = ?1 AND name = ?2",
                params![self.namespace, name],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        row.map(|(kind, value)| decode_value(name, kind, value))
            .transpose()
    }

    fn set_property(&mut self, name: &str, value: Property) -> Result<(), Self::Error> {
        let conn = self.lock()?;
        Self::upsert(&conn, &self.namespace, name, value)
    }

    fn remove_property(&mut self, name: &str) -> Result<(), Self::Error> {
        let conn = self.lock()?;
        Self::delete(&conn, &self.namespace, name)
    }

    fn list_properties(&self) -> Result<Vec<String>, Self::Error> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT name FROM properties WHERE namespace = ?1 ORDER BY name")?;
        let names = stmt
            .query_map(params![self.namespace], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    fn has_property(&self, name: &str) -> Result<bool, Self::Error> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM properties WHERE namespace = ?1 AND name = ?2",
            params![self.namespace, name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn apply_batch(&mut self, ops: Vec<PropertyOp>) -> Result<(), Self::Error> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        for op in ops {
            match op {
                PropertyOp::Set(name, value) => Self::upsert(&tx, &self.namespace, &name, value)?,
                PropertyOp::Remove(name) => Self::delete(&tx, &self.namespace, &name)?,
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), Self::Error> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM properties WHERE namespace = ?1",
            params![self.namespace],
        )?;
        Ok(())
    }
}
