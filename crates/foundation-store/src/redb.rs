//! Pure-Rust property backend using [`redb`](https://docs.rs/redb).
//!
//! No C dependencies, so it works where SQLite can't be cross-compiled.
//!
//! Enable with `features = ["redb"]`.
//!
//! ```no_run
//! use foundation_store::{PropertyStore, RedbProperties};
//!
//! let mut props = RedbProperties::open("/tmp/props.redb").unwrap();
//! props.set_bool("onboarded", true).unwrap();
//! ```

use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};

use crate::traits::{Property, PropertyOp, PropertyStore};

// ── Table definitions ───────────────────────────────────────────────

const PROPERTY_TABLE: TableDefinition<&[u8], &[u8]> =
    TableDefinition::new("foundation_properties");

const DEFAULT_NAMESPACE: &str = "default";

// ── Error type ──────────────────────────────────────────────────────

/// Errors returned by [`RedbProperties`] operations.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct RedbError(String);

fn err(e: impl std::fmt::Display) -> RedbError {
    RedbError(e.to_string())
}

// ── Store ───────────────────────────────────────────────────────────

/// A pure-Rust property backend built on [`redb`].
///
/// Properties are postcard-encoded [`Property`] values in a single table
/// keyed by `namespace \0 name`. Every write runs in its own redb
/// transaction; [`PropertyStore::apply_batch`] shares one.
pub struct RedbProperties {
    db: Database,
    namespace: String,
}

impl RedbProperties {
    /// Open or create a redb database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RedbError> {
        Self::open_with_namespace(path, DEFAULT_NAMESPACE)
    }

    /// Open or create a database, scoping this handle to `namespace`.
    pub fn open_with_namespace<P: AsRef<Path>>(
        path: P,
        namespace: &str,
    ) -> Result<Self, RedbError> {
        let db = Database::create(path).map_err(err)?;
        Self::init(db, namespace)
    }

    /// Create an in-memory redb database (for testing).
    pub fn open_in_memory() -> Result<Self, RedbError> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(err)?;
        Self::init(db, DEFAULT_NAMESPACE)
    }

    fn init(db: Database, namespace: &str) -> Result<Self, RedbError> {
        // Ensure the table exists by opening a write txn.
        let txn = db.begin_write().map_err(err)?;
        txn.open_table(PROPERTY_TABLE).map_err(err)?;
        txn.commit().map_err(err)?;
        Ok(Self {
            db,
            namespace: namespace.to_string(),
        })
    }

    /// Namespace this handle reads and writes.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl PropertyStore for RedbProperties {
    type Error = RedbError;

    fn get_property(&self, name: &str) -> Result<Option<Property>, RedbError> {
        let txn = self.db.begin_read().map_err(err)?;
        let table = txn.open_table(PROPERTY_TABLE).map_err(err)?;
        match table
            .get(property_key(&self.namespace, name).as_slice())
            .map_err(err)?
        {
            Some(guard) => postcard::from_bytes(guard.value()).map(Some).map_err(err),
            None => Ok(None),
        }
    }

    fn set_property(&mut self, name: &str, value: Property) -> Result<(), RedbError> {
        self.apply_batch(vec![PropertyOp::Set(name.to_string(), value)])
    }

    fn remove_property(&mut self, name: &str) -> Result<(), RedbError> {
        self.apply_batch(vec![PropertyOp::Remove(name.to_string())])
    }

    fn list_properties(&self) -> Result<Vec<String>, RedbError> {
        let txn = self.db.begin_read().map_err(err)?;
        let table = txn.open_table(PROPERTY_TABLE).map_err(err)?;

        let prefix = property_key_prefix(&self.namespace);
        let upper = property_key_prefix_upper(&self.namespace);
        let range = table
            .range(prefix.as_slice()..upper.as_slice())
            .map_err(err)?;

        let mut names = Vec::new();
        for item in range {
            let (key_guard, _) = item.map_err(err)?;
            if let Some((_, name)) = parse_property_key(key_guard.value()) {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    fn apply_batch(&mut self, ops: Vec<PropertyOp>) -> Result<(), RedbError> {
        let txn = self.db.begin_write().map_err(err)?;
        {
            let mut table = txn.open_table(PROPERTY_TABLE).map_err(err)?;
            for op in ops {
                match op {
                    PropertyOp::Set(name, value) => {
                        let bytes = postcard::to_allocvec(&value).map_err(err)?;
                        table
                            .insert(
                                property_key(&self.namespace, &name).as_slice(),
                                bytes.as_slice(),
                            )
                            .map_err(err)?;
                    }
                    PropertyOp::Remove(name) => {
                        table
                            .remove(property_key(&self.namespace, &name).as_slice())
                            .map_err(err)?;
                    }
                }
            }
        }
        txn.commit().map_err(err)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), RedbError> {
        let names = self.list_properties()?;
        self.apply_batch(names.into_iter().map(PropertyOp::Remove).collect())
    }
}

// ── Key encoding helpers ────────────────────────────────────────────

/// Property key: `namespace \0 name`
fn property_key(namespace: &str, name: &str) -> Vec<u8> {
    let mut k = Vec::with_capacity(namespace.len() + 1 + name.len());
    k.extend_from_slice(namespace.as_bytes());
    k.push(0);
    k.extend_from_slice(name.as_bytes());
    k
}

/// Lower bound for all property keys in a namespace.
fn property_key_prefix(namespace: &str) -> Vec<u8> {
    let mut k = Vec::with_capacity(namespace.len() + 1);
    k.extend_from_slice(namespace.as_bytes());
    k.push(0);
    k
}

/// Upper bound (exclusive) for all property keys in a namespace.
fn property_key_prefix_upper(namespace: &str) -> Vec<u8> {
    let mut k = Vec::with_capacity(namespace.len() + 1);
    k.extend_from_slice(namespace.as_bytes());
    k.push(1); // \x01 > \x00, captures everything in range
    k
}

/// Parse a property key back into `(namespace, name)`.
fn parse_property_key(key: &[u8]) -> Option<(&str, &str)> {
    let pos = key.iter().position(|&b| b == 0)?;
    let ns = std::str::from_utf8(&key[..pos]).ok()?;
    let name = std::str::from_utf8(&key[pos + 1..]).ok()?;
    Some((ns, name))
}

// ── Tests ───────────────────────────────────────────────────────────
