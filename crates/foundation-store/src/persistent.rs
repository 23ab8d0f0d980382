//! Durable key/value store with type fidelity.
//!
//! `PersistentStore` wraps any [`PropertyStore`] backend. Every value is
//! written together with a tag entry (`key + "_type"`) naming its
//! [`TypeTag`]; reads consult the tag to pick the right decoder, so an
//! `Int` comes back as an `Int`, a `Double` as a `Double`, and lists and
//! objects keep their shape.
//!
//! # Example
//!
//! ```
//! use foundation_store::{DynamicValue, MemoryProperties, PersistentStore};
//!
//! let mut store = PersistentStore::new(MemoryProperties::new());
//! store.set("n", 12.5).unwrap();
//! store.set("list", vec![1, 2, 3]).unwrap();
//!
//! assert_eq!(store.get("n").unwrap().into_one(), Some(DynamicValue::Double(12.5)));
//! assert_eq!(
//!     store.get("list").unwrap().into_one(),
//!     Some(DynamicValue::from(vec![1, 2, 3]))
//! );
//! ```

use alloc::collections::BTreeSet;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;

use crate::codec;
use crate::error::StoreError;
use crate::lookup::{Entry, Lookup};
use crate::selector::Selector;
use crate::tag::{TypeTag, DEFAULT_TAG_SUFFIX};
use crate::traits::{Property, PropertyOp, PropertyStore};
use crate::value::DynamicValue;
use crate::watch::{ChangeEvent, ChangeKind, ListenerId, WatchBus};

/// Result alias for persistent store operations over backend `P`.
pub type StoreResult<T, P> = Result<T, StoreError<<P as PropertyStore>::Error>>;

/// Configuration for `PersistentStore`.
#[derive(Debug, Clone)]
pub struct PersistentConfig {
    /// Suffix naming the tag entry of each key.
    pub tag_suffix: String,
}

impl Default for PersistentConfig {
    fn default() -> Self {
        Self {
            tag_suffix: DEFAULT_TAG_SUFFIX.to_string(),
        }
    }
}

/// Builder for constructing a `PersistentStore` with custom configuration.
pub struct PersistentStoreBuilder<P: PropertyStore> {
    props: P,
    config: PersistentConfig,
}

impl<P: PropertyStore> PersistentStoreBuilder<P> {
    /// Set the tag suffix. An empty suffix is ignored.
    pub fn tag_suffix(mut self, suffix: &str) -> Self {
        if suffix.is_empty() {
            tracing::warn!("ignoring empty tag suffix");
        } else {
            self.config.tag_suffix = suffix.to_string();
        }
        self
    }

    /// Build the `PersistentStore`.
    pub fn build(self) -> PersistentStore<P> {
        PersistentStore {
            props: self.props,
            bus: WatchBus::new(),
            config: self.config,
        }
    }
}

/// Type-tagged persistent store.
///
/// See the [module documentation](self) for the storage layout.
pub struct PersistentStore<P: PropertyStore> {
    props: P,
    bus: WatchBus<DynamicValue>,
    config: PersistentConfig,
}

impl<P: PropertyStore> PersistentStore<P> {
    /// Create a store over `props` with default config.
    pub fn new(props: P) -> Self {
        Self::builder(props).build()
    }

    /// Create a builder for advanced configuration.
    pub fn builder(props: P) -> PersistentStoreBuilder<P> {
        PersistentStoreBuilder {
            props,
            config: PersistentConfig::default(),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &PersistentConfig {
        &self.config
    }

    /// Get a reference to the underlying property store.
    pub fn properties(&self) -> &P {
        &self.props
    }

    /// Get a mutable reference to the underlying property store.
    ///
    /// Writes made through it bypass tagging and watch dispatch.
    pub fn properties_mut(&mut self) -> &mut P {
        &mut self.props
    }

    /// Consume the store and return its backend.
    pub fn into_properties(self) -> P {
        self.props
    }

    fn tag_key(&self, key: &str) -> String {
        let mut name = String::with_capacity(key.len() + self.config.tag_suffix.len());
        name.push_str(key);
        name.push_str(&self.config.tag_suffix);
        name
    }

    fn is_tag_key(&self, name: &str) -> bool {
        name.ends_with(self.config.tag_suffix.as_str())
    }

    // ── Reads ───────────────────────────────────────────────────────

    /// Look up values by selector.
    ///
    /// An exact key yields [`Lookup::One`]; a pattern yields
    /// [`Lookup::Many`] over every matching data key, in key order. Tag
    /// entries are never returned, even if the pattern matches their names.
    ///
    /// A decode failure on an exact key is returned as an error, so `None`
    /// always means absent. Pattern lookups skip undecodable keys instead
    /// (with a warning) and still return every healthy match; backend
    /// errors fail the whole lookup.
    pub fn get(&self, selector: impl Into<Selector>) -> StoreResult<Lookup<DynamicValue>, P> {
        Ok(self.get_with_keys(selector)?.map(|entry| entry.value))
    }

    /// Like [`get`](Self::get), returning each value with its key.
    pub fn get_with_keys(
        &self,
        selector: impl Into<Selector>,
    ) -> StoreResult<Lookup<Entry<DynamicValue>>, P> {
        match selector.into() {
            Selector::Exact(key) => {
                let value = self.read(&key)?;
                Ok(Lookup::One(value.map(|v| Entry::new(key, v))))
            }
            Selector::Pattern(re) => {
                let mut entries = Vec::new();
                for name in self.data_names(|name| re.is_match(name))? {
                    match self.read(&name) {
                        Ok(Some(value)) => entries.push(Entry::new(name, value)),
                        Ok(None) => {}
                        // Logged by `read`.
                        Err(e) if e.is_decode_error() => {}
                        Err(e) => return Err(e),
                    }
                }
                Ok(Lookup::Many(entries))
            }
        }
    }

    /// Decode a single key. Absent unless both the value and its tag exist.
    fn read(&self, key: &str) -> StoreResult<Option<DynamicValue>, P> {
        if self.is_tag_key(key) {
            return Ok(None);
        }
        let Some(tag_text) = self.props.get_string(&self.tag_key(key))? else {
            return Ok(None);
        };
        if !self.props.has_property(key)? {
            return Ok(None);
        }

        let result = self.decode(key, &tag_text);
        if let Err(e) = &result {
            tracing::warn!(key, error = %e, "failed to decode persisted value");
        }
        result.map(Some)
    }

    fn decode(&self, key: &str, tag_text: &str) -> StoreResult<DynamicValue, P> {
        let tag: TypeTag = tag_text.parse().map_err(|_| StoreError::UnknownTypeTag {
            key: key.to_string(),
            tag: tag_text.to_string(),
        })?;
        let malformed = |reason: String| StoreError::MalformedPayload {
            key: key.to_string(),
            reason,
        };

        let value = match tag {
            TypeTag::Bool => self.props.get_bool(key)?.map(DynamicValue::Bool),
            TypeTag::String => self.props.get_string(key)?.map(DynamicValue::String),
            TypeTag::Int => self.props.get_int(key)?.map(DynamicValue::Int),
            // Read back through the string form, never a native float.
            TypeTag::Double => match self.props.get_string(key)? {
                Some(text) => Some(DynamicValue::Double(
                    codec::decode_double(&text).map_err(malformed)?,
                )),
                None => None,
            },
            TypeTag::List => match self.props.get_list(key)? {
                Some(items) => Some(DynamicValue::List(
                    codec::decode_list(&items).map_err(malformed)?,
                )),
                None => None,
            },
            TypeTag::Object => match self.props.get_string(key)? {
                Some(text) => Some(DynamicValue::Object(
                    codec::decode_object(&text).map_err(malformed)?,
                )),
                None => None,
            },
        };

        value.ok_or_else(|| StoreError::TagMismatch {
            key: key.to_string(),
            tag,
        })
    }

    /// Backend names that are data keys (not tag entries) and pass `filter`.
    fn data_names<F: Fn(&str) -> bool>(&self, filter: F) -> StoreResult<Vec<String>, P> {
        Ok(self
            .props
            .list_properties()?
            .into_iter()
            .filter(|name| !self.is_tag_key(name) && filter(name))
            .collect())
    }

    /// All keys that currently hold a value, in key order.
    pub fn keys(&self) -> StoreResult<Vec<String>, P> {
        let names = self.props.list_properties()?;
        let present: BTreeSet<&str> = names.iter().map(String::as_str).collect();
        Ok(names
            .iter()
            .filter(|name| !self.is_tag_key(name) && present.contains(self.tag_key(name).as_str()))
            .cloned()
            .collect())
    }

    /// Whether the value entry for `key` exists in the backend.
    pub fn has_value(&self, key: &str) -> StoreResult<bool, P> {
        Ok(self.props.has_property(key)?)
    }

    /// Whether the tag entry for `key` exists in the backend.
    pub fn has_tag(&self, key: &str) -> StoreResult<bool, P> {
        Ok(self.props.has_property(&self.tag_key(key))?)
    }

    /// Whether `key` is present (value and tag both exist).
    pub fn contains_key(&self, key: &str) -> StoreResult<bool, P> {
        Ok(!self.is_tag_key(key) && self.has_value(key)? && self.has_tag(key)?)
    }

    /// The recorded tag of `key`, if any.
    pub fn tag_of(&self, key: &str) -> StoreResult<Option<TypeTag>, P> {
        match self.props.get_string(&self.tag_key(key))? {
            Some(text) => text
                .parse()
                .map(Some)
                .map_err(|_| StoreError::UnknownTypeTag {
                    key: key.to_string(),
                    tag: text,
                }),
            None => Ok(None),
        }
    }

    // ── Writes ──────────────────────────────────────────────────────

    /// Store `value` under `key`, recording its type tag, then notify
    /// matching watches. Returns the stored value.
    ///
    /// Keys ending in the tag suffix (`_type` by default, so also names
    /// like `order_type`) are reserved for tag entries and rejected with
    /// [`StoreError::ReservedKey`]. Pick another suffix through
    /// [`PersistentStore::builder`] if such names are needed.
    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: impl Into<DynamicValue>,
    ) -> StoreResult<DynamicValue, P> {
        let key = key.into();
        let value = value.into();
        if self.is_tag_key(&key) {
            return Err(StoreError::ReservedKey {
                key,
                suffix: self.config.tag_suffix.clone(),
            });
        }

        let tag = value.tag();
        let property = codec::encode(&value).map_err(|reason| StoreError::Encode {
            key: key.clone(),
            reason,
        })?;
        let tag_key = self.tag_key(&key);
        self.props.apply_batch(vec![
            PropertyOp::Set(key.clone(), property),
            PropertyOp::Set(tag_key, Property::String(tag.as_str().to_string())),
        ])?;
        tracing::debug!(key = %key, %tag, "persisted value");

        self.bus.dispatch(ChangeKind::Set, &key, Some(&value));
        Ok(value)
    }

    /// Remove one key, or every key a pattern matches, together with their
    /// tag entries. Watches are notified before each deletion. Returns the
    /// number of keys removed.
    pub fn remove(&mut self, selector: impl Into<Selector>) -> StoreResult<usize, P> {
        match selector.into() {
            Selector::Exact(key) => {
                if self.is_tag_key(&key) {
                    return Ok(0);
                }
                Ok(usize::from(self.remove_key(&key)?))
            }
            Selector::Pattern(re) => {
                let mut removed = 0;
                for name in self.data_names(|name| re.is_match(name))? {
                    if self.remove_key(&name)? {
                        removed += 1;
                    }
                }
                Ok(removed)
            }
        }
    }

    /// Returns `true` if a complete entry was removed. Orphaned halves are
    /// deleted without notification.
    fn remove_key(&mut self, key: &str) -> StoreResult<bool, P> {
        let tag_key = self.tag_key(key);
        let has_value = self.props.has_property(key)?;
        let has_tag = self.props.has_property(&tag_key)?;

        match (has_value, has_tag) {
            (false, false) => return Ok(false),
            (true, true) => {
                self.bus.dispatch(ChangeKind::Remove, key, None);
            }
            _ => {
                tracing::warn!(key, has_value, has_tag, "removing orphaned entry");
            }
        }

        self.props.apply_batch(vec![
            PropertyOp::Remove(key.to_string()),
            PropertyOp::Remove(tag_key),
        ])?;
        tracing::debug!(key, "removed value");
        Ok(has_value && has_tag)
    }

    /// Delete every property in the backend, tag entries included.
    /// Watch rules and listeners are kept.
    pub fn reset(&mut self) -> StoreResult<(), P> {
        self.props.clear()?;
        tracing::debug!("persistent store reset");
        Ok(())
    }

    // ── Watches ─────────────────────────────────────────────────────

    /// Start notifying listeners about keys matching `selector`.
    pub fn watch(&mut self, selector: impl Into<Selector>) -> bool {
        self.bus.watch(selector.into())
    }

    /// Stop watching `selector`.
    pub fn unwatch(&mut self, selector: impl Into<Selector>) -> bool {
        self.bus.unwatch(&selector.into())
    }

    /// Selectors currently watched.
    pub fn watches(&self) -> impl Iterator<Item = &Selector> {
        self.bus.rules()
    }

    /// Register a listener called synchronously for every matching change.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&ChangeEvent<DynamicValue>) + Send + 'static,
    {
        self.bus.subscribe(listener)
    }

    /// Drop a listener. Returns false if the id was unknown.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.bus.unsubscribe(id)
    }
}
