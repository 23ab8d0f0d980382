//! In-process key/value store.
//!
//! `VolatileStore` keeps values in memory for the lifetime of the process.
//! It holds any `V`, not just [`DynamicValue`], since nothing is encoded.

use alloc::collections::btree_map::{self, BTreeMap};
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::lookup::{Entry, Lookup};
use crate::selector::Selector;
use crate::value::DynamicValue;
use crate::watch::{ChangeEvent, ChangeKind, ListenerId, WatchBus};

/// Runtime-memory store with selector lookups and watch notifications.
///
/// # Example
///
/// ```
/// use foundation_store::{DynamicValue, Selector, VolatileStore};
///
/// let mut store = VolatileStore::new();
/// store.set("a", 1);
/// store.set("b", 2);
///
/// let hits = store.get(Selector::pattern("^a").unwrap());
/// assert_eq!(hits.into_vec(), vec![DynamicValue::Int(1)]);
/// ```
pub struct VolatileStore<V = DynamicValue> {
    data: BTreeMap<String, V>,
    bus: WatchBus<V>,
}

impl VolatileStore {
    /// Create an empty store of [`DynamicValue`]s.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<V: Clone> Default for VolatileStore<V> {
    fn default() -> Self {
        Self {
            data: BTreeMap::new(),
            bus: WatchBus::new(),
        }
    }
}

impl<V: Clone> VolatileStore<V> {
    /// Look up by selector. Exact keys yield [`Lookup::One`], patterns
    /// [`Lookup::Many`] in key order.
    pub fn get(&self, selector: impl Into<Selector>) -> Lookup<V> {
        self.get_with_keys(selector).map(|entry| entry.value)
    }

    /// Like [`get`](Self::get), returning each value with its key.
    pub fn get_with_keys(&self, selector: impl Into<Selector>) -> Lookup<Entry<V>> {
        match selector.into() {
            Selector::Exact(key) => {
                let value = self.data.get(&key).cloned();
                Lookup::One(value.map(|v| Entry::new(key, v)))
            }
            Selector::Pattern(re) => Lookup::Many(
                self.data
                    .iter()
                    .filter(|(k, _)| re.is_match(k))
                    .map(|(k, v)| Entry::new(k.clone(), v.clone()))
                    .collect(),
            ),
        }
    }

    /// Borrow the value stored under `key`.
    pub fn value(&self, key: &str) -> Option<&V> {
        self.data.get(key)
    }

    /// Insert or overwrite `key` and notify matching watches.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<V>) -> &V {
        let key = key.into();
        let value = value.into();
        tracing::debug!(key = %key, "set volatile value");
        self.bus.dispatch(ChangeKind::Set, &key, Some(&value));

        match self.data.entry(key) {
            btree_map::Entry::Occupied(mut slot) => {
                slot.insert(value);
                slot.into_mut()
            }
            btree_map::Entry::Vacant(slot) => slot.insert(value),
        }
    }

    /// Remove one key, or every key a pattern matches. Watches are notified
    /// with the literal key before it is removed. Returns the number of
    /// entries removed.
    pub fn remove(&mut self, selector: impl Into<Selector>) -> usize {
        let keys: Vec<String> = match selector.into() {
            Selector::Exact(key) if self.data.contains_key(&key) => vec![key],
            Selector::Exact(_) => Vec::new(),
            Selector::Pattern(re) => self
                .data
                .keys()
                .filter(|k| re.is_match(k))
                .cloned()
                .collect(),
        };

        for key in &keys {
            self.bus.dispatch(ChangeKind::Remove, key, None);
            self.data.remove(key);
            tracing::debug!(key = %key, "removed volatile value");
        }
        keys.len()
    }

    /// Drop every entry. With `clear_watches`, watch rules go too;
    /// subscribed listeners are always kept.
    pub fn reset(&mut self, clear_watches: bool) {
        self.data.clear();
        if clear_watches {
            self.bus.clear_rules();
        }
        tracing::debug!(clear_watches, "volatile store reset");
    }

    /// Start notifying listeners about keys matching `selector`.
    pub fn watch(&mut self, selector: impl Into<Selector>) -> bool {
        self.bus.watch(selector.into())
    }

    /// Stop watching `selector`. Returns false if it was not watched.
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
        F: FnMut(&ChangeEvent<V>) + Send + 'static,
    {
        self.bus.subscribe(listener)
    }

    /// Drop a listener. Returns false if the id was unknown.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when no key is stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Stored keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// Whether `key` holds a value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }
}

impl<V: fmt::Debug> fmt::Debug for VolatileStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VolatileStore")
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn recorder<V: Clone + Send + 'static>(
        store: &mut VolatileStore<V>,
    ) -> mpsc::Receiver<ChangeEvent<V>> {
        let (tx, rx) = mpsc::channel();
        store.subscribe(move |e| {
            let _ = tx.send(e.clone());
        });
        rx
    }

    fn pattern(src: &str) -> Selector {
        Selector::pattern(src).unwrap()
    }

    #[test]
    fn set_get_and_pattern_remove() {
        let mut store = VolatileStore::new();
        store.set("a", 1);
        store.set("b", 2);

        assert_eq!(store.get(pattern("^a")), Lookup::Many(vec![DynamicValue::Int(1)]));
        assert_eq!(store.remove(pattern("^a|b$")), 2);
        assert_eq!(store.get("a"), Lookup::One(None));
        assert_eq!(store.get("b"), Lookup::One(None));
        assert!(store.is_empty());
    }

    #[test]
    fn set_returns_stored_value() {
        let mut store: VolatileStore<String> = VolatileStore::default();
        assert_eq!(store.set("k", "v"), "v");
        assert_eq!(store.set("k", "w"), "w");
        assert_eq!(store.len(), 1);
        assert_eq!(store.value("k").map(String::as_str), Some("w"));
    }

    #[test]
    fn get_with_keys_for_both_shapes() {
        let mut store = VolatileStore::new();
        store.set("x.1", true);
        store.set("x.2", false);
        store.set("y", "other");

        let exact = store.get_with_keys("y").into_one().unwrap();
        assert_eq!(exact.key, "y");
        assert_eq!(exact.value, DynamicValue::from("other"));

        let keys: Vec<_> = store
            .get_with_keys(pattern("^x\\."))
            .into_vec()
            .into_iter()
            .map(|e| e.key)
            .collect();
        assert_eq!(keys, vec!["x.1", "x.2"]);
    }

    #[test]
    fn pattern_miss_is_empty_not_absent() {
        let store = VolatileStore::new();
        assert_eq!(store.get(pattern("nothing")), Lookup::Many(vec![]));
        assert_eq!(store.get("nothing"), Lookup::One(None));
    }

    #[test]
    fn watch_fires_once_per_rule() {
        let mut store = VolatileStore::new();
        let rx = recorder(&mut store);
        store.watch(pattern("^k"));
        store.watch("k1");

        store.set("k1", 5);
        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.key == "k1"));
        assert!(events.iter().all(|e| e.value == Some(DynamicValue::Int(5))));

        let selectors: Vec<_> = events.iter().map(|e| e.key_selector.as_str()).collect();
        assert_eq!(selectors, vec!["/^k/", "k1"]);
    }

    #[test]
    fn unwatch_stops_notifications() {
        let mut store = VolatileStore::new();
        let rx = recorder(&mut store);
        assert!(store.watch(pattern("^a")));
        assert!(!store.watch(pattern("^a")));

        store.set("ab", 1);
        assert_eq!(rx.try_iter().count(), 1);

        assert!(store.unwatch(pattern("^a")));
        assert!(!store.unwatch(pattern("^a")));
        store.set("ab", 2);
        assert_eq!(rx.try_iter().count(), 0);
    }

    #[test]
    fn remove_carries_literal_key() {
        let mut store = VolatileStore::new();
        store.set("user.1", 1);
        store.set("user.2", 2);
        let rx = recorder(&mut store);
        store.watch(pattern("^user"));

        store.remove(pattern("\\.2$"));
        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ChangeKind::Remove);
        assert_eq!(events[0].key, "user.2");
        assert_eq!(events[0].value, None);
    }

    #[test]
    fn removing_absent_key_is_a_no_op() {
        let mut store = VolatileStore::new();
        store.set("present", 1);
        let rx = recorder(&mut store);
        store.watch("absent");

        assert_eq!(store.remove("absent"), 0);
        assert_eq!(store.remove("absent"), 0);
        assert_eq!(rx.try_iter().count(), 0);
        assert_eq!(store.len(), 1);
        assert_eq!(store.watches().count(), 1);
    }

    #[test]
    fn reset_optionally_clears_watches() {
        let mut store = VolatileStore::new();
        let rx = recorder(&mut store);
        store.watch("x");
        store.set("x", "y");
        store.reset(false);
        assert_eq!(store.get("x"), Lookup::One(None));

        store.set("x", "y");
        store.reset(true);
        assert_eq!(rx.try_iter().count(), 2);

        store.set("x", "z");
        assert_eq!(rx.try_iter().count(), 0);
        assert_eq!(store.watches().count(), 0);
    }

    #[test]
    fn holds_arbitrary_values() {
        #[derive(Debug, Clone, PartialEq)]
        struct Session {
            user: String,
        }

        let mut store: VolatileStore<Session> = VolatileStore::default();
        store.set(
            "current",
            Session {
                user: "ada".into(),
            },
        );
        assert_eq!(
            store.get("current").into_one().map(|s| s.user),
            Some("ada".to_string())
        );
        assert!(store.contains_key("current"));
        assert_eq!(store.keys().collect::<Vec<_>>(), vec!["current"]);
    }
}
