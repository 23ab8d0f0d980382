//! Watch rules and synchronous change notification.
//!
//! Each store owns a [`WatchBus`]. A mutation of `key` is tested against
//! every registered rule; for each rule that selects the key, every
//! subscribed listener is called inline with a [`ChangeEvent`] before the
//! mutating call returns.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt;

use crate::selector::Selector;

/// What happened to the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Set,
    Remove,
}

impl ChangeKind {
    /// Lowercase name used in logs and display.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Set => "set",
            Self::Remove => "remove",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification delivered to listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent<V> {
    pub kind: ChangeKind,
    /// Canonical form of the rule that matched.
    pub key_selector: String,
    /// The literal key that changed.
    pub key: String,
    /// The new value, `None` on removal.
    pub value: Option<V>,
}

impl<V> ChangeEvent<V> {
    /// Event name shared by every storage mutation.
    pub const NAME: &'static str = "foundation.storage.change";
}

/// Handle returned by [`WatchBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

type Listener<V> = Box<dyn FnMut(&ChangeEvent<V>) + Send>;

/// Registered watch rules plus the listeners they notify.
pub struct WatchBus<V> {
    rules: BTreeMap<String, Selector>,
    listeners: Vec<(ListenerId, Listener<V>)>,
    next_listener: u64,
}

impl<V: Clone> WatchBus<V> {
    /// Empty bus with no rules or listeners.
    pub fn new() -> Self {
        Self {
            rules: BTreeMap::new(),
            listeners: Vec::new(),
            next_listener: 1,
        }
    }

    /// Register a rule. Returns `false` if a rule with the same canonical
    /// form was already present (it is replaced).
    pub fn watch(&mut self, selector: Selector) -> bool {
        let canonical = selector.canonical();
        tracing::debug!(selector = %canonical, "watching");
        self.rules.insert(canonical, selector).is_none()
    }

    /// Drop a rule. Returns `false` if it was not registered.
    pub fn unwatch(&mut self, selector: &Selector) -> bool {
        self.rules.remove(&selector.canonical()).is_some()
    }

    /// Remove every watch rule. Listeners stay registered.
    pub fn clear_rules(&mut self) {
        self.rules.clear();
    }

    /// Whether `selector` is registered as a rule.
    pub fn is_watched(&self, selector: &Selector) -> bool {
        self.rules.contains_key(&selector.canonical())
    }

    /// Registered rules in canonical order.
    pub fn rules(&self) -> impl Iterator<Item = &Selector> {
        self.rules.values()
    }

    /// Register a listener and return its id.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&ChangeEvent<V>) + Send + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Drop a listener. Returns false if the id was unknown.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Test every rule against `key` and notify listeners once per matching
    /// rule. Returns the number of rules that matched.
    pub fn dispatch(&mut self, kind: ChangeKind, key: &str, value: Option<&V>) -> usize {
        let mut matched = 0;
        for (canonical, selector) in &self.rules {
            if !selector.matches(key) {
                continue;
            }
            matched += 1;
            tracing::trace!(%kind, key, selector = %canonical, "dispatching change");
            let event = ChangeEvent {
                kind,
                key_selector: canonical.clone(),
                key: key.to_string(),
                value: value.cloned(),
            };
            for (_, listener) in self.listeners.iter_mut() {
                listener(&event);
            }
        }
        matched
    }
}

impl<V: Clone> Default for WatchBus<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for WatchBus<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchBus")
            .field("rules", &self.rules.keys().collect::<Vec<_>>())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn recording_bus() -> (WatchBus<i32>, mpsc::Receiver<ChangeEvent<i32>>) {
        let mut bus = WatchBus::new();
        let (tx, rx) = mpsc::channel();
        bus.subscribe(move |e: &ChangeEvent<i32>| {
            let _ = tx.send(e.clone());
        });
        (bus, rx)
    }

    #[test]
    fn exact_rule_fires_once() {
        let (mut bus, rx) = recording_bus();
        bus.watch(Selector::from("a"));

        assert_eq!(bus.dispatch(ChangeKind::Set, "a", Some(&1)), 1);
        assert_eq!(bus.dispatch(ChangeKind::Set, "b", Some(&2)), 0);

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![ChangeEvent {
                kind: ChangeKind::Set,
                key_selector: "a".into(),
                key: "a".into(),
                value: Some(1),
            }]
        );
    }

    #[test]
    fn each_matching_rule_fires() {
        let (mut bus, rx) = recording_bus();
        bus.watch(Selector::from("cat"));
        bus.watch(Selector::pattern("(b|c)at").unwrap());

        bus.dispatch(ChangeKind::Remove, "cat", None);
        let selectors: Vec<_> = rx.try_iter().map(|e| e.key_selector).collect();
        assert_eq!(selectors, vec!["/(b|c)at/", "cat"]);
    }

    #[test]
    fn watch_is_idempotent() {
        let (mut bus, rx) = recording_bus();
        assert!(bus.watch(Selector::from("a")));
        assert!(!bus.watch(Selector::from("a")));
        bus.dispatch(ChangeKind::Set, "a", Some(&1));
        assert_eq!(rx.try_iter().count(), 1);
    }

    #[test]
    fn unwatch_silences_rule() {
        let (mut bus, rx) = recording_bus();
        let rule = Selector::pattern("^a").unwrap();
        bus.watch(rule.clone());
        assert!(bus.unwatch(&rule));
        assert!(!bus.unwatch(&rule));

        bus.dispatch(ChangeKind::Set, "abc", Some(&1));
        assert_eq!(rx.try_iter().count(), 0);
    }

    #[test]
    fn unsubscribe_removes_listener() {
        let (mut bus, rx) = recording_bus();
        bus.watch(Selector::from("a"));
        let (tx2, rx2) = mpsc::channel();
        let id = bus.subscribe(move |e: &ChangeEvent<i32>| {
            let _ = tx2.send(e.key.clone());
        });
        assert_eq!(bus.listener_count(), 2);

        assert!(bus.unsubscribe(id));
        bus.dispatch(ChangeKind::Set, "a", Some(&1));
        assert_eq!(rx.try_iter().count(), 1);
        assert_eq!(rx2.try_iter().count(), 0);
    }

    #[test]
    fn rules_without_listeners_still_match() {
        let mut bus: WatchBus<i32> = WatchBus::new();
        bus.watch(Selector::from("a"));
        assert_eq!(bus.dispatch(ChangeKind::Set, "a", Some(&1)), 1);
    }
}
