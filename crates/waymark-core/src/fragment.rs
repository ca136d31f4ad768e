// SPDX-License-Identifier: MIT

//! Fragment-synchronized selection state.
//!
//! The current selection is addressable as a URL fragment (`#place-id`).
//! [`FragmentStore`] owns the cleaned fragment value, mirrors external
//! edits into it, and notifies subscribers exactly once per actual
//! change. Writing the value it already holds is a no-op, which is the
//! discipline that keeps UI update loops from feeding back into
//! themselves.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, Weak};

/// Strips a single leading `#`. Idempotent.
pub fn clean(raw: &str) -> &str {
    raw.strip_prefix('#').unwrap_or(raw)
}

type Listener = Box<dyn FnMut(&str) + Send>;

struct Inner {
    value: String,
    history: Vec<String>,
    listeners: HashMap<u64, Listener>,
    // Ids unsubscribed while their listener was checked out by notify().
    tombstones: HashSet<u64>,
    next_id: u64,
}

/// Observable store for the navigation-fragment value.
///
/// Cheap to clone; clones share the same state. Inject one handle into
/// the composition root instead of reaching for a global.
#[derive(Clone)]
pub struct FragmentStore {
    inner: Arc<Mutex<Inner>>,
}

impl Default for FragmentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FragmentStore {
    pub fn new() -> Self {
        Self::with_fragment("")
    }

    /// Creates a store whose initial value is computed eagerly from the
    /// fragment present at creation time (leading `#` stripped).
    pub fn with_fragment(raw: &str) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                value: clean(raw).to_string(),
                history: Vec::new(),
                listeners: HashMap::new(),
                tombstones: HashSet::new(),
                next_id: 0,
            })),
        }
    }

    /// Current cleaned value. Never includes a leading `#`.
    pub fn read(&self) -> String {
        self.inner.lock().unwrap().value.clone()
    }

    /// The addressable form: `#` + value, or a bare `#` when empty, so
    /// "no selection" stays distinguishable from "no fragment at all".
    pub fn fragment(&self) -> String {
        format!("#{}", self.inner.lock().unwrap().value)
    }

    /// Replaces the value. `None` and `Some("")` both clear it. Writing
    /// the current value is a no-op: no history entry, no notification.
    pub fn write(&self, value: Option<&str>) {
        self.apply(value.unwrap_or(""));
    }

    /// An external edit of the fragment (address bar, deep link). The
    /// raw text is cleaned first; otherwise behaves like [`write`].
    ///
    /// [`write`]: FragmentStore::write
    pub fn set_external(&self, raw: &str) {
        self.apply(clean(raw));
    }

    /// Pops the history stack, restoring the previously held value.
    /// Returns `false` when there is nothing to go back to.
    pub fn back(&self) -> bool {
        let restored = {
            let mut inner = self.inner.lock().unwrap();
            match inner.history.pop() {
                Some(prev) if prev != inner.value => {
                    inner.value = prev.clone();
                    Some(prev)
                }
                _ => None,
            }
        };
        match restored {
            Some(value) => {
                self.notify(&value);
                true
            }
            None => false,
        }
    }

    /// Registers a change listener, invoked with the new value after
    /// every actual change. Dropping the returned guard unsubscribes
    /// exactly once.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: FnMut(&str) + Send + 'static,
    {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.listeners.insert(id, Box::new(listener));
        Subscription {
            store: Arc::downgrade(&self.inner),
            id,
        }
    }

    fn apply(&self, new_value: &str) {
        {
            let mut inner = self.inner.lock().unwrap();
            if inner.value == new_value {
                return;
            }
            let old = std::mem::replace(&mut inner.value, new_value.to_string());
            inner.history.push(old);
        }
        self.notify(new_value);
    }

    // Listeners are checked out of the map while they run, so a callback
    // may subscribe, unsubscribe, or read without deadlocking.
    fn notify(&self, value: &str) {
        let mut checked_out = {
            let mut inner = self.inner.lock().unwrap();
            std::mem::take(&mut inner.listeners)
        };
        for listener in checked_out.values_mut() {
            listener(value);
        }
        let mut inner = self.inner.lock().unwrap();
        let tombstones = std::mem::take(&mut inner.tombstones);
        for (id, listener) in checked_out {
            if !tombstones.contains(&id) {
                inner.listeners.insert(id, listener);
            }
        }
    }
}

/// Guard for an active [`FragmentStore`] subscription.
pub struct Subscription {
    store: Weak<Mutex<Inner>>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.store.upgrade() {
            let mut inner = inner.lock().unwrap();
            if inner.listeners.remove(&self.id).is_none() {
                inner.tombstones.insert(self.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl FnMut(&str) + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let clone = Arc::clone(&count);
        (count, move |_: &str| {
            clone.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_clean_is_idempotent() {
        assert_eq!(clean("#abc"), "abc");
        assert_eq!(clean("abc"), "abc");
        assert_eq!(clean(clean("#abc")), "abc");
        assert_eq!(clean(""), "");
        assert_eq!(clean("#"), "");
        // Only one leading marker is stripped; the rest is payload.
        assert_eq!(clean("##x"), "#x");
        assert_eq!(clean(clean("##x")), "#x");
    }

    #[test]
    fn test_write_then_read() {
        let store = FragmentStore::new();
        store.write(Some("x"));
        assert_eq!(store.read(), "x");
        assert_eq!(store.fragment(), "#x");
    }

    #[test]
    fn test_initial_value_is_eager_and_cleaned() {
        let store = FragmentStore::with_fragment("#old-mill");
        assert_eq!(store.read(), "old-mill");
    }

    #[test]
    fn test_same_value_write_is_a_no_op() {
        let store = FragmentStore::new();
        store.write(Some("x"));

        let (count, listener) = counter();
        let _sub = store.subscribe(listener);

        store.write(Some("x"));
        store.set_external("#x");
        assert_eq!(count.load(Ordering::SeqCst), 0);
        // No redundant history entries either: the two no-op writes
        // above left nothing extra to pop.
        store.write(None);
        assert!(store.back());
        assert_eq!(store.read(), "x");
        assert!(store.back());
        assert_eq!(store.read(), "");
        assert!(!store.back());
    }

    #[test]
    fn test_write_none_clears_to_bare_marker() {
        let store = FragmentStore::new();
        store.write(Some("x"));
        store.write(None);
        assert_eq!(store.read(), "");
        assert_eq!(store.fragment(), "#");
    }

    #[test]
    fn test_external_edit_is_observed() {
        let store = FragmentStore::new();
        let (count, listener) = counter();
        let _sub = store.subscribe(listener);

        store.set_external("#north-beach");
        assert_eq!(store.read(), "north-beach");
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_back_restores_previous_value() {
        let store = FragmentStore::new();
        store.write(Some("a"));
        store.write(Some("b"));

        let (count, listener) = counter();
        let _sub = store.subscribe(listener);

        assert!(store.back());
        assert_eq!(store.read(), "a");
        assert!(store.back());
        assert_eq!(store.read(), "");
        assert!(!store.back());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_each_change_notifies_once() {
        let store = FragmentStore::new();
        let (count, listener) = counter();
        let _sub = store.subscribe(listener);

        store.write(Some("a"));
        store.write(Some("b"));
        store.write(None);
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_dropped_subscription_stops_notifying() {
        let store = FragmentStore::new();
        let (count, listener) = counter();
        let sub = store.subscribe(listener);

        store.write(Some("a"));
        drop(sub);
        store.write(Some("b"));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_during_notification() {
        let store = FragmentStore::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let (count, mut bump) = counter();
        let slot_clone = Arc::clone(&slot);
        let sub = store.subscribe(move |value| {
            bump(value);
            // Self-unsubscribe on first delivery.
            slot_clone.lock().unwrap().take();
        });
        *slot.lock().unwrap() = Some(sub);

        store.write(Some("a"));
        store.write(Some("b"));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clones_share_state() {
        let store = FragmentStore::new();
        let handle = store.clone();
        handle.write(Some("shared"));
        assert_eq!(store.read(), "shared");
    }
}
