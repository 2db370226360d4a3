// ── Reactive entity collection ──
//
// Concurrent keyed storage with push-based change notification. Every
// mutation rebuilds an id-ordered snapshot and publishes it on a
// `watch` channel.

use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

/// Reactive collection of one entity type, keyed by its id.
pub(crate) struct EntityCollection<K, T>
where
    K: Copy + Eq + Hash + Ord + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    items: DashMap<K, Arc<T>>,
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<K, T> EntityCollection<K, T>
where
    K: Copy + Eq + Hash + Ord + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            items: DashMap::new(),
            snapshot,
        }
    }

    /// Insert or replace one entity. Returns `true` if the key was new.
    pub(crate) fn upsert(&self, key: K, entity: T) -> bool {
        let is_new = self.items.insert(key, Arc::new(entity)).is_none();
        self.publish();
        is_new
    }

    /// Replace the whole contents in one step, publishing once.
    pub(crate) fn replace_all(&self, entries: impl IntoIterator<Item = (K, T)>) {
        self.items.clear();
        for (key, entity) in entries {
            self.items.insert(key, Arc::new(entity));
        }
        self.publish();
    }

    pub(crate) fn remove(&self, key: &K) -> Option<Arc<T>> {
        let removed = self.items.remove(key).map(|(_, v)| v);
        if removed.is_some() {
            self.publish();
        }
        removed
    }

    pub(crate) fn get(&self, key: &K) -> Option<Arc<T>> {
        self.items.get(key).map(|r| Arc::clone(r.value()))
    }

    /// Current contents ordered by key (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    fn publish(&self) {
        let mut entries: Vec<(K, Arc<T>)> = self
            .items
            .iter()
            .map(|r| (*r.key(), Arc::clone(r.value())))
            .collect();
        entries.sort_by_key(|(k, _)| *k);
        let values = entries.into_iter().map(|(_, v)| v).collect();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn upsert_reports_new_keys() {
        let col: EntityCollection<i64, String> = EntityCollection::new();
        assert!(col.upsert(1, "a".into()));
        assert!(!col.upsert(1, "b".into()));
        assert_eq!(*col.get(&1).unwrap(), "b");
    }

    #[test]
    fn snapshot_is_ordered_by_key() {
        let col: EntityCollection<i64, &str> = EntityCollection::new();
        col.upsert(3, "c");
        col.upsert(1, "a");
        col.upsert(2, "b");
        let snap: Vec<&str> = col.snapshot().iter().map(|v| **v).collect();
        assert_eq!(snap, ["a", "b", "c"]);
    }

    #[test]
    fn replace_all_drops_missing_entries() {
        let col: EntityCollection<i64, &str> = EntityCollection::new();
        col.upsert(1, "a");
        col.upsert(2, "b");
        col.replace_all([(2, "B"), (5, "e")]);
        assert!(col.get(&1).is_none());
        assert_eq!(col.len(), 2);
    }

    #[test]
    fn subscribers_see_changes() {
        let col: EntityCollection<i64, &str> = EntityCollection::new();
        let mut rx = col.subscribe();
        col.upsert(1, "a");
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);

        col.remove(&1);
        assert!(rx.borrow_and_update().is_empty());
        assert!(col.remove(&1).is_none());
    }
}
