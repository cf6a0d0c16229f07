//! The set of live connections.
//!
//! Order is irrelevant, so removal swaps the last entry into the hole.
//! The registry itself is not synchronized; the server keeps it behind a
//! mutex and holds that lock only for a single structural edit or copy.

use gamenet_transport::ConnectionId;

pub(crate) struct Registry<V> {
    entries: Vec<(ConnectionId, V)>,
}

impl<V> Registry<V> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub(crate) fn insert(&mut self, id: ConnectionId, value: V) {
        debug_assert!(!self.contains(id), "{id} registered twice");
        self.entries.push((id, value));
    }

    /// Removes `id`, returning its entry. Removing an absent id is a no-op.
    pub(crate) fn remove(&mut self, id: ConnectionId) -> Option<V> {
        let index = self.entries.iter().position(|(entry, _)| *entry == id)?;
        Some(self.entries.swap_remove(index).1)
    }

    pub(crate) fn contains(&self, id: ConnectionId) -> bool {
        self.entries.iter().any(|(entry, _)| *entry == id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Empties the registry and hands back everything it held.
    pub(crate) fn drain(&mut self) -> Vec<V> {
        std::mem::take(&mut self.entries)
            .into_iter()
            .map(|(_, value)| value)
            .collect()
    }
}

impl<V: Clone> Registry<V> {
    pub(crate) fn snapshot(&self) -> Vec<V> {
        self.entries.iter().map(|(_, value)| value.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> ConnectionId {
        ConnectionId::new(n)
    }

    #[test]
    fn test_insert_and_remove() {
        let mut registry = Registry::new();
        registry.insert(id(1), "a");
        registry.insert(id(2), "b");
        registry.insert(id(3), "c");

        assert_eq!(registry.remove(id(1)), Some("a"));
        assert_eq!(registry.len(), 2);
        assert!(!registry.contains(id(1)));
        assert!(registry.contains(id(2)));
        assert!(registry.contains(id(3)));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut registry = Registry::new();
        registry.insert(id(1), "a");
        assert_eq!(registry.remove(id(1)), Some("a"));
        assert_eq!(registry.remove(id(1)), None);
        assert_eq!(registry.remove(id(42)), None);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_snapshot_and_drain() {
        let mut registry = Registry::new();
        registry.insert(id(1), 10);
        registry.insert(id(2), 20);

        let mut snapshot = registry.snapshot();
        snapshot.sort();
        assert_eq!(snapshot, vec![10, 20]);
        assert_eq!(registry.len(), 2);

        let mut drained = registry.drain();
        drained.sort();
        assert_eq!(drained, vec![10, 20]);
        assert_eq!(registry.len(), 0);
    }
}
