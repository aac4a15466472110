//! Memoization keyed by function identity and an argument fingerprint.
use std::{
    any::{Any, TypeId},
    cell::RefCell,
    collections::HashMap,
    hash::Hash,
};

/// A result cache.
///
/// Slots are keyed by a function name plus the types of its key and value, so
/// two functions can never read each other's entries. Entries are never
/// evicted.
#[derive(Default)]
pub struct MemoCache {
    slots: RefCell<HashMap<(&'static str, TypeId), Box<dyn Any>>>,
}

impl std::fmt::Debug for MemoCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoCache")
            .field("functions", &self.slots.borrow().len())
            .finish()
    }
}

impl MemoCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the value cached for (`name`, `key`), computing and storing it
    /// with `thunk` if there is none.
    ///
    /// `thunk` runs without the cache borrowed, so it may use the cache itself.
    /// Should it store a value under the same key, that first value wins.
    pub fn memoize<K, V>(&self, name: &'static str, key: K, thunk: impl FnOnce() -> V) -> V
    where
        K: Hash + Eq + 'static,
        V: Clone + 'static,
    {
        let slot = (name, TypeId::of::<(K, V)>());
        if let Some(value) = self
            .slots
            .borrow()
            .get(&slot)
            .and_then(|table| table.downcast_ref::<HashMap<K, V>>())
            .and_then(|table| table.get(&key))
        {
            return value.clone();
        }

        let value = thunk();
        let mut slots = self.slots.borrow_mut();
        match slots
            .entry(slot)
            .or_insert_with(|| Box::new(HashMap::<K, V>::new()))
            .downcast_mut::<HashMap<K, V>>()
        {
            Some(table) => table.entry(key).or_insert(value).clone(),
            // Unreachable, the slot's TypeId pins its table type.
            None => value,
        }
    }

    /// Memoize a function that takes no arguments: every call shares one slot.
    pub fn memoize_global<V>(&self, name: &'static str, thunk: impl FnOnce() -> V) -> V
    where
        V: Clone + 'static,
    {
        self.memoize(name, (), thunk)
    }

    /// The number of cached entries for a function.
    pub fn len_of<K, V>(&self, name: &'static str) -> usize
    where
        K: Hash + Eq + 'static,
        V: 'static,
    {
        self.slots
            .borrow()
            .get(&(name, TypeId::of::<(K, V)>()))
            .and_then(|table| table.downcast_ref::<HashMap<K, V>>())
            .map(HashMap::len)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod test {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn thunk_runs_once_per_key() {
        let cache = MemoCache::new();
        let runs = Cell::new(0);
        let square = |n: u32| {
            cache.memoize("square", n, || {
                runs.set(runs.get() + 1);
                n * n
            })
        };
        assert_eq!(square(3), 9);
        assert_eq!(square(3), 9);
        assert_eq!(square(4), 16);
        assert_eq!(runs.get(), 2);
        assert_eq!(cache.len_of::<u32, u32>("square"), 2);
    }

    #[test]
    fn global_slot_is_shared() {
        let cache = MemoCache::new();
        assert_eq!(cache.memoize_global("answer", || 42), 42);
        assert_eq!(cache.memoize_global("answer", || 0), 42);
        // Same name, different types: a different slot.
        assert_eq!(cache.memoize_global("answer", || "forty-two"), "forty-two");
    }

    #[test]
    fn reentrant_thunk_first_value_wins() {
        let cache = MemoCache::new();
        let value = cache.memoize("outer", 1u8, || {
            let inner = cache.memoize("outer", 1u8, || "inner".to_string());
            assert_eq!(inner, "inner");
            "outer".to_string()
        });
        assert_eq!(value, "inner");
    }
}
