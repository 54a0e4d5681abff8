//! A small striped concurrent map: the lock registry and the memory access
//! table are both "lots of independent keys, each cheap to create, looked up
//! from every thread" workloads, so both are built on this instead of a
//! single global `RwLock<HashMap<..>>`, which would serialize unrelated
//! threads touching unrelated locks/addresses.
//!
//! Each shard is its own `RwLock<HashMap<K, Arc<V>>>`; the map never holds a
//! write lock longer than a single insert, and lookups of an already-present
//! key only ever take a read lock.

use crate::types::{Arc, RwLock};
use hashbrown::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

const DEFAULT_SHARDS: usize = 16;

pub struct ShardedMap<K, V> {
    shards: Vec<RwLock<HashMap<K, Arc<V>>>>,
}

impl<K, V> ShardedMap<K, V>
where
    K: Eq + Hash + Copy,
{
    pub fn new() -> ShardedMap<K, V> {
        ShardedMap::with_capacity(DEFAULT_SHARDS, 0)
    }

    pub fn with_capacity(shard_count: usize, capacity_hint: usize) -> ShardedMap<K, V> {
        let shard_count = shard_count.max(1);
        let per_shard = capacity_hint / shard_count;
        let shards = (0..shard_count)
            .map(|_| RwLock::new(HashMap::with_capacity(per_shard)))
            .collect();
        ShardedMap { shards }
    }

    fn shard_for(&self, key: &K) -> &RwLock<HashMap<K, Arc<V>>> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let index = (hasher.finish() as usize) % self.shards.len();
        &self.shards[index]
    }

    pub fn get(&self, key: K) -> Option<Arc<V>> {
        self.shard_for(&key).read().get(&key).cloned()
    }

    /// Fetch the entry for `key`, creating it with `make` if absent.
    /// Idempotent under concurrent callers: if two threads race to create
    /// the same key, both get back the same `Arc`.
    pub fn get_or_insert_with(&self, key: K, make: impl FnOnce() -> V) -> Arc<V> {
        if let Some(existing) = self.get(key) {
            return existing;
        }
        let shard = self.shard_for(&key);
        let mut guard = shard.write();
        Arc::clone(guard.entry(key).or_insert_with(|| Arc::new(make())))
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Default for ShardedMap<K, V>
where
    K: Eq + Hash + Copy,
{
    fn default() -> ShardedMap<K, V> {
        ShardedMap::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_on_empty_map_is_none() {
        let m: ShardedMap<u64, u32> = ShardedMap::new();
        assert!(m.get(1).is_none());
    }

    #[test]
    fn get_or_insert_with_creates_once() {
        let m: ShardedMap<u64, u32> = ShardedMap::new();
        let a = m.get_or_insert_with(1, || 42);
        let b = m.get_or_insert_with(1, || 99);
        assert_eq!(*a, 42);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn distinct_keys_coexist() {
        let m: ShardedMap<u64, u32> = ShardedMap::new();
        m.get_or_insert_with(1, || 1);
        m.get_or_insert_with(2, || 2);
        assert_eq!(m.len(), 2);
    }

    #[test]
    #[cfg(not(loom))]
    fn concurrent_inserts_of_the_same_key_linearize() {
        use std::thread;

        let m: Arc<ShardedMap<u64, u32>> = Arc::new(ShardedMap::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let m = Arc::clone(&m);
                thread::spawn(move || m.get_or_insert_with(7, || 7))
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for r in &results {
            assert!(Arc::ptr_eq(r, &results[0]));
        }
        assert_eq!(m.len(), 1);
    }
}
