use std::borrow::Borrow;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::LinkedList;

const INITIAL_CAPACITY: usize = 16;
const LOAD_FACTOR: f64 = 0.75;

/// One slot of a bucket chain.
struct Entry<K, V> {
    key: K,
    value: V,
    next: Option<Box<Entry<K, V>>>,
}

/// Separate-chaining hash table.
///
/// Starts with 16 buckets and doubles whenever an insertion would bring the
/// load factor to 0.75, so `len / capacity < 0.75` holds after every `put`.
/// Not synchronised: owners that share a table across tasks wrap it in a lock.
pub struct HashTable<K, V> {
    buckets: Vec<Option<Box<Entry<K, V>>>>,
    len: usize,
}

impl<K: Hash + Eq, V> HashTable<K, V> {
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buckets: Self::empty_buckets(capacity.max(1)),
            len: 0,
        }
    }

    fn empty_buckets(capacity: usize) -> Vec<Option<Box<Entry<K, V>>>> {
        (0..capacity).map(|_| None).collect()
    }

    fn bucket_index<Q>(&self, key: &Q) -> usize
    where
        Q: Hash + ?Sized,
    {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.buckets.len() as u64) as usize
    }

    /// Insert or update. Returns the previous value when the key was present.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        if let Some(existing) = self.get_mut(&key) {
            return Some(std::mem::replace(existing, value));
        }

        self.grow_if_needed();
        self.push_front(key, value);
        None
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut cursor = self.buckets[self.bucket_index(key)].as_deref();
        while let Some(entry) = cursor {
            if entry.key.borrow() == key {
                return Some(&entry.value);
            }
            cursor = entry.next.as_deref();
        }
        None
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.bucket_index(key);
        let mut cursor = self.buckets[index].as_deref_mut();
        while let Some(entry) = cursor {
            if entry.key.borrow() == key {
                return Some(&mut entry.value);
            }
            cursor = entry.next.as_deref_mut();
        }
        None
    }

    pub fn get_or_default<Q>(&self, key: &Q, default: V) -> V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.get(key).cloned().unwrap_or(default)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Unlink the entry for `key` and hand back its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.bucket_index(key);
        let mut cursor = &mut self.buckets[index];
        while cursor
            .as_ref()
            .is_some_and(|entry| entry.key.borrow() != key)
        {
            cursor = &mut cursor.as_mut()?.next;
        }

        let removed = cursor.take()?;
        let Entry { value, next, .. } = *removed;
        *cursor = next;
        self.len -= 1;
        Some(value)
    }

    /// Return the value for `key`, computing and storing it when absent.
    ///
    /// When `compute` yields `None` nothing is stored, so a later call will
    /// run `compute` again.
    pub fn compute_if_absent<F>(&mut self, key: K, compute: F) -> Option<&mut V>
    where
        F: FnOnce(&K) -> Option<V>,
    {
        if self.contains_key(&key) {
            return self.get_mut(&key);
        }

        let value = compute(&key)?;
        self.grow_if_needed();
        let index = self.push_front(key, value);
        self.buckets[index].as_deref_mut().map(|entry| &mut entry.value)
    }

    /// Every key, bucket by bucket and then down each chain.
    pub fn key_set(&self) -> LinkedList<K>
    where
        K: Clone,
    {
        self.iter().map(|(key, _)| key.clone()).collect()
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: self.buckets.iter(),
            current: None,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    fn grow_if_needed(&mut self) {
        if (self.len + 1) as f64 / self.buckets.len() as f64 >= LOAD_FACTOR {
            self.resize(self.buckets.len() * 2);
        }
    }

    fn push_front(&mut self, key: K, value: V) -> usize {
        let index = self.bucket_index(&key);
        let next = self.buckets[index].take();
        self.buckets[index] = Some(Box::new(Entry { key, value, next }));
        self.len += 1;
        index
    }

    fn resize(&mut self, new_capacity: usize) {
        let old = std::mem::replace(&mut self.buckets, Self::empty_buckets(new_capacity));
        self.len = 0;

        for mut slot in old {
            while let Some(entry) = slot {
                let Entry { key, value, next } = *entry;
                slot = next;
                self.push_front(key, value);
            }
        }
    }
}

impl<K: Hash + Eq, V> Default for HashTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq + fmt::Debug, V: fmt::Debug> fmt::Debug for HashTable<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Borrowing iterator over `(key, value)` pairs.
pub struct Iter<'a, K, V> {
    buckets: std::slice::Iter<'a, Option<Box<Entry<K, V>>>>,
    current: Option<&'a Entry<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.current {
                self.current = entry.next.as_deref();
                return Some((&entry.key, &entry.value));
            }
            self.current = self.buckets.next()?.as_deref();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_last_write_wins() {
        let mut table = HashTable::new();
        assert_eq!(table.put("alpha".to_string(), 1), None);
        assert_eq!(table.put("beta".to_string(), 2), None);
        assert_eq!(table.put("alpha".to_string(), 3), Some(1));

        assert_eq!(table.get("alpha"), Some(&3));
        assert_eq!(table.get("beta"), Some(&2));
        assert_eq!(table.get("gamma"), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_size_tracks_distinct_keys_minus_removed() {
        let mut table = HashTable::new();
        for i in 0..10 {
            table.put(i, i * 10);
        }
        for i in 0..10 {
            table.put(i % 5, i);
        }
        assert_eq!(table.len(), 10);

        assert_eq!(table.remove(&3), Some(8));
        assert_eq!(table.remove(&7), Some(70));
        assert_eq!(table.remove(&7), None);
        assert_eq!(table.len(), 8);
        assert!(!table.contains_key(&3));
    }

    #[test]
    fn test_resize_preserves_entries() {
        let mut table = HashTable::new();
        assert_eq!(table.capacity(), 16);

        for i in 0..200u32 {
            table.put(format!("key-{}", i), i);
            assert!((table.len() as f64 / table.capacity() as f64) < LOAD_FACTOR);
        }
        for i in (0..200u32).step_by(3) {
            table.put(format!("key-{}", i), i + 1000);
        }

        assert!(table.capacity() >= 256);
        for i in 0..200u32 {
            let expected = if i % 3 == 0 { i + 1000 } else { i };
            assert_eq!(table.get(format!("key-{}", i).as_str()), Some(&expected));
        }
    }

    #[test]
    fn test_resize_triggers_at_threshold() {
        let mut table = HashTable::new();
        for i in 0..11 {
            table.put(i, ());
        }
        assert_eq!(table.capacity(), 16);

        table.put(11, ());
        assert_eq!(table.capacity(), 32);
        assert_eq!(table.len(), 12);
    }

    #[test]
    fn test_remove_from_chain_middle() {
        // single bucket forces every key onto one chain
        let mut table = HashTable::with_capacity(1);
        for i in 0..3 {
            table.push_front(i, i);
        }
        assert_eq!(table.remove(&1), Some(1));
        assert_eq!(table.get(&0), Some(&0));
        assert_eq!(table.get(&2), Some(&2));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_compute_if_absent() {
        let mut table: HashTable<String, Vec<u8>> = HashTable::new();
        let mut calls = 0;

        assert!(table
            .compute_if_absent("skip".to_string(), |_| {
                calls += 1;
                None
            })
            .is_none());
        assert!(!table.contains_key("skip"));

        if let Some(values) = table.compute_if_absent("skip".to_string(), |_| {
            calls += 1;
            Some(Vec::new())
        }) {
            values.push(7);
        }
        assert_eq!(calls, 2);

        if let Some(values) = table.compute_if_absent("skip".to_string(), |_| {
            calls += 1;
            Some(Vec::new())
        }) {
            values.push(8);
        }
        assert_eq!(calls, 2);
        assert_eq!(table.get("skip"), Some(&vec![7, 8]));
    }

    #[test]
    fn test_key_set_and_get_or_default() {
        let mut table = HashTable::new();
        for word in ["red", "green", "blue"] {
            table.put(word.to_string(), word.len());
        }

        let keys = table.key_set();
        assert_eq!(keys.len(), 3);
        for word in ["red", "green", "blue"] {
            assert!(keys.contains(&word.to_string()));
        }

        assert_eq!(table.get_or_default("green", 0), 5);
        assert_eq!(table.get_or_default("purple", 0), 0);
        assert_eq!(table.iter().count(), 3);
    }
}
