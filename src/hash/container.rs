//! Chained hash container

use core::fmt;
use core::mem;

use super::capacity::round_capacity;
use super::cursor::Cursor;
use super::keys::{KeyPolicy, StdKeys};
use crate::error::{self, Result, RuntimeError};
use crate::logging::log_container_grow;

pub(super) type Link<K, V> = Option<Box<Node<K, V>>>;

pub(super) struct Node<K, V> {
    pub(super) hash: u64,
    pub(super) key: K,
    pub(super) value: V,
    pub(super) next: Link<K, V>,
}

/// Keyed container with separate chaining and a pluggable [`KeyPolicy`].
///
/// Invariants:
/// - `len` equals the number of nodes reachable from `buckets`
/// - `buckets.len()` is a power of two
/// - a node's `hash` is `keys.hash_key(&key)` at insertion time
pub struct HashContainer<K, V, P = StdKeys> {
    pub(super) buckets: Vec<Link<K, V>>,
    pub(super) len: usize,
    keys: P,
}

/// Largest bucket count whose array size still fits in `isize`
#[inline]
fn max_buckets<K, V>() -> usize {
    isize::MAX as usize / mem::size_of::<Link<K, V>>()
}

#[inline]
pub(super) fn bucket_index(hash: u64, bucket_count: usize) -> usize {
    ((hash ^ (hash >> 32)) as usize) & (bucket_count - 1)
}

fn empty_buckets<K, V>(count: usize) -> Result<Vec<Link<K, V>>> {
    let mut buckets = Vec::new();
    buckets
        .try_reserve_exact(count)
        .map_err(|_| RuntimeError::allocation_failed(format!("{} buckets", count)))?;
    buckets.resize_with(count, || None);
    Ok(buckets)
}

impl<K, V> HashContainer<K, V, StdKeys>
where
    K: core::hash::Hash + Eq,
{
    /// Empty container with the smallest bucket array
    pub fn new() -> Self {
        Self::with_keys(StdKeys::default())
    }

    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Self::with_capacity_and_keys(capacity, StdKeys::default())
    }
}

impl<K, V> Default for HashContainer<K, V, StdKeys>
where
    K: core::hash::Hash + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, P: KeyPolicy<K>> HashContainer<K, V, P> {
    pub fn with_keys(keys: P) -> Self {
        Self {
            buckets: vec![None],
            len: 0,
            keys,
        }
    }

    /// Container whose bucket array is `capacity` rounded up to a power of two
    pub fn with_capacity_and_keys(capacity: usize, keys: P) -> Result<Self> {
        let count = round_capacity(capacity, max_buckets::<K, V>(), false)?;
        Ok(Self {
            buckets: empty_buckets(count)?,
            len: 0,
            keys,
        })
    }

    pub fn key_policy(&self) -> &P {
        &self.keys
    }

    fn find(&self, key: &K) -> Option<&Node<K, V>> {
        let hash = self.keys.hash_key(key);
        let mut cur = self.buckets[bucket_index(hash, self.buckets.len())].as_deref();
        while let Some(node) = cur {
            if node.hash == hash && self.keys.key_eq(&node.key, key) {
                return Some(node);
            }
            cur = node.next.as_deref();
        }
        None
    }

    fn find_mut(&mut self, key: &K) -> Option<&mut Node<K, V>> {
        let hash = self.keys.hash_key(key);
        let keys = &self.keys;
        let index = bucket_index(hash, self.buckets.len());
        let mut cur = self.buckets[index].as_deref_mut();
        while let Some(node) = cur {
            if node.hash == hash && keys.key_eq(&node.key, key) {
                return Some(node);
            }
            cur = node.next.as_deref_mut();
        }
        None
    }

    /// Insert `key -> value`.
    ///
    /// An existing equal key fails with `Exists` unless `replace` is set, in
    /// which case the stored pair is swapped in place and handed back.
    pub fn set(&mut self, key: K, value: V, replace: bool) -> Result<Option<(K, V)>> {
        let hash = self.keys.hash_key(&key);
        let index = bucket_index(hash, self.buckets.len());

        if let Some(node) = self.find_mut(&key) {
            if !replace {
                return Err(RuntimeError::exists("key already present"));
            }
            let old_key = mem::replace(&mut node.key, key);
            let old_value = mem::replace(&mut node.value, value);
            return Ok(Some((old_key, old_value)));
        }

        let next = self.buckets[index].take();
        self.buckets[index] = Some(Box::new(Node {
            hash,
            key,
            value,
            next,
        }));
        self.len += 1;

        if self.len > self.buckets.len() {
            self.grow();
        }
        Ok(None)
    }

    /// Insert or overwrite, returning the previous value if there was one
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.set(key, value, true).ok().flatten().map(|(_, v)| v)
    }

    pub fn get(&self, key: &K) -> Result<&V> {
        self.find(key)
            .map(|node| &node.value)
            .ok_or_else(|| RuntimeError::not_found("no entry for key"))
    }

    pub fn get_mut(&mut self, key: &K) -> Result<&mut V> {
        self.find_mut(key)
            .map(|node| &mut node.value)
            .ok_or_else(|| RuntimeError::not_found("no entry for key"))
    }

    /// Stored key equal to `key`, useful when keys are shared handles
    pub fn get_key(&self, key: &K) -> Option<&K> {
        self.find(key).map(|node| &node.key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Unlink the entry for `key` and hand back the stored pair
    pub fn remove(&mut self, key: &K) -> Result<(K, V)> {
        let hash = self.keys.hash_key(key);
        let keys = &self.keys;
        let index = bucket_index(hash, self.buckets.len());

        let mut link = &mut self.buckets[index];
        loop {
            match link.as_deref() {
                None => return Err(RuntimeError::not_found("no entry for key")),
                Some(node) if node.hash == hash && keys.key_eq(&node.key, key) => break,
                Some(_) => {}
            }
            if let Some(node) = link {
                link = &mut node.next;
            }
        }

        let Some(mut node) = link.take() else {
            return Err(RuntimeError::not_found("no entry for key"));
        };
        *link = node.next.take();
        self.len -= 1;
        let Node { key, value, .. } = *node;
        Ok((key, value))
    }

    /// Cursor over every entry that may remove the entry it sits on
    pub fn cursor(&mut self) -> Cursor<'_, K, V, P> {
        Cursor::new(self)
    }

    /// Grow to the next power of two holding `len` and rehash every node.
    ///
    /// A size that cannot be represented leaves the current array in place;
    /// chains simply get longer.
    fn grow(&mut self) {
        let from = self.buckets.len();
        let target = error::probe(|| {
            round_capacity(self.len, max_buckets::<K, V>(), true).and_then(empty_buckets::<K, V>)
        });
        let Ok(mut buckets) = target else {
            return;
        };
        let to = buckets.len();
        if to <= from {
            return;
        }

        for mut link in mem::take(&mut self.buckets) {
            while let Some(mut node) = link {
                link = node.next.take();
                let index = bucket_index(node.hash, to);
                node.next = buckets[index].take();
                buckets[index] = Some(node);
            }
        }
        self.buckets = buckets;

        log_container_grow(from, to, self.len);
    }
}

impl<K, V, P> HashContainer<K, V, P> {
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current bucket count
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: self.buckets.iter(),
            node: None,
            remaining: self.len,
        }
    }

    /// Drop every entry, keeping the bucket array
    pub fn clear(&mut self) {
        for bucket in self.buckets.iter_mut() {
            // Unlink iteratively so long chains cannot overflow the stack
            let mut link = bucket.take();
            while let Some(mut node) = link {
                link = node.next.take();
            }
        }
        self.len = 0;
    }
}

impl<K, V, P> Drop for HashContainer<K, V, P> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<K: fmt::Debug, V: fmt::Debug, P> fmt::Debug for HashContainer<K, V, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Borrowing iterator in bucket order, then chain order
pub struct Iter<'a, K, V> {
    buckets: core::slice::Iter<'a, Link<K, V>>,
    node: Option<&'a Node<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(node) = self.node {
                self.node = node.next.as_deref();
                self.remaining -= 1;
                return Some((&node.key, &node.value));
            }
            self.node = self.buckets.next()?.as_deref();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<'a, K, V, P> IntoIterator for &'a HashContainer<K, V, P> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
