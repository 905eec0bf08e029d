//! Removal-capable cursor over a hash container
//!
//! The cursor holds the container's `&mut` borrow, so no other mutation can
//! invalidate it. Position is (bucket, depth within chain); after a removal
//! the successor slides into the same depth.

use super::container::{HashContainer, Link, Node};
use super::keys::KeyPolicy;

pub struct Cursor<'a, K, V, P> {
    map: &'a mut HashContainer<K, V, P>,
    bucket: usize,
    depth: usize,
}

impl<'a, K, V, P: KeyPolicy<K>> Cursor<'a, K, V, P> {
    pub(super) fn new(map: &'a mut HashContainer<K, V, P>) -> Self {
        let mut cursor = Self {
            map,
            bucket: 0,
            depth: 0,
        };
        cursor.seek_bucket(0);
        cursor
    }

    /// Move to the first non-empty bucket at or after `from`
    fn seek_bucket(&mut self, from: usize) {
        self.depth = 0;
        self.bucket = self.map.buckets[from.min(self.map.buckets.len())..]
            .iter()
            .position(Option::is_some)
            .map_or(self.map.buckets.len(), |offset| from + offset);
    }

    fn node(&self) -> Option<&Node<K, V>> {
        let mut cur = self.map.buckets.get(self.bucket)?.as_deref();
        for _ in 0..self.depth {
            cur = cur?.next.as_deref();
        }
        cur
    }

    fn node_mut(&mut self) -> Option<&mut Node<K, V>> {
        let mut cur = self.map.buckets.get_mut(self.bucket)?.as_deref_mut();
        for _ in 0..self.depth {
            cur = cur?.next.as_deref_mut();
        }
        cur
    }

    fn link_mut(&mut self) -> Option<&mut Link<K, V>> {
        let mut link = self.map.buckets.get_mut(self.bucket)?;
        for _ in 0..self.depth {
            link = &mut link.as_mut()?.next;
        }
        Some(link)
    }

    /// Entry under the cursor, `None` once every entry has been visited
    pub fn current(&self) -> Option<(&K, &V)> {
        self.node().map(|node| (&node.key, &node.value))
    }

    pub fn current_mut(&mut self) -> Option<(&K, &mut V)> {
        self.node_mut().map(|node| (&node.key, &mut node.value))
    }

    pub fn is_done(&self) -> bool {
        self.bucket >= self.map.buckets.len()
    }

    /// Step to the next entry; returns false once exhausted
    pub fn advance(&mut self) -> bool {
        let has_next = match self.node() {
            Some(node) => node.next.is_some(),
            None => return false,
        };

        if has_next {
            self.depth += 1;
        } else {
            self.seek_bucket(self.bucket + 1);
        }
        !self.is_done()
    }

    /// Unlink the entry under the cursor and move onto its successor
    pub fn remove_current(&mut self) -> Option<(K, V)> {
        let link = self.link_mut()?;
        let mut node = link.take()?;
        *link = node.next.take();
        let chain_continues = link.is_some();

        self.map.len -= 1;
        if !chain_continues {
            self.seek_bucket(self.bucket + 1);
        }

        let Node { key, value, .. } = *node;
        Some((key, value))
    }
}
