//! Interned names - refcounted immutable byte strings with a cached hash
//!
//! Names key the type registry and any container that wants string keys
//! without rehashing them. Equality compares contents; two equal names may
//! be different allocations unless they came from the same [`NameInterner`].

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::hash::{HashContainer, KeyPolicy};

struct NameData {
    hash: u64,
    bytes: Box<[u8]>,
}

/// Shared immutable name; `clone` retains, `drop` releases
#[derive(Clone)]
pub struct Name(Arc<NameData>);

/// Content hash used for every name (deterministic across runs)
fn content_hash(bytes: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    hasher.write(bytes);
    hasher.finish()
}

impl Name {
    pub fn new(bytes: impl AsRef<[u8]>) -> Self {
        let bytes = bytes.as_ref();
        Self(Arc::new(NameData {
            hash: content_hash(bytes),
            bytes: bytes.into(),
        }))
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0.bytes
    }

    /// Contents as text, if they are valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0.bytes).ok()
    }

    /// Precomputed content hash
    #[inline]
    pub fn hash_value(&self) -> u64 {
        self.0.hash
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.bytes.is_empty()
    }

    /// Number of live handles sharing this allocation
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    /// True when both handles share one allocation
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || (self.len() == other.len() && self.as_bytes() == other.as_bytes())
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash);
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Name {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.as_bytes()))
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", String::from_utf8_lossy(self.as_bytes()))
    }
}

/// Key policy that reuses the hash cached inside each name
#[derive(Debug, Clone, Copy, Default)]
pub struct NameKeys;

impl KeyPolicy<Name> for NameKeys {
    #[inline]
    fn hash_key(&self, key: &Name) -> u64 {
        key.hash_value()
    }

    #[inline]
    fn key_eq(&self, a: &Name, b: &Name) -> bool {
        a == b
    }
}

/// Deduplicating name table: equal contents map to one shared allocation
pub struct NameInterner {
    names: HashContainer<Name, (), NameKeys>,
}

impl NameInterner {
    pub fn new() -> Self {
        Self {
            names: HashContainer::with_keys(NameKeys),
        }
    }

    /// Shared name for `bytes`, creating it on first use
    pub fn intern(&mut self, bytes: impl AsRef<[u8]>) -> Name {
        let candidate = Name::new(bytes);
        if let Some(existing) = self.names.get_key(&candidate) {
            return existing.clone();
        }
        self.names.insert(candidate.clone(), ());
        candidate
    }

    pub fn get(&self, bytes: impl AsRef<[u8]>) -> Option<Name> {
        self.names.get_key(&Name::new(bytes)).cloned()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Forget names nobody outside the table holds any more
    pub fn purge(&mut self) -> usize {
        let mut purged = 0;
        let mut cursor = self.names.cursor();
        while let Some((name, _)) = cursor.current() {
            if name.ref_count() == 1 {
                cursor.remove_current();
                purged += 1;
            } else {
                cursor.advance();
            }
        }
        purged
    }
}

impl Default for NameInterner {
    fn default() -> Self {
        Self::new()
    }
}
