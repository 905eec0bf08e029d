//! Key policies - how a container hashes and compares its keys

use std::collections::hash_map::DefaultHasher;
use std::hash::{BuildHasher, BuildHasherDefault, Hash};
use std::rc::Rc;
use std::sync::Arc;

/// Hashing and equality for keys of type `K`.
///
/// Equal keys must produce equal hashes. The container calls `hash_key`
/// once per insertion and caches the result.
pub trait KeyPolicy<K: ?Sized> {
    fn hash_key(&self, key: &K) -> u64;
    fn key_eq(&self, a: &K, b: &K) -> bool;
}

/// `Hash + Eq` keys through a `BuildHasher` (deterministic SipHash by default)
#[derive(Debug, Clone, Default)]
pub struct StdKeys<S = BuildHasherDefault<DefaultHasher>> {
    build: S,
}

impl<S> StdKeys<S> {
    pub fn with_hasher(build: S) -> Self {
        Self { build }
    }
}

impl<K, S> KeyPolicy<K> for StdKeys<S>
where
    K: Hash + Eq + ?Sized,
    S: BuildHasher,
{
    #[inline]
    fn hash_key(&self, key: &K) -> u64 {
        self.build.hash_one(key)
    }

    #[inline]
    fn key_eq(&self, a: &K, b: &K) -> bool {
        a == b
    }
}

/// Pointer-identity keys: two keys are equal only if they are the same allocation
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityKeys;

/// Spread an address over all 64 bits; low bits of aligned pointers are zero
#[inline]
pub(crate) fn mix_address(addr: usize) -> u64 {
    (addr as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

impl<T: ?Sized> KeyPolicy<Arc<T>> for IdentityKeys {
    #[inline]
    fn hash_key(&self, key: &Arc<T>) -> u64 {
        mix_address(Arc::as_ptr(key) as *const u8 as usize)
    }

    #[inline]
    fn key_eq(&self, a: &Arc<T>, b: &Arc<T>) -> bool {
        Arc::ptr_eq(a, b)
    }
}

impl<T: ?Sized> KeyPolicy<Rc<T>> for IdentityKeys {
    #[inline]
    fn hash_key(&self, key: &Rc<T>) -> u64 {
        mix_address(Rc::as_ptr(key) as *const u8 as usize)
    }

    #[inline]
    fn key_eq(&self, a: &Rc<T>, b: &Rc<T>) -> bool {
        Rc::ptr_eq(a, b)
    }
}

impl<T> KeyPolicy<*const T> for IdentityKeys {
    #[inline]
    fn hash_key(&self, key: &*const T) -> u64 {
        mix_address(*key as usize)
    }

    #[inline]
    fn key_eq(&self, a: &*const T, b: &*const T) -> bool {
        core::ptr::eq(*a, *b)
    }
}

/// Plain function pair, for callers that hash on a projection of the key
pub struct FnKeys<K: ?Sized> {
    hash: fn(&K) -> u64,
    eq: fn(&K, &K) -> bool,
}

impl<K: ?Sized> FnKeys<K> {
    pub const fn new(hash: fn(&K) -> u64, eq: fn(&K, &K) -> bool) -> Self {
        Self { hash, eq }
    }
}

impl<K: ?Sized> Clone for FnKeys<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K: ?Sized> Copy for FnKeys<K> {}

impl<K: ?Sized> KeyPolicy<K> for FnKeys<K> {
    #[inline]
    fn hash_key(&self, key: &K) -> u64 {
        (self.hash)(key)
    }

    #[inline]
    fn key_eq(&self, a: &K, b: &K) -> bool {
        (self.eq)(a, b)
    }
}
