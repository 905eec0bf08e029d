//! Hash container - chained hashing with pluggable key policies
//!
//! Design: Separate chaining over a power-of-two bucket array:
//! - Each bucket is a singly linked chain, new nodes linked at the head
//! - Node hash cached at insertion, reused on every rehash
//! - Grows to the next power of two once `len` exceeds the bucket count
//! - Keys and values are moved in and handed back out (no ownership callbacks)
//!
//! Backs the type registry and is used directly wherever the engine needs a
//! keyed container over names or object identities.

mod capacity;
mod container;
mod cursor;
mod keys;


pub use capacity::{floor_power_of_two, round_capacity};
pub use container::{HashContainer, Iter};
pub use cursor::Cursor;
pub use keys::{FnKeys, IdentityKeys, KeyPolicy, StdKeys};
pub(crate) use keys::mix_address;
