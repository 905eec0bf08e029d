//! Object system - reference-counted instances of composite types
//!
//! Design: One allocation per instance:
//! - `ObjectHeader` carries the count, block size and exact type
//! - The payload follows at `HEADER_SIZE`, aligned to `OBJECT_ALIGN`
//! - The last release walks the type's parent chain running each level's
//!   destructor, most-derived first, then frees the block
//!
//! Handles (`Object`) are the Rust-side owners; the C ABI works on raw data
//! pointers through `Object::retain_raw` / `Object::release_raw`.

mod handle;
mod header;


pub use handle::Object;
pub use header::{ObjectHeader, HEADER_SIZE, OBJECT_ALIGN};
