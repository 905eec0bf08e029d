//! Runtime type hierarchy - single inheritance over named descriptors
//!
//! Design: Descriptors are immutable and shared through `Arc`:
//! 1. The registry holds one share per declared type
//! 2. Each child type holds a share of its parent
//! 3. Each live instance holds a share of its exact type
//!
//! The parent chain drives both the subtype test and the destructor walk
//! run when an instance's last reference goes away.

mod descriptor;
mod registry;
pub mod global;

#[cfg(test)]
mod tests;

pub use descriptor::{Ancestors, Destructor, TypeDescriptor, TypeKind, TypeRef};
pub use registry::{TypeDecl, TypeRegistry};

/// True when `ty` is `ancestor` or, for composites, derives from it
#[inline]
pub fn is_descendant_or_equal(ty: &TypeDescriptor, ancestor: &TypeDescriptor) -> bool {
    ty.is_descendant_or_equal(ancestor)
}
