//! Runtime type descriptors
//!
//! Immutable per-type metadata shared by the registry, child types and
//! every live instance of the type.

use core::fmt;
use core::ptr::{self, NonNull};
use std::sync::Arc;

use crate::logging::log_type_finalized;
use crate::name::Name;

/// Per-level destructor.
///
/// Receives the instance's data pointer (first payload byte). Releases only
/// what its own level introduced; the parent chain is walked by the runtime.
pub type Destructor = unsafe fn(NonNull<u8>);

/// Shared handle to a descriptor
pub type TypeRef = Arc<TypeDescriptor>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Primitive,
    Enumeration,
    Composite,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive => write!(f, "primitive"),
            Self::Enumeration => write!(f, "enumeration"),
            Self::Composite => write!(f, "composite"),
        }
    }
}

pub struct TypeDescriptor {
    name: Name,
    kind: TypeKind,
    size: usize,
    parent: Option<TypeRef>,
    destructor: Option<Destructor>,
}

impl TypeDescriptor {
    pub(crate) fn new(
        name: Name,
        kind: TypeKind,
        size: usize,
        parent: Option<TypeRef>,
        destructor: Option<Destructor>,
    ) -> Self {
        Self {
            name,
            kind,
            size,
            parent,
            destructor,
        }
    }

    #[inline]
    pub fn name(&self) -> &Name {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Value size in bytes; for composites, the payload size of an instance
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn parent(&self) -> Option<&TypeRef> {
        self.parent.as_ref()
    }

    #[inline]
    pub fn destructor(&self) -> Option<Destructor> {
        self.destructor
    }

    #[inline]
    pub fn is_composite(&self) -> bool {
        self.kind == TypeKind::Composite
    }

    /// This type, then each parent up to the root
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors { next: Some(self) }
    }

    /// Number of parents above this type
    pub fn depth(&self) -> usize {
        self.ancestors().count() - 1
    }

    /// Subtype test used to validate casts.
    ///
    /// Primitive and enumeration types only match themselves; a composite
    /// matches any type on its parent chain, itself included.
    pub fn is_descendant_or_equal(&self, ancestor: &TypeDescriptor) -> bool {
        match self.kind {
            TypeKind::Primitive | TypeKind::Enumeration => ptr::eq(self, ancestor),
            TypeKind::Composite => self.ancestors().any(|ty| ptr::eq(ty, ancestor)),
        }
    }
}

impl Drop for TypeDescriptor {
    fn drop(&mut self) {
        log_type_finalized(&self.name);
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("size", &self.size)
            .field("parent", &self.parent.as_ref().map(|p| p.name()))
            .field("has_destructor", &self.destructor.is_some())
            .finish()
    }
}

/// Walk from a type up its parent chain
pub struct Ancestors<'a> {
    next: Option<&'a TypeDescriptor>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a TypeDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent.as_deref();
        Some(current)
    }
}
