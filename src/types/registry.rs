//! Type registry - name-keyed table of declared types
//!
//! Every registry is opened with a root composite type; composites declared
//! without a parent hang off it. Closing the registry drops its share of
//! every descriptor; descriptors still referenced by live instances or by
//! types held elsewhere survive until those go away.

use core::fmt;

use super::descriptor::{Destructor, TypeDescriptor, TypeKind, TypeRef};
use crate::config::RegistryConfig;
use crate::error::{Result, RuntimeError};
use crate::hash::{HashContainer, Iter};
use crate::logging::{log_duplicate_type, log_registry_close, log_registry_open, log_type_registered, perf};
use crate::name::{Name, NameKeys};

/// Builder for one type declaration
#[derive(Clone)]
pub struct TypeDecl {
    name: Name,
    kind: TypeKind,
    size: usize,
    parent: Option<TypeRef>,
    destructor: Option<Destructor>,
}

impl TypeDecl {
    pub fn new(name: impl Into<Name>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            size: 0,
            parent: None,
            destructor: None,
        }
    }

    pub fn composite(name: impl Into<Name>) -> Self {
        Self::new(name, TypeKind::Composite)
    }

    pub fn primitive(name: impl Into<Name>, size: usize) -> Self {
        Self::new(name, TypeKind::Primitive).size(size)
    }

    pub fn enumeration(name: impl Into<Name>, size: usize) -> Self {
        Self::new(name, TypeKind::Enumeration).size(size)
    }

    pub fn parent(mut self, parent: &TypeRef) -> Self {
        self.parent = Some(TypeRef::clone(parent));
        self
    }

    /// Value size; for composites, the instance payload size
    pub fn size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Size the payload to hold a `T`
    pub fn payload<T>(self) -> Self {
        self.size(core::mem::size_of::<T>())
    }

    pub fn destructor(mut self, destructor: Destructor) -> Self {
        self.destructor = Some(destructor);
        self
    }
}

impl fmt::Debug for TypeDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDecl")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("size", &self.size)
            .field("parent", &self.parent.as_ref().map(|p| p.name()))
            .finish()
    }
}

pub struct TypeRegistry {
    types: HashContainer<Name, TypeRef, NameKeys>,
    root: TypeRef,
}

impl TypeRegistry {
    /// Open a registry with default settings
    pub fn open() -> Result<Self> {
        Self::open_with(&RegistryConfig::default())
    }

    pub fn open_with(config: &RegistryConfig) -> Result<Self> {
        let root_name = Name::from(config.root_name.as_str());
        if root_name.is_empty() {
            return Err(RuntimeError::invalid_argument("root type name is empty"));
        }

        let mut types = HashContainer::with_capacity_and_keys(config.initial_capacity, NameKeys)?;
        let root = TypeRef::new(TypeDescriptor::new(
            root_name.clone(),
            TypeKind::Composite,
            0,
            None,
            None,
        ));
        types.set(root_name, TypeRef::clone(&root), false)?;

        log_registry_open(types.capacity());
        Ok(Self { types, root })
    }

    /// Root composite type every hierarchy ends at
    #[inline]
    pub fn root(&self) -> &TypeRef {
        &self.root
    }

    /// Declare a type. Re-declaring a name fails with `Exists`.
    pub fn register(
        &mut self,
        name: impl Into<Name>,
        kind: TypeKind,
        value_size: usize,
        parent: Option<&TypeRef>,
        destructor: Option<Destructor>,
    ) -> Result<TypeRef> {
        let mut decl = TypeDecl::new(name, kind).size(value_size);
        decl.parent = parent.cloned();
        decl.destructor = destructor;
        self.declare(decl)
    }

    /// Declare a type from a builder; returns the new descriptor
    pub fn declare(&mut self, decl: TypeDecl) -> Result<TypeRef> {
        let TypeDecl {
            name,
            kind,
            size,
            parent,
            destructor,
        } = decl;

        if name.is_empty() {
            return Err(RuntimeError::invalid_argument("type name is empty"));
        }
        if self.types.contains_key(&name) {
            log_duplicate_type(&name);
            return Err(RuntimeError::exists(format!("type '{}' already registered", name)));
        }

        let parent = match kind {
            TypeKind::Primitive | TypeKind::Enumeration => {
                if parent.is_some() {
                    return Err(RuntimeError::invalid_argument(format!(
                        "{} type '{}' cannot have a parent",
                        kind, name
                    )));
                }
                None
            }
            TypeKind::Composite => {
                let parent = parent.unwrap_or_else(|| TypeRef::clone(&self.root));
                self.check_parent(&name, size, &parent)?;
                Some(parent)
            }
        };

        let ty = TypeRef::new(TypeDescriptor::new(name.clone(), kind, size, parent, destructor));
        self.types.set(name, TypeRef::clone(&ty), false)?;

        log_type_registered(ty.name(), ty.parent().map(|p| p.name()));
        Ok(ty)
    }

    fn check_parent(&self, name: &Name, size: usize, parent: &TypeRef) -> Result<()> {
        if !parent.is_composite() {
            return Err(RuntimeError::invalid_argument(format!(
                "parent '{}' of '{}' is not a composite type",
                parent.name(),
                name
            )));
        }
        let registered = match self.types.get(parent.name()) {
            Ok(known) => TypeRef::ptr_eq(known, parent),
            Err(_) => false,
        };
        if !registered {
            return Err(RuntimeError::invalid_argument(format!(
                "parent '{}' of '{}' is not registered here",
                parent.name(),
                name
            )));
        }
        if size < parent.size() {
            return Err(RuntimeError::invalid_argument(format!(
                "'{}' payload ({} bytes) is smaller than parent '{}' ({} bytes)",
                name,
                size,
                parent.name(),
                parent.size()
            )));
        }
        Ok(())
    }

    /// Descriptor registered under `name`
    pub fn lookup(&self, name: &str) -> Result<TypeRef> {
        self.get(&Name::from(name))
    }

    pub fn get(&self, name: &Name) -> Result<TypeRef> {
        self.types
            .get(name)
            .map(TypeRef::clone)
            .map_err(|_| RuntimeError::not_found(format!("type '{}' is not registered", name)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(&Name::from(name))
    }

    /// Registered type count, root included
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn types(&self) -> Iter<'_, Name, TypeRef> {
        self.types.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &Name> + '_ {
        self.types.iter().map(|(name, _)| name)
    }

    /// Drop the registry's share of every descriptor
    pub fn close(self) {
        let _timer = perf::track("registry_close");
        log_registry_close(self.types.len());
        drop(self);
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("root", self.root.name())
            .field("types", &self.types.len())
            .finish()
    }
}
