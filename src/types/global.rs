//! Process-wide registry for hosts that cannot thread a handle through
//!
//! One registry behind a lock, open between [`open`] and [`close`]. Every
//! call made outside that window fails with `InvalidArgument`.
//!
//! The lock is held while a [`with`] closure runs, so destructors and
//! closures must not call back into this module.

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use super::descriptor::{Destructor, TypeKind, TypeRef};
use super::registry::{TypeDecl, TypeRegistry};
use crate::config::RegistryConfig;
use crate::error::{Result, RuntimeError};
use crate::name::Name;

static GLOBAL: Lazy<Mutex<Option<TypeRegistry>>> = Lazy::new(|| Mutex::new(None));

pub fn open() -> Result<()> {
    open_with(&RegistryConfig::default())
}

pub fn open_with(config: &RegistryConfig) -> Result<()> {
    let mut slot = GLOBAL.lock();
    if slot.is_some() {
        return Err(RuntimeError::exists("global type registry is already open"));
    }
    *slot = Some(TypeRegistry::open_with(config)?);
    Ok(())
}

/// Close the global registry, releasing its share of every type
pub fn close() -> Result<()> {
    let registry = GLOBAL
        .lock()
        .take()
        .ok_or_else(|| RuntimeError::invalid_argument("global type registry is not open"))?;
    // Descriptors are finalized outside the lock
    registry.close();
    Ok(())
}

pub fn is_open() -> bool {
    GLOBAL.lock().is_some()
}

/// Run `f` against the open registry
pub fn with<R>(f: impl FnOnce(&mut TypeRegistry) -> Result<R>) -> Result<R> {
    let mut slot = GLOBAL.lock();
    let registry = slot
        .as_mut()
        .ok_or_else(|| RuntimeError::invalid_argument("global type registry is not open"))?;
    f(registry)
}

pub fn register(
    name: impl Into<Name>,
    kind: TypeKind,
    value_size: usize,
    parent: Option<&TypeRef>,
    destructor: Option<Destructor>,
) -> Result<TypeRef> {
    with(|registry| registry.register(name, kind, value_size, parent, destructor))
}

pub fn declare(decl: TypeDecl) -> Result<TypeRef> {
    with(|registry| registry.declare(decl))
}

pub fn lookup(name: &str) -> Result<TypeRef> {
    with(|registry| registry.lookup(name))
}

pub fn root() -> Result<TypeRef> {
    with(|registry| Ok(TypeRef::clone(registry.root())))
}
