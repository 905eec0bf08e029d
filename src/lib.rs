//! objcore - object model runtime for the engine
//!
//! Reference-counted objects with an exact runtime type, a single-inheritance
//! type registry, interned names and the chained hash container backing them.
//! Linked statically into native hosts through the C ABI in [`ffi`].

pub mod config;
pub mod error;
pub mod ffi;
pub mod hash;
pub mod logging;
pub mod name;
pub mod object;
pub mod types;

// Re-export core types
pub use config::RuntimeConfig;
pub use error::{ErrorKind, Result, RuntimeError};
pub use hash::{HashContainer, KeyPolicy};
pub use name::{Name, NameInterner};
pub use object::Object;
pub use types::{is_descendant_or_equal, TypeDecl, TypeDescriptor, TypeKind, TypeRef, TypeRegistry};

/// Runtime initialization: logging from the environment, then the global registry
pub fn init() -> Result<()> {
    logging::init();
    types::global::open()
}

pub fn init_with_config(config: &RuntimeConfig) -> Result<()> {
    logging::init_with_config(config.to_log_config());
    types::global::open_with(&config.registry)
}

/// Runtime cleanup
pub fn shutdown() -> Result<()> {
    types::global::close()
}
