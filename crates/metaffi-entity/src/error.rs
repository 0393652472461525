//! Errors raised while parsing an entity path or loading an entity
//! (§4.6, §7).

use metaffi_registry::RegistryError;
use metaffi_xllr::XllrError;

#[derive(Debug, thiserror::Error)]
pub enum EntityError {
    /// A `key=value` segment had more than one `=`.
    #[error("invalid entity path: {0}")]
    InvalidPath(String),

    /// More than `i8::MAX` param or retval type descriptors were supplied
    /// (§4.6 point 2, "requires both lists to fit in signed 8 bits").
    #[error("{what} list has {len} entries, which does not fit in a signed 8-bit count")]
    TooManyTypes { what: &'static str, len: usize },

    /// `load_entity` returned a null stub with no error string (§7).
    #[error("entity not found: runtime={runtime} module={module} path={entity_path}")]
    EntityNotFound {
        runtime: String,
        module: String,
        entity_path: String,
    },

    #[error(transparent)]
    Xllr(#[from] XllrError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
