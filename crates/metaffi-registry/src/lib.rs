//! Runtime-plugin registry (§4.5): a process-wide cache of which runtime
//! plugins have been loaded, keyed by their normalized `xllr.`-prefixed
//! name.

mod error;
mod name;
mod registry;

pub use error::RegistryError;
pub use name::normalize;
pub use registry::RuntimeRegistry;
