//! Host-side FFI engine facade (§11): the public `Runtime`/`Module`/`Entity`
//! API a host binding embeds, wiring together the engine's lower crates
//! (type descriptors, CDT, serialization, XLLR dispatch, the runtime
//! registry, entity loading, and call dispatch).

mod error;
mod logging;
mod runtime;

pub use error::MetaffiError;
pub use logging::init_logging;
pub use runtime::{Entity, Module, Runtime, LOCAL_RUNTIME_ID};

pub use metaffi_cdt::{Callable, Cdts, Handle};
pub use metaffi_types::{MetaffiType, MetaffiTypeInfo};
