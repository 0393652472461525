//! XLLR loader (§4.4): locates and dlopens the central dispatcher exactly
//! once per process, resolves its C ABI, and exposes `Cdt`/`Cdts`
//! conversion to and from the raw wire types it speaks.
//!
//! "Loaded exactly once per process; subsequent requests return the
//! cached handle" (§4.4) is implemented by `global()`, a lazily
//! initialized, mutex-guarded singleton — the only piece of true global
//! mutable state this crate carries (design note §9).

mod abi;
mod discovery;
mod dispatcher;
mod env;
mod error;
mod library;
mod marshal;

pub use abi::{
    OutErr, RawCallable, RawCdt, RawCdtPayload, RawCdts, RawHandle, RawTypeInfo, RawXCall,
};
pub use discovery::{dispatcher_filename, load_dispatcher};
pub use dispatcher::{DlDispatcher, Dispatcher};
pub use env::Environment;
pub use error::XllrError;
pub use library::Library;
pub use marshal::{
    cdts_from_raw, cdts_to_raw, free_raw_cdts, free_raw_type_infos, type_info_from_raw, type_info_to_raw,
    type_infos_to_raw, Allocator,
};

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::sync::Arc;

static GLOBAL: OnceCell<Mutex<Option<Arc<DlDispatcher>>>> = OnceCell::new();

/// Return the process-wide dispatcher, loading it on first use (§4.4).
///
/// Subsequent calls return the same `Arc` without touching the platform
/// loader again, even across threads.
pub fn global(env: &Environment) -> Result<Arc<DlDispatcher>, XllrError> {
    let cell = GLOBAL.get_or_init(|| Mutex::new(None));
    let mut guard = cell.lock();
    if let Some(existing) = guard.as_ref() {
        return Ok(Arc::clone(existing));
    }
    let dispatcher = Arc::new(DlDispatcher::discover(env)?);
    *guard = Some(Arc::clone(&dispatcher));
    Ok(dispatcher)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_surfaces_installation_missing_without_a_real_dispatcher() {
        let env = Environment {
            metaffi_home: None,
            ..Default::default()
        };
        let err = global(&env).unwrap_err();
        assert!(matches!(err, XllrError::InstallationMissing) || matches!(err, XllrError::LoadFailed { .. }));
    }
}
