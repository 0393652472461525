//! Process-wide registry of loaded runtime plugins (§4.5).
//!
//! A plugin is never actually dlclosed during normal operation — several
//! embedded runtimes (Python's `Py_Finalize`, the JVM's `DestroyJavaVM`,
//! Go's lack of `dlclose`) corrupt process state if torn down. That
//! residency is entirely the external XLLR binary's concern: a runtime
//! plugin's `.so`/`.dylib`/`.dll` is dlopened inside the dispatcher we
//! talk to over `load_runtime_plugin`'s C ABI, not by this crate, so there
//! is no local library handle here to keep resident. This registry's job
//! is purely the name cache and idempotent load/release bookkeeping (the
//! `raya-pm` `Cache`'s "exists, store, idempotent re-store" shape, applied
//! to a process-lifetime name set instead of a filesystem).

use crate::error::RegistryError;
use crate::name::normalize;
use dashmap::DashSet;
use metaffi_xllr::Dispatcher;
use std::sync::Arc;
use tracing::{debug, warn};

/// Tracks which runtime plugins have been successfully loaded this
/// process, so a repeated `load_runtime_plugin` for the same name is a
/// cheap no-op rather than a redundant ABI call.
pub struct RuntimeRegistry {
    dispatcher: Arc<dyn Dispatcher>,
    loaded: DashSet<String>,
}

impl RuntimeRegistry {
    pub fn new(dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            dispatcher,
            loaded: DashSet::new(),
        }
    }

    /// Ensure `name` (normalized to carry the `xllr.` prefix) is loaded.
    ///
    /// Idempotent for a name already cached as loaded. A load failure is
    /// not cached (§4.9: "unrecoverable for that runtime ... subsequent
    /// loads retry"), so the next call re-attempts the ABI call.
    pub fn load_runtime_plugin(&self, name: &str) -> Result<(), RegistryError> {
        let normalized = normalize(name);
        if self.loaded.contains(&normalized) {
            debug!(component = "metaffi.registry", runtime = %normalized, "already loaded");
            return Ok(());
        }
        self.dispatcher.load_runtime_plugin(&normalized)?;
        self.loaded.insert(normalized);
        Ok(())
    }

    /// Release `name`. Idempotent: releasing a name that was never loaded
    /// (or already released) is a no-op (§4.5 "`release_runtime_plugin` is
    /// idempotent").
    pub fn release_runtime_plugin(&self, name: &str) -> Result<(), RegistryError> {
        let normalized = normalize(name);
        if self.loaded.remove(&normalized).is_none() {
            return Ok(());
        }
        if let Err(e) = self.dispatcher.free_runtime_plugin(&normalized) {
            warn!(component = "metaffi.registry", runtime = %normalized, error = %e, "free_runtime_plugin failed");
        }
        Ok(())
    }

    /// True if `name` is currently cached as loaded.
    pub fn is_loaded(&self, name: &str) -> bool {
        self.loaded.contains(&normalize(name))
    }
}
