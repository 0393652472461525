//! Centralized reading of the environment variables named in §6, rather
//! than scattering `std::env::var` calls across the loader (design note
//! §10.3, mirroring how `raya_runtime` centralizes `VmOptions`).

use std::env;

/// The four environment variables the core consults (§6).
#[derive(Debug, Clone, Default)]
pub struct Environment {
    /// Root of the MetaFFI installation; required unless a dispatcher can
    /// be found by other means.
    pub metaffi_home: Option<String>,
    /// Optional dev-path injection for running against a source checkout.
    pub metaffi_source_root: Option<String>,
    /// Opt-in diagnostic logging for the JVM runtime plugin.
    pub metaffi_jvm_diag: bool,
    /// Opt-in diagnostic logging for the Go runtime plugin.
    pub metaffi_go_plugin_debug_log: bool,
}

impl Environment {
    /// Read the current process environment.
    pub fn from_process() -> Self {
        Self {
            metaffi_home: non_empty(env::var("METAFFI_HOME").ok()),
            metaffi_source_root: non_empty(env::var("METAFFI_SOURCE_ROOT").ok()),
            metaffi_jvm_diag: is_set("METAFFI_JVM_DIAG"),
            metaffi_go_plugin_debug_log: is_set("METAFFI_GO_PLUGIN_DEBUG_LOG"),
        }
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.is_empty())
}

fn is_set(name: &str) -> bool {
    env::var_os(name).is_some_and(|v| !v.is_empty())
}
