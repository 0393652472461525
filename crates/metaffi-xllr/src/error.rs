//! Errors raised while locating, loading, or calling through the XLLR
//! dispatcher (§4.4, §7).

/// Errors raised by the XLLR loader and its bound ABI calls.
#[derive(Debug, thiserror::Error)]
pub enum XllrError {
    /// `METAFFI_HOME` is empty and no dispatcher could be found on the
    /// process working directory or OS search path (§4.4, §7).
    #[error("METAFFI_HOME is not set and no metaffi dispatcher library could be found")]
    InstallationMissing,

    /// The dispatcher shared library could not be opened at all (distinct
    /// from `InstallationMissing`: a path was found but dlopen/LoadLibrary
    /// failed).
    #[error("failed to load dispatcher library at {path}: {reason}")]
    LoadFailed {
        /// The path that was attempted.
        path: String,
        /// The platform loader's error message.
        reason: String,
    },

    /// A required symbol was missing from the dispatcher (an ABI mismatch
    /// between this crate and the installed dispatcher).
    #[error("symbol not found in dispatcher: {symbol}")]
    SymbolNotFound {
        /// The symbol name that was not found.
        symbol: String,
    },

    /// `out_err` was non-null on a dispatcher call (§4.4, §7): "the core
    /// copies the string, calls `free_string` on the pointer, and raises
    /// `PluginError` with the copied text."
    #[error("{0}")]
    PluginError(String),
}
