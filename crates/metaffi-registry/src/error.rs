//! Errors raised while loading or releasing a runtime plugin (§4.5, §7).

use metaffi_xllr::XllrError;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Forwarded from the dispatcher (§7 `PluginError`, `InstallationMissing`).
    #[error(transparent)]
    Xllr(#[from] XllrError),
}
