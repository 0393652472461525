//! Locating the central dispatcher shared library (§4.4): "consulting an
//! installation-root environment variable (`METAFFI_HOME`), then the
//! process working directory, then the OS search path."

use crate::env::Environment;
use crate::error::XllrError;
use crate::library::Library;
use std::path::{Path, PathBuf};

/// The dispatcher's platform-specific file name.
pub fn dispatcher_filename() -> &'static str {
    if cfg!(target_os = "windows") {
        "xllr.dll"
    } else if cfg!(target_os = "macos") {
        "libxllr.dylib"
    } else {
        "libxllr.so"
    }
}

/// Resolve and open the dispatcher library following §4.4's search order.
///
/// Open Question resolution (recorded in DESIGN.md): §4.4 states
/// `InstallationMissing` applies "if the env var is empty and no
/// dispatcher can be found" — read literally this only covers the
/// env-var-absent case. This implementation still tries the working
/// directory and bare-filename (OS search path) fallbacks when
/// `METAFFI_HOME` *is* set but its candidate path doesn't load, since
/// nothing in §4.4 says a bad `METAFFI_HOME` should skip the remaining
/// fallbacks outright; only if every fallback is exhausted with no
/// `METAFFI_HOME` at all does this surface `InstallationMissing` — a
/// `METAFFI_HOME` that pointed at a real-but-broken file (wrong ABI,
/// permission denied) still reports the concrete `LoadFailed` from that
/// attempt so the operator sees why.
pub fn load_dispatcher(env: &Environment) -> Result<Library, XllrError> {
    let filename = dispatcher_filename();
    let mut candidates: Vec<PathBuf> = Vec::new();

    if let Some(home) = &env.metaffi_home {
        candidates.push(Path::new(home).join(filename));
    }
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join(filename));
    }
    // Bare filename: let the platform loader's own search path apply.
    candidates.push(PathBuf::from(filename));

    let mut last_err = None;
    for candidate in &candidates {
        match Library::open(candidate) {
            Ok(lib) => return Ok(lib),
            Err(e) => last_err = Some(e),
        }
    }

    match (env.metaffi_home.as_ref(), last_err) {
        (None, _) => Err(XllrError::InstallationMissing),
        (Some(_), Some(e)) => Err(e),
        (Some(_), None) => Err(XllrError::InstallationMissing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_home_and_no_dispatcher_is_installation_missing() {
        let env = Environment {
            metaffi_home: None,
            ..Default::default()
        };
        // In the test sandbox there is no real dispatcher anywhere on the
        // search path, so every candidate fails and METAFFI_HOME is unset.
        let err = load_dispatcher(&env).unwrap_err();
        assert!(matches!(err, XllrError::InstallationMissing));
    }

    #[test]
    fn bad_metaffi_home_reports_load_failed() {
        let dir = tempfile::tempdir().unwrap();
        let env = Environment {
            metaffi_home: Some(dir.path().to_string_lossy().into_owned()),
            ..Default::default()
        };
        let err = load_dispatcher(&env).unwrap_err();
        assert!(matches!(err, XllrError::LoadFailed { .. }));
    }
}
