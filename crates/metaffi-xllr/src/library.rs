//! Cross-platform dynamic library loading for the one library this crate
//! itself ever dlopens: the central XLLR dispatcher (§4.4). A runtime
//! plugin's own `.so`/`.dylib`/`.dll` is loaded by that dispatcher, inside
//! its own process image, not here — residency concerns for those
//! (Python's `Py_Finalize`, the JVM's `DestroyJavaVM`, Go's lack of
//! `dlclose`; §4.5, §9) are entirely the external XLLR binary's problem.

use crate::error::XllrError;
use std::ffi::{CStr, CString};
use std::path::Path;

/// A loaded dynamic library (`.so` / `.dylib` / `.dll`).
pub struct Library {
    handle: LibraryHandle,
    path: String,
}

impl Library {
    /// Open `path`, resolving all symbols immediately and keeping them
    /// local to this library (`RTLD_NOW | RTLD_LOCAL` on Unix,
    /// `LoadLibraryW` on Windows).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, XllrError> {
        let path_ref = path.as_ref();
        let path_str = path_ref.to_string_lossy().into_owned();
        let handle = LibraryHandle::load(&path_str)?;
        Ok(Library { handle, path: path_str })
    }

    /// Resolve a symbol by name.
    ///
    /// # Safety
    /// The caller must ensure `T` exactly matches the symbol's real
    /// signature; this crate has no way to verify it.
    pub unsafe fn symbol<T>(&self, name: &str) -> Result<T, XllrError> {
        self.handle.symbol(name)
    }

    /// The path this library was opened from.
    pub fn path(&self) -> &str {
        &self.path
    }
}

#[cfg(unix)]
struct LibraryHandle {
    handle: *mut std::ffi::c_void,
}

#[cfg(unix)]
impl LibraryHandle {
    fn load(path: &str) -> Result<Self, XllrError> {
        let c_path = CString::new(path).map_err(|e| XllrError::LoadFailed {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

        let flags = libc::RTLD_NOW | libc::RTLD_LOCAL;
        let handle = unsafe { libc::dlopen(c_path.as_ptr(), flags) };
        if handle.is_null() {
            let reason = unsafe { dlerror_message() };
            return Err(XllrError::LoadFailed {
                path: path.to_string(),
                reason,
            });
        }

        Ok(Self { handle })
    }

    unsafe fn symbol<T>(&self, name: &str) -> Result<T, XllrError> {
        let c_name = CString::new(name).map_err(|_| XllrError::SymbolNotFound {
            symbol: name.to_string(),
        })?;
        libc::dlerror();
        let sym = libc::dlsym(self.handle, c_name.as_ptr());
        if !dlerror_message().is_empty() || sym.is_null() {
            return Err(XllrError::SymbolNotFound {
                symbol: name.to_string(),
            });
        }
        Ok(std::mem::transmute_copy(&sym))
    }
}

#[cfg(unix)]
unsafe fn dlerror_message() -> String {
    let ptr = libc::dlerror();
    if ptr.is_null() {
        String::new()
    } else {
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }
}

#[cfg(unix)]
impl Drop for LibraryHandle {
    fn drop(&mut self) {
        unsafe {
            libc::dlclose(self.handle);
        }
    }
}

#[cfg(unix)]
unsafe impl Send for LibraryHandle {}
#[cfg(unix)]
unsafe impl Sync for LibraryHandle {}

#[cfg(windows)]
struct LibraryHandle {
    handle: *mut std::ffi::c_void,
}

#[cfg(windows)]
extern "system" {
    fn LoadLibraryW(filename: *const u16) -> *mut std::ffi::c_void;
    fn GetProcAddress(module: *mut std::ffi::c_void, procname: *const i8) -> *mut std::ffi::c_void;
    fn GetLastError() -> u32;
    fn FreeLibrary(module: *mut std::ffi::c_void) -> i32;
}

#[cfg(windows)]
impl LibraryHandle {
    fn load(path: &str) -> Result<Self, XllrError> {
        use std::ffi::OsStr;
        use std::os::windows::ffi::OsStrExt;

        let wide: Vec<u16> = OsStr::new(path).encode_wide().chain(std::iter::once(0)).collect();
        let handle = unsafe { LoadLibraryW(wide.as_ptr()) };
        if handle.is_null() {
            let code = unsafe { GetLastError() };
            return Err(XllrError::LoadFailed {
                path: path.to_string(),
                reason: format!("error code {code}"),
            });
        }
        Ok(Self { handle })
    }

    unsafe fn symbol<T>(&self, name: &str) -> Result<T, XllrError> {
        let c_name = CString::new(name).map_err(|_| XllrError::SymbolNotFound {
            symbol: name.to_string(),
        })?;
        let sym = GetProcAddress(self.handle, c_name.as_ptr());
        if sym.is_null() {
            return Err(XllrError::SymbolNotFound {
                symbol: name.to_string(),
            });
        }
        Ok(std::mem::transmute_copy(&sym))
    }
}

#[cfg(windows)]
unsafe impl Send for LibraryHandle {}
#[cfg(windows)]
unsafe impl Sync for LibraryHandle {}

#[cfg(windows)]
impl Drop for LibraryHandle {
    fn drop(&mut self) {
        unsafe {
            FreeLibrary(self.handle);
        }
    }
}
