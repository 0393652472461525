//! Callable CDT payload (§3, §4.8): a function pointer plus its type
//! arrays, transportable inside a CDT cell.

use metaffi_types::MetaffiTypeInfo;
use std::os::raw::c_void;

/// A value-form entity: an opaque function pointer plus its declared
/// parameter and return-value type lists.
///
/// Ownership of `params_types`/`retval_types` is transferred through the
/// cross-ABI allocator at the real FFI boundary (§4.8); within this crate
/// they are plain owned `Vec`s and Rust drop glue is sufficient.
pub struct Callable {
    opaque_fn_ptr: *const c_void,
    params_types: Vec<MetaffiTypeInfo>,
    retval_types: Vec<MetaffiTypeInfo>,
}

unsafe impl Send for Callable {}
unsafe impl Sync for Callable {}

impl Callable {
    /// Build a callable. `opaque_fn_ptr` being null models the `NullCallable`
    /// failure case (§7) — callers should check `is_null()` before invoking.
    pub fn new(
        opaque_fn_ptr: *const c_void,
        params_types: Vec<MetaffiTypeInfo>,
        retval_types: Vec<MetaffiTypeInfo>,
    ) -> Self {
        Self {
            opaque_fn_ptr,
            params_types,
            retval_types,
        }
    }

    /// The underlying function pointer.
    pub fn fn_ptr(&self) -> *const c_void {
        self.opaque_fn_ptr
    }

    /// True if the function pointer is null.
    pub fn is_null(&self) -> bool {
        self.opaque_fn_ptr.is_null()
    }

    /// Declared parameter types.
    pub fn params_types(&self) -> &[MetaffiTypeInfo] {
        &self.params_types
    }

    /// Declared return-value types.
    pub fn retval_types(&self) -> &[MetaffiTypeInfo] {
        &self.retval_types
    }
}

impl std::fmt::Debug for Callable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callable")
            .field("opaque_fn_ptr", &self.opaque_fn_ptr)
            .field("params_types", &self.params_types.len())
            .field("retval_types", &self.retval_types.len())
            .finish()
    }
}
