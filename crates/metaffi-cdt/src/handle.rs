//! Opaque foreign-runtime handles (§3, §4.8, §9).
//!
//! A handle is a triple `(raw, runtime_id, release_or_none)`. Ownership is
//! data-driven, not type-driven (§9): the same `Handle` shape carries both
//! local and foreign references, and only the handle-ownership arbiter
//! (`metaffi_dispatch::arbiter`) decides, per instance and at free time,
//! whether `release_fn` may run.

use std::os::raw::c_void;

/// Release function for a handle, supplied by whichever runtime produced
/// the handle. Matches the C ABI: a single opaque-pointer argument, no
/// return value.
///
/// # Safety
/// The pointer must be the same one passed to `Handle::new`, and must not
/// have already been released.
pub type ReleaseFn = unsafe extern "C" fn(*mut c_void);

/// An opaque reference to an object owned by a specific runtime.
pub struct Handle {
    opaque_handle: *mut c_void,
    runtime_id: u64,
    release_fn: Option<ReleaseFn>,
}

// A Handle only ever crosses threads as an inert (pointer, id, fn-pointer)
// triple that the receiving side doesn't dereference directly; the runtime
// plugin behind `release_fn` is responsible for its own thread safety.
unsafe impl Send for Handle {}
unsafe impl Sync for Handle {}

impl Handle {
    /// Build a handle. `release_fn` may be `None` for handles that don't
    /// need explicit release (e.g. values with no finalizer).
    pub fn new(opaque_handle: *mut c_void, runtime_id: u64, release_fn: Option<ReleaseFn>) -> Self {
        Self {
            opaque_handle,
            runtime_id,
            release_fn,
        }
    }

    /// The raw foreign pointer. Opaque to the core — never dereferenced
    /// here.
    pub fn raw(&self) -> *mut c_void {
        self.opaque_handle
    }

    /// The id of the runtime that produced this handle.
    pub fn runtime_id(&self) -> u64 {
        self.runtime_id
    }

    /// The current release function, if any.
    pub fn release_fn(&self) -> Option<ReleaseFn> {
        self.release_fn
    }

    /// True if a runtime with id `local` is authoritative for this handle.
    pub fn is_local(&self, local: u64) -> bool {
        self.runtime_id == local
    }

    /// Null out the release function so a subsequent drop becomes a no-op.
    ///
    /// Used by the pre-free walk (§4.8) to stop a CDTS free from calling
    /// back into a foreign runtime that may already be gone.
    pub fn clear_release_fn(&mut self) {
        self.release_fn = None;
    }

    /// Invoke and clear the release function, if set. Idempotent: calling
    /// this twice only runs the release once.
    ///
    /// # Safety
    /// The caller must ensure `opaque_handle` is still valid for this
    /// runtime (i.e. this handle has not already been released through
    /// another path).
    pub unsafe fn release(&mut self) {
        if let Some(release) = self.release_fn.take() {
            release(self.opaque_handle);
        }
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        // Safety: dropping this Handle means no other code can reach
        // `opaque_handle` through it afterward; the arbiter is responsible
        // for having already nulled `release_fn` on foreign handles before
        // the owning CDTS is freed (§4.8).
        unsafe { self.release() }
    }
}

impl std::fmt::Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("opaque_handle", &self.opaque_handle)
            .field("runtime_id", &self.runtime_id)
            .field("has_release_fn", &self.release_fn.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static RELEASE_COUNT: AtomicUsize = AtomicUsize::new(0);

    unsafe extern "C" fn count_release(_p: *mut c_void) {
        RELEASE_COUNT.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn release_runs_exactly_once_even_if_called_twice() {
        RELEASE_COUNT.store(0, Ordering::SeqCst);
        let mut h = Handle::new(std::ptr::null_mut(), 1, Some(count_release));
        unsafe {
            h.release();
            h.release();
        }
        assert_eq!(RELEASE_COUNT.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clearing_release_fn_makes_drop_a_no_op() {
        RELEASE_COUNT.store(0, Ordering::SeqCst);
        let mut h = Handle::new(std::ptr::null_mut(), 42, Some(count_release));
        h.clear_release_fn();
        drop(h);
        assert_eq!(RELEASE_COUNT.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn is_local_compares_against_runtime_id() {
        let h = Handle::new(std::ptr::null_mut(), 7, None);
        assert!(h.is_local(7));
        assert!(!h.is_local(8));
    }
}
