//! The `Dispatcher` trait and its real dlopen-backed implementation
//! (§4.4, §4.7): every call the upper crates make against the central
//! dispatcher funnels through here, with `out_err` uniformly converted to
//! `XllrError::PluginError`.

use crate::abi::{
    AllocCdtsBufferFn, AllocMemoryFn, AllocString16Fn, AllocString32Fn, AllocString8Fn, FreeCdtsBufferFn,
    FreeMemoryFn, FreeRuntimePluginFn, FreeStringFn, FreeXCallFn, LoadEntityFn, LoadRuntimePluginFn, MakeCallableFn,
    OutErr, RawCdts, RawTypeInfo, RawXCall, XCallNoParamsNoRetFn, XCallNoParamsRetFn, XCallParamsNoRetFn,
    XCallParamsRetFn,
};
use crate::env::Environment;
use crate::error::XllrError;
use crate::library::Library;
use crate::marshal::Allocator;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_void};

/// The surface the upper crates (`metaffi-registry`, `metaffi-entity`,
/// `metaffi-dispatch`) call through. A trait so tests can substitute a
/// `FakeDispatcher` test double without dlopening a real dispatcher
/// (SPEC_FULL.md §10.4).
pub trait Dispatcher: Send + Sync {
    fn load_runtime_plugin(&self, name: &str) -> Result<(), XllrError>;
    fn free_runtime_plugin(&self, name: &str) -> Result<(), XllrError>;

    fn load_entity(
        &self,
        runtime: &str,
        module: &str,
        entity_path: &str,
        params_types: &[RawTypeInfo],
        retval_types: &[RawTypeInfo],
    ) -> Result<*mut RawXCall, XllrError>;

    fn free_xcall(&self, runtime: &str, xcall: *mut RawXCall) -> Result<(), XllrError>;

    fn make_callable(
        &self,
        runtime: &str,
        ctx: *mut c_void,
        params_types: &[RawTypeInfo],
        retval_types: &[RawTypeInfo],
    ) -> Result<*mut RawXCall, XllrError>;

    fn xcall_no_params_no_ret(&self, xcall: *mut RawXCall) -> Result<(), XllrError>;
    fn xcall_params_no_ret(&self, xcall: *mut RawXCall, params: *mut RawCdts) -> Result<(), XllrError>;
    fn xcall_no_params_ret(&self, xcall: *mut RawXCall, retvals: *mut RawCdts) -> Result<(), XllrError>;
    fn xcall_params_ret(&self, xcall: *mut RawXCall, cdts: *mut [*mut RawCdts; 2]) -> Result<(), XllrError>;

    fn allocator(&self) -> &Allocator;
}

/// Resolves the real dispatcher symbols from a dlopened `Library` (§4.4).
pub struct DlDispatcher {
    library: Library,
    load_runtime_plugin: LoadRuntimePluginFn,
    free_runtime_plugin: FreeRuntimePluginFn,
    load_entity: LoadEntityFn,
    free_xcall: FreeXCallFn,
    make_callable: MakeCallableFn,
    alloc_cdts_buffer: AllocCdtsBufferFn,
    #[allow(dead_code)]
    free_cdts_buffer: FreeCdtsBufferFn,
    xcall_no_params_no_ret: XCallNoParamsNoRetFn,
    xcall_params_no_ret: XCallParamsNoRetFn,
    xcall_no_params_ret: XCallNoParamsRetFn,
    xcall_params_ret: XCallParamsRetFn,
    allocator: Allocator,
}

macro_rules! resolve {
    ($lib:expr, $name:literal) => {
        unsafe { $lib.symbol($name)? }
    };
}

impl DlDispatcher {
    /// Resolve every ABI symbol this crate depends on from an already-open
    /// dispatcher library.
    pub fn new(library: Library) -> Result<Self, XllrError> {
        let alloc_string8: AllocString8Fn = resolve!(library, "alloc_string8");
        let alloc_string16: AllocString16Fn = resolve!(library, "alloc_string16");
        let alloc_string32: AllocString32Fn = resolve!(library, "alloc_string32");
        let alloc_memory: AllocMemoryFn = resolve!(library, "alloc_memory");
        let free_memory: FreeMemoryFn = resolve!(library, "free_memory");
        let free_string: FreeStringFn = resolve!(library, "free_string");

        Ok(Self {
            load_runtime_plugin: resolve!(library, "load_runtime_plugin"),
            free_runtime_plugin: resolve!(library, "free_runtime_plugin"),
            load_entity: resolve!(library, "load_entity"),
            free_xcall: resolve!(library, "free_xcall"),
            make_callable: resolve!(library, "make_callable"),
            alloc_cdts_buffer: resolve!(library, "alloc_cdts_buffer"),
            free_cdts_buffer: resolve!(library, "free_cdts_buffer"),
            xcall_no_params_no_ret: resolve!(library, "xcall_no_params_no_ret"),
            xcall_params_no_ret: resolve!(library, "xcall_params_no_ret"),
            xcall_no_params_ret: resolve!(library, "xcall_no_params_ret"),
            xcall_params_ret: resolve!(library, "xcall_params_ret"),
            allocator: Allocator {
                alloc_string8,
                alloc_string16,
                alloc_string32,
                alloc_memory,
                free_memory,
                free_string,
            },
            library,
        })
    }

    /// Locate and open the dispatcher (§4.4's search order), then resolve
    /// its symbols.
    pub fn discover(env: &Environment) -> Result<Self, XllrError> {
        let library = crate::discovery::load_dispatcher(env)?;
        Self::new(library)
    }

    /// The path the dispatcher library was opened from.
    pub fn path(&self) -> &str {
        self.library.path()
    }

    fn check_err(&self, out_err: *mut c_char) -> Result<(), XllrError> {
        if out_err.is_null() {
            return Ok(());
        }
        let message = unsafe { CStr::from_ptr(out_err).to_string_lossy().into_owned() };
        self.allocator.free_string(out_err);
        Err(XllrError::PluginError(message))
    }

    fn with_out_err<F>(&self, f: F) -> Result<(), XllrError>
    where
        F: FnOnce(OutErr),
    {
        let mut out_err: *mut c_char = std::ptr::null_mut();
        f(&mut out_err as OutErr);
        self.check_err(out_err)
    }

    fn cname(s: &str) -> Result<CString, XllrError> {
        CString::new(s).map_err(|e| XllrError::PluginError(e.to_string()))
    }
}

impl Dispatcher for DlDispatcher {
    fn load_runtime_plugin(&self, name: &str) -> Result<(), XllrError> {
        let c_name = Self::cname(name)?;
        self.with_out_err(|out_err| unsafe { (self.load_runtime_plugin)(c_name.as_ptr(), out_err) })
    }

    fn free_runtime_plugin(&self, name: &str) -> Result<(), XllrError> {
        let c_name = Self::cname(name)?;
        self.with_out_err(|out_err| unsafe { (self.free_runtime_plugin)(c_name.as_ptr(), out_err) })
    }

    fn load_entity(
        &self,
        runtime: &str,
        module: &str,
        entity_path: &str,
        params_types: &[RawTypeInfo],
        retval_types: &[RawTypeInfo],
    ) -> Result<*mut RawXCall, XllrError> {
        let c_runtime = Self::cname(runtime)?;
        let c_module = Self::cname(module)?;
        let c_path = Self::cname(entity_path)?;
        let mut out_err: *mut c_char = std::ptr::null_mut();
        let xcall = unsafe {
            (self.load_entity)(
                c_runtime.as_ptr(),
                c_module.as_ptr(),
                c_path.as_ptr(),
                params_types.as_ptr(),
                params_types.len() as i8,
                retval_types.as_ptr(),
                retval_types.len() as i8,
                &mut out_err as OutErr,
            )
        };
        self.check_err(out_err)?;
        Ok(xcall)
    }

    fn free_xcall(&self, runtime: &str, xcall: *mut RawXCall) -> Result<(), XllrError> {
        let c_runtime = Self::cname(runtime)?;
        self.with_out_err(|out_err| unsafe { (self.free_xcall)(c_runtime.as_ptr(), xcall, out_err) })
    }

    fn make_callable(
        &self,
        runtime: &str,
        ctx: *mut c_void,
        params_types: &[RawTypeInfo],
        retval_types: &[RawTypeInfo],
    ) -> Result<*mut RawXCall, XllrError> {
        let c_runtime = Self::cname(runtime)?;
        let mut out_err: *mut c_char = std::ptr::null_mut();
        let xcall = unsafe {
            (self.make_callable)(
                c_runtime.as_ptr(),
                ctx,
                params_types.as_ptr(),
                params_types.len() as i8,
                retval_types.as_ptr(),
                retval_types.len() as i8,
                &mut out_err as OutErr,
            )
        };
        self.check_err(out_err)?;
        Ok(xcall)
    }

    fn xcall_no_params_no_ret(&self, xcall: *mut RawXCall) -> Result<(), XllrError> {
        self.with_out_err(|out_err| unsafe { (self.xcall_no_params_no_ret)(xcall, out_err) })
    }

    fn xcall_params_no_ret(&self, xcall: *mut RawXCall, params: *mut RawCdts) -> Result<(), XllrError> {
        self.with_out_err(|out_err| unsafe { (self.xcall_params_no_ret)(xcall, params, out_err) })
    }

    fn xcall_no_params_ret(&self, xcall: *mut RawXCall, retvals: *mut RawCdts) -> Result<(), XllrError> {
        self.with_out_err(|out_err| unsafe { (self.xcall_no_params_ret)(xcall, retvals, out_err) })
    }

    fn xcall_params_ret(&self, xcall: *mut RawXCall, cdts: *mut [*mut RawCdts; 2]) -> Result<(), XllrError> {
        self.with_out_err(|out_err| unsafe { (self.xcall_params_ret)(xcall, cdts, out_err) })
    }

    fn allocator(&self) -> &Allocator {
        &self.allocator
    }
}

// `alloc_cdts_buffer` is part of the dispatcher's allocator table (§4.4)
// but unused by this crate's own marshalling, which builds `RawCdts`
// headers with plain `Box` allocation on the host side (§3's "freed by
// the side that built it"); kept resolved so a future caller that needs a
// dispatcher-owned buffer (e.g. a callable invoked from the foreign side)
// doesn't require re-threading symbol resolution.
impl DlDispatcher {
    #[allow(dead_code)]
    pub(crate) fn alloc_cdts_buffer(&self, n_params: i8, n_retvals: i8) -> *mut RawCdts {
        unsafe { (self.alloc_cdts_buffer)(n_params, n_retvals) }
    }
}
