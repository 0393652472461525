//! Raw C ABI surface of the dispatcher (§4.4, §6).
//!
//! Exact wire contract: `snake_case` symbols, `out_err: *mut *mut c_char`
//! on every fallible call, counts as `i8`, sizes as `u64` (`metaffi_size`),
//! entity paths as null-terminated UTF-8. These types are only ever
//! touched by `marshal.rs` and `dispatcher.rs`; nothing above this module
//! sees a raw pointer.

use std::os::raw::{c_char, c_void};

/// Opaque stub returned by `load_entity`/`make_callable`, invoked by one of
/// the four `xcall_*` variants (§4.7).
#[repr(C)]
pub struct RawXCall {
    _private: [u8; 0],
}

/// Wire-layout type descriptor (§3 `MetaFFITypeInfo`, §6).
#[repr(C)]
pub struct RawTypeInfo {
    pub kind: u32,
    pub alias: *mut c_char,
    pub owns_alias: u8,
    pub fixed_dimensions: u32,
}

/// Wire-layout tagged cell (§3 `CDT`, §6): "tag byte + union payload; union
/// size is the maximum of all payload sizes."
#[repr(C)]
pub struct RawCdt {
    pub tag: u32,
    pub free_required: u8,
    pub payload: RawCdtPayload,
}

/// The union itself. Rust unions require unsafe field access at every
/// read/write site — confined entirely to `marshal.rs`.
#[repr(C)]
pub union RawCdtPayload {
    pub i8_: i8,
    pub i16_: i16,
    pub i32_: i32,
    pub i64_: i64,
    pub u8_: u8,
    pub u16_: u16,
    pub u32_: u32,
    pub u64_: u64,
    pub f32_: f32,
    pub f64_: f64,
    pub bool_: u8,
    pub char8_: u8,
    pub char16_: u16,
    pub char32_: u32,
    /// Owning pointer to a null-terminated code-unit buffer (string kinds).
    pub str_ptr: *mut c_void,
    /// Owning pointer to a `RawCdts` header (array kinds).
    pub array_ptr: *mut RawCdts,
    /// Owning pointer to a `RawHandle` (handle kind).
    pub handle_ptr: *mut RawHandle,
    /// Owning pointer to a `RawCallable` (callable kind).
    pub callable_ptr: *mut RawCallable,
}

/// Wire-layout handle triple (§3, §6).
#[repr(C)]
pub struct RawHandle {
    pub opaque_handle: *mut c_void,
    pub runtime_id: u64,
    pub release_fn: Option<unsafe extern "C" fn(*mut c_void)>,
}

/// Wire-layout callable (§3, §6).
#[repr(C)]
pub struct RawCallable {
    pub opaque_fn_ptr: *const c_void,
    pub params_types: *mut RawTypeInfo,
    pub n_params: i8,
    pub retval_types: *mut RawTypeInfo,
    pub n_retvals: i8,
}

/// Wire-layout CDTS header (§3, §6): "a pointer to a CDTS header
/// `{length:uint64, fixed_dimensions:uint32, cells:...}`".
#[repr(C)]
pub struct RawCdts {
    pub length: u64,
    pub fixed_dimensions: u32,
    pub cells: *mut RawCdt,
}

pub type OutErr = *mut *mut c_char;

pub type LoadRuntimePluginFn = unsafe extern "C" fn(name: *const c_char, out_err: OutErr);
pub type FreeRuntimePluginFn = unsafe extern "C" fn(name: *const c_char, out_err: OutErr);

pub type LoadEntityFn = unsafe extern "C" fn(
    runtime: *const c_char,
    module: *const c_char,
    entity_path: *const c_char,
    params_types: *const RawTypeInfo,
    n_params: i8,
    retvals_types: *const RawTypeInfo,
    n_retvals: i8,
    out_err: OutErr,
) -> *mut RawXCall;

pub type FreeXCallFn = unsafe extern "C" fn(runtime: *const c_char, xcall: *mut RawXCall, out_err: OutErr);

pub type MakeCallableFn = unsafe extern "C" fn(
    runtime: *const c_char,
    ctx: *mut c_void,
    params_types: *const RawTypeInfo,
    n_params: i8,
    retvals_types: *const RawTypeInfo,
    n_retvals: i8,
    out_err: OutErr,
) -> *mut RawXCall;

pub type AllocCdtsBufferFn = unsafe extern "C" fn(n_params: i8, n_retvals: i8) -> *mut RawCdts;
pub type FreeCdtsBufferFn = unsafe extern "C" fn(buf: *mut RawCdts);

pub type AllocString8Fn = unsafe extern "C" fn(len: u64) -> *mut c_char;
pub type AllocString16Fn = unsafe extern "C" fn(len: u64) -> *mut u16;
pub type AllocString32Fn = unsafe extern "C" fn(len: u64) -> *mut u32;
pub type AllocMemoryFn = unsafe extern "C" fn(size: u64) -> *mut c_void;
pub type FreeMemoryFn = unsafe extern "C" fn(ptr: *mut c_void);
pub type FreeStringFn = unsafe extern "C" fn(ptr: *mut c_char);

pub type XCallNoParamsNoRetFn = unsafe extern "C" fn(xcall: *mut RawXCall, out_err: OutErr);
pub type XCallParamsNoRetFn = unsafe extern "C" fn(xcall: *mut RawXCall, cdts: *mut RawCdts, out_err: OutErr);
pub type XCallNoParamsRetFn = unsafe extern "C" fn(xcall: *mut RawXCall, cdts: *mut RawCdts, out_err: OutErr);
pub type XCallParamsRetFn =
    unsafe extern "C" fn(xcall: *mut RawXCall, cdts: *mut [*mut RawCdts; 2], out_err: OutErr);
