//! Conversion between this crate's in-process `Cdt`/`Cdts`/`MetaffiTypeInfo`
//! and the raw wire structs in `abi.rs` (§3, §6).
//!
//! Strings crossing the ABI go through the dispatcher's own allocator
//! (`alloc_string8/16/32`) so a buffer built on one side can be freed on
//! either side with the same allocator (§4.8) — this is what lets a
//! callable's `params_types`/`retval_types` arrays, in particular, be
//! freed by whichever side didn't build them.

use crate::abi::{
    AllocMemoryFn, AllocString16Fn, AllocString32Fn, AllocString8Fn, FreeMemoryFn, FreeStringFn, RawCallable, RawCdt,
    RawCdtPayload, RawCdts, RawHandle, RawTypeInfo,
};
use metaffi_cdt::{Callable, Cdt, Cdts, Handle};
use metaffi_types::{MetaffiType, MetaffiTypeInfo, MIXED_OR_UNKNOWN};
use std::os::raw::{c_char, c_void};
use std::ptr;

/// The subset of dispatcher symbols needed to allocate/free cross-ABI
/// buffers (§4.4's allocator table).
pub struct Allocator {
    pub alloc_string8: AllocString8Fn,
    pub alloc_string16: AllocString16Fn,
    pub alloc_string32: AllocString32Fn,
    pub alloc_memory: AllocMemoryFn,
    pub free_memory: FreeMemoryFn,
    pub free_string: FreeStringFn,
}

impl Allocator {
    /// Copy `bytes` into a dispatcher-allocated, null-terminated UTF-8
    /// buffer.
    pub fn alloc_string8(&self, bytes: &[u8]) -> *mut c_char {
        unsafe {
            let ptr = (self.alloc_string8)(bytes.len() as u64 + 1);
            if ptr.is_null() {
                return ptr;
            }
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), ptr as *mut u8, bytes.len());
            *(ptr as *mut u8).add(bytes.len()) = 0;
            ptr
        }
    }

    /// Copy `units` into a dispatcher-allocated, null-terminated UTF-16
    /// buffer.
    pub fn alloc_string16(&self, units: &[u16]) -> *mut u16 {
        unsafe {
            let ptr = (self.alloc_string16)(units.len() as u64 + 1);
            if ptr.is_null() {
                return ptr;
            }
            std::ptr::copy_nonoverlapping(units.as_ptr(), ptr, units.len());
            *ptr.add(units.len()) = 0;
            ptr
        }
    }

    /// Copy `units` into a dispatcher-allocated, null-terminated UTF-32
    /// buffer.
    pub fn alloc_string32(&self, units: &[u32]) -> *mut u32 {
        unsafe {
            let ptr = (self.alloc_string32)(units.len() as u64 + 1);
            if ptr.is_null() {
                return ptr;
            }
            std::ptr::copy_nonoverlapping(units.as_ptr(), ptr, units.len());
            *ptr.add(units.len()) = 0;
            ptr
        }
    }

    /// Allocate `count` dispatcher-owned `RawTypeInfo` slots.
    pub fn alloc_type_infos(&self, count: usize) -> *mut RawTypeInfo {
        if count == 0 {
            return ptr::null_mut();
        }
        unsafe { (self.alloc_memory)((count * std::mem::size_of::<RawTypeInfo>()) as u64) as *mut RawTypeInfo }
    }

    /// Free memory previously returned by `alloc_memory`/`alloc_type_infos`.
    pub fn free_memory(&self, p: *mut c_void) {
        if !p.is_null() {
            unsafe { (self.free_memory)(p) }
        }
    }

    /// Free a string previously returned by any `alloc_string*` call.
    pub fn free_string(&self, p: *mut c_char) {
        if !p.is_null() {
            unsafe { (self.free_string)(p) }
        }
    }
}

/// Convert a type descriptor to its wire form, allocating the alias
/// string (if any) through the shared allocator.
pub fn type_info_to_raw(info: &MetaffiTypeInfo, alloc: &Allocator) -> RawTypeInfo {
    let alias = match info.alias() {
        Some(s) => alloc.alloc_string8(s.as_bytes()),
        None => ptr::null_mut(),
    };
    RawTypeInfo {
        kind: info.kind().to_raw(),
        alias,
        owns_alias: info.owns_alias() as u8,
        fixed_dimensions: info.fixed_dimensions(),
    }
}

/// Convert a list of type descriptors into a dispatcher-owned array,
/// returning the pointer and count cast to the ABI's `i8`.
///
/// # Safety
/// The caller owns the returned pointer and must free it (and each
/// non-null `alias`) through `alloc`, or transfer that duty across the
/// ABI per §4.8.
pub fn type_infos_to_raw(infos: &[MetaffiTypeInfo], alloc: &Allocator) -> (*mut RawTypeInfo, i8) {
    let raw = alloc.alloc_type_infos(infos.len());
    if !raw.is_null() {
        for (i, info) in infos.iter().enumerate() {
            unsafe { raw.add(i).write(type_info_to_raw(info, alloc)) };
        }
    }
    (raw, infos.len() as i8)
}

/// Free a `(ptr, count)` array produced by `type_infos_to_raw`, including
/// each element's owned alias string. Call sites that build a type-info
/// array purely to pass it through one ABI call (e.g. `load_entity`, which
/// does not take ownership) use this instead of a bare `free_memory`, or
/// every aliased descriptor would leak its alias buffer.
///
/// # Safety
/// `ptr` must be null or a valid array of `count` `RawTypeInfo`s as
/// produced by `type_infos_to_raw`, not already freed.
pub unsafe fn free_raw_type_infos(ptr: *mut RawTypeInfo, count: i8, alloc: &Allocator) {
    if ptr.is_null() || count <= 0 {
        return;
    }
    for i in 0..count as usize {
        let alias = (*ptr.add(i)).alias;
        alloc.free_string(alias as *mut c_char);
    }
    alloc.free_memory(ptr as *mut c_void);
}

/// Read a wire type descriptor back into `MetaffiTypeInfo`, copying the
/// alias (if any) into a Rust-owned `String`. Does not free the raw
/// alias — callers decide whether ownership of the raw array was theirs.
///
/// # Safety
/// `raw` must point to a valid `RawTypeInfo`.
pub unsafe fn type_info_from_raw(raw: &RawTypeInfo) -> MetaffiTypeInfo {
    let kind = MetaffiType::from_raw(raw.kind);
    if raw.alias.is_null() {
        MetaffiTypeInfo::new(kind)
    } else {
        let alias = std::ffi::CStr::from_ptr(raw.alias).to_string_lossy().into_owned();
        MetaffiTypeInfo::with_alias_and_dimensions(kind, alias, raw.fixed_dimensions)
    }
}

/// Build a fresh `RawCdts` (Rust-`Box`-owned; freed by whichever side
/// allocated it, per §3's "CDTS ... freed by the side that built it") from
/// our in-process `Cdts`, converting each cell through the shared
/// allocator for owned buffers.
pub fn cdts_to_raw(cdts: &Cdts, alloc: &Allocator) -> Box<RawCdts> {
    let mut cells = Vec::with_capacity(cdts.len());
    for cell in cdts.cells() {
        cells.push(cdt_to_raw(cell, alloc));
    }
    let cells_ptr = if cells.is_empty() {
        ptr::null_mut()
    } else {
        let boxed = cells.into_boxed_slice();
        Box::into_raw(boxed) as *mut RawCdt
    };
    Box::new(RawCdts {
        length: cdts.len() as u64,
        fixed_dimensions: cdts.fixed_dimensions(),
        cells: cells_ptr,
    })
}

fn cdt_to_raw(cell: &Cdt, alloc: &Allocator) -> RawCdt {
    let tag = cell.kind().to_raw();
    let free_required = cell.free_required() as u8;
    if cell.kind().is_array() {
        let payload = RawCdtPayload {
            array_ptr: Box::into_raw(cdts_to_raw(cell.as_array().unwrap(), alloc)),
        };
        return RawCdt {
            tag,
            free_required,
            payload,
        };
    }
    let payload = match cell.kind().base_kind() {
        MetaffiType::INT8 => RawCdtPayload { i8_: cell.as_int8().unwrap() },
        MetaffiType::INT16 => RawCdtPayload { i16_: cell.as_int16().unwrap() },
        MetaffiType::INT32 => RawCdtPayload { i32_: cell.as_int32().unwrap() },
        MetaffiType::INT64 => RawCdtPayload { i64_: cell.as_int64().unwrap() },
        MetaffiType::UINT8 => RawCdtPayload { u8_: cell.as_uint8().unwrap() },
        MetaffiType::UINT16 => RawCdtPayload { u16_: cell.as_uint16().unwrap() },
        MetaffiType::UINT32 => RawCdtPayload { u32_: cell.as_uint32().unwrap() },
        MetaffiType::UINT64 => RawCdtPayload { u64_: cell.as_uint64().unwrap() },
        MetaffiType::FLOAT32 => RawCdtPayload { f32_: cell.as_float32().unwrap() },
        MetaffiType::FLOAT64 => RawCdtPayload { f64_: cell.as_float64().unwrap() },
        MetaffiType::BOOL => RawCdtPayload {
            bool_: cell.as_bool().unwrap() as u8,
        },
        MetaffiType::CHAR8 => RawCdtPayload { char8_: cell.as_char8().unwrap() },
        MetaffiType::CHAR16 => RawCdtPayload {
            char16_: cell.as_char16().unwrap(),
        },
        MetaffiType::CHAR32 => RawCdtPayload {
            char32_: cell.as_char32().unwrap(),
        },
        MetaffiType::STRING8 => RawCdtPayload {
            str_ptr: alloc.alloc_string8(cell.as_string8().unwrap()) as *mut c_void,
        },
        MetaffiType::STRING16 => RawCdtPayload {
            str_ptr: alloc.alloc_string16(cell.as_string16().unwrap()) as *mut c_void,
        },
        MetaffiType::STRING32 => RawCdtPayload {
            str_ptr: alloc.alloc_string32(cell.as_string32().unwrap()) as *mut c_void,
        },
        MetaffiType::NULL => RawCdtPayload { u64_: 0 },
        MetaffiType::HANDLE => {
            let h = cell.as_handle().unwrap();
            let boxed = Box::new(RawHandle {
                opaque_handle: h.raw(),
                runtime_id: h.runtime_id(),
                release_fn: h.release_fn(),
            });
            RawCdtPayload {
                handle_ptr: Box::into_raw(boxed),
            }
        }
        MetaffiType::CALLABLE => {
            let c = cell.as_callable().unwrap();
            let (params_types, n_params) = type_infos_to_raw(c.params_types(), alloc);
            let (retval_types, n_retvals) = type_infos_to_raw(c.retval_types(), alloc);
            let boxed = Box::new(RawCallable {
                opaque_fn_ptr: c.fn_ptr(),
                params_types,
                n_params,
                retval_types,
                n_retvals,
            });
            RawCdtPayload {
                callable_ptr: Box::into_raw(boxed),
            }
        }
        _ => RawCdtPayload { u64_: 0 },
    };
    RawCdt {
        tag,
        free_required,
        payload,
    }
}

/// Recursively free a `RawCdts` built by `cdts_to_raw`: every cell's owned
/// wire-side payload (string buffers, nested array headers, and the
/// `RawHandle`/`RawCallable` boxes themselves, including a callable's
/// `params_types`/`retval_types` arrays) plus the cells slice and the
/// header itself (§3, §4.8).
///
/// This only tears down the wire-format scaffolding — a handle's
/// `release_fn` is never invoked here. Whether the underlying resource is
/// released is decided separately, over the in-process `Cdts`, by the
/// handle-ownership arbiter (§4.8, §9); call this only after that decision
/// has already been made (or never applies, e.g. for a retvals buffer
/// already copied out via `cdts_from_raw`).
///
/// # Safety
/// `raw` must be a `Box<RawCdts>` as produced by `cdts_to_raw`, and every
/// payload it reaches must not already be freed.
pub unsafe fn free_raw_cdts(raw: Box<RawCdts>, alloc: &Allocator) {
    let ptr = Box::into_raw(raw);
    let cells = (*ptr).cells;
    let length = (*ptr).length as usize;
    if !cells.is_null() {
        for i in 0..length {
            free_raw_cdt_payload(&*cells.add(i), alloc);
        }
        drop(Box::from_raw(std::slice::from_raw_parts_mut(cells, length)));
    }
    drop(Box::from_raw(ptr));
}

unsafe fn free_raw_cdt_payload(cell: &RawCdt, alloc: &Allocator) {
    let kind = MetaffiType::from_raw(cell.tag);
    if kind.is_array() {
        if !cell.payload.array_ptr.is_null() {
            free_raw_cdts(Box::from_raw(cell.payload.array_ptr), alloc);
        }
        return;
    }
    match kind.base_kind() {
        MetaffiType::STRING8 | MetaffiType::STRING16 | MetaffiType::STRING32 => {
            alloc.free_string(cell.payload.str_ptr as *mut c_char);
        }
        MetaffiType::HANDLE => {
            if !cell.payload.handle_ptr.is_null() {
                drop(Box::from_raw(cell.payload.handle_ptr));
            }
        }
        MetaffiType::CALLABLE => {
            if !cell.payload.callable_ptr.is_null() {
                let callable = Box::from_raw(cell.payload.callable_ptr);
                free_raw_type_infos(callable.params_types, callable.n_params, alloc);
                free_raw_type_infos(callable.retval_types, callable.n_retvals, alloc);
            }
        }
        _ => {}
    }
}

/// Read a `RawCdts` produced by the dispatcher back into our in-process
/// `Cdts`, taking ownership of every owned payload it names.
///
/// # Safety
/// `raw` must be a valid, fully-initialized `RawCdts` as produced by the
/// dispatcher's ABI, and the caller must not read `raw` again afterward —
/// ownership of every reachable allocation transfers into the returned
/// `Cdts`.
pub unsafe fn cdts_from_raw(raw: &RawCdts) -> Cdts {
    let length = raw.length as usize;
    let mut cdts = Cdts::new(length, raw.fixed_dimensions);
    if raw.cells.is_null() {
        return cdts;
    }
    for i in 0..length {
        let raw_cell = &*raw.cells.add(i);
        let cell = cdts.get_mut(i).expect("index within freshly-sized Cdts");
        cdt_from_raw(raw_cell, cell);
    }
    cdts
}

unsafe fn cdt_from_raw(raw: &RawCdt, out: &mut Cdt) {
    let kind = MetaffiType::from_raw(raw.tag);
    if kind.is_array() {
        let nested = &*raw.payload.array_ptr;
        let rank = if nested.fixed_dimensions == MIXED_OR_UNKNOWN {
            MIXED_OR_UNKNOWN
        } else {
            nested.fixed_dimensions
        };
        out.set_new_array(nested.length as usize, rank, kind.base_kind());
        let target = out.as_array_mut().expect("just constructed as array");
        for i in 0..nested.length as usize {
            let raw_child = &*nested.cells.add(i);
            let child = target.get_mut(i).expect("index within freshly-sized nested Cdts");
            cdt_from_raw(raw_child, child);
        }
        return;
    }
    match kind.base_kind() {
        MetaffiType::INT8 => out.set_int8(raw.payload.i8_),
        MetaffiType::INT16 => out.set_int16(raw.payload.i16_),
        MetaffiType::INT32 => out.set_int32(raw.payload.i32_),
        MetaffiType::INT64 => out.set_int64(raw.payload.i64_),
        MetaffiType::UINT8 => out.set_uint8(raw.payload.u8_),
        MetaffiType::UINT16 => out.set_uint16(raw.payload.u16_),
        MetaffiType::UINT32 => out.set_uint32(raw.payload.u32_),
        MetaffiType::UINT64 => out.set_uint64(raw.payload.u64_),
        MetaffiType::FLOAT32 => out.set_float32(raw.payload.f32_),
        MetaffiType::FLOAT64 => out.set_float64(raw.payload.f64_),
        MetaffiType::BOOL => out.set_bool(raw.payload.bool_ != 0),
        MetaffiType::CHAR8 => out.set_char8(raw.payload.char8_),
        MetaffiType::CHAR16 => out.set_char16(raw.payload.char16_),
        MetaffiType::CHAR32 => out.set_char32(raw.payload.char32_),
        MetaffiType::STRING8 => out.set_string8_owned(cstr8_to_vec(raw.payload.str_ptr as *const c_char)),
        MetaffiType::STRING16 => out.set_string16_owned(cstr16_to_vec(raw.payload.str_ptr as *const u16)),
        MetaffiType::STRING32 => out.set_string32_owned(cstr32_to_vec(raw.payload.str_ptr as *const u32)),
        MetaffiType::NULL => out.set_null(),
        MetaffiType::HANDLE => {
            let h = &*raw.payload.handle_ptr;
            out.set_handle(Handle::new(h.opaque_handle, h.runtime_id, h.release_fn));
        }
        MetaffiType::CALLABLE => {
            let c = &*raw.payload.callable_ptr;
            let params = raw_type_infos(c.params_types, c.n_params);
            let retvals = raw_type_infos(c.retval_types, c.n_retvals);
            out.set_callable(Callable::new(c.opaque_fn_ptr, params, retvals));
        }
        _ => out.set_null(),
    }
}

unsafe fn raw_type_infos(ptr: *mut RawTypeInfo, n: i8) -> Vec<MetaffiTypeInfo> {
    if ptr.is_null() || n <= 0 {
        return Vec::new();
    }
    (0..n as usize).map(|i| type_info_from_raw(&*ptr.add(i))).collect()
}

unsafe fn cstr8_to_vec(ptr: *const c_char) -> Vec<u8> {
    if ptr.is_null() {
        return Vec::new();
    }
    std::ffi::CStr::from_ptr(ptr).to_bytes().to_vec()
}

unsafe fn cstr16_to_vec(ptr: *const u16) -> Vec<u16> {
    if ptr.is_null() {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut i = 0isize;
    loop {
        let unit = *ptr.offset(i);
        if unit == 0 {
            break;
        }
        out.push(unit);
        i += 1;
    }
    out
}

unsafe fn cstr32_to_vec(ptr: *const u32) -> Vec<u32> {
    if ptr.is_null() {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut i = 0isize;
    loop {
        let unit = *ptr.offset(i);
        if unit == 0 {
            break;
        }
        out.push(unit);
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe extern "C" fn malloc_string8(len: u64) -> *mut c_char {
        libc::malloc(len as usize) as *mut c_char
    }
    unsafe extern "C" fn malloc_string16(len: u64) -> *mut u16 {
        libc::malloc(len as usize * 2) as *mut u16
    }
    unsafe extern "C" fn malloc_string32(len: u64) -> *mut u32 {
        libc::malloc(len as usize * 4) as *mut u32
    }
    unsafe extern "C" fn malloc_memory(size: u64) -> *mut c_void {
        libc::malloc(size as usize)
    }
    unsafe extern "C" fn libc_free(p: *mut c_void) {
        libc::free(p)
    }
    unsafe extern "C" fn libc_free_string(p: *mut c_char) {
        libc::free(p as *mut c_void)
    }

    fn test_allocator() -> Allocator {
        Allocator {
            alloc_string8: malloc_string8,
            alloc_string16: malloc_string16,
            alloc_string32: malloc_string32,
            alloc_memory: malloc_memory,
            free_memory: libc_free,
            free_string: libc_free_string,
        }
    }

    #[test]
    fn primitive_round_trips_through_raw_wire_form() {
        let alloc = test_allocator();
        let mut cdts = Cdts::new(2, 0);
        cdts.get_mut(0).unwrap().set_int32(42);
        cdts.get_mut(1).unwrap().set_bool(true);

        let raw = cdts_to_raw(&cdts, &alloc);
        let back = unsafe { cdts_from_raw(&raw) };
        assert_eq!(back.get(0).unwrap().as_int32().unwrap(), 42);
        assert_eq!(back.get(1).unwrap().as_bool().unwrap(), true);
    }

    #[test]
    fn string_round_trips_by_content() {
        let alloc = test_allocator();
        let mut cdts = Cdts::new(1, 0);
        cdts.get_mut(0).unwrap().set_string8(b"hello metaffi");

        let raw = cdts_to_raw(&cdts, &alloc);
        let back = unsafe { cdts_from_raw(&raw) };
        assert_eq!(back.get(0).unwrap().as_string8().unwrap(), b"hello metaffi");
    }

    #[test]
    fn nested_array_round_trips_s2() {
        let alloc = test_allocator();
        let mut cdts = Cdts::new(1, 0);
        {
            let outer = cdts.get_mut(0).unwrap();
            outer.set_new_array(2, 2, MetaffiType::INT32);
            let outer_arr = outer.as_array_mut().unwrap();
            for row_i in 0..2 {
                let row = outer_arr.get_mut(row_i).unwrap();
                row.set_new_array(3, 1, MetaffiType::INT32);
                let row_arr = row.as_array_mut().unwrap();
                for col in 0..3 {
                    row_arr.get_mut(col).unwrap().set_int32((row_i * 3 + col + 1) as i32);
                }
            }
        }

        let raw = cdts_to_raw(&cdts, &alloc);
        let back = unsafe { cdts_from_raw(&raw) };
        let outer = back.get(0).unwrap();
        assert_eq!(outer.kind(), MetaffiType::array_of(MetaffiType::INT32));
        let outer_arr = outer.as_array().unwrap();
        let row1 = outer_arr.get(1).unwrap().as_array().unwrap();
        assert_eq!(row1.get(2).unwrap().as_int32().unwrap(), 6);
    }

    #[test]
    fn handle_round_trips_with_its_runtime_id() {
        let alloc = test_allocator();
        let mut cdts = Cdts::new(1, 0);
        cdts.get_mut(0).unwrap().set_handle(Handle::new(std::ptr::null_mut(), 7, None));

        let raw = cdts_to_raw(&cdts, &alloc);
        let back = unsafe { cdts_from_raw(&raw) };
        assert!(back.get(0).unwrap().as_handle().unwrap().is_local(7));
    }

    #[test]
    fn type_info_round_trips_with_alias() {
        let alloc = test_allocator();
        let info = MetaffiTypeInfo::with_alias_and_dimensions(MetaffiType::INT64, "MyLong", 1);
        let raw = type_info_to_raw(&info, &alloc);
        let back = unsafe { type_info_from_raw(&raw) };
        assert_eq!(back.kind(), MetaffiType::INT64);
        assert_eq!(back.alias(), Some("MyLong"));
        assert_eq!(back.fixed_dimensions(), 1);
    }

    #[test]
    fn free_raw_type_infos_frees_aliases_and_array() {
        let alloc = test_allocator();
        let infos = vec![
            MetaffiTypeInfo::with_alias_and_dimensions(MetaffiType::INT64, "MyLong", 0),
            MetaffiTypeInfo::new(MetaffiType::INT32),
        ];
        let (raw, count) = type_infos_to_raw(&infos, &alloc);
        assert_eq!(count, 2);
        // Valgrind/Miri would catch a leak here; absent those, this just
        // exercises the null/non-null alias branches without crashing.
        unsafe { free_raw_type_infos(raw, count, &alloc) };
    }

    #[test]
    fn free_raw_type_infos_is_a_no_op_on_null() {
        let alloc = test_allocator();
        unsafe { free_raw_type_infos(ptr::null_mut(), 0, &alloc) };
    }

    #[test]
    fn free_raw_cdts_tears_down_strings_arrays_handles_and_callables() {
        let alloc = test_allocator();
        let mut cdts = Cdts::new(4, 0);
        cdts.get_mut(0).unwrap().set_string8(b"leak me not");
        cdts.get_mut(1)
            .unwrap()
            .set_handle(Handle::new(std::ptr::null_mut(), 7, None));
        cdts.get_mut(2).unwrap().set_callable(Callable::new(
            &1u8 as *const u8 as *const c_void,
            vec![MetaffiTypeInfo::with_alias_and_dimensions(MetaffiType::INT32, "Count", 0)],
            vec![],
        ));
        {
            let arr = cdts.get_mut(3).unwrap();
            arr.set_new_array(1, 1, MetaffiType::STRING8);
            arr.as_array_mut().unwrap().get_mut(0).unwrap().set_string8(b"nested");
        }

        let raw = cdts_to_raw(&cdts, &alloc);
        // Valgrind/Miri would catch a leak or double-free here; absent
        // those, this just exercises every payload branch without
        // crashing.
        unsafe { free_raw_cdts(raw, &alloc) };
    }

    #[test]
    fn free_raw_cdts_is_a_no_op_on_an_empty_buffer() {
        let alloc = test_allocator();
        let cdts = Cdts::new(0, 0);
        let raw = cdts_to_raw(&cdts, &alloc);
        unsafe { free_raw_cdts(raw, &alloc) };
    }
}
