//! End-to-end scenarios S1-S6 (spec §8) driven entirely through the public
//! `Runtime`/`Module`/`Entity` facade, mirroring `raya-runtime`'s
//! `tests/e2e/` harness shape (§10.4). No real runtime plugin shared
//! library is loaded — `FakeDispatcher` below stands in for one.

use metaffi::{Entity, MetaffiError, MetaffiType, MetaffiTypeInfo, Module, Runtime};
use metaffi_serializer::{Deserializer, DynValue, Serializer};
use metaffi_cdt::Cdts;
use metaffi_xllr::{Allocator, Dispatcher, RawCdts, RawTypeInfo, RawXCall, XllrError};
use std::os::raw::c_void;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

unsafe extern "C" fn noop_alloc_string8(_n: u64) -> *mut std::os::raw::c_char {
    std::ptr::null_mut()
}
unsafe extern "C" fn noop_alloc_string16(_n: u64) -> *mut u16 {
    std::ptr::null_mut()
}
unsafe extern "C" fn noop_alloc_string32(_n: u64) -> *mut u32 {
    std::ptr::null_mut()
}
unsafe extern "C" fn real_alloc_memory(n: u64) -> *mut c_void {
    unsafe { libc::malloc(n as usize) }
}
unsafe extern "C" fn real_free_memory(p: *mut c_void) {
    unsafe { libc::free(p) }
}
unsafe extern "C" fn noop_free_string(_p: *mut std::os::raw::c_char) {}

fn test_allocator() -> Allocator {
    Allocator {
        alloc_string8: noop_alloc_string8,
        alloc_string16: noop_alloc_string16,
        alloc_string32: noop_alloc_string32,
        alloc_memory: real_alloc_memory,
        free_memory: real_free_memory,
        free_string: noop_free_string,
    }
}

/// Stands in for a real runtime plugin: every `load_entity` succeeds with
/// a sentinel `xcall`, and `xcall_params_ret` echoes each `int64` param
/// back doubled, enough to drive a real call through the whole facade
/// without a foreign shared library.
struct FakeDispatcher {
    allocator: Allocator,
    load_entity_calls: AtomicUsize,
    fail_next_load: AtomicBool,
}

impl FakeDispatcher {
    fn new() -> Self {
        Self {
            allocator: test_allocator(),
            load_entity_calls: AtomicUsize::new(0),
            fail_next_load: AtomicBool::new(false),
        }
    }
}

impl Dispatcher for FakeDispatcher {
    fn load_runtime_plugin(&self, _name: &str) -> Result<(), XllrError> {
        Ok(())
    }
    fn free_runtime_plugin(&self, _name: &str) -> Result<(), XllrError> {
        Ok(())
    }
    fn load_entity(
        &self,
        _runtime: &str,
        _module: &str,
        _entity_path: &str,
        _params_types: &[RawTypeInfo],
        _retval_types: &[RawTypeInfo],
    ) -> Result<*mut RawXCall, XllrError> {
        self.load_entity_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next_load.swap(false, Ordering::SeqCst) {
            return Err(XllrError::PluginError("entity not found".to_string()));
        }
        Ok(0x1 as *mut RawXCall)
    }
    fn free_xcall(&self, _runtime: &str, _xcall: *mut RawXCall) -> Result<(), XllrError> {
        Ok(())
    }
    fn make_callable(
        &self,
        _runtime: &str,
        _ctx: *mut c_void,
        _params_types: &[RawTypeInfo],
        _retval_types: &[RawTypeInfo],
    ) -> Result<*mut RawXCall, XllrError> {
        unimplemented!("no host-callback scenario exercised end-to-end")
    }
    fn xcall_no_params_no_ret(&self, _xcall: *mut RawXCall) -> Result<(), XllrError> {
        Ok(())
    }
    fn xcall_params_no_ret(&self, _xcall: *mut RawXCall, _params: *mut RawCdts) -> Result<(), XllrError> {
        Ok(())
    }
    fn xcall_no_params_ret(&self, _xcall: *mut RawXCall, _retvals: *mut RawCdts) -> Result<(), XllrError> {
        Ok(())
    }
    fn xcall_params_ret(&self, xcall: *mut RawXCall, cdts: *mut [*mut RawCdts; 2]) -> Result<(), XllrError> {
        assert!(!xcall.is_null());
        let slots = unsafe { &*cdts };
        unsafe {
            let params = metaffi_xllr::cdts_from_raw(&*slots[0]);
            let mut retvals = metaffi_xllr::cdts_from_raw(&*slots[1]);
            for i in 0..params.len().min(retvals.len()) {
                if let (Ok(src), Ok(dst)) = (params.get(i), retvals.get_mut(i)) {
                    if let Ok(v) = src.as_int64() {
                        dst.set_int64(v * 2);
                    }
                }
            }
            let echoed = metaffi_xllr::cdts_to_raw(&retvals, &self.allocator);
            std::ptr::copy_nonoverlapping(echoed.as_ref(), slots[1], 1);
        }
        Ok(())
    }
    fn allocator(&self) -> &Allocator {
        &self.allocator
    }
}

fn runtime() -> (Runtime, Arc<FakeDispatcher>) {
    let dispatcher = Arc::new(FakeDispatcher::new());
    let dispatcher_trait: Arc<dyn Dispatcher> = dispatcher.clone();
    (Runtime::with_dispatcher("python311", dispatcher_trait), dispatcher)
}

fn module(rt: &Runtime) -> Module {
    rt.load_module("mymod")
}

#[test]
fn s1_primitive_round_trip_through_the_whole_facade() {
    let (rt, _) = runtime();
    let m = module(&rt);
    let entity: Entity = m
        .load_entity(
            "callable=double",
            &[MetaffiTypeInfo::new(MetaffiType::INT64)],
            &[MetaffiTypeInfo::new(MetaffiType::INT64)],
        )
        .unwrap();

    let mut params = Cdts::new(1, 0);
    Serializer::new(&mut params).set(21i64).unwrap();

    let mut retvals = entity.call_raw(params).unwrap();
    let doubled: i64 = Deserializer::new(&mut retvals, metaffi::LOCAL_RUNTIME_ID).get().unwrap();
    assert_eq!(doubled, 42);
}

#[test]
fn s2_nested_array_param_reaches_the_entity_intact() {
    let (rt, dispatcher) = runtime();
    let m = module(&rt);
    let entity = m
        .load_entity(
            "callable=sum_rows",
            &[MetaffiTypeInfo::with_alias_and_dimensions(
                MetaffiType::array_of(MetaffiType::INT32),
                "",
                2,
            )],
            &[],
        )
        .unwrap();

    let mut params = Cdts::new(1, 0);
    {
        let mut ser = Serializer::new(&mut params);
        let value = DynValue::Array(vec![
            DynValue::Array(vec![DynValue::Integer(1), DynValue::Integer(2)]),
            DynValue::Array(vec![DynValue::Integer(3), DynValue::Integer(4)]),
        ]);
        ser.add(value, MetaffiType::array_of(MetaffiType::INT32)).unwrap();
    }

    entity.call_raw(params).unwrap();
    assert_eq!(dispatcher.load_entity_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn s3_dynamic_range_rejection_never_reaches_the_plugin() {
    let mut params = Cdts::new(1, 0);
    let mut ser = Serializer::new(&mut params);
    let err = ser.add(DynValue::Integer(1000), MetaffiType::INT8).unwrap_err();
    assert!(matches!(err, metaffi_serializer::SerializeError::RangeError { .. }));
}

#[test]
fn s4_foreign_handle_survives_a_round_trip_without_being_released() {
    static RELEASED: AtomicBool = AtomicBool::new(false);
    unsafe extern "C" fn mark_released(_p: *mut c_void) {
        RELEASED.store(true, Ordering::SeqCst);
    }
    RELEASED.store(false, Ordering::SeqCst);

    let mut cdts = Cdts::new(1, 0);
    cdts.get_mut(0)
        .unwrap()
        .set_handle(metaffi_cdt::Handle::new(std::ptr::null_mut(), 99, Some(mark_released)));

    metaffi_dispatch::disarm_and_free(cdts, metaffi::LOCAL_RUNTIME_ID);

    assert!(!RELEASED.load(Ordering::SeqCst));
}

#[test]
fn s5_entity_loads_lazily_and_only_once() {
    let (rt, dispatcher) = runtime();
    let m = module(&rt);
    let entity = m.load_entity("callable=noop", &[], &[]).unwrap();
    assert_eq!(dispatcher.load_entity_calls.load(Ordering::SeqCst), 0);

    entity.call_raw(Cdts::new(0, 0)).unwrap();
    entity.call_raw(Cdts::new(0, 0)).unwrap();
    assert_eq!(dispatcher.load_entity_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn s6_a_failed_load_can_be_retried_and_errors_surface_as_metaffi_error() {
    let (rt, dispatcher) = runtime();
    dispatcher.fail_next_load.store(true, Ordering::SeqCst);
    let m = module(&rt);
    let entity = m.load_entity("callable=flaky", &[], &[]).unwrap();

    let err: MetaffiError = entity.call_raw(Cdts::new(0, 0)).unwrap_err();
    assert!(matches!(err, MetaffiError::Dispatch(_)));

    let retvals = entity.call_raw(Cdts::new(0, 0)).unwrap();
    assert_eq!(retvals.len(), 0);
}

#[test]
fn invalid_entity_path_surfaces_through_the_facade() {
    let (rt, _) = runtime();
    let m = module(&rt);
    let err = m.load_entity("key=a=b", &[], &[]).unwrap_err();
    assert!(matches!(err, MetaffiError::Entity(_)));
}
