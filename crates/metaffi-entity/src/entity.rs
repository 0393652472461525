//! The entity stub and its load/invocation state machine (§4.6, §4.8).
//!
//! Grounded in `raya-engine/src/vm/ffi/loader.rs::load_module`'s
//! "open library, resolve init symbol, wrap the result in an owned
//! handle" shape, generalized to MetaFFI's cross-runtime `load_entity`
//! call and its lazy, idempotent load states.

use crate::error::EntityError;
use metaffi_registry::RuntimeRegistry;
use metaffi_types::MetaffiTypeInfo;
use metaffi_xllr::{free_raw_type_infos, type_infos_to_raw, Dispatcher, RawTypeInfo, RawXCall};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::warn;

/// Lifecycle state (§4.8): `Created -> Loaded -> Invocable -> Freed` for an
/// owning entity; a borrowed entity (already holding a foreign `xcall`)
/// starts at `Invocable` and its drop is a no-op.
enum State {
    Created,
    Loaded,
    Invocable { xcall: *mut RawXCall, owns_xcall: bool },
    Freed,
}

/// An entity stub: a loaded function/field/global handle plus its
/// declared parameter and return-value type lists.
pub struct Entity {
    runtime: String,
    module: String,
    entity_path: String,
    params_types: Vec<MetaffiTypeInfo>,
    retval_types: Vec<MetaffiTypeInfo>,
    dispatcher: Arc<dyn Dispatcher>,
    registry: Arc<RuntimeRegistry>,
    state: Mutex<State>,
}

impl Entity {
    /// Validate and load an entity (§4.6): the runtime plugin is ensured
    /// loaded lazily on first call to `ensure_invocable`/`xcall`, not here
    /// — construction alone only validates shapes and copies type
    /// descriptors (§4.6 point 3).
    pub fn load(
        dispatcher: Arc<dyn Dispatcher>,
        registry: Arc<RuntimeRegistry>,
        runtime: impl Into<String>,
        module: impl Into<String>,
        entity_path: impl Into<String>,
        params_types: &[MetaffiTypeInfo],
        retval_types: &[MetaffiTypeInfo],
    ) -> Result<Self, EntityError> {
        let entity_path = entity_path.into();
        // §4.6 point 1: validate entity-path syntax up front, before
        // touching the dispatcher at all.
        crate::path::EntityPath::parse(&entity_path)?;

        if params_types.len() > i8::MAX as usize {
            return Err(EntityError::TooManyTypes {
                what: "params",
                len: params_types.len(),
            });
        }
        if retval_types.len() > i8::MAX as usize {
            return Err(EntityError::TooManyTypes {
                what: "retvals",
                len: retval_types.len(),
            });
        }

        Ok(Self {
            runtime: runtime.into(),
            module: module.into(),
            entity_path,
            params_types: params_types.to_vec(),
            retval_types: retval_types.to_vec(),
            dispatcher,
            registry,
            state: Mutex::new(State::Created),
        })
    }

    /// Wrap an already-loaded, foreign-owned `xcall` (e.g. a callable
    /// wrapper received from the foreign side). Borrowed entities never
    /// call `free_xcall` on drop (§4.8: "Borrowed entities transition
    /// `Created->Invocable->(nothing)`; drop is a no-op").
    pub fn borrowed(
        dispatcher: Arc<dyn Dispatcher>,
        registry: Arc<RuntimeRegistry>,
        runtime: impl Into<String>,
        module: impl Into<String>,
        entity_path: impl Into<String>,
        params_types: Vec<MetaffiTypeInfo>,
        retval_types: Vec<MetaffiTypeInfo>,
        xcall: *mut RawXCall,
    ) -> Self {
        Self {
            runtime: runtime.into(),
            module: module.into(),
            entity_path: entity_path.into(),
            params_types,
            retval_types,
            dispatcher,
            registry,
            state: Mutex::new(State::Invocable {
                xcall,
                owns_xcall: false,
            }),
        }
    }

    pub fn runtime(&self) -> &str {
        &self.runtime
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn entity_path(&self) -> &str {
        &self.entity_path
    }

    pub fn params_types(&self) -> &[MetaffiTypeInfo] {
        &self.params_types
    }

    pub fn retval_types(&self) -> &[MetaffiTypeInfo] {
        &self.retval_types
    }

    /// Drive the state machine forward and return the invocable `xcall`
    /// stub, lazily ensuring the runtime plugin is loaded and the entity
    /// itself is resolved (§4.6 point 4, §4.8).
    pub fn ensure_invocable(&self) -> Result<*mut RawXCall, EntityError> {
        let mut state = self.state.lock();
        loop {
            match &*state {
                State::Invocable { xcall, .. } => return Ok(*xcall),
                State::Freed => {
                    return Err(EntityError::EntityNotFound {
                        runtime: self.runtime.clone(),
                        module: self.module.clone(),
                        entity_path: self.entity_path.clone(),
                    })
                }
                State::Created => {
                    self.registry.load_runtime_plugin(&self.runtime)?;
                    *state = State::Loaded;
                }
                State::Loaded => {
                    let allocator = self.dispatcher.allocator();
                    let (params_ptr, n_params) = type_infos_to_raw(&self.params_types, allocator);
                    let (retvals_ptr, n_retvals) = type_infos_to_raw(&self.retval_types, allocator);
                    let params_raw: &[RawTypeInfo] =
                        unsafe { raw_slice(params_ptr, n_params) };
                    let retvals_raw: &[RawTypeInfo] =
                        unsafe { raw_slice(retvals_ptr, n_retvals) };
                    let xcall = self.dispatcher.load_entity(
                        &self.runtime,
                        &self.module,
                        &self.entity_path,
                        params_raw,
                        retvals_raw,
                    );
                    unsafe {
                        free_raw_type_infos(params_ptr, n_params, allocator);
                        free_raw_type_infos(retvals_ptr, n_retvals, allocator);
                    }
                    let xcall = xcall?;
                    if xcall.is_null() {
                        return Err(EntityError::EntityNotFound {
                            runtime: self.runtime.clone(),
                            module: self.module.clone(),
                            entity_path: self.entity_path.clone(),
                        });
                    }
                    *state = State::Invocable {
                        xcall,
                        owns_xcall: true,
                    };
                }
            }
        }
    }
}

unsafe fn raw_slice<'a>(ptr: *mut RawTypeInfo, n: i8) -> &'a [RawTypeInfo] {
    if ptr.is_null() || n <= 0 {
        &[]
    } else {
        std::slice::from_raw_parts(ptr, n as usize)
    }
}

impl Drop for Entity {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if let State::Invocable { xcall, owns_xcall: true } = &*state {
            if let Err(e) = self.dispatcher.free_xcall(&self.runtime, *xcall) {
                warn!(component = "metaffi.entity", runtime = %self.runtime, error = %e, "free_xcall failed");
            }
        }
        *state = State::Freed;
    }
}

unsafe impl Send for Entity {}
unsafe impl Sync for Entity {}

#[cfg(test)]
mod tests {
    use super::*;
    use metaffi_types::MetaffiType;
    use metaffi_xllr::{Allocator, RawCdts};
    use std::os::raw::c_void;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use metaffi_xllr::XllrError;

    struct FakeDispatcher {
        load_entity_calls: AtomicUsize,
        null_result: AtomicBool,
        allocator: Allocator,
    }

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

    impl FakeDispatcher {
        fn new(null_result: bool) -> Self {
            Self {
                load_entity_calls: AtomicUsize::new(0),
                null_result: AtomicBool::new(null_result),
                allocator: Allocator {
                    alloc_string8: noop_alloc_string8,
                    alloc_string16: noop_alloc_string16,
                    alloc_string32: noop_alloc_string32,
                    alloc_memory: real_alloc_memory,
                    free_memory: real_free_memory,
                    free_string: noop_free_string,
                },
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
            if self.null_result.load(Ordering::SeqCst) {
                Ok(std::ptr::null_mut())
            } else {
                Ok(0x1 as *mut RawXCall)
            }
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
            unimplemented!()
        }
        fn xcall_no_params_no_ret(&self, _xcall: *mut RawXCall) -> Result<(), XllrError> {
            unimplemented!()
        }
        fn xcall_params_no_ret(&self, _xcall: *mut RawXCall, _params: *mut RawCdts) -> Result<(), XllrError> {
            unimplemented!()
        }
        fn xcall_no_params_ret(&self, _xcall: *mut RawXCall, _retvals: *mut RawCdts) -> Result<(), XllrError> {
            unimplemented!()
        }
        fn xcall_params_ret(&self, _xcall: *mut RawXCall, _cdts: *mut [*mut RawCdts; 2]) -> Result<(), XllrError> {
            unimplemented!()
        }
        fn allocator(&self) -> &Allocator {
            &self.allocator
        }
    }

    #[test]
    fn loaded_to_invocable_transition_is_idempotent() {
        let fake = Arc::new(FakeDispatcher::new(false));
        let dispatcher: Arc<dyn Dispatcher> = fake.clone();
        let registry = Arc::new(RuntimeRegistry::new(dispatcher.clone()));
        let entity = Entity::load(
            dispatcher,
            registry,
            "python311",
            "mod",
            "callable=f",
            &[MetaffiTypeInfo::new(MetaffiType::INT32)],
            &[],
        )
        .unwrap();

        let first = entity.ensure_invocable().unwrap();
        let second = entity.ensure_invocable().unwrap();

        assert_eq!(first, second);
        assert_eq!(fake.load_entity_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn invalid_entity_path_is_rejected_before_any_plugin_call() {
        let dispatcher: Arc<dyn Dispatcher> = Arc::new(FakeDispatcher::new(false));
        let registry = Arc::new(RuntimeRegistry::new(dispatcher.clone()));
        let err = Entity::load(dispatcher, registry, "python311", "mod", "key=a=b", &[], &[]).unwrap_err();
        assert!(matches!(err, EntityError::InvalidPath(_)));
    }

    #[test]
    fn too_many_params_is_rejected_before_any_plugin_call() {
        let dispatcher: Arc<dyn Dispatcher> = Arc::new(FakeDispatcher::new(false));
        let registry = Arc::new(RuntimeRegistry::new(dispatcher.clone()));
        let too_many = vec![MetaffiTypeInfo::new(MetaffiType::INT32); 200];
        let err = Entity::load(dispatcher, registry, "python311", "mod", "callable=f", &too_many, &[]).unwrap_err();
        assert!(matches!(err, EntityError::TooManyTypes { what: "params", .. }));
    }

    #[test]
    fn borrowed_entity_never_frees_on_drop() {
        let dispatcher: Arc<dyn Dispatcher> = Arc::new(FakeDispatcher::new(false));
        let registry = Arc::new(RuntimeRegistry::new(dispatcher.clone()));
        let entity = Entity::borrowed(
            dispatcher,
            registry,
            "python311",
            "mod",
            "callable=f",
            vec![],
            vec![],
            0x2 as *mut RawXCall,
        );
        let xcall = entity.ensure_invocable().unwrap();
        assert_eq!(xcall as usize, 0x2);
        drop(entity);
    }
}
