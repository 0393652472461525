//! `Runtime` / `Module` / `Entity` — the three-tier public API, grounded
//! on `original_source/api/cpp/include/metaffi/api/metaffi_api.h`'s
//! `MetaFFIRuntime` / `MetaFFIModule` / `MetaFFIEntity` (§11).
//!
//! The host process is itself a "runtime" for handle-ownership purposes
//! (§4.8, §9); `LOCAL_RUNTIME_ID` is the id the arbiter compares every
//! handle's `runtime_id` against (DESIGN.md Open Question resolution: the
//! source's id space is plugin-assigned and out of scope here, so the
//! embedding host is always id `0`).

use crate::error::MetaffiError;
use metaffi_cdt::Cdts;
use metaffi_entity::Entity as EntityStub;
use metaffi_registry::RuntimeRegistry;
use metaffi_types::MetaffiTypeInfo;
use metaffi_xllr::{Dispatcher, Environment};
use std::sync::Arc;

/// The id the handle-ownership arbiter treats as "this process" (§4.8).
pub const LOCAL_RUNTIME_ID: u64 = 0;

/// A runtime plugin handle: loads/unloads the plugin and creates modules.
pub struct Runtime {
    name: String,
    dispatcher: Arc<dyn Dispatcher>,
    registry: Arc<RuntimeRegistry>,
}

impl Runtime {
    /// Resolve the process-wide dispatcher (§4.4) and build a handle for
    /// `runtime_plugin` (e.g. `"python3"` or `"xllr.python3"` — normalized
    /// internally, §4.5).
    pub fn new(runtime_plugin: impl Into<String>) -> Result<Self, MetaffiError> {
        let dispatcher = metaffi_xllr::global(&Environment::from_process())?;
        Ok(Self {
            name: metaffi_registry::normalize(&runtime_plugin.into()),
            registry: Arc::new(RuntimeRegistry::new(dispatcher.clone())),
            dispatcher,
        })
    }

    /// Build a handle against an already-resolved dispatcher, bypassing
    /// `global`'s dlopen (SPEC_FULL.md §10.4: tests substitute a fake
    /// `Dispatcher` instead of loading a real plugin).
    pub fn with_dispatcher(runtime_plugin: impl Into<String>, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            name: metaffi_registry::normalize(&runtime_plugin.into()),
            registry: Arc::new(RuntimeRegistry::new(dispatcher.clone())),
            dispatcher,
        }
    }

    /// The normalized runtime plugin name (always `"xllr."`-prefixed).
    pub fn runtime_plugin(&self) -> &str {
        &self.name
    }

    /// Load the runtime plugin via XLLR (idempotent, §4.5).
    pub fn load_runtime_plugin(&self) -> Result<(), MetaffiError> {
        self.registry.load_runtime_plugin(&self.name)?;
        Ok(())
    }

    /// Release the runtime plugin via XLLR (idempotent, §8 testable
    /// property 6).
    pub fn release_runtime_plugin(&self) -> Result<(), MetaffiError> {
        self.registry.release_runtime_plugin(&self.name)?;
        Ok(())
    }

    /// Create a module wrapper for `module_path`.
    pub fn load_module(&self, module_path: impl Into<String>) -> Module {
        Module {
            runtime_name: self.name.clone(),
            dispatcher: self.dispatcher.clone(),
            registry: self.registry.clone(),
            module_path: module_path.into(),
        }
    }
}

/// A module/package path within a runtime, used to load entities.
pub struct Module {
    runtime_name: String,
    dispatcher: Arc<dyn Dispatcher>,
    registry: Arc<RuntimeRegistry>,
    module_path: String,
}

impl Module {
    /// The module/package path as provided by the caller.
    pub fn module_path(&self) -> &str {
        &self.module_path
    }

    /// The normalized runtime plugin name.
    pub fn runtime_plugin(&self) -> &str {
        &self.runtime_name
    }

    /// Load an entity (§4.6): validates the entity-path grammar, requires
    /// both type lists fit in signed 8 bits, and resolves `load_entity`
    /// lazily on first invocation.
    pub fn load_entity(
        &self,
        entity_path: impl Into<String>,
        params_types: &[MetaffiTypeInfo],
        retvals_types: &[MetaffiTypeInfo],
    ) -> Result<Entity, MetaffiError> {
        let stub = EntityStub::load(
            self.dispatcher.clone(),
            self.registry.clone(),
            self.runtime_name.clone(),
            self.module_path.clone(),
            entity_path,
            params_types,
            retvals_types,
        )?;
        Ok(Entity {
            stub,
            dispatcher: self.dispatcher.clone(),
        })
    }
}

/// A loaded, invocable entity (RAII over `xcall`, §4.8).
pub struct Entity {
    stub: EntityStub,
    dispatcher: Arc<dyn Dispatcher>,
}

impl Entity {
    /// Parameter types as provided at load time.
    pub fn params_types(&self) -> &[MetaffiTypeInfo] {
        self.stub.params_types()
    }

    /// Return-value types as provided at load time.
    pub fn retval_types(&self) -> &[MetaffiTypeInfo] {
        self.stub.retval_types()
    }

    /// Call with pre-built CDTS params (§4.7); the host binding builds
    /// `params` through `metaffi_serializer::Serializer` and deserializes
    /// the returned CDTS through `metaffi_serializer::Deserializer`.
    pub fn call_raw(&self, params: Cdts) -> Result<Cdts, MetaffiError> {
        let retvals = metaffi_dispatch::call(&self.stub, &self.dispatcher, LOCAL_RUNTIME_ID, params)?;
        Ok(retvals)
    }
}
