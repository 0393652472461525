//! Invoking a `callable`-valued CDT cell back through the dispatcher
//! (§4.8: "ownership of `params_types[]`/`retval_types[]` is transferred
//! through the cross-ABI allocator ... a callable wrapper on the
//! receiving side never owns the underlying `xcall`; it owns only the
//! local metadata copy").

use crate::dispatch::invoke;
use crate::error::DispatchError;
use metaffi_cdt::{Callable, Cdts};
use metaffi_serializer::{CallableInvoker, SerializeError};
use metaffi_xllr::{Dispatcher, RawXCall};
use std::sync::Arc;

/// Call `callable`'s underlying `xcall` with `params`, reusing the same
/// variant-selection and validation path as an entity call (§4.7). The
/// callable's own declared `params_types`/`retval_types` stand in for an
/// entity's.
pub fn invoke_callable(
    dispatcher: &Arc<dyn Dispatcher>,
    local_runtime_id: u64,
    callable: &Callable,
    params: Cdts,
) -> Result<Cdts, DispatchError> {
    if callable.is_null() {
        return Err(DispatchError::Serialize(metaffi_serializer::SerializeError::NullCallable));
    }
    let xcall = callable.fn_ptr() as *mut RawXCall;
    invoke(
        xcall,
        callable.params_types(),
        callable.retval_types(),
        dispatcher,
        local_runtime_id,
        params,
    )
}

/// The `CallableInvoker` `metaffi_serializer::CallableWrapper` needs to
/// materialize a cached, invocable handle (§4.3: "materializes a
/// host-language callable object that, when invoked, calls back through
/// the XLLR ABI"). `materialize` returns a closure that calls
/// `invoke_callable` with this same `dispatcher`/`local_runtime_id` pair,
/// so `CallableWrapper::call` performs a real cross-language callback.
pub struct DispatchCallableInvoker {
    dispatcher: Arc<dyn Dispatcher>,
    local_runtime_id: u64,
}

impl DispatchCallableInvoker {
    pub fn new(dispatcher: Arc<dyn Dispatcher>, local_runtime_id: u64) -> Self {
        Self {
            dispatcher,
            local_runtime_id,
        }
    }

    pub fn dispatcher(&self) -> &Arc<dyn Dispatcher> {
        &self.dispatcher
    }

    pub fn local_runtime_id(&self) -> u64 {
        self.local_runtime_id
    }
}

impl CallableInvoker for DispatchCallableInvoker {
    fn materialize(
        &self,
        callable: &Callable,
    ) -> Arc<dyn Fn(Cdts) -> Result<Cdts, SerializeError> + Send + Sync> {
        // Rebuild an owned `Callable` to move into the closure — `Callable`
        // itself is `unsafe impl Send + Sync` (§4.8: its opaque function
        // pointer is read-only metadata once installed), but a bare
        // captured `*const c_void` would not be.
        let callable = Callable::new(
            callable.fn_ptr(),
            callable.params_types().to_vec(),
            callable.retval_types().to_vec(),
        );
        let dispatcher = self.dispatcher.clone();
        let local_runtime_id = self.local_runtime_id;
        Arc::new(move |params: Cdts| -> Result<Cdts, SerializeError> {
            invoke_callable(&dispatcher, local_runtime_id, &callable, params).map_err(SerializeError::from)
        })
    }
}
