//! Callable extraction (§4.3): "the serializer materializes a
//! host-language callable object that, when invoked, calls back through
//! the XLLR ABI. The materialization is lazy and cached per extracted
//! cell."
//!
//! The actual XLLR invoke-back lives in `metaffi_dispatch` (it needs the
//! loaded dispatcher); this crate only owns the laziness/caching shape so
//! a host binding can hold a `CallableWrapper` without paying for
//! materialization until the wrapped value is actually called.

use crate::error::SerializeError;
use metaffi_cdt::{Callable, Cdts};
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Whatever a host binding needs to invoke a `Callable`'s underlying
/// `xcall` through the XLLR ABI. Implemented by `metaffi_dispatch` over a
/// loaded dispatcher; kept as a trait here so this crate has no dependency
/// on the dispatch layer.
pub trait CallableInvoker: Send + Sync {
    /// Materialize an invocable handle for `callable`: a closure that
    /// takes a params `Cdts` (built by the caller against `callable`'s own
    /// declared `params_types`) and, when invoked, calls back through the
    /// XLLR ABI, returning the retvals `Cdts` (§4.3). Called at most once
    /// per `CallableWrapper` (the result is cached).
    fn materialize(&self, callable: &Callable) -> Arc<dyn Fn(Cdts) -> Result<Cdts, SerializeError> + Send + Sync>;
}

/// A lazily-materialized, cached host-language callable extracted from a
/// CALLABLE-kinded CDT cell.
///
/// Design note §5 (reentrancy): the wrapper is stateless after
/// construction beyond the `OnceCell` cache — all per-call state lives in
/// the dispatch routine invoked through the cached handle, so a host
/// callable can be safely re-entered while a call into its own runtime is
/// still on the stack.
pub struct CallableWrapper {
    callable: Callable,
    invoker: Arc<dyn CallableInvoker>,
    cached: OnceCell<Arc<dyn Fn(Cdts) -> Result<Cdts, SerializeError> + Send + Sync>>,
}

impl CallableWrapper {
    /// Wrap `callable`, deferring materialization through `invoker` until
    /// first use.
    pub fn new(callable: Callable, invoker: Arc<dyn CallableInvoker>) -> Self {
        Self {
            callable,
            invoker,
            cached: OnceCell::new(),
        }
    }

    /// The underlying callable's declared types, for call-site validation
    /// before invoking.
    pub fn callable(&self) -> &Callable {
        &self.callable
    }

    /// Get (materializing on first call) the invocable handle.
    pub fn handle(&self) -> &Arc<dyn Fn(Cdts) -> Result<Cdts, SerializeError> + Send + Sync> {
        self.cached.get_or_init(|| self.invoker.materialize(&self.callable))
    }

    /// Invoke the wrapped callable with `params`, materializing the
    /// invocable handle on first use.
    pub fn call(&self, params: Cdts) -> Result<Cdts, SerializeError> {
        (self.handle())(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::raw::c_void;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingInvoker {
        calls: Arc<AtomicUsize>,
    }

    impl CallableInvoker for CountingInvoker {
        fn materialize(
            &self,
            _callable: &Callable,
        ) -> Arc<dyn Fn(Cdts) -> Result<Cdts, SerializeError> + Send + Sync> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Arc::new(|params| Ok(params))
        }
    }

    #[test]
    fn materialization_is_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let invoker = Arc::new(CountingInvoker { calls: calls.clone() });
        let callable = Callable::new(&1u8 as *const u8 as *const c_void, vec![], vec![]);
        let wrapper = CallableWrapper::new(callable, invoker);

        let _ = wrapper.handle();
        let _ = wrapper.handle();
        let _ = wrapper.handle();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn call_invokes_materialized_handle_with_params() {
        let calls = Arc::new(AtomicUsize::new(0));
        let invoker = Arc::new(CountingInvoker { calls: calls.clone() });
        let callable = Callable::new(&1u8 as *const u8 as *const c_void, vec![], vec![]);
        let wrapper = CallableWrapper::new(callable, invoker);

        let params = Cdts::new(2, 0);
        let retvals = wrapper.call(params).unwrap();
        assert_eq!(retvals.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
