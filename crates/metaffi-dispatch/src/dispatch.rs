//! Call dispatch (§4.7): picks one of the four `xcall` variants, validates
//! cells against declared descriptors on the way in and out, and frees the
//! params CDTS through the handle-ownership arbiter once the call returns.

use crate::arbiter::disarm_and_free;
use crate::error::DispatchError;
use metaffi_cdt::Cdts;
use metaffi_entity::Entity;
use metaffi_types::{matches, MetaffiTypeInfo};
use metaffi_xllr::{cdts_from_raw, cdts_to_raw, free_raw_cdts, Dispatcher, RawXCall};
use std::sync::Arc;

/// Invoke `entity` with `params` already serialized by the caller
/// (§4.3/§4.7's division of labor: this crate dispatches, `metaffi_serializer`
/// builds the CDTS).
///
/// `params.len()` must equal `entity.params_types().len()`; the return
/// CDTS is allocated here at `entity.retval_types().len()`. Every param
/// cell is validated against its declared descriptor before the call; every
/// return cell is validated after (§4.7 points 1-2, 5).
pub fn call(
    entity: &Entity,
    dispatcher: &Arc<dyn Dispatcher>,
    local_runtime_id: u64,
    params: Cdts,
) -> Result<Cdts, DispatchError> {
    let xcall = entity.ensure_invocable()?;
    invoke(
        xcall,
        entity.params_types(),
        entity.retval_types(),
        dispatcher,
        local_runtime_id,
        params,
    )
}

/// The variant-selection and validation logic shared by entity calls and
/// callable call-backs (§4.7, §4.8): both ultimately resolve to an
/// `xcall` stub plus a declared params/retval shape.
pub(crate) fn invoke(
    xcall: *mut RawXCall,
    params_types: &[MetaffiTypeInfo],
    retval_types: &[MetaffiTypeInfo],
    dispatcher: &Arc<dyn Dispatcher>,
    local_runtime_id: u64,
    params: Cdts,
) -> Result<Cdts, DispatchError> {
    let declared_params = params_types.len();
    if params.len() != declared_params {
        return Err(DispatchError::ArityError {
            what: "params",
            declared: declared_params,
            supplied: params.len(),
        });
    }

    for (i, expected) in params_types.iter().enumerate() {
        let actual = actual_type_info(&params, i)?;
        if !matches(expected, &actual) {
            return Err(DispatchError::Serialize(metaffi_serializer::SerializeError::KindMismatch {
                expected: expected.kind(),
                actual: actual.kind(),
            }));
        }
    }

    let n_retvals = retval_types.len();
    let allocator = dispatcher.allocator();

    // `disarm_and_free` must run only after the call that was supposed to
    // receive `params` has actually happened — releasing a local handle's
    // resource before the callee touches it would pull it out from under
    // the call (§4.8's ordering applies to the whole dispatch, not just
    // the free that ends it). Each branch below captures the call's
    // result, disarms/frees `params`, tears down any raw wire buffers it
    // built, and only then propagates a dispatch error.
    let retvals = if declared_params == 0 && n_retvals == 0 {
        let result = dispatcher.xcall_no_params_no_ret(xcall);
        disarm_and_free(params, local_runtime_id);
        result?;
        Cdts::new(0, 0)
    } else if declared_params > 0 && n_retvals == 0 {
        let mut raw_params = cdts_to_raw(&params, allocator);
        let result = dispatcher.xcall_params_no_ret(xcall, &mut *raw_params);
        disarm_and_free(params, local_runtime_id);
        unsafe { free_raw_cdts(raw_params, allocator) };
        result?;
        Cdts::new(0, 0)
    } else if declared_params == 0 && n_retvals > 0 {
        let mut raw_retvals = cdts_to_raw(&Cdts::new(n_retvals, 0), allocator);
        let result = dispatcher.xcall_no_params_ret(xcall, &mut *raw_retvals);
        disarm_and_free(params, local_runtime_id);
        // Extract and free unconditionally — on an error `out` is just
        // discarded, but `raw_retvals` was still allocated and must not
        // leak on the error path either.
        let out = unsafe { cdts_from_raw(&raw_retvals) };
        unsafe { free_raw_cdts(raw_retvals, allocator) };
        result?;
        out
    } else {
        let mut raw_params = cdts_to_raw(&params, allocator);
        let mut raw_retvals = cdts_to_raw(&Cdts::new(n_retvals, 0), allocator);
        let params_ptr: *mut metaffi_xllr::RawCdts = &mut *raw_params;
        let retvals_ptr: *mut metaffi_xllr::RawCdts = &mut *raw_retvals;
        let mut slots: [*mut metaffi_xllr::RawCdts; 2] = [params_ptr, retvals_ptr];
        let result = dispatcher.xcall_params_ret(xcall, &mut slots);
        disarm_and_free(params, local_runtime_id);
        unsafe { free_raw_cdts(raw_params, allocator) };
        let out = unsafe { cdts_from_raw(&raw_retvals) };
        unsafe { free_raw_cdts(raw_retvals, allocator) };
        result?;
        out
    };

    if retvals.len() != n_retvals {
        return Err(DispatchError::ArityError {
            what: "retvals",
            declared: n_retvals,
            supplied: retvals.len(),
        });
    }

    for (i, expected) in retval_types.iter().enumerate() {
        let actual = actual_type_info(&retvals, i)?;
        if !matches(expected, &actual) {
            return Err(DispatchError::ReturnKindMismatch { index: i });
        }
    }

    Ok(retvals)
}

fn actual_type_info(cdts: &Cdts, index: usize) -> Result<MetaffiTypeInfo, DispatchError> {
    let cell = cdts.get(index).map_err(|e| DispatchError::Serialize(e.into()))?;
    let kind = cell.kind();
    if kind.is_array() {
        let dims = cell.as_array().map(|a| a.fixed_dimensions()).unwrap_or(0);
        Ok(MetaffiTypeInfo::with_alias_and_dimensions(kind, "", dims))
    } else {
        Ok(MetaffiTypeInfo::new(kind))
    }
}
