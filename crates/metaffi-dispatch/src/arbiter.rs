//! Handle-ownership arbiter (§4.8, §9, testable property 7).
//!
//! Every handle cell carries a `runtime_id`. Before a CDTS is freed, a
//! pre-free walk visits every handle reachable from the buffer (including
//! inside nested arrays) and, for any handle whose `runtime_id` is not the
//! local runtime's, clears its release function so the destructor becomes
//! a no-op. Handles are not modeled as a single smart pointer (§9): the
//! release decision is data-driven, read off each `Handle` at walk time.

use metaffi_cdt::Cdts;
use metaffi_types::MetaffiType;

/// Walk every cell in `cdts`, recursing into arrays, and clear
/// `release_fn` on any handle not owned by `local_runtime_id`.
pub fn disarm_foreign_handles(cdts: &mut Cdts, local_runtime_id: u64) {
    for cell in cdts.cells_mut() {
        match cell.kind() {
            MetaffiType::HANDLE => {
                if let Ok(handle) = cell.as_handle_mut() {
                    if !handle.is_local(local_runtime_id) {
                        handle.clear_release_fn();
                    }
                }
            }
            k if k.is_array() => {
                if let Ok(nested) = cell.as_array_mut() {
                    disarm_foreign_handles(nested, local_runtime_id);
                }
            }
            _ => {}
        }
    }
}

/// Disarm foreign handles, then free every cell (§4.8's mandatory
/// ordering: the walk must happen before any cell's destructor runs).
pub fn disarm_and_free(mut cdts: Cdts, local_runtime_id: u64) {
    disarm_foreign_handles(&mut cdts, local_runtime_id);
    cdts.free();
}
