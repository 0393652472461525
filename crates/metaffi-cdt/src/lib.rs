//! CDT/CDTS — the self-describing value container that flows across every
//! MetaFFI call (§3, §4.2).
//!
//! A `Cdt` is one tagged cell; a `Cdts` is the fixed-length sequence of
//! cells passed as a call's params or return values. Ownership is mostly
//! structural (`free_required` + cascade) except for handles, whose release
//! is data-driven by `runtime_id` (§9) — see `metaffi_dispatch::arbiter` for
//! the pre-free walk that enforces testable property 7.

mod callable;
mod cdt;
mod cdts;
mod error;
mod handle;

pub use callable::Callable;
pub use cdt::Cdt;
pub use cdts::Cdts;
pub use error::CdtError;
pub use handle::{Handle, ReleaseFn};
