//! Type kinds and type descriptors.
//!
//! `MetaffiType` is a bitfield identifying one of the primitive kinds,
//! optionally modified by the `array` flag. `MetaffiTypeInfo` pairs a kind
//! with an optional host-side alias and a dimension annotation, and is the
//! unit every call-site type list is built from.

use std::fmt;

mod kind;
mod info;
mod matching;

pub use kind::MetaffiType;
pub use info::MetaffiTypeInfo;
pub use matching::matches;

/// Sentinel used by `MetaffiTypeInfo::fixed_dimensions` for ragged or
/// unknown-rank arrays (wire layout: `u32::MAX`).
pub const MIXED_OR_UNKNOWN: u32 = u32::MAX;

/// Errors raised while building or comparing type descriptors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TypeError {
    /// A cell's kind does not satisfy its descriptor.
    #[error("kind mismatch: expected {expected}, got {actual}")]
    KindMismatch {
        /// The expected kind, formatted for display.
        expected: String,
        /// The actual kind, formatted for display.
        actual: String,
    },
}

impl fmt::Display for MetaffiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
