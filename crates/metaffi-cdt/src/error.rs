//! Errors raised by CDT/CDTS accessors (§7).

use metaffi_types::MetaffiType;

/// Errors raised while reading, writing, or walking a CDT/CDTS.
#[derive(Debug, thiserror::Error)]
pub enum CdtError {
    /// A cell was accessed with an accessor for the wrong kind (§4.2).
    #[error("kind mismatch: cell is {actual}, accessor expected {expected}")]
    KindMismatch {
        /// The kind the accessor required.
        expected: MetaffiType,
        /// The cell's actual kind.
        actual: MetaffiType,
    },

    /// A cursor moved past the end of a CDTS (§4.3, §7).
    #[error("index {index} out of bounds for a CDTS of length {length}")]
    BoundsError {
        /// The index that was requested.
        index: usize,
        /// The CDTS length.
        length: usize,
    },

    /// A callable cell's function pointer was null (§7).
    #[error("callable cell has a null function pointer")]
    NullCallable,
}
