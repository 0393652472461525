//! Errors raised while serializing host values into a CDTS or deserializing
//! them back out (§4.3, §7).

use metaffi_cdt::CdtError;
use metaffi_types::MetaffiType;

/// Errors raised by a `Serializer`/`Deserializer`.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    /// A numeric value does not fit the destination integer kind's range
    /// (§4.3, §7, testable property 3).
    #[error("value {value} out of range for {kind} (expected [{lo}, {hi}])")]
    RangeError {
        /// The kind the value was being serialized into.
        kind: MetaffiType,
        /// The rejected value, formatted for display.
        value: String,
        /// Inclusive lower bound of the destination kind.
        lo: i128,
        /// Inclusive upper bound of the destination kind.
        hi: i128,
    },

    /// The cursor moved past the end of the CDTS (§4.3, §7).
    #[error("index {index} out of bounds for a CDTS of length {length}")]
    BoundsError {
        /// The index that was requested.
        index: usize,
        /// The CDTS length.
        length: usize,
    },

    /// A deserialize accessor was called for the wrong host type.
    #[error("kind mismatch: cell is {actual}, requested {expected}")]
    KindMismatch {
        /// The kind the accessor required.
        expected: MetaffiType,
        /// The cell's actual kind.
        actual: MetaffiType,
    },

    /// A callable-valued cell's function pointer was null (§7).
    #[error("callable cell has a null function pointer")]
    NullCallable,

    /// A materialized callable's cross-runtime callback failed during
    /// dispatch. The dispatch-layer error is flattened to its message here
    /// because this crate must not depend on `metaffi-dispatch` (§9 design
    /// note: avoids a dependency cycle, since `metaffi-dispatch` itself
    /// depends on `metaffi-serializer`).
    #[error("callable invocation failed: {0}")]
    CallFailed(String),
}

impl From<CdtError> for SerializeError {
    fn from(e: CdtError) -> Self {
        match e {
            CdtError::KindMismatch { expected, actual } => SerializeError::KindMismatch { expected, actual },
            CdtError::BoundsError { index, length } => SerializeError::BoundsError { index, length },
            CdtError::NullCallable => SerializeError::NullCallable,
        }
    }
}
