//! Errors raised while dispatching a call through an entity's `xcall`
//! (§4.7, §7).

use metaffi_entity::EntityError;
use metaffi_serializer::SerializeError;
use metaffi_xllr::XllrError;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The number of host args or declared retvals didn't match the
    /// entity's arity (§4.7 point 1).
    #[error("arity mismatch: entity declares {declared} {what}, call site supplied {supplied}")]
    ArityError {
        what: &'static str,
        declared: usize,
        supplied: usize,
    },

    /// A returned cell's kind didn't satisfy its declared descriptor
    /// (§4.7 point 5).
    #[error("return value {index} does not match its declared type")]
    ReturnKindMismatch { index: usize },

    #[error(transparent)]
    Serialize(#[from] SerializeError),

    #[error(transparent)]
    Entity(#[from] EntityError),

    #[error(transparent)]
    Xllr(#[from] XllrError),
}

/// `metaffi-serializer` cannot depend on this crate (§9 design note: that
/// dependency runs the other way), so a materialized `CallableWrapper`
/// invoked through `DispatchCallableInvoker` (`callable.rs`) flattens any
/// non-`Serialize` dispatch failure to `SerializeError::CallFailed`,
/// preserving the message.
impl From<DispatchError> for SerializeError {
    fn from(e: DispatchError) -> Self {
        match e {
            DispatchError::Serialize(inner) => inner,
            other => SerializeError::CallFailed(other.to_string()),
        }
    }
}
