//! Bidirectional conversion between native host values and CDTS (§4.3).
//!
//! Two directions, each with two interfaces per design note §9
//! ("expose both"): `Serializer`/`typed::WriteCdt` is the statically-typed
//! host path (kind implied by the Rust type); `Serializer::add`/
//! `dynamic::DynValue` is the dynamically-typed host path (kind mandatory,
//! defeats silent widening). `Deserializer` mirrors both on the way out.

mod callable_wrapper;
mod deserializer;
mod dynamic;
mod error;
mod range;
mod serializer;
mod typed;

pub use callable_wrapper::{CallableInvoker, CallableWrapper};
pub use deserializer::{ArrayValue, Deserializer};
pub use dynamic::{AnyValue, DynValue};
pub use error::SerializeError;
pub use serializer::Serializer;
pub use typed::{ReadCdt, TypedKind, WriteCdt};
