//! `DynValue` — the dynamic-host-style value used by `Serializer::add` and
//! returned by `Deserializer::extract_value` (§4.3).
//!
//! A statically-typed host binding would dispatch per Rust type at compile
//! time (see `typed.rs`); a dynamically-typed host binding (Python-like)
//! carries one tagged value type and must pass the destination kind
//! explicitly for numeric and array-of-numeric cases "to defeat silent
//! widening or loss of precision" (§4.3). This module models that second
//! path so both interfaces are exercised (design note §9, "Dynamic
//! dispatch over host types").

use metaffi_cdt::{Callable, Handle};

/// A host value tagged with its own shape, independent of the destination
/// CDT kind. Numeric variants are deliberately wide (`i128`/`f64`) so a
/// single enum can represent any host integer literal prior to the
/// destination-kind range check in `Serializer::add`.
#[derive(Debug)]
pub enum DynValue {
    /// Any host integer literal, range-checked against the destination
    /// kind at `add` time.
    Integer(i128),
    /// A 32-bit float.
    Float32(f32),
    /// A 64-bit float.
    Float64(f64),
    /// A boolean.
    Bool(bool),
    /// A UTF-8 string.
    String8(Vec<u8>),
    /// A UTF-16 string.
    String16(Vec<u16>),
    /// A UTF-32 string.
    String32(Vec<u32>),
    /// A single code point, width implied by the destination kind.
    Character(u32),
    /// A nested array; element kind is the terminal leaf type of
    /// `Serializer::add`'s destination kind.
    Array(Vec<DynValue>),
    /// An opaque foreign-runtime handle.
    Handle(Handle),
    /// A value-form entity.
    Callable(Callable),
    /// The null/unit value.
    Null,
}

/// The discriminated union returned by `Deserializer::extract_value` for
/// the `any`-typed extraction path (§4.3: "any-type extraction").
///
/// Nested arrays of `any` are not supported by this path (§4.3); callers
/// who need an array must use `Deserializer::extract_array`.
#[derive(Debug)]
pub enum AnyValue {
    /// A signed or unsigned integer, widened to `i128`.
    Integer(i128),
    /// A 32-bit float.
    Float32(f32),
    /// A 64-bit float.
    Float64(f64),
    /// A boolean.
    Bool(bool),
    /// A UTF-8 string.
    String8(Vec<u8>),
    /// A UTF-16 string.
    String16(Vec<u16>),
    /// A UTF-32 string.
    String32(Vec<u32>),
    /// A single code point.
    Character(u32),
    /// An opaque foreign-runtime handle, extracted per the handle
    /// extraction policy (§4.3).
    Handle(Handle),
    /// A value-form entity.
    Callable(Callable),
    /// The null/unit value.
    Null,
}
