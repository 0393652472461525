//! Statically-typed serialization (§4.3): "for statically-typed hosts
//! (C++-like), one operation per host type; the target CDT kind is implied
//! by the host type."
//!
//! Rust is itself a statically-typed host, so this is the interface a
//! Rust-native caller uses directly: `Serializer::set(value)` with no
//! explicit kind argument, dispatched by `WriteCdt`/`ReadCdt` impls below.
//! Design note §9 calls for exposing *both* interfaces rather than picking
//! one — `dynamic.rs` / `Serializer::add` is the other.

use crate::error::SerializeError;
use metaffi_cdt::Cdt;
use metaffi_types::MetaffiType;

/// Write `self` into a CDT cell, implying the destination kind from the
/// Rust type.
pub trait WriteCdt {
    /// Write this value into `cell`, replacing any prior payload.
    fn write_cdt(self, cell: &mut Cdt);
}

/// Read a CDT cell back into `Self`, failing with `KindMismatch` if the
/// cell's tag does not match.
pub trait ReadCdt: Sized {
    /// Read `cell` as `Self`.
    fn read_cdt(cell: &Cdt) -> Result<Self, SerializeError>;
}

macro_rules! impl_scalar {
    ($ty:ty, $set:ident, $get:ident) => {
        impl WriteCdt for $ty {
            fn write_cdt(self, cell: &mut Cdt) {
                cell.$set(self);
            }
        }

        impl ReadCdt for $ty {
            fn read_cdt(cell: &Cdt) -> Result<Self, SerializeError> {
                Ok(cell.$get()?)
            }
        }
    };
}

impl_scalar!(i8, set_int8, as_int8);
impl_scalar!(i16, set_int16, as_int16);
impl_scalar!(i32, set_int32, as_int32);
impl_scalar!(i64, set_int64, as_int64);
impl_scalar!(u8, set_uint8, as_uint8);
impl_scalar!(u16, set_uint16, as_uint16);
impl_scalar!(u32, set_uint32, as_uint32);
impl_scalar!(u64, set_uint64, as_uint64);
impl_scalar!(f32, set_float32, as_float32);
impl_scalar!(f64, set_float64, as_float64);
impl_scalar!(bool, set_bool, as_bool);

impl WriteCdt for String {
    fn write_cdt(self, cell: &mut Cdt) {
        cell.set_string8_owned(self.into_bytes());
    }
}

impl WriteCdt for &str {
    fn write_cdt(self, cell: &mut Cdt) {
        cell.set_string8(self.as_bytes());
    }
}

impl ReadCdt for String {
    fn read_cdt(cell: &Cdt) -> Result<Self, SerializeError> {
        let bytes = cell.as_string8()?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

/// The kind a `WriteCdt`/`ReadCdt` implementor maps to, used by the
/// dispatcher (§4.7) to validate a cell against its declared descriptor
/// without re-deriving the kind from the Rust type at each call site.
pub trait TypedKind {
    /// The CDT kind this Rust type corresponds to.
    const KIND: MetaffiType;
}

macro_rules! impl_typed_kind {
    ($ty:ty, $kind:expr) => {
        impl TypedKind for $ty {
            const KIND: MetaffiType = $kind;
        }
    };
}

impl_typed_kind!(i8, MetaffiType::INT8);
impl_typed_kind!(i16, MetaffiType::INT16);
impl_typed_kind!(i32, MetaffiType::INT32);
impl_typed_kind!(i64, MetaffiType::INT64);
impl_typed_kind!(u8, MetaffiType::UINT8);
impl_typed_kind!(u16, MetaffiType::UINT16);
impl_typed_kind!(u32, MetaffiType::UINT32);
impl_typed_kind!(u64, MetaffiType::UINT64);
impl_typed_kind!(f32, MetaffiType::FLOAT32);
impl_typed_kind!(f64, MetaffiType::FLOAT64);
impl_typed_kind!(bool, MetaffiType::BOOL);
impl_typed_kind!(String, MetaffiType::STRING8);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_round_trip() {
        let mut cell = Cdt::null();
        42i32.write_cdt(&mut cell);
        assert_eq!(i32::read_cdt(&cell).unwrap(), 42);
    }

    #[test]
    fn string_round_trip() {
        let mut cell = Cdt::null();
        "hello".write_cdt(&mut cell);
        assert_eq!(String::read_cdt(&cell).unwrap(), "hello");
    }

    #[test]
    fn wrong_accessor_is_kind_mismatch() {
        let mut cell = Cdt::null();
        42i32.write_cdt(&mut cell);
        assert!(matches!(bool::read_cdt(&cell), Err(SerializeError::KindMismatch { .. })));
    }
}
