//! `Serializer` — host → CDT(S), the "serialize" direction of §4.3.
//!
//! Wraps a `Cdts` and a cursor. `set` is the statically-typed path (kind
//! implied by the Rust type, §4.3 first paragraph); `add` is the
//! dynamically-typed path (kind mandatory, §4.3 second paragraph) kept
//! alongside it per design note §9's "expose both interfaces" guidance.

use crate::dynamic::DynValue;
use crate::error::SerializeError;
use crate::range::check_integer_range;
use crate::typed::WriteCdt;
use metaffi_cdt::{Cdt, Cdts};
use metaffi_types::MetaffiType;

/// Serializes host values into a `Cdts`, one cell per call in sequence.
pub struct Serializer<'a> {
    cdts: &'a mut Cdts,
    cursor: usize,
}

impl<'a> Serializer<'a> {
    /// Wrap a freshly-allocated (or reused) `Cdts` for writing from the
    /// start.
    pub fn new(cdts: &'a mut Cdts) -> Self {
        Self { cdts, cursor: 0 }
    }

    /// Current write position.
    pub fn position(&self) -> usize {
        self.cursor
    }

    fn next_cell(&mut self) -> Result<&mut Cdt, SerializeError> {
        let index = self.cursor;
        let length = self.cdts.len();
        let cell = self
            .cdts
            .get_mut(index)
            .map_err(|_| SerializeError::BoundsError { index, length })?;
        self.cursor += 1;
        Ok(cell)
    }

    /// Statically-typed path: the destination kind is implied by `T`
    /// (§4.3). Used by statically-typed host bindings; Rust call sites use
    /// this directly.
    pub fn set<T: WriteCdt>(&mut self, value: T) -> Result<(), SerializeError> {
        let cell = self.next_cell()?;
        value.write_cdt(cell);
        Ok(())
    }

    /// Dynamically-typed path: `target_kind` is mandatory for numeric and
    /// array-of-numeric cases "to defeat silent widening or loss of
    /// precision" (§4.3). Range-checks integers before writing anything
    /// (§7: "range errors in serialization are reported before any plugin
    /// call happens").
    pub fn add(&mut self, value: DynValue, target_kind: MetaffiType) -> Result<(), SerializeError> {
        let index = self.cursor;
        let length = self.cdts.len();
        if index >= length {
            return Err(SerializeError::BoundsError { index, length });
        }
        write_dynamic(self.cdts.get_mut(index)?, value, target_kind)?;
        self.cursor += 1;
        Ok(())
    }
}

fn write_dynamic(cell: &mut Cdt, value: DynValue, target_kind: MetaffiType) -> Result<(), SerializeError> {
    if target_kind.is_array() {
        let DynValue::Array(items) = value else {
            return Err(SerializeError::KindMismatch {
                expected: target_kind,
                actual: MetaffiType::NULL,
            });
        };
        return write_array(cell, items, target_kind.base_kind());
    }

    match (target_kind, value) {
        (k, DynValue::Integer(v)) if k.is_integer() => {
            check_integer_range(k, v)?;
            write_integer(cell, k, v);
            Ok(())
        }
        (MetaffiType::FLOAT32, DynValue::Float32(v)) => {
            cell.set_float32(v);
            Ok(())
        }
        (MetaffiType::FLOAT64, DynValue::Float64(v)) => {
            cell.set_float64(v);
            Ok(())
        }
        (MetaffiType::BOOL, DynValue::Bool(v)) => {
            cell.set_bool(v);
            Ok(())
        }
        (MetaffiType::STRING8, DynValue::String8(v)) => {
            cell.set_string8_owned(v);
            Ok(())
        }
        (MetaffiType::STRING16, DynValue::String16(v)) => {
            cell.set_string16_owned(v);
            Ok(())
        }
        (MetaffiType::STRING32, DynValue::String32(v)) => {
            cell.set_string32_owned(v);
            Ok(())
        }
        (MetaffiType::CHAR8, DynValue::Character(v)) => {
            cell.set_char8(v as u8);
            Ok(())
        }
        (MetaffiType::CHAR16, DynValue::Character(v)) => {
            cell.set_char16(v as u16);
            Ok(())
        }
        (MetaffiType::CHAR32, DynValue::Character(v)) => {
            cell.set_char32(v);
            Ok(())
        }
        (MetaffiType::HANDLE, DynValue::Handle(h)) => {
            cell.set_handle(h);
            Ok(())
        }
        (MetaffiType::CALLABLE, DynValue::Callable(c)) => {
            cell.set_callable(c);
            Ok(())
        }
        (MetaffiType::NULL, DynValue::Null) => {
            cell.set_null();
            Ok(())
        }
        (k, _) => Err(SerializeError::KindMismatch {
            expected: k,
            actual: MetaffiType::NULL,
        }),
    }
}

fn write_integer(cell: &mut Cdt, kind: MetaffiType, value: i128) {
    match kind {
        MetaffiType::INT8 => cell.set_int8(value as i8),
        MetaffiType::INT16 => cell.set_int16(value as i16),
        MetaffiType::INT32 => cell.set_int32(value as i32),
        MetaffiType::INT64 => cell.set_int64(value as i64),
        MetaffiType::UINT8 => cell.set_uint8(value as u8),
        MetaffiType::UINT16 => cell.set_uint16(value as u16),
        MetaffiType::UINT32 => cell.set_uint32(value as u32),
        MetaffiType::UINT64 => cell.set_uint64(value as u64),
        _ => unreachable!("write_integer called with a non-integer kind"),
    }
}

/// Build a nested `Cdts` for an array value (§3, §4.3: "arrays become
/// nested CDTS of rank equal to vector depth; element kind is the terminal
/// leaf type"). Rank is derived from how deep `items` nests, not passed in.
fn write_array(cell: &mut Cdt, items: Vec<DynValue>, base_kind: MetaffiType) -> Result<(), SerializeError> {
    let rank = array_rank(&items);
    cell.set_new_array(items.len(), rank, base_kind);
    let nested = cell.as_array_mut()?;
    for (i, item) in items.into_iter().enumerate() {
        let slot = nested.get_mut(i)?;
        match item {
            DynValue::Array(inner) => write_array(slot, inner, base_kind)?,
            leaf => write_dynamic(slot, leaf, base_kind)?,
        }
    }
    Ok(())
}

fn array_rank(items: &[DynValue]) -> u32 {
    match items.first() {
        Some(DynValue::Array(inner)) => 1 + array_rank(inner),
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metaffi_types::MetaffiType;

    #[test]
    fn typed_and_dynamic_paths_agree_s1() {
        let mut cdts = Cdts::new(3, 0);
        {
            let mut ser = Serializer::new(&mut cdts);
            ser.set(42i32).unwrap();
            ser.set(3.14f64).unwrap();
            ser.set(true).unwrap();
        }
        assert_eq!(cdts.get(0).unwrap().as_int32().unwrap(), 42);
        assert_eq!(cdts.get(1).unwrap().as_float64().unwrap(), 3.14);
        assert_eq!(cdts.get(2).unwrap().as_bool().unwrap(), true);
    }

    #[test]
    fn dynamic_range_rejection_s3() {
        let mut cdts = Cdts::new(1, 0);
        let mut ser = Serializer::new(&mut cdts);
        assert!(matches!(
            ser.add(DynValue::Integer(300), MetaffiType::INT8),
            Err(SerializeError::RangeError { .. })
        ));
    }

    #[test]
    fn dynamic_range_rejection_unsigned_underflow_s3() {
        let mut cdts = Cdts::new(1, 0);
        let mut ser = Serializer::new(&mut cdts);
        assert!(matches!(
            ser.add(DynValue::Integer(-1), MetaffiType::UINT8),
            Err(SerializeError::RangeError { .. })
        ));
    }

    #[test]
    fn dynamic_range_boundary_accepted_s3() {
        let mut cdts = Cdts::new(2, 0);
        let mut ser = Serializer::new(&mut cdts);
        assert!(ser.add(DynValue::Integer(127), MetaffiType::INT8).is_ok());
        assert!(ser.add(DynValue::Integer(0), MetaffiType::UINT8).is_ok());
    }

    #[test]
    fn nested_array_serialization_s2() {
        let mut cdts = Cdts::new(1, 0);
        let mut ser = Serializer::new(&mut cdts);
        let value = DynValue::Array(vec![
            DynValue::Array(vec![DynValue::Integer(1), DynValue::Integer(2), DynValue::Integer(3)]),
            DynValue::Array(vec![DynValue::Integer(4), DynValue::Integer(5), DynValue::Integer(6)]),
        ]);
        ser.add(value, MetaffiType::array_of(MetaffiType::INT32)).unwrap();

        let outer = cdts.get(0).unwrap();
        assert_eq!(outer.kind(), MetaffiType::array_of(MetaffiType::INT32));
        let outer_arr = outer.as_array().unwrap();
        assert_eq!(outer_arr.len(), 2);
        let row0 = outer_arr.get(0).unwrap().as_array().unwrap();
        assert_eq!(row0.get(0).unwrap().as_int32().unwrap(), 1);
        assert_eq!(row0.get(2).unwrap().as_int32().unwrap(), 3);
        let row1 = outer_arr.get(1).unwrap().as_array().unwrap();
        assert_eq!(row1.get(2).unwrap().as_int32().unwrap(), 6);
    }

    #[test]
    fn out_of_bounds_write_fails_s4() {
        let mut cdts = Cdts::new(1, 0);
        let mut ser = Serializer::new(&mut cdts);
        ser.set(1i32).unwrap();
        assert!(matches!(ser.set(2i32), Err(SerializeError::BoundsError { .. })));
    }
}
