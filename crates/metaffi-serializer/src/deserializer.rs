//! `Deserializer` — CDT(S) → host, the "deserialize" direction of §4.3.
//!
//! Symmetric to `Serializer`: `get` is the statically-typed path (strict
//! kind check, one operation per host type); `extract_value`/`peek_kind`/
//! `is_null` are the dynamically-typed path. Handle extraction follows the
//! ownership policy in §4.3 and §9: a local-runtime handle transfers to
//! shared host ownership (the CDTS relinquishes `free_required`); a
//! foreign handle is only a view (the CDTS keeps ownership and its
//! `release_fn` is nulled so the CDTS's own free path cannot cross back
//! into a runtime that may already be gone).

use crate::dynamic::AnyValue;
use crate::error::SerializeError;
use crate::typed::ReadCdt;
use metaffi_cdt::{Cdts, Handle};
use metaffi_types::MetaffiType;

/// The result of the array-path extraction (§4.3: "arrays are reassembled
/// by recursive traversal"). Distinct from `AnyValue` because the
/// any-extraction path does not support nested arrays (§4.3) — a caller
/// who knows a cell is array-valued uses `extract_array` and gets this
/// tree back instead.
#[derive(Debug)]
pub enum ArrayValue {
    /// A leaf element at the innermost rank.
    Leaf(AnyValue),
    /// A nested sub-array one rank down.
    Nested(Vec<ArrayValue>),
}

/// Reads host values back out of a `Cdts`, one cell per call in sequence.
pub struct Deserializer<'a> {
    cdts: &'a mut Cdts,
    cursor: usize,
    /// The id of the runtime this deserializer runs on behalf of, used by
    /// handle extraction to decide shared-ownership vs. view (§4.3).
    local_runtime_id: u64,
}

impl<'a> Deserializer<'a> {
    /// Wrap a `Cdts` for reading from the start, tagging this side with
    /// `local_runtime_id` for the handle extraction policy.
    pub fn new(cdts: &'a mut Cdts, local_runtime_id: u64) -> Self {
        Self {
            cdts,
            cursor: 0,
            local_runtime_id,
        }
    }

    /// Current read position.
    pub fn position(&self) -> usize {
        self.cursor
    }

    fn bounds_check(&self) -> Result<(), SerializeError> {
        if self.cursor >= self.cdts.len() {
            return Err(SerializeError::BoundsError {
                index: self.cursor,
                length: self.cdts.len(),
            });
        }
        Ok(())
    }

    /// The kind of the next unread cell, without consuming it.
    pub fn peek_kind(&self) -> Result<MetaffiType, SerializeError> {
        self.bounds_check()?;
        Ok(self.cdts.cells()[self.cursor].kind())
    }

    /// True if the next unread cell is null.
    pub fn is_null(&self) -> Result<bool, SerializeError> {
        self.bounds_check()?;
        Ok(self.cdts.cells()[self.cursor].is_null())
    }

    /// Statically-typed path: strict kind check against `T`.
    pub fn get<T: ReadCdt>(&mut self) -> Result<T, SerializeError> {
        self.bounds_check()?;
        let cell = &self.cdts.cells()[self.cursor];
        let value = T::read_cdt(cell)?;
        self.cursor += 1;
        Ok(value)
    }

    /// Dynamically-typed path: returns a discriminated union over every
    /// primitive kind plus handle and callable. Nested arrays of `any` are
    /// not supported (§4.3) — use `extract_array` for arrays.
    pub fn extract_value(&mut self) -> Result<AnyValue, SerializeError> {
        self.bounds_check()?;
        let index = self.cursor;
        let value = extract_leaf(self.cdts, index, self.local_runtime_id)?;
        self.cursor += 1;
        Ok(value)
    }

    /// Extract the cell at the cursor as an array, reassembling nested
    /// `Cdts` by recursive traversal (§4.3).
    pub fn extract_array(&mut self) -> Result<Vec<ArrayValue>, SerializeError> {
        self.bounds_check()?;
        let index = self.cursor;
        if !self.cdts.cells()[index].kind().is_array() {
            return Err(SerializeError::KindMismatch {
                expected: MetaffiType::bare_array(),
                actual: self.cdts.cells()[index].kind(),
            });
        }
        let result = extract_array_at(self.cdts, index, self.local_runtime_id)?;
        self.cursor += 1;
        Ok(result)
    }
}

fn extract_leaf(cdts: &mut Cdts, index: usize, local_runtime_id: u64) -> Result<AnyValue, SerializeError> {
    let kind = cdts.cells()[index].kind();
    Ok(match kind.base_kind() {
        MetaffiType::INT8 => AnyValue::Integer(cdts.cells()[index].as_int8()? as i128),
        MetaffiType::INT16 => AnyValue::Integer(cdts.cells()[index].as_int16()? as i128),
        MetaffiType::INT32 => AnyValue::Integer(cdts.cells()[index].as_int32()? as i128),
        MetaffiType::INT64 => AnyValue::Integer(cdts.cells()[index].as_int64()? as i128),
        MetaffiType::UINT8 => AnyValue::Integer(cdts.cells()[index].as_uint8()? as i128),
        MetaffiType::UINT16 => AnyValue::Integer(cdts.cells()[index].as_uint16()? as i128),
        MetaffiType::UINT32 => AnyValue::Integer(cdts.cells()[index].as_uint32()? as i128),
        MetaffiType::UINT64 => AnyValue::Integer(cdts.cells()[index].as_uint64()? as i128),
        MetaffiType::FLOAT32 => AnyValue::Float32(cdts.cells()[index].as_float32()?),
        MetaffiType::FLOAT64 => AnyValue::Float64(cdts.cells()[index].as_float64()?),
        MetaffiType::BOOL => AnyValue::Bool(cdts.cells()[index].as_bool()?),
        MetaffiType::STRING8 => AnyValue::String8(cdts.cells()[index].as_string8()?.to_vec()),
        MetaffiType::STRING16 => AnyValue::String16(cdts.cells()[index].as_string16()?.to_vec()),
        MetaffiType::STRING32 => AnyValue::String32(cdts.cells()[index].as_string32()?.to_vec()),
        MetaffiType::CHAR8 => AnyValue::Character(cdts.cells()[index].as_char8()? as u32),
        MetaffiType::CHAR16 => AnyValue::Character(cdts.cells()[index].as_char16()? as u32),
        MetaffiType::CHAR32 => AnyValue::Character(cdts.cells()[index].as_char32()?),
        MetaffiType::NULL => AnyValue::Null,
        MetaffiType::HANDLE => AnyValue::Handle(take_handle_at(cdts, index, local_runtime_id)?),
        MetaffiType::CALLABLE => AnyValue::Callable(cdts.get_mut(index)?.take_callable()?),
        other => {
            return Err(SerializeError::KindMismatch {
                expected: MetaffiType::ANY,
                actual: other,
            })
        }
    })
}

/// Extract the handle at `index`, applying the ownership policy (§4.3,
/// §9): local-runtime handles transfer to shared ownership (the cell's
/// `free_required` is cleared via `take_handle`); foreign handles stay
/// owned by the CDTS, but their `release_fn` is nulled so this CDTS's own
/// free path never calls back into the foreign runtime.
fn take_handle_at(cdts: &mut Cdts, index: usize, local_runtime_id: u64) -> Result<Handle, SerializeError> {
    let cell = cdts.get_mut(index)?;
    let is_local = cell.as_handle()?.is_local(local_runtime_id);
    if is_local {
        Ok(cell.take_handle()?)
    } else {
        let h = cell.as_handle_mut()?;
        h.clear_release_fn();
        Ok(Handle::new(h.raw(), h.runtime_id(), None))
    }
}

fn extract_array_at(cdts: &mut Cdts, index: usize, local_runtime_id: u64) -> Result<Vec<ArrayValue>, SerializeError> {
    let nested = cdts.get_mut(index)?.as_array_mut()?;
    let mut out = Vec::with_capacity(nested.len());
    for i in 0..nested.len() {
        if nested.get(i)?.kind().is_array() {
            out.push(ArrayValue::Nested(extract_array_at(nested, i, local_runtime_id)?));
        } else {
            out.push(ArrayValue::Leaf(extract_leaf(nested, i, local_runtime_id)?));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::Serializer;
    use metaffi_cdt::Cdts;

    fn leaf_int(v: &ArrayValue) -> i128 {
        match v {
            ArrayValue::Leaf(AnyValue::Integer(i)) => *i,
            _ => panic!("expected integer leaf"),
        }
    }

    #[test]
    fn typed_round_trip_s1() {
        let mut cdts = Cdts::new(3, 0);
        {
            let mut ser = Serializer::new(&mut cdts);
            ser.set(42i32).unwrap();
            ser.set(3.14f64).unwrap();
            ser.set(true).unwrap();
        }
        let mut de = Deserializer::new(&mut cdts, 0);
        assert_eq!(de.get::<i32>().unwrap(), 42);
        assert_eq!(de.get::<f64>().unwrap(), 3.14);
        assert_eq!(de.get::<bool>().unwrap(), true);
    }

    #[test]
    fn nested_array_round_trip_s2() {
        use crate::dynamic::DynValue;
        let mut cdts = Cdts::new(1, 0);
        {
            let mut ser = Serializer::new(&mut cdts);
            let value = DynValue::Array(vec![
                DynValue::Array(vec![DynValue::Integer(1), DynValue::Integer(2), DynValue::Integer(3)]),
                DynValue::Array(vec![DynValue::Integer(4), DynValue::Integer(5), DynValue::Integer(6)]),
            ]);
            ser.add(value, MetaffiType::array_of(MetaffiType::INT32)).unwrap();
        }

        let mut de = Deserializer::new(&mut cdts, 0);
        let arr = de.extract_array().unwrap();
        assert_eq!(arr.len(), 2);
        let ArrayValue::Nested(row0) = &arr[0] else { panic!() };
        assert_eq!(leaf_int(&row0[0]), 1);
        assert_eq!(leaf_int(&row0[2]), 3);
        let ArrayValue::Nested(row1) = &arr[1] else { panic!() };
        assert_eq!(leaf_int(&row1[2]), 6);
    }

    #[test]
    fn local_handle_takes_shared_ownership_s4() {
        let mut cdts = Cdts::new(1, 0);
        cdts.get_mut(0)
            .unwrap()
            .set_handle(Handle::new(std::ptr::null_mut(), 1, None));
        let mut de = Deserializer::new(&mut cdts, 1);
        let AnyValue::Handle(h) = de.extract_value().unwrap() else {
            panic!("expected handle")
        };
        assert!(h.is_local(1));
        assert!(!cdts.get(0).unwrap().free_required());
    }

    #[test]
    fn foreign_handle_is_only_a_view_s4() {
        let mut cdts = Cdts::new(1, 0);
        cdts.get_mut(0)
            .unwrap()
            .set_handle(Handle::new(std::ptr::null_mut(), 42, None));
        let mut de = Deserializer::new(&mut cdts, 1);
        let AnyValue::Handle(h) = de.extract_value().unwrap() else {
            panic!("expected handle")
        };
        assert!(!h.is_local(1));
        assert!(h.release_fn().is_none());
    }
}
