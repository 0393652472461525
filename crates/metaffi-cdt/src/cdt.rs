//! `Cdt` — a single common-data-typed cell (§3, §4.2).

use crate::callable::Callable;
use crate::cdts::Cdts;
use crate::error::CdtError;
use crate::handle::Handle;
use metaffi_types::MetaffiType;

/// The payload carried by a `Cdt`, one variant per kind (§3).
///
/// Strings are stored as their code-unit buffer without an explicit null
/// terminator — the terminator is a wire-format detail added by
/// `metaffi_xllr`'s CDT marshalling, not part of this in-process
/// representation (see DESIGN.md).
macro_rules! scalar_accessors {
    ($set:ident, $get:ident, $kind:expr, $variant:ident, $ty:ty) => {
        /// Set this cell to a scalar value, replacing any prior payload.
        pub fn $set(&mut self, value: $ty) {
            self.free_inner();
            self.kind = $kind;
            self.payload = CdtPayload::$variant(value);
            self.free_required = false;
        }

        /// Read this cell as its scalar kind, failing on a tag mismatch.
        pub fn $get(&self) -> Result<$ty, CdtError> {
            match self.payload {
                CdtPayload::$variant(v) => Ok(v),
                _ => Err(self.mismatch($kind)),
            }
        }
    };
}

enum CdtPayload {
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    Bool(bool),
    Char8(u8),
    Char16(u16),
    Char32(u32),
    String8(Vec<u8>),
    String16(Vec<u16>),
    String32(Vec<u32>),
    Array(Box<Cdts>),
    Handle(Box<Handle>),
    Callable(Box<Callable>),
    Null,
}

/// A tagged cell carrying one cross-language value.
///
/// Invariants (§3): `kind` and `payload` always agree (enforced by
/// construction — there is no public way to build a `Cdt` with a
/// mismatched tag); `free_required` means this cell owns its payload and
/// must free it on destruction; for arrays the nested `Cdts` is owned
/// exclusively by the parent cell; handle ownership is data-driven via
/// `Handle`'s own `release_fn`, not by `free_required` (§9).
pub struct Cdt {
    kind: MetaffiType,
    payload: CdtPayload,
    free_required: bool,
}

impl Cdt {
    /// The null cell — the default for every freshly-allocated `Cdts` slot.
    pub fn null() -> Self {
        Self {
            kind: MetaffiType::NULL,
            payload: CdtPayload::Null,
            free_required: false,
        }
    }

    /// This cell's kind.
    pub fn kind(&self) -> MetaffiType {
        self.kind
    }

    /// Whether this cell owns its payload and must free it on drop.
    pub fn free_required(&self) -> bool {
        self.free_required
    }

    /// True if this cell is the null kind.
    pub fn is_null(&self) -> bool {
        matches!(self.payload, CdtPayload::Null)
    }

    fn mismatch(&self, expected: MetaffiType) -> CdtError {
        CdtError::KindMismatch {
            expected,
            actual: self.kind,
        }
    }

    // ------------------------------------------------------------------
    // Scalar setters
    // ------------------------------------------------------------------

    scalar_accessors!(set_int8, as_int8, MetaffiType::INT8, Int8, i8);
    scalar_accessors!(set_int16, as_int16, MetaffiType::INT16, Int16, i16);
    scalar_accessors!(set_int32, as_int32, MetaffiType::INT32, Int32, i32);
    scalar_accessors!(set_int64, as_int64, MetaffiType::INT64, Int64, i64);
    scalar_accessors!(set_uint8, as_uint8, MetaffiType::UINT8, UInt8, u8);
    scalar_accessors!(set_uint16, as_uint16, MetaffiType::UINT16, UInt16, u16);
    scalar_accessors!(set_uint32, as_uint32, MetaffiType::UINT32, UInt32, u32);
    scalar_accessors!(set_uint64, as_uint64, MetaffiType::UINT64, UInt64, u64);
    scalar_accessors!(set_float32, as_float32, MetaffiType::FLOAT32, Float32, f32);
    scalar_accessors!(set_float64, as_float64, MetaffiType::FLOAT64, Float64, f64);
    scalar_accessors!(set_bool, as_bool, MetaffiType::BOOL, Bool, bool);
    scalar_accessors!(set_char8, as_char8, MetaffiType::CHAR8, Char8, u8);
    scalar_accessors!(set_char16, as_char16, MetaffiType::CHAR16, Char16, u16);
    scalar_accessors!(set_char32, as_char32, MetaffiType::CHAR32, Char32, u32);

    /// Set this cell to null.
    pub fn set_null(&mut self) {
        self.free_inner();
        self.kind = MetaffiType::NULL;
        self.payload = CdtPayload::Null;
        self.free_required = false;
    }

    // ------------------------------------------------------------------
    // Strings
    // ------------------------------------------------------------------

    /// Set this cell to a UTF-8 string, copying `buf` into an owned buffer.
    /// Use `set_string8_owned` when the caller already holds a `Vec` it is
    /// donating (§4.3: "copied ... unless the caller explicitly donates
    /// ownership").
    pub fn set_string8(&mut self, buf: &[u8]) {
        self.set_string8_owned(buf.to_vec());
    }

    /// Set this cell to a UTF-8 string, taking ownership of `buf` directly
    /// with no copy.
    pub fn set_string8_owned(&mut self, buf: Vec<u8>) {
        self.free_inner();
        self.kind = MetaffiType::STRING8;
        self.payload = CdtPayload::String8(buf);
        self.free_required = true;
    }

    /// Set this cell to a UTF-16 string, copying `buf`.
    pub fn set_string16(&mut self, buf: &[u16]) {
        self.set_string16_owned(buf.to_vec());
    }

    /// Set this cell to a UTF-16 string, taking ownership of `buf` directly.
    pub fn set_string16_owned(&mut self, buf: Vec<u16>) {
        self.free_inner();
        self.kind = MetaffiType::STRING16;
        self.payload = CdtPayload::String16(buf);
        self.free_required = true;
    }

    /// Set this cell to a UTF-32 string, copying `buf`.
    pub fn set_string32(&mut self, buf: &[u32]) {
        self.set_string32_owned(buf.to_vec());
    }

    /// Set this cell to a UTF-32 string, taking ownership of `buf` directly.
    pub fn set_string32_owned(&mut self, buf: Vec<u32>) {
        self.free_inner();
        self.kind = MetaffiType::STRING32;
        self.payload = CdtPayload::String32(buf);
        self.free_required = true;
    }

    /// Read this cell's UTF-8 string bytes.
    pub fn as_string8(&self) -> Result<&[u8], CdtError> {
        match &self.payload {
            CdtPayload::String8(v) => Ok(v),
            _ => Err(self.mismatch(MetaffiType::STRING8)),
        }
    }

    /// Read this cell's UTF-16 string code units.
    pub fn as_string16(&self) -> Result<&[u16], CdtError> {
        match &self.payload {
            CdtPayload::String16(v) => Ok(v),
            _ => Err(self.mismatch(MetaffiType::STRING16)),
        }
    }

    /// Read this cell's UTF-32 string code units.
    pub fn as_string32(&self) -> Result<&[u32], CdtError> {
        match &self.payload {
            CdtPayload::String32(v) => Ok(v),
            _ => Err(self.mismatch(MetaffiType::STRING32)),
        }
    }

    // ------------------------------------------------------------------
    // Handles
    // ------------------------------------------------------------------

    /// Set this cell to a handle, taking ownership of it.
    pub fn set_handle(&mut self, handle: Handle) {
        self.free_inner();
        self.kind = MetaffiType::HANDLE;
        self.payload = CdtPayload::Handle(Box::new(handle));
        self.free_required = true;
    }

    /// Borrow this cell's handle.
    pub fn as_handle(&self) -> Result<&Handle, CdtError> {
        match &self.payload {
            CdtPayload::Handle(h) => Ok(h),
            _ => Err(self.mismatch(MetaffiType::HANDLE)),
        }
    }

    /// Mutably borrow this cell's handle (used by the ownership arbiter to
    /// null out a foreign `release_fn` before freeing, §4.8).
    pub fn as_handle_mut(&mut self) -> Result<&mut Handle, CdtError> {
        match &mut self.payload {
            CdtPayload::Handle(h) => Ok(h),
            _ => Err(CdtError::KindMismatch {
                expected: MetaffiType::HANDLE,
                actual: self.kind,
            }),
        }
    }

    /// Take ownership of this cell's handle, leaving the cell null and
    /// `free_required = false`.
    ///
    /// Models "shared ownership on extraction" for local-runtime handles
    /// (§4.3): once taken, the CDTS no longer frees it.
    pub fn take_handle(&mut self) -> Result<Handle, CdtError> {
        match std::mem::replace(&mut self.payload, CdtPayload::Null) {
            CdtPayload::Handle(h) => {
                self.kind = MetaffiType::NULL;
                self.free_required = false;
                Ok(*h)
            }
            other => {
                self.payload = other;
                Err(self.mismatch(MetaffiType::HANDLE))
            }
        }
    }

    // ------------------------------------------------------------------
    // Callables
    // ------------------------------------------------------------------

    /// Set this cell to a callable, copying it in.
    pub fn set_callable(&mut self, callable: Callable) {
        self.free_inner();
        self.kind = MetaffiType::CALLABLE;
        self.payload = CdtPayload::Callable(Box::new(callable));
        self.free_required = true;
    }

    /// Borrow this cell's callable.
    pub fn as_callable(&self) -> Result<&Callable, CdtError> {
        match &self.payload {
            CdtPayload::Callable(c) => Ok(c),
            _ => Err(self.mismatch(MetaffiType::CALLABLE)),
        }
    }

    /// Take ownership of this cell's callable, leaving the cell null and
    /// `free_required = false`. Used by callable extraction (§4.3), which
    /// materializes a host-language callable wrapper lazily per cell.
    pub fn take_callable(&mut self) -> Result<Callable, CdtError> {
        match std::mem::replace(&mut self.payload, CdtPayload::Null) {
            CdtPayload::Callable(c) => {
                self.kind = MetaffiType::NULL;
                self.free_required = false;
                Ok(*c)
            }
            other => {
                self.payload = other;
                Err(self.mismatch(MetaffiType::CALLABLE))
            }
        }
    }

    // ------------------------------------------------------------------
    // Arrays
    // ------------------------------------------------------------------

    /// Turn this cell into a new nested array of `length` null cells, of
    /// kind `array_of(common_base_kind)` and the given `rank` annotation.
    pub fn set_new_array(&mut self, length: usize, rank: u32, common_base_kind: MetaffiType) {
        self.free_inner();
        self.kind = MetaffiType::array_of(common_base_kind);
        self.payload = CdtPayload::Array(Box::new(Cdts::new(length, rank)));
        self.free_required = true;
    }

    /// Borrow this cell's nested CDTS.
    pub fn as_array(&self) -> Result<&Cdts, CdtError> {
        match &self.payload {
            CdtPayload::Array(a) => Ok(a),
            _ => Err(CdtError::KindMismatch {
                expected: MetaffiType::array_of(self.kind.base_kind()),
                actual: self.kind,
            }),
        }
    }

    /// Mutably borrow this cell's nested CDTS.
    pub fn as_array_mut(&mut self) -> Result<&mut Cdts, CdtError> {
        let kind = self.kind;
        match &mut self.payload {
            CdtPayload::Array(a) => Ok(a),
            _ => Err(CdtError::KindMismatch {
                expected: MetaffiType::array_of(kind.base_kind()),
                actual: kind,
            }),
        }
    }

    // ------------------------------------------------------------------
    // Free
    // ------------------------------------------------------------------

    fn free_inner(&mut self) {
        if !self.free_required {
            return;
        }
        match &mut self.payload {
            CdtPayload::Array(cdts) => cdts.free(),
            CdtPayload::Handle(handle) => {
                // Safety: this cell uniquely owns `handle`; nothing else
                // can reach it after `free_inner` replaces the payload.
                unsafe { handle.release() }
            }
            _ => {}
        }
    }

    /// Free this cell's payload if `free_required`. Cascades into nested
    /// arrays and invokes a handle's `release_fn` when still set (§4.2).
    pub fn free(&mut self) {
        self.free_inner();
        self.payload = CdtPayload::Null;
        self.kind = MetaffiType::NULL;
        self.free_required = false;
    }
}

impl Drop for Cdt {
    fn drop(&mut self) {
        self.free_inner();
    }
}

impl std::fmt::Debug for Cdt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cdt")
            .field("kind", &self.kind)
            .field("free_required", &self.free_required)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_round_trip_s1() {
        let mut cells = Cdts::new(3, 0);
        cells.get_mut(0).unwrap().set_int32(42);
        cells.get_mut(1).unwrap().set_float64(3.14);
        cells.get_mut(2).unwrap().set_bool(true);

        assert_eq!(cells.get(0).unwrap().kind(), MetaffiType::INT32);
        assert_eq!(cells.get(1).unwrap().kind(), MetaffiType::FLOAT64);
        assert_eq!(cells.get(2).unwrap().kind(), MetaffiType::BOOL);

        assert_eq!(cells.get(0).unwrap().as_int32().unwrap(), 42);
        assert_eq!(cells.get(1).unwrap().as_float64().unwrap(), 3.14);
        assert_eq!(cells.get(2).unwrap().as_bool().unwrap(), true);
    }

    #[test]
    fn kind_mismatch_on_wrong_accessor() {
        let mut c = Cdt::null();
        c.set_int32(1);
        assert!(matches!(c.as_bool(), Err(CdtError::KindMismatch { .. })));
    }

    #[test]
    fn string_round_trips_by_content() {
        let mut c = Cdt::null();
        c.set_string8(b"hello");
        assert_eq!(c.as_string8().unwrap(), b"hello");
        assert!(c.free_required());
    }

    #[test]
    fn nested_array_s2() {
        let mut outer = Cdt::null();
        outer.set_new_array(2, 2, MetaffiType::INT32);
        assert_eq!(outer.kind(), MetaffiType::array_of(MetaffiType::INT32));

        {
            let outer_arr = outer.as_array_mut().unwrap();
            assert_eq!(outer_arr.len(), 2);
            for row_i in 0..2 {
                let row = outer_arr.get_mut(row_i).unwrap();
                row.set_new_array(3, 1, MetaffiType::INT32);
                let row_arr = row.as_array_mut().unwrap();
                for (i, v) in [(0, 1 + row_i as i32 * 3), (1, 2 + row_i as i32 * 3), (2, 3 + row_i as i32 * 3)] {
                    row_arr.get_mut(i).unwrap().set_int32(v);
                }
            }
        }

        let outer_arr = outer.as_array().unwrap();
        assert_eq!(outer_arr.len(), 2);
        let row0 = outer_arr.get(0).unwrap().as_array().unwrap();
        assert_eq!(row0.len(), 3);
        assert_eq!(row0.get(0).unwrap().as_int32().unwrap(), 1);
        assert_eq!(row0.get(2).unwrap().as_int32().unwrap(), 3);
        let row1 = outer_arr.get(1).unwrap().as_array().unwrap();
        assert_eq!(row1.get(0).unwrap().as_int32().unwrap(), 4);
        assert_eq!(row1.get(2).unwrap().as_int32().unwrap(), 6);
    }

    #[test]
    fn take_handle_relinquishes_ownership() {
        let mut c = Cdt::null();
        c.set_handle(Handle::new(std::ptr::null_mut(), 1, None));
        assert!(c.free_required());
        let h = c.take_handle().unwrap();
        assert!(!c.free_required());
        assert!(c.is_null());
        drop(h);
    }
}
