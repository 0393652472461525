//! `MetaffiType` — the primitive-kind bitfield.
//!
//! Primitive kinds occupy the low bits and are mutually exclusive; `ARRAY`
//! is a modifier bit that can be ORed onto any of them. `ANY` is a wildcard
//! kind used only in type descriptors, never stamped on a CDT cell.

/// A type kind, optionally modified by the array flag.
///
/// Matches the wire encoding in spec §6: a plain integer tag with one bit
/// reserved as an "array" modifier, same shape as a NaN-boxed tag but
/// without the payload packing `raya_sdk::NativeValue` uses — a CDT's
/// payload lives alongside the tag, not inside it (see `metaffi_cdt::Cdt`).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MetaffiType(u32);

// Primitive base kinds (low 16 bits; mutually exclusive).
const BASE_INT8: u32 = 1;
const BASE_INT16: u32 = 2;
const BASE_INT32: u32 = 3;
const BASE_INT64: u32 = 4;
const BASE_UINT8: u32 = 5;
const BASE_UINT16: u32 = 6;
const BASE_UINT32: u32 = 7;
const BASE_UINT64: u32 = 8;
const BASE_FLOAT32: u32 = 9;
const BASE_FLOAT64: u32 = 10;
const BASE_BOOL: u32 = 11;
const BASE_STRING8: u32 = 12;
const BASE_STRING16: u32 = 13;
const BASE_STRING32: u32 = 14;
const BASE_CHAR8: u32 = 15;
const BASE_CHAR16: u32 = 16;
const BASE_CHAR32: u32 = 17;
const BASE_HANDLE: u32 = 18;
const BASE_CALLABLE: u32 = 19;
const BASE_NULL: u32 = 20;
const BASE_ANY: u32 = 21;

const BASE_MASK: u32 = 0x0000_FFFF;
const ARRAY_BIT: u32 = 1 << 16;

impl MetaffiType {
    /// signed 8-bit integer
    pub const INT8: Self = Self(BASE_INT8);
    /// signed 16-bit integer
    pub const INT16: Self = Self(BASE_INT16);
    /// signed 32-bit integer
    pub const INT32: Self = Self(BASE_INT32);
    /// signed 64-bit integer
    pub const INT64: Self = Self(BASE_INT64);
    /// unsigned 8-bit integer
    pub const UINT8: Self = Self(BASE_UINT8);
    /// unsigned 16-bit integer
    pub const UINT16: Self = Self(BASE_UINT16);
    /// unsigned 32-bit integer
    pub const UINT32: Self = Self(BASE_UINT32);
    /// unsigned 64-bit integer
    pub const UINT64: Self = Self(BASE_UINT64);
    /// IEEE-754 single precision float
    pub const FLOAT32: Self = Self(BASE_FLOAT32);
    /// IEEE-754 double precision float
    pub const FLOAT64: Self = Self(BASE_FLOAT64);
    /// boolean
    pub const BOOL: Self = Self(BASE_BOOL);
    /// UTF-8 string
    pub const STRING8: Self = Self(BASE_STRING8);
    /// UTF-16 string
    pub const STRING16: Self = Self(BASE_STRING16);
    /// UTF-32 string
    pub const STRING32: Self = Self(BASE_STRING32);
    /// 8-bit character
    pub const CHAR8: Self = Self(BASE_CHAR8);
    /// 16-bit character
    pub const CHAR16: Self = Self(BASE_CHAR16);
    /// 32-bit character
    pub const CHAR32: Self = Self(BASE_CHAR32);
    /// opaque foreign-runtime handle
    pub const HANDLE: Self = Self(BASE_HANDLE);
    /// callable (function pointer + signature)
    pub const CALLABLE: Self = Self(BASE_CALLABLE);
    /// null / unit
    pub const NULL: Self = Self(BASE_NULL);
    /// wildcard — descriptors only, never a CDT cell tag
    pub const ANY: Self = Self(BASE_ANY);

    /// Build a kind from its base plus the array modifier.
    pub const fn array_of(base: Self) -> Self {
        Self(base.0 | ARRAY_BIT)
    }

    /// The raw wire bitfield (§6: "Type kind (`metaffi_type`): a
    /// bitfield"). Used only at the XLLR ABI boundary.
    pub const fn to_raw(self) -> u32 {
        self.0
    }

    /// Reconstruct a kind from its raw wire bitfield.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The pseudo-kind "array without a specified base" (§4.1): an
    /// `expected` descriptor built from this matches an array `actual` of
    /// any base kind. Never appears as a CDT cell tag.
    pub const fn bare_array() -> Self {
        Self(ARRAY_BIT)
    }

    /// True if this is the bare-array pseudo-kind.
    pub const fn is_bare_array(self) -> bool {
        self.0 == ARRAY_BIT
    }

    /// True if the `array` bit is set.
    pub const fn is_array(self) -> bool {
        self.0 & ARRAY_BIT != 0
    }

    /// The kind with the array bit cleared.
    pub const fn base_kind(self) -> Self {
        Self(self.0 & BASE_MASK)
    }

    /// True if this is exactly (or an array of) `ANY`.
    pub const fn has_any_flag(self) -> bool {
        self.base_kind().0 == BASE_ANY
    }

    /// True if this kind is one of the fixed-width integer kinds.
    pub const fn is_integer(self) -> bool {
        matches!(
            self.base_kind().0,
            BASE_INT8 | BASE_INT16 | BASE_INT32 | BASE_INT64 | BASE_UINT8 | BASE_UINT16 | BASE_UINT32 | BASE_UINT64
        )
    }

    /// Inclusive `[lo, hi]` bounds for an integer kind, as `i128` to hold
    /// `u64::MAX` without loss. Returns `None` for non-integer kinds.
    pub const fn integer_bounds(self) -> Option<(i128, i128)> {
        Some(match self.base_kind().0 {
            BASE_INT8 => (i8::MIN as i128, i8::MAX as i128),
            BASE_INT16 => (i16::MIN as i128, i16::MAX as i128),
            BASE_INT32 => (i32::MIN as i128, i32::MAX as i128),
            BASE_INT64 => (i64::MIN as i128, i64::MAX as i128),
            BASE_UINT8 => (0, u8::MAX as i128),
            BASE_UINT16 => (0, u16::MAX as i128),
            BASE_UINT32 => (0, u32::MAX as i128),
            BASE_UINT64 => (0, u64::MAX as i128),
            _ => return None,
        })
    }

    /// Human-readable name, used in error messages and log fields.
    pub fn name(self) -> &'static str {
        let base = match self.base_kind().0 {
            BASE_INT8 => "int8",
            BASE_INT16 => "int16",
            BASE_INT32 => "int32",
            BASE_INT64 => "int64",
            BASE_UINT8 => "uint8",
            BASE_UINT16 => "uint16",
            BASE_UINT32 => "uint32",
            BASE_UINT64 => "uint64",
            BASE_FLOAT32 => "float32",
            BASE_FLOAT64 => "float64",
            BASE_BOOL => "bool",
            BASE_STRING8 => "string8",
            BASE_STRING16 => "string16",
            BASE_STRING32 => "string32",
            BASE_CHAR8 => "char8",
            BASE_CHAR16 => "char16",
            BASE_CHAR32 => "char32",
            BASE_HANDLE => "handle",
            BASE_CALLABLE => "callable",
            BASE_NULL => "null",
            BASE_ANY => "any",
            _ => "unknown",
        };
        if self.is_array() {
            match base {
                "int8" => "array<int8>",
                "int16" => "array<int16>",
                "int32" => "array<int32>",
                "int64" => "array<int64>",
                "uint8" => "array<uint8>",
                "uint16" => "array<uint16>",
                "uint32" => "array<uint32>",
                "uint64" => "array<uint64>",
                "float32" => "array<float32>",
                "float64" => "array<float64>",
                "bool" => "array<bool>",
                "string8" => "array<string8>",
                "string16" => "array<string16>",
                "string32" => "array<string32>",
                "char8" => "array<char8>",
                "char16" => "array<char16>",
                "char32" => "array<char32>",
                "handle" => "array<handle>",
                "callable" => "array<callable>",
                "null" => "array<null>",
                "any" => "array<any>",
                _ => "array<unknown>",
            }
        } else {
            base
        }
    }
}

impl std::fmt::Debug for MetaffiType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MetaffiType({})", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_of_sets_flag_and_preserves_base() {
        let a = MetaffiType::array_of(MetaffiType::INT32);
        assert!(a.is_array());
        assert_eq!(a.base_kind(), MetaffiType::INT32);
        assert!(!MetaffiType::INT32.is_array());
    }

    #[test]
    fn any_flag_detected_through_array() {
        assert!(MetaffiType::ANY.has_any_flag());
        assert!(MetaffiType::array_of(MetaffiType::ANY).has_any_flag());
        assert!(!MetaffiType::INT32.has_any_flag());
    }

    #[test]
    fn integer_bounds_cover_signed_and_unsigned() {
        assert_eq!(MetaffiType::INT8.integer_bounds(), Some((-128, 127)));
        assert_eq!(MetaffiType::UINT8.integer_bounds(), Some((0, 255)));
        assert_eq!(MetaffiType::BOOL.integer_bounds(), None);
    }

    #[test]
    fn names_render_array_wrapper() {
        assert_eq!(MetaffiType::INT32.name(), "int32");
        assert_eq!(MetaffiType::array_of(MetaffiType::INT32).name(), "array<int32>");
    }
}
