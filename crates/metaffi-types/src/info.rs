//! `MetaffiTypeInfo` — the full type descriptor carried at call sites.

use crate::kind::MetaffiType;
use crate::MIXED_OR_UNKNOWN;

/// A type descriptor: kind plus an optional host-side alias and a
/// dimension annotation for arrays.
///
/// Value object (§3): cheap to clone, destroyed with the entity or call
/// site that owns it. When `owns_alias` is true the alias string is owned
/// by this descriptor (mirrors the C++ source's `owns_alias` flag, kept
/// here as a plain field since Rust's `String` ownership makes the flag
/// informational rather than load-bearing — see DESIGN.md).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetaffiTypeInfo {
    kind: MetaffiType,
    alias: Option<String>,
    owns_alias: bool,
    fixed_dimensions: u32,
}

impl MetaffiTypeInfo {
    /// Construct a descriptor from a kind alone. Scalar kinds get
    /// `fixed_dimensions = 0`; array kinds default to `MIXED_OR_UNKNOWN`
    /// until refined with `with_dimensions`.
    pub fn new(kind: MetaffiType) -> Self {
        Self {
            kind,
            alias: None,
            owns_alias: false,
            fixed_dimensions: if kind.is_array() { MIXED_OR_UNKNOWN } else { 0 },
        }
    }

    /// Construct a descriptor with an alias and explicit dimensions.
    pub fn with_alias_and_dimensions(
        kind: MetaffiType,
        alias: impl Into<String>,
        fixed_dimensions: u32,
    ) -> Self {
        Self {
            kind,
            alias: Some(alias.into()),
            owns_alias: true,
            fixed_dimensions,
        }
    }

    /// The type kind.
    pub fn kind(&self) -> MetaffiType {
        self.kind
    }

    /// The host-side alias, if any.
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Whether this descriptor owns its alias string.
    pub fn owns_alias(&self) -> bool {
        self.owns_alias
    }

    /// Declared rank/dimension annotation; `MIXED_OR_UNKNOWN` for ragged
    /// or unknown-rank arrays.
    pub fn fixed_dimensions(&self) -> u32 {
        self.fixed_dimensions
    }

    /// True if this descriptor's kind carries the array modifier.
    pub fn is_array(&self) -> bool {
        self.kind.is_array()
    }

    /// The base (non-array) kind.
    pub fn base_kind(&self) -> MetaffiType {
        self.kind.base_kind()
    }

    /// True if this descriptor's kind carries the `any` wildcard.
    pub fn has_any_flag(&self) -> bool {
        self.kind.has_any_flag()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_descriptor_has_zero_dimensions() {
        let d = MetaffiTypeInfo::new(MetaffiType::INT32);
        assert_eq!(d.fixed_dimensions(), 0);
        assert!(!d.is_array());
    }

    #[test]
    fn array_descriptor_defaults_to_mixed_or_unknown() {
        let d = MetaffiTypeInfo::new(MetaffiType::array_of(MetaffiType::INT32));
        assert_eq!(d.fixed_dimensions(), MIXED_OR_UNKNOWN);
        assert!(d.is_array());
        assert_eq!(d.base_kind(), MetaffiType::INT32);
    }

    #[test]
    fn alias_round_trips() {
        let d = MetaffiTypeInfo::with_alias_and_dimensions(MetaffiType::INT64, "MyLong", 1);
        assert_eq!(d.alias(), Some("MyLong"));
        assert!(d.owns_alias());
        assert_eq!(d.fixed_dimensions(), 1);
    }
}
