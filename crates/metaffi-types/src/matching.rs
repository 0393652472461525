//! Descriptor matching (§4.1, testable property 5).
//!
//! `matches(expected, actual) ⇔ (kinds equal) ∨ (expected is any and
//! array-ness agrees) ∨ (both arrays of same base with compatible
//! dimensions) ∨ (expected is the bare-array pseudo-kind and actual is any
//! array)`.
//!
//! Open Question (§9) resolved: an `any`-typed expected descriptor that is
//! itself an array (i.e. `array_of(ANY)`) matches an array actual of *any*
//! base kind, not only arrays whose base is also `any`. The source treats
//! this permissively; we document and test the permissive reading, kept
//! distinct from the separate bare-array pseudo-kind which has no `any`
//! flag at all. See DESIGN.md.

use crate::info::MetaffiTypeInfo;
use crate::MIXED_OR_UNKNOWN;

/// True if `actual` satisfies `expected` per §4.1's matching rules.
///
/// Aliases never participate (§4.1): only kind, any-flag, array-ness, and
/// dimensions are compared.
pub fn matches(expected: &MetaffiTypeInfo, actual: &MetaffiTypeInfo) -> bool {
    if expected.kind() == actual.kind() {
        return dimensions_compatible(expected, actual);
    }

    if expected.kind().is_bare_array() {
        return actual.is_array();
    }

    if expected.has_any_flag() {
        return expected.is_array() == actual.is_array();
    }

    if expected.is_array() && actual.is_array() && expected.base_kind() == actual.base_kind() {
        return dimensions_compatible(expected, actual);
    }

    false
}

fn dimensions_compatible(expected: &MetaffiTypeInfo, actual: &MetaffiTypeInfo) -> bool {
    if !expected.is_array() {
        return true;
    }
    expected.fixed_dimensions() == MIXED_OR_UNKNOWN
        || expected.fixed_dimensions() == actual.fixed_dimensions()
}
