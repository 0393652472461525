//! Range checking for integer serialization (§4.3, §7, §8 testable
//! property 3).

use crate::error::SerializeError;
use metaffi_types::MetaffiType;

/// Check `value` against `kind`'s inclusive integer bounds, failing with
/// `RangeError` on overflow or underflow. `kind` must be an integer kind
/// (panics via `expect` otherwise — callers only reach this after matching
/// on an integer variant).
pub fn check_integer_range(kind: MetaffiType, value: i128) -> Result<(), SerializeError> {
    let (lo, hi) = kind
        .integer_bounds()
        .expect("check_integer_range called with a non-integer kind");
    if value < lo || value > hi {
        return Err(SerializeError::RangeError {
            kind,
            value: value.to_string(),
            lo,
            hi,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_accepted() {
        assert!(check_integer_range(MetaffiType::INT8, -128).is_ok());
        assert!(check_integer_range(MetaffiType::INT8, 127).is_ok());
        assert!(check_integer_range(MetaffiType::UINT8, 0).is_ok());
        assert!(check_integer_range(MetaffiType::UINT8, 255).is_ok());
    }

    #[test]
    fn out_of_bounds_rejected() {
        assert!(matches!(
            check_integer_range(MetaffiType::INT8, -129),
            Err(SerializeError::RangeError { .. })
        ));
        assert!(matches!(
            check_integer_range(MetaffiType::INT8, 128),
            Err(SerializeError::RangeError { .. })
        ));
        assert!(matches!(
            check_integer_range(MetaffiType::UINT8, -1),
            Err(SerializeError::RangeError { .. })
        ));
        assert!(matches!(
            check_integer_range(MetaffiType::UINT8, 256),
            Err(SerializeError::RangeError { .. })
        ));
    }
}
