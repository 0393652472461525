//! `Cdts` — a fixed-length sequence of `Cdt`, the unit of parameter and
//! return passing across every call (§3, §4.2).

use crate::cdt::Cdt;
use crate::error::CdtError;
use metaffi_types::MIXED_OR_UNKNOWN;

/// A fixed-length sequence of `Cdt` cells.
///
/// `fixed_dimensions` annotates homogeneous n-dimensional arrays (§3) so a
/// consumer can validate rank without walking the tree; it carries no
/// meaning for a top-level params/retvals sequence beyond being the
/// sentinel default.
pub struct Cdts {
    cells: Vec<Cdt>,
    fixed_dimensions: u32,
}

impl Cdts {
    /// A sequence of `length` cells, all initialized to `Cdt::null()`
    /// (§4.2: "cells default to `null` with `free_required=false`").
    pub fn new(length: usize, fixed_dimensions: u32) -> Self {
        let mut cells = Vec::with_capacity(length);
        cells.resize_with(length, Cdt::null);
        Self {
            cells,
            fixed_dimensions,
        }
    }

    /// Number of cells in this sequence.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True if this sequence has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The declared rank/dimension annotation; `MIXED_OR_UNKNOWN` for
    /// ragged or unknown-rank arrays.
    pub fn fixed_dimensions(&self) -> u32 {
        self.fixed_dimensions
    }

    /// True if `fixed_dimensions` is the mixed-or-unknown sentinel.
    pub fn is_mixed_or_unknown(&self) -> bool {
        self.fixed_dimensions == MIXED_OR_UNKNOWN
    }

    /// Borrow the cell at `index`, failing with `BoundsError` past the end
    /// (§7, §8 testable property 4).
    pub fn get(&self, index: usize) -> Result<&Cdt, CdtError> {
        self.cells.get(index).ok_or(CdtError::BoundsError {
            index,
            length: self.cells.len(),
        })
    }

    /// Mutably borrow the cell at `index`, failing with `BoundsError` past
    /// the end.
    pub fn get_mut(&mut self, index: usize) -> Result<&mut Cdt, CdtError> {
        let length = self.cells.len();
        self.cells
            .get_mut(index)
            .ok_or(CdtError::BoundsError { index, length })
    }

    /// Borrow all cells in order.
    pub fn cells(&self) -> &[Cdt] {
        &self.cells
    }

    /// Mutably borrow all cells in order. Used by the handle-ownership
    /// arbiter's pre-free walk (§4.8) and by serializers writing params in
    /// sequence.
    pub fn cells_mut(&mut self) -> &mut [Cdt] {
        &mut self.cells
    }

    /// Free every cell's payload. Cascades into nested arrays through each
    /// cell's own `free()` (§4.2). Idempotent: a cell already freed is a
    /// no-op.
    pub fn free(&mut self) {
        for cell in &mut self.cells {
            cell.free();
        }
    }
}

impl std::fmt::Debug for Cdts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cdts")
            .field("length", &self.cells.len())
            .field("fixed_dimensions", &self.fixed_dimensions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metaffi_types::MetaffiType;

    #[test]
    fn fresh_cells_are_null_and_free_is_not_required() {
        let cdts = Cdts::new(4, 0);
        assert_eq!(cdts.len(), 4);
        for cell in cdts.cells() {
            assert!(cell.is_null());
            assert!(!cell.free_required());
        }
    }

    #[test]
    fn out_of_bounds_access_fails_with_bounds_error() {
        let cdts = Cdts::new(2, 0);
        assert!(matches!(cdts.get(2), Err(CdtError::BoundsError { index: 2, length: 2 })));
    }

    #[test]
    fn mixed_or_unknown_sentinel_round_trips() {
        let cdts = Cdts::new(1, MIXED_OR_UNKNOWN);
        assert!(cdts.is_mixed_or_unknown());
    }

    #[test]
    fn free_cascades_to_every_cell() {
        let mut cdts = Cdts::new(2, 0);
        cdts.get_mut(0).unwrap().set_string8(b"owned");
        cdts.get_mut(1).unwrap().set_int32(5);
        cdts.free();
        assert!(cdts.get(0).unwrap().is_null());
        assert!(!cdts.get(0).unwrap().free_required());
        assert_eq!(cdts.get(1).unwrap().kind(), MetaffiType::NULL);
    }
}
