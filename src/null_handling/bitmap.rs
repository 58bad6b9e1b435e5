// --- IN: src/null_handling/bitmap.rs ---

//! This module contains pure, stateless kernels for validity mask
//! arithmetic, built on the official Arrow `NullBuffer`/`BooleanBuffer`
//! types (packed, 1 = valid, 0 = null; absent buffer = all rows valid).

use arrow::buffer::NullBuffer;

use crate::error::StratumError;

//==================================================================================
// 1. Core Mask Operations
//==================================================================================

/// Returns `true` iff the mask is absent, i.e. every row is valid.
pub fn is_all_valid(mask: Option<&NullBuffer>) -> bool {
    mask.is_none()
}

/// The exact number of null rows in an `len`-row mask: `len - popcount(mask)`.
///
/// An absent mask yields 0. A mask of the wrong length is a programming
/// error and fails with `InvalidArgument`.
pub fn count_nulls(mask: Option<&NullBuffer>, len: usize) -> Result<usize, StratumError> {
    match mask {
        None => Ok(0),
        Some(m) if m.len() != len => Err(StratumError::InvalidArgument(format!(
            "Mask covers {} rows, expected {}",
            m.len(),
            len
        ))),
        Some(m) => Ok(m.null_count()),
    }
}

/// Bitwise AND of two `len`-row masks.
///
/// If either side is absent (all valid) the other is returned as a cheap
/// handle clone; no new bit storage is allocated. When both are present the
/// result is a freshly popcounted buffer, so its null count is exact.
pub fn merge_and(
    lhs: Option<&NullBuffer>,
    rhs: Option<&NullBuffer>,
    len: usize,
) -> Result<Option<NullBuffer>, StratumError> {
    for mask in [lhs, rhs].into_iter().flatten() {
        if mask.len() != len {
            return Err(StratumError::InvalidArgument(format!(
                "Mask covers {} rows, expected {}",
                mask.len(),
                len
            )));
        }
    }

    match (lhs, rhs) {
        (None, None) => Ok(None),
        (Some(m), None) | (None, Some(m)) => Ok(Some(m.clone())),
        (Some(a), Some(b)) => {
            // NullBuffer::new popcounts eagerly; the AND of two masks is not
            // determined by their individual counts.
            let merged = a.inner() & b.inner();
            Ok(Some(NullBuffer::new(merged)))
        }
    }
}
