//! This module contains the offset sanitization pass for variable-length
//! (Utf8/List) columns.
//!
//! Contract: given the *final* merged validity of a column, every row whose
//! validity bit is 0 must report a zero span (`offsets[i] == offsets[i + 1]`).
//! This holds for rows that were null in the input as well as rows newly
//! made null by a mask merge; sanitization is a function of final validity,
//! not of what changed. The underlying data buffer is never compacted or
//! resized; bytes under a zeroed row become unreachable but stay in place.

use arrow::buffer::{Buffer, NullBuffer, OffsetBuffer, ScalarBuffer};

use crate::error::StratumError;
use crate::exec::ExecContext;

/// Rewrites offsets so every null row has a zero span.
///
/// Processes rows from the last to the first, collapsing a null row's start
/// onto its (final) end boundary: `offsets[i] = offsets[i + 1]`. A null run
/// therefore collapses onto the original start of the first valid row after
/// it, which keeps that row's byte region untouched. `offsets[len]` is never
/// modified, and the result stays non-decreasing.
///
/// Returns `Ok(None)` when the input is already sane (no null row with a
/// non-zero span), so the caller can move the existing buffer through
/// without any allocation. The single rewritten buffer is allocated through
/// the execution context.
pub(crate) fn sanitize_offsets(
    offsets: &OffsetBuffer<i32>,
    validity: Option<&NullBuffer>,
    len: usize,
    ctx: &ExecContext,
) -> Result<Option<OffsetBuffer<i32>>, StratumError> {
    let validity = match validity {
        None => return Ok(None),
        Some(v) => v,
    };
    if validity.len() != len {
        return Err(StratumError::InvalidArgument(format!(
            "Validity mask covers {} rows, offsets describe {}",
            validity.len(),
            len
        )));
    }
    let current: &[i32] = offsets.inner().as_ref();
    debug_assert_eq!(current.len(), len + 1);
    debug_assert!(current.windows(2).all(|w| w[0] <= w[1]));

    if validity.null_count() == 0 {
        return Ok(None);
    }

    // A null row is dirty only if it still spans bytes. If none does, the
    // whole pass is a no-op and the input buffer can be reused as-is.
    let dirty = (0..len).any(|i| !validity.is_valid(i) && current[i] != current[i + 1]);
    if !dirty {
        log_metric!("event" = "sanitize_offsets", "outcome" = "already_sane", "rows" = &len);
        return Ok(None);
    }

    let byte_len = (len + 1) * std::mem::size_of::<i32>();
    let mut rewritten = ctx.allocator().allocate(byte_len)?;
    rewritten.resize(byte_len, 0);

    let out: &mut [i32] = rewritten.typed_data_mut();
    out[len] = current[len];
    let mut rewrites = 0usize;
    for i in (0..len).rev() {
        if validity.is_valid(i) {
            out[i] = current[i];
        } else {
            out[i] = out[i + 1];
            if current[i] != current[i + 1] {
                rewrites += 1;
            }
        }
    }
    log_metric!(
        "event" = "sanitize_offsets",
        "outcome" = "rewritten",
        "rows" = &len,
        "rewrites" = &rewrites,
    );

    let buffer: Buffer = rewritten.into();
    Ok(Some(OffsetBuffer::new(ScalarBuffer::new(
        buffer,
        0,
        len + 1,
    ))))
}

//==================================================================================
// Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn offsets(values: Vec<i32>) -> OffsetBuffer<i32> {
        OffsetBuffer::new(ScalarBuffer::from(values))
    }

    #[test]
    fn test_absent_validity_is_noop() {
        let ctx = ExecContext::default();
        let input = offsets(vec![0, 3, 5]);
        assert!(sanitize_offsets(&input, None, 2, &ctx).unwrap().is_none());
    }

    #[test]
    fn test_already_zero_span_rows_are_untouched() {
        let ctx = ExecContext::default();
        let input = offsets(vec![0, 2, 2, 3]);
        let validity = NullBuffer::from(vec![true, false, true]);
        let result = sanitize_offsets(&input, Some(&validity), 3, &ctx).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_leading_null_collapses_onto_next_valid_row() {
        let ctx = ExecContext::default();
        let input = offsets(vec![0, 5, 8]);
        let validity = NullBuffer::from(vec![false, true]);
        let result = sanitize_offsets(&input, Some(&validity), 2, &ctx)
            .unwrap()
            .unwrap();

        let out: &[i32] = result.inner().as_ref();
        assert_eq!(out, &[5, 5, 8]);
        // Row 0 has zero span, row 1 still reads bytes 5..8.
        assert_eq!(out[0], out[1]);
        assert_eq!(out[2], 8);
    }

    #[test]
    fn test_null_run_collapses_to_single_boundary() {
        let ctx = ExecContext::default();
        let input = offsets(vec![0, 2, 4, 6, 9]);
        let validity = NullBuffer::from(vec![true, false, false, true]);
        let result = sanitize_offsets(&input, Some(&validity), 4, &ctx)
            .unwrap()
            .unwrap();

        let out: &[i32] = result.inner().as_ref();
        assert_eq!(out, &[0, 6, 6, 6, 9]);
        assert!(out.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_trailing_null_keeps_final_offset() {
        let ctx = ExecContext::default();
        let input = offsets(vec![0, 3, 7]);
        let validity = NullBuffer::from(vec![true, false]);
        let result = sanitize_offsets(&input, Some(&validity), 2, &ctx)
            .unwrap()
            .unwrap();

        let out: &[i32] = result.inner().as_ref();
        assert_eq!(out, &[0, 7, 7]);
        assert_eq!(out[2], 7);
    }

    #[test]
    fn test_all_null_collapses_everything() {
        let ctx = ExecContext::default();
        let input = offsets(vec![0, 2, 5, 8]);
        let validity = NullBuffer::from(vec![false, false, false]);
        let result = sanitize_offsets(&input, Some(&validity), 3, &ctx)
            .unwrap()
            .unwrap();

        let out: &[i32] = result.inner().as_ref();
        assert_eq!(out, &[8, 8, 8, 8]);
    }

    #[test]
    fn test_validity_length_mismatch() {
        let ctx = ExecContext::default();
        let input = offsets(vec![0, 1, 2]);
        let validity = NullBuffer::from(vec![true]);
        let result = sanitize_offsets(&input, Some(&validity), 2, &ctx);
        assert!(matches!(result, Err(StratumError::InvalidArgument(_))));
    }

    #[test]
    fn test_allocation_failure_propagates() {
        use crate::exec::BudgetAllocator;
        use std::sync::Arc;

        let ctx = ExecContext::with_allocator(Arc::new(BudgetAllocator::new(0)));
        let input = offsets(vec![0, 5, 8]);
        let validity = NullBuffer::from(vec![false, true]);
        let result = sanitize_offsets(&input, Some(&validity), 2, &ctx);
        assert!(matches!(result, Err(StratumError::AllocationFailure(_))));
    }
}
