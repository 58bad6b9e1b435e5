//! This module is the null superimposition engine: it merges an externally
//! supplied validity mask into a column tree, recursively, so the whole
//! tree reflects a single consistent notion of "this row is null."
//!
//! The engine consumes the tree (exclusive ownership moves in) and returns
//! a new owned tree. Subtrees and buffers that no merge actually touches
//! are moved through unchanged; nothing is copied for its own sake. Struct
//! nulls are pushed into every field, and variable-length columns are
//! sanitized so each null row reports a zero span.
//!
//! No global state is touched; independent invocations over distinct trees
//! may run concurrently.

use arrow::buffer::NullBuffer;

use crate::column::{Column, ColumnKind, NullCount};
use crate::error::StratumError;
use crate::exec::ExecContext;
use crate::null_handling::bitmap;

pub(crate) mod sanitize;


//==================================================================================
// 1. Public Entry Point
//==================================================================================

/// Superimposes nulls from `mask` onto `column` and every descendant,
/// using bitwise AND.
///
/// `mask` is borrowed and never mutated; `column` is consumed. `null_count`
/// must be the exact null count of `mask` (0 when the mask is absent) and
/// is range-checked here; full consistency with the mask popcount is a
/// debug-only assertion.
///
/// On success the returned tree satisfies the model invariants, including
/// the zero-span rule for null Utf8/List rows. On failure nothing is
/// returned and no caller-visible state has been mutated.
pub fn superimpose_nulls(
    mask: Option<&NullBuffer>,
    null_count: usize,
    column: Column,
    ctx: &ExecContext,
) -> Result<Column, StratumError> {
    if let Some(m) = mask {
        if m.len() != column.len() {
            return Err(StratumError::InvalidArgument(format!(
                "Mask covers {} rows, column has {}",
                m.len(),
                column.len()
            )));
        }
    }
    if null_count > column.len() {
        return Err(StratumError::InvalidArgument(format!(
            "Null count {} exceeds column size {}",
            null_count,
            column.len()
        )));
    }
    if mask.is_none() && null_count != 0 {
        return Err(StratumError::InvalidArgument(format!(
            "Null count {} with an absent (all-valid) mask",
            null_count
        )));
    }
    debug_assert_eq!(
        null_count,
        mask.map_or(0, |m| m.null_count()),
        "caller-supplied null count disagrees with the mask popcount"
    );

    let output = superimpose(mask, column, ctx)?;
    output.debug_check_invariants();
    Ok(output)
}

//==================================================================================
// 2. Recursive Core
//==================================================================================

/// One level of the recursion: merge masks, then dispatch on the column kind.
fn superimpose(
    mask: Option<&NullBuffer>,
    column: Column,
    ctx: &ExecContext,
) -> Result<Column, StratumError> {
    let len = column.len();

    // Fast path: nothing to merge, nothing to sanitize. The tree moves
    // through untouched, with no allocation and no recursion.
    if bitmap::is_all_valid(mask) && column.null_count() == 0 {
        log_metric!("event" = "superimpose", "path" = "fast", "rows" = &len);
        return Ok(column);
    }

    // The AND of two masks is not determined by their individual popcounts,
    // so the merged count is always taken from the merged buffer itself.
    let merged = bitmap::merge_and(mask, column.validity(), len)?;
    let merged_nulls = bitmap::count_nulls(merged.as_ref(), len)?;
    log_metric!(
        "event" = "superimpose",
        "path" = "merge",
        "rows" = &len,
        "nulls" = &merged_nulls,
    );

    let Column {
        kind,
        len,
        data,
        offsets,
        children,
        ..
    } = column;

    match kind {
        ColumnKind::Primitive(_) => Ok(Column {
            kind,
            len,
            validity: merged,
            null_count: NullCount::Known(merged_nulls),
            data,
            offsets: None,
            children: Vec::new(),
        }),

        // A null struct row implies all of its fields present as null, so
        // every child receives the same merged mask. Field order is kept.
        ColumnKind::Struct => {
            let children = children
                .into_iter()
                .map(|child| superimpose(merged.as_ref(), child, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Column {
                kind,
                len,
                validity: merged,
                null_count: NullCount::Known(merged_nulls),
                data: None,
                offsets: None,
                children,
            })
        }

        ColumnKind::Utf8 => {
            let offsets = offsets.ok_or_else(|| {
                StratumError::InternalError("Utf8 column without offsets".to_string())
            })?;
            let sanitized = sanitize::sanitize_offsets(&offsets, merged.as_ref(), len, ctx)?;
            Ok(Column {
                kind,
                len,
                validity: merged,
                null_count: NullCount::Known(merged_nulls),
                data,
                offsets: Some(sanitized.unwrap_or(offsets)),
                children: Vec::new(),
            })
        }

        ColumnKind::List => {
            let offsets = offsets.ok_or_else(|| {
                StratumError::InternalError("List column without offsets".to_string())
            })?;
            let sanitized = sanitize::sanitize_offsets(&offsets, merged.as_ref(), len, ctx)?;

            // The element column is a nested case of the same algorithm:
            // no outer mask, but its own null Utf8/List rows still need
            // their spans zeroed.
            let child = children.into_iter().next().ok_or_else(|| {
                StratumError::InternalError("List column without an element child".to_string())
            })?;
            let child = superimpose(None, child, ctx)?;

            Ok(Column {
                kind,
                len,
                validity: merged,
                null_count: NullCount::Known(merged_nulls),
                data: None,
                offsets: Some(sanitized.unwrap_or(offsets)),
                children: vec![child],
            })
        }
    }
}
