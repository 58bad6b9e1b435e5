//! This module defines the recursive column tree model: the value type every
//! other component of the crate operates on.
//!
//! A `Column` is a pure data container. It is built once through a validating
//! constructor, moved (never aliased) into transforms like
//! [`superimpose_nulls`](crate::superimpose::superimpose_nulls), and read
//! through structural accessors. All payloads are Arc-backed Arrow buffers,
//! so cloning a `Column` shares storage instead of duplicating it.

use arrow::buffer::{Buffer, NullBuffer, OffsetBuffer, ScalarBuffer};

use crate::error::StratumError;
use crate::types::PrimitiveType;
use crate::utils;

//==================================================================================
// 1. Core Types
//==================================================================================

/// The closed set of column shapes. Dispatch over this enum is exhaustive
/// everywhere; the set is a design invariant, not an extension point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Fixed-width leaf values in `data`.
    Primitive(PrimitiveType),
    /// Variable-length UTF-8 rows: `offsets` into the `data` byte buffer.
    Utf8,
    /// Variable-length rows of a single element child: `offsets` into `children[0]`.
    List,
    /// A row-aligned bundle of field columns, one child per field.
    Struct,
}

/// The cached null count of a column.
///
/// `Unknown` marks a count that must be recomputed from the validity buffer
/// before being trusted; it never escapes through [`Column::null_count`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullCount {
    Known(usize),
    Unknown,
}

/// A node in the column tree.
///
/// Invariants maintained by the constructors and by every transform output:
/// 1. `null_count <= len`, and equals `len - popcount(validity)` when a
///    validity buffer is present (0 when absent).
/// 2. Struct children all have the parent's `len`.
/// 3. Utf8/List offsets have `len + 1` entries, are non-decreasing, start
///    non-negative, and stay within the data buffer / element child.
#[derive(Debug, Clone)]
pub struct Column {
    pub(crate) kind: ColumnKind,
    pub(crate) len: usize,
    pub(crate) validity: Option<NullBuffer>,
    pub(crate) null_count: NullCount,
    pub(crate) data: Option<Buffer>,
    pub(crate) offsets: Option<OffsetBuffer<i32>>,
    pub(crate) children: Vec<Column>,
}

//==================================================================================
// 2. Construction
//==================================================================================

impl Column {
    /// Builds a fixed-width leaf column over an existing byte buffer.
    pub fn primitive(
        ty: PrimitiveType,
        len: usize,
        data: Buffer,
        validity: Option<NullBuffer>,
    ) -> Result<Self, StratumError> {
        if data.len() < len * ty.byte_width() {
            return Err(StratumError::InvalidArgument(format!(
                "Primitive data buffer holds {} bytes, but {} rows of {} need {}",
                data.len(),
                len,
                ty,
                len * ty.byte_width()
            )));
        }
        let null_count = check_validity(&validity, len)?;
        Ok(Column {
            kind: ColumnKind::Primitive(ty),
            len,
            validity,
            null_count,
            data: Some(data),
            offsets: None,
            children: Vec::new(),
        })
    }

    /// Convenience constructor copying a typed slice into a leaf column.
    pub fn primitive_from_slice<T>(
        ty: PrimitiveType,
        values: &[T],
        validity: Option<NullBuffer>,
    ) -> Result<Self, StratumError>
    where
        T: bytemuck::Pod,
    {
        if std::mem::size_of::<T>() != ty.byte_width() {
            return Err(StratumError::InvalidArgument(format!(
                "Value width {} does not match {} (width {})",
                std::mem::size_of::<T>(),
                ty,
                ty.byte_width()
            )));
        }
        let data = Buffer::from(utils::typed_slice_to_bytes(values));
        Self::primitive(ty, values.len(), data, validity)
    }

    /// Builds a variable-length UTF-8 column over `len + 1` offsets into a
    /// byte buffer.
    pub fn utf8(
        len: usize,
        offsets: Vec<i32>,
        data: Buffer,
        validity: Option<NullBuffer>,
    ) -> Result<Self, StratumError> {
        let offsets = check_offsets(offsets, len, data.len())?;
        let null_count = check_validity(&validity, len)?;
        Ok(Column {
            kind: ColumnKind::Utf8,
            len,
            validity,
            null_count,
            data: Some(data),
            offsets: Some(offsets),
            children: Vec::new(),
        })
    }

    /// Builds a list column over `len + 1` offsets into an element child.
    pub fn list(
        len: usize,
        offsets: Vec<i32>,
        child: Column,
        validity: Option<NullBuffer>,
    ) -> Result<Self, StratumError> {
        let offsets = check_offsets(offsets, len, child.len())?;
        let null_count = check_validity(&validity, len)?;
        Ok(Column {
            kind: ColumnKind::List,
            len,
            validity,
            null_count,
            data: None,
            offsets: Some(offsets),
            children: vec![child],
        })
    }

    /// Builds a struct column from row-aligned field children.
    pub fn struct_col(
        len: usize,
        children: Vec<Column>,
        validity: Option<NullBuffer>,
    ) -> Result<Self, StratumError> {
        for (i, child) in children.iter().enumerate() {
            if child.len() != len {
                return Err(StratumError::InvalidArgument(format!(
                    "Struct field {} has {} rows, parent has {}",
                    i,
                    child.len(),
                    len
                )));
            }
        }
        let null_count = check_validity(&validity, len)?;
        Ok(Column {
            kind: ColumnKind::Struct,
            len,
            validity,
            null_count,
            data: None,
            offsets: None,
            children,
        })
    }
}

/// Validates a validity buffer against the row count and derives the cached
/// null count. Absent buffer means all rows valid.
fn check_validity(
    validity: &Option<NullBuffer>,
    len: usize,
) -> Result<NullCount, StratumError> {
    match validity {
        None => Ok(NullCount::Known(0)),
        Some(v) if v.len() != len => Err(StratumError::InvalidArgument(format!(
            "Validity mask covers {} rows, column has {}",
            v.len(),
            len
        ))),
        Some(v) => Ok(NullCount::Known(v.null_count())),
    }
}

/// Validates raw offsets (count, sign, monotonicity, bound) and wraps them.
fn check_offsets(
    offsets: Vec<i32>,
    len: usize,
    bound: usize,
) -> Result<OffsetBuffer<i32>, StratumError> {
    if offsets.len() != len + 1 {
        return Err(StratumError::InvalidArgument(format!(
            "Expected {} offsets for {} rows, got {}",
            len + 1,
            len,
            offsets.len()
        )));
    }
    if offsets[0] < 0 {
        return Err(StratumError::InvalidArgument(format!(
            "Offsets start at {}, must be non-negative",
            offsets[0]
        )));
    }
    if offsets.windows(2).any(|w| w[1] < w[0]) {
        return Err(StratumError::InvalidArgument(
            "Offsets must be non-decreasing".to_string(),
        ));
    }
    if offsets[len] as usize > bound {
        return Err(StratumError::InvalidArgument(format!(
            "Final offset {} exceeds underlying length {}",
            offsets[len], bound
        )));
    }
    Ok(OffsetBuffer::new(ScalarBuffer::from(offsets)))
}

//==================================================================================
// 3. Accessors
//==================================================================================

impl Column {
    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn validity(&self) -> Option<&NullBuffer> {
        self.validity.as_ref()
    }

    /// The exact number of null rows. Recomputed from the validity buffer
    /// when the cached count is tagged [`NullCount::Unknown`].
    pub fn null_count(&self) -> usize {
        match self.null_count {
            NullCount::Known(n) => n,
            NullCount::Unknown => self.validity.as_ref().map_or(0, |v| v.null_count()),
        }
    }

    pub fn data(&self) -> Option<&Buffer> {
        self.data.as_ref()
    }

    pub fn offsets(&self) -> Option<&OffsetBuffer<i32>> {
        self.offsets.as_ref()
    }

    /// The offsets as a plain slice of `len + 1` entries.
    pub fn offset_slice(&self) -> Option<&[i32]> {
        self.offsets.as_ref().map(|o| o.inner().as_ref())
    }

    pub fn children(&self) -> &[Column] {
        &self.children
    }

    pub fn child(&self, i: usize) -> Option<&Column> {
        self.children.get(i)
    }

    /// Views the primitive payload as a typed slice.
    pub fn typed_data<T>(&self) -> Result<&[T], StratumError>
    where
        T: bytemuck::Pod,
    {
        let data = self.data.as_ref().ok_or_else(|| {
            StratumError::InvalidArgument(format!(
                "Column of kind {:?} carries no data buffer",
                self.kind
            ))
        })?;
        let typed: &[T] = utils::safe_bytes_to_typed_slice(data.as_slice())?;
        Ok(&typed[..self.len])
    }

    /// Replaces the validity buffer, tagging the cached null count as
    /// unknown until the next [`Column::null_count`] call.
    pub fn set_validity(&mut self, validity: Option<NullBuffer>) -> Result<(), StratumError> {
        if let Some(v) = &validity {
            if v.len() != self.len {
                return Err(StratumError::InvalidArgument(format!(
                    "Validity mask covers {} rows, column has {}",
                    v.len(),
                    self.len
                )));
            }
        }
        self.validity = validity;
        self.null_count = NullCount::Unknown;
        Ok(())
    }

    /// Debug-only structural check of the model invariants, including the
    /// zero-span rule for null variable-length rows. A violation indicates a
    /// bug upstream of the caller, not a recoverable runtime condition.
    pub(crate) fn debug_check_invariants(&self) {
        #[cfg(debug_assertions)]
        {
            debug_assert!(self.null_count() <= self.len);
            if let Some(v) = &self.validity {
                debug_assert_eq!(v.len(), self.len);
                debug_assert_eq!(self.null_count(), self.len - v.inner().count_set_bits());
            }
            match self.kind {
                ColumnKind::Struct => {
                    for child in &self.children {
                        debug_assert_eq!(child.len(), self.len);
                        child.debug_check_invariants();
                    }
                }
                ColumnKind::Utf8 | ColumnKind::List => {
                    let offsets = self.offset_slice().expect("offsets present");
                    debug_assert_eq!(offsets.len(), self.len + 1);
                    debug_assert!(offsets.windows(2).all(|w| w[0] <= w[1]));
                    if let Some(v) = &self.validity {
                        for i in 0..self.len {
                            if !v.is_valid(i) {
                                debug_assert_eq!(
                                    offsets[i], offsets[i + 1],
                                    "null row {} must have zero span",
                                    i
                                );
                            }
                        }
                    }
                    for child in &self.children {
                        child.debug_check_invariants();
                    }
                }
                ColumnKind::Primitive(_) => {}
            }
        }
    }
}

//==================================================================================
// 4. Structural Equality
//==================================================================================

/// Compares two optional validity buffers bit by bit.
fn validity_eq(a: Option<&NullBuffer>, b: Option<&NullBuffer>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.len() == b.len() && a.iter().eq(b.iter()),
        _ => false,
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.len == other.len
            && self.null_count() == other.null_count()
            && validity_eq(self.validity(), other.validity())
            && self.offset_slice() == other.offset_slice()
            && self.data.as_ref().map(|b| b.as_slice()) == other.data.as_ref().map(|b| b.as_slice())
            && self.children == other.children
    }
}

//==================================================================================
// 5. Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::buffer::NullBuffer;

    #[test]
    fn test_primitive_constructor_validates_buffer_length() {
        let data = Buffer::from_slice_ref(&[1i32, 2]);
        let result = Column::primitive(PrimitiveType::Int32, 3, data, None);
        assert!(matches!(result, Err(StratumError::InvalidArgument(_))));
    }

    #[test]
    fn test_validity_length_mismatch_is_rejected() {
        let validity = Some(NullBuffer::from(vec![true, false]));
        let result = Column::primitive_from_slice(PrimitiveType::Int32, &[1i32, 2, 3], validity);
        assert!(matches!(result, Err(StratumError::InvalidArgument(_))));
    }

    #[test]
    fn test_null_count_is_cached_exactly() {
        let validity = Some(NullBuffer::from(vec![true, false, false, true]));
        let col =
            Column::primitive_from_slice(PrimitiveType::Int64, &[1i64, 2, 3, 4], validity).unwrap();
        assert_eq!(col.null_count(), 2);
        assert_eq!(col.typed_data::<i64>().unwrap(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_set_validity_recomputes_lazily() {
        let mut col =
            Column::primitive_from_slice(PrimitiveType::UInt8, &[1u8, 2, 3], None).unwrap();
        assert_eq!(col.null_count(), 0);

        col.set_validity(Some(NullBuffer::from(vec![false, true, false])))
            .unwrap();
        assert_eq!(col.null_count, NullCount::Unknown);
        assert_eq!(col.null_count(), 2);
    }

    #[test]
    fn test_offsets_must_be_monotone() {
        let data = Buffer::from(b"abcdef".to_vec());
        let result = Column::utf8(2, vec![0, 4, 2], data, None);
        assert!(matches!(result, Err(StratumError::InvalidArgument(_))));
    }

    #[test]
    fn test_offsets_must_stay_in_bounds() {
        let data = Buffer::from(b"abc".to_vec());
        let result = Column::utf8(2, vec![0, 2, 9], data, None);
        assert!(matches!(result, Err(StratumError::InvalidArgument(_))));
    }

    #[test]
    fn test_struct_children_must_be_row_aligned() {
        let a = Column::primitive_from_slice(PrimitiveType::Int32, &[1i32, 2], None).unwrap();
        let b = Column::primitive_from_slice(PrimitiveType::Int32, &[1i32, 2, 3], None).unwrap();
        let result = Column::struct_col(2, vec![a, b], None);
        assert!(matches!(result, Err(StratumError::InvalidArgument(_))));
    }

    #[test]
    fn test_structural_equality_ignores_buffer_identity() {
        let a = Column::primitive_from_slice(PrimitiveType::Int32, &[7i32, 8], None).unwrap();
        let b = Column::primitive_from_slice(PrimitiveType::Int32, &[7i32, 8], None).unwrap();
        assert_eq!(a, b);

        let c = Column::primitive_from_slice(PrimitiveType::Int32, &[7i32, 9], None).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_list_over_utf8_nests() {
        let strings = Column::utf8(
            3,
            vec![0, 1, 3, 6],
            Buffer::from(b"abbccc".to_vec()),
            None,
        )
        .unwrap();
        let list = Column::list(2, vec![0, 2, 3], strings, None).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.child(0).unwrap().len(), 3);
        list.debug_check_invariants();
    }
}
