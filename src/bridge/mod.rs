// In: src/bridge/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Bridge Layer
// ====================================================================================
//
// The `bridge` is the boundary between the outside world (Arrow arrays) and
// the internal column tree model. I/O layers hand us `&dyn Array`; we turn
// it into an owned `Column` tree, the engine transforms the tree, and the
// result converts back into an `ArrayRef` for downstream consumers.
//
// Data Flow:
//
//   1. [I/O layer]                 -> `&dyn Array`
//         |
//         `-> `from_arrow` --------> `Column` (buffers shared, not copied)
//         |
//   2. [superimpose_nulls engine]  -> new owned `Column` tree
//         |
//         `-> `to_arrow` ----------> `ArrayRef` (buffers shared, not copied)
//
// Conversions are zero-copy in both directions: only Arc-backed buffer
// handles move. Only the closed column type set is accepted; anything else
// is an `UnsupportedType` error at this boundary.
//
// ====================================================================================

use std::sync::Arc;

use arrow::array::{make_array, Array, ArrayData, ArrayRef};
use arrow::buffer::{OffsetBuffer, ScalarBuffer};
use arrow::datatypes::{DataType, Field, Fields};

use crate::column::{Column, ColumnKind, NullCount};
use crate::error::StratumError;
use crate::types::PrimitiveType;

#[cfg(test)]
mod tests;

//==================================================================================
// 1. Arrow -> Column
//==================================================================================

/// Converts an Arrow array into an owned `Column` tree, sharing buffers.
///
/// Sliced arrays (non-zero offset) are not supported at this boundary;
/// callers should flatten slices before handing data over.
pub fn from_arrow(array: &dyn Array) -> Result<Column, StratumError> {
    from_array_data(&array.to_data())
}

fn from_array_data(data: &ArrayData) -> Result<Column, StratumError> {
    if data.offset() != 0 {
        return Err(StratumError::InvalidArgument(format!(
            "Sliced arrays (offset {}) are not supported by the column bridge",
            data.offset()
        )));
    }
    let len = data.len();
    let validity = data.nulls().cloned();
    let null_count = NullCount::Known(data.null_count());

    match data.data_type() {
        dt @ (DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64
        | DataType::Float32
        | DataType::Float64) => Ok(Column {
            kind: ColumnKind::Primitive(PrimitiveType::from_arrow_type(dt)?),
            len,
            validity,
            null_count,
            data: Some(data.buffers()[0].clone()),
            offsets: None,
            children: Vec::new(),
        }),

        DataType::Utf8 => Ok(Column {
            kind: ColumnKind::Utf8,
            len,
            validity,
            null_count,
            data: Some(data.buffers()[1].clone()),
            offsets: Some(offsets_from_buffer(data, len)),
            children: Vec::new(),
        }),

        DataType::List(_) => {
            let child = from_array_data(&data.child_data()[0])?;
            Ok(Column {
                kind: ColumnKind::List,
                len,
                validity,
                null_count,
                data: None,
                offsets: Some(offsets_from_buffer(data, len)),
                children: vec![child],
            })
        }

        DataType::Struct(_) => {
            let children = data
                .child_data()
                .iter()
                .map(from_array_data)
                .collect::<Result<Vec<_>, _>>()?;
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

        dt => Err(StratumError::UnsupportedType(format!(
            "Arrow type {:?} is outside the column model's closed set",
            dt
        ))),
    }
}

fn offsets_from_buffer(data: &ArrayData, len: usize) -> OffsetBuffer<i32> {
    OffsetBuffer::new(ScalarBuffer::new(data.buffers()[0].clone(), 0, len + 1))
}

//==================================================================================
// 2. Column -> Arrow
//==================================================================================

/// Converts a `Column` tree back into an Arrow array, sharing buffers.
///
/// `Column` does not model struct field names; synthesized names `f0..fn`
/// are used for struct fields.
pub fn to_arrow(column: &Column) -> Result<ArrayRef, StratumError> {
    Ok(make_array(to_array_data(column)?))
}

fn to_array_data(column: &Column) -> Result<ArrayData, StratumError> {
    let builder = ArrayData::builder(arrow_data_type(column))
        .len(column.len())
        .nulls(column.validity().cloned());

    let builder = match column.kind() {
        ColumnKind::Primitive(_) => {
            let data = column.data().ok_or_else(|| {
                StratumError::InternalError("Primitive column without data".to_string())
            })?;
            builder.add_buffer(data.clone())
        }
        ColumnKind::Utf8 => {
            let data = column.data().ok_or_else(|| {
                StratumError::InternalError("Utf8 column without data".to_string())
            })?;
            builder
                .add_buffer(offsets_buffer(column)?)
                .add_buffer(data.clone())
        }
        ColumnKind::List => {
            let child = column.child(0).ok_or_else(|| {
                StratumError::InternalError("List column without an element child".to_string())
            })?;
            builder
                .add_buffer(offsets_buffer(column)?)
                .child_data(vec![to_array_data(child)?])
        }
        ColumnKind::Struct => {
            let children = column
                .children()
                .iter()
                .map(to_array_data)
                .collect::<Result<Vec<_>, _>>()?;
            builder.child_data(children)
        }
    };

    // Arrow re-validates the assembled layout; a failure here indicates a
    // malformed tree and surfaces as an Arrow error.
    builder.build().map_err(StratumError::from)
}

fn offsets_buffer(column: &Column) -> Result<arrow::buffer::Buffer, StratumError> {
    column
        .offsets()
        .map(|o| o.inner().inner().clone())
        .ok_or_else(|| {
            StratumError::InternalError("Variable-length column without offsets".to_string())
        })
}

fn arrow_data_type(column: &Column) -> DataType {
    match column.kind() {
        ColumnKind::Primitive(ty) => ty.to_arrow_type(),
        ColumnKind::Utf8 => DataType::Utf8,
        ColumnKind::List => {
            let child = column
                .child(0)
                .map(arrow_data_type)
                .unwrap_or(DataType::Null);
            DataType::List(Arc::new(Field::new("item", child, true)))
        }
        ColumnKind::Struct => {
            let fields: Vec<Field> = column
                .children()
                .iter()
                .enumerate()
                .map(|(i, c)| Field::new(format!("f{}", i), arrow_data_type(c), true))
                .collect();
            DataType::Struct(Fields::from(fields))
        }
    }
}
