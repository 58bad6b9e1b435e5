use super::*;
use arrow::array::{
    Array, Date32Array, Int32Array, ListArray, StringArray, StructArray,
};
use arrow::buffer::NullBuffer;
use arrow::datatypes::Int32Type;
use std::sync::Arc;

use crate::exec::ExecContext;
use crate::superimpose::superimpose_nulls;

#[test]
fn test_primitive_roundtrip_with_nulls() {
    let original = Int32Array::from(vec![Some(10), None, Some(30)]);
    let column = from_arrow(&original).unwrap();

    assert_eq!(column.kind(), ColumnKind::Primitive(PrimitiveType::Int32));
    assert_eq!(column.len(), 3);
    assert_eq!(column.null_count(), 1);

    let back = to_arrow(&column).unwrap();
    assert_eq!(back.to_data(), original.to_data());
}

#[test]
fn test_conversion_shares_buffers() {
    let original = Int32Array::from(vec![1, 2, 3, 4]);
    let column = from_arrow(&original).unwrap();
    assert_eq!(
        column.data().unwrap().as_ptr(),
        original.to_data().buffers()[0].as_ptr()
    );
}

#[test]
fn test_utf8_roundtrip() {
    let original = StringArray::from(vec![Some("hello"), None, Some("abc")]);
    let column = from_arrow(&original).unwrap();

    assert_eq!(column.kind(), ColumnKind::Utf8);
    assert_eq!(column.offset_slice().unwrap().len(), 4);

    let back = to_arrow(&column).unwrap();
    assert_eq!(back.to_data(), original.to_data());
}

#[test]
fn test_list_roundtrip() {
    let original = ListArray::from_iter_primitive::<Int32Type, _, _>(vec![
        Some(vec![Some(1), Some(2)]),
        None,
        Some(vec![Some(3)]),
    ]);
    let column = from_arrow(&original).unwrap();

    assert_eq!(column.kind(), ColumnKind::List);
    assert_eq!(column.null_count(), 1);
    assert_eq!(column.offset_slice().unwrap(), &[0, 2, 2, 3]);

    let back = to_arrow(&column).unwrap();
    assert_eq!(back.to_data(), original.to_data());
}

#[test]
fn test_struct_roundtrip() {
    let fields = Fields::from(vec![
        Field::new("f0", DataType::Int32, true),
        Field::new("f1", DataType::Utf8, true),
    ]);
    let original = StructArray::new(
        fields,
        vec![
            Arc::new(Int32Array::from(vec![1, 2])) as ArrayRef,
            Arc::new(StringArray::from(vec!["ab", "c"])) as ArrayRef,
        ],
        Some(NullBuffer::from(vec![true, false])),
    );
    let column = from_arrow(&original).unwrap();

    assert_eq!(column.kind(), ColumnKind::Struct);
    assert_eq!(column.children().len(), 2);
    assert_eq!(column.null_count(), 1);

    let back = to_arrow(&column).unwrap();
    assert_eq!(back.to_data(), original.to_data());
}

#[test]
fn test_unsupported_type_is_rejected() {
    let dates = Date32Array::from(vec![1, 2, 3]);
    let result = from_arrow(&dates);
    assert!(matches!(result, Err(StratumError::UnsupportedType(_))));
}

#[test]
fn test_sliced_array_is_rejected() {
    let ints = Int32Array::from(vec![1, 2, 3, 4]);
    let sliced = ints.slice(1, 2);
    let result = from_arrow(&sliced);
    assert!(matches!(result, Err(StratumError::InvalidArgument(_))));
}

/// End-to-end: Arrow in, superimposed nulls, Arrow out.
#[test]
fn test_arrow_superimpose_arrow() {
    let ctx = ExecContext::default();
    let original = StringArray::from(vec![Some("hello"), Some("abc")]);
    let column = from_arrow(&original).unwrap();

    let mask = NullBuffer::from(vec![false, true]);
    let out = superimpose_nulls(Some(&mask), 1, column, &ctx).unwrap();
    let back = to_arrow(&out).unwrap();

    let strings = back.as_any().downcast_ref::<StringArray>().unwrap();
    assert_eq!(strings.null_count(), 1);
    assert!(strings.is_null(0));
    assert_eq!(strings.value(1), "abc");
    assert_eq!(strings.value_length(0), 0);
}
