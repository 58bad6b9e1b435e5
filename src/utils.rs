//! This module provides a set of shared, low-level utility functions used
//! throughout the stratum core.
//!
//! Its primary responsibilities include:
//! 1.  Providing safe, validated conversions between raw byte slices and typed slices.
//! 2.  Keeping all reinterpretation of memory behind `bytemuck`'s checked casts
//!     so the rest of the crate stays free of `unsafe`.

use crate::error::StratumError;

//==================================================================================
// 1. Core Utility Functions
//==================================================================================

/// Safely reinterprets a byte slice as a slice of a primitive type.
///
/// Returns a zero-copy view of the data. Fails if the byte length is not a
/// multiple of `size_of::<T>()` or the slice is misaligned for `T`.
pub fn safe_bytes_to_typed_slice<T>(bytes: &[u8]) -> Result<&[T], StratumError>
where
    T: bytemuck::Pod,
{
    bytemuck::try_cast_slice(bytes).map_err(StratumError::from)
}

/// Copies a typed slice into a freshly allocated byte vector.
pub fn typed_slice_to_bytes<T>(values: &[T]) -> Vec<u8>
where
    T: bytemuck::Pod,
{
    bytemuck::cast_slice(values).to_vec()
}

//==================================================================================
// 2. Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_byte_roundtrip() {
        let values: Vec<i32> = vec![1, -2, 3];
        let bytes = typed_slice_to_bytes(&values);
        assert_eq!(bytes.len(), 12);

        let back: &[i32] = safe_bytes_to_typed_slice(&bytes).unwrap();
        assert_eq!(back, values.as_slice());
    }

    #[test]
    fn test_bad_length_is_rejected() {
        let bytes = vec![0u8; 7];
        let result = safe_bytes_to_typed_slice::<i32>(&bytes);
        assert!(matches!(result, Err(StratumError::PodCast(_))));
    }
}
