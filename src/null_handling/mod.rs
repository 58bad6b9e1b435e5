//! This module owns all bit-level validity mask arithmetic.
//!
//! The operations here are pure, total functions over fixed-size bit
//! ranges; mismatched lengths are a caller error, never a partial result.

pub mod bitmap;
