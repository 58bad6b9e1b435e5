//! This module holds the codec capability layer consumed by the
//! surrounding I/O and codec logic. The superimposition engine itself never
//! queries it.
//!
//! Codec execution (the actual compression kernels) is out of scope for
//! this crate; only the pure capability advisor lives here.

pub mod advisor;

pub use advisor::{is_compression_disabled, is_decompression_disabled, Codec, FeatureStatusParams};
