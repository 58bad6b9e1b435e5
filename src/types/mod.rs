//! This module defines the core, strongly-typed data representations used
//! throughout the stratum column model.
//!
//! It currently includes the canonical `PrimitiveType` enum, a closed set of
//! fixed-width leaf types with safe, serializable Arrow conversions.

pub mod data_type;

// Re-export the main type(s) for easier access.
pub use data_type::PrimitiveType;
