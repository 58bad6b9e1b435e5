// In: src/error.rs

//! This module defines the single, unified error type for the entire stratum core.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StratumError {
    // =========================================================================
    // === High-Level, Semantic Errors (Specific to this library's contracts)
    // =========================================================================
    /// A caller-supplied argument violated a precondition: mask length
    /// mismatch, out-of-range null count, malformed offsets, and so on.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A column variant outside the closed recursive set reached a boundary
    /// that cannot represent it. Indicates a caller or model bug.
    #[error("Unsupported data type for this operation: {0}")]
    UnsupportedType(String),

    /// The execution context's allocator could not satisfy a request.
    /// Propagated to the caller, never silently retried.
    #[error("Allocation failed: {0}")]
    AllocationFailure(String),

    #[error("Internal logic error (this is a bug): {0}")]
    InternalError(String),

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error originating from the Arrow library.
    #[error("Arrow operation failed: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// An error from a safe byte-casting operation failing.
    #[error("Byte slice casting error: {0}")]
    PodCast(String), // Manual `From` impl is needed as bytemuck::PodCastError doesn't impl Error
}

// =============================================================================
// === Manual `From` Implementations ===
// =============================================================================

impl From<bytemuck::PodCastError> for StratumError {
    fn from(err: bytemuck::PodCastError) -> Self {
        StratumError::PodCast(err.to_string())
    }
}
