//! This file is the root of the `stratum_core` Rust crate.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of the library (`column`,
//!     `superimpose`, etc.) so the Rust compiler knows they exist.
//! 2.  Re-exporting the small public surface consumed by the surrounding
//!     I/O and table-construction layers.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//==================================================================================
// 1. Module Declarations
//==================================================================================
#[macro_use]
mod observability; // Make macros available throughout the crate

pub mod bridge;
pub mod column;
pub mod compression;
pub mod exec;
pub mod superimpose;

mod error;
mod null_handling;
mod types;
mod utils;

//==================================================================================
// 2. Public API Re-exports
//==================================================================================
pub use column::{Column, ColumnKind, NullCount};
pub use compression::advisor::{
    is_compression_disabled, is_decompression_disabled, Codec, FeatureStatusParams,
};
pub use error::StratumError;
pub use exec::{BudgetAllocator, BufferAllocator, ExecContext, StreamToken, SystemAllocator};
pub use superimpose::superimpose_nulls;
pub use types::PrimitiveType;
