//! This module defines the execution context handed to bulk column
//! transforms: an ordering token plus the allocator used for every new
//! buffer the transform produces.
//!
//! The CPU implementation of the engine runs to completion before
//! returning, so the stream token carries no scheduling behavior here; it
//! is threaded through for API compatibility with asynchronous backends
//! and surfaced in diagnostics.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use arrow::buffer::MutableBuffer;

use crate::error::StratumError;

//==================================================================================
// 1. Stream Token
//==================================================================================

/// An opaque ordering token identifying the stream/queue work is issued
/// against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StreamToken(pub u64);

//==================================================================================
// 2. Allocators
//==================================================================================

/// The allocation seam for all new buffers produced by a transform.
///
/// Failures surface as `AllocationFailure` and are propagated to the
/// caller, never retried inside the engine.
pub trait BufferAllocator: Send + Sync + fmt::Debug {
    fn allocate(&self, capacity: usize) -> Result<MutableBuffer, StratumError>;
}

/// Allocates through the default Arrow allocator.
#[derive(Debug, Default)]
pub struct SystemAllocator;

impl BufferAllocator for SystemAllocator {
    fn allocate(&self, capacity: usize) -> Result<MutableBuffer, StratumError> {
        Ok(MutableBuffer::with_capacity(capacity))
    }
}

/// An allocator with a fixed byte budget.
///
/// Useful for memory-budgeted callers and for tests that need to observe
/// `AllocationFailure` propagation deterministically.
#[derive(Debug)]
pub struct BudgetAllocator {
    limit_bytes: usize,
    used_bytes: AtomicUsize,
}

impl BudgetAllocator {
    pub fn new(limit_bytes: usize) -> Self {
        Self {
            limit_bytes,
            used_bytes: AtomicUsize::new(0),
        }
    }

    /// Total bytes handed out so far.
    pub fn used_bytes(&self) -> usize {
        self.used_bytes.load(Ordering::Relaxed)
    }
}

impl BufferAllocator for BudgetAllocator {
    fn allocate(&self, capacity: usize) -> Result<MutableBuffer, StratumError> {
        let previous = self.used_bytes.fetch_add(capacity, Ordering::Relaxed);
        if previous + capacity > self.limit_bytes {
            self.used_bytes.fetch_sub(capacity, Ordering::Relaxed);
            return Err(StratumError::AllocationFailure(format!(
                "Budget of {} bytes exhausted ({} in use, {} requested)",
                self.limit_bytes, previous, capacity
            )));
        }
        Ok(MutableBuffer::with_capacity(capacity))
    }
}

//==================================================================================
// 3. Execution Context
//==================================================================================

/// A caller-supplied pairing of a stream token and an allocator.
///
/// Cloning shares the allocator; the context holds no other state, so
/// independent invocations over distinct trees may run concurrently.
#[derive(Debug, Clone)]
pub struct ExecContext {
    stream: StreamToken,
    allocator: Arc<dyn BufferAllocator>,
}

impl ExecContext {
    pub fn new(stream: StreamToken, allocator: Arc<dyn BufferAllocator>) -> Self {
        Self { stream, allocator }
    }

    pub fn with_allocator(allocator: Arc<dyn BufferAllocator>) -> Self {
        Self::new(StreamToken::default(), allocator)
    }

    pub fn stream(&self) -> StreamToken {
        self.stream
    }

    pub fn allocator(&self) -> &dyn BufferAllocator {
        self.allocator.as_ref()
    }
}

impl Default for ExecContext {
    fn default() -> Self {
        Self::new(StreamToken::default(), Arc::new(SystemAllocator))
    }
}

//==================================================================================
// 4. Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_allocator_allocates() {
        let ctx = ExecContext::default();
        let buf = ctx.allocator().allocate(64).unwrap();
        assert!(buf.capacity() >= 64);
    }

    #[test]
    fn test_budget_allocator_enforces_limit() {
        let allocator = BudgetAllocator::new(100);
        assert!(allocator.allocate(60).is_ok());
        assert_eq!(allocator.used_bytes(), 60);

        let result = allocator.allocate(60);
        assert!(matches!(result, Err(StratumError::AllocationFailure(_))));
        // A failed request does not count against the budget.
        assert_eq!(allocator.used_bytes(), 60);

        assert!(allocator.allocate(40).is_ok());
    }
}
