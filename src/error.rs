//! Error types for heap operations

use thiserror::Error;

/// Errors surfaced by the heap.
///
/// Running out of memory is not one of them: [`Heap::allocate`] reports
/// exhaustion by returning `None`.
///
/// [`Heap::allocate`]: crate::Heap::allocate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeapError {
  /// The system allocator could not provide the backing arena.
  #[error("couldn't initialize heap: system allocator refused {capacity} bytes")]
  ArenaUnavailable {
    /// Requested arena capacity
    capacity: usize,
  },

  /// The configured capacity cannot hold a single header and payload byte.
  #[error("heap capacity {capacity} is too small, need at least {minimum} bytes")]
  CapacityTooSmall {
    /// Requested arena capacity
    capacity: usize,
    /// Smallest usable capacity
    minimum: usize,
  },

  /// The header in front of a released pointer lost its sentinel.
  #[error("header is missing its magic number: expected {expected:#010x}, found {found:#010x}, the heap is corrupt")]
  CorruptHeader {
    /// Value read from the header
    found: usize,
    /// Sentinel written at allocation time
    expected: usize,
  },

  /// The region is already linked into the free list.
  #[error("region at arena offset {offset} is already free")]
  DoubleFree {
    /// Offset of the region's header from the arena base
    offset: usize,
  },
}

impl HeapError {
  /// Whether the heap can keep serving requests after this error.
  pub fn is_recoverable(
    &self,
  ) -> bool {
    !matches!(self, Self::ArenaUnavailable { .. })
  }
}

/// Result type for heap operations
pub type Result<T> = std::result::Result<T, HeapError>;
