use crate::{
  block::HEADER_SIZE,
  error::{HeapError, Result},
};

/// Arena capacity used by [`HeapConfig::DEFAULT`], in bytes.
pub const DEFAULT_CAPACITY: usize = 64 * 1024;

/// Sizing of a heap's arena. The capacity is fixed for the arena's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapConfig {
  capacity: usize,
}

impl HeapConfig {
  pub const DEFAULT: HeapConfig = HeapConfig {
    capacity: DEFAULT_CAPACITY,
  };

  /// Smallest capacity that still leaves one usable payload byte.
  pub const MIN_CAPACITY: usize = HEADER_SIZE + 1;

  pub fn new(
    capacity: usize,
  ) -> Result<Self> {
    if capacity < Self::MIN_CAPACITY {
      return Err(HeapError::CapacityTooSmall {
        capacity,
        minimum: Self::MIN_CAPACITY,
      });
    }

    Ok(Self { capacity })
  }

  pub const fn capacity(
    &self,
  ) -> usize {
    self.capacity
  }
}

impl Default for HeapConfig {
  fn default() -> Self {
    Self::DEFAULT
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_rejects_tiny_capacity() {
    assert_eq!(
      HeapConfig::new(HEADER_SIZE),
      Err(HeapError::CapacityTooSmall {
        capacity: HEADER_SIZE,
        minimum: HEADER_SIZE + 1,
      })
    );
    assert!(HeapConfig::new(HEADER_SIZE + 1).is_ok());
  }

  #[test]
  fn test_default() {
    assert_eq!(HeapConfig::default().capacity(), DEFAULT_CAPACITY);
  }
}
