use std::ptr::NonNull;

use libc::{c_void, calloc, free};

use crate::error::{HeapError, Result};

/// The single contiguous buffer every allocation is carved from.
///
/// Obtained from the system allocator once and handed back on drop.
#[derive(Debug)]
pub struct Arena {
  base: NonNull<u8>,
  capacity: usize,
}

impl Arena {
  pub fn new(
    capacity: usize,
  ) -> Result<Self> {
    // Zero-filled so every bookkeeping word is initialized memory.
    let base = unsafe { calloc(1, capacity) } as *mut u8;

    let base = NonNull::new(base).ok_or(HeapError::ArenaUnavailable { capacity })?;

    tracing::debug!(?base, capacity, "arena initialized");

    Ok(Self { base, capacity })
  }

  pub fn base(
    &self,
  ) -> NonNull<u8> {
    self.base
  }

  pub fn capacity(
    &self,
  ) -> usize {
    self.capacity
  }

  /// Offset of `addr` from the arena base.
  pub fn offset_of(
    &self,
    addr: NonNull<u8>,
  ) -> usize {
    addr.as_ptr() as usize - self.base.as_ptr() as usize
  }

  pub fn contains(
    &self,
    addr: *const u8,
  ) -> bool {
    let start = self.base.as_ptr() as usize;
    (start..start + self.capacity).contains(&(addr as usize))
  }
}

impl Drop for Arena {
  fn drop(
    &mut self,
  ) {
    tracing::debug!(base = ?self.base, capacity = self.capacity, "arena released");
    unsafe { free(self.base.as_ptr() as *mut c_void) };
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_arena_is_zeroed() {
    let arena = Arena::new(256).unwrap();

    let bytes = unsafe { std::slice::from_raw_parts(arena.base().as_ptr(), arena.capacity()) };

    assert!(bytes.iter().all(|&b| b == 0));
  }

  #[test]
  fn test_contains() {
    let arena = Arena::new(64).unwrap();
    let base = arena.base().as_ptr();

    assert!(arena.contains(base));
    assert!(arena.contains(base.wrapping_add(63)));
    assert!(!arena.contains(base.wrapping_add(64)));
    assert_eq!(arena.offset_of(NonNull::new(base.wrapping_add(10)).unwrap()), 10);
  }
}
