//! Process-wide heap and free-function entry points forwarding to it.

use std::ptr::NonNull;

use crate::{config::HeapConfig, heap::Heap};

static HEAP: Heap = Heap::new(HeapConfig::DEFAULT);

/// The process-wide heap.
pub fn heap() -> &'static Heap {
  &HEAP
}

/// Allocates from the process-wide heap. See [`Heap::allocate`].
pub fn allocate(
  size: usize,
) -> Option<NonNull<u8>> {
  HEAP.allocate(size)
}

/// Releases into the process-wide heap. See [`Heap::release`].
///
/// # Safety
///
/// `ptr` must be null or come from [`allocate`] since the last
/// [`destroy_heap`].
pub unsafe fn release(
  ptr: *mut u8,
) {
  unsafe { HEAP.release(ptr) }
}

pub fn coalesce() {
  HEAP.coalesce()
}

pub fn destroy_heap() {
  HEAP.destroy_heap()
}
