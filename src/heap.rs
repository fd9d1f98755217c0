use std::{alloc, fmt, ptr::NonNull};

use parking_lot::{Mutex, const_mutex};

use crate::{
  arena::Arena,
  block::{HEADER_SIZE, Header, MAGIC},
  config::HeapConfig,
  error::{HeapError, Result},
  free_list::FreeList,
};

/// A free region as seen by [`Heap::free_regions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeRegion {
  /// Offset of the region's header from the arena base.
  pub offset: usize,
  /// Usable bytes, header excluded.
  pub size: usize,
}

/// Point-in-time summary of a heap's free list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeapStats {
  pub capacity: usize,
  pub free_regions: usize,
  pub free_bytes: usize,
  pub largest_free: usize,
}

impl fmt::Display for HeapStats {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(
      f,
      "capacity {} bytes, {} free regions, {} bytes free, largest {}",
      self.capacity, self.free_regions, self.free_bytes, self.largest_free
    )
  }
}

struct State {
  arena: Option<Arena>,
  free_list: FreeList,
}

// The free list only points into the arena owned by the same state, and both
// are reached exclusively through the heap's mutex.
unsafe impl Send for State {}

impl State {
  fn init(
    &mut self,
    capacity: usize,
  ) -> Result<()> {
    if self.arena.is_some() {
      return Ok(());
    }

    let arena = Arena::new(capacity)?;
    self.free_list = unsafe { FreeList::spanning(arena.base(), arena.capacity()) };
    self.arena = Some(arena);

    Ok(())
  }
}

/// A fixed-capacity heap serving first-fit allocations from a free list.
///
/// The arena is obtained from the system allocator on the first allocation and
/// handed back by [`Heap::destroy_heap`] or on drop. All free-list mutations
/// are serialized by one mutex.
pub struct Heap {
  config: HeapConfig,
  state: Mutex<State>,
}

impl Heap {
  pub const fn new(
    config: HeapConfig,
  ) -> Self {
    Self {
      config,
      state: const_mutex(State {
        arena: None,
        free_list: FreeList::new(),
      }),
    }
  }

  pub fn with_capacity(
    capacity: usize,
  ) -> Result<Self> {
    Ok(Self::new(HeapConfig::new(capacity)?))
  }

  pub fn capacity(
    &self,
  ) -> usize {
    self.config.capacity()
  }

  pub fn is_initialized(
    &self,
  ) -> bool {
    self.state.lock().arena.is_some()
  }

  /// Obtains the arena and seeds the free list with one region spanning it.
  ///
  /// Does nothing when the arena already exists.
  pub fn init_heap(
    &self,
  ) -> Result<()> {
    let mut state = self.state.lock();
    state.init(self.config.capacity())
  }

  /// Releases the arena and empties the free list.
  ///
  /// Outstanding pointers become dangling.
  pub fn destroy_heap(
    &self,
  ) {
    let mut state = self.state.lock();
    state.free_list = FreeList::new();
    state.arena = None;
  }

  /// Returns at least `size` usable bytes, or `None` when no free region is
  /// large enough or `size` is zero.
  ///
  /// # Panics
  ///
  /// Aborts the process if the arena can't be obtained on first use.
  pub fn allocate(
    &self,
    size: usize,
  ) -> Option<NonNull<u8>> {
    let mut state = self.state.lock();
    let capacity = self.config.capacity();

    if let Err(err) = state.init(capacity) {
      tracing::error!(%err, "heap initialization failed");
      let layout = alloc::Layout::array::<u8>(capacity).unwrap_or(alloc::Layout::new::<u8>());
      alloc::handle_alloc_error(layout);
    }

    if size == 0 {
      tracing::trace!("zero-size request");
      return None;
    }

    match unsafe { state.free_list.first_fit(size) } {
      Some(header) => {
        tracing::trace!(size, granted = unsafe { header.size() }, "allocate");
        Some(header.payload())
      }
      None => {
        tracing::warn!(size, "no free region large enough");
        None
      }
    }
  }

  /// Returns a buffer to the free list.
  ///
  /// A header without its sentinel is reported and the call is aborted; a
  /// pointer that is already free is ignored. Null is a no-op.
  ///
  /// # Safety
  ///
  /// `ptr` must be null or have been returned by [`Heap::allocate`] on this
  /// heap since its arena was last initialized.
  pub unsafe fn release(
    &self,
    ptr: *mut u8,
  ) {
    match unsafe { self.try_release(ptr) } {
      Ok(()) => {}
      Err(err @ HeapError::DoubleFree { .. }) => {
        tracing::debug!(?ptr, %err, "ignoring release");
      }
      Err(err) => {
        tracing::error!(?ptr, %err, "release aborted");
      }
    }
  }

  /// Like [`Heap::release`], but reports why a release was refused.
  ///
  /// # Safety
  ///
  /// Same contract as [`Heap::release`].
  pub unsafe fn try_release(
    &self,
    ptr: *mut u8,
  ) -> Result<()> {
    let Some(payload) = NonNull::new(ptr) else {
      return Ok(());
    };

    let header = unsafe { Header::from_payload(payload) };
    let magic = unsafe { header.magic() };

    if magic != MAGIC {
      return Err(HeapError::CorruptHeader {
        found: magic,
        expected: MAGIC,
      });
    }

    let mut state = self.state.lock();

    if unsafe { state.free_list.contains(header.addr()) } {
      let offset = state
        .arena
        .as_ref()
        .map_or(0, |arena| arena.offset_of(header.addr()));
      return Err(HeapError::DoubleFree { offset });
    }

    let node = unsafe { state.free_list.push_front(header) };
    tracing::trace!(?ptr, size = unsafe { node.size() }, "release");

    Ok(())
  }

  /// Merges address-adjacent free regions. Leaves the free list sorted by
  /// address.
  pub fn coalesce(
    &self,
  ) {
    let mut state = self.state.lock();
    let merged = unsafe { state.free_list.coalesce() };

    tracing::debug!(merged, "coalesced free list");
  }

  /// Free regions in current list order.
  pub fn free_regions(
    &self,
  ) -> Vec<FreeRegion> {
    let state = self.state.lock();
    let Some(arena) = state.arena.as_ref() else {
      return Vec::new();
    };

    unsafe { state.free_list.iter() }
      .map(|node| FreeRegion {
        offset: arena.offset_of(node.addr()),
        size: unsafe { node.size() },
      })
      .collect()
  }

  pub fn stats(
    &self,
  ) -> HeapStats {
    let regions = self.free_regions();

    HeapStats {
      capacity: self.capacity(),
      free_regions: regions.len(),
      free_bytes: regions.iter().map(|region| region.size).sum(),
      largest_free: regions.iter().map(|region| region.size).max().unwrap_or(0),
    }
  }

  /// Usable bytes recorded for a live allocation, `None` if its header lost
  /// the sentinel.
  ///
  /// # Safety
  ///
  /// `ptr` must have been returned by [`Heap::allocate`] on this heap and not
  /// released since.
  pub unsafe fn usable_size(
    &self,
    ptr: NonNull<u8>,
  ) -> Option<usize> {
    let header = unsafe { Header::from_payload(ptr) };

    if unsafe { header.magic() } != MAGIC {
      return None;
    }

    Some(unsafe { header.size() })
  }

  /// Offset of a payload pointer's header from the arena base.
  pub fn offset_of(
    &self,
    ptr: NonNull<u8>,
  ) -> Option<usize> {
    let state = self.state.lock();
    let arena = state.arena.as_ref()?;

    if !arena.contains(ptr.as_ptr()) {
      return None;
    }

    arena.offset_of(ptr).checked_sub(HEADER_SIZE)
  }
}

impl Default for Heap {
  fn default() -> Self {
    Self::new(HeapConfig::DEFAULT)
  }
}

impl fmt::Debug for Heap {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_struct("Heap")
      .field("config", &self.config)
      .field("free_regions", &self.free_regions())
      .finish()
  }
}
