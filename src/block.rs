//! Bookkeeping prefix shared by allocated and free regions.
//!
//! Every region of the arena starts with one `HEADER_SIZE` prefix. While the
//! region is handed out the prefix is read through [`Header`]; while it sits on
//! the free list the same bytes are read through [`Node`]. Which view applies
//! is decided by the heap's bookkeeping, never by looking at the bytes.
//!
//! ```text
//!   offset   Header view        Node view
//!   0        size               size
//!   8        magic              (magic, untouched)
//!   16       (unused)           next
//! ```
//!
//! Payload sizes are not rounded, so a prefix can start at any byte offset.
//! All accesses go through unaligned reads and writes.

use std::{mem, ptr, ptr::NonNull};

/// Sentinel written into every header at allocation time.
pub const MAGIC: usize = 0x0123_4567;

#[allow(dead_code)]
#[repr(C)]
struct Prefix {
  size: usize,
  magic: usize,
  next: *mut u8,
}

/// Bytes of bookkeeping in front of every region.
pub const HEADER_SIZE: usize = mem::size_of::<Prefix>();

const SIZE_OFFSET: usize = mem::offset_of!(Prefix, size);
const MAGIC_OFFSET: usize = mem::offset_of!(Prefix, magic);
const NEXT_OFFSET: usize = mem::offset_of!(Prefix, next);

unsafe fn read_field<T>(
  base: NonNull<u8>,
  offset: usize,
) -> T {
  unsafe { ptr::read_unaligned(base.as_ptr().add(offset).cast::<T>()) }
}

unsafe fn write_field<T>(
  base: NonNull<u8>,
  offset: usize,
  value: T,
) {
  unsafe { ptr::write_unaligned(base.as_ptr().add(offset).cast::<T>(), value) }
}

/// View of an allocated region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
  addr: NonNull<u8>,
}

impl Header {
  /// Writes a fresh header at `addr`.
  ///
  /// # Safety
  ///
  /// `addr` must point at `HEADER_SIZE` writable bytes inside the arena.
  pub unsafe fn write(
    addr: NonNull<u8>,
    size: usize,
  ) -> Self {
    unsafe {
      write_field(addr, SIZE_OFFSET, size);
      write_field(addr, MAGIC_OFFSET, MAGIC);
    }

    Self { addr }
  }

  /// Recovers the header sitting right before a payload pointer.
  ///
  /// # Safety
  ///
  /// `payload` must have been produced by [`Header::payload`].
  pub unsafe fn from_payload(
    payload: NonNull<u8>,
  ) -> Self {
    Self {
      addr: unsafe { payload.sub(HEADER_SIZE) },
    }
  }

  pub fn addr(
    self,
  ) -> NonNull<u8> {
    self.addr
  }

  pub fn payload(
    self,
  ) -> NonNull<u8> {
    // A header is always followed by its payload inside the arena.
    unsafe { self.addr.add(HEADER_SIZE) }
  }

  pub unsafe fn size(
    self,
  ) -> usize {
    unsafe { read_field(self.addr, SIZE_OFFSET) }
  }

  pub unsafe fn magic(
    self,
  ) -> usize {
    unsafe { read_field(self.addr, MAGIC_OFFSET) }
  }

  /// Turns the region into a free-list node, keeping its size.
  ///
  /// The magic word is left in place.
  pub unsafe fn into_node(
    self,
    next: Option<Node>,
  ) -> Node {
    let node = Node { addr: self.addr };
    unsafe { node.set_next(next) };
    node
  }
}

/// View of a free region linked into the free list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node {
  addr: NonNull<u8>,
}

impl Node {
  /// Writes a fresh free-list node at `addr`.
  ///
  /// # Safety
  ///
  /// `addr` must point at `HEADER_SIZE` writable bytes inside the arena that
  /// no live allocation covers.
  pub unsafe fn write(
    addr: NonNull<u8>,
    size: usize,
    next: Option<Node>,
  ) -> Self {
    let node = Self { addr };
    unsafe {
      node.set_size(size);
      node.set_next(next);
    }
    node
  }

  pub fn addr(
    self,
  ) -> NonNull<u8> {
    self.addr
  }

  /// First byte past this region's payload.
  pub unsafe fn end(
    self,
  ) -> *const u8 {
    let size = unsafe { self.size() };
    self.addr.as_ptr().wrapping_add(HEADER_SIZE + size)
  }

  pub unsafe fn size(
    self,
  ) -> usize {
    unsafe { read_field(self.addr, SIZE_OFFSET) }
  }

  pub unsafe fn set_size(
    self,
    size: usize,
  ) {
    unsafe { write_field(self.addr, SIZE_OFFSET, size) }
  }

  pub unsafe fn next(
    self,
  ) -> Option<Node> {
    let next: *mut u8 = unsafe { read_field(self.addr, NEXT_OFFSET) };
    NonNull::new(next).map(|addr| Node { addr })
  }

  pub unsafe fn set_next(
    self,
    next: Option<Node>,
  ) {
    let link = next.map_or(ptr::null_mut(), |node| node.addr.as_ptr());
    unsafe { write_field(self.addr, NEXT_OFFSET, link) }
  }

  /// Wipes the sentinel left over from the region's last allocation.
  ///
  /// Only for nodes absorbed into a neighbour, whose prefix becomes plain
  /// free payload.
  pub unsafe fn clear_magic(
    self,
  ) {
    unsafe { write_field(self.addr, MAGIC_OFFSET, 0usize) }
  }

  /// Hands the region out, recording `size` usable bytes.
  pub unsafe fn into_header(
    self,
    size: usize,
  ) -> Header {
    unsafe { Header::write(self.addr, size) }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn at(
    buf: &mut Vec<u8>,
    offset: usize,
  ) -> NonNull<u8> {
    assert!(offset + HEADER_SIZE <= buf.len());
    NonNull::new(buf.as_mut_ptr().wrapping_add(offset)).unwrap()
  }

  #[test]
  fn test_header_size_is_three_words() {
    assert_eq!(HEADER_SIZE, 3 * mem::size_of::<usize>());
  }

  #[test]
  fn test_header_round_trip_through_node() {
    let mut buf = vec![0u8; 4 * HEADER_SIZE];

    unsafe {
      let header = Header::write(at(&mut buf, 0), 40);
      assert_eq!(header.size(), 40);
      assert_eq!(header.magic(), MAGIC);
      assert_eq!(Header::from_payload(header.payload()), header);

      let node = header.into_node(None);
      assert_eq!(node.size(), 40);
      assert_eq!(node.next(), None);

      // The sentinel survives the switch to a free node.
      assert_eq!(header.magic(), MAGIC);
    }
  }

  #[test]
  fn test_unaligned_node() {
    let mut buf = vec![0u8; 4 * HEADER_SIZE];

    unsafe {
      let tail = Node::write(at(&mut buf, 2 * HEADER_SIZE + 3), 7, None);
      let head = Node::write(at(&mut buf, 1), 5, Some(tail));

      assert_eq!(head.size(), 5);
      assert_eq!(head.next(), Some(tail));
      assert_eq!(tail.size(), 7);
      assert_eq!(head.end(), buf.as_ptr().add(1 + HEADER_SIZE + 5));

      let header = head.into_header(5);
      assert_eq!(header.magic(), MAGIC);
      assert_eq!(header.payload().as_ptr(), buf.as_mut_ptr().add(1 + HEADER_SIZE));
    }
  }

  #[test]
  fn test_clear_magic() {
    let mut buf = vec![0u8; 2 * HEADER_SIZE];

    unsafe {
      let header = Header::write(at(&mut buf, 0), 12);
      let node = header.into_node(None);
      node.clear_magic();

      assert_eq!(header.magic(), 0);
      assert_eq!(node.size(), 12);
      assert_eq!(node.next(), None);
    }
  }
}
