//! Intrusive singly linked list of free regions, threaded through the arena.

use std::ptr::NonNull;

use crate::block::{HEADER_SIZE, Header, Node};

#[derive(Debug, Default)]
pub struct FreeList {
  head: Option<Node>,
}

impl FreeList {
  pub const fn new() -> Self {
    Self { head: None }
  }

  /// A list holding one node that spans `capacity` bytes at `base`.
  ///
  /// # Safety
  ///
  /// `base` must point at `capacity` writable bytes, `capacity > HEADER_SIZE`.
  pub unsafe fn spanning(
    base: NonNull<u8>,
    capacity: usize,
  ) -> Self {
    let node = unsafe { Node::write(base, capacity - HEADER_SIZE, None) };
    Self { head: Some(node) }
  }

  /// Walks the list in its current order.
  ///
  /// # Safety
  ///
  /// The list must not be mutated while the iterator is alive.
  pub unsafe fn iter(
    &self,
  ) -> Iter {
    Iter { current: self.head }
  }

  /// Carves `size` usable bytes out of the first region large enough.
  ///
  /// When the leftover cannot host a header of its own the whole region is
  /// handed out and the header records the region's full size.
  pub unsafe fn first_fit(
    &mut self,
    size: usize,
  ) -> Option<Header> {
    if size == 0 {
      return None;
    }

    let mut prev: Option<Node> = None;
    let mut current = self.head;

    while let Some(node) = current {
      let (original, next) = unsafe { (node.size(), node.next()) };

      if original < size {
        prev = Some(node);
        current = next;
        continue;
      }

      // Sole region that can't also fit a header for the split.
      if prev.is_none() && next.is_none() && original - size < HEADER_SIZE {
        tracing::trace!(size, original, "sole free region too small to split");
        return None;
      }

      let (header, replacement) = if original - size >= HEADER_SIZE {
        unsafe {
          let header = node.into_header(size);
          let remainder = Node::write(
            header.payload().add(size),
            original - size - HEADER_SIZE,
            next,
          );
          (header, Some(remainder))
        }
      } else {
        (unsafe { node.into_header(original) }, None)
      };

      tracing::trace!(
        size,
        original,
        split = replacement.is_some(),
        "first fit"
      );

      let link = replacement.or(next);
      match prev {
        None => self.head = link,
        Some(prev) => unsafe { prev.set_next(link) },
      }

      return Some(header);
    }

    None
  }

  /// Whether a free node starts at `addr`.
  pub unsafe fn contains(
    &self,
    addr: NonNull<u8>,
  ) -> bool {
    unsafe { self.iter() }.any(|node| node.addr() == addr)
  }

  /// Links a released region in at the head.
  pub unsafe fn push_front(
    &mut self,
    header: Header,
  ) -> Node {
    let node = unsafe { header.into_node(self.head) };
    self.head = Some(node);
    node
  }

  /// Relinks the nodes in ascending address order.
  pub unsafe fn sort_by_address(
    &mut self,
  ) {
    let mut nodes: Vec<Node> = unsafe { self.iter() }.collect();
    nodes.sort_unstable_by_key(|node| node.addr());

    for pair in nodes.windows(2) {
      unsafe { pair[0].set_next(Some(pair[1])) };
    }
    if let Some(last) = nodes.last() {
      unsafe { last.set_next(None) };
    }

    self.head = nodes.first().copied();
  }

  /// Merges address-adjacent free regions, returning how many nodes were
  /// absorbed.
  pub unsafe fn coalesce(
    &mut self,
  ) -> usize {
    unsafe { self.sort_by_address() };

    let mut merged = 0;
    let mut target = self.head;

    while let Some(t) = target {
      unsafe {
        let mut prev = t;
        let mut current = t.next();

        while let Some(node) = current {
          let next = node.next();

          if node.addr().as_ptr() as *const u8 == t.end() {
            t.set_size(t.size() + node.size() + HEADER_SIZE);
            prev.set_next(next);
            // A stale release of the absorbed region must not pass validation.
            node.clear_magic();
            merged += 1;
          } else {
            prev = node;
          }

          current = next;
        }

        target = t.next();
      }
    }

    merged
  }
}

pub struct Iter {
  current: Option<Node>,
}

impl Iterator for Iter {
  type Item = Node;

  fn next(
    &mut self,
  ) -> Option<Node> {
    let node = self.current?;
    self.current = unsafe { node.next() };
    Some(node)
  }
}
