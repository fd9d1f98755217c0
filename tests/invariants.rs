//! Property tests for the arena tiling invariant.
//!
//! After any sequence of allocate/release/coalesce calls, free and allocated
//! regions tile the arena exactly: no overlap, no gap, and every byte is
//! accounted for as payload or header.

use std::ptr::NonNull;

use proptest::prelude::*;
use rheap::{HEADER_SIZE, Heap};

const CAPACITY: usize = 2048;

#[derive(Debug, Clone)]
enum Op {
  Allocate(usize),
  Release(usize),
  Coalesce,
}

fn op() -> impl Strategy<Value = Op> {
  prop_oneof![
    4 => (1usize..300).prop_map(Op::Allocate),
    3 => any::<usize>().prop_map(Op::Release),
    1 => Just(Op::Coalesce),
  ]
}

/// `(offset, size)` of every region, free or allocated, sorted by offset.
fn regions(
  heap: &Heap,
  live: &[NonNull<u8>],
) -> Vec<(usize, usize)> {
  let mut regions: Vec<_> = heap
    .free_regions()
    .into_iter()
    .map(|region| (region.offset, region.size))
    .collect();

  for &ptr in live {
    let offset = heap.offset_of(ptr).expect("live pointer inside the arena");
    let size = unsafe { heap.usable_size(ptr) }.expect("live header keeps its magic");
    regions.push((offset, size));
  }

  regions.sort_unstable();
  regions
}

fn assert_tiles_arena(
  heap: &Heap,
  live: &[NonNull<u8>],
) {
  if !heap.is_initialized() {
    return;
  }

  let mut expected_offset = 0;
  for (offset, size) in regions(heap, live) {
    assert_eq!(offset, expected_offset, "regions overlap or leave a gap");
    expected_offset = offset + HEADER_SIZE + size;
  }
  assert_eq!(expected_offset, heap.capacity());
}

proptest! {
  #![proptest_config(ProptestConfig::with_cases(200))]

  #[test]
  fn regions_tile_the_arena(ops in prop::collection::vec(op(), 1..80)) {
    let heap = Heap::with_capacity(CAPACITY).unwrap();
    let mut live: Vec<NonNull<u8>> = Vec::new();

    for op in ops {
      match op {
        Op::Allocate(size) => {
          let before = heap.free_regions();
          match heap.allocate(size) {
            Some(ptr) => {
              let granted = unsafe { heap.usable_size(ptr) }.unwrap();
              prop_assert!(granted >= size);
              prop_assert!(granted < size + HEADER_SIZE);
              live.push(ptr);
            }
            None => {
              prop_assert_eq!(heap.free_regions(), before);
            }
          }
        }
        Op::Release(index) if !live.is_empty() => {
          let ptr = live.swap_remove(index % live.len());
          unsafe { heap.try_release(ptr.as_ptr()) }.unwrap();
        }
        Op::Release(_) => {}
        Op::Coalesce => heap.coalesce(),
      }

      assert_tiles_arena(&heap, &live);
    }

    for ptr in live.drain(..) {
      unsafe { heap.release(ptr.as_ptr()) };
    }
    heap.coalesce();

    if heap.is_initialized() {
      prop_assert_eq!(heap.free_regions().len(), 1);
      prop_assert_eq!(heap.stats().free_bytes, CAPACITY - HEADER_SIZE);
    }
  }

  #[test]
  fn coalesce_is_idempotent(
    sizes in prop::collection::vec(1usize..200, 1..10),
    mask in any::<u16>()
  ) {
    let heap = Heap::with_capacity(CAPACITY).unwrap();
    let ptrs: Vec<_> = sizes.iter().filter_map(|&size| heap.allocate(size)).collect();

    for (i, ptr) in ptrs.iter().enumerate() {
      if mask & (1 << i) != 0 {
        unsafe { heap.release(ptr.as_ptr()) };
      }
    }

    heap.coalesce();
    let once = heap.free_regions();
    heap.coalesce();

    prop_assert_eq!(heap.free_regions(), once);
  }

  #[test]
  fn double_free_keeps_list(
    sizes in prop::collection::vec(1usize..200, 2..8),
    pick in any::<usize>()
  ) {
    let heap = Heap::with_capacity(CAPACITY).unwrap();
    let ptrs: Vec<_> = sizes.iter().filter_map(|&size| heap.allocate(size)).collect();
    let victim = ptrs[pick % ptrs.len()];

    unsafe { heap.release(victim.as_ptr()) };
    let before = heap.free_regions();
    unsafe { heap.release(victim.as_ptr()) };

    prop_assert_eq!(heap.free_regions(), before);
  }
}
