use rheap::{HEADER_SIZE, Heap};

/// Prints every free region in list order, followed by a summary.
fn print_free_list(
  label: &str,
  heap: &Heap,
) {
  println!("\n[{}] free list:", label);
  for region in heap.free_regions() {
    println!(
      "  [node @ +{:<5} | free region @ +{:<5} size: {}]",
      region.offset,
      region.offset + HEADER_SIZE,
      region.size
    );
  }
  println!("  {}", heap.stats());
}

fn main() {
  let heap = Heap::with_capacity(1024).expect("1024 bytes is a valid capacity");

  println!("header size = {} bytes", HEADER_SIZE);

  // --------------------------------------------------------------------
  // 1) First allocation initializes the arena lazily.
  // --------------------------------------------------------------------
  let first = heap.allocate(100).expect("fresh arena has room");
  let second = heap.allocate(200).expect("fresh arena has room");
  println!("\n[1] allocate(100) -> +{}", heap.offset_of(first).unwrap_or_default());
  println!("[1] allocate(200) -> +{}", heap.offset_of(second).unwrap_or_default());
  print_free_list("1", &heap);

  // --------------------------------------------------------------------
  // 2) Free the first block. It goes to the head of the free list.
  // --------------------------------------------------------------------
  unsafe { heap.release(first.as_ptr()) };
  print_free_list("2", &heap);

  // --------------------------------------------------------------------
  // 3) First fit reuses the freed block and splits it.
  // --------------------------------------------------------------------
  let third = heap.allocate(50).expect("freed block fits");
  println!(
    "\n[3] allocate(50) -> +{}, reused first block? {}",
    heap.offset_of(third).unwrap_or_default(),
    third == first
  );
  print_free_list("3", &heap);

  // --------------------------------------------------------------------
  // 4) A second release of the same pointer is ignored.
  // --------------------------------------------------------------------
  unsafe {
    heap.release(third.as_ptr());
    heap.release(third.as_ptr());
  }
  print_free_list("4", &heap);

  // --------------------------------------------------------------------
  // 5) Free everything and coalesce back into one region.
  // --------------------------------------------------------------------
  unsafe { heap.release(second.as_ptr()) };
  print_free_list("5 before coalesce", &heap);
  heap.coalesce();
  print_free_list("5 after coalesce", &heap);

  heap.destroy_heap();
  println!("\n[6] heap destroyed, initialized = {}", heap.is_initialized());
}
