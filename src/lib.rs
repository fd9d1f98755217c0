//! # rheap - A Fixed-Arena Free-List Allocator
//!
//! This crate provides a **first-fit free-list allocator** that serves
//! sub-allocations out of a single fixed-size arena, obtained once from the
//! system allocator.
//!
//! ## Overview
//!
//! ```text
//!   Arena after a few allocations and frees:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                              ARENA                                   │
//!   │                                                                      │
//!   │   ┌────┬──────┬────┬────────┬────┬─────┬────┬─────────────────────┐  │
//!   │   │ H  │  A1  │ N  │  free  │ H  │ A2  │ N  │        free         │  │
//!   │   └────┴──────┴────┴────────┴────┴─────┴────┴─────────────────────┘  │
//!   │                ▲                      ▲                              │
//!   │                │                      │                              │
//!   │   head ────────┘         next ────────┘                              │
//!   │                                                                      │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   H = header of an allocated region, N = node of a free region.
//!   Free regions are linked through the arena itself.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   rheap
//!   ├── arena      - Backing buffer obtained from the system allocator
//!   ├── block      - Header / free-list node views (internal)
//!   ├── config     - HeapConfig, arena capacity
//!   ├── error      - HeapError
//!   ├── free_list  - First fit, insertion, sort and coalescing (internal)
//!   ├── global     - Process-wide heap and free functions
//!   └── heap       - Heap, the locked allocator context
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rheap::Heap;
//!
//! let heap = Heap::with_capacity(1024).unwrap();
//!
//! let ptr = heap.allocate(64).unwrap();
//! unsafe {
//!     ptr.as_ptr().write_bytes(0x2a, 64);
//!     heap.release(ptr.as_ptr());
//! }
//!
//! heap.coalesce();
//! assert_eq!(heap.stats().free_regions, 1);
//! ```
//!
//! ## How It Works
//!
//! Allocation walks the free list from the head and takes the first region
//! large enough. If what remains can hold a header of its own, the region is
//! split:
//!
//! ```text
//!   Before:  ┌────┬────────────────────────────────────────┐
//!            │ N  │              original                  │
//!            └────┴────────────────────────────────────────┘
//!
//!   After:   ┌────┬────────────┬────┬──────────────────────┐
//!            │ H  │    size    │ N  │ original - size - H  │
//!            └────┴────────────┴────┴──────────────────────┘
//!                 ▲                 ▲
//!                 │                 └── takes the old node's place
//!                 └── pointer returned to user
//! ```
//!
//! Otherwise the whole region is handed out, so a caller may get a few bytes
//! more than requested.
//!
//! Releasing checks the header's magic number, refuses pointers already on
//! the free list, and pushes the region at the head. Free regions are not
//! merged on release; [`Heap::coalesce`] sorts the list by address and merges
//! neighbours when the owner asks for it.
//!
//! ## Limitations
//!
//! - **Fixed capacity**: The arena never grows
//! - **No alignment**: Payloads start right after their header, at any byte
//! - **Best-effort validation**: The magic check is a heuristic
//!
//! ## Safety
//!
//! Releasing works on raw pointers and is `unsafe`: passing a pointer that
//! this heap did not hand out is undefined behaviour.

mod arena;
mod block;
pub mod config;
pub mod error;
mod free_list;
pub mod global;
mod heap;

pub use block::{HEADER_SIZE, MAGIC};
pub use config::{DEFAULT_CAPACITY, HeapConfig};
pub use error::{HeapError, Result};
pub use heap::{FreeRegion, Heap, HeapStats};
