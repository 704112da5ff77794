//! A fixed-capacity byte arena with coalescing free-space bookkeeping.
//!
//! An [`Arena`] owns one contiguous buffer whose size is fixed when the arena
//! is created. It hands out sub-ranges of the buffer and takes them back,
//! merging every released region with the free ranges directly next to it so
//! that fragmentation stays limited.
//!
//! # Bookkeeping
//!
//! Free space is tracked by two structures that always describe the same set
//! of free ranges:
//!
//! - a **size heap** ([`range_heap::RangeHeap`]) that yields the largest free
//!   range in constant time, used to serve allocations
//! - an **offset index** that finds the free ranges directly before and after
//!   an offset in logarithmic time, used to coalesce on deallocation
//!
//! ```text
//! Free ranges of an arena:
//!
//!   offset index (by offset)             size heap (by size)
//!   ┌─────────┬──────────┐                     ┌──────┐
//!   │ 0   → 50│ 60 → 240 │                     │ 240  │
//!   └─────────┴──────────┘                     ├──────┤
//!                                              │  50  │
//!                                              └──────┘
//! ```
//!
//! # Usage Examples
//!
//! ## Handles
//!
//! ```rust
//! use arena::Arena;
//!
//! let mut arena = Arena::new(1024).unwrap();
//!
//! let a = arena.allocate(128).unwrap();
//! let b = arena.allocate(256).unwrap();
//! assert_eq!((a.offset(), b.offset()), (0, 128));
//!
//! arena.bytes_mut(&b)[..4].copy_from_slice(&42u32.to_ne_bytes());
//!
//! arena.deallocate(a).unwrap();
//! arena.deallocate(b).unwrap();
//! assert_eq!(arena.free_range_count(), 1);
//! ```
//!
//! ## Raw pointers
//!
//! ```rust
//! use arena::Arena;
//!
//! let mut arena = Arena::new(1024).unwrap();
//! if let Some(ptr) = arena.allocate_raw(64) {
//!     // Use the allocated memory...
//!
//!     // Free the memory with the same size
//!     unsafe {
//!         arena.deallocate_raw(ptr.as_ptr(), 64);
//!     }
//! }
//! ```
//!
//! # Design Considerations
//!
//! ## Memory Safety
//!
//! The handle API is safe. The raw pointer API trusts the caller, who must
//! ensure:
//!
//! - Deallocation uses the exact pointer and size of the allocation
//! - No use-after-free or double-free bugs
//!
//! ## Alignment
//!
//! The arena does not align allocations. The buffer starts on a
//! [`BASE_ALIGN`] boundary and [`LockedArena`] rounds request sizes so that
//! the alignment of its allocations is preserved.
//!
//! ## Thread Safety
//!
//! [`Arena`] is `Send` but not `Sync`. [`LockedArena`] wraps it in a spin
//! lock and implements [`GlobalAlloc`](core::alloc::GlobalAlloc).
//!
//! ## Performance Characteristics
//!
//! | Operation | Cost |
//! |-----------|------|
//! | `allocate` | O(log n) |
//! | `deallocate` | O(log n) |
//! | `largest_free` | O(1) |
//!
//! where n is the number of free ranges, at most `SLOTS`.

#![no_std]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod arena;
mod buffer;
mod error;
mod free_set;
mod locked;
mod offset_index;

pub use range_heap::FreeRange;

pub use self::{
    arena::{Allocation, Arena, ArenaStats, FreeRangesDump},
    error::{ArenaError, ConsistencyError, DeallocError},
    locked::LockedArena,
};

/// Alignment of an arena's buffer.
pub const BASE_ALIGN: usize = 16;

/// Number of free ranges an arena tracks unless told otherwise.
pub const DEFAULT_SLOTS: usize = 1024;
