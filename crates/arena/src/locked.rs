//! [`GlobalAlloc`] adapter for an arena behind a spin lock.
//!
//! The arena itself ignores alignment. The adapter makes up for it by rounding
//! every request up to a multiple of [`BASE_ALIGN`]: the buffer starts on a
//! `BASE_ALIGN` boundary, so as long as all sizes are multiples of it every
//! offset handed out is too. Layouts that need a larger alignment are refused.

use core::{
    alloc::{GlobalAlloc, Layout},
    ptr::{self, NonNull},
};

use spin::Mutex;

use crate::{Arena, BASE_ALIGN, DEFAULT_SLOTS, error::ArenaError};

/// An [`Arena`] behind a spin lock, usable through [`GlobalAlloc`].
///
/// The inner arena is only reachable read-only through [`with`](Self::with),
/// so every region in it comes from the adapter and has a size that is a
/// multiple of [`BASE_ALIGN`].
///
/// # Examples
///
/// ```
/// use core::alloc::{GlobalAlloc, Layout};
///
/// use arena::LockedArena;
///
/// let heap = LockedArena::new(4096).unwrap();
/// let layout = Layout::new::<u64>();
/// unsafe {
///     let ptr = heap.alloc(layout);
///     assert!(!ptr.is_null());
///     assert_eq!(ptr.addr() % layout.align(), 0);
///     heap.dealloc(ptr, layout);
/// }
/// assert_eq!(heap.with(|arena| arena.free_bytes()), 4096);
/// ```
///
/// Allocating from the inner arena directly is not possible:
///
/// ```compile_fail
/// use arena::LockedArena;
///
/// let heap = LockedArena::new(4096).unwrap();
/// let block = heap.with(|arena| arena.allocate(3));
/// ```
#[derive(Debug)]
pub struct LockedArena<const SLOTS: usize = DEFAULT_SLOTS> {
    arena: Mutex<Arena<SLOTS>>,
}

impl LockedArena {
    pub fn new(capacity: usize) -> Result<Self, ArenaError> {
        Self::with_slots(capacity)
    }
}

impl<const SLOTS: usize> LockedArena<SLOTS> {
    pub fn with_slots(capacity: usize) -> Result<Self, ArenaError> {
        Ok(Self {
            arena: Mutex::new(Arena::with_slots(capacity)?),
        })
    }

    /// Locks the arena and runs `f` on it for inspection.
    pub fn with<R>(&self, f: impl FnOnce(&Arena<SLOTS>) -> R) -> R {
        f(&self.arena.lock())
    }

    #[must_use]
    pub fn into_inner(self) -> Arena<SLOTS> {
        self.arena.into_inner()
    }

    /// Returns `true` if both adapters are the same object.
    ///
    /// Memory allocated by one adapter can only be freed by the same one.
    #[must_use]
    pub fn is_same(&self, other: &Self) -> bool {
        ptr::eq(self, other)
    }

    fn request_size(layout: Layout) -> Option<usize> {
        if layout.align() > BASE_ALIGN {
            return None;
        }
        layout.size().checked_next_multiple_of(BASE_ALIGN)
    }
}

unsafe impl<const SLOTS: usize> GlobalAlloc for LockedArena<SLOTS> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let Some(size) = Self::request_size(layout) else {
            log::debug!("refusing {layout:?}: alignment above {BASE_ALIGN} is not supported");
            return ptr::null_mut();
        };
        self.arena
            .lock()
            .allocate_raw(size)
            .map_or(ptr::null_mut(), NonNull::as_ptr)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        let Some(size) = Self::request_size(layout) else {
            return;
        };
        unsafe { self.arena.lock().deallocate_raw(ptr, size) }
    }
}
