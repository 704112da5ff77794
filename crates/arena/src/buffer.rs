use alloc::alloc as heap;
use core::{alloc::Layout, fmt, ptr::NonNull, slice};

use snafu::{OptionExt as _, ResultExt as _, ensure};

use crate::{
    BASE_ALIGN,
    error::{ArenaError, CapacityOverflowSnafu, OutOfMemorySnafu, ZeroCapacitySnafu},
};

/// Zero-initialized backing storage of an arena, aligned to [`BASE_ALIGN`].
pub(crate) struct Buffer {
    ptr: NonNull<u8>,
    layout: Layout,
}

unsafe impl Send for Buffer {}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("ptr", &self.ptr)
            .field("len", &self.len())
            .finish()
    }
}

impl Buffer {
    pub(crate) fn new(capacity: usize) -> Result<Self, ArenaError> {
        ensure!(capacity > 0, ZeroCapacitySnafu);
        let layout =
            Layout::from_size_align(capacity, BASE_ALIGN).context(CapacityOverflowSnafu { capacity })?;
        let ptr = unsafe { heap::alloc_zeroed(layout) };
        let ptr = NonNull::new(ptr).context(OutOfMemorySnafu { capacity })?;
        Ok(Self { ptr, layout })
    }

    pub(crate) fn len(&self) -> usize {
        self.layout.size()
    }

    /// Returns the offset of `ptr` from the start of the buffer.
    ///
    /// Pointers outside the buffer produce offsets that are `>= len()`.
    pub(crate) fn offset_of(&self, ptr: *const u8) -> usize {
        ptr.addr().wrapping_sub(self.ptr.as_ptr().addr())
    }

    /// Returns a pointer to the byte at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is beyond the end of the buffer.
    pub(crate) fn ptr_at(&self, offset: usize) -> NonNull<u8> {
        assert!(offset <= self.len(), "offset {offset} is outside the buffer");
        unsafe { self.ptr.add(offset) }
    }

    /// # Safety
    ///
    /// `offset..offset + len` must lie inside the buffer and must not be
    /// mutably borrowed elsewhere for the returned lifetime.
    pub(crate) unsafe fn slice(&self, offset: usize, len: usize) -> &[u8] {
        unsafe { slice::from_raw_parts(self.ptr_at(offset).as_ptr(), len) }
    }

    /// # Safety
    ///
    /// `offset..offset + len` must lie inside the buffer and must not be
    /// reachable through any other live pointer for the returned lifetime.
    pub(crate) unsafe fn slice_mut(&mut self, offset: usize, len: usize) -> &mut [u8] {
        unsafe { slice::from_raw_parts_mut(self.ptr_at(offset).as_ptr(), len) }
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe { heap::dealloc(self.ptr.as_ptr(), self.layout) }
    }
}
