//! The arena: one fixed-size buffer and the free ranges inside it.
//!
//! # Algorithm
//!
//! The arena uses a **largest-fit** allocation strategy combined with
//! **immediate coalescing**:
//!
//! - **Allocation**: Takes the largest free range. If it is too small the
//!   request fails, even if several smaller free ranges would add up to
//!   enough space. Otherwise the request is carved off the front of the range
//!   and the remainder stays free.
//! - **Deallocation**: Looks up the free ranges that end exactly where the
//!   released region starts and start exactly where it ends, merges them with
//!   the region, and records the result as a single free range.
//!
//! ```text
//! Arena of 1024 bytes after allocate(128), allocate(256):
//! ┌──────────┬────────────────────┬──────────────────────────────────────┐
//! │ A (128)  │ B (256)            │ free: offset=384 size=640            │
//! └──────────┴────────────────────┴──────────────────────────────────────┘
//! 0          128                  384                                 1024
//! ```
//!
//! # Handles and raw pointers
//!
//! [`Arena::allocate`] returns an [`Allocation`] handle. It cannot be copied
//! or forged, and [`Arena::deallocate`] consumes it, so a region can neither
//! be freed twice nor with the wrong size.
//!
//! [`Arena::allocate_raw`] and [`Arena::deallocate_raw`] work with plain
//! pointers instead. The arena does not remember allocations: the caller must
//! hand back the exact pointer and size it received, and the arena trusts it.
//! [`Arena::deallocate_checked`] additionally rejects regions that are out of
//! bounds or already free.

use core::{
    fmt,
    ops::Range,
    ptr::NonNull,
    sync::atomic::{AtomicUsize, Ordering},
};

use arrayvec::CapacityError;
use range_heap::FreeRange;
use snafu::{OptionExt as _, ensure};

use crate::{
    DEFAULT_SLOTS,
    buffer::Buffer,
    error::{
        ArenaError, BookkeepingFullSnafu, ConsistencyError, DeallocError,
        ForeignAllocationSnafu, OutOfBoundsSnafu,
    },
    free_set::FreeSet,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ArenaId(usize);

impl ArenaId {
    fn next() -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A region handed out by [`Arena::allocate`].
///
/// The handle is the only proof that the region is allocated. Give it back
/// with [`Arena::deallocate`]; dropping it leaks the region until the arena
/// itself is dropped.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "dropping an `Allocation` leaks its region"]
pub struct Allocation {
    arena: ArenaId,
    offset: usize,
    size: usize,
}

impl Allocation {
    /// Returns the offset of the region from the start of the arena.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub const fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.size
    }
}

/// A snapshot of an arena's free space.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ArenaStats {
    pub capacity: usize,
    pub free_bytes: usize,
    pub free_ranges: usize,
    pub largest_free: usize,
}

impl ArenaStats {
    #[must_use]
    pub const fn used_bytes(&self) -> usize {
        self.capacity - self.free_bytes
    }
}

/// A fixed-capacity byte arena.
///
/// The arena owns a zeroed buffer of `capacity` bytes, aligned to
/// [`BASE_ALIGN`](crate::BASE_ALIGN), and tracks up to `SLOTS` disjoint free
/// ranges inside it. Released regions are merged with adjacent free ranges,
/// so no two free ranges are ever adjacent.
///
/// # Thread Safety
///
/// The arena is `Send` but not `Sync`. Concurrent use requires external
/// synchronization that covers both `allocate` and `deallocate`; see
/// [`LockedArena`](crate::LockedArena).
///
/// # Examples
///
/// ```
/// use arena::Arena;
///
/// let mut arena = Arena::new(1024).unwrap();
/// let block = arena.allocate(128).unwrap();
/// arena.bytes_mut(&block).fill(0xAB);
/// assert_eq!(arena.free_bytes(), 896);
///
/// arena.deallocate(block).unwrap();
/// assert_eq!(arena.free_bytes(), 1024);
/// ```
#[derive(Debug)]
pub struct Arena<const SLOTS: usize = DEFAULT_SLOTS> {
    id: ArenaId,
    buffer: Buffer,
    free: FreeSet<SLOTS>,
}

impl Arena {
    /// Creates an arena of `capacity` bytes that tracks up to
    /// [`DEFAULT_SLOTS`] free ranges.
    pub fn new(capacity: usize) -> Result<Self, ArenaError> {
        Self::with_slots(capacity)
    }
}

impl<const SLOTS: usize> Arena<SLOTS> {
    /// Creates an arena of `capacity` bytes that tracks up to `SLOTS` free
    /// ranges.
    ///
    /// # Examples
    ///
    /// ```
    /// use arena::Arena;
    ///
    /// let arena = Arena::<16>::with_slots(256).unwrap();
    /// assert_eq!(arena.capacity(), 256);
    /// assert!(Arena::<16>::with_slots(0).is_err());
    /// ```
    pub fn with_slots(capacity: usize) -> Result<Self, ArenaError> {
        let buffer = Buffer::new(capacity)?;
        Ok(Self {
            id: ArenaId::next(),
            free: FreeSet::new(capacity),
            buffer,
        })
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Allocates `size` bytes from the largest free range.
    ///
    /// Returns `None` if `size` is zero or larger than the largest free
    /// range. Free ranges are never combined to satisfy a request.
    pub fn allocate(&mut self, size: usize) -> Option<Allocation> {
        let offset = self.reserve(size)?;
        Some(Allocation {
            arena: self.id,
            offset,
            size,
        })
    }

    /// Gives a region back to the arena and merges it with its free
    /// neighbors.
    ///
    /// Fails if the handle belongs to another arena, or if the region cannot
    /// be merged and every free-range slot is taken. In the first case the
    /// error hands the handle back through
    /// [`DeallocError::into_allocation`]. In the latter case the region stays
    /// allocated and is leaked.
    pub fn deallocate(&mut self, allocation: Allocation) -> Result<(), DeallocError> {
        ensure!(
            allocation.arena == self.id,
            ForeignAllocationSnafu { allocation }
        );
        let Allocation { offset, size, .. } = allocation;
        self.release(FreeRange::new(offset, size))
            .ok()
            .context(BookkeepingFullSnafu {
                offset,
                size,
                slots: SLOTS,
            })?;
        Ok(())
    }

    /// Returns the bytes of an allocated region.
    ///
    /// # Panics
    ///
    /// Panics if `allocation` belongs to another arena.
    #[must_use]
    pub fn bytes(&self, allocation: &Allocation) -> &[u8] {
        self.assert_owned(allocation);
        unsafe { self.buffer.slice(allocation.offset, allocation.size) }
    }

    /// Returns the bytes of an allocated region for writing.
    ///
    /// # Panics
    ///
    /// Panics if `allocation` belongs to another arena.
    pub fn bytes_mut(&mut self, allocation: &Allocation) -> &mut [u8] {
        self.assert_owned(allocation);
        unsafe { self.buffer.slice_mut(allocation.offset, allocation.size) }
    }

    /// Allocates `size` bytes and returns a pointer to the first one.
    ///
    /// Follows the same policy as [`allocate`](Self::allocate). The pointer
    /// stays valid until it is passed to
    /// [`deallocate_raw`](Self::deallocate_raw) or the arena is dropped.
    pub fn allocate_raw(&mut self, size: usize) -> Option<NonNull<u8>> {
        let offset = self.reserve(size)?;
        Some(self.buffer.ptr_at(offset))
    }

    /// Gives a region obtained from [`allocate_raw`](Self::allocate_raw)
    /// back to the arena.
    ///
    /// Does nothing if `ptr` is null or `size` is zero. If the region cannot
    /// be recorded because every free-range slot is taken, it is leaked.
    ///
    /// In debug builds the region is validated as in
    /// [`deallocate_checked`](Self::deallocate_checked) and a violation
    /// panics.
    ///
    /// # Safety
    ///
    /// The caller must ensure that:
    ///
    /// - `ptr` was returned by `allocate_raw` on this arena with exactly
    ///   `size` bytes
    /// - `ptr` has not been deallocated before
    /// - The region is no longer in use
    pub unsafe fn deallocate_raw(&mut self, ptr: *mut u8, size: usize) {
        if ptr.is_null() || size == 0 {
            return;
        }
        let offset = self.buffer.offset_of(ptr);
        if cfg!(debug_assertions) {
            if let Err(err) = self.validate(offset, size) {
                panic!("invalid arena deallocation: {err}");
            }
        }
        let _ = self.release(FreeRange::new(offset, size));
    }

    /// Gives a region back to the arena after checking that it lies inside
    /// the arena and does not overlap any free range.
    ///
    /// Does nothing if `ptr` is null or `size` is zero.
    ///
    /// # Safety
    ///
    /// The checks catch double frees and foreign pointers, but not a region
    /// that is still allocated to someone else. The caller must ensure that
    /// the region was allocated from this arena with exactly `size` bytes
    /// and is no longer in use.
    pub unsafe fn deallocate_checked(
        &mut self,
        ptr: *mut u8,
        size: usize,
    ) -> Result<(), DeallocError> {
        if ptr.is_null() || size == 0 {
            return Ok(());
        }
        let offset = self.buffer.offset_of(ptr);
        self.validate(offset, size)?;
        self.release(FreeRange::new(offset, size))
            .ok()
            .context(BookkeepingFullSnafu {
                offset,
                size,
                slots: SLOTS,
            })?;
        Ok(())
    }

    /// Returns the number of free bytes, summed over all free ranges.
    #[must_use]
    pub fn free_bytes(&self) -> usize {
        self.free.total_size()
    }

    /// Returns the size of the largest free range, which is also the largest
    /// request that can currently succeed.
    #[must_use]
    pub fn largest_free(&self) -> usize {
        self.free.largest().map_or(0, |range| range.size())
    }

    #[must_use]
    pub fn free_range_count(&self) -> usize {
        self.free.len()
    }

    /// Returns the free ranges in heap order, largest first.
    pub fn free_ranges(&self) -> impl Iterator<Item = FreeRange> + '_ {
        self.free.by_size().iter().copied()
    }

    /// Returns the free ranges in ascending offset order.
    pub fn free_ranges_by_offset(&self) -> impl DoubleEndedIterator<Item = FreeRange> + '_ {
        self.free.by_offset()
    }

    #[must_use]
    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            capacity: self.capacity(),
            free_bytes: self.free_bytes(),
            free_ranges: self.free_range_count(),
            largest_free: self.largest_free(),
        }
    }

    /// Returns a printable listing of the free ranges in heap order, ending
    /// with a blank line.
    ///
    /// # Examples
    ///
    /// ```
    /// use arena::Arena;
    ///
    /// let arena = Arena::new(1024).unwrap();
    /// assert_eq!(
    ///     arena.dump().to_string(),
    ///     "Free blocks (heap size = 1):\n  [1] offset=0 size=1024\n\n",
    /// );
    /// ```
    #[must_use]
    pub fn dump(&self) -> FreeRangesDump<'_> {
        FreeRangesDump {
            ranges: self.free.by_size(),
        }
    }

    /// Verifies the free-space bookkeeping.
    ///
    /// Checks heap order, that the heap and the offset index hold the same
    /// ranges, and that free ranges are in bounds, disjoint and never
    /// adjacent.
    pub fn check_consistency(&self) -> Result<(), ConsistencyError> {
        self.free.check_consistency(self.capacity())
    }

    fn reserve(&mut self, size: usize) -> Option<usize> {
        if size == 0 {
            return None;
        }
        let Some(block) = self.free.largest() else {
            log::debug!("arena is full, refusing request of {size} bytes");
            return None;
        };
        if block.size() < size {
            log::debug!("largest free range ({block}) is too small for {size} bytes");
            return None;
        }
        self.free.take_front(block, size);
        log::trace!("allocated {size} bytes at offset {}", block.offset());
        Some(block.offset())
    }

    fn release(&mut self, range: FreeRange) -> Result<(), CapacityError<FreeRange>> {
        match self.free.release(range) {
            Ok(merged) => {
                log::trace!("released ({range}), free range is now ({merged})");
                Ok(())
            }
            Err(err) => {
                log::error!("free-range heap is full ({SLOTS} slots), leaking ({range})");
                Err(err)
            }
        }
    }

    fn validate(&self, offset: usize, size: usize) -> Result<(), DeallocError> {
        let capacity = self.capacity();
        ensure!(
            offset.checked_add(size).is_some_and(|end| end <= capacity),
            OutOfBoundsSnafu {
                offset,
                size,
                capacity,
            }
        );
        self.free.check_allocated(FreeRange::new(offset, size))
    }

    fn assert_owned(&self, allocation: &Allocation) {
        assert!(
            allocation.arena == self.id,
            "allocation {}+{} belongs to a different arena",
            allocation.offset,
            allocation.size
        );
    }
}

/// Listing of an arena's free ranges, returned by [`Arena::dump`].
pub struct FreeRangesDump<'a> {
    ranges: &'a [FreeRange],
}

impl fmt::Display for FreeRangesDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Free blocks (heap size = {}):", self.ranges.len())?;
        for (i, range) in self.ranges.iter().enumerate() {
            writeln!(
                f,
                "  [{}] offset={} size={}",
                i + 1,
                range.offset(),
                range.size()
            )?;
        }
        writeln!(f)
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use alloc::{string::ToString as _, vec::Vec};
    use core::iter;

    use super::*;

    fn free_list<const SLOTS: usize>(arena: &Arena<SLOTS>) -> Vec<(usize, usize)> {
        arena
            .free_ranges_by_offset()
            .map(|range| (range.offset(), range.size()))
            .collect()
    }

    #[test]
    fn test_new_has_one_free_range() {
        let arena = Arena::new(1024).unwrap();
        assert_eq!(arena.capacity(), 1024);
        assert_eq!(free_list(&arena), [(0, 1024)]);
        assert_eq!(
            arena.stats(),
            ArenaStats {
                capacity: 1024,
                free_bytes: 1024,
                free_ranges: 1,
                largest_free: 1024,
            }
        );
    }

    #[test]
    fn test_new_zero_capacity() {
        let err = Arena::new(0).unwrap_err();
        assert!(err.is_zero_capacity());
    }

    #[test]
    fn test_allocate_zero() {
        let mut arena = Arena::new(64).unwrap();
        assert!(arena.allocate(0).is_none());
        assert!(arena.allocate_raw(0).is_none());
        assert_eq!(free_list(&arena), [(0, 64)]);
    }

    #[test]
    fn test_allocate_splits_front() {
        let mut arena = Arena::new(1024).unwrap();
        let a = arena.allocate(128).unwrap();
        let b = arena.allocate(256).unwrap();
        assert_eq!(a.range(), 0..128);
        assert_eq!(b.range(), 128..384);
        assert_eq!(free_list(&arena), [(384, 640)]);
        assert_eq!(arena.stats().used_bytes(), 384);
        arena.deallocate(a).unwrap();
        arena.deallocate(b).unwrap();
    }

    #[test]
    fn test_allocate_takes_largest_range() {
        let mut arena = Arena::new(300).unwrap();
        let a = arena.allocate(50).unwrap();
        let b = arena.allocate(10).unwrap();
        let c = arena.allocate(240).unwrap();
        arena.deallocate(a).unwrap();
        arena.deallocate(c).unwrap();
        assert_eq!(free_list(&arena), [(0, 50), (60, 240)]);

        // the small request still goes to the largest range
        let d = arena.allocate(5).unwrap();
        assert_eq!(d.offset(), 60);
        assert_eq!(free_list(&arena), [(0, 50), (65, 235)]);
        arena.deallocate(d).unwrap();
        arena.deallocate(b).unwrap();
        assert_eq!(free_list(&arena), [(0, 300)]);
    }

    #[test]
    fn test_allocate_entire_arena() {
        let mut arena = Arena::new(1024).unwrap();
        let all = arena.allocate(1024).unwrap();
        assert!(arena.allocate(1024).is_none());
        assert!(arena.allocate(1).is_none());
        assert_eq!(arena.free_range_count(), 0);
        assert_eq!(arena.largest_free(), 0);

        arena.deallocate(all).unwrap();
        let all = arena.allocate(1024).unwrap();
        assert_eq!(all.offset(), 0);
        arena.deallocate(all).unwrap();
    }

    #[test]
    fn test_merge_left_right_and_both() {
        let mut arena = Arena::new(400).unwrap();
        let a = arena.allocate(100).unwrap();
        let b = arena.allocate(100).unwrap();
        let c = arena.allocate(100).unwrap();
        let d = arena.allocate(100).unwrap();

        arena.deallocate(a).unwrap();
        arena.deallocate(b).unwrap(); // merges left
        assert_eq!(free_list(&arena), [(0, 200)]);

        arena.deallocate(d).unwrap();
        assert_eq!(free_list(&arena), [(0, 200), (300, 100)]);

        arena.deallocate(c).unwrap(); // merges both sides
        assert_eq!(free_list(&arena), [(0, 400)]);
        arena.check_consistency().unwrap();
    }

    #[test]
    fn test_merge_right() {
        let mut arena = Arena::new(200).unwrap();
        let a = arena.allocate(100).unwrap();
        let b = arena.allocate(100).unwrap();
        arena.deallocate(b).unwrap();
        arena.deallocate(a).unwrap();
        assert_eq!(free_list(&arena), [(0, 200)]);
    }

    #[test]
    fn test_bytes_are_isolated() {
        let mut arena = Arena::new(64).unwrap();
        let a = arena.allocate(16).unwrap();
        let b = arena.allocate(16).unwrap();
        arena.bytes_mut(&a).fill(0x33);
        arena.bytes_mut(&b).fill(0x55);
        assert!(arena.bytes(&a).iter().all(|&byte| byte == 0x33));
        assert!(arena.bytes(&b).iter().all(|&byte| byte == 0x55));
        assert_eq!(arena.bytes(&a).len(), 16);
        arena.deallocate(a).unwrap();
        arena.deallocate(b).unwrap();
    }

    #[test]
    fn test_foreign_allocation() {
        let mut first = Arena::new(64).unwrap();
        let mut second = Arena::new(64).unwrap();
        let block = first.allocate(16).unwrap();
        let err = second.deallocate(block).unwrap_err();
        assert!(err.is_foreign_allocation());
        assert_eq!(free_list(&second), [(0, 64)]);

        // the handle comes back and can still be freed where it belongs
        let block = err.into_allocation().unwrap();
        assert_eq!(block.range(), 0..16);
        first.deallocate(block).unwrap();
        assert_eq!(free_list(&first), [(0, 64)]);
    }

    #[test]
    #[should_panic(expected = "belongs to a different arena")]
    fn test_bytes_of_foreign_allocation() {
        let mut first = Arena::new(64).unwrap();
        let second = Arena::new(64).unwrap();
        let block = first.allocate(16).unwrap();
        let _ = second.bytes(&block);
    }

    #[test]
    fn test_raw_round_trip() {
        let mut arena = Arena::new(256).unwrap();
        let p1 = arena.allocate_raw(64).unwrap();
        let p2 = arena.allocate_raw(64).unwrap();
        assert_eq!(p2.as_ptr().addr() - p1.as_ptr().addr(), 64);
        unsafe {
            p1.as_ptr().write_bytes(0x11, 64);
            arena.deallocate_raw(p1.as_ptr(), 64);
            arena.deallocate_raw(p2.as_ptr(), 64);
        }
        assert_eq!(free_list(&arena), [(0, 256)]);
    }

    #[test]
    fn test_raw_null_and_zero_are_ignored() {
        let mut arena = Arena::new(128).unwrap();
        let p = arena.allocate_raw(32).unwrap();
        unsafe {
            arena.deallocate_raw(core::ptr::null_mut(), 32);
            arena.deallocate_raw(p.as_ptr(), 0);
            arena.deallocate_checked(core::ptr::null_mut(), 32).unwrap();
        }
        assert_eq!(free_list(&arena), [(32, 96)]);
    }

    #[test]
    fn test_checked_rejects_out_of_bounds() {
        let mut arena = Arena::new(128).unwrap();
        let p = arena.allocate_raw(128).unwrap();
        unsafe {
            let err = arena.deallocate_checked(p.as_ptr().add(100), 29).unwrap_err();
            assert!(err.is_out_of_bounds());
            let err = arena
                .deallocate_checked(p.as_ptr().wrapping_sub(1), 1)
                .unwrap_err();
            assert!(err.is_out_of_bounds());
        }
        assert_eq!(arena.free_range_count(), 0);
    }

    #[test]
    fn test_checked_rejects_double_free() {
        let mut arena = Arena::new(128).unwrap();
        let p = arena.allocate_raw(64).unwrap();
        unsafe {
            arena.deallocate_checked(p.as_ptr(), 64).unwrap();
            let err = arena.deallocate_checked(p.as_ptr(), 64).unwrap_err();
            assert!(err.is_double_free());
        }
        assert_eq!(free_list(&arena), [(0, 128)]);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "invalid arena deallocation")]
    fn test_raw_double_free_panics_in_debug() {
        let mut arena = Arena::new(128).unwrap();
        let p = arena.allocate_raw(64).unwrap();
        unsafe {
            arena.deallocate_raw(p.as_ptr(), 64);
            arena.deallocate_raw(p.as_ptr(), 64);
        }
    }

    #[test]
    fn test_bookkeeping_full() {
        let mut arena = Arena::<2>::with_slots(100).unwrap();
        let a = arena.allocate(10).unwrap();
        let b = arena.allocate(10).unwrap();
        let c = arena.allocate(10).unwrap();
        let d = arena.allocate(10).unwrap();

        arena.deallocate(a).unwrap();
        assert_eq!(free_list(&arena), [(0, 10), (40, 60)]);

        let err = arena.deallocate(c).unwrap_err();
        assert!(err.is_bookkeeping_full());
        assert_eq!(free_list(&arena), [(0, 10), (40, 60)]);

        // b merges with a, so no new slot is needed
        arena.deallocate(b).unwrap();
        arena.deallocate(d).unwrap();
        assert_eq!(free_list(&arena), [(0, 20), (30, 70)]);
        assert_eq!(arena.free_bytes(), 90);
        arena.check_consistency().unwrap();
    }

    #[test]
    fn test_raw_bookkeeping_full_leaks() {
        let mut arena = Arena::<2>::with_slots(100).unwrap();
        let p: Vec<_> = iter::repeat_with(|| arena.allocate_raw(10).unwrap())
            .take(4)
            .collect();
        unsafe { arena.deallocate_raw(p[0].as_ptr(), 10) };
        assert_eq!(free_list(&arena), [(0, 10), (40, 60)]);

        // no neighbor to merge with and no slot left: the region is leaked
        unsafe { arena.deallocate_raw(p[2].as_ptr(), 10) };
        assert_eq!(free_list(&arena), [(0, 10), (40, 60)]);
        assert_eq!(arena.free_bytes(), 70);
        arena.check_consistency().unwrap();

        unsafe {
            arena.deallocate_raw(p[1].as_ptr(), 10);
            arena.deallocate_raw(p[3].as_ptr(), 10);
        }
        assert_eq!(free_list(&arena), [(0, 20), (30, 70)]);
        arena.check_consistency().unwrap();
    }

    #[test]
    fn test_checked_bookkeeping_full() {
        let mut arena = Arena::<2>::with_slots(100).unwrap();
        let p: Vec<_> = iter::repeat_with(|| arena.allocate_raw(10).unwrap())
            .take(4)
            .collect();
        unsafe {
            arena.deallocate_checked(p[0].as_ptr(), 10).unwrap();
            let err = arena.deallocate_checked(p[2].as_ptr(), 10).unwrap_err();
            assert!(err.is_bookkeeping_full());
            assert!(err.into_allocation().is_none());
        }
        assert_eq!(free_list(&arena), [(0, 10), (40, 60)]);
        arena.check_consistency().unwrap();

        // the refused region is still allocated, so it is not a double free
        unsafe {
            arena.deallocate_checked(p[1].as_ptr(), 10).unwrap();
            arena.deallocate_checked(p[2].as_ptr(), 10).unwrap();
        }
        assert_eq!(free_list(&arena), [(0, 30), (40, 60)]);
        arena.check_consistency().unwrap();
    }

    #[test]
    fn test_dump_lists_heap_order() {
        let mut arena = Arena::new(300).unwrap();
        let a = arena.allocate(100).unwrap();
        let b = arena.allocate(100).unwrap();
        arena.deallocate(a).unwrap();
        let dump = arena.dump().to_string();
        assert_eq!(
            dump,
            "Free blocks (heap size = 2):\n  [1] offset=200 size=100\n  [2] offset=0 size=100\n\n"
        );
        arena.deallocate(b).unwrap();
        assert_eq!(
            arena.dump().to_string(),
            "Free blocks (heap size = 1):\n  [1] offset=0 size=300\n\n"
        );
    }

    #[test]
    fn test_introspection_is_read_only() {
        let mut arena = Arena::new(512).unwrap();
        let a = arena.allocate(100).unwrap();
        let _ = arena.dump().to_string();
        let _ = arena.free_ranges().count();
        let _ = arena.stats();
        arena.check_consistency().unwrap();
        let b = arena.allocate(100).unwrap();
        assert_eq!(b.offset(), 100);
        arena.deallocate(a).unwrap();
        arena.deallocate(b).unwrap();
    }
}
