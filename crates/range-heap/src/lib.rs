//! A bounded max-heap of free byte ranges, ordered by range size.
//!
//! `RangeHeap` stores [`FreeRange`] values and answers "which free range is
//! the largest?" in constant time. It is the size-priority half of an arena
//! allocator's free-space bookkeeping: the allocator peeks the largest range,
//! carves a block off its front and puts the remainder back.
//!
//! # Features
//!
//! - **Fixed capacity**: Uses `ArrayVec` for slot storage; pushing into a full
//!   heap is rejected and leaves the heap unchanged
//! - **Removal by identity**: Any range can be removed by its `(offset, size)`
//!   pair, not just the maximum
//! - **No-std support**: Can be used in `no_std` environments with `alloc`
//!
//! # Examples
//!
//! ```
//! use range_heap::{FreeRange, RangeHeap};
//!
//! let mut heap = RangeHeap::<8>::new();
//! heap.push(FreeRange::new(0, 16)).unwrap();
//! heap.push(FreeRange::new(32, 64)).unwrap();
//! heap.push(FreeRange::new(128, 8)).unwrap();
//!
//! assert_eq!(heap.peek(), Some(FreeRange::new(32, 64)));
//!
//! // Remove a range that is not the maximum
//! assert!(heap.remove(FreeRange::new(0, 16)));
//! assert_eq!(heap.len(), 2);
//! ```
//!
//! # Performance
//!
//! - Peek: O(1)
//! - Push / Pop: O(log n)
//! - Remove / Replace by identity: O(log n), the slot of every range is
//!   tracked by offset
//! - Memory: `CAP` slots stored inline, plus one map entry per live range

#![cfg_attr(not(test), no_std)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

use alloc::collections::BTreeMap;
use core::{ops::Range, slice};

use arrayvec::{ArrayVec, CapacityError};

/// A non-empty, half-open byte interval `[offset, offset + size)`.
///
/// Ranges have no identity beyond their `(offset, size)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[display("offset={offset} size={size}")]
pub struct FreeRange {
    offset: usize,
    size: usize,
}

impl FreeRange {
    /// Creates a range covering `offset..offset + size`.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero or if `offset + size` overflows.
    ///
    /// # Examples
    ///
    /// ```
    /// use range_heap::FreeRange;
    ///
    /// let range = FreeRange::new(16, 48);
    /// assert_eq!(range.end(), 64);
    /// ```
    #[must_use]
    pub const fn new(offset: usize, size: usize) -> Self {
        assert!(size > 0, "free range must not be empty");
        assert!(offset.checked_add(size).is_some(), "free range overflows");
        Self { offset, size }
    }

    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Returns the offset one past the last byte of the range.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.offset + self.size
    }

    #[must_use]
    pub const fn as_range(&self) -> Range<usize> {
        self.offset..self.end()
    }

    /// Returns `true` if `next` starts exactly where this range ends.
    ///
    /// A gap of a single byte is enough to make two ranges non-adjacent.
    ///
    /// # Examples
    ///
    /// ```
    /// use range_heap::FreeRange;
    ///
    /// let left = FreeRange::new(0, 8);
    /// assert!(left.is_followed_by(&FreeRange::new(8, 4)));
    /// assert!(!left.is_followed_by(&FreeRange::new(9, 4)));
    /// ```
    #[must_use]
    pub const fn is_followed_by(&self, next: &Self) -> bool {
        self.end() == next.offset
    }

    /// Returns `true` if the two ranges share at least one byte.
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.offset < other.end() && other.offset < self.end()
    }

    /// Merges this range with the range that immediately follows it.
    ///
    /// # Panics
    ///
    /// Panics if `next` does not start exactly where this range ends.
    #[must_use]
    pub fn merge(self, next: Self) -> Self {
        assert!(
            self.is_followed_by(&next),
            "cannot merge non-adjacent ranges: {self} and {next}"
        );
        Self::new(self.offset, self.size + next.size)
    }

    /// Takes `size` bytes off the front of the range and returns what is
    /// left, or `None` if the whole range was taken.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero or larger than the range.
    ///
    /// # Examples
    ///
    /// ```
    /// use range_heap::FreeRange;
    ///
    /// let range = FreeRange::new(0, 100);
    /// assert_eq!(range.split_front(60), Some(FreeRange::new(60, 40)));
    /// assert_eq!(range.split_front(100), None);
    /// ```
    #[must_use]
    pub fn split_front(self, size: usize) -> Option<Self> {
        assert!(
            size > 0 && size <= self.size,
            "cannot take {size} bytes from {self}"
        );
        (size < self.size).then(|| Self::new(self.offset + size, self.size - size))
    }
}

impl From<FreeRange> for Range<usize> {
    fn from(range: FreeRange) -> Self {
        range.as_range()
    }
}

/// A max-heap of [`FreeRange`] values ordered by size, with at most `CAP`
/// live ranges.
///
/// The heap is stored densely: the children of slot `i` live at `2i + 1` and
/// `2i + 2`, so slot `0` always holds a largest range. Every range's slot is
/// tracked by its offset, which is why two live ranges may never share an
/// offset.
///
/// When several ranges share the maximum size, the one that ends up on top
/// depends only on the sequence of operations performed.
///
/// # Examples
///
/// ```
/// use range_heap::{FreeRange, RangeHeap};
///
/// let mut heap = RangeHeap::<4>::new();
/// heap.push(FreeRange::new(0, 10)).unwrap();
/// heap.push(FreeRange::new(20, 30)).unwrap();
/// assert_eq!(heap.pop(), Some(FreeRange::new(20, 30)));
/// assert_eq!(heap.pop(), Some(FreeRange::new(0, 10)));
/// assert_eq!(heap.pop(), None);
/// ```
#[derive(Debug, Default, Clone)]
pub struct RangeHeap<const CAP: usize> {
    slots: ArrayVec<FreeRange, CAP>,
    positions: BTreeMap<usize, usize>,
}

impl<const CAP: usize> RangeHeap<CAP> {
    /// Creates a new empty `RangeHeap`.
    ///
    /// # Examples
    ///
    /// ```
    /// use range_heap::RangeHeap;
    ///
    /// let heap = RangeHeap::<10>::new();
    /// assert!(heap.is_empty());
    /// assert_eq!(heap.capacity(), 10);
    /// ```
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: ArrayVec::new_const(),
            positions: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        CAP
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.slots.is_full()
    }

    /// Returns a largest range without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<FreeRange> {
        self.slots.first().copied()
    }

    /// Returns `true` if exactly this `(offset, size)` pair is in the heap.
    #[must_use]
    pub fn contains(&self, range: FreeRange) -> bool {
        self.slot_of(range).is_some()
    }

    /// Inserts a range into the heap.
    ///
    /// If the heap already holds `CAP` ranges the insert is rejected and the
    /// range is handed back inside the error.
    ///
    /// # Panics
    ///
    /// Panics if a range with the same offset is already in the heap.
    ///
    /// # Examples
    ///
    /// ```
    /// use range_heap::{FreeRange, RangeHeap};
    ///
    /// let mut heap = RangeHeap::<1>::new();
    /// heap.push(FreeRange::new(0, 4)).unwrap();
    ///
    /// let err = heap.push(FreeRange::new(8, 4)).unwrap_err();
    /// assert_eq!(err.element(), FreeRange::new(8, 4));
    /// assert_eq!(heap.len(), 1);
    /// ```
    pub fn push(&mut self, range: FreeRange) -> Result<(), CapacityError<FreeRange>> {
        assert!(
            !self.positions.contains_key(&range.offset()),
            "free range offset already present: {range}"
        );
        self.slots.try_push(range)?;
        let slot = self.slots.len() - 1;
        self.positions.insert(range.offset(), slot);
        self.sift_up(slot);
        Ok(())
    }

    /// Removes and returns a largest range.
    pub fn pop(&mut self) -> Option<FreeRange> {
        let top = self.peek()?;
        self.remove_slot(0);
        Some(top)
    }

    /// Removes the range matching both `offset` and `size`.
    ///
    /// Returns `false` and leaves the heap unchanged if no such range exists,
    /// including when a range at the same offset has a different size.
    ///
    /// # Examples
    ///
    /// ```
    /// use range_heap::{FreeRange, RangeHeap};
    ///
    /// let mut heap = RangeHeap::<4>::new();
    /// heap.push(FreeRange::new(0, 10)).unwrap();
    ///
    /// assert!(!heap.remove(FreeRange::new(0, 9)));
    /// assert!(heap.remove(FreeRange::new(0, 10)));
    /// assert!(heap.is_empty());
    /// ```
    pub fn remove(&mut self, range: FreeRange) -> bool {
        let Some(slot) = self.slot_of(range) else {
            return false;
        };
        self.remove_slot(slot);
        true
    }

    /// Replaces `old` with `new` in place, restoring heap order afterwards.
    ///
    /// This never needs a free slot, so it succeeds even on a full heap.
    /// Returns `false` and leaves the heap unchanged if `old` is not present.
    ///
    /// # Panics
    ///
    /// Panics if `new` has a different offset than `old` and that offset is
    /// already taken by another range.
    ///
    /// # Examples
    ///
    /// ```
    /// use range_heap::{FreeRange, RangeHeap};
    ///
    /// let mut heap = RangeHeap::<1>::new();
    /// heap.push(FreeRange::new(0, 100)).unwrap();
    ///
    /// assert!(heap.replace(FreeRange::new(0, 100), FreeRange::new(60, 40)));
    /// assert_eq!(heap.peek(), Some(FreeRange::new(60, 40)));
    /// ```
    pub fn replace(&mut self, old: FreeRange, new: FreeRange) -> bool {
        let Some(slot) = self.slot_of(old) else {
            return false;
        };
        if new.offset() != old.offset() {
            assert!(
                !self.positions.contains_key(&new.offset()),
                "free range offset already present: {new}"
            );
            self.positions.remove(&old.offset());
            self.positions.insert(new.offset(), slot);
        }
        self.slots[slot] = new;
        self.repair(slot);
        true
    }

    /// Removes all ranges from the heap.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.positions.clear();
    }

    /// Returns an iterator over the ranges in heap order.
    ///
    /// The first item is a largest range; the rest are in no particular
    /// order.
    pub fn iter(&self) -> slice::Iter<'_, FreeRange> {
        self.slots.iter()
    }

    /// Returns the heap slots as a slice, in heap order.
    #[must_use]
    pub fn as_slice(&self) -> &[FreeRange] {
        self.slots.as_slice()
    }

    /// Returns `true` if every parent is at least as large as its children
    /// and every range's tracked slot is correct.
    #[must_use]
    pub fn is_heap(&self) -> bool {
        let ordered = (1..self.slots.len())
            .all(|slot| self.slots[(slot - 1) / 2].size() >= self.slots[slot].size());
        let tracked = self.positions.len() == self.slots.len()
            && self
                .slots
                .iter()
                .enumerate()
                .all(|(slot, range)| self.positions.get(&range.offset()) == Some(&slot));
        ordered && tracked
    }

    fn slot_of(&self, range: FreeRange) -> Option<usize> {
        let slot = *self.positions.get(&range.offset())?;
        (self.slots[slot] == range).then_some(slot)
    }

    fn remove_slot(&mut self, slot: usize) {
        let last = self.slots.len() - 1;
        self.swap_slots(slot, last);
        if let Some(removed) = self.slots.pop() {
            self.positions.remove(&removed.offset());
        }
        if slot < self.slots.len() {
            self.repair(slot);
        }
    }

    fn repair(&mut self, slot: usize) {
        let slot = self.sift_up(slot);
        self.sift_down(slot);
    }

    fn sift_up(&mut self, mut slot: usize) -> usize {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if self.slots[parent].size() >= self.slots[slot].size() {
                break;
            }
            self.swap_slots(parent, slot);
            slot = parent;
        }
        slot
    }

    fn sift_down(&mut self, mut slot: usize) {
        let len = self.slots.len();
        loop {
            let left = 2 * slot + 1;
            let right = left + 1;
            let mut largest = slot;
            if left < len && self.slots[left].size() > self.slots[largest].size() {
                largest = left;
            }
            if right < len && self.slots[right].size() > self.slots[largest].size() {
                largest = right;
            }
            if largest == slot {
                break;
            }
            self.swap_slots(slot, largest);
            slot = largest;
        }
    }

    fn swap_slots(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.slots.swap(a, b);
        self.positions.insert(self.slots[a].offset(), a);
        self.positions.insert(self.slots[b].offset(), b);
    }
}

impl<'a, const CAP: usize> IntoIterator for &'a RangeHeap<CAP> {
    type Item = &'a FreeRange;
    type IntoIter = slice::Iter<'a, FreeRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.iter()
    }
}
