//! Free-space bookkeeping shared by the size heap and the offset index.
//!
//! Both structures describe the same set of free ranges. Every mutation goes
//! through [`FreeSet`], which updates them together, so neither is ever
//! observed without the other.

use arrayvec::CapacityError;
use range_heap::{FreeRange, RangeHeap};
use snafu::ensure;

use crate::{
    error::{
        ConsistencyError, CountMismatchSnafu, DeallocError, DoubleFreeSnafu, HeapOrderSnafu,
        OverlapSnafu, RangeOutOfBoundsSnafu, UnindexedSnafu, UnmergedSnafu,
    },
    offset_index::OffsetIndex,
};

#[derive(Debug, Clone)]
pub(crate) struct FreeSet<const SLOTS: usize> {
    by_size: RangeHeap<SLOTS>,
    by_offset: OffsetIndex,
}

impl<const SLOTS: usize> FreeSet<SLOTS> {
    /// Creates a free set holding a single range `{0, capacity}`.
    pub(crate) fn new(capacity: usize) -> Self {
        const { assert!(SLOTS > 0, "free-range heap needs at least one slot") };

        let mut this = Self {
            by_size: RangeHeap::new(),
            by_offset: OffsetIndex::new(),
        };
        let whole = FreeRange::new(0, capacity);
        if this.by_size.push(whole).is_err() {
            unreachable!("empty free-range heap rejected its first range");
        }
        this.by_offset.insert(whole);
        this
    }

    pub(crate) fn largest(&self) -> Option<FreeRange> {
        self.by_size.peek()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_size.len()
    }

    pub(crate) fn total_size(&self) -> usize {
        self.by_offset.total_size()
    }

    pub(crate) fn by_size(&self) -> &[FreeRange] {
        self.by_size.as_slice()
    }

    pub(crate) fn by_offset(&self) -> impl DoubleEndedIterator<Item = FreeRange> + '_ {
        self.by_offset.iter()
    }

    /// Takes `size` bytes off the front of `block`, which must be live.
    ///
    /// The remainder, if any, takes the block's slot in the heap, so this
    /// never needs a free slot.
    pub(crate) fn take_front(&mut self, block: FreeRange, size: usize) {
        let removed = self.by_offset.remove(block);
        assert!(removed, "block ({block}) is not a live free range");

        if let Some(rest) = block.split_front(size) {
            let replaced = self.by_size.replace(block, rest);
            assert!(replaced, "block ({block}) is missing from the heap");
            self.by_offset.insert(rest);
        } else {
            let removed = self.by_size.remove(block);
            assert!(removed, "block ({block}) is missing from the heap");
        }
    }

    /// Returns `range` to the free set, merging it with the free ranges
    /// directly before and after it.
    ///
    /// Returns the merged range. If no merge is possible and the heap has no
    /// free slot, nothing is changed and `range` is handed back in the error.
    pub(crate) fn release(
        &mut self,
        range: FreeRange,
    ) -> Result<FreeRange, CapacityError<FreeRange>> {
        if self.by_size.is_full() && !self.has_adjacent(range) {
            return Err(CapacityError::new(range));
        }

        let mut merged = range;

        let left = self
            .by_offset
            .predecessor(merged.offset())
            .filter(|left| left.is_followed_by(&merged));
        if let Some(left) = left {
            self.remove(left);
            merged = left.merge(merged);
        }

        // the left neighbor is gone, so this is the first range after `range`
        let right = self
            .by_offset
            .successor(merged.offset())
            .filter(|right| merged.is_followed_by(right));
        if let Some(right) = right {
            self.remove(right);
            merged = merged.merge(right);
        }

        if self.by_size.push(merged).is_err() {
            unreachable!("free-range heap filled up while releasing {range}");
        }
        self.by_offset.insert(merged);
        Ok(merged)
    }

    /// Returns an error if `range` shares a byte with any free range.
    pub(crate) fn check_allocated(&self, range: FreeRange) -> Result<(), DeallocError> {
        // free ranges are disjoint, so only the last one starting before
        // `range.end()` can reach into `range`
        if let Some(free) = self.by_offset.predecessor(range.end()) {
            ensure!(
                !free.overlaps(&range),
                DoubleFreeSnafu {
                    offset: range.offset(),
                    size: range.size(),
                    free,
                }
            );
        }
        Ok(())
    }

    pub(crate) fn check_consistency(&self, capacity: usize) -> Result<(), ConsistencyError> {
        ensure!(self.by_size.is_heap(), HeapOrderSnafu);
        ensure!(
            self.by_size.len() == self.by_offset.len(),
            CountMismatchSnafu {
                heap: self.by_size.len(),
                index: self.by_offset.len(),
            }
        );
        for &range in &self.by_size {
            ensure!(
                self.by_offset.get(range.offset()) == Some(range),
                UnindexedSnafu { range }
            );
        }

        let mut prev: Option<FreeRange> = None;
        for range in self.by_offset.iter() {
            ensure!(
                range.end() <= capacity,
                RangeOutOfBoundsSnafu { range, capacity }
            );
            if let Some(left) = prev {
                ensure!(
                    !left.overlaps(&range),
                    OverlapSnafu { left, right: range }
                );
                ensure!(
                    !left.is_followed_by(&range),
                    UnmergedSnafu { left, right: range }
                );
            }
            prev = Some(range);
        }
        Ok(())
    }

    fn has_adjacent(&self, range: FreeRange) -> bool {
        let left = self
            .by_offset
            .predecessor(range.offset())
            .is_some_and(|left| left.is_followed_by(&range));
        let right = self
            .by_offset
            .successor(range.end())
            .is_some_and(|right| range.is_followed_by(&right));
        left || right
    }

    fn remove(&mut self, range: FreeRange) {
        let in_heap = self.by_size.remove(range);
        let in_index = self.by_offset.remove(range);
        assert!(
            in_heap && in_index,
            "free range ({range}) is not tracked by both structures"
        );
    }
}
