//! Offset-ordered index of free ranges.
//!
//! The index maps the start offset of every free range to its size. It is
//! only consulted when a region is released, to find the free ranges that
//! immediately precede and follow it.

use alloc::collections::BTreeMap;

use range_heap::FreeRange;

#[derive(Debug, Default, Clone)]
pub(crate) struct OffsetIndex {
    ranges: BTreeMap<usize, usize>,
}

impl OffsetIndex {
    pub(crate) const fn new() -> Self {
        Self {
            ranges: BTreeMap::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.ranges.len()
    }

    pub(crate) fn insert(&mut self, range: FreeRange) {
        let prev = self.ranges.insert(range.offset(), range.size());
        assert!(
            prev.is_none(),
            "free range offset already indexed: {range}"
        );
    }

    /// Removes `range` if both its offset and size match an indexed range.
    pub(crate) fn remove(&mut self, range: FreeRange) -> bool {
        if self.get(range.offset()) != Some(range) {
            return false;
        }
        self.ranges.remove(&range.offset());
        true
    }

    pub(crate) fn get(&self, offset: usize) -> Option<FreeRange> {
        let &size = self.ranges.get(&offset)?;
        Some(FreeRange::new(offset, size))
    }

    /// Returns the free range with the greatest offset strictly less than
    /// `offset`.
    pub(crate) fn predecessor(&self, offset: usize) -> Option<FreeRange> {
        self.ranges
            .range(..offset)
            .next_back()
            .map(|(&offset, &size)| FreeRange::new(offset, size))
    }

    /// Returns the free range with the smallest offset greater than or equal
    /// to `offset`.
    pub(crate) fn successor(&self, offset: usize) -> Option<FreeRange> {
        self.ranges
            .range(offset..)
            .next()
            .map(|(&offset, &size)| FreeRange::new(offset, size))
    }

    /// Returns the free ranges in ascending offset order.
    pub(crate) fn iter(&self) -> impl DoubleEndedIterator<Item = FreeRange> + '_ {
        self.ranges
            .iter()
            .map(|(&offset, &size)| FreeRange::new(offset, size))
    }

    pub(crate) fn total_size(&self) -> usize {
        self.ranges.values().sum()
    }
}
