use core::alloc::LayoutError;

use range_heap::FreeRange;
use snafu::{Location, Snafu};

use crate::Allocation;

/// Errors returned when an arena cannot be created.
#[derive(Debug, Snafu, derive_more::IsVariant)]
#[snafu(visibility(pub(crate)))]
pub enum ArenaError {
    #[snafu(display("arena capacity must be greater than zero"))]
    ZeroCapacity {
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("arena capacity {capacity} cannot be laid out: {source}"))]
    CapacityOverflow {
        capacity: usize,
        #[snafu(source)]
        source: LayoutError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("failed to allocate {capacity} bytes of backing storage"))]
    OutOfMemory {
        capacity: usize,
        #[snafu(implicit)]
        location: Location,
    },
}

/// Errors returned when a region cannot be given back to an arena.
///
/// Except for [`BookkeepingFull`](Self::BookkeepingFull), every variant means
/// the caller broke the deallocation contract. The arena's bookkeeping is
/// left untouched in all cases.
#[derive(Debug, Snafu, derive_more::IsVariant)]
#[snafu(visibility(pub(crate)))]
pub enum DeallocError {
    #[snafu(display(
        "allocation {}+{} belongs to a different arena",
        allocation.offset(),
        allocation.size()
    ))]
    ForeignAllocation {
        allocation: Allocation,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("region {offset}+{size} lies outside the arena of {capacity} bytes"))]
    OutOfBounds {
        offset: usize,
        size: usize,
        capacity: usize,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("region {offset}+{size} overlaps free range ({free}), double free?"))]
    DoubleFree {
        offset: usize,
        size: usize,
        free: FreeRange,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display(
        "free-range heap is full ({slots} slots), region {offset}+{size} stays allocated"
    ))]
    BookkeepingFull {
        offset: usize,
        size: usize,
        slots: usize,
        #[snafu(implicit)]
        location: Location,
    },
}

impl DeallocError {
    /// Takes back the handle a rejected [`Arena::deallocate`] call was given,
    /// so it can be returned to the arena it belongs to.
    ///
    /// [`Arena::deallocate`]: crate::Arena::deallocate
    #[must_use]
    pub fn into_allocation(self) -> Option<Allocation> {
        match self {
            Self::ForeignAllocation { allocation, .. } => Some(allocation),
            _ => None,
        }
    }
}

/// A broken invariant found by [`Arena::check_consistency`].
///
/// [`Arena::check_consistency`]: crate::Arena::check_consistency
#[derive(Debug, Snafu, derive_more::IsVariant)]
#[snafu(visibility(pub(crate)))]
pub enum ConsistencyError {
    #[snafu(display("free-range heap order is broken"))]
    HeapOrder {
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("heap holds {heap} free ranges but the offset index holds {index}"))]
    CountMismatch {
        heap: usize,
        index: usize,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("free range ({range}) is missing from the offset index"))]
    Unindexed {
        range: FreeRange,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("free range ({range}) exceeds the arena of {capacity} bytes"))]
    RangeOutOfBounds {
        range: FreeRange,
        capacity: usize,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("free ranges ({left}) and ({right}) overlap"))]
    Overlap {
        left: FreeRange,
        right: FreeRange,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("free ranges ({left}) and ({right}) are adjacent but not merged"))]
    Unmerged {
        left: FreeRange,
        right: FreeRange,
        #[snafu(implicit)]
        location: Location,
    },
}
