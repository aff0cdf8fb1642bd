//! The block size schedules.
//!
//! A schedule dictates how many slots the i-th sub-block holds, and how an
//! element index decomposes into a sub-block and a slot within it.

/// Schedule
///
/// The block size schedule of a `Hat`.
///
/// A schedule must be internally consistent: `locate` must be the inverse of
/// laying sub-blocks of capacity `capacity_of(0)`, `capacity_of(1)`, ... end
/// to end, and `flat_capacity(n)` must be the sum of the first `n`
/// capacities.
pub trait Schedule {
    /// Returns the capacity of a given sub-block.
    fn capacity_of(block: BlockIndex) -> BlockCapacity;

    /// Returns the sub-block, and the slot within it, of the ith element.
    fn locate(index: ElementIndex) -> (BlockIndex, SlotIndex);

    /// Returns the total number of slots in the first `blocks` sub-blocks.
    fn flat_capacity(blocks: NumberBlocks) -> usize;
}

/// Doubling
///
/// The geometric schedule: sub-block `i` holds `2^i` elements, so that `n`
/// sub-blocks hold `2^n - 1` elements in total.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Doubling;

impl Schedule for Doubling {
    fn capacity_of(block: BlockIndex) -> BlockCapacity {
        debug_assert!((block.0 as u32) < USIZE_BITS);

        BlockCapacity(1usize << block.0)
    }

    fn locate(index: ElementIndex) -> (BlockIndex, SlotIndex) {
        //  With sub-block i holding 2^i slots, the first slot of sub-block i
        //  is element 2^i - 1; shifting the index by one therefore aligns
        //  sub-block boundaries on powers of 2.
        let witness = index.0 + 1;
        let block = floor_log2(witness);

        (BlockIndex(block as usize), SlotIndex(witness - (1usize << block)))
    }

    fn flat_capacity(blocks: NumberBlocks) -> usize {
        debug_assert!((blocks.0 as u32) < USIZE_BITS);

        (1usize << blocks.0) - 1
    }
}

/// Fixed
///
/// The constant schedule: every sub-block holds `2^S` elements.
///
/// `S` is a compile-time exponent, typically in `2..=8`; the address
/// computation reduces to a shift and a mask.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Fixed<const S: u32>;

impl<const S: u32> Schedule for Fixed<S> {
    fn capacity_of(_: BlockIndex) -> BlockCapacity {
        debug_assert!(S < USIZE_BITS);

        BlockCapacity(1usize << S)
    }

    fn locate(index: ElementIndex) -> (BlockIndex, SlotIndex) {
        (BlockIndex(index.0 >> S), SlotIndex(index.0 & ((1usize << S) - 1)))
    }

    fn flat_capacity(blocks: NumberBlocks) -> usize {
        blocks.0 << S
    }
}

/// The capacity of a sub-block.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct BlockCapacity(pub usize);

/// The index of a sub-block.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct BlockIndex(pub usize);

/// The index of a slot within a sub-block.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SlotIndex(pub usize);

/// The (global) index of an element.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ElementIndex(pub usize);

/// The number of sub-blocks.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NumberBlocks(pub usize);

//
//  Implementation Details
//

//  Number of bits in usize.
const USIZE_BITS: u32 = usize::BITS;

//  Returns the log2 of n, rounded down to the previous integer.
//
//  For practical purposes, the log2 of 0 is defined as 0.
fn floor_log2(n: usize) -> u32 {
    match n {
        0 | 1 => 0,
        _ => USIZE_BITS - 1 - n.leading_zeros(),
    }
}
