//! The raw storage of the Hat: directories and sub-blocks.
//!
//! A sub-block is a contiguous allocation of element slots; a directory is a
//! heap-allocated array of sub-block pointers. Neither tracks which slots
//! are initialized, nor which directory owns which sub-block: both are the
//! rotor's business.

use super::root::{hint, mem, ptr};

use super::allocator::{Allocator, Layout};
use super::failure::{Failure, Result};
use super::schedule::BlockCapacity;

//  A directory: a heap-allocated array of sub-block pointers.
//
//  A null directory marks storage that has been torn down; its capacity is
//  then 0. Entries are uninitialized until explicitly set.
pub(crate) struct Directory<T> {
    ptr: *mut *mut T,
    capacity: usize,
}

impl<T> Directory<T> {
    //  Creates a torn-down instance.
    pub(crate) fn null() -> Self {
        Self { ptr: ptr::null_mut(), capacity: 0 }
    }

    //  Returns whether the directory is torn down.
    pub(crate) fn is_null(&self) -> bool {
        self.ptr.is_null()
    }

    //  Returns the number of entry slots.
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    //  Allocates a directory with the given number of entry slots.
    //
    //  #   Errors
    //
    //  Returns an error if the allocation cannot be satisfied, leaving
    //  nothing allocated.
    pub(crate) fn allocate<A: Allocator>(capacity: usize, allocator: &A) -> Result<Self> {
        debug_assert!(capacity > 0);

        let layout = Self::allocation_layout(capacity)?;

        //  Safety:
        //  -   The layout is non-zero, as a pointer has a non-zero size.
        let ptr = unsafe { allocator.allocate(layout) };

        if ptr.is_null() {
            return Err(Failure::OutOfMemory);
        }

        //  Safety:
        //  -   The pointer is correctly aligned for `*mut T`.
        Ok(Self { ptr: ptr as *mut *mut T, capacity })
    }

    //  Deallocates the directory, if not already torn down.
    //
    //  #   Safety
    //
    //  -   Assumes that `allocator` is the allocator the directory was
    //      allocated with.
    pub(crate) unsafe fn deallocate<A: Allocator>(&mut self, allocator: &A) {
        if self.is_null() {
            return;
        }

        let layout = match Self::allocation_layout(self.capacity) {
            Ok(layout) => layout,
            Err(_) => {
                //  Safety:
                //  -   Cannot error, it succeeded during the allocation.
                debug_assert!(false, "{} succeeded in allocation!", self.capacity);
                hint::unreachable_unchecked()
            }
        };

        let ptr = self.ptr;

        //  Nulled before deallocating, so that a panicking deallocator
        //  cannot leave a dangling directory behind.
        self.ptr = ptr::null_mut();
        self.capacity = 0;

        //  Safety:
        //  -   The pointer matches the pointer of the allocation.
        //  -   The layout matches the layout of the allocation.
        allocator.deallocate(ptr as *mut u8, layout);
    }

    //  Reads the entry at `index`.
    //
    //  #   Safety
    //
    //  -   Assumes that `index` is within bounds.
    //  -   Assumes that the entry at `index` was set.
    pub(crate) unsafe fn entry(&self, index: usize) -> *mut T {
        debug_assert!(!self.is_null());
        debug_assert!(index < self.capacity);

        *self.ptr.add(index)
    }

    //  Writes the entry at `index`.
    //
    //  #   Safety
    //
    //  -   Assumes that `index` is within bounds.
    pub(crate) unsafe fn set_entry(&mut self, index: usize, block: *mut T) {
        debug_assert!(!self.is_null());
        debug_assert!(index < self.capacity);

        ptr::write(self.ptr.add(index), block);
    }

    //  Computes the layout for a given capacity.
    //
    //  #   Errors
    //
    //  Returns an error if the necessary size overflows.
    fn allocation_layout(capacity: usize) -> Result<Layout> {
        layout_of::<*mut T>(capacity)
    }
}

//  Allocates a sub-block with the given number of element slots.
//
//  #   Errors
//
//  Returns an error if the allocation cannot be satisfied, leaving nothing
//  allocated.
pub(crate) fn allocate_block<T, A: Allocator>(capacity: BlockCapacity, allocator: &A) -> Result<*mut T> {
    let layout = block_layout::<T>(capacity)?;

    //  Safety:
    //  -   The layout is non-zero, as zero-sized elements are rejected at
    //      construction.
    let ptr = unsafe { allocator.allocate(layout) };

    if ptr.is_null() {
        return Err(Failure::OutOfMemory);
    }

    Ok(ptr as *mut T)
}

//  Deallocates a sub-block.
//
//  #   Safety
//
//  -   Assumes that `block` was allocated by `allocate_block` with the same
//      `capacity` and `allocator`, and not already deallocated.
pub(crate) unsafe fn deallocate_block<T, A: Allocator>(block: *mut T, capacity: BlockCapacity, allocator: &A) {
    let layout = match block_layout::<T>(capacity) {
        Ok(layout) => layout,
        Err(_) => {
            //  Safety:
            //  -   Cannot error, it succeeded during the allocation.
            debug_assert!(false, "{:?} succeeded in allocation!", capacity);
            hint::unreachable_unchecked()
        }
    };

    //  Safety:
    //  -   The pointer and layout match those of the allocation.
    allocator.deallocate(block as *mut u8, layout);
}

//  Drops the first `count` slots of a sub-block, in place.
//
//  #   Safety
//
//  -   Assumes that the first `count` slots of `block` are initialized.
pub(crate) unsafe fn drop_block_slots<T>(block: *mut T, count: usize) {
    //  Safety:
    //  -   The first `count` slots are initialized, per pre-condition.
    ptr::drop_in_place(ptr::slice_from_raw_parts_mut(block, count));
}

//
//  Implementation Details
//

//  Computes the layout of `capacity` slots of `T`.
//
//  #   Errors
//
//  Returns an error if the necessary size overflows.
fn layout_of<T>(capacity: usize) -> Result<Layout> {
    let size = mem::size_of::<T>();
    let alignment = mem::align_of::<T>();

    if let Some(result) = capacity.checked_mul(size) {
        //  Safety:
        //  -   Size is a multiple of alignment.
        Ok(unsafe { Layout::from_size_align_unchecked(result, alignment) })
    } else {
        Err(Failure::BytesOverflow)
    }
}

fn block_layout<T>(capacity: BlockCapacity) -> Result<Layout> {
    layout_of::<T>(capacity.0)
}
