//! Internal testing utilities

use crate::root::sync::atomic::{AtomicUsize, Ordering};
use crate::root::{cell, iter, ptr};

use crate::allocator::{Allocator, DefaultAllocator, Layout};
use crate::hat::HatHooks;

//  Allocation
//
//  Description of an allocation.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct Allocation {
    //  The size of the allocation, in bytes.
    pub size: usize,
    //  The alignment of the allocation, in bytes.
    pub alignment: usize,
    //  The pointer allocated.
    pub pointer: *mut u8,
}

impl Allocation {
    pub fn new(pointer: *mut u8, layout: Layout) -> Self {
        Allocation {
            size: layout.size(),
            alignment: layout.align(),
            pointer,
        }
    }

    pub fn layout(&self) -> Layout {
        Layout::from_size_align(self.size, self.alignment).unwrap()
    }
}

//  Test Allocator
//
//  An allocator specifically for testing:
//  -   Allows injecting allocation failures.
//  -   Checks that allocations and deallocations match.
//  -   Counts allocations and deallocations, to pin per-operation work.
#[derive(Default)]
pub struct TestAllocator {
    //  The actual allocator.
    pub allocator: DefaultAllocator,
    //  The number of allocations allowed.
    pub allowed: cell::Cell<usize>,
    //  The total number of allocations performed.
    pub allocated: cell::Cell<usize>,
    //  The total number of deallocations performed.
    pub deallocated: cell::Cell<usize>,
    //  The live allocations; to check deallocation requests.
    pub allocations: cell::RefCell<Vec<Allocation>>,
}

impl TestAllocator {
    pub fn new(allowed: usize) -> TestAllocator {
        let allocator = TestAllocator::default();
        allocator.allowed.set(allowed);
        allocator
    }

    pub fn unlimited() -> TestAllocator {
        TestAllocator::new(usize::MAX)
    }

    pub fn allocations(&self) -> Vec<Allocation> {
        self.allocations.borrow().clone()
    }

    pub fn allocation_sizes(&self) -> Vec<usize> {
        self.allocations.borrow().iter().map(|&a| a.size).collect()
    }

    //  Returns the cumulated number of (allocations, deallocations).
    pub fn counts(&self) -> (usize, usize) {
        (self.allocated.get(), self.deallocated.get())
    }

    pub fn clear(&self) {
        for a in self.allocations.borrow().iter() {
            //  Safety:
            //  -   Were allocated, and not deallocated.
            unsafe { self.allocator.deallocate(a.pointer, a.layout()) };
        }
        self.allocations.borrow_mut().clear();
    }

    fn locate(&self, allocation: Allocation) -> Option<usize> {
        self.allocations.borrow().iter().position(|a| *a == allocation)
    }
}

impl Allocator for TestAllocator {
    unsafe fn allocate(&self, layout: Layout) -> *mut u8 {
        if self.allowed.get() == 0 {
            return ptr::null_mut();
        }

        self.allowed.set(self.allowed.get() - 1);
        self.allocated.set(self.allocated.get() + 1);

        //  Safety:
        //  -   Forward.
        let result = unsafe { self.allocator.allocate(layout) };
        assert_ne!(ptr::null_mut(), result);

        let allocation = Allocation::new(result, layout);
        self.allocations.borrow_mut().push(allocation);

        result
    }

    unsafe fn deallocate(&self, ptr: *mut u8, layout: Layout) {
        //  Safety:
        //  -   Forward.
        unsafe { self.allocator.deallocate(ptr, layout) };

        self.deallocated.set(self.deallocated.get() + 1);

        let allocation = Allocation::new(ptr, layout);

        if let Some(index) = self.locate(allocation) {
            self.allocations.borrow_mut().remove(index);
        } else {
            panic!("Could not find {:?} in {:?}", allocation, &*self.allocations.borrow());
        }
    }
}

impl HatHooks for TestAllocator {}

impl Drop for TestAllocator {
    fn drop(&mut self) {
        self.clear()
    }
}

//  SpyCount
//
//  A counter of the number of instances of elements.
pub struct SpyCount(AtomicUsize);

impl SpyCount {
    pub fn zero() -> Self {
        SpyCount(AtomicUsize::new(0))
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }

    fn decrement(&self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }

    fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }
}

//  Spy Element
//
//  An element tracking the number of instances, helpful to ensure proper drop.
pub struct SpyElement<'a> {
    count: &'a SpyCount,
}

impl<'a> SpyElement<'a> {
    pub fn new(count: &'a SpyCount) -> Self {
        count.increment();
        SpyElement { count }
    }
}

impl<'a> Drop for SpyElement<'a> {
    fn drop(&mut self) {
        self.count.decrement();
    }
}

//  A value which may panic on drop.
#[derive(Eq, Hash, PartialEq)]
pub struct PanickyDrop<T>(T, bool);

impl<T> PanickyDrop<T> {
    //  Creates a normal instance.
    pub fn new(value: T) -> Self {
        Self(value, false)
    }

    //  Creates a panicky instance.
    pub fn panicky(value: T) -> Self {
        Self(value, true)
    }
}

impl<T> Drop for PanickyDrop<T> {
    fn drop(&mut self) {
        if self.1 {
            panic!("Oh No!")
        }
    }
}

//  An Iterator which panics when reaching the configured count.
pub struct PanickyIterator(u32, u32);

impl PanickyIterator {
    //  Creates an instance configured to panic after yielding `count` elements.
    pub fn new(count: u32) -> PanickyIterator {
        PanickyIterator(0, count)
    }
}

impl iter::Iterator for PanickyIterator {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        assert_ne!(self.0, self.1);

        let result = self.0;
        self.0 += 1;
        Some(result)
    }
}
