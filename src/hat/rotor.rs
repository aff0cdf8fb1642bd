//! The rotor: the three-directory core of the Hat.
//!
//! The rotor owns three directories:
//!
//! -   `mid`, the working directory, whose first `mid_len` entries point to
//!     the allocated sub-blocks. It is the sole owner of the sub-blocks.
//! -   `high`, of twice the capacity, whose first `high_len` entries mirror
//!     those of `mid`, ready to take over on growth.
//! -   `low`, of half the capacity, whose first `low_len` entries mirror
//!     those of `mid`, ready to take over on shrinkage.
//!
//! Each mutating operation copies at most two mirror entries, which is
//! enough for a mirror to be complete whenever a rotation fires:
//!
//! -   Growing: between rotations `mid` accepts `capacity / 2` new
//!     sub-blocks while `high` must mirror `capacity` entries, hence two
//!     copies per new sub-block.
//! -   Shrinking: between rotations `capacity / 2` sub-blocks retire while
//!     `low` must mirror `capacity / 2` entries, hence two copies per
//!     retirement.
//!
//! Rotations therefore move pointers wholesale by exchanging directories,
//! never by copying; the sub-blocks themselves never move at all.

use super::root::{cmp, marker, mem, ptr, slice};

use super::allocator::Allocator;
use super::failure::{Failure, Result};
use super::schedule::{BlockIndex, ElementIndex, NumberBlocks, Schedule};
use super::storage::{self, Directory};

//  The rotor.
//
//  A torn-down rotor has three null directories and zeroed counters; it is
//  re-bootstrapped by the next push.
pub(crate) struct Rotor<T, S: Schedule> {
    //  The number of elements stored.
    length: usize,
    //  The working directory; owns sub-blocks 0..mid_len.
    mid: Directory<T>,
    mid_len: usize,
    //  The growth mirror.
    high: Directory<T>,
    high_len: usize,
    //  The shrink mirror.
    low: Directory<T>,
    low_len: usize,
    _schedule: marker::PhantomData<S>,
}

impl<T, S: Schedule> Rotor<T, S> {
    //  Creates a torn-down instance; no memory is allocated.
    pub(crate) fn new() -> Self {
        Self {
            length: 0,
            mid: Directory::null(),
            mid_len: 0,
            high: Directory::null(),
            high_len: 0,
            low: Directory::null(),
            low_len: 0,
            _schedule: marker::PhantomData,
        }
    }

    //  Allocates the directory trio: `low` of capacity 1, `mid` of capacity
    //  1, `high` of capacity 2. The first push then only allocates its
    //  sub-block.
    //
    //  #   Panics
    //
    //  Panics if `T` is zero-sized.
    //
    //  #   Errors
    //
    //  Returns an error if any directory cannot be allocated, leaving the
    //  rotor torn down.
    pub(crate) fn bootstrap<A: Allocator>(&mut self, allocator: &A) -> Result<()> {
        debug_assert!(self.mid.is_null());

        if mem::size_of::<T>() == 0 {
            panic_zero_sized_element();
        }

        let mut low = Directory::allocate(1, allocator)?;

        let mut mid = match Directory::allocate(1, allocator) {
            Ok(mid) => mid,
            Err(error) => {
                //  Safety:
                //  -   Freshly allocated with this allocator.
                unsafe { low.deallocate(allocator) };
                return Err(error);
            }
        };

        let high = match Directory::allocate(2, allocator) {
            Ok(high) => high,
            Err(error) => {
                //  Safety:
                //  -   Freshly allocated with this allocator.
                unsafe {
                    low.deallocate(allocator);
                    mid.deallocate(allocator);
                }
                return Err(error);
            }
        };

        self.low = low;
        self.mid = mid;
        self.high = high;

        Ok(())
    }

    //  Returns whether the rotor is torn down.
    pub(crate) fn is_torn_down(&self) -> bool {
        self.mid.is_null()
    }

    //  Returns the number of elements stored.
    pub(crate) fn len(&self) -> usize {
        self.length
    }

    //  Returns the total number of slots across allocated sub-blocks.
    pub(crate) fn capacity(&self) -> usize {
        S::flat_capacity(NumberBlocks(self.mid_len))
    }

    //  Returns the number of allocated sub-blocks.
    pub(crate) fn number_blocks(&self) -> usize {
        self.mid_len
    }

    //  Returns the number of sub-blocks holding at least one element.
    pub(crate) fn live_blocks(&self) -> usize {
        if self.length == 0 {
            0
        } else {
            let (block, _) = S::locate(ElementIndex(self.length - 1));
            block.0 + 1
        }
    }

    //  Returns a reference to the ith element, if any.
    pub(crate) fn get(&self, index: usize) -> Option<&T> {
        if index >= self.length {
            None
        } else {
            //  Safety:
            //  -   `index` is within bounds.
            Some(unsafe { self.get_unchecked(index) })
        }
    }

    //  Returns a reference to the ith element.
    //
    //  #   Safety
    //
    //  -   Assumes that `index` is strictly less than the length.
    pub(crate) unsafe fn get_unchecked(&self, index: usize) -> &T {
        debug_assert!(index < self.length);

        let (block, slot) = S::locate(ElementIndex(index));

        //  Safety:
        //  -   The block is allocated and the slot initialized, since the
        //      element at `index` is live.
        &*self.mid.entry(block.0).add(slot.0)
    }

    //  Returns a mutable reference to the ith element, if any.
    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index >= self.length {
            None
        } else {
            //  Safety:
            //  -   `index` is within bounds.
            Some(unsafe { self.get_unchecked_mut(index) })
        }
    }

    //  Returns a mutable reference to the ith element.
    //
    //  #   Safety
    //
    //  -   Assumes that `index` is strictly less than the length.
    pub(crate) unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T {
        debug_assert!(index < self.length);

        let (block, slot) = S::locate(ElementIndex(index));

        //  Safety:
        //  -   The block is allocated and the slot initialized, since the
        //      element at `index` is live.
        //  -   The access is exclusive, as per &mut self.
        &mut *self.mid.entry(block.0).add(slot.0)
    }

    //  Returns the initialized part of a sub-block.
    //
    //  Returns an empty slice if the sub-block holds no element.
    pub(crate) fn initialized_block(&self, block: BlockIndex) -> &[T] {
        let initialized = self.initialized_in(block);

        if initialized == 0 {
            return &[];
        }

        //  Safety:
        //  -   The block is allocated, and its first `initialized` slots
        //      hold live elements.
        unsafe { slice::from_raw_parts(self.mid.entry(block.0), initialized) }
    }

    //  Returns the initialized part of a sub-block, mutably.
    pub(crate) fn initialized_block_mut(&mut self, block: BlockIndex) -> &mut [T] {
        let initialized = self.initialized_in(block);

        if initialized == 0 {
            return &mut [];
        }

        //  Safety:
        //  -   The block is allocated, and its first `initialized` slots
        //      hold live elements.
        //  -   The access is exclusive, as per &mut self.
        unsafe { slice::from_raw_parts_mut(self.mid.entry(block.0), initialized) }
    }

    //  Appends an element.
    //
    //  #   Errors
    //
    //  Returns an error if a directory or sub-block allocation fails; the
    //  rotor is left unchanged, every allocation being performed before any
    //  state is touched.
    pub(crate) fn try_push<A: Allocator>(&mut self, value: T, allocator: &A) -> Result<()> {
        if self.is_torn_down() {
            self.bootstrap(allocator)?;
        }

        let (block, slot) = S::locate(ElementIndex(self.length));

        if block.0 == self.mid_len {
            self.grow(block, allocator)?;
        }

        debug_assert!(block.0 < self.mid_len);

        //  Safety:
        //  -   The target block is allocated, and `slot` is within its
        //      capacity.
        //  -   The slot is uninitialized: it lies at index `length`.
        unsafe { ptr::write(self.mid.entry(block.0).add(slot.0), value) };

        self.length += 1;

        Ok(())
    }

    //  Removes and returns the last element.
    //
    //  #   Errors
    //
    //  Returns `OutOfBounds` if the rotor is empty, and `OutOfMemory` if the
    //  shrink rotation cannot allocate its fresh directory; the rotor is
    //  left unchanged in both cases.
    pub(crate) fn try_pop<A: Allocator>(&mut self, allocator: &A) -> Result<T> {
        if self.length == 0 {
            return Err(Failure::OutOfBounds);
        }

        let (block, slot) = S::locate(ElementIndex(self.length - 1));

        //  A sub-block is retired only once the last element lives in the
        //  block before it, so that a push right after a pop straddling a
        //  block boundary does not re-allocate.
        let retire = block.0 + 1 < self.mid_len;
        let rotate = retire && block.0 < self.mid.capacity() / 2;

        let fresh_low = if rotate {
            let halved = self.mid.capacity() / 2;
            Some(Directory::allocate(cmp::max(1, halved / 2), allocator)?)
        } else {
            None
        };

        //  No failure past this point.

        //  Safety:
        //  -   The slot holds the last live element; it is moved out, and
        //      `length` decremented below, so it is never read again.
        let value = unsafe { ptr::read(self.mid.entry(block.0).add(slot.0)) };

        if retire {
            let retired = self.mid_len - 1;

            //  Safety:
            //  -   Block `retired` is allocated, owned by `mid`, and holds
            //      no live element.
            unsafe {
                storage::deallocate_block(
                    self.mid.entry(retired),
                    S::capacity_of(BlockIndex(retired)),
                    allocator,
                )
            };

            if let Some(fresh_low) = fresh_low {
                //  The downward mirror is complete, or the rotation would
                //  have to copy.
                debug_assert_eq!(self.low_len, self.mid_len - 1);

                //  Safety:
                //  -   `high` was allocated with this allocator; its entries
                //      are mere mirrors.
                unsafe { self.high.deallocate(allocator) };

                self.high = mem::replace(&mut self.mid, mem::replace(&mut self.low, fresh_low));
                self.mid_len -= 1;
                self.high_len = self.mid_len;
                self.low_len = 0;
            } else {
                self.mid_len -= 1;
                //  The mirror may have covered the retired entry; an
                //  uncovered count would go stale when the slot is reused.
                self.high_len = cmp::min(self.high_len, self.mid_len);
            }

            self.preload_down();
        }

        self.length -= 1;

        Ok(value)
    }

    //  Tears the rotor down: drops every live element, deallocates every
    //  sub-block through `mid`, then the three directories.
    //
    //  Idempotent; the rotor is re-bootstrapped by the next push.
    pub(crate) fn clear<A: Allocator>(&mut self, allocator: &A) {
        if self.mid.is_null() {
            return;
        }

        let length = self.length;
        let live = self.live_blocks();

        //  Emptied first: should an element drop panic, the next teardown
        //  skips straight to releasing memory rather than dropping twice.
        self.length = 0;

        for block in 0..live {
            let initialized = initialized_in::<S>(BlockIndex(block), length);

            //  Safety:
            //  -   The first `initialized` slots hold live elements.
            unsafe { storage::drop_block_slots(self.mid.entry(block), initialized) };
        }

        for block in 0..self.mid_len {
            //  Safety:
            //  -   Blocks 0..mid_len are allocated, owned by `mid`.
            unsafe {
                storage::deallocate_block(self.mid.entry(block), S::capacity_of(BlockIndex(block)), allocator)
            };
        }

        self.low_len = 0;
        self.mid_len = 0;
        self.high_len = 0;

        //  Safety:
        //  -   The directories were allocated with this allocator.
        unsafe {
            self.low.deallocate(allocator);
            self.mid.deallocate(allocator);
            self.high.deallocate(allocator);
        }
    }

    //  Returns the number of initialized slots of a sub-block.
    fn initialized_in(&self, block: BlockIndex) -> usize {
        if self.mid.is_null() {
            return 0;
        }

        initialized_in::<S>(block, self.length)
    }

    //  Makes room for the sub-block at `block` == `mid_len`, rotating the
    //  directories first if `mid` is full.
    //
    //  #   Errors
    //
    //  Returns an error if any allocation fails, leaving the rotor
    //  unchanged.
    fn grow<A: Allocator>(&mut self, block: BlockIndex, allocator: &A) -> Result<()> {
        debug_assert_eq!(block.0, self.mid_len);

        if self.mid_len == self.mid.capacity() {
            //  Rotation. Every allocation is performed up-front, so that
            //  failure leaves the rotor unchanged.
            let doubled = self.mid.capacity() * 2;

            let mut fresh_high = Directory::allocate(doubled * 2, allocator)?;

            let fresh_block = match storage::allocate_block::<T, _>(S::capacity_of(block), allocator) {
                Ok(fresh_block) => fresh_block,
                Err(error) => {
                    //  Safety:
                    //  -   Freshly allocated with this allocator.
                    unsafe { fresh_high.deallocate(allocator) };
                    return Err(error);
                }
            };

            //  The upward mirror is complete, or the rotation would have to
            //  copy.
            debug_assert_eq!(self.high_len, self.mid_len);

            //  Safety:
            //  -   `low` was allocated with this allocator; its entries are
            //      mere mirrors, the sub-blocks live on in `mid`.
            unsafe { self.low.deallocate(allocator) };

            self.low = mem::replace(&mut self.mid, mem::replace(&mut self.high, fresh_high));
            self.low_len = self.mid_len;
            self.high_len = 0;

            self.push_block(fresh_block);
        } else {
            let fresh_block = storage::allocate_block::<T, _>(S::capacity_of(block), allocator)?;

            self.push_block(fresh_block);
        }

        Ok(())
    }

    //  Records a freshly allocated sub-block in `mid`.
    fn push_block(&mut self, block: *mut T) {
        debug_assert!(self.mid_len < self.mid.capacity());

        //  Safety:
        //  -   `mid_len` is within the directory capacity.
        unsafe { self.mid.set_entry(self.mid_len, block) };

        self.mid_len += 1;

        self.preload_up();
    }

    //  Mirrors up to two `mid` entries into `high`.
    fn preload_up(&mut self) {
        for _ in 0..2 {
            if self.high_len < self.mid_len {
                //  Safety:
                //  -   Entries 0..mid_len of `mid` are set.
                //  -   `high_len` is within the `high` capacity, which is at
                //      least twice the `mid` capacity.
                unsafe {
                    let entry = self.mid.entry(self.high_len);
                    self.high.set_entry(self.high_len, entry);
                }
                self.high_len += 1;
            }
        }
    }

    //  Mirrors up to two `mid` entries into `low`.
    //
    //  Only the lower half of `mid` is mirrored: entries there are stable,
    //  as retirement never reaches below the half mark without rotating.
    fn preload_down(&mut self) {
        let target = self.mid.capacity() / 2;

        for _ in 0..2 {
            if self.low_len < target {
                //  Safety:
                //  -   Entries below `capacity / 2` are set: the rotor never
                //      shrinks `mid` below its half mark.
                //  -   `low_len` is within the `low` capacity.
                unsafe {
                    let entry = self.mid.entry(self.low_len);
                    self.low.set_entry(self.low_len, entry);
                }
                self.low_len += 1;
            }
        }
    }

    //  Checks every structural invariant of the rotor, panicking on the
    //  first violation.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        if self.mid.is_null() {
            assert!(self.low.is_null());
            assert!(self.high.is_null());
            assert_eq!(0, self.length);
            assert_eq!(0, self.low_len + self.mid_len + self.high_len);
            return;
        }

        let mid_capacity = self.mid.capacity();

        //  Capacity skew.
        assert!(mid_capacity.is_power_of_two());
        assert_eq!(cmp::max(1, mid_capacity / 2), self.low.capacity());
        assert_eq!(2 * mid_capacity, self.high.capacity());

        //  Occupancies.
        assert!(self.mid_len <= mid_capacity);
        assert!(self.high_len <= self.mid_len);
        assert!(self.low_len <= mid_capacity / 2);
        assert!(self.mid_len == 0 || 2 * self.mid_len >= mid_capacity);

        //  Mirror prefixes.
        for i in 0..self.high_len {
            assert_eq!(unsafe { self.mid.entry(i) }, unsafe { self.high.entry(i) });
        }

        for i in 0..self.low_len {
            assert_eq!(unsafe { self.mid.entry(i) }, unsafe { self.low.entry(i) });
        }

        //  Preloading progress: mirrors must complete before their rotation.
        assert!(self.high_len >= cmp::min(self.mid_len, 2 * self.mid_len.saturating_sub(mid_capacity / 2)));
        assert!(self.low_len >= cmp::min(mid_capacity / 2, 2 * (mid_capacity - self.mid_len)));

        //  Length accounting: only the last allocated block may be partial,
        //  and at most one trailing block may be fully drained.
        let live = self.live_blocks();
        assert!(live <= self.mid_len);
        assert!(self.mid_len <= cmp::max(live + 1, 1));
        assert!(self.length <= S::flat_capacity(NumberBlocks(self.mid_len)));
    }
}

//
//  Implementation Details
//

//  Returns the number of initialized slots of `block` for a rotor of
//  `length` elements.
fn initialized_in<S: Schedule>(block: BlockIndex, length: usize) -> usize {
    let before = S::flat_capacity(NumberBlocks(block.0));
    let capacity = S::capacity_of(block).0;

    cmp::min(length.saturating_sub(before), capacity)
}

#[cold]
#[inline(never)]
fn panic_zero_sized_element() -> ! {
    panic!("Zero-sized elements are not supported");
}

#[cfg(test)]
mod tests {

    use super::*;
    use super::super::schedule::{Doubling, Fixed};

    use crate::utils::tester::*;

    const PTR_SIZE: usize = mem::size_of::<usize>();

    fn with_elements(count: usize, allocator: &TestAllocator) -> Rotor<usize, Doubling> {
        let mut rotor = Rotor::new();

        for i in 0..count {
            rotor.try_push(i, &allocator).unwrap();
            rotor.check_invariants();
        }

        rotor
    }

    #[test]
    fn bootstrap_allocates_trio() {
        let allocator = TestAllocator::unlimited();

        let mut rotor = Rotor::<usize, Doubling>::new();
        rotor.check_invariants();

        rotor.bootstrap(&allocator).unwrap();
        rotor.check_invariants();

        assert!(!rotor.is_torn_down());
        assert_eq!(vec![PTR_SIZE, PTR_SIZE, 2 * PTR_SIZE], allocator.allocation_sizes());

        rotor.clear(&allocator);
    }

    #[test]
    fn bootstrap_failure_leaves_torn_down() {
        for allowed in 0..3 {
            let allocator = TestAllocator::new(allowed);

            let mut rotor = Rotor::<usize, Doubling>::new();

            assert_eq!(Err(Failure::OutOfMemory), rotor.bootstrap(&allocator));
            assert!(rotor.is_torn_down());
            assert_eq!(0, allocator.allocations().len());

            rotor.check_invariants();
        }
    }

    #[test]
    fn push_allocates_on_schedule() {
        let allocator = TestAllocator::unlimited();

        let mut rotor = Rotor::<u64, Doubling>::new();

        //  Trio + first sub-block of 1 element.
        rotor.try_push(0, &allocator).unwrap();
        assert_eq!((4, 0), allocator.counts());

        //  Rotation: fresh high directory + sub-block of 2; old low freed.
        rotor.try_push(1, &allocator).unwrap();
        assert_eq!((6, 1), allocator.counts());

        //  Same sub-block: no allocator traffic.
        rotor.try_push(2, &allocator).unwrap();
        assert_eq!((6, 1), allocator.counts());

        rotor.check_invariants();

        rotor.clear(&allocator);
    }

    #[test]
    fn push_preloads_two_per_block() {
        let allocator = TestAllocator::unlimited();

        //  15 elements: sub-blocks 0..=3, mid capacity 4.
        let mut rotor = with_elements(15, &allocator);

        assert_eq!(4, rotor.number_blocks());
        assert_eq!(4, rotor.mid_len);
        //  Two copies for sub-block 2 (opened by the rotation) and two for
        //  sub-block 3: the mirror is already complete.
        assert_eq!(4, rotor.high_len);
        assert_eq!(2, rotor.low_len);

        rotor.clear(&allocator);
    }

    #[test]
    fn push_reads_back() {
        let allocator = TestAllocator::unlimited();

        let rotor = with_elements(100, &allocator);

        for i in 0..100 {
            assert_eq!(Some(&i), rotor.get(i));
        }
        assert_eq!(None, rotor.get(100));

        let mut rotor = rotor;
        rotor.clear(&allocator);
    }

    #[test]
    fn push_failure_leaves_unchanged() {
        let allocator = TestAllocator::unlimited();

        let mut rotor = with_elements(3, &allocator);
        let before = allocator.counts();

        //  The next push opens sub-block 2, rotating to capacity 4: it
        //  needs a fresh high directory and a fresh sub-block.
        for starved in 0..2 {
            allocator.allowed.set(starved);

            assert_eq!(Err(Failure::OutOfMemory), rotor.try_push(3, &allocator));
            assert_eq!(3, rotor.len());
            assert_eq!(Some(&2), rotor.get(2));

            rotor.check_invariants();
        }

        //  No allocation survived the failed attempts.
        let after = allocator.counts();
        assert_eq!(after.0 - before.0, after.1 - before.1);

        allocator.allowed.set(usize::MAX);

        rotor.try_push(3, &allocator).unwrap();
        assert_eq!(4, rotor.len());

        rotor.check_invariants();

        rotor.clear(&allocator);
    }

    #[test]
    fn pop_returns_in_reverse() {
        let allocator = TestAllocator::unlimited();

        let mut rotor = with_elements(20, &allocator);

        for i in (0..20).rev() {
            assert_eq!(Ok(i), rotor.try_pop(&allocator));
            rotor.check_invariants();
        }

        assert_eq!(Err(Failure::OutOfBounds), rotor.try_pop(&allocator));

        rotor.clear(&allocator);
    }

    #[test]
    fn pop_retires_lazily() {
        let allocator = TestAllocator::unlimited();

        //  4 elements: sub-blocks 0, 1, 2 allocated, mid capacity 4.
        let mut rotor = with_elements(4, &allocator);
        assert_eq!(3, rotor.number_blocks());

        //  Element 3 is the sole element of sub-block 2: popping it leaves
        //  the block allocated, ready for a prompt re-push.
        rotor.try_pop(&allocator).unwrap();
        assert_eq!(3, rotor.number_blocks());
        rotor.check_invariants();

        let (allocated, _) = allocator.counts();

        rotor.try_push(3, &allocator).unwrap();
        assert_eq!(allocated, allocator.counts().0);
        rotor.check_invariants();

        rotor.clear(&allocator);
    }

    #[test]
    fn pop_rotates_at_half() {
        let allocator = TestAllocator::unlimited();

        //  4 elements: mid capacity 4, sub-blocks 0, 1, 2.
        let mut rotor = with_elements(4, &allocator);
        assert_eq!(4, rotor.mid.capacity());

        rotor.try_pop(&allocator).unwrap();

        //  Popping element 2 retires sub-block 2 with the last element in
        //  sub-block 1, below the half mark: the rotor rotates down.
        rotor.try_pop(&allocator).unwrap();
        assert_eq!(2, rotor.mid.capacity());
        assert_eq!(2, rotor.mid_len);
        assert_eq!(2, rotor.high_len);
        rotor.check_invariants();

        assert_eq!(Some(&1), rotor.get(1));

        rotor.clear(&allocator);
    }

    #[test]
    fn pop_failure_leaves_unchanged() {
        let allocator = TestAllocator::unlimited();

        let mut rotor = with_elements(4, &allocator);

        rotor.try_pop(&allocator).unwrap();

        //  The next pop rotates, allocating a fresh low directory.
        allocator.allowed.set(0);

        assert_eq!(Err(Failure::OutOfMemory), rotor.try_pop(&allocator));
        assert_eq!(3, rotor.len());
        assert_eq!(Some(&2), rotor.get(2));
        rotor.check_invariants();

        allocator.allowed.set(usize::MAX);

        assert_eq!(Ok(2), rotor.try_pop(&allocator));
        rotor.check_invariants();

        rotor.clear(&allocator);
    }

    #[test]
    fn pop_clamps_high_mirror() {
        let allocator = TestAllocator::unlimited();

        //  15 elements: sub-blocks 0..=3, mid capacity 4, high fully
        //  mirrored.
        let mut rotor = with_elements(15, &allocator);
        assert_eq!(4, rotor.high_len);

        //  Down to 6 elements: the pop of element 6 retires sub-block 3
        //  without rotating; the mirror must shed the retired entry.
        for _ in 0..9 {
            rotor.try_pop(&allocator).unwrap();
            rotor.check_invariants();
        }

        assert_eq!(3, rotor.mid_len);
        assert_eq!(3, rotor.high_len);

        //  Re-opening sub-block 3 must refresh the mirror with the new
        //  pointer, not trust the stale one.
        rotor.try_push(6, &allocator).unwrap();
        rotor.try_push(7, &allocator).unwrap();
        assert_eq!(4, rotor.mid_len);
        assert_eq!(4, rotor.high_len);
        assert_eq!(unsafe { rotor.mid.entry(3) }, unsafe { rotor.high.entry(3) });
        rotor.check_invariants();

        rotor.clear(&allocator);
    }

    #[test]
    fn drain_keeps_block_zero() {
        let allocator = TestAllocator::unlimited();

        let mut rotor = with_elements(100, &allocator);

        for _ in 0..100 {
            rotor.try_pop(&allocator).unwrap();
            rotor.check_invariants();
        }

        //  Sub-block 0 is never retired: there is no pop left to retire it.
        assert_eq!(0, rotor.len());
        assert_eq!(1, rotor.number_blocks());
        assert_eq!(1, rotor.mid.capacity());

        rotor.try_push(42, &allocator).unwrap();
        assert_eq!(Some(&42), rotor.get(0));
        rotor.check_invariants();

        rotor.clear(&allocator);
    }

    #[test]
    fn constant_work_per_operation() {
        let allocator = TestAllocator::unlimited();

        let mut rotor = Rotor::<usize, Doubling>::new();

        //  The bootstrap push pays for the directory trio.
        rotor.try_push(0, &allocator).unwrap();

        let mut counts = allocator.counts();

        for i in 1..5_000 {
            rotor.try_push(i, &allocator).unwrap();

            let now = allocator.counts();
            assert!(now.0 - counts.0 <= 2, "push {} allocated {} times", i, now.0 - counts.0);
            assert!(now.1 - counts.1 <= 1, "push {} deallocated {} times", i, now.1 - counts.1);
            counts = now;
        }

        for i in 0..5_000 {
            rotor.try_pop(&allocator).unwrap();

            let now = allocator.counts();
            assert!(now.0 - counts.0 <= 1, "pop {} allocated {} times", i, now.0 - counts.0);
            assert!(now.1 - counts.1 <= 2, "pop {} deallocated {} times", i, now.1 - counts.1);
            counts = now;
        }

        rotor.clear(&allocator);
    }

    #[test]
    fn fixed_push_pop_roundtrip() {
        let allocator = TestAllocator::unlimited();

        let mut rotor = Rotor::<usize, Fixed<2>>::new();

        for i in 0..100 {
            rotor.try_push(i, &allocator).unwrap();
            rotor.check_invariants();
        }

        assert_eq!(25, rotor.number_blocks());

        for i in (0..100).rev() {
            assert_eq!(Ok(i), rotor.try_pop(&allocator));
            rotor.check_invariants();
        }

        rotor.clear(&allocator);
    }

    #[test]
    fn clear_drops_all_elements() {
        let allocator = TestAllocator::unlimited();
        let count = SpyCount::zero();

        let mut rotor = Rotor::<SpyElement<'_>, Doubling>::new();

        for _ in 0..20 {
            rotor.try_push(SpyElement::new(&count), &allocator).unwrap();
        }

        assert_eq!(20, count.get());

        rotor.clear(&allocator);

        assert_eq!(0, count.get());
        assert_eq!(0, allocator.allocations().len());
        assert!(rotor.is_torn_down());
        rotor.check_invariants();

        //  Torn down twice: still nothing to release.
        rotor.clear(&allocator);
        assert_eq!(0, allocator.allocations().len());

        //  The rotor re-bootstraps on the next push.
        rotor.try_push(SpyElement::new(&count), &allocator).unwrap();
        assert_eq!(1, count.get());
        rotor.check_invariants();

        rotor.clear(&allocator);
        assert_eq!(0, count.get());
    }

    #[test]
    fn oscillation_at_block_boundary() {
        let allocator = TestAllocator::unlimited();

        let mut rotor = Rotor::<usize, Doubling>::new();

        for i in 0..10_000 {
            rotor.try_push(i, &allocator).unwrap();
            assert_eq!(Ok(i), rotor.try_pop(&allocator));
        }

        assert_eq!(0, rotor.len());
        assert!(rotor.mid.capacity() <= 4);
        rotor.check_invariants();

        rotor.clear(&allocator);
    }

    #[test]
    fn mirrors_across_growth_spectrum() {
        //  2^k + 3 elements for every k: each run crosses k rotations and
        //  ends mid-preload.
        for k in 0..13 {
            let allocator = TestAllocator::unlimited();
            let mut rotor = Rotor::<usize, Doubling>::new();

            for i in 0..(1usize << k) + 3 {
                rotor.try_push(i, &allocator).unwrap();
                rotor.check_invariants();
            }

            rotor.clear(&allocator);
        }
    }
}
