//! The Hat

use super::root::{fmt, iter, ops};

use super::failure::{Failure, Result};
use super::hooks::HatHooks;
use super::iter::{Blocks, Iter};
use super::rotor::Rotor;
use super::schedule::{BlockIndex, Doubling, Fixed, Schedule};

#[cfg(feature = "with-std")]
use super::hooks::DefaultHatHooks;

//
//  Public Interface
//

/// `Hat`
#[cfg(not(feature = "with-std"))]
pub struct Hat<T, S: Schedule, H: HatHooks> {
    hooks: H,
    rotor: Rotor<T, S>,
}

/// `Hat`
#[cfg(feature = "with-std")]
pub struct Hat<T, S: Schedule = Doubling, H: HatHooks = DefaultHatHooks> {
    //  Hooks of the Hat.
    hooks: H,
    //  The three directories, their occupancies, and the length.
    rotor: Rotor<T, S>,
}

/// A `Hat` on the doubling schedule: sub-block `i` holds `2^i` elements.
#[cfg(feature = "with-std")]
pub type DoublingHat<T, H = DefaultHatHooks> = Hat<T, Doubling, H>;

/// A `Hat` on the doubling schedule: sub-block `i` holds `2^i` elements.
#[cfg(not(feature = "with-std"))]
pub type DoublingHat<T, H> = Hat<T, Doubling, H>;

/// A `Hat` on the constant schedule: every sub-block holds `2^S` elements.
#[cfg(feature = "with-std")]
pub type FixedHat<T, const S: u32, H = DefaultHatHooks> = Hat<T, Fixed<S>, H>;

/// A `Hat` on the constant schedule: every sub-block holds `2^S` elements.
#[cfg(not(feature = "with-std"))]
pub type FixedHat<T, const S: u32, H> = Hat<T, Fixed<S>, H>;

impl<T, S: Schedule, H: HatHooks + Default> Hat<T, S, H> {
    /// Creates a new instance of the `Hat`.
    ///
    /// The three directories are allocated eagerly, so that the first push
    /// allocates nothing but its sub-block; no element storage is allocated.
    ///
    /// #   Panics
    ///
    /// Panics if `T` is zero-sized, or if the directories cannot be
    /// allocated.
    ///
    /// #   Example
    ///
    /// ```
    /// #   use hatvec::hat::DoublingHat;
    /// let hat: DoublingHat<i32> = DoublingHat::new();
    ///
    /// assert_eq!(0, hat.len());
    /// assert_eq!(0, hat.capacity());
    /// ```
    pub fn new() -> Self {
        Self::try_new().unwrap_or_else(|failure| panic_from_failure(failure))
    }

    /// Creates a new instance of the `Hat`.
    ///
    /// Calling this method is equivalent to calling `new`, with the
    /// directory allocation failure returned rather than panicking.
    ///
    /// #   Panics
    ///
    /// Panics if `T` is zero-sized.
    ///
    /// #   Errors
    ///
    /// Returns an error if a directory cannot be allocated.
    pub fn try_new() -> Result<Self> {
        Self::try_with_hooks(H::default())
    }
}

impl<T, S: Schedule, H: HatHooks> Hat<T, S, H> {
    /// Creates a new instance of the `Hat` with the supplied hooks.
    ///
    /// #   Panics
    ///
    /// Panics if `T` is zero-sized, or if the directories cannot be
    /// allocated.
    ///
    /// #   Example
    ///
    /// ```
    /// #   use hatvec::hat::{DefaultHatHooks, DoublingHat};
    /// let hat: DoublingHat<i32> = DoublingHat::with_hooks(DefaultHatHooks::default());
    ///
    /// assert_eq!(0, hat.len());
    /// ```
    pub fn with_hooks(hooks: H) -> Self {
        Self::try_with_hooks(hooks).unwrap_or_else(|failure| panic_from_failure(failure))
    }

    /// Creates a new instance of the `Hat` with the supplied hooks.
    ///
    /// #   Panics
    ///
    /// Panics if `T` is zero-sized.
    ///
    /// #   Errors
    ///
    /// Returns an error if a directory cannot be allocated.
    pub fn try_with_hooks(hooks: H) -> Result<Self> {
        let mut rotor = Rotor::new();
        rotor.bootstrap(&hooks)?;

        Ok(Self { hooks, rotor })
    }

    /// Returns whether the instance contains any element, or not.
    ///
    /// #   Example
    ///
    /// ```
    /// #   use hatvec::hat::DoublingHat;
    /// let mut hat: DoublingHat<i32> = DoublingHat::new();
    /// assert!(hat.is_empty());
    ///
    /// hat.push(1);
    /// assert!(!hat.is_empty());
    /// ```
    pub fn is_empty(&self) -> bool {
        self.rotor.len() == 0
    }

    /// Returns the number of elements contained in the instance.
    ///
    /// #   Example
    ///
    /// ```
    /// #   use hatvec::hat::DoublingHat;
    /// let mut hat: DoublingHat<i32> = DoublingHat::new();
    /// assert_eq!(0, hat.len());
    ///
    /// hat.push(1);
    /// assert_eq!(1, hat.len());
    /// ```
    pub fn len(&self) -> usize {
        self.rotor.len()
    }

    /// Returns the index of the last element, or `None` if the instance is
    /// empty.
    ///
    /// #   Example
    ///
    /// ```
    /// #   use hatvec::hat::DoublingHat;
    /// let mut hat: DoublingHat<i32> = DoublingHat::new();
    /// assert_eq!(None, hat.high());
    ///
    /// hat.extend([1, 2, 3]);
    /// assert_eq!(Some(2), hat.high());
    /// ```
    pub fn high(&self) -> Option<usize> {
        self.len().checked_sub(1)
    }

    /// Returns the index of the first element; always 0.
    ///
    /// #   Example
    ///
    /// ```
    /// #   use hatvec::hat::DoublingHat;
    /// let hat: DoublingHat<i32> = DoublingHat::new();
    /// assert_eq!(0, hat.low());
    /// ```
    pub fn low(&self) -> usize {
        0
    }

    /// Returns the total number of elements the allocated sub-blocks can
    /// hold.
    ///
    /// #   Example
    ///
    /// ```
    /// #   use hatvec::hat::DoublingHat;
    /// let mut hat: DoublingHat<i32> = DoublingHat::new();
    ///
    /// hat.extend([1, 2, 3, 4, 5]);
    /// assert_eq!(7, hat.capacity());
    /// ```
    pub fn capacity(&self) -> usize {
        self.rotor.capacity()
    }

    /// Returns the number of allocated sub-blocks.
    ///
    /// #   Example
    ///
    /// ```
    /// #   use hatvec::hat::DoublingHat;
    /// let mut hat: DoublingHat<i32> = DoublingHat::new();
    /// assert_eq!(0, hat.number_blocks());
    ///
    /// hat.extend([1, 2, 3, 4, 5]);
    /// assert_eq!(3, hat.number_blocks());
    /// ```
    pub fn number_blocks(&self) -> usize {
        self.rotor.number_blocks()
    }

    /// Returns a reference to the ith element, if any.
    ///
    /// Two indirections: the directory, then the sub-block.
    ///
    /// #   Example
    ///
    /// ```
    /// #   use hatvec::hat::DoublingHat;
    /// let mut hat: DoublingHat<i32> = DoublingHat::new();
    /// hat.push(1);
    ///
    /// assert_eq!(Some(&1), hat.get(0));
    /// assert_eq!(None, hat.get(1));
    /// ```
    pub fn get(&self, index: usize) -> Option<&T> {
        self.rotor.get(index)
    }

    /// Returns a reference to the ith element.
    ///
    /// #   Safety
    ///
    /// -   Assumes that `index` is strictly less than `self.len()`.
    ///
    /// #   Example
    ///
    /// ```
    /// #   use hatvec::hat::DoublingHat;
    /// let mut hat: DoublingHat<i32> = DoublingHat::new();
    /// hat.push(1);
    ///
    /// assert_eq!(1, unsafe { *hat.get_unchecked(0) });
    /// ```
    pub unsafe fn get_unchecked(&self, index: usize) -> &T {
        //  Safety:
        //  -   `index` is within bounds, as per pre-condition.
        unsafe { self.rotor.get_unchecked(index) }
    }

    /// Returns a mutable reference to the ith element, if any.
    ///
    /// #   Example
    ///
    /// ```
    /// #   use hatvec::hat::DoublingHat;
    /// let mut hat: DoublingHat<i32> = DoublingHat::new();
    /// hat.push(1);
    ///
    /// if let Some(e) = hat.get_mut(0) {
    ///     *e = 3;
    /// }
    /// assert_eq!(3, hat[0]);
    /// ```
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.rotor.get_mut(index)
    }

    /// Returns a mutable reference to the ith element.
    ///
    /// #   Safety
    ///
    /// -   Assumes that `index` is strictly less than `self.len()`.
    ///
    /// #   Example
    ///
    /// ```
    /// #   use hatvec::hat::DoublingHat;
    /// let mut hat: DoublingHat<i32> = DoublingHat::new();
    /// hat.push(1);
    ///
    /// unsafe { *hat.get_unchecked_mut(0) = 3 };
    /// assert_eq!(3, hat[0]);
    /// ```
    pub unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T {
        //  Safety:
        //  -   `index` is within bounds, as per pre-condition.
        unsafe { self.rotor.get_unchecked_mut(index) }
    }

    /// Replaces the ith element, dropping the previous value.
    ///
    /// #   Errors
    ///
    /// Returns `OutOfBounds` if `index` is not strictly less than
    /// `self.len()`, leaving the instance unchanged.
    ///
    /// #   Example
    ///
    /// ```
    /// #   use hatvec::failure::Failure;
    /// #   use hatvec::hat::DoublingHat;
    /// let mut hat: DoublingHat<i32> = DoublingHat::new();
    /// hat.push(1);
    ///
    /// assert_eq!(Ok(()), hat.try_set(0, 3));
    /// assert_eq!(Err(Failure::OutOfBounds), hat.try_set(1, 4));
    /// assert_eq!(Some(&3), hat.get(0));
    /// ```
    pub fn try_set(&mut self, index: usize, element: T) -> Result<()> {
        if let Some(slot) = self.rotor.get_mut(index) {
            *slot = element;
            Ok(())
        } else {
            Err(Failure::OutOfBounds)
        }
    }

    /// Replaces the ith element, dropping the previous value.
    ///
    /// Calling this method is equivalent to calling `try_set` and panicking
    /// on error.
    ///
    /// #   Panics
    ///
    /// Panics if `index` is not strictly less than `self.len()`.
    ///
    /// #   Example
    ///
    /// ```
    /// #   use hatvec::hat::DoublingHat;
    /// let mut hat: DoublingHat<i32> = DoublingHat::new();
    /// hat.push(1);
    ///
    /// hat.set(0, 3);
    /// assert_eq!(Some(&3), hat.get(0));
    /// ```
    pub fn set(&mut self, index: usize, element: T) {
        self.try_set(index, element).unwrap_or_else(|failure| panic_from_failure(failure));
    }

    /// Appends an element to the back.
    ///
    /// Worst-case constant time: at most one sub-block and one directory are
    /// allocated, and at most two directory entries are mirrored.
    ///
    /// #   Errors
    ///
    /// Returns an error if the allocator fails to provide memory; the
    /// instance is left unchanged.
    ///
    /// #   Example
    ///
    /// ```
    /// #   use hatvec::hat::DoublingHat;
    /// let mut hat: DoublingHat<i32> = DoublingHat::new();
    /// assert_eq!(Ok(()), hat.try_push(3));
    /// assert_eq!(3, hat[0]);
    /// ```
    pub fn try_push(&mut self, value: T) -> Result<()> {
        self.rotor.try_push(value, &self.hooks)
    }

    /// Appends an element to the back.
    ///
    /// Calling this method is equivalent to calling `try_push` and panicking
    /// on error.
    ///
    /// #   Panics
    ///
    /// Panics if the value cannot be pushed.
    ///
    /// #   Example
    ///
    /// ```
    /// #   use hatvec::hat::DoublingHat;
    /// let mut hat: DoublingHat<i32> = DoublingHat::new();
    /// hat.push(3);
    /// assert_eq!(3, hat[0]);
    /// ```
    pub fn push(&mut self, value: T) {
        self.try_push(value).unwrap_or_else(|failure| panic_from_failure(failure));
    }

    /// Removes the last element and returns it.
    ///
    /// Worst-case constant time: at most one directory is allocated, and at
    /// most one sub-block and one directory are freed.
    ///
    /// #   Errors
    ///
    /// Returns `OutOfBounds` if the instance is empty, and `OutOfMemory` if
    /// the shrinking rotation cannot allocate its fresh directory; the
    /// instance is left unchanged in both cases.
    ///
    /// #   Example
    ///
    /// ```
    /// #   use hatvec::failure::Failure;
    /// #   use hatvec::hat::DoublingHat;
    /// let mut hat: DoublingHat<i32> = DoublingHat::new();
    /// hat.push(3);
    ///
    /// assert_eq!(Ok(3), hat.try_pop());
    /// assert_eq!(Err(Failure::OutOfBounds), hat.try_pop());
    /// ```
    pub fn try_pop(&mut self) -> Result<T> {
        self.rotor.try_pop(&self.hooks)
    }

    /// Removes the last element and returns it, or `None` if the instance is
    /// empty.
    ///
    /// #   Panics
    ///
    /// Panics if the shrinking rotation cannot allocate its fresh directory.
    ///
    /// #   Example
    ///
    /// ```
    /// #   use hatvec::hat::DoublingHat;
    /// let mut hat: DoublingHat<i32> = DoublingHat::new();
    /// hat.push(3);
    ///
    /// assert_eq!(Some(3), hat.pop());
    /// assert_eq!(None, hat.pop());
    /// ```
    pub fn pop(&mut self) -> Option<T> {
        match self.try_pop() {
            Ok(value) => Some(value),
            Err(Failure::OutOfBounds) => None,
            Err(failure) => panic_from_failure(failure),
        }
    }

    /// Appends multiple elements to the back.
    ///
    /// #   Errors
    ///
    /// Returns an error if any of the values cannot be pushed; the values
    /// already pushed remain.
    ///
    /// #   Example
    ///
    /// ```
    /// #   use hatvec::hat::DoublingHat;
    /// let mut hat: DoublingHat<i32> = DoublingHat::new();
    /// assert_eq!(Ok(()), hat.try_extend([1, 2, 3]));
    /// assert_eq!(3, hat.len());
    /// ```
    pub fn try_extend<C>(&mut self, collection: C) -> Result<()>
    where
        C: IntoIterator<Item = T>,
    {
        for value in collection {
            self.try_push(value)?;
        }

        Ok(())
    }

    /// Appends multiple elements to the back.
    ///
    /// Calling this method is equivalent to calling `try_extend` and
    /// panicking on error.
    ///
    /// #   Panics
    ///
    /// Panics if any of the values cannot be pushed.
    ///
    /// #   Example
    ///
    /// ```
    /// #   use hatvec::hat::DoublingHat;
    /// let mut hat: DoublingHat<i32> = DoublingHat::new();
    /// hat.extend([1, 2, 3]);
    /// assert_eq!(3, hat.len());
    /// ```
    pub fn extend<C>(&mut self, collection: C)
    where
        C: IntoIterator<Item = T>,
    {
        self.try_extend(collection).unwrap_or_else(|failure| panic_from_failure(failure));
    }

    /// Clears the instance, releasing all memory.
    ///
    /// Every element is dropped exactly once, every sub-block and the three
    /// directories are deallocated. Idempotent; the instance is reusable,
    /// the next push re-allocating the directories.
    ///
    /// #   Example
    ///
    /// ```
    /// #   use hatvec::hat::DoublingHat;
    /// let mut hat: DoublingHat<i32> = DoublingHat::new();
    /// hat.extend([1, 2, 3]);
    ///
    /// hat.clear();
    /// assert_eq!(0, hat.len());
    /// assert_eq!(0, hat.capacity());
    ///
    /// hat.push(4);
    /// assert_eq!(Some(&4), hat.get(0));
    /// ```
    pub fn clear(&mut self) {
        self.rotor.clear(&self.hooks);
    }

    /// Invokes `fun` on every element in index order, in place.
    ///
    /// The elements are visited sub-block by sub-block: one directory lookup
    /// per sub-block, not per element.
    ///
    /// #   Example
    ///
    /// ```
    /// #   use hatvec::hat::DoublingHat;
    /// let mut hat: DoublingHat<i32> = DoublingHat::new();
    /// hat.extend([1, 2, 3]);
    ///
    /// hat.apply(|e| *e *= 2);
    ///
    /// assert_eq!(Some(&2), hat.get(0));
    /// assert_eq!(Some(&4), hat.get(1));
    /// assert_eq!(Some(&6), hat.get(2));
    /// ```
    pub fn apply<F>(&mut self, mut fun: F)
    where
        F: FnMut(&mut T),
    {
        let live = self.rotor.live_blocks();

        for block in 0..live {
            for element in self.rotor.initialized_block_mut(BlockIndex(block)) {
                fun(element);
            }
        }
    }

    /// Returns an iterator over the elements, in index order.
    ///
    /// The iterator performs one directory lookup per sub-block, caching the
    /// sub-block in between.
    ///
    /// #   Example
    ///
    /// ```
    /// #   use hatvec::hat::DoublingHat;
    /// let mut hat: DoublingHat<i32> = DoublingHat::new();
    /// hat.extend([1, 2, 3]);
    ///
    /// assert_eq!(6, hat.iter().fold(0, |acc, e| acc + *e));
    /// ```
    pub fn iter(&self) -> Iter<'_, T, S> {
        Iter::create(&self.rotor)
    }

    /// Returns an iterator over the sub-blocks, yielding slices.
    ///
    /// In general, this iterator should be used when performance dictates
    /// it, otherwise the element-wise iterator is more convenient.
    ///
    /// #   Example
    ///
    /// ```
    /// #   use hatvec::hat::DoublingHat;
    /// let mut hat: DoublingHat<i32> = DoublingHat::new();
    /// hat.extend([1, 2, 3, 4, 5]);
    ///
    /// let mut blocks = hat.blocks();
    ///
    /// assert_eq!(Some(&[1][..]), blocks.next());
    /// assert_eq!(Some(&[2, 3][..]), blocks.next());
    /// assert_eq!(Some(&[4, 5][..]), blocks.next());
    /// assert_eq!(None, blocks.next());
    /// ```
    pub fn blocks(&self) -> Blocks<'_, T, S> {
        Blocks::create(&self.rotor)
    }

    //  Checks every structural invariant; test builds only.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        self.rotor.check_invariants();
    }
}

/// A `Hat<T>` can be `Send` across threads whenever `T` can.
///
/// #   Example of Send.
///
/// ```
/// # use hatvec::hat::DoublingHat;
/// fn ensure_send<T: Send>(_: T) {}
///
/// let mut hat: DoublingHat<String> = DoublingHat::new();
/// hat.push("Hello".to_string());
///
/// ensure_send(hat);
/// ```
///
/// #   Example of not Send.
///
/// ```compile_fail
/// # use std::rc::Rc;
/// # use hatvec::hat::DoublingHat;
/// fn ensure_send<T: Send>(_: T) {}
///
/// let mut hat: DoublingHat<Rc<i32>> = DoublingHat::new();
/// hat.push(Rc::new(3));
///
/// ensure_send(hat);
/// ```
unsafe impl<T: Send, S: Schedule, H: HatHooks + Send> Send for Hat<T, S, H> {}

/// A `Hat<T>` can be shared across threads whenever `&[T]` can.
///
/// #   Example of Sync.
///
/// ```
/// # use hatvec::hat::DoublingHat;
/// fn ensure_sync<T: Sync>(_: T) {}
///
/// let mut hat: DoublingHat<String> = DoublingHat::new();
/// hat.push("Hello".to_string());
///
/// ensure_sync(&hat);
/// ```
///
/// #   Example of not Sync.
///
/// ```compile_fail
/// # use std::rc::Rc;
/// # use hatvec::hat::DoublingHat;
/// fn ensure_sync<T: Sync>(_: T) {}
///
/// let mut hat: DoublingHat<Rc<i32>> = DoublingHat::new();
/// hat.push(Rc::new(3));
///
/// ensure_sync(&hat);
/// ```
unsafe impl<T: Sync, S: Schedule, H: HatHooks + Sync> Sync for Hat<T, S, H> {}

impl<T, S: Schedule, H: HatHooks> Drop for Hat<T, S, H> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T, S: Schedule, H: HatHooks + Default> Default for Hat<T, S, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, S: Schedule, H: HatHooks + Clone> Clone for Hat<T, S, H> {
    fn clone(&self) -> Self {
        let mut result =
            Self::try_with_hooks(self.hooks.clone()).unwrap_or_else(|failure| panic_from_failure(failure));

        for value in self.iter() {
            result.push(value.clone());
        }

        result
    }

    fn clone_from(&mut self, source: &Self) {
        self.clear();

        for value in source.iter() {
            self.push(value.clone());
        }
    }
}

impl<T: fmt::Debug, S: Schedule, H: HatHooks> fmt::Debug for Hat<T, S, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hat {{ length: {}, blocks: [", self.len())?;

        for (index, block) in self.blocks().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?}", block)?;
        }

        write!(f, "] }}")
    }
}

impl<T: PartialEq, S: Schedule, H: HatHooks> PartialEq for Hat<T, S, H> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq, S: Schedule, H: HatHooks> Eq for Hat<T, S, H> {}

impl<T, S: Schedule, H: HatHooks> ops::Index<usize> for Hat<T, S, H> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        self.get(index).expect("Valid index")
    }
}

impl<T, S: Schedule, H: HatHooks> ops::IndexMut<usize> for Hat<T, S, H> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        self.get_mut(index).expect("Valid index")
    }
}

impl<T, S: Schedule, H: HatHooks + Default> iter::FromIterator<T> for Hat<T, S, H> {
    fn from_iter<C>(collection: C) -> Self
    where
        C: IntoIterator<Item = T>,
    {
        let mut result: Hat<T, S, H> = Hat::new();
        result.extend(collection);
        result
    }
}

impl<'a, T, S: Schedule, H: HatHooks> iter::IntoIterator for &'a Hat<T, S, H> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, S>;

    fn into_iter(self) -> Iter<'a, T, S> {
        self.iter()
    }
}

#[cold]
#[inline(never)]
fn panic_from_failure(failure: Failure) -> ! {
    panic!("{}", failure);
}

//  mod tests
