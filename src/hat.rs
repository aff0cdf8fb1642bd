//! #   The Hat.
//!
//! The `Hat` is a growable indexed sequence supporting end-insertion,
//! end-removal and random access, all in worst-case constant time.
//!
//! ##  Under the covers.
//!
//! Under the covers the `Hat` stores its elements in separately allocated
//! sub-blocks, reached through a directory of pointers. Three directories
//! actually exist at any time, forming a rotor:
//!
//! -   `mid`, the working directory, which owns the sub-blocks.
//! -   `high`, twice as large, into which `mid` entries are mirrored ahead
//!     of growth.
//! -   `low`, half as large, into which `mid` entries are mirrored ahead of
//!     shrinkage.
//!
//! Whenever the working directory fills up (or empties down to half), the
//! rotor rotates: the pre-mirrored directory becomes the new working
//! directory, and a fresh one is allocated on the far side. Since each
//! mutating operation mirrors at most two entries, the mirror is always
//! complete when a rotation fires, and no operation ever copies more than a
//! constant number of pointers. Elements themselves never move.
//!
//! The main consequences are:
//!
//! -   `push` and `pop` never exhibit the latency spike of a reallocating
//!     vector.
//! -   Every access pays two indirections: directory, then sub-block.
//!
//! #   Example: basic
//!
//! ```
//! use hatvec::hat::DoublingHat;
//!
//! let mut hat: DoublingHat<i32> = DoublingHat::new();
//! hat.push(1);
//! hat.push(2);
//! hat.push(3);
//!
//! assert_eq!(3, hat.len());
//! assert_eq!(Some(&2), hat.get(1));
//! assert_eq!(Some(3), hat.pop());
//! ```
//!
//! #   Example: choosing a schedule
//!
//! The size of the i-th sub-block is dictated by the schedule:
//!
//! -   `Doubling` grows sub-blocks geometrically, mirroring the capacity
//!     curve of a doubling vector.
//! -   `Fixed<S>` uses a constant `2^S` elements per sub-block, trading a
//!     cheaper address computation (shift and mask) for a denser directory.
//!
//! ```
//! use hatvec::hat::FixedHat;
//!
//! let mut hat: FixedHat<i32, 4> = FixedHat::new();
//! hat.extend(0..100);
//!
//! assert_eq!(100, hat.len());
//! assert_eq!(Some(&99), hat.get(99));
//! ```
//!
//! #   Example: faillible operations
//!
//! Every allocating or index-checked operation has a `try_` form returning
//! the cause of failure; the container is left untouched on error.
//!
//! ```
//! use hatvec::failure::Failure;
//! use hatvec::hat::DoublingHat;
//!
//! let mut hat: DoublingHat<i32> = DoublingHat::new();
//!
//! assert_eq!(Err(Failure::OutOfBounds), hat.try_set(0, 42));
//! assert_eq!(Ok(()), hat.try_push(42));
//! assert_eq!(Ok(()), hat.try_set(0, 7));
//! assert_eq!(Some(&7), hat.get(0));
//! ```

mod hat;
mod hooks;
mod iter;
mod rotor;
mod schedule;
mod storage;

pub use self::hat::{DoublingHat, FixedHat, Hat};
pub use self::hooks::HatHooks;
pub use self::iter::{Blocks, Iter};
pub use self::schedule::{BlockCapacity, BlockIndex, Doubling, ElementIndex, Fixed, NumberBlocks, Schedule, SlotIndex};

#[cfg(feature = "with-std")]
pub use self::hooks::DefaultHatHooks;

use super::allocator;
use super::failure;
use super::root;
