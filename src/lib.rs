#![cfg_attr(not(feature = "with-std"), no_std)]
//  Lints
#![allow(clippy::module_inception)]

//! #   The HatVec Library
//!
//! A hashed array tree: a growable, stack-like indexed sequence in which
//! `push`, `pop`, `get` and `set` all run in worst-case constant time.
//!
//! Unlike `Vec`, growing never relocates a single element: storage is a set
//! of separately allocated sub-blocks reached through a small directory of
//! pointers, and the directory itself is kept ahead of demand by copying at
//! most two entries per mutating operation. The price is one extra pointer
//! hop on every access; the reward is the complete absence of the doubling
//! reallocation spike.
//!
//! Two block-size schedules are provided:
//!
//! -   `Doubling`: sub-block `i` holds `2^i` elements.
//! -   `Fixed<S>`: every sub-block holds `2^S` elements.

pub mod allocator;
pub mod failure;
pub mod hat;

mod utils;

#[cfg(all(test, feature = "with-std"))]
mod proptests;

use self::utils::root;
