//! counted-pointers: single-threaded shared, weak and unique smart
//! pointers built over an explicit control block.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: ownership-tracking pointers with the bookkeeping spelled out, so
//!   every count transition can be reasoned about locally.
//! - Types:
//!   - SharedPointer<T>: strong handle; clones share one value and one
//!     control block.
//!   - WeakPointer<T>: observer; reports expiry and promotes to a
//!     SharedPointer while the value is alive.
//!   - UniquePointer<T>: sole owner; move-only, no control block.
//!
//! Control block protocol
//! - Allocated with `strong = 1, weak = 1`. The extra weak unit belongs to
//!   the strong side as a whole, not to any single handle.
//! - Strong release: `strong -= 1`; at zero the value is destroyed, then the
//!   strong side returns its weak unit. If that brings `weak` to zero the
//!   block is freed.
//! - Weak release: `weak -= 1`; at zero with `strong == 0` the block is freed.
//! - So the block is freed exactly once, by whichever side releases last,
//!   and weak handles can always read `strong` to decide expiry.
//!
//! Constraints
//! - Single-threaded: all handles are `!Send`/`!Sync` (no atomics).
//!   A multi-threaded variant would need atomic counters with
//!   release/acquire ordering on decrement; that is out of scope here.
//! - Count overflow aborts the process, matching `Rc`.
//! - Dereferencing an empty SharedPointer/UniquePointer panics with
//!   `PointerError::Empty`; use `get`/`try_get` to check first.
//!
//! Cycles
//! - There is no cycle collector. A ring of SharedPointers leaks; callers
//!   must use WeakPointer for back or ring edges.
//!
//! Logging
//! - Block allocation/free and value destruction are reported through the
//!   `log` facade at `trace` level. No logger is installed here.

mod control_block;
mod drop_probe;
mod error;
mod pointer_proptest;
pub mod shared_pointer;
pub mod unique_pointer;
pub mod weak_pointer;

// Public surface
pub use error::PointerError;
pub use shared_pointer::SharedPointer;
pub use unique_pointer::UniquePointer;
pub use weak_pointer::WeakPointer;
