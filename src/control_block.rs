//! Strong/weak counter pair shared by `SharedPointer` and `WeakPointer`.
//!
//! The block is allocated once per managed value and never owned by a
//! single handle. Both pointer types manipulate the counters directly
//! through the crate-private helpers below; nothing outside the crate can
//! observe or change them except through the pointers' query methods.

use core::cell::Cell;
use core::ptr::NonNull;

#[cfg(test)]
thread_local! {
    static LIVE_BLOCKS: Cell<usize> = const { Cell::new(0) };
}

/// Number of control blocks currently allocated on this thread (tests only).
#[cfg(test)]
pub(crate) fn live_blocks() -> usize {
    LIVE_BLOCKS.with(|c| c.get())
}

#[derive(Debug)]
pub(crate) struct ControlBlock {
    strong: Cell<usize>,
    // Live weak handles plus one unit held by the strong side until the
    // last strong handle is released.
    weak: Cell<usize>,
}

impl ControlBlock {
    pub(crate) fn new() -> Self {
        Self {
            strong: Cell::new(1),
            weak: Cell::new(1),
        }
    }

    /// Box a fresh block (`strong = 1, weak = 1`) and leak it as a raw pointer.
    pub(crate) fn allocate() -> NonNull<ControlBlock> {
        let block = NonNull::from(Box::leak(Box::new(ControlBlock::new())));
        #[cfg(test)]
        LIVE_BLOCKS.with(|c| c.set(c.get() + 1));
        log::trace!("control block allocated at {:p}", block);
        block
    }

    /// Free a block previously returned by `allocate`.
    ///
    /// Safety: `block` must come from `allocate`, both counters must be zero,
    /// and no handle may touch it afterwards.
    pub(crate) unsafe fn free(block: NonNull<ControlBlock>) {
        debug_assert_eq!(block.as_ref().strong(), 0);
        debug_assert_eq!(block.as_ref().weak(), 0);
        log::trace!("control block freed at {:p}", block);
        drop(Box::from_raw(block.as_ptr()));
        #[cfg(test)]
        LIVE_BLOCKS.with(|c| c.set(c.get() - 1));
    }

    #[inline]
    pub(crate) fn strong(&self) -> usize {
        self.strong.get()
    }

    #[inline]
    pub(crate) fn weak(&self) -> usize {
        self.weak.get()
    }

    #[inline]
    pub(crate) fn inc_strong(&self) {
        self.strong.set(checked_inc(self.strong.get()));
    }

    /// Returns the count after decrementing.
    #[inline]
    pub(crate) fn dec_strong(&self) -> usize {
        let c = self.strong.get();
        assert!(c > 0, "strong count underflow");
        self.strong.set(c - 1);
        c - 1
    }

    #[inline]
    pub(crate) fn inc_weak(&self) {
        self.weak.set(checked_inc(self.weak.get()));
    }

    /// Returns the count after decrementing.
    #[inline]
    pub(crate) fn dec_weak(&self) -> usize {
        let c = self.weak.get();
        assert!(c > 0, "weak count underflow");
        self.weak.set(c - 1);
        c - 1
    }

    /// Weak handles currently observing the value, excluding the unit held
    /// by the strong side.
    #[inline]
    pub(crate) fn weak_handles(&self) -> usize {
        if self.strong() > 0 {
            self.weak() - 1
        } else {
            self.weak()
        }
    }
}

#[inline]
fn checked_inc(c: usize) -> usize {
    let n = c.wrapping_add(1);
    if n == 0 {
        // Same policy as `Rc`: overflowing a count is unrecoverable.
        std::process::abort();
    }
    n
}
