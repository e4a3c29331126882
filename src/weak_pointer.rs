//! WeakPointer: non-owning observer of a `SharedPointer` value.

use crate::control_block::ControlBlock;
use crate::error::PointerError;
use crate::shared_pointer::SharedPointer;
use core::fmt;
use core::marker::PhantomData;
use core::ptr::NonNull;

/// Observes a value without keeping it alive. Holds the control block so
/// expiry can still be queried after the value is gone.
pub struct WeakPointer<T: ?Sized> {
    pub(crate) ptr: Option<NonNull<T>>,
    pub(crate) block: Option<NonNull<ControlBlock>>,
    _marker: PhantomData<*const T>,
}

impl<T: ?Sized> WeakPointer<T> {
    /// An empty, already expired handle.
    pub const fn new() -> Self {
        Self {
            ptr: None,
            block: None,
            _marker: PhantomData,
        }
    }

    #[inline]
    fn control(&self) -> Option<&ControlBlock> {
        // Safety: every weak handle holds one weak unit on its block.
        self.block.map(|b| unsafe { &*b.as_ptr() })
    }

    /// True if there is no control block or no strong handle remains.
    pub fn is_expired(&self) -> bool {
        self.control().map_or(true, |cb| cb.strong() == 0)
    }

    /// Promote to a strong handle; empty if expired.
    pub fn lock(&self) -> SharedPointer<T> {
        SharedPointer::from(self)
    }

    /// Like [`lock`](Self::lock) but reports expiry as an error.
    pub fn upgrade(&self) -> Result<SharedPointer<T>, PointerError> {
        if self.is_expired() {
            return Err(PointerError::Expired);
        }
        Ok(self.lock())
    }

    pub fn use_count(&self) -> usize {
        self.control().map_or(0, ControlBlock::strong)
    }

    pub fn weak_count(&self) -> usize {
        self.control().map_or(0, ControlBlock::weak_handles)
    }

    pub fn take(&mut self) -> Self {
        core::mem::take(self)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.block == other.block
    }

    fn release(&mut self) {
        self.ptr = None;
        let Some(block) = self.block.take() else {
            return;
        };
        // Safety: this handle's weak unit kept the block alive until now.
        let cb = unsafe { block.as_ref() };
        if cb.dec_weak() == 0 && cb.strong() == 0 {
            // Safety: no strong or weak handle remains.
            unsafe { ControlBlock::free(block) };
        }
    }
}

impl<T: ?Sized> From<&SharedPointer<T>> for WeakPointer<T> {
    fn from(shared: &SharedPointer<T>) -> Self {
        if let Some(block) = shared.block {
            // Safety: the shared handle keeps its block alive.
            unsafe { block.as_ref() }.inc_weak();
        }
        Self {
            ptr: shared.ptr,
            block: shared.block,
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized> Default for WeakPointer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Clone for WeakPointer<T> {
    fn clone(&self) -> Self {
        if let Some(cb) = self.control() {
            cb.inc_weak();
        }
        Self {
            ptr: self.ptr,
            block: self.block,
            _marker: PhantomData,
        }
    }

    fn clone_from(&mut self, source: &Self) {
        if self.ptr_eq(source) {
            return;
        }
        self.release();
        *self = source.clone();
    }
}

impl<T: ?Sized> Drop for WeakPointer<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: ?Sized> fmt::Debug for WeakPointer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakPointer")
            .field("expired", &self.is_expired())
            .field("use_count", &self.use_count())
            .finish()
    }
}
