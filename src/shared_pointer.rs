//! SharedPointer: counted shared ownership of one heap value.
//!
//! The value and its control block are separate allocations. Every handle
//! stores both pointers; the value is destroyed as soon as the strong
//! count reaches zero, while the control block stays alive for any weak
//! handles still observing it.

use crate::control_block::ControlBlock;
use crate::error::PointerError;
use crate::weak_pointer::WeakPointer;
use core::any::type_name;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use core::ops::Deref;
use core::ptr::NonNull;

/// Shared-ownership handle. Cloning increments the strong count; dropping
/// the last clone destroys the value.
///
/// Cycles of `SharedPointer`s are never collected. Break rings with
/// [`WeakPointer`] edges.
pub struct SharedPointer<T: ?Sized> {
    pub(crate) ptr: Option<NonNull<T>>,
    pub(crate) block: Option<NonNull<ControlBlock>>,
    // Owns a T for drop-check purposes; NonNull already keeps this !Send/!Sync.
    _owns: PhantomData<T>,
}

impl<T> SharedPointer<T> {
    /// Take ownership of `value` with a fresh control block (`use_count() == 1`).
    pub fn new(value: T) -> Self {
        Self::from(Box::new(value))
    }

    /// Raw address of the value, null when empty.
    pub fn as_ptr(&self) -> *const T {
        match self.ptr {
            Some(p) => p.as_ptr(),
            None => core::ptr::null(),
        }
    }
}

impl<T: ?Sized> SharedPointer<T> {
    /// An empty pointer: no value, no control block.
    pub const fn null() -> Self {
        Self {
            ptr: None,
            block: None,
            _owns: PhantomData,
        }
    }

    pub(crate) fn from_parts(ptr: Option<NonNull<T>>, block: Option<NonNull<ControlBlock>>) -> Self {
        Self {
            ptr,
            block,
            _owns: PhantomData,
        }
    }

    #[inline]
    fn control(&self) -> Option<&ControlBlock> {
        // Safety: a non-empty handle keeps its block alive.
        self.block.map(|b| unsafe { &*b.as_ptr() })
    }

    pub fn is_null(&self) -> bool {
        self.ptr.is_none()
    }

    /// Address of the value for any `T`, including trait objects and slices.
    pub fn as_non_null(&self) -> Option<NonNull<T>> {
        self.ptr
    }

    /// Number of strong handles sharing the value; 0 when empty.
    pub fn use_count(&self) -> usize {
        self.control().map_or(0, ControlBlock::strong)
    }

    /// Number of weak handles observing the value; 0 when empty.
    pub fn weak_count(&self) -> usize {
        self.control().map_or(0, ControlBlock::weak_handles)
    }

    pub fn get(&self) -> Option<&T> {
        // Safety: strong >= 1 while this handle holds the value.
        self.ptr.map(|p| unsafe { &*p.as_ptr() })
    }

    pub fn try_get(&self) -> Result<&T, PointerError> {
        self.get().ok_or(PointerError::Empty)
    }

    /// Mutable access when this is the only strong handle and no weak
    /// handle could promote itself behind our back.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        let unique = self
            .control()
            .is_some_and(|cb| cb.strong() == 1 && cb.weak_handles() == 0);
        if !unique {
            return None;
        }
        // Safety: sole owner and no observers, and `&mut self` is exclusive.
        self.ptr.map(|p| unsafe { &mut *p.as_ptr() })
    }

    /// Move the current state out, leaving this handle empty.
    pub fn take(&mut self) -> Self {
        core::mem::take(self)
    }

    /// Create a weak handle observing the same value.
    pub fn downgrade(&self) -> WeakPointer<T> {
        WeakPointer::from(self)
    }

    /// True when both handles share one control block (or are both empty).
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.block == other.block
    }

    // Drop one strong unit. At zero the value is destroyed, then the strong
    // side gives back its weak unit; the block goes when that hits zero too.
    fn release(&mut self) {
        let value = self.ptr.take();
        let Some(block) = self.block.take() else {
            return;
        };
        // Safety: the block outlives every handle that still references it.
        let cb = unsafe { block.as_ref() };
        if cb.dec_strong() != 0 {
            return;
        }
        if let Some(value) = value {
            log::trace!("destroying shared {}", type_name::<T>());
            // Safety: allocated via Box in `From<Box<T>>`; strong hit zero so
            // no other strong handle can reach it.
            unsafe { drop(Box::from_raw(value.as_ptr())) };
        }
        if cb.dec_weak() == 0 {
            // Safety: both counts are zero; no handle references the block.
            unsafe { ControlBlock::free(block) };
        }
    }
}

impl<T: ?Sized> From<Box<T>> for SharedPointer<T> {
    fn from(value: Box<T>) -> Self {
        Self::from_parts(
            Some(NonNull::from(Box::leak(value))),
            Some(ControlBlock::allocate()),
        )
    }
}

/// Promotion: empty if the weak handle has expired.
impl<T: ?Sized> From<&WeakPointer<T>> for SharedPointer<T> {
    fn from(weak: &WeakPointer<T>) -> Self {
        if weak.is_expired() {
            return Self::null();
        }
        if let Some(block) = weak.block {
            // Safety: a weak handle keeps its block alive.
            unsafe { block.as_ref() }.inc_strong();
        }
        Self::from_parts(weak.ptr, weak.block)
    }
}

impl<T: ?Sized> Default for SharedPointer<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: ?Sized> Clone for SharedPointer<T> {
    fn clone(&self) -> Self {
        if let Some(cb) = self.control() {
            cb.inc_strong();
        }
        Self::from_parts(self.ptr, self.block)
    }

    fn clone_from(&mut self, source: &Self) {
        if self.ptr_eq(source) {
            return;
        }
        self.release();
        *self = source.clone();
    }
}

impl<T: ?Sized> Drop for SharedPointer<T> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Panics with [`PointerError::Empty`] when the pointer is empty.
impl<T: ?Sized> Deref for SharedPointer<T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self.try_get() {
            Ok(v) => v,
            Err(e) => panic!("{e}"),
        }
    }
}

impl<T: ?Sized> PartialEq for SharedPointer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T: ?Sized> Eq for SharedPointer<T> {}

impl<T: ?Sized> Hash for SharedPointer<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.block.map(|b| b.as_ptr() as usize).hash(state);
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for SharedPointer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedPointer")
            .field("value", &self.get())
            .field("use_count", &self.use_count())
            .field("weak_count", &self.weak_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::SharedPointer;
    use crate::control_block::live_blocks;
    use crate::drop_probe::{counter, DropProbe};
    use crate::PointerError;

    #[test]
    fn construct_copy_move_assign() {
        let sp1 = SharedPointer::new(10);
        assert_eq!(*sp1, 10);
        assert_eq!(sp1.use_count(), 1);

        let mut sp2 = sp1.clone();
        assert_eq!(sp1.use_count(), 2);
        assert_eq!(sp2.use_count(), 2);
        assert_eq!(*sp2, 10);

        let mut sp3 = sp2.take();
        assert_eq!(sp1.use_count(), 2);
        assert_eq!(sp2.use_count(), 0);
        assert_eq!(sp3.use_count(), 2);
        assert_eq!(*sp3, 10);
        assert!(sp2.as_ptr().is_null());

        let mut sp4: SharedPointer<i32> = SharedPointer::null();
        sp4.clone_from(&sp1);
        assert_eq!(sp1.use_count(), 3);
        assert_eq!(sp4.use_count(), 3);
        assert_eq!(*sp4, 10);

        let mut sp5: SharedPointer<i32> = SharedPointer::null();
        assert!(sp5.is_null());
        sp5 = sp3.take();
        assert_eq!(sp1.use_count(), 3);
        assert_eq!(sp3.use_count(), 0);
        assert_eq!(sp5.use_count(), 3);
        assert_eq!(*sp5, 10);
        assert!(sp3.as_ptr().is_null());
    }

    #[test]
    fn member_access_through_deref() {
        struct Payload {
            data: i32,
        }
        impl Payload {
            fn doubled(&self) -> i32 {
                self.data * 2
            }
        }

        let sp = SharedPointer::new(Payload { data: 172 });
        assert_eq!((*sp).data, 172);
        assert_eq!(sp.data, 172);
        assert_eq!(sp.doubled(), 344);
    }

    #[test]
    fn last_drop_destroys_value_and_block() {
        let drops = counter();
        let blocks = live_blocks();
        {
            let a = SharedPointer::new(DropProbe::new(1, &drops));
            assert_eq!(live_blocks(), blocks + 1);
            let b = a.clone();
            drop(a);
            assert_eq!(b.use_count(), 1);
            assert_eq!(drops.get(), 0);
        }
        assert_eq!(drops.get(), 1);
        assert_eq!(live_blocks(), blocks);
    }

    #[test]
    fn empty_pointer_reports_zero() {
        let sp: SharedPointer<i32> = SharedPointer::default();
        assert!(sp.get().is_none());
        assert!(sp.as_ptr().is_null());
        assert_eq!(sp.use_count(), 0);
        assert_eq!(sp.weak_count(), 0);
        assert_eq!(sp.try_get(), Err(PointerError::Empty));
    }

    #[test]
    #[should_panic(expected = "dereferenced an empty pointer")]
    fn deref_of_empty_panics() {
        let sp: SharedPointer<i32> = SharedPointer::null();
        let _v: i32 = *sp;
    }

    #[test]
    fn self_assignment_keeps_count() {
        let a = SharedPointer::new(5);
        let mut b = a.clone();
        b.clone_from(&a);
        assert_eq!(a.use_count(), 2);
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn clone_from_releases_previous_value() {
        let drops = counter();
        let mut a = SharedPointer::new(DropProbe::new(1, &drops));
        let b = SharedPointer::new(DropProbe::new(2, &drops));
        a.clone_from(&b);
        assert_eq!(drops.get(), 1);
        assert_eq!(a.id, 2);
        assert_eq!(b.use_count(), 2);
    }

    #[test]
    fn get_mut_requires_sole_ownership() {
        let mut a = SharedPointer::new(1);
        *a.get_mut().unwrap() += 1;
        assert_eq!(*a, 2);

        let b = a.clone();
        assert!(a.get_mut().is_none());
        drop(b);

        let w = a.downgrade();
        assert!(a.get_mut().is_none());
        drop(w);
        assert!(a.get_mut().is_some());
    }

    #[test]
    fn holds_unsized_values() {
        let s: SharedPointer<str> = SharedPointer::from(Box::<str>::from("pattern"));
        let t = s.clone();
        assert_eq!(&*t, "pattern");
        assert_eq!(s.use_count(), 2);

        let f: Box<dyn Fn(i32) -> i32> = Box::new(|x: i32| x + 1);
        let d: SharedPointer<dyn Fn(i32) -> i32> = SharedPointer::from(f);
        assert_eq!(d(1), 2);
        let e = d.clone();
        let addr = |p: &SharedPointer<dyn Fn(i32) -> i32>| p.as_non_null().map(|n| n.cast::<u8>());
        assert_eq!(addr(&d), addr(&e));
        assert!(SharedPointer::<dyn Fn(i32) -> i32>::null().as_non_null().is_none());
    }

    #[test]
    fn debug_shows_counts() {
        let a = SharedPointer::new(3);
        let _w = a.downgrade();
        let s = format!("{:?}", a);
        assert!(s.contains("use_count: 1"), "{s}");
        assert!(s.contains("weak_count: 1"), "{s}");
    }
}
