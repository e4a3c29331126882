//! UniquePointer: exclusive ownership without a control block.
//!
//! There is deliberately no `Clone` impl, so copying is rejected at
//! compile time:
//!
//! ```compile_fail
//! use counted_pointers::UniquePointer;
//!
//! let up = UniquePointer::new(3);
//! let copy = up.clone();
//! ```
//!
//! Ownership moves with the value, or explicitly via [`UniquePointer::take`].

use crate::error::PointerError;
use core::any::type_name;
use core::fmt;
use core::marker::PhantomData;
use core::ops::{Deref, DerefMut};
use core::ptr::NonNull;

/// Sole owner of one heap value; destroys it on drop unless released.
pub struct UniquePointer<T: ?Sized> {
    ptr: Option<NonNull<T>>,
    _owns: PhantomData<T>,
}

impl<T> UniquePointer<T> {
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

impl<T: ?Sized> UniquePointer<T> {
    pub const fn null() -> Self {
        Self {
            ptr: None,
            _owns: PhantomData,
        }
    }

    pub fn is_null(&self) -> bool {
        self.ptr.is_none()
    }

    /// Address of the value for any `T`, including trait objects and slices.
    pub fn as_non_null(&self) -> Option<NonNull<T>> {
        self.ptr
    }

    pub fn get(&self) -> Option<&T> {
        // Safety: the pointer is uniquely owned by `self`.
        self.ptr.map(|p| unsafe { &*p.as_ptr() })
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        // Safety: the pointer is uniquely owned and `&mut self` is exclusive.
        self.ptr.map(|p| unsafe { &mut *p.as_ptr() })
    }

    pub fn try_get(&self) -> Result<&T, PointerError> {
        self.get().ok_or(PointerError::Empty)
    }

    /// Give up ownership without destroying the value. The caller's box is
    /// now the only owner; this pointer becomes empty.
    pub fn release(&mut self) -> Option<Box<T>> {
        // Safety: every stored pointer came from `Box::leak`.
        self.ptr.take().map(|p| unsafe { Box::from_raw(p.as_ptr()) })
    }

    /// Destroy the current value (if any) and take ownership of `value`.
    pub fn reset(&mut self, value: Option<Box<T>>) {
        if let Some(old) = self.release() {
            log::trace!("destroying unique {}", type_name::<T>());
            drop(old);
        }
        self.ptr = value.map(|b| NonNull::from(Box::leak(b)));
    }

    pub fn take(&mut self) -> Self {
        core::mem::take(self)
    }
}

impl<T: ?Sized> From<Box<T>> for UniquePointer<T> {
    fn from(value: Box<T>) -> Self {
        Self {
            ptr: Some(NonNull::from(Box::leak(value))),
            _owns: PhantomData,
        }
    }
}

impl<T: ?Sized> Default for UniquePointer<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: ?Sized> Drop for UniquePointer<T> {
    fn drop(&mut self) {
        self.reset(None);
    }
}

impl<T: ?Sized> Deref for UniquePointer<T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self.try_get() {
            Ok(v) => v,
            Err(e) => panic!("{e}"),
        }
    }
}

impl<T: ?Sized> DerefMut for UniquePointer<T> {
    fn deref_mut(&mut self) -> &mut T {
        match self.get_mut() {
            Some(v) => v,
            None => panic!("{}", PointerError::Empty),
        }
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for UniquePointer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UniquePointer").field(&self.get()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::UniquePointer;
    use crate::drop_probe::{counter, DropProbe};

    #[test]
    fn construct_move_assign() {
        let mut up1 = UniquePointer::new(10);
        assert_eq!(*up1, 10);

        let mut up2 = up1.take();
        assert!(up1.as_ptr().is_null());
        assert_eq!(*up2, 10);

        let mut up3: UniquePointer<i32> = UniquePointer::null();
        assert!(up3.is_null());
        up3 = up2.take();
        assert!(up2.get().is_none());
        assert_eq!(*up3, 10);
    }

    #[test]
    fn release_hands_over_ownership() {
        let drops = counter();
        let mut up = UniquePointer::new(DropProbe::new(20, &drops));
        let raw = up.release().expect("owned value");
        assert!(up.get().is_none());
        assert_eq!(raw.id, 20);
        drop(up);
        assert_eq!(drops.get(), 0);
        drop(raw);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn reset_destroys_previous_once() {
        let drops = counter();
        let mut up = UniquePointer::new(DropProbe::new(30, &drops));
        up.reset(Some(Box::new(DropProbe::new(40, &drops))));
        assert_eq!(drops.get(), 1);
        assert_eq!(up.id, 40);
        up.reset(None);
        assert_eq!(drops.get(), 2);
        assert!(up.is_null());
        drop(up);
        assert_eq!(drops.get(), 2);
    }

    #[test]
    fn move_assignment_drops_old_value() {
        let drops = counter();
        let mut a = UniquePointer::new(DropProbe::new(1, &drops));
        let mut b = UniquePointer::new(DropProbe::new(2, &drops));
        assert_eq!(a.id, 1);
        a = b.take();
        assert_eq!(drops.get(), 1);
        assert_eq!(a.id, 2);
        assert!(b.is_null());
    }

    #[test]
    fn deref_mut_writes_through() {
        let mut up = UniquePointer::new(vec![1, 2]);
        up.push(3);
        assert_eq!(up.len(), 3);
    }

    #[test]
    #[should_panic(expected = "dereferenced an empty pointer")]
    fn deref_of_empty_panics() {
        let up: UniquePointer<i32> = UniquePointer::null();
        let _v: i32 = *up;
    }

    #[test]
    fn holds_trait_objects() {
        trait Shape {
            fn area(&self) -> u32;
        }
        struct Square(u32);
        impl Shape for Square {
            fn area(&self) -> u32 {
                self.0 * self.0
            }
        }

        let b: Box<dyn Shape> = Box::new(Square(4));
        let up: UniquePointer<dyn Shape> = UniquePointer::from(b);
        assert_eq!(up.area(), 16);
        assert!(up.as_non_null().is_some());
        let mut up = up;
        drop(up.release());
        assert!(up.as_non_null().is_none());
    }
}
