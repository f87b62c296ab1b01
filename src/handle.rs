//! Owning and borrowing handles over the compat catalogue
//!
//! The raw catalogue returns `*mut T` for both new and borrowed references
//! and leaves the difference to documentation. [`Owned`] holds exactly one
//! reference and releases it on drop; [`Borrowed`] holds none and cannot
//! outlive the value that keeps its target alive. Accessors that return a
//! new reference produce an `Owned`, the `*_borrow` accessors a `Borrowed`.

use std::ffi::c_int;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::compat;
use crate::error::{CompatError, Result};
use crate::host::{
    CodeObject, FrameObject, InterpreterState, Object, ObjectLayout, Ssize, ThreadState,
    TypeObject, as_object, decref, refcnt,
};

/// An owned (new) reference
pub struct Owned<T: ObjectLayout> {
    ptr: NonNull<T>,
}

/// A borrowed reference, valid for `'a`
pub struct Borrowed<'a, T: ObjectLayout> {
    ptr: NonNull<T>,
    _marker: PhantomData<&'a T>,
}

impl<T: ObjectLayout> Owned<T> {
    /// Take ownership of a new reference; `None` for null
    ///
    /// # Safety
    /// `ptr` must be null or a new reference to a live object that the caller
    /// hands over.
    #[inline]
    pub unsafe fn from_new(ptr: *mut T) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Owned { ptr })
    }

    /// Acquire a new reference to a borrowed object; `None` for null
    ///
    /// # Safety
    /// `ptr` must be null or point to a live object.
    #[inline]
    pub unsafe fn from_borrowed(ptr: *mut T) -> Option<Self> {
        unsafe { Self::from_new(compat::xnew_ref(ptr)) }
    }

    #[inline]
    pub fn as_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Give up ownership without releasing the reference
    #[inline]
    pub fn into_raw(self) -> *mut T {
        let ptr = self.ptr.as_ptr();
        std::mem::forget(self);
        ptr
    }

    #[inline]
    pub fn borrow(&self) -> Borrowed<'_, T> {
        Borrowed {
            ptr: self.ptr,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn refcnt(&self) -> Ssize {
        unsafe { refcnt(self.as_ptr()) }
    }
}

impl<T: ObjectLayout> Clone for Owned<T> {
    fn clone(&self) -> Self {
        Owned {
            ptr: unsafe { NonNull::new_unchecked(compat::new_ref(self.as_ptr())) },
        }
    }
}

impl<T: ObjectLayout> Drop for Owned<T> {
    fn drop(&mut self) {
        unsafe { decref(self.ptr.as_ptr()) };
    }
}

impl<T: ObjectLayout> fmt::Debug for Owned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Owned")
            .field("ptr", &self.ptr)
            .field("refcnt", &self.refcnt())
            .finish()
    }
}

impl<'a, T: ObjectLayout> Borrowed<'a, T> {
    /// View a borrowed reference; `None` for null
    ///
    /// # Safety
    /// `ptr` must be null or point to an object some other owner keeps alive
    /// for `'a`.
    #[inline]
    pub unsafe fn from_raw(ptr: *mut T) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Borrowed {
            ptr,
            _marker: PhantomData,
        })
    }

    #[inline]
    pub fn as_ptr(self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Acquire a new reference to the target
    #[inline]
    pub fn acquire(self) -> Owned<T> {
        Owned {
            ptr: unsafe { NonNull::new_unchecked(compat::new_ref(self.as_ptr())) },
        }
    }

    #[inline]
    pub fn refcnt(self) -> Ssize {
        unsafe { refcnt(self.as_ptr()) }
    }

    /// Is `ty` exactly the type of the target
    #[inline]
    pub fn is_type(self, ty: *const TypeObject) -> bool {
        unsafe { compat::is_type(self.as_ptr(), ty) }
    }

    #[inline]
    pub fn gc_is_tracked(self) -> bool {
        unsafe { compat::gc_is_tracked(self.as_ptr()) }
    }

    #[inline]
    pub fn gc_is_finalized(self) -> bool {
        unsafe { compat::gc_is_finalized(self.as_ptr()) }
    }
}

impl<T: ObjectLayout> Clone for Borrowed<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ObjectLayout> Copy for Borrowed<'_, T> {}

impl<T: ObjectLayout> fmt::Debug for Borrowed<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Borrowed").field(&self.ptr).finish()
    }
}

impl<'a> Borrowed<'a, FrameObject> {
    /// Code executed by the frame
    pub fn code(self) -> Owned<CodeObject> {
        unsafe {
            Owned {
                ptr: NonNull::new_unchecked(compat::frame_get_code(self.as_ptr())),
            }
        }
    }

    /// Calling frame; `None` for the outermost frame
    pub fn back(self) -> Option<Owned<FrameObject>> {
        unsafe { Owned::from_new(compat::frame_get_back(self.as_ptr())) }
    }

    /// Code executed by the frame, kept alive by the frame
    pub fn code_borrow(self) -> Borrowed<'a, CodeObject> {
        unsafe {
            Borrowed {
                ptr: NonNull::new_unchecked(compat::frame_get_code_borrow(self.as_ptr())),
                _marker: PhantomData,
            }
        }
    }

    /// Calling frame, kept alive by the frame
    pub fn back_borrow(self) -> Option<Borrowed<'a, FrameObject>> {
        unsafe { Borrowed::from_raw(compat::frame_get_back_borrow(self.as_ptr())) }
    }
}

/// Innermost frame of a thread; `None` when idle
///
/// # Safety
/// `tstate` must point to a live thread state.
pub unsafe fn thread_frame(tstate: *mut ThreadState) -> Option<Owned<FrameObject>> {
    unsafe { Owned::from_new(compat::thread_state_get_frame(tstate)) }
}

/// Innermost frame of the current thread if it runs `interp`; `None`
/// otherwise
///
/// # Safety
/// `interp` must point to a live interpreter state.
pub unsafe fn interpreter_frame(interp: *mut InterpreterState) -> Option<Owned<FrameObject>> {
    unsafe { Owned::from_new(compat::interpreter_state_get_frame(interp)) }
}

fn check_status(status: c_int) -> Result<()> {
    if status < 0 {
        Err(CompatError::from_indicator())
    } else {
        Ok(())
    }
}

fn check_result(result: *mut Object) -> Result<Owned<Object>> {
    unsafe { Owned::from_new(result) }.ok_or_else(CompatError::from_indicator)
}

/// Call without arguments
pub fn call_no_args<T: ObjectLayout>(callable: Borrowed<'_, T>) -> Result<Owned<Object>> {
    check_result(unsafe { compat::call_no_args(callable.as_ptr()) })
}

/// Call with exactly one argument
pub fn call_one_arg<T: ObjectLayout, A: ObjectLayout>(
    callable: Borrowed<'_, T>,
    arg: Borrowed<'_, A>,
) -> Result<Owned<Object>> {
    check_result(unsafe { compat::call_one_arg(callable.as_ptr(), arg.as_ptr()) })
}

/// Ready `ty` and bind it in `module` under its unqualified name
pub fn module_add_type<M: ObjectLayout>(
    module: Borrowed<'_, M>,
    ty: Borrowed<'_, TypeObject>,
) -> Result<()> {
    check_status(unsafe { compat::module_add_type(module.as_ptr(), ty.as_ptr()) })
}

/// View an owned object as a plain object
pub fn upcast<T: ObjectLayout>(owned: Owned<T>) -> Owned<Object> {
    Owned {
        ptr: unsafe { NonNull::new_unchecked(as_object(owned.into_raw())) },
    }
}
