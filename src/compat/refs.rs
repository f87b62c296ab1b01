//! Strong-reference constructors
//!
//! Every polyfill that hands out a new reference builds on these two.

#[cfg(rt_native_new_ref)]
pub use crate::host::{new_ref, xnew_ref};

#[cfg(not(rt_native_new_ref))]
use crate::host::{ObjectLayout, incref, xincref};

/// Return a new reference to `op`
///
/// # Safety
/// `op` must point to a live object.
#[cfg(not(rt_native_new_ref))]
#[inline]
pub unsafe fn new_ref<T: ObjectLayout>(op: *mut T) -> *mut T {
    unsafe { incref(op) };
    op
}

/// Return a new reference to `op`, or null when `op` is null
///
/// # Safety
/// `op` must be null or point to a live object.
#[cfg(not(rt_native_new_ref))]
#[inline]
pub unsafe fn xnew_ref<T: ObjectLayout>(op: *mut T) -> *mut T {
    unsafe { xincref(op) };
    op
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Object, Runtime, code_new, decref, refcnt};

    #[test]
    fn test_new_ref_adds_one_owner() {
        let _rt = Runtime::initialize();
        let code = code_new("f", "<test>", 1);
        unsafe {
            let strong = new_ref(code);
            assert_eq!(strong, code);
            assert_eq!(refcnt(code), 2);
            decref(strong);
            decref(code);
        }
    }

    #[test]
    fn test_xnew_ref() {
        let _rt = Runtime::initialize();
        let code = code_new("f", "<test>", 1);
        unsafe {
            assert!(xnew_ref(std::ptr::null_mut::<Object>()).is_null());

            let strong = xnew_ref(code);
            assert_eq!(strong, code);
            assert_eq!(refcnt(code), 2);
            decref(strong);
            decref(code);
        }
    }
}
