//! Bookkeeping field setters and the exact-type test
//!
//! Before the accessor functions existed, the header fields were plain
//! assignable locations and extensions wrote them directly. The polyfills
//! below are that legacy layout path: they are only compiled for targets
//! older than the release that introduced the accessor, where direct writes
//! are still valid. Setters do no validation and never adjust reference
//! counts.

#[cfg(rt_native_is_type)]
pub use crate::host::is_type;
#[cfg(rt_native_set_refcnt)]
pub use crate::host::set_refcnt;
#[cfg(rt_native_set_size)]
pub use crate::host::set_size;
#[cfg(rt_native_set_type)]
pub use crate::host::set_type;

#[allow(unused_imports)]
use crate::host::{ObjectLayout, Ssize, TypeObject, VarLayout, as_object, as_var_object};

/// Set the reference count (legacy layout: direct field write)
///
/// # Safety
/// `op` must point to a live object.
#[cfg(not(rt_native_set_refcnt))]
#[inline]
pub unsafe fn set_refcnt<T: ObjectLayout>(op: *mut T, refcnt: Ssize) {
    unsafe { (*as_object(op)).ob_refcnt = refcnt };
}

/// Set the type descriptor (legacy layout: direct field write)
///
/// # Safety
/// `op` must point to a live object.
#[cfg(not(rt_native_set_type))]
#[inline]
pub unsafe fn set_type<T: ObjectLayout>(op: *mut T, ty: *mut TypeObject) {
    unsafe { (*as_object(op)).ob_type = ty };
}

/// Set the size field (legacy layout: direct field write)
///
/// # Safety
/// `op` must point to a live variable-size object.
#[cfg(not(rt_native_set_size))]
#[inline]
pub unsafe fn set_size<T: VarLayout>(op: *mut T, size: Ssize) {
    unsafe { (*as_var_object(op)).ob_size = size };
}

/// Is `ty` exactly the type of `op` (subclasses do not count)
///
/// # Safety
/// `op` must point to a live object.
#[cfg(not(rt_native_is_type))]
#[inline]
pub unsafe fn is_type<T: ObjectLayout>(op: *mut T, ty: *const TypeObject) -> bool {
    unsafe { std::ptr::eq((*as_object(op)).ob_type, ty) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{
        Runtime, code_new, decref, get_size, incref, refcnt, tuple_new, type_of, types,
    };

    #[test]
    fn test_set_refcnt_is_raw_assignment() {
        let _rt = Runtime::initialize();
        let code = code_new("f", "<test>", 1);
        unsafe {
            incref(code);
            incref(code);
            set_refcnt(code, 1);
            assert_eq!(refcnt(code), 1);
            decref(code);
        }
    }

    #[test]
    fn test_set_type() {
        let _rt = Runtime::initialize();
        let code = code_new("f", "<test>", 1);
        let code_type = types().code_type;
        let other = types().runtime_error;
        unsafe {
            set_type(code, other);
            assert_eq!(type_of(code), other);
            assert!(is_type(code, other));
            // the instance never owned its type
            assert_eq!(refcnt(other), 1);

            set_type(code, code_type);
            decref(code);
        }
    }

    #[test]
    fn test_set_size() {
        let _rt = Runtime::initialize();
        let code = code_new("f", "<test>", 1);
        unsafe {
            let tuple = tuple_new(&[as_object(code)]);
            assert_eq!(get_size(tuple), 1);
            set_size(tuple, 7);
            assert_eq!(get_size(tuple), 7);
            set_size(tuple, 1);
            decref(tuple);
            decref(code);
        }
    }

    #[test]
    fn test_is_type_is_exact() {
        let _rt = Runtime::initialize();
        let t = types();
        let code = code_new("f", "<test>", 1);
        unsafe {
            assert!(is_type(code, t.code_type));
            // code derives from object, but only the exact type matches
            assert!(!is_type(code, t.object_type));
            assert!(is_type(t.frame_type, t.type_type));
            // unchanged state, unchanged answer
            for _ in 0..3 {
                assert!(is_type(code, t.code_type));
            }
            decref(code);
        }
    }
}
