//! Error indicator and fatal errors
//!
//! A failing runtime call returns null (or `-1`) and leaves an exception in
//! the calling thread's error indicator. The indicator owns one reference to
//! the exception instance.

use std::ptr;

use super::object::{
    Object, ObjectLayout, TypeObject, as_object, decref, incref, object_free, object_new, xsetref,
};
use super::state::thread_state_get;

/// An exception instance
#[repr(C)]
pub struct ExceptionObject {
    pub ob_base: Object,
    pub message: String,
}

unsafe impl ObjectLayout for ExceptionObject {}

pub(super) unsafe fn exception_dealloc(op: *mut Object) {
    unsafe { object_free::<ExceptionObject>(op) };
}

/// Abort on an unrecoverable runtime state
pub fn fatal_error(msg: &str) -> ! {
    tracing::error!(target: "capi_compat::host", "fatal runtime error: {}", msg);
    panic!("fatal runtime error: {}", msg);
}

/// Create an exception instance of type `ty`
///
/// # Safety
/// `ty` must point to a live exception type that outlives the instance.
pub unsafe fn exception_new(ty: *mut TypeObject, message: &str) -> *mut ExceptionObject {
    assert!(!ty.is_null(), "exception type is NULL");
    object_new(ExceptionObject {
        ob_base: Object::head(ty),
        message: message.to_string(),
    })
}

/// Message carried by an exception instance
///
/// # Safety
/// `exc` must point to a live exception instance, and the returned text must
/// not be used after that instance is released.
pub unsafe fn exception_message<'a>(exc: *mut Object) -> &'a str {
    unsafe { &(*exc.cast::<ExceptionObject>()).message }
}

fn current_error_slot() -> *mut *mut Object {
    let tstate = thread_state_get();
    if tstate.is_null() {
        fatal_error("error indicator used without a current thread state");
    }
    unsafe { &raw mut (*tstate).curexc }
}

/// Raise `exc`; the indicator takes its own reference
///
/// # Safety
/// `exc` must point to a live exception instance.
pub unsafe fn err_set_object<T: ObjectLayout>(exc: *mut T) {
    let exc = as_object(exc);
    unsafe {
        incref(exc);
        xsetref(&mut *current_error_slot(), exc);
    }
}

/// Raise a new exception of type `ty`
///
/// # Safety
/// `ty` must point to a live exception type.
pub unsafe fn err_set_string(ty: *mut TypeObject, message: &str) {
    unsafe {
        let exc = exception_new(ty, message);
        err_set_object(exc);
        decref(exc);
    }
}

/// The pending exception, borrowed; null when none is set
pub fn err_occurred() -> *mut Object {
    unsafe { *current_error_slot() }
}

/// Take the pending exception out of the indicator (new reference or null)
pub fn err_fetch() -> *mut Object {
    unsafe { std::mem::replace(&mut *current_error_slot(), ptr::null_mut()) }
}

/// Drop the pending exception, if any
pub fn err_clear() {
    unsafe { xsetref(&mut *current_error_slot(), ptr::null_mut()) };
}

/// Is the pending exception exactly of type `ty`
pub fn err_matches(ty: *mut TypeObject) -> bool {
    let exc = err_occurred();
    !exc.is_null() && unsafe { ptr::eq((*exc).ob_type, ty) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Runtime, refcnt, types};

    #[test]
    fn test_set_and_clear() {
        let _rt = Runtime::initialize();
        assert!(err_occurred().is_null());

        unsafe { err_set_string(types().runtime_error, "boom") };
        let exc = err_occurred();
        assert!(!exc.is_null());
        assert!(err_matches(types().runtime_error));
        assert!(!err_matches(types().type_error));
        unsafe {
            assert_eq!(exception_message(exc), "boom");
            assert_eq!(refcnt(exc), 1);
        }

        err_clear();
        assert!(err_occurred().is_null());
    }

    #[test]
    fn test_set_object_keeps_identity() {
        let _rt = Runtime::initialize();
        unsafe {
            let exc = exception_new(types().type_error, "bad");
            err_set_object(exc);
            assert_eq!(refcnt(exc), 2);
            assert_eq!(err_occurred(), as_object(exc));

            let fetched = err_fetch();
            assert_eq!(fetched, as_object(exc));
            assert!(err_occurred().is_null());
            decref(fetched);
            assert_eq!(refcnt(exc), 1);
            decref(exc);
        }
    }

    #[test]
    fn test_new_error_replaces_old() {
        let _rt = Runtime::initialize();
        unsafe {
            err_set_string(types().runtime_error, "first");
            err_set_string(types().system_error, "second");
            assert_eq!(exception_message(err_occurred()), "second");
        }
        err_clear();
    }

    #[test]
    #[should_panic(expected = "exception type is NULL")]
    fn test_null_exception_type_panics() {
        let _rt = Runtime::initialize();
        unsafe { err_set_string(std::ptr::null_mut(), "boom") };
    }

    #[test]
    #[should_panic(expected = "fatal runtime error")]
    fn test_fatal_error_panics() {
        fatal_error("unrecoverable");
    }
}
