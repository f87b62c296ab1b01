//! Frame traversal accessors

#[cfg(rt_native_frame_get_back)]
pub use crate::host::frame_get_back;
#[cfg(rt_native_frame_get_code)]
pub use crate::host::frame_get_code;

use crate::host::{CodeObject, FrameObject, decref, xdecref};

#[cfg(not(all(rt_native_frame_get_code, rt_native_frame_get_back)))]
use super::refs::xnew_ref;

/// Code executed by `frame` (new reference, never null)
///
/// # Safety
/// `frame` must point to a live frame.
#[cfg(not(rt_native_frame_get_code))]
pub unsafe fn frame_get_code(frame: *mut FrameObject) -> *mut CodeObject {
    assert!(!frame.is_null());
    unsafe {
        let code = xnew_ref((*frame).f_code);
        assert!(!code.is_null());
        code
    }
}

/// Calling frame of `frame` (new reference, null for the outermost frame)
///
/// # Safety
/// `frame` must point to a live frame.
#[cfg(not(rt_native_frame_get_back))]
pub unsafe fn frame_get_back(frame: *mut FrameObject) -> *mut FrameObject {
    assert!(!frame.is_null());
    unsafe { xnew_ref((*frame).f_back) }
}

/// Code executed by `frame` (borrowed)
///
/// # Safety
/// `frame` must point to a live frame.
pub unsafe fn frame_get_code_borrow(frame: *mut FrameObject) -> *mut CodeObject {
    unsafe {
        let code = frame_get_code(frame);
        decref(code);
        code
    }
}

/// Calling frame of `frame` (borrowed, null for the outermost frame)
///
/// # Safety
/// `frame` must point to a live frame.
pub unsafe fn frame_get_back_borrow(frame: *mut FrameObject) -> *mut FrameObject {
    unsafe {
        let back = frame_get_back(frame);
        xdecref(back);
        back
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{
        Runtime, code_new, frame_new, refcnt, thread_state_enter_frame, thread_state_leave_frame,
    };

    #[test]
    fn test_frame_chain() {
        let rt = Runtime::initialize();
        let tstate = rt.main_thread();
        unsafe {
            let code = code_new("main", "app.rt", 1);
            let b = frame_new(tstate, code);
            thread_state_enter_frame(tstate, b);
            let a = frame_new(tstate, code);
            thread_state_enter_frame(tstate, a);

            let b_count = refcnt(b);
            assert_eq!(frame_get_back_borrow(a), b);
            assert_eq!(refcnt(b), b_count);
            assert!(frame_get_back_borrow(b).is_null());

            let back = frame_get_back(a);
            assert_eq!(back, b);
            assert_eq!(refcnt(b), b_count + 1);
            decref(back);

            // outermost frame: null, nothing acquired
            let a_count = refcnt(a);
            assert!(frame_get_back(b).is_null());
            assert_eq!(refcnt(a), a_count);
            assert_eq!(refcnt(b), b_count);

            thread_state_leave_frame(tstate);
            thread_state_leave_frame(tstate);
            decref(a);
            decref(b);
            decref(code);
        }
    }

    #[test]
    fn test_frame_get_code() {
        let rt = Runtime::initialize();
        unsafe {
            let code = code_new("f", "<test>", 3);
            let frame = frame_new(rt.main_thread(), code);
            let count = refcnt(code);

            let strong = frame_get_code(frame);
            assert_eq!(strong, code);
            assert_eq!(refcnt(code), count + 1);
            decref(strong);

            assert_eq!(frame_get_code_borrow(frame), code);
            assert_eq!(refcnt(code), count);
            assert_eq!((*frame_get_code_borrow(frame)).co_name, "f");

            decref(frame);
            decref(code);
        }
    }

    #[test]
    #[should_panic]
    fn test_null_frame_is_a_precondition_violation() {
        let _rt = Runtime::initialize();
        unsafe { frame_get_back_borrow(std::ptr::null_mut()) };
    }
}
