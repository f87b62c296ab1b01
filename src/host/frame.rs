//! Code and frame objects
//!
//! A frame executes one code object and links to the frame that called it.
//! Both links are owned references held by the frame; the runtime only hands
//! them out through accessor functions from 3.9.0b1 on. Before that, code had
//! to read `f_code` and `f_back` directly.

use super::gc::{gc_free, gc_new, gc_track, gc_untrack};
use super::object::{
    Object, ObjectLayout, decref, incref, object_free, object_new, xdecref, xincref,
};
use super::state::{ThreadState, types};

/// Compiled code
#[repr(C)]
pub struct CodeObject {
    pub ob_base: Object,
    pub co_name: String,
    pub co_filename: String,
    pub co_firstlineno: i32,
}

/// Execution frame
#[repr(C)]
pub struct FrameObject {
    pub ob_base: Object,
    /// Calling frame, or null for the outermost frame
    pub f_back: *mut FrameObject,
    /// Code being executed; never null
    pub f_code: *mut CodeObject,
    /// Current line
    pub f_lineno: i32,
}

unsafe impl ObjectLayout for CodeObject {}
unsafe impl ObjectLayout for FrameObject {}

/// Create a code object (new reference)
pub fn code_new(name: &str, filename: &str, firstlineno: i32) -> *mut CodeObject {
    object_new(CodeObject {
        ob_base: Object::head(types().code_type),
        co_name: name.to_string(),
        co_filename: filename.to_string(),
        co_firstlineno: firstlineno,
    })
}

pub(super) unsafe fn code_dealloc(op: *mut Object) {
    unsafe { object_free::<CodeObject>(op) };
}

/// Create a frame executing `code`, called from the innermost frame of
/// `tstate` (new reference, tracked by the collector)
///
/// # Safety
/// `tstate` and `code` must be live.
pub unsafe fn frame_new(tstate: *mut ThreadState, code: *mut CodeObject) -> *mut FrameObject {
    assert!(!tstate.is_null());
    assert!(!code.is_null());
    unsafe {
        let back = (*tstate).frame;
        xincref(back);
        incref(code);
        let frame = gc_new(FrameObject {
            ob_base: Object::head(types().frame_type),
            f_back: back,
            f_code: code,
            f_lineno: (*code).co_firstlineno,
        });
        gc_track(frame);
        frame
    }
}

pub(super) unsafe fn frame_dealloc(op: *mut Object) {
    unsafe {
        gc_untrack(op);
        let frame = op.cast::<FrameObject>();
        xdecref((*frame).f_back);
        decref((*frame).f_code);
        gc_free::<FrameObject>(op);
    }
}

/// Code executed by `frame` (new reference)
///
/// # Safety
/// `frame` must point to a live frame.
#[cfg(rt_native_frame_get_code)]
pub unsafe fn frame_get_code(frame: *mut FrameObject) -> *mut CodeObject {
    assert!(!frame.is_null());
    unsafe {
        let code = (*frame).f_code;
        assert!(!code.is_null());
        incref(code);
        code
    }
}

/// Calling frame of `frame` (new reference, or null for the outermost frame)
///
/// # Safety
/// `frame` must point to a live frame.
#[cfg(rt_native_frame_get_back)]
pub unsafe fn frame_get_back(frame: *mut FrameObject) -> *mut FrameObject {
    assert!(!frame.is_null());
    unsafe {
        let back = (*frame).f_back;
        xincref(back);
        back
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Runtime, gc_head_tracked, refcnt, thread_state_enter_frame};

    #[test]
    fn test_frame_owns_code_and_back() {
        let rt = Runtime::initialize();
        let tstate = rt.main_thread();
        unsafe {
            let code = code_new("main", "app.rt", 10);
            let outer = frame_new(tstate, code);
            assert_eq!(refcnt(code), 2);
            assert!((*outer).f_back.is_null());
            assert_eq!((*outer).f_lineno, 10);
            assert!(gc_head_tracked(outer));

            thread_state_enter_frame(tstate, outer);
            let inner = frame_new(tstate, code);
            assert_eq!((*inner).f_back, outer);
            assert_eq!(refcnt(outer), 3);
            assert_eq!(refcnt(code), 3);

            decref(inner);
            assert_eq!(refcnt(outer), 2);
            assert_eq!(refcnt(code), 2);
        }
    }

    #[test]
    fn test_dealloc_untracks() {
        let rt = Runtime::initialize();
        let before = rt.gc_tracked_count();
        unsafe {
            let code = code_new("f", "<test>", 1);
            let frame = frame_new(rt.main_thread(), code);
            assert_eq!(rt.gc_tracked_count(), before + 1);
            decref(frame);
            assert_eq!(rt.gc_tracked_count(), before);
            assert_eq!(refcnt(code), 1);
            decref(code);
        }
    }
}
