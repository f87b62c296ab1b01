//! Thread and interpreter state accessors

#[cfg(rt_native_interpreter_get)]
pub use crate::host::interpreter_get;
#[cfg(rt_native_thread_state_get_frame)]
pub use crate::host::thread_state_get_frame;
#[cfg(rt_native_thread_state_get_id)]
pub use crate::host::thread_state_get_id;
#[cfg(rt_native_thread_state_get_interpreter)]
pub use crate::host::thread_state_get_interpreter;

use crate::host::{FrameObject, InterpreterState, ThreadState, thread_state_get, xdecref};

/// Innermost frame of `tstate` (new reference, null when idle)
///
/// # Safety
/// `tstate` must point to a live thread state.
#[cfg(not(rt_native_thread_state_get_frame))]
pub unsafe fn thread_state_get_frame(tstate: *mut ThreadState) -> *mut FrameObject {
    assert!(!tstate.is_null());
    unsafe { super::refs::xnew_ref((*tstate).frame) }
}

/// Interpreter owning `tstate` (borrowed; interpreter states are not
/// refcounted)
///
/// # Safety
/// `tstate` must point to a live thread state.
#[cfg(not(rt_native_thread_state_get_interpreter))]
pub unsafe fn thread_state_get_interpreter(tstate: *mut ThreadState) -> *mut InterpreterState {
    assert!(!tstate.is_null());
    unsafe { (*tstate).interp }
}

/// Interpreter of the current thread
///
/// Fatal when no thread state is current or it has no interpreter.
#[cfg(not(rt_native_interpreter_get))]
pub fn interpreter_get() -> *mut InterpreterState {
    let tstate = thread_state_get();
    if tstate.is_null() {
        crate::host::fatal_error("execution lock released (thread state is NULL)");
    }
    let interp = unsafe { (*tstate).interp };
    if interp.is_null() {
        crate::host::fatal_error("no current interpreter");
    }
    interp
}

/// Unique id of `tstate`
///
/// # Safety
/// `tstate` must point to a live thread state.
#[cfg(all(rt_thread_state_id, not(rt_native_thread_state_get_id)))]
pub unsafe fn thread_state_get_id(tstate: *mut ThreadState) -> u64 {
    assert!(!tstate.is_null());
    unsafe { (*tstate).id }
}

/// Innermost frame of `tstate` (borrowed, null when idle)
///
/// # Safety
/// `tstate` must point to a live thread state.
pub unsafe fn thread_state_get_frame_borrow(tstate: *mut ThreadState) -> *mut FrameObject {
    unsafe {
        let frame = thread_state_get_frame(tstate);
        xdecref(frame);
        frame
    }
}

/// Innermost frame of the current thread, if that thread belongs to `interp`
/// (new reference, null when idle or running another interpreter)
///
/// # Safety
/// `interp` must point to a live interpreter state.
pub unsafe fn interpreter_state_get_frame(interp: *mut InterpreterState) -> *mut FrameObject {
    assert!(!interp.is_null());
    let tstate = thread_state_get();
    if tstate.is_null() {
        return std::ptr::null_mut();
    }
    unsafe {
        if !std::ptr::eq(thread_state_get_interpreter(tstate), interp) {
            return std::ptr::null_mut();
        }
        thread_state_get_frame(tstate)
    }
}

/// [`interpreter_state_get_frame`], borrowed
///
/// # Safety
/// `interp` must point to a live interpreter state.
pub unsafe fn interpreter_state_get_frame_borrow(
    interp: *mut InterpreterState,
) -> *mut FrameObject {
    unsafe {
        let frame = interpreter_state_get_frame(interp);
        xdecref(frame);
        frame
    }
}
