//! Interpreter and thread states
//!
//! An [`InterpreterState`] owns its builtin types, its collector list and a
//! linked list of [`ThreadState`]s. The thread state holding the execution
//! lock on an OS thread is "current"; it is kept in a thread-local, so each
//! OS thread drives its own runtime and no locking happens here.
//!
//! [`Runtime`] initializes an interpreter with a main thread state, makes it
//! current, and tears everything down on drop.

use std::cell::Cell;
use std::ptr;

use super::frame::FrameObject;
use super::gc::GcState;
use super::object::{Object, incref, xdecref, xincref, xsetref};
use super::types::BuiltinTypes;
use super::fatal_error;

/// Per-interpreter state
pub struct InterpreterState {
    pub id: i64,
    /// Most recently created thread state
    pub tstate_head: *mut ThreadState,
    pub gc: GcState,
    pub types: BuiltinTypes,
    /// Thread states created so far
    threads_created: u64,
}

/// Per-thread execution state
pub struct ThreadState {
    /// Owning interpreter (weak)
    pub interp: *mut InterpreterState,
    /// Next thread state of the same interpreter
    pub next: *mut ThreadState,
    /// Innermost executing frame; the thread state owns one reference
    pub frame: *mut FrameObject,
    /// Error indicator; owns one reference to the pending exception
    pub curexc: *mut Object,
    /// Unique id within the process
    #[cfg(rt_thread_state_id)]
    pub id: u64,
}

thread_local! {
    static CURRENT: Cell<*mut ThreadState> = const { Cell::new(ptr::null_mut()) };
    /// Number of live runtimes on this thread
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// The current thread state, or null when no thread state is current
#[inline]
pub fn thread_state_get() -> *mut ThreadState {
    CURRENT.with(|c| c.get())
}

/// Make `tstate` current (null to release) and return the previous one
///
/// # Safety
/// `tstate` must be null or point to a thread state that stays live for as
/// long as it is current.
pub unsafe fn thread_state_swap(tstate: *mut ThreadState) -> *mut ThreadState {
    CURRENT.with(|c| c.replace(tstate))
}

/// Interpreter of the current thread state; fatal when none is current
pub(crate) fn current_interp() -> *mut InterpreterState {
    let tstate = thread_state_get();
    if tstate.is_null() {
        fatal_error("no current thread state");
    }
    unsafe { (*tstate).interp }
}

/// Builtin types of the current interpreter
pub fn types() -> BuiltinTypes {
    unsafe { (*current_interp()).types }
}

#[cfg(rt_thread_state_id)]
fn next_thread_id() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};

    static NEXT: AtomicU64 = AtomicU64::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

/// Create a thread state for `interp` and link it at the head of its list
///
/// # Safety
/// `interp` must point to a live interpreter state.
pub unsafe fn thread_state_new(interp: *mut InterpreterState) -> *mut ThreadState {
    unsafe {
        let tstate = Box::into_raw(Box::new(ThreadState {
            interp,
            next: (*interp).tstate_head,
            frame: ptr::null_mut(),
            curexc: ptr::null_mut(),
            #[cfg(rt_thread_state_id)]
            id: next_thread_id(),
        }));
        (*interp).tstate_head = tstate;
        (*interp).threads_created += 1;
        tracing::debug!(target: "capi_compat::host", interp = (*interp).id, "thread state created");
        tstate
    }
}

/// Unlink and free a thread state, releasing its frame and pending error
///
/// # Safety
/// `tstate` must be live and not current on any OS thread.
pub unsafe fn thread_state_delete(tstate: *mut ThreadState) {
    unsafe {
        assert!(
            !ptr::eq(thread_state_get(), tstate),
            "deleting the current thread state"
        );
        let interp = (*tstate).interp;
        let mut link: *mut *mut ThreadState = &raw mut (*interp).tstate_head;
        while !(*link).is_null() {
            if ptr::eq(*link, tstate) {
                *link = (*tstate).next;
                break;
            }
            link = &raw mut (**link).next;
        }
        let ts = Box::from_raw(tstate);
        xdecref(ts.frame);
        xdecref(ts.curexc);
    }
}

/// Make `frame` the innermost frame of `tstate`
///
/// # Safety
/// `tstate` and `frame` must be live.
pub unsafe fn thread_state_enter_frame(tstate: *mut ThreadState, frame: *mut FrameObject) {
    unsafe {
        incref(frame);
        xsetref(&mut (*tstate).frame, frame);
    }
}

/// Return to the caller of the innermost frame
///
/// # Safety
/// `tstate` must be live and executing a frame.
pub unsafe fn thread_state_leave_frame(tstate: *mut ThreadState) {
    unsafe {
        let frame = (*tstate).frame;
        assert!(!frame.is_null(), "no frame to leave");
        let back = (*frame).f_back;
        xincref(back);
        xsetref(&mut (*tstate).frame, back);
    }
}

// Accessors the runtime exports from 3.9.0a5 (interpreter), 3.9.0a6 (id) and
// 3.9.0b1 (frame) on.

/// Interpreter owning `tstate` (interpreter states are not refcounted)
///
/// # Safety
/// `tstate` must point to a live thread state.
#[cfg(rt_native_thread_state_get_interpreter)]
pub unsafe fn thread_state_get_interpreter(tstate: *mut ThreadState) -> *mut InterpreterState {
    assert!(!tstate.is_null());
    unsafe { (*tstate).interp }
}

/// Interpreter of the current thread; fatal without one
#[cfg(rt_native_interpreter_get)]
pub fn interpreter_get() -> *mut InterpreterState {
    let tstate = thread_state_get();
    if tstate.is_null() {
        fatal_error("execution lock released (thread state is NULL)");
    }
    let interp = unsafe { (*tstate).interp };
    if interp.is_null() {
        fatal_error("no current interpreter");
    }
    interp
}

/// Innermost frame of `tstate` (new reference, or null when idle)
///
/// # Safety
/// `tstate` must point to a live thread state.
#[cfg(rt_native_thread_state_get_frame)]
pub unsafe fn thread_state_get_frame(tstate: *mut ThreadState) -> *mut FrameObject {
    assert!(!tstate.is_null());
    unsafe {
        let frame = (*tstate).frame;
        xincref(frame);
        frame
    }
}

/// Unique id of `tstate`
///
/// # Safety
/// `tstate` must point to a live thread state.
#[cfg(rt_native_thread_state_get_id)]
pub unsafe fn thread_state_get_id(tstate: *mut ThreadState) -> u64 {
    assert!(!tstate.is_null());
    unsafe { (*tstate).id }
}

/// An initialized interpreter with a current main thread state
///
/// Dropping the runtime deletes every thread state of the interpreter, frees
/// the builtin types and restores whichever thread state was current before.
/// Runtimes on one thread nest: dropping one while a runtime created after it
/// is still alive is fatal.
pub struct Runtime {
    interp: *mut InterpreterState,
    main: *mut ThreadState,
    previous: *mut ThreadState,
    depth: usize,
}

impl Runtime {
    /// Create an interpreter and make its main thread state current
    pub fn initialize() -> Runtime {
        static NEXT_INTERP_ID: std::sync::atomic::AtomicI64 = std::sync::atomic::AtomicI64::new(0);

        let id = NEXT_INTERP_ID.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let interp = Box::into_raw(Box::new(InterpreterState {
            id,
            tstate_head: ptr::null_mut(),
            gc: GcState::new(),
            types: BuiltinTypes::create(),
            threads_created: 0,
        }));
        let main = unsafe { thread_state_new(interp) };
        let previous = unsafe { thread_state_swap(main) };
        let depth = DEPTH.with(|d| d.get() + 1);
        DEPTH.with(|d| d.set(depth));
        tracing::debug!(target: "capi_compat::host", interp = id, depth, "runtime initialized");

        Runtime {
            interp,
            main,
            previous,
            depth,
        }
    }

    #[inline]
    pub fn interp(&self) -> *mut InterpreterState {
        self.interp
    }

    #[inline]
    pub fn main_thread(&self) -> *mut ThreadState {
        self.main
    }

    /// Number of objects tracked by the collector
    pub fn gc_tracked_count(&self) -> usize {
        unsafe { (*self.interp).gc.tracked_count() }
    }

    /// Number of thread states the interpreter has created
    pub fn thread_states_created(&self) -> u64 {
        unsafe { (*self.interp).threads_created }
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        // Out of order, `previous` of a later runtime would point into this
        // interpreter after it is freed.
        if DEPTH.with(|d| d.get()) != self.depth {
            fatal_error("runtimes dropped out of order");
        }
        DEPTH.with(|d| d.set(self.depth - 1));

        unsafe {
            // Whatever thread state of ours is still current goes away below.
            thread_state_swap(self.previous);

            while !(*self.interp).tstate_head.is_null() {
                thread_state_delete((*self.interp).tstate_head);
            }
            let mut interp = Box::from_raw(self.interp);
            let leaked = interp.gc.detach_all();
            interp.types.destroy();
            tracing::debug!(
                target: "capi_compat::host",
                interp = interp.id,
                leaked,
                "runtime finalized"
            );
        }
    }
}
