//! Host runtime native API
//!
//! This is the interface the runtime exports to native extensions, as it
//! looks at the release the crate is built for. Objects, types, frames,
//! thread and interpreter states, the error indicator, calls and modules all
//! follow the runtime's conventions: raw pointers, explicit reference counts,
//! null or `-1` plus the error indicator on failure.
//!
//! Functions the runtime only gained in later releases are compiled in only
//! when the target release has them (see `gate`); extension code should go
//! through `compat`, which always provides them.

pub mod call;
pub mod error;
pub mod frame;
pub mod gc;
pub mod module;
pub mod object;
pub mod state;
pub mod types;

pub use call::{
    FunctionObject, NativeBody, TupleObject, call_function_obj_args, call_object, function_new,
    tuple_get_item, tuple_new,
};
pub use error::{
    ExceptionObject, err_clear, err_fetch, err_matches, err_occurred, err_set_object,
    err_set_string, exception_message, exception_new, fatal_error,
};
pub use frame::{CodeObject, FrameObject, code_new, frame_new};
pub use gc::{
    GcHead, GcState, gc_head_finalized, gc_head_tracked, gc_new, gc_track, gc_untrack,
    object_is_gc,
};
pub use module::{
    ModuleObject, module_add_object, module_get_attr, module_new, type_generic_alloc, type_new,
    type_ready, type_short_name,
};
pub use object::{
    Destructor, Object, ObjectLayout, Ssize, TPFLAGS_BASETYPE, TPFLAGS_HAVE_GC,
    TPFLAGS_HEAPTYPE, TPFLAGS_READY, TernaryFunc, TypeObject, VarLayout, VarObject, as_object,
    as_var_object, decref, get_size, incref, object_call_finalizer, object_new, refcnt, type_name,
    type_of, xdecref, xincref, xsetref,
};
pub use state::{
    InterpreterState, Runtime, ThreadState, thread_state_delete, thread_state_enter_frame,
    thread_state_get, thread_state_leave_frame, thread_state_new, thread_state_swap, types,
};
pub use types::BuiltinTypes;

#[cfg(rt_native_call_no_args)]
pub use call::call_no_args;
#[cfg(rt_native_call_one_arg)]
pub use call::call_one_arg;
#[cfg(rt_native_frame_get_back)]
pub use frame::frame_get_back;
#[cfg(rt_native_frame_get_code)]
pub use frame::frame_get_code;
#[cfg(rt_native_gc_is_finalized)]
pub use gc::gc_is_finalized;
#[cfg(rt_native_gc_is_tracked)]
pub use gc::gc_is_tracked;
#[cfg(rt_native_module_add_type)]
pub use module::module_add_type;
#[cfg(rt_native_is_type)]
pub use object::is_type;
#[cfg(rt_native_set_refcnt)]
pub use object::set_refcnt;
#[cfg(rt_native_set_size)]
pub use object::set_size;
#[cfg(rt_native_set_type)]
pub use object::set_type;
#[cfg(rt_native_new_ref)]
pub use object::{new_ref, xnew_ref};
#[cfg(rt_native_interpreter_get)]
pub use state::interpreter_get;
#[cfg(rt_native_thread_state_get_frame)]
pub use state::thread_state_get_frame;
#[cfg(rt_native_thread_state_get_id)]
pub use state::thread_state_get_id;
#[cfg(rt_native_thread_state_get_interpreter)]
pub use state::thread_state_get_interpreter;
