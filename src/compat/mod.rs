//! Compatibility provision layer
//!
//! One stable name per gated operation of the host runtime's native API.
//! When the target release already exports an operation, the host symbol is
//! re-exported unchanged; otherwise an equivalent definition with the same
//! ownership contract is compiled in its place. Which one is visible is
//! decided entirely by the `cfg` flags `build.rs` derives from the target
//! version, so no operation is ever defined twice.
//!
//! Ownership conventions follow the host runtime:
//! - "new reference": the caller owns one reference and must release it
//! - "borrowed": valid only while another owner keeps the object alive
//!
//! Borrowed variants of the traversal accessors (`*_borrow`) are always
//! defined here, since no host release exports them.

mod call;
mod fields;
mod frame;
mod gc;
mod module;
mod refs;
mod state;

pub use call::{call_no_args, call_one_arg};
pub use fields::{is_type, set_refcnt, set_size, set_type};
pub use frame::{frame_get_back, frame_get_back_borrow, frame_get_code, frame_get_code_borrow};
pub use gc::{gc_is_finalized, gc_is_tracked};
pub use module::module_add_type;
pub use refs::{new_ref, xnew_ref};
#[cfg(rt_thread_state_id)]
pub use state::thread_state_get_id;
pub use state::{
    interpreter_get, interpreter_state_get_frame, interpreter_state_get_frame_borrow,
    thread_state_get_frame, thread_state_get_frame_borrow, thread_state_get_interpreter,
};
