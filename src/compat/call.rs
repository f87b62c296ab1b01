//! Fixed-arity call helpers
//!
//! Both wrap the argument-list call primitive. Results and failures are
//! relayed untouched: a new reference, or null with the error indicator set
//! by the callee.

#[cfg(rt_native_call_no_args)]
pub use crate::host::call_no_args;
#[cfg(rt_native_call_one_arg)]
pub use crate::host::call_one_arg;

#[allow(unused_imports)]
use crate::host::{Object, ObjectLayout, as_object, call_function_obj_args};

/// Call `callable` without arguments (new reference, or null with the error
/// indicator set)
///
/// # Safety
/// `callable` must be live.
#[cfg(not(rt_native_call_no_args))]
pub unsafe fn call_no_args<T: ObjectLayout>(callable: *mut T) -> *mut Object {
    unsafe { call_function_obj_args(callable, &[]) }
}

/// Call `callable` with exactly one argument (new reference, or null with the
/// error indicator set)
///
/// # Safety
/// `callable` and `arg` must be live.
#[cfg(not(rt_native_call_one_arg))]
pub unsafe fn call_one_arg<T: ObjectLayout, A: ObjectLayout>(
    callable: *mut T,
    arg: *mut A,
) -> *mut Object {
    unsafe { call_function_obj_args(callable, &[as_object(arg)]) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{
        Runtime, code_new, decref, err_clear, err_matches, err_occurred, err_set_string,
        exception_message, function_new, get_size, incref, refcnt, tuple_new, types,
    };

    #[test]
    fn test_call_no_args_raising() {
        let _rt = Runtime::initialize();
        let raiser = function_new("raiser", |_| {
            unsafe { err_set_string(types().runtime_error, "boom") };
            std::ptr::null_mut()
        });
        unsafe {
            let result = call_no_args(raiser);
            assert!(result.is_null());
            assert!(err_matches(types().runtime_error));
            assert_eq!(exception_message(err_occurred()), "boom");
            err_clear();
            decref(raiser);
        }
    }

    #[test]
    fn test_call_no_args_passes_empty_tuple() {
        let _rt = Runtime::initialize();
        let pack = function_new("pack", |args| unsafe { tuple_new(args).cast() });
        unsafe {
            let result = call_no_args(pack);
            assert!(!result.is_null());
            assert_eq!(get_size(result.cast::<crate::host::TupleObject>()), 0);
            decref(result);
            decref(pack);
        }
    }

    #[test]
    fn test_call_one_arg() {
        let _rt = Runtime::initialize();
        let identity = function_new("identity", |args| {
            assert_eq!(args.len(), 1);
            unsafe { incref(args[0]) };
            args[0]
        });
        let code = code_new("f", "<test>", 1);
        unsafe {
            let result = call_one_arg(identity, code);
            assert_eq!(result, as_object(code));
            assert_eq!(refcnt(code), 2);
            decref(result);
            decref(code);
            decref(identity);
        }
    }

    #[test]
    fn test_call_one_arg_on_non_callable() {
        let _rt = Runtime::initialize();
        let code = code_new("f", "<test>", 1);
        unsafe {
            assert!(call_one_arg(code, code).is_null());
            assert!(err_matches(types().type_error));
            assert_eq!(refcnt(code), 1);
            err_clear();
            decref(code);
        }
    }
}
