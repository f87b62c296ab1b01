//! Tuples, native functions and the call protocol
//!
//! Calls go through the callee type's `tp_call` slot with an argument tuple.
//! A slot returns a new reference, or null with the error indicator set;
//! [`call_object`] turns a null result without an error into `SystemError`.

use std::ptr;

use super::error::{err_occurred, err_set_string};
use super::gc::{gc_free, gc_new, gc_track, gc_untrack};
use super::object::{
    Object, ObjectLayout, Ssize, VarLayout, VarObject, as_object, decref, incref, type_name,
};
use super::state::types;

/// Immutable sequence of object references
#[repr(C)]
pub struct TupleObject {
    pub ob_base: VarObject,
    /// Owned references; `ob_size` mirrors the length
    pub ob_item: Box<[*mut Object]>,
}

unsafe impl ObjectLayout for TupleObject {}
unsafe impl VarLayout for TupleObject {}

/// Body of a native function: borrowed arguments in, new reference or null
/// with the error indicator set out
pub type NativeBody = dyn Fn(&[*mut Object]) -> *mut Object;

/// Callable wrapping a Rust closure
#[repr(C)]
pub struct FunctionObject {
    pub ob_base: Object,
    pub name: String,
    pub body: Box<NativeBody>,
}

unsafe impl ObjectLayout for FunctionObject {}

/// Create a tuple holding new references to `items`
///
/// # Safety
/// Every item must point to a live object.
pub unsafe fn tuple_new(items: &[*mut Object]) -> *mut TupleObject {
    for &item in items {
        unsafe { incref(item) };
    }
    let tuple = gc_new(TupleObject {
        ob_base: VarObject::head(types().tuple_type, items.len() as Ssize),
        ob_item: items.into(),
    });
    unsafe { gc_track(tuple) };
    tuple
}

/// Item `index` of a tuple (borrowed)
///
/// # Safety
/// `tuple` must point to a live tuple and `index` be in bounds.
pub unsafe fn tuple_get_item(tuple: *mut TupleObject, index: usize) -> *mut Object {
    unsafe { (&(*tuple).ob_item)[index] }
}

pub(super) unsafe fn tuple_dealloc(op: *mut Object) {
    unsafe {
        gc_untrack(op);
        let tuple = op.cast::<TupleObject>();
        for &item in (*tuple).ob_item.iter() {
            decref(item);
        }
        gc_free::<TupleObject>(op);
    }
}

/// Wrap a closure as a callable (new reference)
pub fn function_new<F>(name: &str, body: F) -> *mut FunctionObject
where
    F: Fn(&[*mut Object]) -> *mut Object + 'static,
{
    let func = gc_new(FunctionObject {
        ob_base: Object::head(types().function_type),
        name: name.to_string(),
        body: Box::new(body),
    });
    unsafe { gc_track(func) };
    func
}

pub(super) unsafe fn function_call(
    callable: *mut Object,
    args: *mut Object,
    _kwargs: *mut Object,
) -> *mut Object {
    unsafe {
        let func = callable.cast::<FunctionObject>();
        let args = args.cast::<TupleObject>();
        ((*func).body)(&(&(*args).ob_item)[..])
    }
}

pub(super) unsafe fn function_dealloc(op: *mut Object) {
    unsafe {
        gc_untrack(op);
        gc_free::<FunctionObject>(op);
    }
}

/// Call `callable` with an argument tuple
///
/// Returns a new reference, or null with the error indicator set.
///
/// # Safety
/// `callable` and `args` must be live.
pub unsafe fn call_object<T: ObjectLayout>(
    callable: *mut T,
    args: *mut TupleObject,
) -> *mut Object {
    let callable = as_object(callable);
    unsafe {
        let Some(call) = (*(*callable).ob_type).tp_call else {
            err_set_string(
                types().type_error,
                &format!("'{}' object is not callable", type_name(callable)),
            );
            return ptr::null_mut();
        };

        let result = call(callable, as_object(args), ptr::null_mut());
        check_function_result(callable, result)
    }
}

unsafe fn check_function_result(callable: *mut Object, result: *mut Object) -> *mut Object {
    let raised = !err_occurred().is_null();
    unsafe {
        if result.is_null() {
            if !raised {
                let msg = format!(
                    "{} returned NULL without setting an error",
                    type_name(callable)
                );
                err_set_string(types().system_error, &msg);
            }
        } else if raised {
            decref(result);
            let msg = format!(
                "{} returned a result with an error set",
                type_name(callable)
            );
            err_set_string(types().system_error, &msg);
            return ptr::null_mut();
        }
    }
    result
}

/// Call `callable` with positional arguments
///
/// The argument slice plays the role of the runtime's null-terminated
/// argument list. Returns a new reference, or null with the error indicator
/// set.
///
/// # Safety
/// `callable` and every argument must be live.
pub unsafe fn call_function_obj_args<T: ObjectLayout>(
    callable: *mut T,
    args: &[*mut Object],
) -> *mut Object {
    unsafe {
        let tuple = tuple_new(args);
        let result = call_object(callable, tuple);
        decref(tuple);
        result
    }
}

/// Call `callable` without arguments (new reference or null)
///
/// # Safety
/// `callable` must be live.
#[cfg(rt_native_call_no_args)]
pub unsafe fn call_no_args<T: ObjectLayout>(callable: *mut T) -> *mut Object {
    unsafe { call_function_obj_args(callable, &[]) }
}

/// Call `callable` with exactly one argument (new reference or null)
///
/// # Safety
/// `callable` and `arg` must be live.
#[cfg(rt_native_call_one_arg)]
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
        Runtime, code_new, err_clear, err_matches, exception_message, get_size, refcnt,
    };

    #[test]
    fn test_tuple_owns_items() {
        let _rt = Runtime::initialize();
        let code = code_new("f", "<test>", 1);
        unsafe {
            let tuple = tuple_new(&[as_object(code), as_object(code)]);
            assert_eq!(get_size(tuple), 2);
            assert_eq!(refcnt(code), 3);
            assert_eq!(tuple_get_item(tuple, 1), as_object(code));
            decref(tuple);
            assert_eq!(refcnt(code), 1);
            decref(code);
        }
    }

    #[test]
    fn test_call_identity() {
        let _rt = Runtime::initialize();
        let identity = function_new("identity", |args| {
            let arg = args[0];
            unsafe { incref(arg) };
            arg
        });
        let code = code_new("f", "<test>", 1);
        unsafe {
            let result = call_function_obj_args(identity, &[as_object(code)]);
            assert_eq!(result, as_object(code));
            assert_eq!(refcnt(code), 2);
            decref(result);
            decref(code);
            decref(identity);
        }
    }

    #[test]
    fn test_not_callable() {
        let _rt = Runtime::initialize();
        let code = code_new("f", "<test>", 1);
        unsafe {
            let result = call_function_obj_args(code, &[]);
            assert!(result.is_null());
            assert!(err_matches(types().type_error));
            assert_eq!(
                exception_message(err_occurred()),
                "'code' object is not callable"
            );
            err_clear();
            decref(code);
        }
    }

    #[test]
    fn test_null_without_error_is_system_error() {
        let _rt = Runtime::initialize();
        let broken = function_new("broken", |_| ptr::null_mut());
        unsafe {
            let result = call_function_obj_args(broken, &[]);
            assert!(result.is_null());
            assert!(err_matches(types().system_error));
            err_clear();
            decref(broken);
        }
    }

    #[test]
    fn test_argument_tuple_is_released() {
        let rt = Runtime::initialize();
        let before = rt.gc_tracked_count();
        let count_args = function_new("count", |args| unsafe { tuple_new(args).cast() });
        unsafe {
            let result = call_function_obj_args(count_args, &[]);
            assert!(!result.is_null());
            // the function and its result tuple; the argument tuple is gone
            assert_eq!(rt.gc_tracked_count(), before + 2);
            decref(result);
            decref(count_args);
        }
        assert_eq!(rt.gc_tracked_count(), before);
    }
}
