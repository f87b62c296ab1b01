//! Type registration into a module

#[cfg(rt_native_module_add_type)]
pub use crate::host::module_add_type;

#[cfg(not(rt_native_module_add_type))]
use std::ffi::c_int;

#[cfg(not(rt_native_module_add_type))]
use crate::host::{
    ObjectLayout, TypeObject, decref, module_add_object, type_ready, type_short_name,
};

/// Ready `ty` and bind it in `module` under its unqualified name
///
/// Returns `0` with the module holding one new reference to `ty`, or `-1`
/// with the error indicator set and the reference count of `ty` unchanged.
///
/// # Safety
/// `module` and `ty` must be live.
#[cfg(not(rt_native_module_add_type))]
pub unsafe fn module_add_type<M: ObjectLayout>(module: *mut M, ty: *mut TypeObject) -> c_int {
    unsafe {
        if type_ready(ty) < 0 {
            return -1;
        }
        let name = type_short_name(ty);
        let ty = super::refs::new_ref(ty);
        if module_add_object(module, name, ty) < 0 {
            tracing::warn!(
                target: "capi_compat::compat",
                name,
                "registration failed, releasing type"
            );
            decref(ty);
            return -1;
        }
    }
    0
}
