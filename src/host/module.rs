//! Modules, heap types and type readiness

use std::collections::BTreeMap;
use std::ffi::c_int;

use super::error::{err_occurred, err_set_string, fatal_error};
use super::gc::{gc_free, gc_new, gc_track, gc_untrack};
use super::object::{
    Object, ObjectLayout, TPFLAGS_BASETYPE, TPFLAGS_HEAPTYPE, TPFLAGS_READY, TPFLAGS_READYING,
    TypeObject, as_object, decref, object_free, object_new, type_of,
};
use super::state::types;

/// A module and its namespace
#[repr(C)]
pub struct ModuleObject {
    pub ob_base: Object,
    pub md_name: String,
    /// Attribute name to owned reference
    pub md_dict: BTreeMap<String, *mut Object>,
}

unsafe impl ObjectLayout for ModuleObject {}

/// Create an empty module (new reference, tracked by the collector)
pub fn module_new(name: &str) -> *mut ModuleObject {
    let module = gc_new(ModuleObject {
        ob_base: Object::head(types().module_type),
        md_name: name.to_string(),
        md_dict: BTreeMap::new(),
    });
    unsafe { gc_track(module) };
    module
}

pub(super) unsafe fn module_dealloc(op: *mut Object) {
    unsafe {
        gc_untrack(op);
        let module = op.cast::<ModuleObject>();
        for (_, value) in std::mem::take(&mut (*module).md_dict) {
            decref(value);
        }
        gc_free::<ModuleObject>(op);
    }
}

/// Bind `name` to `value` in `module`
///
/// Steals the reference to `value` on success only. Returns `0`, or `-1`
/// with the error indicator set.
///
/// # Safety
/// `module` must be live; `value` must be null or live.
pub unsafe fn module_add_object<M: ObjectLayout, V: ObjectLayout>(
    module: *mut M,
    name: &str,
    value: *mut V,
) -> c_int {
    let module = as_object(module);
    let value = as_object(value);
    unsafe {
        if module.is_null() || type_of(module) != types().module_type {
            err_set_string(
                types().system_error,
                "module_add_object() needs module as first arg",
            );
            return -1;
        }
        if value.is_null() {
            if err_occurred().is_null() {
                err_set_string(
                    types().system_error,
                    "module_add_object() needs non-NULL value",
                );
            }
            return -1;
        }

        let module = module.cast::<ModuleObject>();
        tracing::trace!(
            target: "capi_compat::host",
            module = %(*module).md_name,
            name,
            "add object"
        );
        if let Some(old) = (*module).md_dict.insert(name.to_string(), value) {
            decref(old);
        }
    }
    0
}

/// Attribute `name` of `module` (borrowed, null when absent)
///
/// # Safety
/// `module` must point to a live module.
pub unsafe fn module_get_attr(module: *mut ModuleObject, name: &str) -> *mut Object {
    unsafe {
        (*module)
            .md_dict
            .get(name)
            .copied()
            .unwrap_or(std::ptr::null_mut())
    }
}

/// Create a heap type named `name` (new reference, not yet ready)
pub fn type_new(name: &str, flags: u64) -> *mut TypeObject {
    let ty = object_new(TypeObject::new(
        types().type_type,
        name,
        size_of::<Object>(),
        flags | TPFLAGS_HEAPTYPE,
    ));
    unsafe { (*ty).tp_dealloc = Some(object_dealloc) };
    ty
}

/// Allocate a bare instance of `ty` (new reference)
///
/// # Safety
/// `ty` must point to a live, ready type whose instances are plain objects.
pub unsafe fn type_generic_alloc(ty: *mut TypeObject) -> *mut Object {
    unsafe { debug_assert!((*ty).has_flag(TPFLAGS_READY)) };
    object_new(Object::head(ty))
}

/// Deallocator of instances of plain heap types
unsafe fn object_dealloc(op: *mut Object) {
    unsafe { object_free::<Object>(op) };
}

/// Deallocator of type objects
pub(super) unsafe fn type_dealloc(op: *mut Object) {
    let ty = op.cast::<TypeObject>();
    unsafe {
        if !(*ty).has_flag(TPFLAGS_HEAPTYPE) {
            fatal_error(&format!("deallocating static type '{}'", (*ty).tp_name));
        }
        object_free::<TypeObject>(op);
    }
}

/// Finish initializing a type: resolve its base, inherit slots, mark ready
///
/// Returns `0`, or `-1` with the error indicator set when the descriptor is
/// malformed.
///
/// # Safety
/// `ty` must point to a live type object.
pub unsafe fn type_ready(ty: *mut TypeObject) -> c_int {
    unsafe {
        if (*ty).has_flag(TPFLAGS_READY) {
            return 0;
        }
        if (*ty).has_flag(TPFLAGS_READYING) {
            err_set_string(types().system_error, "type is already being readied");
            return -1;
        }
        if (&(*ty).tp_name).is_empty() {
            err_set_string(
                types().system_error,
                "type does not define the tp_name field",
            );
            return -1;
        }

        (*ty).tp_flags |= TPFLAGS_READYING;

        let object_type = types().object_type;
        if (*ty).tp_base.is_null() && ty != object_type {
            (*ty).tp_base = object_type;
        }

        let base = (*ty).tp_base;
        if !base.is_null() {
            if !(*base).has_flag(TPFLAGS_BASETYPE) {
                err_set_string(
                    types().type_error,
                    &format!("type '{}' is not an acceptable base type", (*base).tp_name),
                );
                (*ty).tp_flags &= !TPFLAGS_READYING;
                return -1;
            }
            if type_ready(base) < 0 {
                (*ty).tp_flags &= !TPFLAGS_READYING;
                return -1;
            }
            if (*ty).ob_base.ob_base.ob_type.is_null() {
                (*ty).ob_base.ob_base.ob_type = type_of(base);
            }
            if (*ty).tp_call.is_none() {
                (*ty).tp_call = (*base).tp_call;
            }
            if (*ty).tp_finalize.is_none() {
                (*ty).tp_finalize = (*base).tp_finalize;
            }
        }

        (*ty).tp_flags = ((*ty).tp_flags & !TPFLAGS_READYING) | TPFLAGS_READY;
        tracing::trace!(target: "capi_compat::host", name = %(*ty).tp_name, "type ready");
    }
    0
}

/// Unqualified name of a type: the part after the last `.`
///
/// # Safety
/// `ty` must point to a live type object, and the returned text must not be
/// used after that type is released.
pub unsafe fn type_short_name<'a>(ty: *mut TypeObject) -> &'a str {
    let name: &'a str = unsafe { &(*ty).tp_name };
    match name.rfind('.') {
        Some(dot) => &name[dot + 1..],
        None => name,
    }
}

/// Ready `ty` and bind it in `module` under its unqualified name
///
/// Returns `0` with the module holding a new reference, or `-1` with the
/// error indicator set.
///
/// # Safety
/// `module` and `ty` must be live.
#[cfg(rt_native_module_add_type)]
pub unsafe fn module_add_type<M: ObjectLayout>(module: *mut M, ty: *mut TypeObject) -> c_int {
    unsafe {
        if type_ready(ty) < 0 {
            return -1;
        }
        let name = type_short_name(ty);
        super::object::incref(ty);
        if module_add_object(module, name, ty) < 0 {
            decref(ty);
            return -1;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Runtime, err_clear, err_matches, refcnt};

    #[test]
    fn test_add_object_steals_on_success() {
        let _rt = Runtime::initialize();
        let module = module_new("pkg");
        let ty = type_new("pkg.Value", 0);
        unsafe {
            assert_eq!(module_add_object(module, "Value", ty), 0);
            assert_eq!(refcnt(ty), 1);
            assert_eq!(module_get_attr(module, "Value"), as_object(ty));
            assert!(module_get_attr(module, "Missing").is_null());
            decref(module);
        }
    }

    #[test]
    fn test_add_object_rejects_non_module() {
        let _rt = Runtime::initialize();
        let not_module = type_new("pkg.NotAModule", 0);
        let ty = type_new("pkg.Value", 0);
        unsafe {
            assert_eq!(module_add_object(not_module, "Value", ty), -1);
            assert!(err_matches(types().system_error));
            // nothing stolen on failure
            assert_eq!(refcnt(ty), 1);
            err_clear();
            decref(ty);
            decref(not_module);
        }
    }

    #[test]
    fn test_add_object_replaces_binding() {
        let _rt = Runtime::initialize();
        let module = module_new("pkg");
        let first = type_new("pkg.First", 0);
        let second = type_new("pkg.Second", 0);
        unsafe {
            crate::host::incref(first);
            assert_eq!(module_add_object(module, "X", first), 0);
            assert_eq!(refcnt(first), 2);
            assert_eq!(module_add_object(module, "X", second), 0);
            assert_eq!(refcnt(first), 1);
            decref(first);
            decref(module);
        }
    }

    #[test]
    fn test_type_ready() {
        let _rt = Runtime::initialize();
        let ty = type_new("pkg.sub.MyType", 0);
        unsafe {
            assert!(!(*ty).has_flag(TPFLAGS_READY));
            assert_eq!(type_ready(ty), 0);
            assert!((*ty).has_flag(TPFLAGS_READY));
            assert_eq!((*ty).tp_base, types().object_type);
            // readying twice is a no-op
            assert_eq!(type_ready(ty), 0);
            decref(ty);
        }
    }

    #[test]
    fn test_type_ready_rejects_malformed() {
        let _rt = Runtime::initialize();
        let nameless = type_new("", 0);
        let sealed = type_new("pkg.Sealed", 0);
        let child = type_new("pkg.Child", 0);
        unsafe {
            assert_eq!(type_ready(nameless), -1);
            assert!(err_matches(types().system_error));
            err_clear();

            (*child).tp_base = sealed;
            assert_eq!(type_ready(child), -1);
            assert!(err_matches(types().type_error));
            assert!(!(*child).has_flag(TPFLAGS_READY | TPFLAGS_READYING));
            err_clear();

            decref(nameless);
            decref(child);
            decref(sealed);
        }
    }

    #[test]
    fn test_generic_alloc() {
        let _rt = Runtime::initialize();
        let ty = type_new("pkg.Point", TPFLAGS_BASETYPE);
        unsafe {
            assert_eq!(type_ready(ty), 0);
            let obj = type_generic_alloc(ty);
            assert_eq!(type_of(obj), ty);
            assert_eq!(refcnt(obj), 1);
            decref(obj);
            decref(ty);
        }
    }

    #[test]
    fn test_type_short_name() {
        let _rt = Runtime::initialize();
        let qualified = type_new("pkg.sub.MyType", 0);
        let plain = type_new("Plain", 0);
        unsafe {
            assert_eq!(type_short_name(qualified), "MyType");
            assert_eq!(type_short_name(plain), "Plain");
            decref(qualified);
            decref(plain);
        }
    }
}
