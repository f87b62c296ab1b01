//! Builtin types of an interpreter
//!
//! Builtin types are static in the sense of the runtime: instances never own
//! a reference to them and they live exactly as long as their interpreter.

use std::ptr;

use super::call::{function_call, function_dealloc, tuple_dealloc};
use super::error::exception_dealloc;
use super::frame::{code_dealloc, frame_dealloc};
use super::module::{module_dealloc, type_dealloc};
use super::object::{
    Destructor, Object, TPFLAGS_BASETYPE, TPFLAGS_HAVE_GC, TPFLAGS_READY, TypeObject, object_new,
};

#[derive(Debug, Clone, Copy)]
pub struct BuiltinTypes {
    /// Metatype: the type of every type object, including itself
    pub type_type: *mut TypeObject,
    /// Root of the type hierarchy
    pub object_type: *mut TypeObject,
    pub code_type: *mut TypeObject,
    pub frame_type: *mut TypeObject,
    pub tuple_type: *mut TypeObject,
    pub function_type: *mut TypeObject,
    pub module_type: *mut TypeObject,
    pub base_exception: *mut TypeObject,
    pub type_error: *mut TypeObject,
    pub system_error: *mut TypeObject,
    pub runtime_error: *mut TypeObject,
}

impl BuiltinTypes {
    pub(super) fn create() -> Self {
        let type_type = object_new(TypeObject::new(
            ptr::null_mut(),
            "type",
            size_of::<TypeObject>(),
            TPFLAGS_BASETYPE | TPFLAGS_READY,
        ));
        unsafe {
            (*type_type).ob_base.ob_base.ob_type = type_type;
            (*type_type).tp_dealloc = Some(type_dealloc);
        }

        let make = move |name: &str, base: *mut TypeObject, flags: u64, dealloc: Destructor| {
            let ty = object_new(TypeObject::new(type_type, name, 0, flags | TPFLAGS_READY));
            unsafe {
                (*ty).tp_base = base;
                (*ty).tp_dealloc = Some(dealloc);
            }
            ty
        };

        let object_type = object_new(TypeObject::new(
            type_type,
            "object",
            size_of::<Object>(),
            TPFLAGS_BASETYPE | TPFLAGS_READY,
        ));
        unsafe { (*type_type).tp_base = object_type };

        let base_exception = make(
            "BaseException",
            object_type,
            TPFLAGS_BASETYPE,
            exception_dealloc,
        );
        let error = |name: &str| make(name, base_exception, TPFLAGS_BASETYPE, exception_dealloc);

        let function_type = make(
            "builtin_function",
            object_type,
            TPFLAGS_HAVE_GC,
            function_dealloc,
        );
        unsafe { (*function_type).tp_call = Some(function_call) };

        BuiltinTypes {
            type_type,
            object_type,
            code_type: make("code", object_type, 0, code_dealloc),
            frame_type: make("frame", object_type, TPFLAGS_HAVE_GC, frame_dealloc),
            tuple_type: make("tuple", object_type, TPFLAGS_HAVE_GC, tuple_dealloc),
            function_type,
            module_type: make(
                "module",
                object_type,
                TPFLAGS_HAVE_GC | TPFLAGS_BASETYPE,
                module_dealloc,
            ),
            base_exception,
            type_error: error("TypeError"),
            system_error: error("SystemError"),
            runtime_error: error("RuntimeError"),
        }
    }

    fn all(&self) -> [*mut TypeObject; 11] {
        [
            self.type_type,
            self.object_type,
            self.code_type,
            self.frame_type,
            self.tuple_type,
            self.function_type,
            self.module_type,
            self.base_exception,
            self.type_error,
            self.system_error,
            self.runtime_error,
        ]
    }

    /// Free every builtin type regardless of its reference count
    pub(super) unsafe fn destroy(&mut self) {
        for ty in self.all() {
            drop(unsafe { Box::from_raw(ty) });
        }
    }
}
