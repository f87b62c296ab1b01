//! Collector predicates
//!
//! Both are false for objects whose type does not carry a GC head.

#[cfg(rt_native_gc_is_finalized)]
pub use crate::host::gc_is_finalized;
#[cfg(rt_native_gc_is_tracked)]
pub use crate::host::gc_is_tracked;

#[allow(unused_imports)]
use crate::host::{ObjectLayout, gc_head_finalized, gc_head_tracked, object_is_gc};

/// Is the object currently tracked by the collector
///
/// # Safety
/// `op` must point to a live object.
#[cfg(not(rt_native_gc_is_tracked))]
#[inline]
pub unsafe fn gc_is_tracked<T: ObjectLayout>(op: *mut T) -> bool {
    unsafe { object_is_gc(op) && gc_head_tracked(op) }
}

/// Has the collector already run the object's finalizer
///
/// # Safety
/// `op` must point to a live object.
#[cfg(not(rt_native_gc_is_finalized))]
#[inline]
pub unsafe fn gc_is_finalized<T: ObjectLayout>(op: *mut T) -> bool {
    unsafe { object_is_gc(op) && gc_head_finalized(op) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{
        Object, Runtime, code_new, decref, gc_track, gc_untrack, module_new,
        object_call_finalizer, types,
    };

    unsafe fn noop_finalize(_op: *mut Object) {}

    #[test]
    fn test_gc_is_tracked() {
        let _rt = Runtime::initialize();
        let module = module_new("m");
        let code = code_new("f", "<test>", 1);
        unsafe {
            assert!(gc_is_tracked(module));
            assert!(gc_is_tracked(module));

            gc_untrack(module);
            assert!(!gc_is_tracked(module));
            gc_track(module);
            assert!(gc_is_tracked(module));

            // no GC head at all
            assert!(!gc_is_tracked(code));

            decref(code);
            decref(module);
        }
    }

    #[test]
    fn test_gc_is_finalized() {
        let _rt = Runtime::initialize();
        let module = module_new("m");
        let code = code_new("f", "<test>", 1);
        unsafe {
            assert!(!gc_is_finalized(module));
            (*types().module_type).tp_finalize = Some(noop_finalize);
            object_call_finalizer(module);
            assert!(gc_is_finalized(module));
            assert!(gc_is_finalized(module));
            // still tracked: finalization does not untrack
            assert!(gc_is_tracked(module));

            assert!(!gc_is_finalized(code));

            decref(code);
            decref(module);
        }
    }
}
