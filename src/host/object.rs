//! Object headers, type objects and the reference-counting primitives
//!
//! Every managed object starts with an [`Object`] header; variable-size
//! objects start with a [`VarObject`]. Concrete object structs are
//! `#[repr(C)]` with the header as their first field, so a pointer to any of
//! them can be viewed as a pointer to the header. The [`ObjectLayout`] marker
//! trait records which structs uphold that.

use std::ptr;

use super::gc::GcHead;

/// Signed size type used for counts and lengths
pub type Ssize = isize;

/// Releases the memory of an object whose reference count reached zero
pub type Destructor = unsafe fn(*mut Object);

/// Call slot: `(callable, args tuple, kwargs or null) -> new reference or null`
pub type TernaryFunc =
    unsafe fn(callable: *mut Object, args: *mut Object, kwargs: *mut Object) -> *mut Object;

/// Type flag: the type was created at run time and owns its memory
pub const TPFLAGS_HEAPTYPE: u64 = 1 << 9;
/// Type flag: the type may be subclassed
pub const TPFLAGS_BASETYPE: u64 = 1 << 10;
/// Type flag: `type_ready` completed
pub const TPFLAGS_READY: u64 = 1 << 12;
/// Type flag: `type_ready` is in progress
pub const TPFLAGS_READYING: u64 = 1 << 13;
/// Type flag: instances carry a GC head and may be tracked by the collector
pub const TPFLAGS_HAVE_GC: u64 = 1 << 14;

/// Common header of all managed objects
#[repr(C)]
pub struct Object {
    /// Number of owning references
    pub ob_refcnt: Ssize,
    /// Type descriptor (not owned by the instance)
    pub ob_type: *mut TypeObject,
}

impl Object {
    /// Header of a freshly allocated object: one reference, owned by the creator
    #[inline]
    pub const fn head(ty: *mut TypeObject) -> Self {
        Object {
            ob_refcnt: 1,
            ob_type: ty,
        }
    }
}

/// Header of variable-size objects
#[repr(C)]
pub struct VarObject {
    pub ob_base: Object,
    /// Number of items
    pub ob_size: Ssize,
}

impl VarObject {
    #[inline]
    pub const fn head(ty: *mut TypeObject, size: Ssize) -> Self {
        VarObject {
            ob_base: Object::head(ty),
            ob_size: size,
        }
    }
}

/// Marker for structs that begin with an [`Object`] header
///
/// # Safety
/// Implementors must be `#[repr(C)]` and have an `Object` (directly or via
/// `VarObject`) as their first field.
pub unsafe trait ObjectLayout {}

/// Marker for structs that begin with a [`VarObject`] header
///
/// # Safety
/// Implementors must be `#[repr(C)]` and have a `VarObject` as their first field.
pub unsafe trait VarLayout: ObjectLayout {}

unsafe impl ObjectLayout for Object {}
unsafe impl ObjectLayout for VarObject {}
unsafe impl VarLayout for VarObject {}
unsafe impl ObjectLayout for TypeObject {}
unsafe impl VarLayout for TypeObject {}

/// View any object pointer as a pointer to its header
#[inline]
pub fn as_object<T: ObjectLayout>(op: *mut T) -> *mut Object {
    op.cast()
}

/// View any variable-size object pointer as a pointer to its header
#[inline]
pub fn as_var_object<T: VarLayout>(op: *mut T) -> *mut VarObject {
    op.cast()
}

/// Type descriptor
///
/// Type objects are managed objects themselves; their `ob_type` is the
/// interpreter's metatype.
#[repr(C)]
pub struct TypeObject {
    pub ob_base: VarObject,
    /// Qualified name, e.g. `"pkg.sub.MyType"`
    pub tp_name: String,
    /// Instance size in bytes
    pub tp_basicsize: usize,
    pub tp_flags: u64,
    pub tp_dealloc: Option<Destructor>,
    pub tp_call: Option<TernaryFunc>,
    /// Run once before an instance is collected
    pub tp_finalize: Option<Destructor>,
    /// Base type, or null for a root type
    pub tp_base: *mut TypeObject,
}

impl TypeObject {
    /// A type descriptor with no slots filled in
    pub fn new(metatype: *mut TypeObject, name: &str, basicsize: usize, flags: u64) -> Self {
        TypeObject {
            ob_base: VarObject::head(metatype, 0),
            tp_name: name.to_string(),
            tp_basicsize: basicsize,
            tp_flags: flags,
            tp_dealloc: None,
            tp_call: None,
            tp_finalize: None,
            tp_base: ptr::null_mut(),
        }
    }

    #[inline]
    pub fn has_flag(&self, flag: u64) -> bool {
        self.tp_flags & flag != 0
    }
}

/// Allocate an object without a GC head and return the creator's reference
pub fn object_new<T: ObjectLayout>(value: T) -> *mut T {
    Box::into_raw(Box::new(value))
}

/// Free an object allocated by [`object_new`]
///
/// # Safety
/// `op` must come from `object_new::<T>` and have no remaining owners.
pub unsafe fn object_free<T: ObjectLayout>(op: *mut Object) {
    drop(unsafe { Box::from_raw(op.cast::<T>()) });
}

/// Increment the reference count
///
/// # Safety
/// `op` must point to a live object.
#[inline]
pub unsafe fn incref<T: ObjectLayout>(op: *mut T) {
    unsafe { (*as_object(op)).ob_refcnt += 1 };
}

/// Decrement the reference count, deallocating at zero
///
/// # Safety
/// `op` must point to a live object and the caller must own the reference
/// being released.
#[inline]
pub unsafe fn decref<T: ObjectLayout>(op: *mut T) {
    let op = as_object(op);
    unsafe {
        debug_assert!((*op).ob_refcnt > 0, "decref of an object with no owners");
        (*op).ob_refcnt -= 1;
        if (*op).ob_refcnt == 0 {
            dealloc(op);
        }
    }
}

/// [`incref`] tolerating null
///
/// # Safety
/// `op` must be null or point to a live object.
#[inline]
pub unsafe fn xincref<T: ObjectLayout>(op: *mut T) {
    if !op.is_null() {
        unsafe { incref(op) };
    }
}

/// [`decref`] tolerating null
///
/// # Safety
/// `op` must be null or satisfy the contract of [`decref`].
#[inline]
pub unsafe fn xdecref<T: ObjectLayout>(op: *mut T) {
    if !op.is_null() {
        unsafe { decref(op) };
    }
}

/// Replace `*slot` with `value` and release the previous value
///
/// # Safety
/// `*slot` must be null or an owned reference; `value` is stolen.
pub unsafe fn xsetref<T: ObjectLayout>(slot: &mut *mut T, value: *mut T) {
    let old = std::mem::replace(slot, value);
    unsafe { xdecref(old) };
}

/// Current reference count
///
/// # Safety
/// `op` must point to a live object.
#[inline]
pub unsafe fn refcnt<T: ObjectLayout>(op: *mut T) -> Ssize {
    unsafe { (*as_object(op)).ob_refcnt }
}

/// Type of an object (borrowed)
///
/// # Safety
/// `op` must point to a live object.
#[inline]
pub unsafe fn type_of<T: ObjectLayout>(op: *mut T) -> *mut TypeObject {
    unsafe { (*as_object(op)).ob_type }
}

/// Size field of a variable-size object
///
/// # Safety
/// `op` must point to a live variable-size object.
#[inline]
pub unsafe fn get_size<T: VarLayout>(op: *mut T) -> Ssize {
    unsafe { (*as_var_object(op)).ob_size }
}

/// Qualified type name of an object
///
/// # Safety
/// `op` must point to a live object with a live type, and the returned text
/// must not be used after that type is released.
pub unsafe fn type_name<'a, T: ObjectLayout>(op: *mut T) -> &'a str {
    unsafe { &(*type_of(op)).tp_name }
}

unsafe fn dealloc(op: *mut Object) {
    unsafe {
        let ty = (*op).ob_type;
        match (*ty).tp_dealloc {
            Some(destructor) => destructor(op),
            None => super::fatal_error(&format!(
                "object of type '{}' has no deallocator",
                (*ty).tp_name
            )),
        }
    }
}

/// Run the type's finalizer once and record that it ran
///
/// # Safety
/// `op` must point to a live object.
pub unsafe fn object_call_finalizer<T: ObjectLayout>(op: *mut T) {
    let op = as_object(op);
    unsafe {
        let ty = (*op).ob_type;
        let Some(finalize) = (*ty).tp_finalize else {
            return;
        };
        if (*ty).has_flag(TPFLAGS_HAVE_GC) {
            let gc = GcHead::of(op);
            if (*gc).is_finalized() {
                return;
            }
            finalize(op);
            (*gc).set_finalized();
        } else {
            finalize(op);
        }
    }
}

// Accessors the runtime exports from 3.9.0a4 on. Older releases only had the
// assignable field access that `compat` falls back to.

/// Set the reference count
///
/// # Safety
/// `op` must point to a live object.
#[cfg(rt_native_set_refcnt)]
#[inline]
pub unsafe fn set_refcnt<T: ObjectLayout>(op: *mut T, refcnt: Ssize) {
    unsafe { (*as_object(op)).ob_refcnt = refcnt };
}

/// Set the type descriptor
///
/// # Safety
/// `op` must point to a live object.
#[cfg(rt_native_set_type)]
#[inline]
pub unsafe fn set_type<T: ObjectLayout>(op: *mut T, ty: *mut TypeObject) {
    unsafe { (*as_object(op)).ob_type = ty };
}

/// Set the size field
///
/// # Safety
/// `op` must point to a live variable-size object.
#[cfg(rt_native_set_size)]
#[inline]
pub unsafe fn set_size<T: VarLayout>(op: *mut T, size: Ssize) {
    unsafe { (*as_var_object(op)).ob_size = size };
}

/// Is `ty` exactly the type of `op` (subclasses do not count)
///
/// # Safety
/// `op` must point to a live object.
#[cfg(rt_native_is_type)]
#[inline]
pub unsafe fn is_type<T: ObjectLayout>(op: *mut T, ty: *const TypeObject) -> bool {
    unsafe { ptr::eq((*as_object(op)).ob_type, ty) }
}

/// Return a new reference to `op`
///
/// # Safety
/// `op` must point to a live object.
#[cfg(rt_native_new_ref)]
#[inline]
pub unsafe fn new_ref<T: ObjectLayout>(op: *mut T) -> *mut T {
    unsafe { incref(op) };
    op
}

/// Return a new reference to `op`, or null
///
/// # Safety
/// `op` must be null or point to a live object.
#[cfg(rt_native_new_ref)]
#[inline]
pub unsafe fn xnew_ref<T: ObjectLayout>(op: *mut T) -> *mut T {
    unsafe { xincref(op) };
    op
}
