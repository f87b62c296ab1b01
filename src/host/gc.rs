//! Cyclic collector bookkeeping
//!
//! Objects whose type has `TPFLAGS_HAVE_GC` are allocated with a [`GcHead`]
//! placed immediately before the object header:
//! ```text
//! +-----------+----------------------+
//! |  GcHead   |  Object | fields...  |
//! +-----------+----------------------+
//!             ^ object pointer
//! ```
//! A tracked object is linked into its interpreter's generation list. The
//! low bit of `gc_prev` records that the object's finalizer already ran; it
//! survives untracking.
//!
//! Only the bookkeeping lives here. Collection itself is not modelled.

use std::mem::{align_of, offset_of, size_of};
use std::ptr;

use super::object::{Object, ObjectLayout, TPFLAGS_HAVE_GC, as_object};

/// `gc_prev` bit: the finalizer already ran
const PREV_MASK_FINALIZED: usize = 1;

/// Collector header preceding every GC-capable object
#[repr(C)]
pub struct GcHead {
    /// Next entry in the generation list; null when untracked
    pub gc_next: *mut GcHead,
    /// Previous entry, tagged with `PREV_MASK_FINALIZED`
    pub gc_prev: usize,
}

impl GcHead {
    const fn untracked() -> Self {
        GcHead {
            gc_next: ptr::null_mut(),
            gc_prev: 0,
        }
    }

    /// The collector header of a GC-capable object
    ///
    /// # Safety
    /// `op` must point to an object allocated by [`gc_new`].
    #[inline]
    pub unsafe fn of(op: *mut Object) -> *mut GcHead {
        unsafe { op.cast::<GcHead>().sub(1) }
    }

    #[inline]
    pub fn is_tracked(&self) -> bool {
        !self.gc_next.is_null()
    }

    #[inline]
    pub fn is_finalized(&self) -> bool {
        self.gc_prev & PREV_MASK_FINALIZED != 0
    }

    #[inline]
    pub fn set_finalized(&mut self) {
        self.gc_prev |= PREV_MASK_FINALIZED;
    }

    #[inline]
    fn prev(&self) -> *mut GcHead {
        (self.gc_prev & !PREV_MASK_FINALIZED) as *mut GcHead
    }

    #[inline]
    fn set_prev(&mut self, prev: *mut GcHead) {
        self.gc_prev = (prev as usize) | (self.gc_prev & PREV_MASK_FINALIZED);
    }
}

/// Allocation unit of a GC-capable object
#[repr(C)]
struct GcBox<T> {
    gc: GcHead,
    obj: T,
}

/// Generation list of an interpreter
pub struct GcState {
    /// List sentinel; heap-allocated so its address is stable
    generation0: *mut GcHead,
}

impl GcState {
    pub fn new() -> Self {
        let head = Box::into_raw(Box::new(GcHead::untracked()));
        unsafe {
            (*head).gc_next = head;
            (*head).gc_prev = head as usize;
        }
        GcState { generation0: head }
    }

    /// Number of tracked objects
    pub fn tracked_count(&self) -> usize {
        let sentinel = self.generation0;
        let mut count = 0;
        unsafe {
            let mut cur = (*sentinel).gc_next;
            while cur != sentinel {
                count += 1;
                cur = (*cur).gc_next;
            }
        }
        count
    }

    /// Unlink every tracked object, leaving them untracked
    ///
    /// Used when the interpreter goes away while objects are still alive, so
    /// a later untrack does not touch the freed sentinel.
    pub fn detach_all(&mut self) -> usize {
        let sentinel = self.generation0;
        let mut count = 0;
        unsafe {
            let mut cur = (*sentinel).gc_next;
            while cur != sentinel {
                let next = (*cur).gc_next;
                (*cur).gc_next = ptr::null_mut();
                (*cur).gc_prev &= PREV_MASK_FINALIZED;
                cur = next;
                count += 1;
            }
            (*sentinel).gc_next = sentinel;
            (*sentinel).gc_prev = sentinel as usize;
        }
        count
    }
}

impl Default for GcState {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for GcState {
    fn drop(&mut self) {
        self.detach_all();
        drop(unsafe { Box::from_raw(self.generation0) });
    }
}

/// Allocate a GC-capable object, untracked, and return the creator's reference
pub fn gc_new<T: ObjectLayout>(value: T) -> *mut T {
    // The header lookup in `GcHead::of` relies on the object following the
    // GC head with no padding.
    const { assert!(align_of::<T>() <= align_of::<GcHead>()) };
    debug_assert_eq!(offset_of!(GcBox<T>, obj), size_of::<GcHead>());

    let boxed = Box::into_raw(Box::new(GcBox {
        gc: GcHead::untracked(),
        obj: value,
    }));
    unsafe { &raw mut (*boxed).obj }
}

/// Free an object allocated by [`gc_new`]
///
/// # Safety
/// `op` must come from `gc_new::<T>`, be untracked and have no remaining owners.
pub unsafe fn gc_free<T: ObjectLayout>(op: *mut Object) {
    unsafe {
        let gc = GcHead::of(op);
        debug_assert!(!(*gc).is_tracked(), "freeing a tracked object");
        drop(Box::from_raw(gc.cast::<GcBox<T>>()));
    }
}

/// Does the object's type carry a GC head
///
/// # Safety
/// `op` must point to a live object.
#[inline]
pub unsafe fn object_is_gc<T: ObjectLayout>(op: *mut T) -> bool {
    unsafe { (*(*as_object(op)).ob_type).has_flag(TPFLAGS_HAVE_GC) }
}

/// Tracked bit of the GC head, without checking the object is GC-capable
///
/// # Safety
/// `op` must point to a live object allocated by [`gc_new`].
#[inline]
pub unsafe fn gc_head_tracked<T: ObjectLayout>(op: *mut T) -> bool {
    unsafe { (*GcHead::of(as_object(op))).is_tracked() }
}

/// Finalized bit of the GC head, without checking the object is GC-capable
///
/// # Safety
/// `op` must point to a live object allocated by [`gc_new`].
#[inline]
pub unsafe fn gc_head_finalized<T: ObjectLayout>(op: *mut T) -> bool {
    unsafe { (*GcHead::of(as_object(op))).is_finalized() }
}

/// Start tracking an object in the current interpreter's generation list
///
/// # Safety
/// `op` must point to a live, untracked object allocated by [`gc_new`], and a
/// thread state must be current.
pub unsafe fn gc_track<T: ObjectLayout>(op: *mut T) {
    unsafe {
        let gc = GcHead::of(as_object(op));
        assert!(
            !(*gc).is_tracked(),
            "object already tracked by the collector"
        );

        let interp = super::state::current_interp();
        let head = (*interp).gc.generation0;
        let last = (*head).prev();

        (*last).gc_next = gc;
        (*gc).set_prev(last);
        (*gc).gc_next = head;
        (*head).set_prev(gc);
    }
}

/// Stop tracking an object; no-op when it is not tracked
///
/// # Safety
/// `op` must point to a live object allocated by [`gc_new`].
pub unsafe fn gc_untrack<T: ObjectLayout>(op: *mut T) {
    unsafe {
        let gc = GcHead::of(as_object(op));
        if !(*gc).is_tracked() {
            return;
        }
        let prev = (*gc).prev();
        let next = (*gc).gc_next;
        (*prev).gc_next = next;
        (*next).set_prev(prev);
        (*gc).gc_next = ptr::null_mut();
        (*gc).gc_prev &= PREV_MASK_FINALIZED;
    }
}

// Predicates the runtime exports from 3.9.0a6 on.

/// Is the object currently tracked by the collector
///
/// # Safety
/// `op` must point to a live object.
#[cfg(rt_native_gc_is_tracked)]
pub unsafe fn gc_is_tracked<T: ObjectLayout>(op: *mut T) -> bool {
    unsafe { object_is_gc(op) && gc_head_tracked(op) }
}

/// Has the collector already run the object's finalizer
///
/// # Safety
/// `op` must point to a live object.
#[cfg(rt_native_gc_is_finalized)]
pub unsafe fn gc_is_finalized<T: ObjectLayout>(op: *mut T) -> bool {
    unsafe { object_is_gc(op) && gc_head_finalized(op) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Runtime, decref, module_new, tuple_new};

    #[test]
    fn test_gc_state_starts_empty() {
        let state = GcState::new();
        assert_eq!(state.tracked_count(), 0);
    }

    #[test]
    fn test_track_untrack() {
        let rt = Runtime::initialize();
        let before = rt.gc_tracked_count();

        let module = module_new("m");
        unsafe {
            assert!(object_is_gc(module));
            assert!(gc_head_tracked(module));
            assert_eq!(rt.gc_tracked_count(), before + 1);

            gc_untrack(module);
            assert!(!gc_head_tracked(module));
            assert_eq!(rt.gc_tracked_count(), before);

            // Untracking twice is harmless
            gc_untrack(module);

            gc_track(module);
            assert!(gc_head_tracked(module));
            decref(module);
        }
        assert_eq!(rt.gc_tracked_count(), before);
    }

    #[test]
    fn test_untrack_from_middle_of_list() {
        let rt = Runtime::initialize();
        let before = rt.gc_tracked_count();

        let (a, b, c) = unsafe { (tuple_new(&[]), tuple_new(&[]), tuple_new(&[])) };
        assert_eq!(rt.gc_tracked_count(), before + 3);
        unsafe {
            decref(b);
            assert_eq!(rt.gc_tracked_count(), before + 2);
            decref(a);
            decref(c);
        }
        assert_eq!(rt.gc_tracked_count(), before);
    }

    #[test]
    fn test_finalized_bit_survives_untrack() {
        let _rt = Runtime::initialize();
        let module = module_new("m");
        unsafe {
            let gc = GcHead::of(as_object(module));
            (*gc).set_finalized();
            gc_untrack(module);
            assert!(gc_head_finalized(module));
            assert!(!gc_head_tracked(module));
            decref(module);
        }
    }

    #[test]
    fn test_detach_all() {
        let mut state = GcState::new();
        assert_eq!(state.detach_all(), 0);
        assert_eq!(state.tracked_count(), 0);
    }
}
