//! Type-erased inline container.
//!
//! This module encapsulates the `storage` and `vtable` fields of
//! [`RawInlineBox`], ensuring they are only visible within this module. This
//! visibility restriction guarantees the safety invariant: **the storage always
//! holds exactly one initialized value of the concrete type described by the
//! vtable**.
//!
//! # Safety Invariant
//!
//! Both fields can only be set together via [`RawInlineBox::new_with`], and
//! neither can be modified afterward. The value leaves the storage only in
//! [`RawInlineBox::transfer_into`] (which consumes the container without running
//! its destructor) and in the [`Drop`] implementation.
//!
//! # Moves
//!
//! Moving a [`RawInlineBox`] copies the storage bytes, which relocates the
//! stored value. This is valid for every Rust value that is not pinned, and the
//! container never hands out pinned references. For that reason the interface
//! pointer is not cached: it is projected from the current storage address on
//! every access, so it can never point at a stale location.

use core::{alloc::Layout, marker::PhantomData, ptr::NonNull};

use crate::{coerce::CoerceFrom, slot::vtable::SlotVtable, storage::Storage, util::Erased};

/// An owned value of some concrete type `C`, stored inline in `S` and accessed
/// as the interface type `I`.
///
/// We know that `I: CoerceFrom<C>` held when the value was stored, and that `C`
/// fits into `S`, but we do not know which `C` it is.
///
/// The storage is the first field of the `#[repr(C)]` struct, so the storage
/// alignment is the alignment of the container.
#[repr(C)]
pub struct RawInlineBox<I: ?Sized + 'static, S: Storage> {
    /// Inline memory holding the value.
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. The storage holds an initialized value of the concrete type `C` that
    ///    `vtable` was created for, starting at the first byte of the storage.
    /// 2. The value is initialized for the entire lifetime of this object,
    ///    except during the execution of the `Drop` implementation.
    storage: S,

    /// Operations for the concrete type stored in `storage`.
    ///
    /// # Safety
    ///
    /// The vtable was created for the same `C` as the value in `storage`, and
    /// is never replaced.
    vtable: &'static SlotVtable<I>,

    /// Marker to tell the compiler that we own a value usable as an `I`. This
    /// makes the container `Send` exactly when `I: Send`, which is sound
    /// because `CoerceFrom` requires the stored value to be `Send` whenever
    /// `I` is.
    _marker: PhantomData<I>,
}

impl<I: ?Sized + 'static, S: Storage> RawInlineBox<I, S> {
    /// Creates a new [`RawInlineBox`] holding the value returned by `init`.
    ///
    /// The value is written straight into fresh storage. If `init` panics,
    /// nothing has been stored and nothing is dropped.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `size_of::<C>() <= S::SIZE`
    /// 2. `S::ALIGN` is a multiple of `align_of::<C>()`
    #[inline]
    pub unsafe fn new_with<C, F>(init: F) -> Self
    where
        I: CoerceFrom<C>,
        C: 'static,
        F: FnOnce() -> C,
    {
        debug_assert!(core::mem::size_of::<C>() <= S::SIZE);
        debug_assert!(S::ALIGN % core::mem::align_of::<C>() == 0);

        let storage = S::uninit();
        let ptr: *mut C = storage.as_ptr().cast::<C>().as_ptr();

        // SAFETY: The storage is valid for writes of `S::SIZE` bytes aligned to
        // `S::ALIGN` (guaranteed by `Storage`), and the caller guarantees that
        // `C` fits in both size and alignment.
        unsafe {
            ptr.write(init());
        }

        Self {
            storage,
            vtable: SlotVtable::new::<C>(),
            _marker: PhantomData,
        }
    }

    /// Returns the erased address of the stored value.
    #[inline]
    fn erased_ptr(&self) -> NonNull<Erased> {
        self.storage.as_ptr().cast::<Erased>()
    }

    /// Returns a pointer to the first byte of the storage.
    ///
    /// This is where the concrete value starts. The interface pointer returned
    /// by [`RawInlineBox::as_ptr`] may lie at an offset from it.
    #[inline]
    pub fn storage_ptr(&self) -> NonNull<u8> {
        self.storage.as_ptr()
    }

    /// Returns the interface pointer for the stored value.
    ///
    /// The pointer is only valid until the container is moved or dropped.
    #[inline]
    pub fn as_ptr(&self) -> NonNull<I> {
        self.vtable.project(self.erased_ptr())
    }

    /// Returns a shared reference to the stored value as an `I`.
    #[inline]
    pub fn as_ref(&self) -> &I {
        let ptr = self.as_ptr();
        // SAFETY:
        // - The storage holds an initialized `C` (our type invariant), and the
        //   projection of the vtable for that `C` yields a pointer into it
        //   (guaranteed by `CoerceFrom`)
        // - The storage is behind an `UnsafeCell` and we hold a shared borrow of
        //   `self`, so no mutable reference to the value exists for the lifetime
        //   of the returned reference
        unsafe { ptr.as_ref() }
    }

    /// Returns a mutable reference to the stored value as an `I`.
    #[inline]
    pub fn as_mut(&mut self) -> &mut I {
        let mut ptr = self.as_ptr();
        // SAFETY:
        // - The storage holds an initialized `C` (our type invariant), and the
        //   projection of the vtable for that `C` yields a pointer into it
        //   (guaranteed by `CoerceFrom`)
        // - We hold a mutable borrow of `self`, so the returned reference is
        //   unique for its lifetime
        unsafe { ptr.as_mut() }
    }

    /// Returns the [`core::any::type_name`] of the concrete type.
    #[inline]
    pub fn concrete_type_name(&self) -> &'static str {
        self.vtable.type_name()
    }

    /// Returns the [`Layout`] of the concrete type.
    #[inline]
    pub fn concrete_layout(&self) -> Layout {
        self.vtable.layout()
    }

    /// Returns whether the interface pointer is the unsized coercion of a
    /// pointer to the stored value ([`CoerceFrom::IS_UNSIZE`]).
    ///
    /// When this is `false`, the interface pointer refers to a part of the
    /// stored value only.
    #[inline]
    pub fn is_unsize(&self) -> bool {
        self.vtable.is_unsize()
    }

    /// Moves the stored value to `dst` and returns the interface pointer at
    /// its new address.
    ///
    /// The container is consumed without running the destructor of the value;
    /// ownership of the value passes to the caller.
    ///
    /// The returned pointer may only be used to drop or deallocate the value
    /// if [`RawInlineBox::is_unsize`] returned `true`. Otherwise it points to
    /// a part of the value, and dropping through it would skip the rest of
    /// the value while its layout differs from [`RawInlineBox::concrete_layout`].
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `dst` is valid for writes of [`RawInlineBox::concrete_layout`] bytes
    ///    and aligned to its alignment.
    /// 2. `dst` does not overlap the storage of this container.
    #[inline]
    pub unsafe fn transfer_into(self, dst: NonNull<u8>) -> NonNull<I> {
        let this = core::mem::ManuallyDrop::new(self);
        let vtable = this.vtable;
        let src = this.erased_ptr();

        // SAFETY:
        // 1. The storage holds an initialized value of the concrete type of the
        //    vtable (our type invariant)
        // 2. Guaranteed by the caller
        // 3. `this` is wrapped in `ManuallyDrop` and is not used again, so the
        //    moved-out value is neither dropped nor read afterwards
        unsafe { vtable.transfer(src, dst.cast::<Erased>()) }
    }

    /// Moves the stored value into a heap allocation.
    ///
    /// This only works for values whose interface pointer is the unsized
    /// coercion of a pointer to the whole value ([`RawInlineBox::is_unsize`]).
    /// A `Box<I>` deallocates and drops through its interface pointer, so a
    /// value exposed through one of its parts cannot be owned by one. Such
    /// containers are returned unchanged in the `Err` variant.
    ///
    /// Zero-sized values are not allocated; the returned [`Box`] then holds a
    /// dangling pointer with the right alignment, as [`Box`] expects.
    ///
    /// [`Box`]: alloc::boxed::Box
    #[cfg(feature = "alloc")]
    pub fn into_boxed(self) -> Result<alloc::boxed::Box<I>, Self> {
        if !self.is_unsize() {
            return Err(self);
        }

        let layout = self.concrete_layout();
        let dst: NonNull<u8> = if layout.size() == 0 {
            let ptr = core::ptr::without_provenance_mut::<u8>(layout.align());
            // SAFETY: Alignments are never zero.
            unsafe { NonNull::new_unchecked(ptr) }
        } else {
            // SAFETY: The layout has a non-zero size.
            let ptr = unsafe { alloc::alloc::alloc(layout) };
            match NonNull::new(ptr) {
                Some(ptr) => ptr,
                None => alloc::alloc::handle_alloc_error(layout),
            }
        };

        // SAFETY:
        // 1. `dst` was allocated with (or, for zero-sized values, is aligned to)
        //    the concrete layout
        // 2. A fresh allocation cannot overlap our storage
        let ptr = unsafe { self.transfer_into(dst) };

        // SAFETY: The vtable was created with `CoerceFrom::IS_UNSIZE == true`,
        // so `ptr` is the unsized coercion of `dst`: it starts the allocation,
        // and its metadata belongs to the concrete type. `Box<I>` therefore
        // drops the whole value and deallocates with `Layout::for_value`, which
        // is the concrete layout used for the allocation above.
        Ok(unsafe { alloc::boxed::Box::from_raw(ptr.as_ptr()) })
    }
}

impl<I: ?Sized + 'static, S: Storage> core::ops::Drop for RawInlineBox<I, S> {
    #[inline]
    fn drop(&mut self) {
        let ptr = self.erased_ptr();

        // SAFETY:
        // 1. The storage holds an initialized value of the concrete type of the
        //    vtable (our type invariant)
        // 2. We are in the drop function, so the value is dropped exactly once
        //    and not used afterwards
        unsafe { self.vtable.drop(ptr) }
    }
}

// SAFETY: A shared reference to a `RawInlineBox` only ever gives out `&I`, so
// sharing it across threads is sound exactly when sharing `&I` is, i.e. when
// `I: Sync`. The storage is otherwise never touched through a shared
// reference, and `CoerceFrom` requires the stored value to be `Sync` whenever
// `I` is.
unsafe impl<I: ?Sized + Sync + 'static, S: Storage> Sync for RawInlineBox<I, S> {}

impl<I: ?Sized + core::fmt::Debug + 'static, S: Storage> core::fmt::Debug for RawInlineBox<I, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(self.as_ref(), f)
    }
}
