//! Vtable for type-erased inline values.
//!
//! This module contains the [`SlotVtable`] which enables projecting, relocating
//! and destroying a value stored in a [`RawInlineBox`] once its concrete type
//! `C` has been erased. The vtable stores function pointers that were
//! instantiated for that `C`.
//!
//! This module encapsulates the fields of [`SlotVtable`] so they cannot be
//! accessed directly. This visibility restriction guarantees the safety
//! invariant: **the vtable's concrete type always matches the type of the
//! value in the storage it is paired with**.
//!
//! # Safety Invariant
//!
//! This invariant is maintained because vtables are created as `&'static`
//! references via [`SlotVtable::new`], which pairs the function pointers with a
//! specific type `C` at compile time.
//!
//! [`RawInlineBox`]: crate::RawInlineBox

use core::{alloc::Layout, ptr::NonNull};

use crate::{coerce::CoerceFrom, util::Erased};

/// Vtable for type-erased inline values.
///
/// Contains function pointers for operating on a value stored in inline
/// storage without knowing its concrete type at compile time.
///
/// # Safety Invariant
///
/// The fields `type_name`, `layout`, `is_unsize`, `project`, `transfer` and
/// `drop` are guaranteed to describe, or point to the functions defined below
/// instantiated with, the concrete type `C` that was used to create this
/// [`SlotVtable`].
pub(crate) struct SlotVtable<I: ?Sized> {
    /// Gets the [`core::any::type_name`] of the concrete type.
    type_name: fn() -> &'static str,
    /// The [`Layout`] of the concrete type.
    layout: Layout,
    /// The [`CoerceFrom::IS_UNSIZE`] value of `I` for the concrete type.
    is_unsize: bool,
    /// Turns the address of a `C` into the interface pointer for it.
    project: fn(NonNull<Erased>) -> NonNull<I>,
    /// Moves a `C` from one address to another and returns the interface
    /// pointer at the new address.
    transfer: unsafe fn(NonNull<Erased>, NonNull<Erased>) -> NonNull<I>,
    /// Runs the destructor of the `C` at the given address.
    drop: unsafe fn(NonNull<Erased>),
}

impl<I: ?Sized> SlotVtable<I> {
    /// Creates a new [`SlotVtable`] for the concrete type `C`.
    pub(super) const fn new<C>() -> &'static Self
    where
        I: CoerceFrom<C>,
    {
        const {
            &Self {
                type_name: core::any::type_name::<C>,
                layout: Layout::new::<C>(),
                is_unsize: <I as CoerceFrom<C>>::IS_UNSIZE,
                project: project::<I, C>,
                transfer: transfer::<I, C>,
                drop: drop::<C>,
            }
        }
    }

    /// Gets the [`core::any::type_name`] of the concrete type that was used to
    /// create this [`SlotVtable`].
    #[inline]
    pub(super) fn type_name(&self) -> &'static str {
        (self.type_name)()
    }

    /// Gets the [`Layout`] of the concrete type that was used to create this
    /// [`SlotVtable`].
    #[inline]
    pub(super) fn layout(&self) -> Layout {
        self.layout
    }

    /// Whether the interface pointer is the unsized coercion of a pointer to
    /// the concrete value, rather than a projection onto a part of it.
    #[inline]
    pub(super) fn is_unsize(&self) -> bool {
        self.is_unsize
    }

    /// Turns the address of a concrete value into the interface pointer for
    /// it.
    ///
    /// The returned pointer is only valid to dereference if `ptr` points to an
    /// initialized value of the concrete type of this [`SlotVtable`].
    #[inline]
    pub(super) fn project(&self, ptr: NonNull<Erased>) -> NonNull<I> {
        (self.project)(ptr)
    }

    /// Moves the concrete value at `src` to `dst` and returns the interface
    /// pointer at `dst`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `src` points to an initialized value of the concrete type that was
    ///    used to create this [`SlotVtable`].
    /// 2. `dst` is valid for writes of [`SlotVtable::layout`] and aligned to
    ///    it, and does not overlap the value at `src`.
    /// 3. This method moves the value out of `src`, so the caller must treat
    ///    `src` as uninitialized afterwards and must not drop it again.
    #[inline]
    pub(super) unsafe fn transfer(&self, src: NonNull<Erased>, dst: NonNull<Erased>) -> NonNull<I> {
        // SAFETY: We know that `self.transfer` points to the function
        // `transfer::<I, C>` below. That function's safety requirements are upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        // 3. Guaranteed by the caller
        unsafe { (self.transfer)(src, dst) }
    }

    /// Runs the destructor of the concrete value at `ptr`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` points to an initialized value of the concrete type that was
    ///    used to create this [`SlotVtable`].
    /// 2. This method drops the value, so the caller must ensure that it has
    ///    not previously been dropped or moved out, and that it will not be
    ///    used after calling this method.
    #[inline]
    pub(super) unsafe fn drop(&self, ptr: NonNull<Erased>) {
        // SAFETY: We know that `self.drop` points to the function `drop::<C>`
        // below. That function's safety requirements are upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        unsafe { (self.drop)(ptr) }
    }
}

/// Turns the address of a `C` into the interface pointer for it.
fn project<I: ?Sized + CoerceFrom<C>, C>(ptr: NonNull<Erased>) -> NonNull<I> {
    I::coerce(ptr.cast::<C>())
}

/// Moves the `C` at `src` to `dst` and returns the interface pointer at `dst`.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `src` points to an initialized `C`.
/// 2. `dst` is valid for writes of a `C`, aligned for `C`, and does not overlap
///    the value at `src`.
/// 3. The value at `src` is treated as uninitialized afterwards.
unsafe fn transfer<I: ?Sized + CoerceFrom<C>, C>(
    src: NonNull<Erased>,
    dst: NonNull<Erased>,
) -> NonNull<I> {
    let src = src.cast::<C>();
    let dst = dst.cast::<C>();
    // SAFETY:
    // - `src` is valid for reads of a `C` (guaranteed by the caller)
    // - `dst` is valid for writes of a `C` (guaranteed by the caller)
    // - Both are aligned for `C` and do not overlap (guaranteed by the caller)
    unsafe {
        core::ptr::copy_nonoverlapping(src.as_ptr(), dst.as_ptr(), 1);
    }
    I::coerce(dst)
}

/// Runs the destructor of the `C` at `ptr`.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `ptr` points to an initialized `C`.
/// 2. The value has not been dropped or moved out before, and is not used
///    afterwards.
unsafe fn drop<C>(ptr: NonNull<Erased>) {
    let ptr: *mut C = ptr.cast::<C>().as_ptr();
    // SAFETY: `ptr` points to an initialized `C` that is dropped exactly once,
    // as guaranteed by the caller.
    unsafe { core::ptr::drop_in_place(ptr) }
}
