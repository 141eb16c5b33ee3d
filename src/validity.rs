//! Compile-time check that a concrete type may be stored in an
//! [`InlineBox<I>`](crate::InlineBox).
//!
//! [`ValidBox<I, C>`] bundles the individual conditions as associated
//! constants, so they can be inspected on their own. Every constructor of
//! [`InlineBox`](crate::InlineBox) evaluates [`ValidBox::assert`] in a `const`
//! block. A failing condition therefore stops compilation at the place where
//! the box is instantiated for `C`, with a message naming the condition.
//!
//! Two conditions are not constants, because the type system already expresses
//! them:
//!
//! - `I` must have a capacity declaration ([`Capacity`]).
//! - A pointer to `C` must be viewable as a pointer to `I` ([`CoerceFrom`]).
//!   For trait objects declared with
//!   [`inline_capacity!`](crate::inline_capacity) that means `C` implements
//!   the trait.
//!
//! Without those bounds the constants do not exist at all.
//!
//! ## When the check fires
//!
//! The `const` block is evaluated when the constructor is monomorphized for a
//! concrete `C`, not when it is type-checked. `cargo check` therefore accepts
//! an `InlineBox::new` call with a type that does not fit; the error only
//! appears under `cargo build` or `cargo test`, which generate code. Generic
//! code that never instantiates the constructor is not checked either.
//!
//! # Examples
//!
//! ```
//! use inline_box::{inline_capacity, validity::ValidBox};
//!
//! trait Shape {}
//!
//! inline_capacity! {
//!     dyn Shape => { size: 16, align: 8 };
//! }
//!
//! impl Shape for u64 {}
//! impl Shape for [u64; 4] {}
//!
//! assert!(ValidBox::<dyn Shape, u64>::VALUE);
//! assert!(!ValidBox::<dyn Shape, [u64; 4]>::FITS_CAPACITY);
//! assert!(!ValidBox::<dyn Shape, [u64; 4]>::VALUE);
//! ```
//!
//! A type that does not implement the interface has no verdict:
//!
//! ```compile_fail
//! use inline_box::{inline_capacity, validity::ValidBox};
//!
//! trait Shape {}
//!
//! inline_capacity! {
//!     dyn Shape => { size: 16, align: 8 };
//! }
//!
//! let _ = ValidBox::<dyn Shape, u8>::VALUE;
//! ```

use core::{
    marker::PhantomData,
    mem::{align_of, size_of},
};

use inline_box_internals::{CoerceFrom, Storage};

use crate::Capacity;

/// The validity predicate for storing a `C` in an `InlineBox<I>`.
///
/// This type is never constructed; it only carries associated constants.
pub struct ValidBox<I: ?Sized, C> {
    _marker: PhantomData<fn(C) -> *const I>,
}

impl<I, C> ValidBox<I, C>
where
    I: ?Sized + Capacity + CoerceFrom<C>,
{
    /// Size of the inline buffer declared for `I`.
    const SIZE: usize = <I::Storage as Storage>::SIZE;
    /// Alignment of the inline buffer declared for `I`.
    const ALIGN: usize = <I::Storage as Storage>::ALIGN;

    /// The declared size and alignment are both non-zero.
    pub const NON_NULL_CAPACITY: bool = Self::SIZE > 0 && Self::ALIGN > 0;

    /// `I` is a trait object (or another type with pointer metadata), so a
    /// pointer to it can carry the dispatch information for `C`.
    pub const IS_TRAIT_OBJECT: bool = size_of::<*const I>() == 2 * size_of::<usize>();

    /// `C` is at least as large as the footprint of the interface itself.
    pub const FITS_INTERFACE: bool = size_of::<C>() >= I::MIN_SIZE;

    /// `C` fits into the declared size.
    pub const FITS_CAPACITY: bool = Self::SIZE >= size_of::<C>();

    /// The declared alignment is a multiple of the alignment of `C`, so the
    /// start of the buffer is a valid address for a `C`.
    pub const ALIGNED_WITH_CAPACITY: bool = Self::ALIGN % align_of::<C>() == 0;

    /// All conditions hold.
    pub const VALUE: bool = Self::NON_NULL_CAPACITY
        && Self::IS_TRAIT_OBJECT
        && Self::FITS_INTERFACE
        && Self::FITS_CAPACITY
        && Self::ALIGNED_WITH_CAPACITY;

    /// Panics with a message naming the first condition that does not hold.
    ///
    /// When evaluated in a `const` context this turns a failing condition into
    /// a compile error.
    ///
    /// # Examples
    ///
    /// ```compile_fail
    /// use inline_box::{inline_capacity, validity::ValidBox};
    ///
    /// trait Shape {}
    ///
    /// inline_capacity! {
    ///     dyn Shape => { size: 8, align: 8 };
    /// }
    ///
    /// impl Shape for u128 {}
    ///
    /// const _: () = ValidBox::<dyn Shape, u128>::assert();
    /// ```
    #[track_caller]
    pub const fn assert() {
        if !Self::NON_NULL_CAPACITY {
            panic!("the declared inline capacity must have a non-zero size and alignment");
        }
        if !Self::IS_TRAIT_OBJECT {
            panic!("the interface type must be a trait object");
        }
        if !Self::FITS_INTERFACE {
            panic!("concrete type is smaller than the declared interface footprint");
        }
        if !Self::FITS_CAPACITY {
            panic!("concrete type does not fit in the declared inline capacity");
        }
        if !Self::ALIGNED_WITH_CAPACITY {
            panic!("concrete type is more strictly aligned than the declared inline capacity");
        }
    }
}
