//! The per-interface inline capacity.
//!
//! An [`InlineBox<I>`](crate::InlineBox) can only be named for an interface
//! `I` that implements [`Capacity`]. The implementation is normally generated
//! by [`inline_capacity!`](crate::inline_capacity), which also teaches the
//! crate how to view every implementor of the trait as the interface.

use inline_box_internals::Storage;

/// Declares how much inline memory an interface type reserves for its
/// implementors.
///
/// This trait is implemented on the interface type itself, typically a trait
/// object such as `dyn Shape` or `dyn Shape + Send + Sync`. Each of those is a
/// distinct type, so each needs its own declaration.
///
/// The interface must be `'static`: the box keeps a `&'static` table of
/// operations that names it.
///
/// The declared size and alignment are those of [`Capacity::Storage`]:
/// `<I::Storage as Storage>::SIZE` and `<I::Storage as Storage>::ALIGN`.
///
/// # Examples
///
/// ```
/// use inline_box::{Capacity, Storage, inline_capacity};
///
/// trait Shape {
///     fn area(&self) -> f64;
/// }
///
/// inline_capacity! {
///     dyn Shape => { size: 32, align: 8 };
/// }
///
/// assert_eq!(<<dyn Shape as Capacity>::Storage as Storage>::SIZE, 32);
/// assert_eq!(<<dyn Shape as Capacity>::Storage as Storage>::ALIGN, 8);
/// ```
///
/// An interface without a declaration cannot be boxed:
///
/// ```compile_fail
/// use inline_box::InlineBox;
///
/// trait Undeclared {}
/// struct Value;
/// impl Undeclared for Value {}
///
/// let boxed: InlineBox<dyn Undeclared> = InlineBox::new(Value);
/// ```
pub trait Capacity: 'static {
    /// The inline buffer reserved for implementors of the interface.
    type Storage: Storage;

    /// The smallest footprint a value must have to be stored as this
    /// interface.
    ///
    /// Trait objects have no footprint of their own, so this defaults to
    /// zero.
    const MIN_SIZE: usize = 0;
}
