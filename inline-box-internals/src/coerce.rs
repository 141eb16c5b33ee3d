//! Pointer coercion from a concrete type to an interface type.

use core::ptr::NonNull;

/// States that a pointer to the concrete type `C` can be turned into a pointer
/// to `Self`, where `Self` is an interface type such as `dyn Trait`.
///
/// For the common case the coercion is the built-in unsized coercion
/// `NonNull<C> -> NonNull<dyn Trait>`, which keeps the address and attaches
/// the vtable of `C`. The `inline_capacity!` macro of `inline-box` generates
/// exactly that for every `C: Trait`.
///
/// Hand-written implementations may also *project*: return a pointer to a
/// field of `C` that implements the interface. The interface pointer then sits
/// at a non-zero offset from the start of `C`. Destruction never goes through
/// this pointer, so the whole `C` is still dropped. Such implementations keep
/// [`CoerceFrom::IS_UNSIZE`] at `false`.
///
/// # Safety
///
/// Implementors must guarantee that for every `ptr` pointing to a valid,
/// initialized `C`, `coerce(ptr)`:
///
/// 1. Is derived from `ptr` (it carries the provenance of `ptr`).
/// 2. Points to a value that lies entirely inside the `C` pointed to by `ptr`
///    and stays valid for as long as that `C` does.
/// 3. Does not read or write through `ptr` and always yields the same offset
///    and metadata for the same `C`.
///
/// Implementors must also guarantee about the types involved:
///
/// 4. If `Self: Send`, then `C: Send`. The value is dropped on whichever
///    thread owns the container.
/// 5. If `Self: Sync`, then `C: Sync`.
/// 6. `C` outlives every lifetime bound of `Self`.
/// 7. If [`CoerceFrom::IS_UNSIZE`] is `true`, `coerce(ptr)` is the built-in
///    unsized coercion of `ptr`: it has the address of `ptr` and the metadata
///    of `C`, so [`Layout::for_value`] of the result is the layout of `C` and
///    dropping through the result drops the whole `C`.
///
/// [`Layout::for_value`]: core::alloc::Layout::for_value
///
/// # Examples
///
/// ```
/// use core::ptr::NonNull;
///
/// use inline_box_internals::CoerceFrom;
///
/// trait Greet {
///     fn greet(&self) -> &'static str;
/// }
///
/// // SAFETY: The unsized coercion keeps the address and provenance of `ptr`,
/// // and `dyn Greet` has no auto-trait bounds.
/// unsafe impl<C: Greet + 'static> CoerceFrom<C> for dyn Greet {
///     const IS_UNSIZE: bool = true;
///
///     fn coerce(ptr: NonNull<C>) -> NonNull<Self> {
///         ptr
///     }
/// }
/// ```
pub unsafe trait CoerceFrom<C> {
    /// Whether [`CoerceFrom::coerce`] is the built-in unsized coercion, as
    /// opposed to a projection onto a part of `C`.
    ///
    /// Only values stored through an unsized coercion can be moved into a
    /// `Box<Self>`.
    const IS_UNSIZE: bool = false;

    /// Converts a pointer to a `C` into a pointer to the interface.
    fn coerce(ptr: NonNull<C>) -> NonNull<Self>;
}
