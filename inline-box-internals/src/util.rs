//! Internal utility types.

/// Marker type used as the pointee of type-erased storage pointers.
///
/// A `NonNull<Erased>` points to the first byte of a [`Storage`] buffer that
/// holds a value of some concrete type `C`, though the current scope does not
/// know which one. Only the [`SlotVtable`] created for that `C` may cast it
/// back.
///
/// Using a distinct marker type (rather than `u8`) keeps erased addresses from
/// being confused with plain byte pointers in signatures.
///
/// [`Storage`]: crate::storage::Storage
/// [`SlotVtable`]: crate::slot::vtable::SlotVtable
pub(crate) struct Erased;
