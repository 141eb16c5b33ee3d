#![no_std]
#![forbid(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::missing_docs_in_private_items,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
#![allow(rustdoc::private_intra_doc_links)]
//! Internal implementation crate for [`inline-box`].
//!
//! # Overview
//!
//! This crate contains the low-level storage, type-erasure and unsafe
//! operations that power the [`inline-box`] crate: an owning container for a
//! `dyn Trait` value that keeps the value inside the container itself instead
//! of on the heap.
//!
//! **This crate is an implementation detail.** No semantic versioning guarantees
//! are provided. Users should depend on the [`inline-box`] crate, not this one.
//!
//! # Architecture
//!
//! - **[`storage`]**: Raw inline memory
//!   - [`InlineStorage`]: A buffer of `SIZE` bytes aligned to `ALIGN`
//!   - [`Storage`]: The contract every inline buffer type upholds
//!   - [`Alignment`]/[`SupportedAlignment`]: Type-level alignment values
//!
//! - **[`CoerceFrom`]**: The unsafe trait stating that a pointer to a concrete
//!   type may be viewed as a pointer to an interface type
//!
//! - **[`slot`]**: The type-erased container
//!   - [`RawInlineBox`]: Owns one concrete value inside a [`Storage`]
//!   - [`SlotVtable`]: Function pointers captured for the concrete type
//!
//! # Safety Strategy
//!
//! When a concrete value `C` is written into a [`RawInlineBox<I, S>`], the
//! only trace of `C` that survives is a `&'static SlotVtable<I>` created for
//! exactly that `C`. Every later operation (projection to `&I`, relocation,
//! destruction) goes through that vtable, so it must never get out of sync with
//! the bytes in the storage.
//!
//! This crate maintains safety through:
//!
//! - **Module-based encapsulation**: The fields of [`RawInlineBox`] and
//!   [`SlotVtable`] are private to their modules, so the pairing of storage
//!   contents and vtable is locally verifiable within a single file
//! - **`#[repr(C)]` layout**: The storage is always the first field, so its
//!   alignment is never disturbed by the other fields
//! - **Documented unsafe contracts**: Size and alignment fit is the single
//!   precondition of construction; the safe wrapper in [`inline-box`] proves it
//!   at compile time
//!
//! [`inline-box`]: https://docs.rs/inline-box/latest/inline_box/
//! [`slot`]: crate::slot
//! [`SlotVtable`]: slot::vtable::SlotVtable

#[cfg(feature = "alloc")]
extern crate alloc;

mod coerce;
mod slot;
pub mod storage;
mod util;

pub use self::{
    coerce::CoerceFrom,
    slot::RawInlineBox,
    storage::{Alignment, InlineStorage, Storage, SupportedAlignment},
};
