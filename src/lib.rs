#![cfg_attr(not(doc), no_std)]
#![deny(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    clippy::as_ptr_cast_mut,
    clippy::ptr_as_ptr,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Extra checks on nightly
#![cfg_attr(nightly_extra_checks, feature(rustdoc_missing_doc_code_examples))]
#![cfg_attr(nightly_extra_checks, forbid(rustdoc::missing_doc_code_examples))]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Trait objects stored inline, without heap allocation.
//!
//! ## Overview
//!
//! [`InlineBox<dyn Trait>`](crate::InlineBox) owns a value of some type
//! implementing `Trait`, like `Box<dyn Trait>` does, but keeps the value inside
//! the box itself. How
//! much room there is gets declared once per trait object type with
//! [`inline_capacity!`]. Any implementation that fits into that room can be
//! stored; one that does not fit is a compile error, not a run-time failure.
//!
//! The box is a plain value: it can be moved, put into a `Vec`, returned from
//! functions and reassigned with a value of a different concrete type. When it
//! is dropped, the destructor of the concrete type runs exactly once.
//!
//! ## Quick Example
//!
//! ```
//! use inline_box::prelude::*;
//!
//! trait Shape {
//!     fn area(&self) -> f64;
//! }
//!
//! inline_capacity! {
//!     dyn Shape => { size: 16, align: 8 };
//! }
//!
//! struct Circle {
//!     radius: f64,
//! }
//!
//! impl Shape for Circle {
//!     fn area(&self) -> f64 {
//!         3.0 * self.radius * self.radius
//!     }
//! }
//!
//! struct Rect {
//!     width: f64,
//!     height: f64,
//! }
//!
//! impl Shape for Rect {
//!     fn area(&self) -> f64 {
//!         self.width * self.height
//!     }
//! }
//!
//! let mut shape: InlineBox<dyn Shape> = InlineBox::new(Circle { radius: 1.0 });
//! assert_eq!(shape.area(), 3.0);
//!
//! shape.set(Rect {
//!     width: 2.0,
//!     height: 4.0,
//! });
//! assert_eq!(shape.area(), 8.0);
//! ```
//!
//! ## Core Concepts
//!
//! - The **capacity declaration** ([`Capacity`], usually implemented through
//!   [`inline_capacity!`]) fixes the size and alignment of the inline buffer
//!   for one trait object type. `dyn Shape` and `dyn Shape + Send` are
//!   different types and are declared separately.
//! - The **validity predicate** ([`validity::ValidBox`]) decides at compile
//!   time whether a concrete type may be stored as a given interface: it must
//!   implement the interface, fit into the buffer and be aligned by it.
//! - The **inline container** ([`InlineBox`]) stores the value together with
//!   a static table of the operations of its concrete type, which is all it
//!   needs to reach, move and drop the value later.
//!
//! For implementation details, see the [`inline-box-internals`] crate.
//!
//! [`inline-box-internals`]: inline_box_internals
//!
//! ## Thread Safety
//!
//! [`InlineBox<I>`](crate::InlineBox) is [`Send`] exactly when `I` is, and
//! [`Sync`] exactly when `I` is. Declare `dyn Trait + Send + Sync` to share
//! boxes across threads.
//!
//! ## Features
//!
//! - `alloc`: enables `InlineBox::into_boxed`, which moves the value to the
//!   heap when it was stored through a plain unsized coercion.

#[cfg(feature = "alloc")]
extern crate alloc;

#[macro_use]
mod macros;

mod capacity;
mod inline_box;
pub mod prelude;
pub mod validity;

pub use inline_box_internals::{Alignment, CoerceFrom, InlineStorage, Storage, SupportedAlignment};

pub use self::{capacity::Capacity, inline_box::InlineBox};

#[doc(hidden)]
pub mod __private {
    pub use core::ptr::NonNull;

    pub use unsize;
}
