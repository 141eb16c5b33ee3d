//! Module containing the type-erased inline container

mod raw;
pub(crate) mod vtable;

pub use self::raw::RawInlineBox;
