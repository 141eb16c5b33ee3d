//! Commonly used items for convenient importing.
//!
//! # Usage
//!
//! ```rust
//! use inline_box::prelude::*;
//!
//! trait Greeter {
//!     fn greet(&self) -> String;
//! }
//!
//! inline_capacity! {
//!     dyn Greeter => { size: 24, align: 8 };
//! }
//!
//! struct English;
//! impl Greeter for English {
//!     fn greet(&self) -> String {
//!         "hello".to_string()
//!     }
//! }
//!
//! let greeter: InlineBox<dyn Greeter> = InlineBox::new(English);
//! assert_eq!(greeter.greet(), "hello");
//! ```
//!
//! # What's Included
//!
//! - **[`InlineBox`]**: The inline container
//! - **[`Capacity`]**: The capacity declaration trait
//! - **[`inline_capacity!`]**: Macro for declaring capacities

pub use crate::{Capacity, InlineBox, inline_capacity};
