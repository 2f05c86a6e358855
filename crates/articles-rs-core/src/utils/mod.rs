//! Utility types and functions.
//!
//! - [`LazyText`]: text computed by a fallible closure each time it is read.
//! - [`text`]: slug helpers used by the admin form.

mod lazy;
pub mod text;

pub use lazy::LazyText;
