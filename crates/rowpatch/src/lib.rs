//! Runtime types targeted by functions generated with `rowpatch-codegen`.
//!
//! A generated patch function converts a source value into its stored row,
//! then writes into a [`Patch`] only the columns whose source fields changed
//! according to the value's [`Tracked::changes`] mirror.

mod error;
pub use error::Error;

mod json;
pub use json::{Json, JsonArray};

mod merge;
pub use merge::JsonMergeSet;

mod patch;
pub use patch::{Patch, Value};

/// A value that records which of its fields were explicitly set.
///
/// `Changes` mirrors the value's type with one `Option` field per source
/// field; `Some` marks the field as changed.
pub trait Tracked {
    type Changes;

    fn changes(&self) -> &Self::Changes;
}
