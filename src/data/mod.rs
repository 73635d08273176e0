//! Data module: field values attached to mesh triangles.
#![warn(missing_docs)]

pub mod field;

pub use field::{FieldSection, FieldStore};
