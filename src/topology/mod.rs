//! Top-level module for mesh topology abstractions.
//!
//! This module provides the types and traits the detection engine uses to
//! walk a hierarchical triangular mesh:
//! - `TriLabel` handles for triangles
//! - `LabelSet` for the triangles composing one object
//! - The `MeshAccessor` trait and the resident `TriMesh` implementation

pub mod labels;
pub mod mesh;
pub mod point;

pub use labels::LabelSet;
pub use mesh::{Adjacency, MeshAccessor, TriMesh, TriMeshBuilder, Triangle};
pub use point::TriLabel;
