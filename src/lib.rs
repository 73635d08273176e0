#![cfg_attr(docsrs, feature(doc_cfg))]
//! # tri-extrema
//!
//! tri-extrema detects localized extrema (minima and maxima) of a scalar
//! field sampled on a hierarchical triangular mesh of the sphere, across a
//! sequence of time steps, and turns them into connected objects with a
//! position, an intensity and a background-relative delta.
//!
//! ## Features
//! - Hierarchical triangle access through the [`MeshAccessor`](topology::MeshAccessor)
//!   trait, with a resident [`TriMesh`](topology::TriMesh)
//! - Point or edge adjacency between triangles of one level
//! - Plain minima/maxima and background-removed minima, optionally with a
//!   steering-advected background
//! - Region growing with first-come claims, seed-based splitting and
//!   distance-based merging
//! - Binary and text persistence of the resulting catalog
//!
//! ## Determinism
//!
//! Every stage walks triangles in mesh order and resolves ties by a fixed
//! rule, so identical inputs give identical catalogs. The optional `rayon`
//! feature parallelises the seed search only and keeps its output order.
//!
//! ## Usage
//!
//! ```no_run
//! use tri_extrema::prelude::*;
//!
//! # fn run(mesh: &TriMesh, field: &FieldSection) -> Result<(), ExtremaError> {
//! let locator = ExtremaLocator::new("minima(2,500)", "", DetectionOpts::default())?;
//! let catalog = locator.locate(mesh, field)?;
//! for p in catalog.iter() {
//!     println!("{} {:?} {}", p.time_step, p.position, p.intensity);
//! }
//! # Ok(())
//! # }
//! ```

pub mod algs;
pub mod data;
pub mod debug_invariants;
pub mod extrema;
pub mod extrema_error;
pub mod geometry;
pub mod io;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::data::field::{FieldSection, FieldStore};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::extrema::catalog::{ExtremaCatalog, ExtremumPoint, MetaData};
    pub use crate::extrema::locator::{DetectionOpts, ExtremaLocator};
    pub use crate::extrema::method::ExtremaMethod;
    pub use crate::extrema::predicate::ExtremumPredicate;
    pub use crate::extrema::steering::{PrecomputedSteering, SteeringProvider, SteeringSpec};
    pub use crate::extrema_error::ExtremaError;
    pub use crate::io::CatalogArtifact;
    pub use crate::topology::labels::LabelSet;
    pub use crate::topology::mesh::{Adjacency, MeshAccessor, TriMesh};
    pub use crate::topology::point::TriLabel;
}
