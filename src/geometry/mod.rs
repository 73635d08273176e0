//! Geometry utilities for tri-extrema.
//!
//! Cartesian vector helpers, triangle centroids, and great-circle distances
//! on the sphere the mesh covers.

pub mod metrics;
