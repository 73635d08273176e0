//! ExtremaError: unified error type for tri-extrema public APIs
//!
//! Every fallible operation in the crate returns this type. Geometric
//! degeneracies (empty objects after a split, tied distances) are resolved by
//! policy and never surface here.

use thiserror::Error;

use crate::topology::point::TriLabel;

/// Unified error type for extrema detection.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExtremaError {
    /// Malformed method or steering string, or an out-of-range argument.
    #[error("Configuration error: {0}")]
    Config(String),
    /// The method name does not select any extremum predicate.
    #[error("Unsupported extrema location method: {0}")]
    UnknownMethod(String),
    /// The steering name does not select any steering provider.
    #[error("Unknown steering vector method: {0}")]
    UnknownSteering(String),
    /// The field store was never populated for this (triangle, time step).
    #[error("Data missing: no value for triangle {label} at time step {time_step}")]
    DataMissing { label: TriLabel, time_step: usize },
    /// A label that the mesh does not know about.
    #[error("Triangle {0} is not part of the mesh")]
    UnknownTriangle(TriLabel),
    /// Requested hierarchy level is deeper than the mesh.
    #[error("Mesh level {level} requested but the mesh only has levels 0..={max}")]
    InvalidLevel { level: u32, max: u32 },
    /// Degenerate or inconsistent geometry handed to the mesh builder.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
    /// Objects must be appended in non-decreasing time-step order.
    #[error("Catalog is append-only: time step {time_step} precedes latest step {latest}")]
    CatalogOrder { time_step: usize, latest: usize },
    /// Object or catalog invariant violated (connectivity, double claims).
    #[error("Invariant violated: {0}")]
    Invariant(String),
    /// Underlying reader/writer failure.
    #[error("I/O error: {0}")]
    Io(String),
    /// Binary payload could not be encoded or decoded.
    #[error("Encoding error: {0}")]
    Encode(String),
    /// Artifact header or text layout is not what the gateway expects.
    #[error("Format error: {0}")]
    Format(String),
}

impl From<std::io::Error> for ExtremaError {
    fn from(e: std::io::Error) -> Self {
        ExtremaError::Io(e.to_string())
    }
}

impl From<bincode::Error> for ExtremaError {
    fn from(e: bincode::Error) -> Self {
        ExtremaError::Encode(e.to_string())
    }
}
