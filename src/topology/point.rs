//! `TriLabel`: a strong, zero-cost handle for mesh triangles
//!
//! Every triangle of the hierarchical mesh, at every level, carries a unique
//! integer label assigned by whoever built the mesh. `TriLabel` wraps that
//! `u64` so labels cannot be confused with time steps, vertex indices or
//! object indices.
//!
//! Labels order by their raw value. The detection engine relies on that
//! ordering wherever it needs a deterministic tie-break.

use std::fmt;

/// Unique label of one mesh triangle.
///
/// This type is `repr(transparent)`; it has the same layout as `u64` and
/// serialises as a bare integer.
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct TriLabel(u64);

impl TriLabel {
    /// Creates a label from its raw value.
    ///
    /// ```rust
    /// # use tri_extrema::topology::point::TriLabel;
    /// let t = TriLabel::new(3);
    /// assert_eq!(t.get(), 3);
    /// ```
    #[inline]
    pub const fn new(raw: u64) -> Self {
        TriLabel(raw)
    }

    /// Returns the raw label value.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for TriLabel {
    fn from(raw: u64) -> Self {
        TriLabel(raw)
    }
}

// -----------------------------------------------------------------------------
// Formatting traits
// -----------------------------------------------------------------------------

/// Displays as `TriLabel(raw_value)`.
impl fmt::Debug for TriLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TriLabel").field(&self.get()).finish()
    }
}

/// Prints only the raw integer.
impl fmt::Display for TriLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}
