//! The extrema catalog: finalised objects ordered by time step plus the
//! metadata record describing how they were detected.
//!
//! The catalog only grows. Objects can be added to the latest time step or
//! to a later one, never to an earlier one, and the metadata is fixed when
//! the catalog is created.

use std::collections::BTreeMap;

use hashbrown::HashSet;

use crate::debug_invariants::DebugInvariants;
use crate::extrema_error::ExtremaError;
use crate::topology::labels::LabelSet;
use crate::topology::mesh::MeshAccessor;
use crate::topology::point::TriLabel;

/// Configuration key/value pairs persisted verbatim with the catalog.
pub type MetaData = BTreeMap<String, String>;

/// One finalised object.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExtremumPoint {
    pub time_step: usize,
    /// Seed triangle the object was grown from.
    pub origin: TriLabel,
    /// Detection-level triangles of the object.
    pub labels: LabelSet,
    /// Cartesian position on the sphere.
    pub position: [f64; 3],
    pub intensity: f64,
    /// Intensity relative to the background, zero without a background model.
    pub delta: f64,
    pub background: Option<f64>,
    /// Steering displacement at the object's position, if any.
    pub steering: Option<[f64; 3]>,
    /// `position + steering`.
    pub steered_position: Option<[f64; 3]>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExtremaCatalog {
    meta: MetaData,
    steps: BTreeMap<usize, Vec<ExtremumPoint>>,
}

impl ExtremaCatalog {
    pub fn new(meta: MetaData) -> Self {
        Self {
            meta,
            steps: BTreeMap::new(),
        }
    }

    pub fn meta(&self) -> &MetaData {
        &self.meta
    }

    /// Latest time step recorded so far.
    pub fn latest_time_step(&self) -> Option<usize> {
        self.steps.keys().next_back().copied()
    }

    fn check_order(&self, time_step: usize) -> Result<(), ExtremaError> {
        match self.latest_time_step() {
            Some(latest) if time_step < latest => Err(ExtremaError::CatalogOrder { time_step, latest }),
            _ => Ok(()),
        }
    }

    /// Record `time_step` even if no object is ever added to it.
    pub fn begin_time_step(&mut self, time_step: usize) -> Result<(), ExtremaError> {
        self.check_order(time_step)?;
        self.steps.entry(time_step).or_default();
        Ok(())
    }

    /// Append `point` to `time_step`. The point's own `time_step` is
    /// overwritten to match.
    pub fn add(&mut self, time_step: usize, mut point: ExtremumPoint) -> Result<(), ExtremaError> {
        self.check_order(time_step)?;
        point.time_step = time_step;
        self.steps.entry(time_step).or_default().push(point);
        Ok(())
    }

    /// Recorded time steps in increasing order.
    pub fn time_steps(&self) -> impl Iterator<Item = usize> + '_ {
        self.steps.keys().copied()
    }

    /// Objects of `time_step` in the order they were added; empty for
    /// unknown steps.
    pub fn objects_at(&self, time_step: usize) -> &[ExtremumPoint] {
        self.steps.get(&time_step).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every object, by time step then insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ExtremumPoint> + '_ {
        self.steps.values().flatten()
    }

    /// Number of objects over all time steps.
    pub fn len(&self) -> usize {
        self.steps.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Triangles of `max_level` (or childless ones above it) that lie
    /// under `node`. A node at or below `max_level` resolves to itself.
    pub fn get_leaf_node_labels<M: MeshAccessor + ?Sized>(
        mesh: &M,
        node: TriLabel,
        max_level: u32,
    ) -> Result<LabelSet, ExtremaError> {
        if max_level > mesh.max_level() {
            return Err(ExtremaError::InvalidLevel {
                level: max_level,
                max: mesh.max_level(),
            });
        }
        Ok(mesh.leaf_descendants(node, max_level)?.into_iter().collect())
    }
}

impl DebugInvariants for ExtremaCatalog {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "ExtremaCatalog invalid");
    }

    fn validate_invariants(&self) -> Result<(), ExtremaError> {
        for (&t, points) in &self.steps {
            let mut claimed: HashSet<TriLabel> = HashSet::new();
            for p in points {
                if p.time_step != t {
                    return Err(ExtremaError::Invariant(format!(
                        "object stored under time step {t} claims time step {}",
                        p.time_step
                    )));
                }
                if p.labels.is_empty() {
                    return Err(ExtremaError::Invariant(format!("empty object at time step {t}")));
                }
                if let Some(dup) = p.labels.iter().find(|&l| !claimed.insert(l)) {
                    return Err(ExtremaError::Invariant(format!(
                        "triangle {dup} belongs to two objects at time step {t}"
                    )));
                }
                let finite = p.position.iter().all(|c| c.is_finite())
                    && p.intensity.is_finite()
                    && p.delta.is_finite();
                if !finite {
                    return Err(ExtremaError::Invariant(format!(
                        "non-finite attributes for object {} at time step {t}",
                        p.origin
                    )));
                }
            }
        }
        Ok(())
    }
}
