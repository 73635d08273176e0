//! Objects under construction and the claim map used while growing them.

use hashbrown::HashMap;

use crate::topology::labels::LabelSet;
use crate::topology::point::TriLabel;

/// A connected set of triangles built around one or more seeds.
///
/// `seeds` lists every seed triangle inside `labels`, the one the object
/// was grown from first. `position`, `intensity` and `delta` stay zero until
/// [`ExtremaLocator::merge_objects`](crate::extrema::locator::ExtremaLocator::merge_objects)
/// fills them in.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtremumObject {
    pub labels: LabelSet,
    pub seeds: Vec<TriLabel>,
    pub position: [f64; 3],
    pub intensity: f64,
    pub delta: f64,
}

impl ExtremumObject {
    /// Object consisting of its seed triangle only.
    pub fn from_seed(seed: TriLabel) -> Self {
        Self {
            labels: LabelSet::singleton(seed),
            seeds: vec![seed],
            ..Self::default()
        }
    }

    /// Object over `labels` grown from `seeds`.
    pub fn from_labels(labels: LabelSet, seeds: Vec<TriLabel>) -> Self {
        Self {
            labels,
            seeds,
            ..Self::default()
        }
    }

    /// The seed the object was grown from, falling back to its smallest
    /// label for seedless objects.
    pub fn original_triangle(&self) -> Option<TriLabel> {
        self.seeds.first().copied().or_else(|| self.labels.first())
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Union `other` into `self`; seeds keep `self`'s first.
    pub fn absorb(&mut self, other: ExtremumObject) {
        self.labels.union_with(&other.labels);
        for s in other.seeds {
            if !self.seeds.contains(&s) {
                self.seeds.push(s);
            }
        }
    }
}

/// True when the two objects have at least one triangle in common.
pub fn objects_share_nodes(a: &ExtremumObject, b: &ExtremumObject) -> bool {
    a.labels.intersects(&b.labels)
}

/// Which object owns each triangle during one time step.
#[derive(Clone, Debug, Default)]
pub struct ClaimMap {
    owner: HashMap<TriLabel, usize>,
}

impl ClaimMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `label` for `object`. Returns false, leaving the map unchanged,
    /// when the label already has an owner.
    pub fn claim(&mut self, label: TriLabel, object: usize) -> bool {
        match self.owner.entry(label) {
            hashbrown::hash_map::Entry::Occupied(_) => false,
            hashbrown::hash_map::Entry::Vacant(v) => {
                v.insert(object);
                true
            }
        }
    }

    pub fn owner(&self, label: TriLabel) -> Option<usize> {
        self.owner.get(&label).copied()
    }

    pub fn is_claimed(&self, label: TriLabel) -> bool {
        self.owner.contains_key(&label)
    }

    pub fn len(&self) -> usize {
        self.owner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owner.is_empty()
    }

    /// Rebuild from a list of objects, the object index being the owner.
    pub fn from_objects(objects: &[ExtremumObject]) -> Self {
        let mut map = Self::new();
        for (i, o) in objects.iter().enumerate() {
            for l in o.labels.iter() {
                map.claim(l, i);
            }
        }
        map
    }
}
