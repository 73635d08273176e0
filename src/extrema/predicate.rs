//! The extremum predicate interface and the numeric policy shared by all
//! variants.
//!
//! A predicate answers three kinds of questions for the object builder:
//! is a triangle a seed (`is_extrema`), does a candidate belong to a seed's
//! object (`is_in_object`), and what are an object's position, intensity
//! and delta. Position and intensity are evaluated over the object's
//! *evaluation triangles*: the finest-level descendants of its labels.

use std::fmt;

use crate::data::field::FieldStore;
use crate::extrema::background::BackgroundCache;
use crate::extrema::catalog::ExtremaCatalog;
use crate::extrema::object::ExtremumObject;
use crate::extrema::steering::SteeringProvider;
use crate::extrema_error::ExtremaError;
use crate::geometry::metrics::{add, norm, scale};
use crate::topology::mesh::{Adjacency, MeshAccessor};
use crate::topology::point::TriLabel;

/// Everything a predicate may read while processing one run.
#[derive(Clone, Copy)]
pub struct DetectionContext<'a> {
    pub mesh: &'a dyn MeshAccessor,
    pub field: &'a dyn FieldStore,
    pub steering: Option<&'a dyn SteeringProvider>,
    /// Hierarchy level objects are built at.
    pub level: u32,
    pub adjacency: Adjacency,
    /// Radius used for great-circle distances.
    pub sphere_radius: f64,
    /// Memoised background means; `None` recomputes on every request.
    pub backgrounds: Option<&'a BackgroundCache>,
}

impl fmt::Debug for DetectionContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetectionContext")
            .field("level", &self.level)
            .field("adjacency", &self.adjacency)
            .field("sphere_radius", &self.sphere_radius)
            .field("steering", &self.steering.is_some())
            .field("cached_backgrounds", &self.backgrounds.map_or(0, BackgroundCache::len))
            .finish()
    }
}

impl DetectionContext<'_> {
    #[inline]
    pub fn value(&self, label: TriLabel, t: usize) -> Result<f64, ExtremaError> {
        self.field.value(label, t)
    }

    #[inline]
    pub fn neighbors(&self, label: TriLabel) -> Result<&[TriLabel], ExtremaError> {
        self.mesh.neighbors(label, self.adjacency)
    }
}

/// Variant-specific tests and numeric policy for one kind of extremum.
pub trait ExtremumPredicate: Send + Sync + fmt::Debug {
    /// Method name as used in method strings.
    fn name(&self) -> &'static str;

    /// Effective parameters, defaults included, for the metadata record.
    fn parameters(&self) -> Vec<(&'static str, f64)>;

    /// Objects whose positions are at most this far apart are merged.
    fn max_merge_dist(&self) -> f64;

    fn is_extrema(&self, ctx: &DetectionContext<'_>, tri: TriLabel, t: usize) -> Result<bool, ExtremaError>;

    fn is_in_object(
        &self,
        ctx: &DetectionContext<'_>,
        seed: TriLabel,
        candidate: TriLabel,
        t: usize,
    ) -> Result<bool, ExtremaError>;

    /// True when `a` is strictly more extreme than `b`.
    fn is_more_extreme(&self, a: f64, b: f64) -> bool;

    /// Weight of a triangle with value `v` in an object whose values span
    /// `[min_v, max_v]`. The most extreme value weighs 1.
    fn calculate_point_weight(&self, v: f64, min_v: f64, max_v: f64) -> f64;

    /// Weighted centroid of the evaluation triangles, rescaled to their
    /// weighted mean radius.
    fn calculate_object_position(
        &self,
        ctx: &DetectionContext<'_>,
        object: &ExtremumObject,
        t: usize,
    ) -> Result<[f64; 3], ExtremaError> {
        let samples = evaluation_samples(ctx, object, t)?;
        let (min_v, max_v) = value_range(&samples);
        let mut sum_w = 0.0;
        let mut sum_p = [0.0; 3];
        let mut sum_r = 0.0;
        for s in &samples {
            let w = self.calculate_point_weight(s.value, min_v, max_v);
            sum_w += w;
            sum_p = add(sum_p, scale(s.centroid, w));
            sum_r += w * norm(s.centroid);
        }
        if sum_w <= 0.0 {
            // every weight vanished; fall back to the plain centroid
            sum_w = samples.len() as f64;
            sum_p = samples.iter().fold([0.0; 3], |acc, s| add(acc, s.centroid));
            sum_r = samples.iter().map(|s| norm(s.centroid)).sum();
        }
        let mean = scale(sum_p, 1.0 / sum_w);
        let radius = sum_r / sum_w;
        let n = norm(mean);
        Ok(if n > 0.0 { scale(mean, radius / n) } else { mean })
    }

    /// The most extreme value over the evaluation triangles.
    fn calculate_object_intensity(
        &self,
        ctx: &DetectionContext<'_>,
        object: &ExtremumObject,
        t: usize,
    ) -> Result<f64, ExtremaError> {
        let samples = evaluation_samples(ctx, object, t)?;
        let Some((first, rest)) = samples.split_first() else {
            return Err(ExtremaError::Invariant("object has no evaluation triangles".into()));
        };
        let mut best = first.value;
        for s in rest {
            if self.is_more_extreme(s.value, best) {
                best = s.value;
            }
        }
        Ok(best)
    }

    /// Intensity relative to the background; zero without a background model.
    fn calculate_object_delta(
        &self,
        _ctx: &DetectionContext<'_>,
        _object: &ExtremumObject,
        _t: usize,
    ) -> Result<f64, ExtremaError> {
        Ok(0.0)
    }

    /// Background estimate the delta is taken against, if the variant has one.
    fn object_background(
        &self,
        _ctx: &DetectionContext<'_>,
        _object: &ExtremumObject,
        _t: usize,
    ) -> Result<Option<f64>, ExtremaError> {
        Ok(None)
    }
}

/// Value and centroid of one evaluation triangle.
#[derive(Clone, Copy, Debug)]
pub struct Sample {
    pub label: TriLabel,
    pub value: f64,
    pub centroid: [f64; 3],
}

/// Values and centroids of an object's evaluation triangles, grouped by
/// detection-level label. Never empty for a non-empty object.
pub fn evaluation_samples(
    ctx: &DetectionContext<'_>,
    object: &ExtremumObject,
    t: usize,
) -> Result<Vec<Sample>, ExtremaError> {
    if object.labels.is_empty() {
        return Err(ExtremaError::Invariant(
            "attributes requested for an empty object".into(),
        ));
    }
    let finest = ctx.mesh.max_level();
    let mut out = Vec::with_capacity(object.labels.len());
    for label in object.labels.iter() {
        for leaf in ExtremaCatalog::get_leaf_node_labels(ctx.mesh, label, finest)?.iter() {
            out.push(Sample {
                label: leaf,
                value: ctx.value(leaf, t)?,
                centroid: ctx.mesh.centroid(leaf)?,
            });
        }
    }
    if out.is_empty() {
        return Err(ExtremaError::Invariant("object has no evaluation triangles".into()));
    }
    Ok(out)
}

/// `(min, max)` of the sample values.
pub fn value_range(samples: &[Sample]) -> (f64, f64) {
    samples.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
        (lo.min(s.value), hi.max(s.value))
    })
}

/// Detection-level label of the object holding its most extreme value,
/// ties going to the smallest label.
pub fn most_extreme_label<P: ExtremumPredicate + ?Sized>(
    predicate: &P,
    ctx: &DetectionContext<'_>,
    object: &ExtremumObject,
    t: usize,
) -> Result<TriLabel, ExtremaError> {
    let mut best: Option<(f64, TriLabel)> = None;
    for label in object.labels.iter() {
        let v = ctx.value(label, t)?;
        if best.is_none_or(|(bv, _)| predicate.is_more_extreme(v, bv)) {
            best = Some((v, label));
        }
    }
    best.map(|(_, l)| l)
        .ok_or_else(|| ExtremaError::Invariant("empty object has no extreme triangle".into()))
}

/// True when `more_extreme(value, n)` holds for every neighbor value `n`
/// reported by `neighbor_value`. A triangle without neighbors qualifies.
pub fn beats_neighbors<F, C>(
    ctx: &DetectionContext<'_>,
    tri: TriLabel,
    value: f64,
    neighbor_value: F,
    more_extreme: C,
) -> Result<bool, ExtremaError>
where
    F: Fn(TriLabel) -> Result<f64, ExtremaError>,
    C: Fn(f64, f64) -> bool,
{
    for &n in ctx.neighbors(tri)? {
        if !more_extreme(value, neighbor_value(n)?) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Linear weight for minima: 1 at `min_v`, 0 at `max_v`.
#[inline]
pub(crate) fn minimum_weight(v: f64, min_v: f64, max_v: f64) -> f64 {
    if max_v > min_v {
        (max_v - v) / (max_v - min_v)
    } else {
        1.0
    }
}

/// Linear weight for maxima: 1 at `max_v`, 0 at `min_v`.
#[inline]
pub(crate) fn maximum_weight(v: f64, min_v: f64, max_v: f64) -> f64 {
    if max_v > min_v {
        (v - min_v) / (max_v - min_v)
    } else {
        1.0
    }
}
