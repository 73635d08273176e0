//! Minima with background removal, with and without wind steering.
//!
//! Method strings:
//! - `minima_back(contour, max_merge_dist, min_delta, bg_hops)`
//! - `minima_back_wind(contour, max_merge_dist, min_delta, bg_hops)`
//!
//! The background at a triangle is the mean field value over every
//! triangle within `bg_hops` adjacency steps of it (itself included) at the
//! detection level. Extremeness is tested on the residual
//! `value - background`:
//! - a seed's residual is negative, at most `-min_delta`, and strictly lower
//!   than each neighbor's residual;
//! - a candidate joins a seed's object when its value is at most `contour`
//!   above the seed's and its residual is negative.
//!
//! The wind variant takes the background at time step `t` from step `t - 1`
//! around the upstream triangle, i.e. the triangle containing
//! `centroid - displacement`. Patterns that travel with the steering flow
//! then cancel in the residual. Without a displacement (first step, no
//! provider, or `None` from the provider) it uses the unsteered background.
//!
//! Ring means are memoised in a [`BackgroundCache`] when the detection
//! context carries one, so every triangle's neighborhood is walked at most
//! once per time step.

use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::algs::traversal::ring;
use crate::extrema::method::{MethodSpec, non_negative};
use crate::extrema::object::ExtremumObject;
use crate::extrema::predicate::{
    DetectionContext, ExtremumPredicate, beats_neighbors, minimum_weight, most_extreme_label,
};
use crate::extrema_error::ExtremaError;
use crate::geometry::metrics::{norm, project_to_radius, sub};
use crate::topology::point::TriLabel;

/// Default neighborhood radius of the background mean, in adjacency hops.
pub const DEFAULT_BG_HOPS: u32 = 2;

/// Ring means keyed by `(triangle, time step)`.
#[derive(Debug, Default)]
pub struct BackgroundCache {
    means: RwLock<HashMap<(TriLabel, usize), f64>>,
}

impl BackgroundCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached mean of `tri` at `t`, computing it with `compute` on a miss.
    pub fn get_or_try_insert_with<F>(&self, tri: TriLabel, t: usize, compute: F) -> Result<f64, ExtremaError>
    where
        F: FnOnce() -> Result<f64, ExtremaError>,
    {
        if let Some(&mean) = self.means.read().get(&(tri, t)) {
            return Ok(mean);
        }
        let mean = compute()?;
        self.means.write().insert((tri, t), mean);
        Ok(mean)
    }

    /// Drop every entry older than `t - 1`. The wind background at `t`
    /// still reads step `t - 1`.
    pub fn retain_from(&self, t: usize) {
        self.means.write().retain(|&(_, step), _| step + 1 >= t);
    }

    pub fn len(&self) -> usize {
        self.means.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MinimaBackground {
    pub contour: f64,
    pub max_merge_dist: f64,
    pub min_delta: f64,
    pub bg_hops: u32,
}

impl Default for MinimaBackground {
    fn default() -> Self {
        Self {
            contour: 0.0,
            max_merge_dist: 0.0,
            min_delta: 0.0,
            bg_hops: DEFAULT_BG_HOPS,
        }
    }
}

impl MinimaBackground {
    pub fn from_spec(spec: &MethodSpec) -> Result<Self, ExtremaError> {
        spec.expect_at_most(4)?;
        let hops = non_negative(spec, "bg_hops", spec.arg_or(3, DEFAULT_BG_HOPS as f64))?;
        if hops.fract() != 0.0 || hops > u32::MAX as f64 {
            return Err(ExtremaError::Config(format!(
                "`{}`: bg_hops must be a whole number, got {hops}",
                spec.name
            )));
        }
        Ok(Self {
            contour: non_negative(spec, "contour", spec.arg_or(0, 0.0))?,
            max_merge_dist: non_negative(spec, "max_merge_dist", spec.arg_or(1, 0.0))?,
            min_delta: non_negative(spec, "min_delta", spec.arg_or(2, 0.0))?,
            bg_hops: hops as u32,
        })
    }

    /// Mean value at `t` over the `bg_hops` neighborhood of `tri`.
    pub fn background(&self, ctx: &DetectionContext<'_>, tri: TriLabel, t: usize) -> Result<f64, ExtremaError> {
        let mean = || -> Result<f64, ExtremaError> {
            let hood = ring(ctx.mesh, tri, self.bg_hops, ctx.adjacency)?;
            let mut sum = 0.0;
            for &l in &hood {
                sum += ctx.value(l, t)?;
            }
            Ok(sum / hood.len() as f64)
        };
        match ctx.backgrounds {
            Some(cache) => cache.get_or_try_insert_with(tri, t, mean),
            None => mean(),
        }
    }

    fn parameter_list(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("contour", self.contour),
            ("max_merge_dist", self.max_merge_dist),
            ("min_delta", self.min_delta),
            ("bg_hops", self.bg_hops as f64),
        ]
    }

    fn is_extrema_with<B>(
        &self,
        ctx: &DetectionContext<'_>,
        tri: TriLabel,
        t: usize,
        background: B,
    ) -> Result<bool, ExtremaError>
    where
        B: Fn(TriLabel) -> Result<f64, ExtremaError>,
    {
        let residual = |l: TriLabel| -> Result<f64, ExtremaError> { Ok(ctx.value(l, t)? - background(l)?) };
        let r = residual(tri)?;
        if r >= 0.0 || r > -self.min_delta {
            return Ok(false);
        }
        beats_neighbors(ctx, tri, r, residual, |a, b| a < b)
    }

    fn is_in_object_with<B>(
        &self,
        ctx: &DetectionContext<'_>,
        seed: TriLabel,
        candidate: TriLabel,
        t: usize,
        background: B,
    ) -> Result<bool, ExtremaError>
    where
        B: Fn(TriLabel) -> Result<f64, ExtremaError>,
    {
        let vc = ctx.value(candidate, t)?;
        if vc - ctx.value(seed, t)? > self.contour {
            return Ok(false);
        }
        Ok(vc - background(candidate)? < 0.0)
    }
}

impl ExtremumPredicate for MinimaBackground {
    fn name(&self) -> &'static str {
        "minima_back"
    }

    fn parameters(&self) -> Vec<(&'static str, f64)> {
        self.parameter_list()
    }

    fn max_merge_dist(&self) -> f64 {
        self.max_merge_dist
    }

    fn is_extrema(&self, ctx: &DetectionContext<'_>, tri: TriLabel, t: usize) -> Result<bool, ExtremaError> {
        self.is_extrema_with(ctx, tri, t, |l| self.background(ctx, l, t))
    }

    fn is_in_object(
        &self,
        ctx: &DetectionContext<'_>,
        seed: TriLabel,
        candidate: TriLabel,
        t: usize,
    ) -> Result<bool, ExtremaError> {
        self.is_in_object_with(ctx, seed, candidate, t, |l| self.background(ctx, l, t))
    }

    fn is_more_extreme(&self, a: f64, b: f64) -> bool {
        a < b
    }

    fn calculate_point_weight(&self, v: f64, min_v: f64, max_v: f64) -> f64 {
        minimum_weight(v, min_v, max_v)
    }

    fn calculate_object_delta(
        &self,
        ctx: &DetectionContext<'_>,
        object: &ExtremumObject,
        t: usize,
    ) -> Result<f64, ExtremaError> {
        let intensity = self.calculate_object_intensity(ctx, object, t)?;
        let anchor = most_extreme_label(self, ctx, object, t)?;
        Ok(intensity - self.background(ctx, anchor, t)?)
    }

    fn object_background(
        &self,
        ctx: &DetectionContext<'_>,
        object: &ExtremumObject,
        t: usize,
    ) -> Result<Option<f64>, ExtremaError> {
        let anchor = most_extreme_label(self, ctx, object, t)?;
        Ok(Some(self.background(ctx, anchor, t)?))
    }
}

/// Background-removed minima with a steering-advected background.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MinimaBackWind {
    pub base: MinimaBackground,
}

impl MinimaBackWind {
    pub fn from_spec(spec: &MethodSpec) -> Result<Self, ExtremaError> {
        Ok(Self {
            base: MinimaBackground::from_spec(spec)?,
        })
    }

    /// Background at `t`, advected from `t - 1` when a displacement exists.
    pub fn background(&self, ctx: &DetectionContext<'_>, tri: TriLabel, t: usize) -> Result<f64, ExtremaError> {
        if t > 0 {
            if let Some(provider) = ctx.steering {
                if let Some(d) = provider.displacement(tri, t)? {
                    let c = ctx.mesh.centroid(tri)?;
                    let upstream = project_to_radius(sub(c, d), norm(c));
                    let source = ctx.mesh.locate(upstream, ctx.level)?;
                    return self.base.background(ctx, source, t - 1);
                }
            }
        }
        self.base.background(ctx, tri, t)
    }
}

impl ExtremumPredicate for MinimaBackWind {
    fn name(&self) -> &'static str {
        "minima_back_wind"
    }

    fn parameters(&self) -> Vec<(&'static str, f64)> {
        self.base.parameter_list()
    }

    fn max_merge_dist(&self) -> f64 {
        self.base.max_merge_dist
    }

    fn is_extrema(&self, ctx: &DetectionContext<'_>, tri: TriLabel, t: usize) -> Result<bool, ExtremaError> {
        self.base
            .is_extrema_with(ctx, tri, t, |l| self.background(ctx, l, t))
    }

    fn is_in_object(
        &self,
        ctx: &DetectionContext<'_>,
        seed: TriLabel,
        candidate: TriLabel,
        t: usize,
    ) -> Result<bool, ExtremaError> {
        self.base
            .is_in_object_with(ctx, seed, candidate, t, |l| self.background(ctx, l, t))
    }

    fn is_more_extreme(&self, a: f64, b: f64) -> bool {
        a < b
    }

    fn calculate_point_weight(&self, v: f64, min_v: f64, max_v: f64) -> f64 {
        minimum_weight(v, min_v, max_v)
    }

    fn calculate_object_delta(
        &self,
        ctx: &DetectionContext<'_>,
        object: &ExtremumObject,
        t: usize,
    ) -> Result<f64, ExtremaError> {
        let intensity = self.calculate_object_intensity(ctx, object, t)?;
        let anchor = most_extreme_label(self, ctx, object, t)?;
        Ok(intensity - self.background(ctx, anchor, t)?)
    }

    fn object_background(
        &self,
        ctx: &DetectionContext<'_>,
        object: &ExtremumObject,
        t: usize,
    ) -> Result<Option<f64>, ExtremaError> {
        let anchor = most_extreme_label(self, ctx, object, t)?;
        Ok(Some(self.background(ctx, anchor, t)?))
    }
}
