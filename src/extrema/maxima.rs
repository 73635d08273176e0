//! Plain maxima: triangles higher than all of their neighbors.
//!
//! Method string: `maxima(contour, max_merge_dist)`, the mirror image of
//! [`Minima`](crate::extrema::minima::Minima): a candidate joins while its
//! value is at most `contour` below the seed's value.

use crate::extrema::method::{MethodSpec, non_negative};
use crate::extrema::predicate::{DetectionContext, ExtremumPredicate, beats_neighbors, maximum_weight};
use crate::extrema_error::ExtremaError;
use crate::topology::point::TriLabel;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Maxima {
    pub contour: f64,
    pub max_merge_dist: f64,
}

impl Maxima {
    pub fn new(contour: f64, max_merge_dist: f64) -> Self {
        Self {
            contour,
            max_merge_dist,
        }
    }

    pub fn from_spec(spec: &MethodSpec) -> Result<Self, ExtremaError> {
        spec.expect_at_most(2)?;
        Ok(Self {
            contour: non_negative(spec, "contour", spec.arg_or(0, 0.0))?,
            max_merge_dist: non_negative(spec, "max_merge_dist", spec.arg_or(1, 0.0))?,
        })
    }
}

impl ExtremumPredicate for Maxima {
    fn name(&self) -> &'static str {
        "maxima"
    }

    fn parameters(&self) -> Vec<(&'static str, f64)> {
        vec![("contour", self.contour), ("max_merge_dist", self.max_merge_dist)]
    }

    fn max_merge_dist(&self) -> f64 {
        self.max_merge_dist
    }

    fn is_extrema(&self, ctx: &DetectionContext<'_>, tri: TriLabel, t: usize) -> Result<bool, ExtremaError> {
        let v = ctx.value(tri, t)?;
        beats_neighbors(ctx, tri, v, |n| ctx.value(n, t), |a, b| self.is_more_extreme(a, b))
    }

    fn is_in_object(
        &self,
        ctx: &DetectionContext<'_>,
        seed: TriLabel,
        candidate: TriLabel,
        t: usize,
    ) -> Result<bool, ExtremaError> {
        Ok(ctx.value(seed, t)? - ctx.value(candidate, t)? <= self.contour)
    }

    fn is_more_extreme(&self, a: f64, b: f64) -> bool {
        a > b
    }

    fn calculate_point_weight(&self, v: f64, min_v: f64, max_v: f64) -> f64 {
        maximum_weight(v, min_v, max_v)
    }
}
