//! Plain minima: triangles lower than all of their neighbors.
//!
//! Method string: `minima(contour, max_merge_dist)`.
//! - `contour` (default 0): a candidate joins a seed's object while its
//!   value is at most `contour` above the seed's value.
//! - `max_merge_dist` (default 0): objects at most this far apart merge.

use crate::extrema::method::{MethodSpec, non_negative};
use crate::extrema::predicate::{DetectionContext, ExtremumPredicate, beats_neighbors, minimum_weight};
use crate::extrema_error::ExtremaError;
use crate::topology::point::TriLabel;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Minima {
    pub contour: f64,
    pub max_merge_dist: f64,
}

impl Minima {
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

impl ExtremumPredicate for Minima {
    fn name(&self) -> &'static str {
        "minima"
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
        Ok(ctx.value(candidate, t)? - ctx.value(seed, t)? <= self.contour)
    }

    fn is_more_extreme(&self, a: f64, b: f64) -> bool {
        a < b
    }

    fn calculate_point_weight(&self, v: f64, min_v: f64, max_v: f64) -> f64 {
        minimum_weight(v, min_v, max_v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_arguments() {
        let m = Minima::from_spec(&MethodSpec::parse("minima").unwrap()).unwrap();
        assert_eq!(m, Minima::new(0.0, 0.0));
        let m = Minima::from_spec(&MethodSpec::parse("minima(2.5)").unwrap()).unwrap();
        assert_eq!(m, Minima::new(2.5, 0.0));
        assert_eq!(m.parameters()[0], ("contour", 2.5));
    }

    #[test]
    fn more_extreme_means_lower() {
        let m = Minima::default();
        assert!(m.is_more_extreme(-3.0, -2.0));
        assert!(!m.is_more_extreme(-2.0, -2.0));
        assert_eq!(m.calculate_point_weight(-10.0, -10.0, -5.0), 1.0);
    }
}
