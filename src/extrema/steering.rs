//! Steering vectors: externally supplied displacements per triangle and
//! time step.
//!
//! The wind-derived computation of steering vectors lives outside this
//! crate. The engine only consumes [`SteeringProvider`], where `Ok(None)`
//! means "no steering here" and detection falls back to its unsteered form.
//!
//! Steering string forms:
//! - `""` (empty): no steering.
//! - `uniform(dx,dy,dz)`: the same Cartesian displacement everywhere.
//! - `geostrophic(...)` / `precomputed(...)`: displacements come from a
//!   caller-attached provider (typically a [`PrecomputedSteering`] filled
//!   from the wind-field stage); the arguments are recorded verbatim.

use std::fmt;

use hashbrown::HashMap;

use crate::extrema::method::parse_call;
use crate::extrema_error::ExtremaError;
use crate::topology::point::TriLabel;

/// Source of per-triangle displacement vectors.
pub trait SteeringProvider: Send + Sync + fmt::Debug {
    fn displacement(&self, label: TriLabel, time_step: usize) -> Result<Option<[f64; 3]>, ExtremaError>;
}

/// Parsed steering selection.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum SteeringSpec {
    Uniform([f64; 3]),
    /// Vectors supplied by an attached provider; `method` is the name used.
    External { method: String, args: Vec<f64> },
}

impl SteeringSpec {
    /// Parse a steering string; an empty (or blank) string selects no steering.
    pub fn parse(s: &str) -> Result<Option<Self>, ExtremaError> {
        if s.trim().is_empty() {
            return Ok(None);
        }
        let (name, args) = parse_call(s)?;
        match name.as_str() {
            "uniform" => {
                let [dx, dy, dz] = args[..] else {
                    return Err(ExtremaError::Config(format!(
                        "`uniform` takes exactly 3 arguments, got {}",
                        args.len()
                    )));
                };
                Ok(Some(SteeringSpec::Uniform([dx, dy, dz])))
            }
            "geostrophic" | "precomputed" => Ok(Some(SteeringSpec::External { method: name, args })),
            _ => Err(ExtremaError::UnknownSteering(name)),
        }
    }

    pub fn method(&self) -> &str {
        match self {
            SteeringSpec::Uniform(_) => "uniform",
            SteeringSpec::External { method, .. } => method,
        }
    }

    pub fn args(&self) -> Vec<f64> {
        match self {
            SteeringSpec::Uniform(d) => d.to_vec(),
            SteeringSpec::External { args, .. } => args.clone(),
        }
    }

    /// Provider this steering string can build on its own, if any.
    pub fn builtin_provider(&self) -> Option<Box<dyn SteeringProvider>> {
        match self {
            SteeringSpec::Uniform(d) => Some(Box::new(UniformSteering::new(*d))),
            SteeringSpec::External { .. } => None,
        }
    }
}

/// The same displacement for every triangle and time step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UniformSteering {
    displacement: [f64; 3],
}

impl UniformSteering {
    pub fn new(displacement: [f64; 3]) -> Self {
        Self { displacement }
    }
}

impl SteeringProvider for UniformSteering {
    fn displacement(&self, _label: TriLabel, _time_step: usize) -> Result<Option<[f64; 3]>, ExtremaError> {
        Ok(Some(self.displacement))
    }
}

/// Displacements computed elsewhere and stored per `(triangle, time step)`.
/// Pairs without an entry yield no steering.
#[derive(Clone, Debug, Default)]
pub struct PrecomputedSteering {
    vectors: HashMap<(TriLabel, usize), [f64; 3]>,
}

impl PrecomputedSteering {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, label: TriLabel, time_step: usize, displacement: [f64; 3]) -> Option<[f64; 3]> {
        self.vectors.insert((label, time_step), displacement)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

impl SteeringProvider for PrecomputedSteering {
    fn displacement(&self, label: TriLabel, time_step: usize) -> Result<Option<[f64; 3]>, ExtremaError> {
        Ok(self.vectors.get(&(label, time_step)).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_means_no_steering() {
        assert_eq!(SteeringSpec::parse("").unwrap(), None);
        assert_eq!(SteeringSpec::parse("   ").unwrap(), None);
    }

    #[test]
    fn uniform_needs_three_arguments() {
        let s = SteeringSpec::parse("uniform(1,0,-2)").unwrap().unwrap();
        assert_eq!(s, SteeringSpec::Uniform([1.0, 0.0, -2.0]));
        assert_eq!(s.method(), "uniform");
        let p = s.builtin_provider().unwrap();
        assert_eq!(p.displacement(TriLabel::new(3), 9).unwrap(), Some([1.0, 0.0, -2.0]));
        assert!(matches!(SteeringSpec::parse("uniform(1,2)"), Err(ExtremaError::Config(_))));
    }

    #[test]
    fn external_methods_need_a_provider() {
        let s = SteeringSpec::parse("geostrophic(500, 2)").unwrap().unwrap();
        assert_eq!(s.method(), "geostrophic");
        assert_eq!(s.args(), vec![500.0, 2.0]);
        assert!(s.builtin_provider().is_none());
    }

    #[test]
    fn unknown_and_malformed_steering() {
        assert_eq!(
            SteeringSpec::parse("ageostrophic(1)"),
            Err(ExtremaError::UnknownSteering("ageostrophic".into()))
        );
        assert!(matches!(SteeringSpec::parse("geostrophic(1"), Err(ExtremaError::Config(_))));
    }

    #[test]
    fn precomputed_misses_are_none() {
        let mut p = PrecomputedSteering::new();
        p.set(TriLabel::new(1), 0, [0.1, 0.0, 0.0]);
        assert_eq!(p.displacement(TriLabel::new(1), 0).unwrap(), Some([0.1, 0.0, 0.0]));
        assert_eq!(p.displacement(TriLabel::new(1), 1).unwrap(), None);
        assert_eq!(p.len(), 1);
    }
}
