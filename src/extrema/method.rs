//! Method-selection strings and the closed set of extremum predicates.
//!
//! Both the detection method and the steering method are configured with
//! strings of the form `name(arg1,arg2,...)`. Parentheses may be omitted or
//! left empty, in which case every argument takes its default. Parsing and
//! validation happen once, before any time step is processed.

use std::fmt;

use crate::extrema::background::{MinimaBackWind, MinimaBackground};
use crate::extrema::maxima::Maxima;
use crate::extrema::minima::Minima;
use crate::extrema::object::ExtremumObject;
use crate::extrema::predicate::{DetectionContext, ExtremumPredicate};
use crate::extrema_error::ExtremaError;
use crate::topology::point::TriLabel;

/// Split `name(a,b,...)` into its name and numeric arguments.
pub fn parse_call(s: &str) -> Result<(String, Vec<f64>), ExtremaError> {
    let s = s.trim();
    let (name, rest) = match s.find('(') {
        Some(open) => (&s[..open], Some(&s[open + 1..])),
        None => (s, None),
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(ExtremaError::Config(format!("missing method name in `{s}`")));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ExtremaError::Config(format!("invalid method name `{name}`")));
    }
    let Some(rest) = rest else {
        if s.contains(')') {
            return Err(ExtremaError::Config(format!("unbalanced parentheses in `{s}`")));
        }
        return Ok((name.to_string(), Vec::new()));
    };
    let Some(inner) = rest.strip_suffix(')') else {
        return Err(ExtremaError::Config(format!("unbalanced parentheses in `{s}`")));
    };
    if inner.contains('(') || inner.contains(')') {
        return Err(ExtremaError::Config(format!("nested parentheses in `{s}`")));
    }
    if inner.trim().is_empty() {
        return Ok((name.to_string(), Vec::new()));
    }
    let args = inner
        .split(',')
        .map(|a| {
            let a = a.trim();
            a.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| ExtremaError::Config(format!("invalid argument `{a}` in `{s}`")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok((name.to_string(), args))
}

/// A parsed `name(args)` method selection.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MethodSpec {
    pub name: String,
    pub args: Vec<f64>,
}

impl MethodSpec {
    pub fn parse(s: &str) -> Result<Self, ExtremaError> {
        let (name, args) = parse_call(s)?;
        Ok(Self { name, args })
    }

    /// Argument `i`, or `default` when the string did not provide it.
    pub fn arg_or(&self, i: usize, default: f64) -> f64 {
        self.args.get(i).copied().unwrap_or(default)
    }

    /// Fails when more than `max` arguments were given.
    pub fn expect_at_most(&self, max: usize) -> Result<(), ExtremaError> {
        if self.args.len() > max {
            return Err(ExtremaError::Config(format!(
                "`{}` takes at most {max} arguments, got {}",
                self.name,
                self.args.len()
            )));
        }
        Ok(())
    }
}

impl fmt::Display for MethodSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, a) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{a}")?;
        }
        write!(f, ")")
    }
}

/// Non-negative finite argument check shared by the predicate constructors.
pub(crate) fn non_negative(spec: &MethodSpec, what: &str, v: f64) -> Result<f64, ExtremaError> {
    if v < 0.0 {
        return Err(ExtremaError::Config(format!(
            "`{}`: {what} must be non-negative, got {v}",
            spec.name
        )));
    }
    Ok(v)
}

/// The detection variant selected by the method string.
#[derive(Clone, Debug, PartialEq)]
pub enum ExtremaMethod {
    Minima(Minima),
    Maxima(Maxima),
    MinimaBack(MinimaBackground),
    MinimaBackWind(MinimaBackWind),
}

impl ExtremaMethod {
    /// Parse and validate a method string such as `minima_back(2,500,1,2)`.
    pub fn parse(s: &str) -> Result<Self, ExtremaError> {
        Self::from_spec(&MethodSpec::parse(s)?)
    }

    pub fn from_spec(spec: &MethodSpec) -> Result<Self, ExtremaError> {
        match spec.name.as_str() {
            "minima" => Ok(ExtremaMethod::Minima(Minima::from_spec(spec)?)),
            "maxima" => Ok(ExtremaMethod::Maxima(Maxima::from_spec(spec)?)),
            "minima_back" => Ok(ExtremaMethod::MinimaBack(MinimaBackground::from_spec(spec)?)),
            "minima_back_wind" => Ok(ExtremaMethod::MinimaBackWind(MinimaBackWind::from_spec(
                spec,
            )?)),
            other => Err(ExtremaError::UnknownMethod(other.to_string())),
        }
    }

    fn inner(&self) -> &dyn ExtremumPredicate {
        match self {
            ExtremaMethod::Minima(p) => p,
            ExtremaMethod::Maxima(p) => p,
            ExtremaMethod::MinimaBack(p) => p,
            ExtremaMethod::MinimaBackWind(p) => p,
        }
    }
}

impl ExtremumPredicate for ExtremaMethod {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn parameters(&self) -> Vec<(&'static str, f64)> {
        self.inner().parameters()
    }

    fn max_merge_dist(&self) -> f64 {
        self.inner().max_merge_dist()
    }

    fn is_extrema(&self, ctx: &DetectionContext<'_>, tri: TriLabel, t: usize) -> Result<bool, ExtremaError> {
        self.inner().is_extrema(ctx, tri, t)
    }

    fn is_in_object(
        &self,
        ctx: &DetectionContext<'_>,
        seed: TriLabel,
        candidate: TriLabel,
        t: usize,
    ) -> Result<bool, ExtremaError> {
        self.inner().is_in_object(ctx, seed, candidate, t)
    }

    fn is_more_extreme(&self, a: f64, b: f64) -> bool {
        self.inner().is_more_extreme(a, b)
    }

    fn calculate_point_weight(&self, v: f64, min_v: f64, max_v: f64) -> f64 {
        self.inner().calculate_point_weight(v, min_v, max_v)
    }

    fn calculate_object_position(
        &self,
        ctx: &DetectionContext<'_>,
        object: &ExtremumObject,
        t: usize,
    ) -> Result<[f64; 3], ExtremaError> {
        self.inner().calculate_object_position(ctx, object, t)
    }

    fn calculate_object_intensity(
        &self,
        ctx: &DetectionContext<'_>,
        object: &ExtremumObject,
        t: usize,
    ) -> Result<f64, ExtremaError> {
        self.inner().calculate_object_intensity(ctx, object, t)
    }

    fn calculate_object_delta(
        &self,
        ctx: &DetectionContext<'_>,
        object: &ExtremumObject,
        t: usize,
    ) -> Result<f64, ExtremaError> {
        self.inner().calculate_object_delta(ctx, object, t)
    }

    fn object_background(
        &self,
        ctx: &DetectionContext<'_>,
        object: &ExtremumObject,
        t: usize,
    ) -> Result<Option<f64>, ExtremaError> {
        self.inner().object_background(ctx, object, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_arguments() {
        assert_eq!(parse_call("minima").unwrap(), ("minima".to_string(), vec![]));
        assert_eq!(parse_call(" maxima() ").unwrap(), ("maxima".to_string(), vec![]));
        assert_eq!(
            parse_call("minima_back(2, 500.5,1e-1,3)").unwrap(),
            ("minima_back".to_string(), vec![2.0, 500.5, 0.1, 3.0])
        );
    }

    #[test]
    fn malformed_strings_are_config_errors() {
        for bad in ["", "(1,2)", "minima(1,2", "minima1,2)", "minima(a)", "minima(1,,2)", "min ima(1)", "minima((1))", "minima(nan)"] {
            assert!(
                matches!(parse_call(bad), Err(ExtremaError::Config(_))),
                "accepted `{bad}`"
            );
        }
    }

    #[test]
    fn selects_variants() {
        assert!(matches!(ExtremaMethod::parse("minima(1,100)").unwrap(), ExtremaMethod::Minima(_)));
        assert!(matches!(ExtremaMethod::parse("maxima").unwrap(), ExtremaMethod::Maxima(_)));
        assert!(matches!(ExtremaMethod::parse("minima_back(1,100,0.5,2)").unwrap(), ExtremaMethod::MinimaBack(_)));
        assert!(matches!(ExtremaMethod::parse("minima_back_wind").unwrap(), ExtremaMethod::MinimaBackWind(_)));
        assert_eq!(
            ExtremaMethod::parse("saddle(1)"),
            Err(ExtremaError::UnknownMethod("saddle".into()))
        );
    }

    #[test]
    fn argument_validation() {
        assert!(ExtremaMethod::parse("minima(1,2,3)").is_err());
        assert!(ExtremaMethod::parse("minima(1,-5)").is_err());
        assert!(ExtremaMethod::parse("minima_back(1,100,0.5,2.5)").is_err());
        assert!(ExtremaMethod::parse("minima_back(1,100,-0.5)").is_err());
        let m = ExtremaMethod::parse("maxima(2,300)").unwrap();
        assert_eq!(m.max_merge_dist(), 300.0);
        assert_eq!(m.name(), "maxima");
    }

    #[test]
    fn display_roundtrips_through_parse() {
        let spec = MethodSpec::parse("minima_back(2,500,1,3)").unwrap();
        assert_eq!(spec.to_string(), "minima_back(2,500,1,3)");
        assert_eq!(MethodSpec::parse(&spec.to_string()).unwrap(), spec);
    }
}
