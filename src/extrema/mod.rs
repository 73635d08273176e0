//! Extrema detection and object formation.
//!
//! - [`method`] parses method strings into the closed set of predicates.
//! - [`minima`], [`maxima`] and [`background`] implement the predicates.
//! - [`steering`] defines the steering-provider contract.
//! - [`locator`] grows, splits and merges objects per time step.
//! - [`catalog`] collects the finalised objects.

pub mod background;
pub mod catalog;
pub mod locator;
pub mod maxima;
pub mod method;
pub mod minima;
pub mod object;
pub mod predicate;
pub mod steering;

pub use background::{BackgroundCache, MinimaBackWind, MinimaBackground};
pub use catalog::{ExtremaCatalog, ExtremumPoint, MetaData};
pub use locator::{DetectionOpts, ExtremaLocator, calculate_triangle_distance};
pub use maxima::Maxima;
pub use method::{ExtremaMethod, MethodSpec};
pub use minima::Minima;
pub use object::{ClaimMap, ExtremumObject, objects_share_nodes};
pub use predicate::{DetectionContext, ExtremumPredicate};
pub use steering::{PrecomputedSteering, SteeringProvider, SteeringSpec, UniformSteering};
