//! The object builder: seeds, growth, split, merge and finalisation for
//! every time step.
//!
//! Per time step the locator runs
//! `find_extrema → find_objects → split_objects → merge_objects →
//! ex_points_from_objects` and appends the result to the catalog. Steps are
//! processed in increasing order and the whole run fails on the first
//! error; there is no partial catalog.
//!
//! # Policies
//! - Growth is first-come: seeds are grown in mesh order and a triangle
//!   claimed by an earlier object is never re-claimed. Seeds swallowed by an
//!   earlier object become its internal seeds.
//! - An object with several internal seeds is split by simultaneous growth
//!   from those seeds inside its label set; a triangle reached by several
//!   seeds in the same hop goes to the seed with the nearest centroid, then
//!   to the earlier seed.
//! - Two objects merge when they share a triangle or their positions are at
//!   most `max_merge_dist` apart. Objects that do not touch are joined through
//!   the shortest chain of unclaimed triangles; when no such chain exists
//!   they stay separate.

use hashbrown::HashSet;
use itertools::Itertools;
use log::{debug, info, warn};

use crate::algs::traversal::{grow_region, is_connected, partition_from_seeds, shortest_bridge};
use crate::data::field::FieldStore;
use crate::debug_invariants::DebugInvariants;
use crate::extrema::background::BackgroundCache;
use crate::extrema::catalog::{ExtremaCatalog, ExtremumPoint, MetaData};
use crate::extrema::method::{ExtremaMethod, MethodSpec};
use crate::extrema::object::{ClaimMap, ExtremumObject, objects_share_nodes};
use crate::extrema::predicate::{DetectionContext, ExtremumPredicate};
use crate::extrema::steering::{SteeringProvider, SteeringSpec};
use crate::extrema_error::ExtremaError;
use crate::geometry::metrics::{EARTH_RADIUS_KM, add, great_circle_distance};
use crate::topology::mesh::{Adjacency, MeshAccessor};
use crate::topology::point::TriLabel;

/// Options for one detection run.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DetectionOpts {
    /// Hierarchy level objects are built at; `None` selects the finest.
    pub extrema_level: Option<u32>,
    pub adjacency: Adjacency,
    /// Sphere radius for merge distances, in the unit of `max_merge_dist`.
    pub sphere_radius: f64,
    /// Reference to the mesh the catalog was computed on.
    pub mesh_ref: String,
}

impl Default for DetectionOpts {
    fn default() -> Self {
        Self {
            extrema_level: None,
            adjacency: Adjacency::Point,
            sphere_radius: EARTH_RADIUS_KM,
            mesh_ref: String::new(),
        }
    }
}

/// Great-circle distance between the centroids of two triangles.
pub fn calculate_triangle_distance<M: MeshAccessor + ?Sized>(
    mesh: &M,
    a: TriLabel,
    b: TriLabel,
    radius: f64,
) -> Result<f64, ExtremaError> {
    Ok(great_circle_distance(mesh.centroid(a)?, mesh.centroid(b)?, radius))
}

/// Detects extremum objects for every time step of a field.
#[derive(Debug)]
pub struct ExtremaLocator {
    method: ExtremaMethod,
    method_spec: MethodSpec,
    steering: Option<SteeringSpec>,
    provider: Option<Box<dyn SteeringProvider>>,
    opts: DetectionOpts,
}

impl ExtremaLocator {
    /// Parse and validate the method and steering strings.
    ///
    /// Every configuration error surfaces here, before any field value is
    /// read.
    pub fn new(method: &str, steering: &str, opts: DetectionOpts) -> Result<Self, ExtremaError> {
        let method_spec = MethodSpec::parse(method)?;
        let method = ExtremaMethod::from_spec(&method_spec)?;
        let steering = SteeringSpec::parse(steering)?;
        if !(opts.sphere_radius.is_finite() && opts.sphere_radius > 0.0) {
            return Err(ExtremaError::Config(format!(
                "sphere radius must be positive, got {}",
                opts.sphere_radius
            )));
        }
        let provider = steering.as_ref().and_then(SteeringSpec::builtin_provider);
        let locator = Self {
            method,
            method_spec,
            steering,
            provider,
            opts,
        };
        if matches!(locator.method, ExtremaMethod::MinimaBackWind(_)) && !locator.steers_background() {
            warn!(
                "`{}` without a steering method falls back to the unsteered background",
                locator.method_spec.name
            );
        }
        Ok(locator)
    }

    /// Attach the provider for an externally computed steering method.
    pub fn set_steering_vector(&mut self, provider: Box<dyn SteeringProvider>) -> Result<(), ExtremaError> {
        if self.steering.is_none() {
            return Err(ExtremaError::Config(
                "a steering provider needs a steering method string".into(),
            ));
        }
        self.provider = Some(provider);
        Ok(())
    }

    pub fn method(&self) -> &ExtremaMethod {
        &self.method
    }

    pub fn opts(&self) -> &DetectionOpts {
        &self.opts
    }

    pub fn steering(&self) -> Option<&SteeringSpec> {
        self.steering.as_ref()
    }

    /// True when the method advects its background along a configured
    /// steering flow.
    pub fn steers_background(&self) -> bool {
        matches!(self.method, ExtremaMethod::MinimaBackWind(_)) && self.steering.is_some()
    }

    /// Level objects are built at on `mesh`.
    pub fn detection_level<M: MeshAccessor + ?Sized>(&self, mesh: &M) -> Result<u32, ExtremaError> {
        let max = mesh.max_level();
        let level = self.opts.extrema_level.unwrap_or(max);
        if level > max {
            return Err(ExtremaError::InvalidLevel { level, max });
        }
        Ok(level)
    }

    /// The metadata record written with every catalog.
    pub fn metadata(&self, level: u32) -> MetaData {
        let mut meta = MetaData::new();
        meta.insert("method".into(), self.method_spec.name.clone());
        meta.insert(
            "method_args".into(),
            self.method
                .parameters()
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .join(","),
        );
        let (steering, steering_args) = match &self.steering {
            Some(s) => (s.method().to_string(), s.args().iter().join(",")),
            None => (String::new(), String::new()),
        };
        meta.insert("steering".into(), steering);
        meta.insert("steering_args".into(), steering_args);
        meta.insert("extrema_level".into(), level.to_string());
        meta.insert("adjacency".into(), self.opts.adjacency.to_string());
        meta.insert("sphere_radius".into(), self.opts.sphere_radius.to_string());
        meta.insert("crate_version".into(), env!("CARGO_PKG_VERSION").to_string());
        meta
    }

    /// Run detection over every time step of `field`.
    pub fn locate(&self, mesh: &dyn MeshAccessor, field: &dyn FieldStore) -> Result<ExtremaCatalog, ExtremaError> {
        let level = self.detection_level(mesh)?;
        if let Some(SteeringSpec::External { method, .. }) = &self.steering {
            if self.provider.is_none() {
                return Err(ExtremaError::Config(format!(
                    "steering method `{method}` needs an attached steering provider"
                )));
            }
        }
        let backgrounds = BackgroundCache::new();
        let ctx = DetectionContext {
            mesh,
            field,
            steering: self.provider.as_deref(),
            level,
            adjacency: self.opts.adjacency,
            sphere_radius: self.opts.sphere_radius,
            backgrounds: Some(&backgrounds),
        };

        let mut catalog = ExtremaCatalog::new(self.metadata(level));
        for t in 0..field.n_time_steps() {
            catalog.begin_time_step(t)?;
            backgrounds.retain_from(t);
            let seeds = self.find_extrema(&ctx, t)?;
            let grown = self.find_objects(&ctx, &seeds, t)?;
            let n_grown = grown.len();
            let split = self.split_objects(&ctx, grown, t)?;
            let merged = self.merge_objects(&ctx, split, t)?;
            let points = self.ex_points_from_objects(&ctx, &merged, t)?;
            info!(
                "time step {t}: {} seeds, {n_grown} grown, {} objects",
                seeds.len(),
                points.len()
            );
            for p in points {
                catalog.add(t, p)?;
            }
            catalog.debug_assert_invariants();
        }
        Ok(catalog)
    }

    /// Triangles of the detection level passing `is_extrema`, in mesh order.
    pub fn find_extrema(&self, ctx: &DetectionContext<'_>, t: usize) -> Result<Vec<TriLabel>, ExtremaError> {
        let tris = ctx.mesh.triangles_at_level(ctx.level)?;
        #[cfg(feature = "rayon")]
        let flags: Vec<bool> = {
            use rayon::prelude::*;
            tris.par_iter()
                .map(|&l| self.method.is_extrema(ctx, l, t))
                .collect::<Result<_, _>>()?
        };
        #[cfg(not(feature = "rayon"))]
        let flags: Vec<bool> = tris
            .iter()
            .map(|&l| self.method.is_extrema(ctx, l, t))
            .collect::<Result<_, _>>()?;
        Ok(tris
            .iter()
            .zip(flags)
            .filter_map(|(&l, keep)| keep.then_some(l))
            .collect())
    }

    /// Grow one object per unclaimed seed.
    pub fn find_objects(
        &self,
        ctx: &DetectionContext<'_>,
        seeds: &[TriLabel],
        t: usize,
    ) -> Result<Vec<ExtremumObject>, ExtremaError> {
        let mut claims = ClaimMap::new();
        let mut objects: Vec<ExtremumObject> = Vec::new();
        for &seed in seeds {
            if !claims.claim(seed, objects.len()) {
                continue;
            }
            let idx = objects.len();
            let region = grow_region(ctx.mesh, seed, ctx.adjacency, |n| {
                if claims.is_claimed(n) || !self.method.is_in_object(ctx, seed, n, t)? {
                    return Ok(false);
                }
                Ok(claims.claim(n, idx))
            })?;
            objects.push(ExtremumObject::from_labels(region.into_iter().collect(), vec![seed]));
        }
        for &seed in seeds {
            if let Some(o) = claims.owner(seed) {
                let obj = &mut objects[o];
                if !obj.seeds.contains(&seed) {
                    obj.seeds.push(seed);
                }
            }
        }
        Ok(objects)
    }

    /// Partition objects holding several seeds into one part per seed.
    pub fn split_objects(
        &self,
        ctx: &DetectionContext<'_>,
        objects: Vec<ExtremumObject>,
        _t: usize,
    ) -> Result<Vec<ExtremumObject>, ExtremaError> {
        let mut out = Vec::with_capacity(objects.len());
        for obj in objects {
            if obj.seeds.len() <= 1 {
                out.push(obj);
                continue;
            }
            let parts = partition_from_seeds(ctx.mesh, &obj.labels, &obj.seeds, ctx.adjacency, |tri, i| {
                calculate_triangle_distance(ctx.mesh, tri, obj.seeds[i], ctx.sphere_radius)
            })?;
            debug!(
                "split object of {} triangles at seeds [{}]",
                obj.labels.len(),
                obj.seeds.iter().join(", ")
            );
            for (part, &seed) in parts.into_iter().zip(&obj.seeds) {
                if !part.is_empty() {
                    out.push(ExtremumObject::from_labels(part, vec![seed]));
                }
            }
        }
        Ok(out)
    }

    /// Merge touching or nearby objects until no pair qualifies. Every
    /// returned object carries its computed position, intensity and delta.
    pub fn merge_objects(
        &self,
        ctx: &DetectionContext<'_>,
        mut objects: Vec<ExtremumObject>,
        t: usize,
    ) -> Result<Vec<ExtremumObject>, ExtremaError> {
        for o in &mut objects {
            self.update_attributes(ctx, o, t)?;
        }
        let max_dist = self.method.max_merge_dist();
        let mut unbridgeable: HashSet<(usize, usize)> = HashSet::new();
        let mut warned: HashSet<(Option<TriLabel>, Option<TriLabel>)> = HashSet::new();
        while let Some((i, j, bridge)) =
            self.next_merge(ctx, &objects, max_dist, &mut unbridgeable, &mut warned)?
        {
            let other = objects.remove(j);
            debug!(
                "time step {t}: merging object at {:?} into object at {:?} ({} bridge triangles)",
                other.original_triangle(),
                objects[i].original_triangle(),
                bridge.len()
            );
            let merged = &mut objects[i];
            merged.absorb(other);
            merged.labels.extend(bridge);
            self.update_attributes(ctx, merged, t)?;
            crate::debug_invariants!(
                check_connected(ctx, merged),
                "merged object lost connectivity"
            );
            // indices shifted; forget pairs that involved the removed slot
            unbridgeable.clear();
        }
        Ok(objects)
    }

    fn update_attributes(
        &self,
        ctx: &DetectionContext<'_>,
        obj: &mut ExtremumObject,
        t: usize,
    ) -> Result<(), ExtremaError> {
        obj.position = self.method.calculate_object_position(ctx, obj, t)?;
        obj.intensity = self.method.calculate_object_intensity(ctx, obj, t)?;
        obj.delta = self.method.calculate_object_delta(ctx, obj, t)?;
        Ok(())
    }

    /// First pair `(i, j)`, `i < j`, that should merge, with the bridge
    /// triangles joining them.
    fn next_merge(
        &self,
        ctx: &DetectionContext<'_>,
        objects: &[ExtremumObject],
        max_dist: f64,
        unbridgeable: &mut HashSet<(usize, usize)>,
        warned: &mut HashSet<(Option<TriLabel>, Option<TriLabel>)>,
    ) -> Result<Option<(usize, usize, Vec<TriLabel>)>, ExtremaError> {
        let mut claims: Option<ClaimMap> = None;
        for i in 0..objects.len() {
            for j in (i + 1)..objects.len() {
                let (a, b) = (&objects[i], &objects[j]);
                if objects_share_nodes(a, b) {
                    return Ok(Some((i, j, Vec::new())));
                }
                if unbridgeable.contains(&(i, j)) {
                    continue;
                }
                if great_circle_distance(a.position, b.position, ctx.sphere_radius) > max_dist {
                    continue;
                }
                let claims = claims.get_or_insert_with(|| ClaimMap::from_objects(objects));
                match shortest_bridge(ctx.mesh, &a.labels, &b.labels, ctx.adjacency, |l| {
                    !claims.is_claimed(l)
                })? {
                    Some(bridge) => return Ok(Some((i, j, bridge))),
                    None => {
                        unbridgeable.insert((i, j));
                        if !warned.insert((a.original_triangle(), b.original_triangle())) {
                            continue;
                        }
                        warn!(
                            "objects at {:?} and {:?} are within merge distance but cannot be connected",
                            a.original_triangle(),
                            b.original_triangle()
                        );
                    }
                }
            }
        }
        Ok(None)
    }

    /// Final attributes and steering for each object, in object order.
    pub fn ex_points_from_objects(
        &self,
        ctx: &DetectionContext<'_>,
        objects: &[ExtremumObject],
        t: usize,
    ) -> Result<Vec<ExtremumPoint>, ExtremaError> {
        let mut out = Vec::with_capacity(objects.len());
        for obj in objects {
            let Some(origin) = obj.original_triangle() else {
                continue;
            };
            let position = self.method.calculate_object_position(ctx, obj, t)?;
            let intensity = self.method.calculate_object_intensity(ctx, obj, t)?;
            let delta = self.method.calculate_object_delta(ctx, obj, t)?;
            let background = self.method.object_background(ctx, obj, t)?;
            let steering = match ctx.steering {
                Some(provider) => provider.displacement(ctx.mesh.locate(position, ctx.level)?, t)?,
                None => None,
            };
            out.push(ExtremumPoint {
                time_step: t,
                origin,
                labels: obj.labels.clone(),
                position,
                intensity,
                delta,
                background,
                steering,
                steered_position: steering.map(|d| add(position, d)),
            });
        }
        Ok(out)
    }
}

#[cfg_attr(not(any(debug_assertions, feature = "strict-invariants")), allow(dead_code))]
fn check_connected(ctx: &DetectionContext<'_>, obj: &ExtremumObject) -> Result<(), ExtremaError> {
    if is_connected(ctx.mesh, &obj.labels, ctx.adjacency)? {
        Ok(())
    } else {
        Err(ExtremaError::Invariant(format!(
            "object {:?} is not connected",
            obj.original_triangle()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_surface_at_setup() {
        let opts = DetectionOpts::default();
        assert_eq!(
            ExtremaLocator::new("saddle", "", opts.clone()).err(),
            Some(ExtremaError::UnknownMethod("saddle".into()))
        );
        assert_eq!(
            ExtremaLocator::new("minima", "vorticity(1)", opts.clone()).err(),
            Some(ExtremaError::UnknownSteering("vorticity".into()))
        );
        assert!(matches!(
            ExtremaLocator::new("minima(1", "", opts.clone()),
            Err(ExtremaError::Config(_))
        ));
        let bad_radius = DetectionOpts {
            sphere_radius: 0.0,
            ..opts
        };
        assert!(matches!(
            ExtremaLocator::new("minima", "", bad_radius),
            Err(ExtremaError::Config(_))
        ));
    }

    #[test]
    fn metadata_records_effective_configuration() {
        let loc = ExtremaLocator::new("minima_back(2,500)", "uniform(0,0,1)", DetectionOpts::default()).unwrap();
        let meta = loc.metadata(3);
        assert_eq!(meta["method"], "minima_back");
        assert_eq!(meta["method_args"], "contour=2,max_merge_dist=500,min_delta=0,bg_hops=2");
        assert_eq!(meta["steering"], "uniform");
        assert_eq!(meta["steering_args"], "0,0,1");
        assert_eq!(meta["extrema_level"], "3");
        assert_eq!(meta["adjacency"], "point");
        assert_eq!(meta["sphere_radius"], "6371");
        assert!(meta.contains_key("crate_version"));
    }

    fn l(i: u64) -> TriLabel {
        TriLabel::new(i)
    }

    /// Three triangles around `(1,0,0)`. Edge adjacency joins 0-1 and 1-2
    /// only.
    fn fan() -> crate::topology::mesh::TriMesh {
        let mut b = crate::topology::mesh::TriMesh::builder();
        let a = b.add_vertex([1.0, 0.0, 0.0]);
        let c = b.add_vertex([0.0, 1.0, 0.0]);
        let d = b.add_vertex([0.0, 0.0, 1.0]);
        let e = b.add_vertex([0.0, -1.0, 0.0]);
        let f = b.add_vertex([0.0, 0.0, -1.0]);
        b.add_triangle(l(0), [a, c, d], None);
        b.add_triangle(l(1), [a, d, e], None);
        b.add_triangle(l(2), [a, e, f], None);
        b.build().unwrap()
    }

    fn merged_objects(method: &str, values: [f64; 3]) -> Vec<ExtremumObject> {
        let mesh = fan();
        let field = crate::data::field::FieldSection::from_fn((0..3).map(l), 1, |tri, _| {
            values[tri.get() as usize]
        });
        let opts = DetectionOpts {
            adjacency: Adjacency::Edge,
            ..DetectionOpts::default()
        };
        let loc = ExtremaLocator::new(method, "", opts).unwrap();
        let ctx = DetectionContext {
            mesh: &mesh,
            field: &field,
            steering: None,
            level: 0,
            adjacency: Adjacency::Edge,
            sphere_radius: EARTH_RADIUS_KM,
            backgrounds: None,
        };
        let seeds = loc.find_extrema(&ctx, 0).unwrap();
        assert_eq!(seeds, vec![l(0), l(2)]);
        let grown = loc.find_objects(&ctx, &seeds, 0).unwrap();
        assert_eq!(grown.len(), 2);
        let split = loc.split_objects(&ctx, grown, 0).unwrap();
        loc.merge_objects(&ctx, split, 0).unwrap()
    }

    #[test]
    fn merged_objects_carry_intensity_and_delta() {
        let merged = merged_objects("minima(0,100000)", [-10.0, 0.0, -10.0]);
        assert_eq!(merged.len(), 1);
        let labels: Vec<_> = merged[0].labels.iter().collect();
        assert_eq!(labels, vec![l(0), l(1), l(2)]);
        assert_eq!(merged[0].intensity, -10.0);
        assert_eq!(merged[0].delta, 0.0);
    }

    #[test]
    fn merged_background_objects_carry_their_delta() {
        // one-hop edge rings: bg(0) = mean(-10, 0) = -5
        let merged = merged_objects("minima_back(0,100000,0,1)", [-10.0, 0.0, -9.0]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].intensity, -10.0);
        assert_eq!(merged[0].delta, -5.0);
    }

    #[test]
    fn wind_method_reports_whether_it_steers() {
        let opts = DetectionOpts::default();
        let bare = ExtremaLocator::new("minima_back_wind", "", opts.clone()).unwrap();
        assert!(!bare.steers_background());
        let steered = ExtremaLocator::new("minima_back_wind", "uniform(0,0.01,0)", opts.clone()).unwrap();
        assert!(steered.steers_background());
        let plain = ExtremaLocator::new("minima_back", "uniform(0,0.01,0)", opts).unwrap();
        assert!(!plain.steers_background());
    }

    #[test]
    fn provider_requires_a_steering_method() {
        let mut loc = ExtremaLocator::new("minima", "", DetectionOpts::default()).unwrap();
        let p = Box::new(crate::extrema::steering::UniformSteering::new([0.0; 3]));
        assert!(loc.set_steering_vector(p).is_err());
    }
}
