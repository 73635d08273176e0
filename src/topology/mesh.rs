//! Hierarchical triangular mesh access.
//!
//! The detection engine only talks to the mesh through [`MeshAccessor`]:
//! triangles by level, neighbor queries, parent/child relations and
//! per-triangle geometry. [`TriMesh`] is a resident implementation built from
//! caller-provided vertices and triangles; it does not generate meshes.
//!
//! Levels count down the hierarchy: roots are level 0, their children level
//! 1, and so on. Neighbor relations only connect triangles of the same level.

use std::fmt;
use std::str::FromStr;

use hashbrown::HashMap;

use crate::algs::adjacency_graph::{AdjacencyGraph, build_triangle_adjacency, select};
use crate::extrema_error::ExtremaError;
use crate::geometry::metrics::{angle_between, check_triangle, triangle_centroid};
use crate::topology::point::TriLabel;

/// Neighbor relation between triangles of one level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Adjacency {
    /// Any shared vertex.
    #[default]
    Point,
    /// A shared edge.
    Edge,
}

impl fmt::Display for Adjacency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Adjacency::Point => write!(f, "point"),
            Adjacency::Edge => write!(f, "edge"),
        }
    }
}

impl FromStr for Adjacency {
    type Err = ExtremaError;

    /// Accepts `point`/`edge` or the numeric selectors `0`/`1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "point" | "0" => Ok(Adjacency::Point),
            "edge" | "1" => Ok(Adjacency::Edge),
            other => Err(ExtremaError::Config(format!(
                "adjacency must be `point` (0) or `edge` (1), got `{other}`"
            ))),
        }
    }
}

impl TryFrom<i32> for Adjacency {
    type Error = ExtremaError;

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Adjacency::Point),
            1 => Ok(Adjacency::Edge),
            _ => Err(ExtremaError::Config(format!(
                "adjacency must be 0 (point) or 1 (edge), got {v}"
            ))),
        }
    }
}

/// One mesh cell.
#[derive(Clone, Debug, PartialEq)]
pub struct Triangle {
    pub label: TriLabel,
    pub level: u32,
    /// Indices into the mesh vertex list.
    pub vertex_ids: [usize; 3],
    pub vertices: [[f64; 3]; 3],
    /// Arithmetic mean of the vertices.
    pub centroid: [f64; 3],
    pub parent: Option<TriLabel>,
    pub children: Vec<TriLabel>,
}

/// Read-only view of a hierarchical triangular mesh.
pub trait MeshAccessor: Send + Sync {
    /// Deepest level present in the mesh.
    fn max_level(&self) -> u32;

    /// Triangles of `level` in mesh order.
    fn triangles_at_level(&self, level: u32) -> Result<&[TriLabel], ExtremaError>;

    fn triangle(&self, label: TriLabel) -> Result<&Triangle, ExtremaError>;

    /// Same-level neighbors of `label`, sorted in mesh order.
    fn neighbors(&self, label: TriLabel, adjacency: Adjacency) -> Result<&[TriLabel], ExtremaError>;

    fn centroid(&self, label: TriLabel) -> Result<[f64; 3], ExtremaError> {
        Ok(self.triangle(label)?.centroid)
    }

    fn parent(&self, label: TriLabel) -> Result<Option<TriLabel>, ExtremaError> {
        Ok(self.triangle(label)?.parent)
    }

    fn children(&self, label: TriLabel) -> Result<&[TriLabel], ExtremaError> {
        Ok(&self.triangle(label)?.children)
    }

    /// Descendants of `label` that are either at `max_level` or have no
    /// children, in depth-first child order. A triangle already at or below
    /// `max_level`, or without children, is its own only leaf.
    fn leaf_descendants(&self, label: TriLabel, max_level: u32) -> Result<Vec<TriLabel>, ExtremaError> {
        let mut out = Vec::new();
        let mut stack = vec![label];
        while let Some(l) = stack.pop() {
            let tri = self.triangle(l)?;
            if tri.level >= max_level || tri.children.is_empty() {
                out.push(l);
            } else {
                // reversed so the first child is visited first
                stack.extend(tri.children.iter().rev().copied());
            }
        }
        Ok(out)
    }

    /// Triangle of `level` whose centroid is closest in direction to `point`.
    ///
    /// Descends the hierarchy from the nearest root, choosing the nearest
    /// child at every step. This is exact for well-shaped hierarchical meshes
    /// and a close approximation otherwise.
    fn locate(&self, point: [f64; 3], level: u32) -> Result<TriLabel, ExtremaError> {
        let roots = self.triangles_at_level(0)?;
        let mut current = nearest(self, roots, point)?.ok_or_else(|| {
            ExtremaError::InvalidGeometry("mesh has no root triangles".into())
        })?;
        loop {
            let tri = self.triangle(current)?;
            if tri.level >= level || tri.children.is_empty() {
                return Ok(current);
            }
            match nearest(self, &tri.children, point)? {
                Some(next) => current = next,
                None => return Ok(current),
            }
        }
    }
}

fn nearest<M: MeshAccessor + ?Sized>(
    mesh: &M,
    candidates: &[TriLabel],
    point: [f64; 3],
) -> Result<Option<TriLabel>, ExtremaError> {
    let mut best: Option<(f64, TriLabel)> = None;
    for &c in candidates {
        let a = angle_between(mesh.centroid(c)?, point);
        if best.is_none_or(|(ba, _)| a < ba) {
            best = Some((a, c));
        }
    }
    Ok(best.map(|(_, l)| l))
}

/// Resident hierarchical triangular mesh.
#[derive(Clone, Debug)]
pub struct TriMesh {
    vertices: Vec<[f64; 3]>,
    triangles: Vec<Triangle>,
    index: HashMap<TriLabel, usize>,
    levels: Vec<Vec<TriLabel>>,
    /// Per-level `(point, edge)` adjacency graphs.
    graphs: Vec<(AdjacencyGraph, AdjacencyGraph)>,
    /// Neighbor labels per triangle, materialised for slice access.
    point_neighbors: Vec<Vec<TriLabel>>,
    edge_neighbors: Vec<Vec<TriLabel>>,
}

impl TriMesh {
    pub fn builder() -> TriMeshBuilder {
        TriMeshBuilder::default()
    }

    pub fn vertices(&self) -> &[[f64; 3]] {
        &self.vertices
    }

    /// Number of triangles over all levels.
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// All triangles in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Triangle> + '_ {
        self.triangles.iter()
    }

    /// The CSR adjacency graph of one level.
    pub fn adjacency_graph(&self, level: u32, adjacency: Adjacency) -> Result<&AdjacencyGraph, ExtremaError> {
        let graphs = self.graphs.get(level as usize).ok_or(ExtremaError::InvalidLevel {
            level,
            max: self.max_level(),
        })?;
        Ok(select(graphs, adjacency))
    }

    fn slot(&self, label: TriLabel) -> Result<usize, ExtremaError> {
        self.index
            .get(&label)
            .copied()
            .ok_or(ExtremaError::UnknownTriangle(label))
    }
}

impl MeshAccessor for TriMesh {
    fn max_level(&self) -> u32 {
        self.levels.len().saturating_sub(1) as u32
    }

    fn triangles_at_level(&self, level: u32) -> Result<&[TriLabel], ExtremaError> {
        self.levels
            .get(level as usize)
            .map(Vec::as_slice)
            .ok_or(ExtremaError::InvalidLevel {
                level,
                max: self.max_level(),
            })
    }

    fn triangle(&self, label: TriLabel) -> Result<&Triangle, ExtremaError> {
        Ok(&self.triangles[self.slot(label)?])
    }

    fn neighbors(&self, label: TriLabel, adjacency: Adjacency) -> Result<&[TriLabel], ExtremaError> {
        let i = self.slot(label)?;
        Ok(match adjacency {
            Adjacency::Point => &self.point_neighbors[i],
            Adjacency::Edge => &self.edge_neighbors[i],
        })
    }
}

/// Incremental constructor for [`TriMesh`].
///
/// Parents must be added before their children. A triangle's level is its
/// parent's level plus one; triangles without a parent are roots.
#[derive(Clone, Debug, Default)]
pub struct TriMeshBuilder {
    vertices: Vec<[f64; 3]>,
    triangles: Vec<(TriLabel, [usize; 3], Option<TriLabel>)>,
}

impl TriMeshBuilder {
    /// Appends a vertex and returns its index.
    pub fn add_vertex(&mut self, p: [f64; 3]) -> usize {
        self.vertices.push(p);
        self.vertices.len() - 1
    }

    /// Appends a triangle. Validation happens in [`TriMeshBuilder::build`].
    pub fn add_triangle(
        &mut self,
        label: TriLabel,
        vertex_ids: [usize; 3],
        parent: Option<TriLabel>,
    ) -> &mut Self {
        self.triangles.push((label, vertex_ids, parent));
        self
    }

    pub fn build(self) -> Result<TriMesh, ExtremaError> {
        let TriMeshBuilder { vertices, triangles } = self;
        let mut index: HashMap<TriLabel, usize> = HashMap::with_capacity(triangles.len());
        let mut tris: Vec<Triangle> = Vec::with_capacity(triangles.len());
        let mut levels: Vec<Vec<TriLabel>> = Vec::new();

        for (label, vertex_ids, parent) in triangles {
            if index.contains_key(&label) {
                return Err(ExtremaError::InvalidGeometry(format!(
                    "duplicate triangle label {label}"
                )));
            }
            let mut corners = [[0.0; 3]; 3];
            for (k, &vi) in vertex_ids.iter().enumerate() {
                corners[k] = *vertices.get(vi).ok_or_else(|| {
                    ExtremaError::InvalidGeometry(format!(
                        "triangle {label} references missing vertex {vi}"
                    ))
                })?;
            }
            check_triangle(&corners).map_err(|e| match e {
                ExtremaError::InvalidGeometry(msg) => {
                    ExtremaError::InvalidGeometry(format!("triangle {label}: {msg}"))
                }
                other => other,
            })?;
            let level = match parent {
                None => 0,
                Some(p) => {
                    let pi = *index.get(&p).ok_or_else(|| {
                        ExtremaError::InvalidGeometry(format!(
                            "parent {p} of triangle {label} must be added first"
                        ))
                    })?;
                    tris[pi].children.push(label);
                    tris[pi].level + 1
                }
            };
            if levels.len() <= level as usize {
                levels.resize_with(level as usize + 1, Vec::new);
            }
            levels[level as usize].push(label);
            index.insert(label, tris.len());
            tris.push(Triangle {
                label,
                level,
                vertex_ids,
                vertices: corners,
                centroid: triangle_centroid(&corners),
                parent,
                children: Vec::new(),
            });
        }

        let mut graphs = Vec::with_capacity(levels.len());
        let mut point_neighbors = vec![Vec::new(); tris.len()];
        let mut edge_neighbors = vec![Vec::new(); tris.len()];
        for labels in &levels {
            let input: Vec<(TriLabel, [usize; 3])> = labels
                .iter()
                .map(|l| (*l, tris[index[l]].vertex_ids))
                .collect();
            let pair = build_triangle_adjacency(&input);
            for (gi, l) in labels.iter().enumerate() {
                let ti = index[l];
                point_neighbors[ti] = pair.0.neighbor_labels(gi);
                edge_neighbors[ti] = pair.1.neighbor_labels(gi);
            }
            graphs.push(pair);
        }

        log::debug!(
            "built mesh: {} vertices, {} triangles, {} levels",
            vertices.len(),
            tris.len(),
            levels.len()
        );

        Ok(TriMesh {
            vertices,
            triangles: tris,
            index,
            levels,
            graphs,
            point_neighbors,
            edge_neighbors,
        })
    }
}
