#![allow(dead_code)]
//! Small spherical strip meshes for integration tests.
//!
//! A strip of `2 * n` root triangles lies along the equator near `(1,0,0)`.
//! Root `2i` has corners `b_i, b_{i+1}, t_i` and root `2i+1` has corners
//! `b_{i+1}, t_{i+1}, t_i`, where `b` runs along the equator and `t` one step
//! north. Root `k` is then edge-adjacent to `k±1` and point-adjacent to
//! `k±1, k±2`.
//!
//! With `refine`, every root gets four children labelled `100 + 4k + j`:
//! the three corner triangles (j = 0..3, in corner order) and the middle one
//! (j = 3).

use std::collections::HashMap;

use tri_extrema::data::field::FieldSection;
use tri_extrema::topology::mesh::{MeshAccessor, TriMesh};
use tri_extrema::topology::point::TriLabel;

/// Angular spacing of the strip vertices, in radians.
pub const STEP: f64 = 0.01;

pub fn l(i: u64) -> TriLabel {
    TriLabel::new(i)
}

pub fn labels(raw: &[u64]) -> Vec<TriLabel> {
    raw.iter().copied().map(TriLabel::new).collect()
}

fn on_sphere(lon: f64, lat: f64) -> [f64; 3] {
    [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
}

fn normalize(p: [f64; 3]) -> [f64; 3] {
    let n = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
    [p[0] / n, p[1] / n, p[2] / n]
}

pub fn child(root: u64, j: u64) -> TriLabel {
    l(100 + 4 * root + j)
}

/// Strip of `2 * pairs` root triangles, optionally refined once.
pub fn strip_mesh(pairs: usize, refine: bool) -> TriMesh {
    let mut b = TriMesh::builder();
    let bottom: Vec<usize> = (0..=pairs)
        .map(|i| b.add_vertex(on_sphere(i as f64 * STEP, 0.0)))
        .collect();
    let top: Vec<usize> = (0..=pairs)
        .map(|i| b.add_vertex(on_sphere(i as f64 * STEP, STEP)))
        .collect();

    let mut corners = Vec::new();
    for i in 0..pairs {
        corners.push([bottom[i], bottom[i + 1], top[i]]);
        corners.push([bottom[i + 1], top[i + 1], top[i]]);
    }
    for (k, c) in corners.iter().enumerate() {
        b.add_triangle(l(k as u64), *c, None);
    }

    if refine {
        let mut points: Vec<[f64; 3]> = Vec::new();
        for i in 0..=pairs {
            points.push(on_sphere(i as f64 * STEP, 0.0));
        }
        for i in 0..=pairs {
            points.push(on_sphere(i as f64 * STEP, STEP));
        }
        let mut mid: HashMap<(usize, usize), usize> = HashMap::new();
        let mut midpoint = |b: &mut tri_extrema::topology::mesh::TriMeshBuilder, u: usize, v: usize| {
            let key = (u.min(v), u.max(v));
            *mid.entry(key).or_insert_with(|| {
                let (p, q) = (points[u], points[v]);
                b.add_vertex(normalize([
                    0.5 * (p[0] + q[0]),
                    0.5 * (p[1] + q[1]),
                    0.5 * (p[2] + q[2]),
                ]))
            })
        };
        for (k, &[a, bb, c]) in corners.iter().enumerate() {
            let ab = midpoint(&mut b, a, bb);
            let bc = midpoint(&mut b, bb, c);
            let ca = midpoint(&mut b, c, a);
            let root = Some(l(k as u64));
            let k = k as u64;
            b.add_triangle(child(k, 0), [a, ab, ca], root);
            b.add_triangle(child(k, 1), [ab, bb, bc], root);
            b.add_triangle(child(k, 2), [ca, bc, c], root);
            b.add_triangle(child(k, 3), [ab, bc, ca], root);
        }
    }
    b.build().expect("strip mesh is well formed")
}

/// The 12-triangle single-level strip.
pub fn patch() -> TriMesh {
    strip_mesh(6, false)
}

/// One time step where every triangle of `mesh` holds `default` except the
/// listed overrides.
pub fn field_with(mesh: &TriMesh, default: f64, overrides: &[(u64, f64)]) -> FieldSection {
    fields_with(mesh, &[(default, overrides)])
}

/// Several time steps, each given as `(default, overrides)`.
pub fn fields_with(mesh: &TriMesh, steps: &[(f64, &[(u64, f64)])]) -> FieldSection {
    let mut f = FieldSection::new(steps.len());
    for tri in mesh.iter() {
        for (t, (default, overrides)) in steps.iter().enumerate() {
            let v = overrides
                .iter()
                .find(|(lab, _)| *lab == tri.label.get())
                .map_or(*default, |&(_, v)| v);
            f.set(tri.label, t, v).expect("time step in range");
        }
    }
    f
}

/// Field with per-root values, copied down to every child of each root.
pub fn root_values(mesh: &TriMesh, values: &[f64]) -> FieldSection {
    let mut f = FieldSection::new(1);
    for tri in mesh.iter() {
        let root = match tri.parent {
            Some(p) => p,
            None => tri.label,
        };
        f.set(tri.label, 0, values[root.get() as usize]).expect("time step in range");
    }
    f
}

/// Centroid of `label`, panicking on unknown labels.
pub fn centroid(mesh: &TriMesh, label: TriLabel) -> [f64; 3] {
    mesh.centroid(label).expect("known triangle")
}
