//! Vector helpers and spherical distances for triangle geometry.
//!
//! Mesh coordinates are 3D Cartesian points on (or near) a sphere centred at
//! the origin. Distances between triangles are great-circle distances on a
//! sphere of a caller-chosen radius; only the directions of the input points
//! matter, not their magnitudes.

use crate::extrema_error::ExtremaError;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

const EPS: f64 = 1e-12;

#[inline]
pub fn add(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
pub fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub fn scale(a: [f64; 3], s: f64) -> [f64; 3] {
    [a[0] * s, a[1] * s, a[2] * s]
}

#[inline]
pub fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
pub fn norm(a: [f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

/// Arithmetic mean of the three vertices.
pub fn triangle_centroid(vertices: &[[f64; 3]; 3]) -> [f64; 3] {
    scale(add(add(vertices[0], vertices[1]), vertices[2]), 1.0 / 3.0)
}

/// Planar area of the triangle spanned by the three vertices.
pub fn triangle_area(vertices: &[[f64; 3]; 3]) -> f64 {
    0.5 * norm(cross(
        sub(vertices[1], vertices[0]),
        sub(vertices[2], vertices[0]),
    ))
}

/// Rejects triangles with (near) zero area or a vertex at the origin.
pub fn check_triangle(vertices: &[[f64; 3]; 3]) -> Result<(), ExtremaError> {
    if vertices.iter().flatten().any(|c| !c.is_finite()) {
        return Err(ExtremaError::InvalidGeometry(
            "non-finite vertex coordinate".into(),
        ));
    }
    if vertices.iter().any(|v| norm(*v) < EPS) {
        return Err(ExtremaError::InvalidGeometry(
            "vertex at the sphere centre".into(),
        ));
    }
    if triangle_area(vertices) < EPS {
        return Err(ExtremaError::InvalidGeometry("degenerate triangle".into()));
    }
    Ok(())
}

/// Angle in radians between the directions of `a` and `b`.
///
/// Uses `atan2(|a x b|, a . b)`, which stays accurate for nearly parallel
/// vectors where `acos` loses precision.
pub fn angle_between(a: [f64; 3], b: [f64; 3]) -> f64 {
    norm(cross(a, b)).atan2(dot(a, b))
}

/// Great-circle distance between the directions of `a` and `b` on a sphere
/// of radius `radius`.
pub fn great_circle_distance(a: [f64; 3], b: [f64; 3], radius: f64) -> f64 {
    radius * angle_between(a, b)
}

/// Rescales `p` so that its length equals `radius`. The zero vector is
/// returned unchanged.
pub fn project_to_radius(p: [f64; 3], radius: f64) -> [f64; 3] {
    let n = norm(p);
    if n < EPS { p } else { scale(p, radius / n) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn quarter_circle_distance() {
        let d = great_circle_distance([1.0, 0.0, 0.0], [0.0, 2.0, 0.0], EARTH_RADIUS_KM);
        assert!(close(d, EARTH_RADIUS_KM * std::f64::consts::FRAC_PI_2, 1e-9));
    }

    #[test]
    fn distance_ignores_magnitude() {
        let a = [0.3, 0.4, 0.866];
        let b = [0.31, 0.39, 0.866];
        let d1 = great_circle_distance(a, b, 1.0);
        let d2 = great_circle_distance(scale(a, 10.0), b, 1.0);
        assert!(close(d1, d2, 1e-12));
        assert!(close(great_circle_distance(a, a, 1.0), 0.0, 1e-15));
    }

    #[test]
    fn centroid_and_area_of_unit_triangle() {
        let tri = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let c = triangle_centroid(&tri);
        assert!(c.iter().all(|&x| close(x, 1.0 / 3.0, 1e-15)));
        assert!(close(triangle_area(&tri), 3f64.sqrt() / 2.0, 1e-12));
        assert!(check_triangle(&tri).is_ok());
    }

    #[test]
    fn degenerate_triangles_are_rejected() {
        let flat = [[1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [3.0, 0.0, 0.0]];
        assert!(matches!(
            check_triangle(&flat),
            Err(ExtremaError::InvalidGeometry(_))
        ));
        let nan = [[f64::NAN, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        assert!(check_triangle(&nan).is_err());
    }

    #[test]
    fn projection_keeps_direction() {
        let p = project_to_radius([0.0, 3.0, 4.0], 10.0);
        assert!(close(norm(p), 10.0, 1e-12));
        assert!(close(angle_between(p, [0.0, 3.0, 4.0]), 0.0, 1e-12));
        assert_eq!(project_to_radius([0.0; 3], 5.0), [0.0; 3]);
    }
}
