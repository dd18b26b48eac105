//! Shared vector geometry: convex-hull triangulation of a loudspeaker
//! point set and the VBAP barycentric solve used by the point-source
//! panner (spec §4.3 step 5).

use nalgebra::{Matrix3, Vector3};

pub type Vec3 = Vector3<f64>;

/// A triangular face of the point-source mesh, referencing three point
/// indices into the panner's vertex list.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub indices: [usize; 3],
    /// Inverse of the 3x3 matrix whose columns are the triangle's unit
    /// vertex vectors, precomputed so each pan query is a single
    /// matrix-vector solve.
    inverse: Matrix3<f64>,
}

/// Build the convex hull of `points` (assumed to lie on or near the unit
/// sphere) as a set of triangular faces. Brute-force O(n^4) plane test;
/// fine for the small (<= ~40) vertex counts a loudspeaker layout plus
/// its virtual speakers produces, and this only runs once per layout.
pub fn convex_hull_triangles(points: &[Vec3]) -> Vec<Triangle> {
    let n = points.len();
    let mut faces = Vec::new();
    const EPS: f64 = 1e-6;

    for i in 0..n {
        for j in (i + 1)..n {
            for k in (j + 1)..n {
                let (a, b, c) = (points[i], points[j], points[k]);
                let mut normal = (b - a).cross(&(c - a));
                if normal.norm() < 1e-9 {
                    continue;
                }
                // Orient outward: the centroid direction from the origin
                // should lie on the positive side of the plane.
                let centroid = a + b + c;
                if normal.dot(&centroid) < 0.0 {
                    normal = -normal;
                }
                let mut is_face = true;
                for (idx, p) in points.iter().enumerate() {
                    if idx == i || idx == j || idx == k {
                        continue;
                    }
                    if (p - a).dot(&normal) > EPS {
                        is_face = false;
                        break;
                    }
                }
                if is_face {
                    let m = Matrix3::from_columns(&[a, b, c]);
                    if let Some(inverse) = m.try_inverse() {
                        faces.push(Triangle {
                            indices: [i, j, k],
                            inverse,
                        });
                    }
                }
            }
        }
    }
    faces
}

/// VBAP barycentric gains of `direction` (need not be normalised) against
/// a triangle's three vertex vectors: solve `M * g = direction` where the
/// columns of `M` are the vertex vectors. Returns `None` when any
/// resulting weight is meaningfully negative (non-containing), matching
/// the barycentric-positivity contract (spec §8 property 3).
pub fn triangle_gains(triangle: &Triangle, direction: Vec3) -> Option<[f64; 3]> {
    let g = triangle.inverse * direction;
    const NEG_TOL: f64 = -1e-6;
    if g.x >= NEG_TOL && g.y >= NEG_TOL && g.z >= NEG_TOL {
        Some([g.x.max(0.0), g.y.max(0.0), g.z.max(0.0)])
    } else {
        None
    }
}

/// Normalise a gain vector for equal-power output (sum of squares = 1).
pub fn normalize_power(gains: &mut [f64]) {
    let total: f64 = gains.iter().map(|g| g * g).sum::<f64>().sqrt();
    if total > 1e-12 {
        for g in gains.iter_mut() {
            *g /= total;
        }
    }
}

/// Angular (great-circle) distance in radians between two unit vectors.
pub fn angular_distance(a: Vec3, b: Vec3) -> f64 {
    a.normalize().dot(&b.normalize()).clamp(-1.0, 1.0).acos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn octahedron() -> Vec<Vec3> {
        vec![
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, -1.0),
        ]
    }

    #[test]
    fn octahedron_hull_has_eight_faces() {
        let faces = convex_hull_triangles(&octahedron());
        assert_eq!(faces.len(), 8);
    }

    #[test]
    fn vertex_direction_yields_one_hot_gains() {
        let points = octahedron();
        let faces = convex_hull_triangles(&points);
        // direction coincides with points[0]; find the face containing it
        let mut found = false;
        for f in &faces {
            if let Some(g) = triangle_gains(f, points[0]) {
                let mut full = [0.0; 6];
                for (idx, gain) in f.indices.iter().zip(g.iter()) {
                    full[*idx] = *gain;
                }
                assert_relative_eq!(full[0], 1.0, epsilon = 1e-6);
                found = true;
                break;
            }
        }
        assert!(found);
    }

    #[test]
    fn power_preservation_after_normalisation() {
        let mut gains = [0.6, 0.8, 0.0];
        normalize_power(&mut gains);
        let power: f64 = gains.iter().map(|g| g * g).sum();
        assert_relative_eq!(power, 1.0, epsilon = 1e-10);
    }
}
