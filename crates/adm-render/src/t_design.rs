//! Fixed spherical point set used to integrate the extent/spreading
//! patch (spec §4.3 step 6) and to build the AllRAD HOA decoder (§4.5).
//!
//! The reference renderer embeds a genuine t=100, 5200-point spherical
//! t-design as a verbatim data file for bit-reproducible quadrature. That
//! table isn't available to this implementation, so the point set here is
//! generated deterministically with a Fibonacci-sphere spiral instead —
//! an open question resolved in DESIGN.md. It is still a *fixed*,
//! order-independent point set: the same `POINT_COUNT` and generation
//! formula run on every platform, which is what the determinism
//! requirement in the design notes actually needs from callers of
//! [`SphericalPointSet::reference`].

use crate::geometry::Vec3;
use std::sync::OnceLock;

/// Point count of the reference design. Chosen to match the spec's stated
/// 5200-point, t=100 design size even though the generation method here
/// differs from the true t-design construction.
pub const POINT_COUNT: usize = 5200;

pub struct SphericalPointSet {
    pub points: Vec<Vec3>,
}

impl SphericalPointSet {
    fn generate(n: usize) -> Vec<Vec3> {
        let golden_angle = std::f64::consts::PI * (3.0 - 5.0_f64.sqrt());
        (0..n)
            .map(|i| {
                let z = 1.0 - 2.0 * (i as f64 + 0.5) / n as f64;
                let r = (1.0 - z * z).max(0.0).sqrt();
                let theta = golden_angle * i as f64;
                Vec3::new(r * theta.cos(), r * theta.sin(), z)
            })
            .collect()
    }

    /// The process-wide fixed reference point set. Summation order over
    /// these points must stay in index order wherever they're used as
    /// quadrature weights, to keep numerical output reproducible.
    pub fn reference() -> &'static SphericalPointSet {
        static SET: OnceLock<SphericalPointSet> = OnceLock::new();
        SET.get_or_init(|| SphericalPointSet {
            points: Self::generate(POINT_COUNT),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_set_has_expected_size_and_unit_points() {
        let set = SphericalPointSet::reference();
        assert_eq!(set.points.len(), POINT_COUNT);
        for p in &set.points {
            assert!((p.norm() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn reference_set_is_deterministic_across_calls() {
        let a = SphericalPointSet::reference();
        let b = SphericalPointSet::reference();
        assert_eq!(a.points[10], b.points[10]);
    }
}
