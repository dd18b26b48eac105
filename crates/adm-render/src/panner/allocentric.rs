//! Allocentric (Cartesian) extent panner: blends the 8 cube-vertex gains
//! by the source's (x, y, z) within the `[-1, 1]^3` cube, per spec §4.3
//! step 5 (Cartesian path) / BS.2127 §7.3.8.

use adm_model::{CartesianPosition, Layout};

/// Speaker position mapped onto the allocentric cube: each non-LFE
/// channel is assigned to the nearest of the 8 cube vertices by sign
/// pattern of its nominal position.
pub struct AllocentricPanner {
    /// (channel index into `layout.without_lfe()`, vertex sign pattern)
    assignments: Vec<(usize, [f64; 3])>,
}

impl AllocentricPanner {
    pub fn new(layout: &Layout) -> Self {
        let assignments = layout
            .without_lfe()
            .iter()
            .map(|c| {
                let p = c.nominal_position.to_cartesian();
                let sign = |v: f64| if v >= 0.0 { 1.0 } else { -1.0 };
                (0, [sign(p.x), sign(p.y), sign(p.z)])
            })
            .enumerate()
            .map(|(i, (_, s))| (i, s))
            .collect();
        Self { assignments }
    }

    /// Trilinear blend of the 8 cube-corner weights for `position`
    /// (clamped into `[-1, 1]^3`), distributed onto every speaker sharing
    /// each corner's sign pattern.
    pub fn pan(&self, position: CartesianPosition) -> Vec<f64> {
        let x = position.x.clamp(-1.0, 1.0);
        let y = position.y.clamp(-1.0, 1.0);
        let z = position.z.clamp(-1.0, 1.0);

        let mut gains = vec![0.0; self.assignments.len()];
        for (idx, sign) in &self.assignments {
            let wx = 0.5 * (1.0 + sign[0] * x);
            let wy = 0.5 * (1.0 + sign[1] * y);
            let wz = 0.5 * (1.0 + sign[2] * z);
            gains[*idx] = wx * wy * wz;
        }
        crate::geometry::normalize_power(&mut gains);
        gains
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_of_cube_splits_across_all_corners() {
        let layout = Layout::layout_0_5_0();
        let panner = AllocentricPanner::new(&layout);
        let gains = panner.pan(CartesianPosition::new(0.0, 0.0, 0.0));
        assert!(gains.iter().all(|&g| g > 0.0));
    }

    #[test]
    fn corner_position_is_power_normalised() {
        let layout = Layout::layout_0_5_0();
        let panner = AllocentricPanner::new(&layout);
        let gains = panner.pan(CartesianPosition::new(1.0, 1.0, 0.0));
        let power: f64 = gains.iter().map(|g| g * g).sum();
        assert!((power - 1.0).abs() < 1e-9);
    }
}
