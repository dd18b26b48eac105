//! Point-source panner: a precomputed Delaunay-style triangulation of the
//! real loudspeaker unit vectors, augmented with virtual speakers that
//! close the sphere, per spec §4.3 step 5 (polar path).

use crate::geometry::{angular_distance, convex_hull_triangles, normalize_power, triangle_gains, Triangle, Vec3};
use adm_model::Layout;

/// A triangulated mesh over one reproduction layout's real loudspeakers,
/// plus virtual vertices that close gaps (directly overhead / directly
/// below) where no real loudspeaker exists.
pub struct PointSourcePanner {
    vertices: Vec<Vec3>,
    num_real: usize,
    triangles: Vec<Triangle>,
    /// For each virtual vertex (index `num_real + i`), the real speakers
    /// its gain is redistributed to, with weight.
    virtual_downmix: Vec<Vec<(usize, f64)>>,
}

const VIRTUAL_CLOSE_THRESHOLD_RAD: f64 = 0.6; // ~34 degrees

impl PointSourcePanner {
    pub fn new(layout: &Layout) -> Self {
        let real: Vec<Vec3> = layout
            .without_lfe()
            .iter()
            .map(|c| {
                let p = c.real_position.to_cartesian();
                Vec3::new(p.x, p.y, p.z).normalize()
            })
            .collect();
        let num_real = real.len();

        let mut vertices = real.clone();
        let mut virtual_downmix = Vec::new();

        for pole in [Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 0.0, -1.0)] {
            let nearest = real
                .iter()
                .map(|r| angular_distance(*r, pole))
                .fold(f64::MAX, f64::min);
            if nearest > VIRTUAL_CLOSE_THRESHOLD_RAD {
                vertices.push(pole);
                virtual_downmix.push(nearest_real_speakers(&real, pole, 3));
            }
        }

        let triangles = convex_hull_triangles(&vertices);

        Self {
            vertices,
            num_real,
            triangles,
            virtual_downmix,
        }
    }

    pub fn num_real_speakers(&self) -> usize {
        self.num_real
    }

    /// Pan a unit direction to a gain vector over the layout's real
    /// (non-LFE) speakers, in `layout.without_lfe()` order.
    pub fn pan(&self, direction: Vec3) -> Vec<f64> {
        let dir = direction.normalize();
        let mut full = vec![0.0_f64; self.vertices.len()];

        if let Some((triangle, gains)) = self.find_containing_triangle(dir) {
            for (idx, g) in triangle.indices.iter().zip(gains.iter()) {
                full[*idx] = *g;
            }
        } else {
            // Sphere should be closed by construction; fall back to the
            // single nearest vertex rather than producing silence.
            let nearest = self
                .vertices
                .iter()
                .enumerate()
                .min_by(|a, b| {
                    angular_distance(*a.1, dir)
                        .partial_cmp(&angular_distance(*b.1, dir))
                        .unwrap()
                })
                .map(|(i, _)| i)
                .unwrap_or(0);
            full[nearest] = 1.0;
        }

        let mut real_gains = full[..self.num_real].to_vec();
        for (v_idx, downmix) in self.virtual_downmix.iter().enumerate() {
            let g = full[self.num_real + v_idx];
            if g == 0.0 {
                continue;
            }
            for &(real_idx, weight) in downmix {
                real_gains[real_idx] += g * weight;
            }
        }

        normalize_power(&mut real_gains);
        real_gains
    }

    fn find_containing_triangle(&self, dir: Vec3) -> Option<(&Triangle, [f64; 3])> {
        self.triangles
            .iter()
            .find_map(|t| triangle_gains(t, dir).map(|g| (t, g)))
    }

    /// Pan a direction while excluding a subset of real speakers from the
    /// candidate mesh (spec §4.3 step 7, zone exclusion). Triangles that
    /// reference an excluded real vertex are skipped; virtual-speaker
    /// downmix weight bound for an excluded real speaker is dropped and
    /// renormalised across whatever targets remain.
    pub fn pan_excluding(&self, direction: Vec3, excluded_real: &[bool]) -> Vec<f64> {
        let dir = direction.normalize();
        let is_excluded = |idx: usize| idx < self.num_real && excluded_real[idx];

        let found = self.triangles.iter().find_map(|t| {
            if t.indices.iter().any(|&i| is_excluded(i)) {
                None
            } else {
                triangle_gains(t, dir).map(|g| (t, g))
            }
        });

        let mut full = vec![0.0_f64; self.vertices.len()];
        if let Some((triangle, gains)) = found {
            for (idx, g) in triangle.indices.iter().zip(gains.iter()) {
                full[*idx] = *g;
            }
        } else {
            let nearest = self
                .vertices
                .iter()
                .enumerate()
                .filter(|(i, _)| !is_excluded(*i))
                .min_by(|a, b| {
                    angular_distance(*a.1, dir)
                        .partial_cmp(&angular_distance(*b.1, dir))
                        .unwrap()
                })
                .map(|(i, _)| i);
            if let Some(nearest) = nearest {
                full[nearest] = 1.0;
            }
        }

        let mut real_gains = full[..self.num_real].to_vec();
        for (v_idx, downmix) in self.virtual_downmix.iter().enumerate() {
            let g = full[self.num_real + v_idx];
            if g == 0.0 {
                continue;
            }
            let remaining: Vec<(usize, f64)> = downmix
                .iter()
                .filter(|(i, _)| !excluded_real[*i])
                .copied()
                .collect();
            if remaining.is_empty() {
                continue;
            }
            let weight = 1.0 / remaining.len() as f64;
            for (real_idx, _) in remaining {
                real_gains[real_idx] += g * weight;
            }
        }

        for (idx, excluded) in excluded_real.iter().enumerate() {
            if *excluded {
                real_gains[idx] = 0.0;
            }
        }

        normalize_power(&mut real_gains);
        real_gains
    }
}

fn nearest_real_speakers(real: &[Vec3], target: Vec3, k: usize) -> Vec<(usize, f64)> {
    let mut dists: Vec<(usize, f64)> = real
        .iter()
        .enumerate()
        .map(|(i, r)| (i, angular_distance(*r, target)))
        .collect();
    dists.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
    dists.truncate(k.min(dists.len()));
    let weight = 1.0 / dists.len() as f64;
    dists.into_iter().map(|(i, _)| (i, weight)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn power_preserved_for_sampled_directions() {
        let layout = Layout::layout_0_5_0();
        let panner = PointSourcePanner::new(&layout);
        for az in (-180..180).step_by(10) {
            let dir = adm_model::PolarPosition::new(az as f64, 0.0, 1.0)
                .to_cartesian();
            let gains = panner.pan(Vec3::new(dir.x, dir.y, dir.z));
            let power: f64 = gains.iter().map(|g| g * g).sum();
            assert_relative_eq!(power, 1.0, epsilon = 1e-8);
        }
    }

    #[test]
    fn gains_are_non_negative() {
        let layout = Layout::layout_9_10_3();
        let panner = PointSourcePanner::new(&layout);
        for el in [-30, 0, 30, 60, 90] {
            for az in (-180..180).step_by(15) {
                let dir = adm_model::PolarPosition::new(az as f64, el as f64, 1.0).to_cartesian();
                let gains = panner.pan(Vec3::new(dir.x, dir.y, dir.z));
                for g in gains {
                    assert!(g >= -1e-9);
                }
            }
        }
    }

    #[test]
    fn excluded_speaker_receives_no_gain() {
        let layout = Layout::layout_0_5_0();
        let panner = PointSourcePanner::new(&layout);
        let m030_idx = layout.without_lfe().iter().position(|c| c.name == "M+030").unwrap();
        let mut excluded = vec![false; layout.without_lfe().len()];
        excluded[m030_idx] = true;
        let m030 = adm_model::PolarPosition::new(30.0, 0.0, 1.0).to_cartesian();
        let gains = panner.pan_excluding(Vec3::new(m030.x, m030.y, m030.z), &excluded);
        assert!(gains[m030_idx].abs() < 1e-9);
    }

    #[test]
    fn on_axis_direction_favours_nearest_speaker() {
        let layout = Layout::layout_0_5_0();
        let panner = PointSourcePanner::new(&layout);
        let m030 = adm_model::PolarPosition::new(30.0, 0.0, 1.0).to_cartesian();
        let gains = panner.pan(Vec3::new(m030.x, m030.y, m030.z));
        let (max_idx, _) = gains
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap();
        assert_eq!(layout.without_lfe()[max_idx].name, "M+030");
    }
}
