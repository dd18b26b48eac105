//! Width/height/depth extent spreading (spec §4.3 step 6, BS.2127
//! §7.3.6): convolves the point-source panner's result over a patch of
//! directions around the object's position, sized from its width/height/
//! depth parameters, using the fixed spherical point set as quadrature.

use crate::panner::point_source::PointSourcePanner;
use crate::t_design::SphericalPointSet;
use adm_model::PolarPosition;

/// Half-angles (radians) of the patch swept on each axis, derived from
/// an ObjectsBlock's width/height/depth (degrees, depth 0..1).
pub struct ExtentParams {
    pub half_width_rad: f64,
    pub half_height_rad: f64,
    pub depth: f64,
}

impl ExtentParams {
    pub fn from_degrees(width: f64, height: f64, depth: f64) -> Self {
        Self {
            half_width_rad: (width.max(0.0) / 2.0).to_radians(),
            half_height_rad: (height.max(0.0) / 2.0).to_radians(),
            depth: depth.clamp(0.0, 1.0),
        }
    }

    fn is_point(&self) -> bool {
        self.half_width_rad < 1e-6 && self.half_height_rad < 1e-6
    }
}

/// Spread `center`'s point-source gains over a patch sized by `extent`.
/// Falls back to a plain point-source pan when width and height are
/// both zero. Depth widens the patch radius further without changing
/// its angular shape, approximating the reference's front-back spread.
pub fn pan_extent(panner: &PointSourcePanner, center: PolarPosition, extent: &ExtentParams) -> Vec<f64> {
    let center_dir = {
        let c = center.to_cartesian();
        crate::geometry::Vec3::new(c.x, c.y, c.z).normalize()
    };

    if extent.is_point() {
        return panner.pan(center_dir);
    }

    // Depth pushes the effective patch radius outward; BS.2127 folds depth
    // into an additional radius term rather than a separate axis.
    let radius = (extent.half_width_rad.max(extent.half_height_rad)) * (1.0 + extent.depth);

    let points = &SphericalPointSet::reference().points;
    let num_real = panner.num_real_speakers();
    let mut accum = vec![0.0_f64; num_real];
    let mut weight_sum = 0.0_f64;

    for p in points.iter() {
        let angle = crate::geometry::angular_distance(center_dir, *p);
        if angle > radius {
            continue;
        }
        // Raised-cosine falloff to zero at the patch edge.
        let weight = 0.5 * (1.0 + (std::f64::consts::PI * angle / radius.max(1e-9)).cos());
        if weight <= 0.0 {
            continue;
        }
        let gains = panner.pan(*p);
        for (a, g) in accum.iter_mut().zip(gains.iter()) {
            *a += weight * g;
        }
        weight_sum += weight;
    }

    if weight_sum < 1e-12 {
        return panner.pan(center_dir);
    }
    for a in accum.iter_mut() {
        *a /= weight_sum.sqrt();
    }
    crate::geometry::normalize_power(&mut accum);
    accum
}
