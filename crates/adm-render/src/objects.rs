//! Objects type renderer (spec §4.3): position processing, screen
//! scaling, divergence, panning (point-source or allocentric), extent
//! spreading, zone exclusion, channel lock and diffuse split, in the
//! order BS.2127 §7 specifies.

use crate::error::RenderResult;
use crate::gain_matrix::GainEvent;
use crate::geometry::{angular_distance, Vec3};
use crate::panner::{lock_to_screen_edge, pan_extent, AllocentricPanner, ExtentParams, PointSourcePanner, ScreenExtent};
use adm_model::block_format::ObjectsBlock;
use adm_model::{CartesianPosition, Layout, Position};

/// Tolerance for screen-edge lock: absorbs floating-point rounding left by
/// screen scaling at the boundary rather than catching genuinely off-edge
/// positions.
const SCREEN_EDGE_LOCK_TOLERANCE_DEGREES: f64 = 1e-6;

/// Width/height forcing the extent panner to an (approximately) diffuse,
/// power-equalised spread across every real loudspeaker (spec §4.3 step 9).
const DIFFUSE_KERNEL_WIDTH_DEGREES: f64 = 360.0;
const DIFFUSE_KERNEL_HEIGHT_DEGREES: f64 = 180.0;

pub struct ObjectsRenderer {
    point_source: PointSourcePanner,
    allocentric: AllocentricPanner,
    num_real: usize,
    real_directions: Vec<Vec3>,
    reference_screen: ScreenExtent,
    reproduction_screen: ScreenExtent,
}

impl ObjectsRenderer {
    pub fn new(layout: &Layout) -> Self {
        let real_directions = layout
            .without_lfe()
            .iter()
            .map(|c| {
                let p = c.real_position.to_cartesian();
                Vec3::new(p.x, p.y, p.z).normalize()
            })
            .collect();
        Self {
            point_source: PointSourcePanner::new(layout),
            allocentric: AllocentricPanner::new(layout),
            num_real: layout.without_lfe().len(),
            real_directions,
            reference_screen: ScreenExtent::default_reference(),
            reproduction_screen: ScreenExtent::default_reference(),
        }
    }

    pub fn with_reproduction_screen(mut self, screen: ScreenExtent) -> Self {
        self.reproduction_screen = screen;
        self
    }

    /// Render one `ObjectsBlock` to a gain event over its own `[rtime,
    /// rtime+duration)` interval, in `layout.without_lfe()` channel order.
    pub fn render_block(&self, block: &ObjectsBlock) -> RenderResult<GainEvent> {
        let mut gains = self.pan_position(block)?;

        if let Some(lock) = block.channel_lock {
            self.apply_channel_lock(&mut gains, block, lock.max_distance);
        }

        if !block.zone_exclusion.is_empty() {
            gains = self.apply_zone_exclusion(block)?;
            if let Some(lock) = block.channel_lock {
                self.apply_channel_lock(&mut gains, block, lock.max_distance);
            }
        }

        let d = block.diffuse.clamp(0.0, 1.0);
        if d > 0.0 {
            let diffuse_gains = self.diffuse_gains(block);
            let direct_weight = 1.0 - d.sqrt();
            let diffuse_weight = d.sqrt();
            for (g, g_diffuse) in gains.iter_mut().zip(diffuse_gains.iter()) {
                *g = *g * direct_weight + g_diffuse * diffuse_weight;
            }
        }

        for g in gains.iter_mut() {
            *g *= block.gain;
        }

        Ok(GainEvent::new(block.rtime, block.rtime + block.duration, gains)
            .with_interpolation(block.interpolation_length, block.jump_position))
    }

    fn pan_position(&self, block: &ObjectsBlock) -> RenderResult<Vec<f64>> {
        match block.position {
            Position::Cartesian(c) => Ok(self.pan_cartesian(block, c)),
            Position::Polar(p) => {
                // headLocked bypasses screen scaling and screen-edge lock;
                // the position otherwise panned unchanged.
                let position = if block.head_locked {
                    p
                } else if block.screen_ref {
                    let scaled = crate::panner::scale_position(p, self.reference_screen, self.reproduction_screen)?;
                    lock_to_screen_edge(scaled, self.reproduction_screen, SCREEN_EDGE_LOCK_TOLERANCE_DEGREES)
                } else {
                    p
                };
                Ok(self.pan_polar(block, position))
            }
        }
    }

    /// The diffuse extent-gain part `g_diffuse` for the diffuse split
    /// (spec §4.3 step 9): the same extent panner forced to a near-omni
    /// patch so the diffuse share lands as an equal-power spread across
    /// every real loudspeaker rather than following width/height/depth.
    fn diffuse_gains(&self, block: &ObjectsBlock) -> Vec<f64> {
        let position = match block.position {
            Position::Polar(p) => p,
            Position::Cartesian(c) => c.to_polar(),
        };
        let kernel = ExtentParams::from_degrees(DIFFUSE_KERNEL_WIDTH_DEGREES, DIFFUSE_KERNEL_HEIGHT_DEGREES, 0.0);
        pan_extent(&self.point_source, position, &kernel)
    }

    fn pan_polar(&self, block: &ObjectsBlock, position: adm_model::PolarPosition) -> Vec<f64> {
        if let Some(div) = block.divergence {
            return self.pan_with_divergence(block, position, div);
        }
        let extent = ExtentParams::from_degrees(block.width, block.height, block.depth);
        pan_extent(&self.point_source, position, &extent)
    }

    fn pan_with_divergence(&self, block: &ObjectsBlock, position: adm_model::PolarPosition, div: adm_model::block_format::Divergence) -> Vec<f64> {
        // BS.2127 §7.3.2: split into three virtual sources at `azimuth`,
        // `azimuth + range`, `azimuth - range`, weighted by divergence
        // value, then sum their panned gains.
        let d = div.value.clamp(0.0, 1.0);
        let center_weight = 1.0 - d;
        let side_weight = d / 2.0;
        let extent = ExtentParams::from_degrees(block.width, block.height, block.depth);

        let mut total = vec![0.0_f64; self.num_real];
        for (azimuth_offset, weight) in [(0.0, center_weight), (div.azimuth_range, side_weight), (-div.azimuth_range, side_weight)] {
            if weight <= 0.0 {
                continue;
            }
            let p = adm_model::PolarPosition::new(position.azimuth + azimuth_offset, position.elevation, position.distance);
            let gains = pan_extent(&self.point_source, p, &extent);
            for (t, g) in total.iter_mut().zip(gains.iter()) {
                *t += weight * g * g;
            }
        }
        for t in total.iter_mut() {
            *t = t.sqrt();
        }
        crate::geometry::normalize_power(&mut total);
        total
    }

    fn pan_cartesian(&self, block: &ObjectsBlock, position: CartesianPosition) -> Vec<f64> {
        let _ = block;
        self.allocentric.pan(position)
    }

    /// Snap to the nearest real speaker within `max_distance` of the
    /// object's direction, replacing the panned distribution with a
    /// one-hot gain at that speaker (spec §4.3 step 8).
    fn apply_channel_lock(&self, gains: &mut [f64], block: &ObjectsBlock, max_distance: f64) {
        let direction = match block.position {
            Position::Polar(p) => {
                let c = p.to_cartesian();
                Vec3::new(c.x, c.y, c.z).normalize()
            }
            Position::Cartesian(c) => Vec3::new(c.x, c.y, c.z).normalize(),
        };

        let mut best: Option<(usize, f64)> = None;
        for (idx, dir) in self.real_directions.iter().enumerate() {
            let dist = angular_distance(direction, *dir);
            if dist > max_distance {
                continue;
            }
            // Ties prefer the lower nominal channel index, which falls
            // out of scanning in index order and only replacing on a
            // strictly smaller distance.
            if best.map_or(true, |(_, best_dist)| dist < best_dist) {
                best = Some((idx, dist));
            }
        }

        if let Some((idx, _)) = best {
            for g in gains.iter_mut() {
                *g = 0.0;
            }
            gains[idx] = 1.0;
        }
    }

    fn apply_zone_exclusion(&self, block: &ObjectsBlock) -> RenderResult<Vec<f64>> {
        let mut excluded = vec![false; self.num_real];
        for (idx, dir) in self.real_directions.iter().enumerate() {
            let polar = CartesianPosition::new(dir.x, dir.y, dir.z).to_polar();
            for zone in &block.zone_exclusion {
                if zone_contains(zone, *dir, polar) {
                    excluded[idx] = true;
                }
            }
        }

        if excluded.iter().all(|&e| e) {
            return Err(crate::error::RenderError::AllSpeakersExcluded);
        }

        let direction = match block.position {
            Position::Polar(p) => {
                let c = p.to_cartesian();
                Vec3::new(c.x, c.y, c.z)
            }
            Position::Cartesian(c) => Vec3::new(c.x, c.y, c.z),
        };
        Ok(self.point_source.pan_excluding(direction, &excluded))
    }
}

fn zone_contains(zone: &adm_model::block_format::ZoneExclusion, direction: Vec3, polar: adm_model::PolarPosition) -> bool {
    use adm_model::block_format::ZoneExclusion;
    match zone {
        ZoneExclusion::Cartesian {
            min_x,
            max_x,
            min_y,
            max_y,
            min_z,
            max_z,
        } => direction.x >= *min_x && direction.x <= *max_x && direction.y >= *min_y && direction.y <= *max_y && direction.z >= *min_z && direction.z <= *max_z,
        ZoneExclusion::Polar {
            min_elevation,
            max_elevation,
            min_azimuth,
            max_azimuth,
        } => polar.elevation >= *min_elevation && polar.elevation <= *max_elevation && polar.azimuth >= *min_azimuth && polar.azimuth <= *max_azimuth,
    }
}
