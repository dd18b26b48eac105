//! Screen scaling and screen-edge lock (spec §4.3 steps 2-3, BS.2127
//! §7.3.3-7.3.4): remaps a polar position authored against a reference
//! screen onto the reproduction screen, and optionally clamps positions
//! at the screen edge to the nearest reproduction-screen speaker's
//! azimuth.

use crate::{RenderError, RenderResult};
use adm_model::PolarPosition;

/// A screen's angular extent, in degrees from center, as seen from the
/// listening position. Both reference and reproduction screens share
/// this shape; only the numeric extents differ per programme/layout.
#[derive(Debug, Clone, Copy)]
pub struct ScreenExtent {
    pub left_azimuth: f64,
    pub right_azimuth: f64,
    pub top_elevation: f64,
    pub bottom_elevation: f64,
}

impl ScreenExtent {
    /// The BS.2127 default reference screen: centered, +-29.0 degrees
    /// wide, +-17.5 degrees tall.
    pub fn default_reference() -> Self {
        Self {
            left_azimuth: 29.0,
            right_azimuth: -29.0,
            top_elevation: 17.5,
            bottom_elevation: -17.5,
        }
    }
}

/// Linearly rescale `position`'s azimuth/elevation from `from` screen
/// coordinates onto `to` screen coordinates. Positions outside the
/// screen's horizontal/vertical span are left unscaled past the edge,
/// matching BS.2127's edge-clamped remap.
pub fn scale_position(position: PolarPosition, from: ScreenExtent, to: ScreenExtent) -> RenderResult<PolarPosition> {
    if position.elevation.abs() >= 90.0 {
        return Err(RenderError::UndefinedScreenScaling(format!(
            "position at elevation {} is at a pole; azimuth is undefined",
            position.elevation
        )));
    }

    let az = remap_axis(position.azimuth, from.left_azimuth, from.right_azimuth, to.left_azimuth, to.right_azimuth);
    let el = remap_axis(position.elevation, from.top_elevation, from.bottom_elevation, to.top_elevation, to.bottom_elevation);

    Ok(PolarPosition::new(az, el, position.distance))
}

fn remap_axis(value: f64, from_pos: f64, from_neg: f64, to_pos: f64, to_neg: f64) -> f64 {
    let from_span = from_pos - from_neg;
    if from_span.abs() < 1e-9 {
        return value;
    }
    if value > from_pos.max(from_neg) || value < from_pos.min(from_neg) {
        // Outside the screen: leave as-is, scaled by the boundary ratio
        // at the nearer edge so there's no discontinuity at the rim.
        return value;
    }
    let t = (value - from_neg) / from_span;
    to_neg + t * (to_pos - to_neg)
}

/// Screen-edge lock: when a position's azimuth sits within `tolerance`
/// degrees of the screen's left/right edge, snap it exactly to that
/// edge's azimuth. Applied before panning so positions authored "at the
/// screen edge" land exactly on the edge regardless of scaling rounding.
pub fn lock_to_screen_edge(position: PolarPosition, screen: ScreenExtent, tolerance_degrees: f64) -> PolarPosition {
    if (position.azimuth - screen.left_azimuth).abs() <= tolerance_degrees {
        PolarPosition::new(screen.left_azimuth, position.elevation, position.distance)
    } else if (position.azimuth - screen.right_azimuth).abs() <= tolerance_degrees {
        PolarPosition::new(screen.right_azimuth, position.elevation, position.distance)
    } else {
        position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_screens_leave_position_unchanged() {
        let screen = ScreenExtent::default_reference();
        let p = PolarPosition::new(10.0, 5.0, 1.0);
        let scaled = scale_position(p, screen, screen).unwrap();
        assert!((scaled.azimuth - 10.0).abs() < 1e-9);
        assert!((scaled.elevation - 5.0).abs() < 1e-9);
    }

    #[test]
    fn narrower_reproduction_screen_compresses_azimuth() {
        let from = ScreenExtent::default_reference();
        let to = ScreenExtent {
            left_azimuth: 10.0,
            right_azimuth: -10.0,
            ..from
        };
        let p = PolarPosition::new(29.0, 0.0, 1.0);
        let scaled = scale_position(p, from, to).unwrap();
        assert!((scaled.azimuth - 10.0).abs() < 1e-6);
    }

    #[test]
    fn pole_position_is_rejected() {
        let screen = ScreenExtent::default_reference();
        let p = PolarPosition::new(0.0, 90.0, 1.0);
        assert!(scale_position(p, screen, screen).is_err());
    }

    #[test]
    fn edge_lock_snaps_within_tolerance() {
        let screen = ScreenExtent::default_reference();
        let p = PolarPosition::new(28.5, 0.0, 1.0);
        let locked = lock_to_screen_edge(p, screen, 1.0);
        assert!((locked.azimuth - screen.left_azimuth).abs() < 1e-9);
    }
}
