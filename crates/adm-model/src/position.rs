//! Position types shared by the ADM graph and the panning geometry.
//!
//! Two interchangeable representations, matching BS.2127 §10: polar
//! (azimuth counter-clockwise in degrees, elevation in degrees, radius in
//! metres) and Cartesian (X right, Y front, Z up). Position conversion is
//! invertible; extent conversion (handled by the panner, not here) is not.

use serde::{Deserialize, Serialize};

/// Polar position: azimuth (ccw degrees, 0 = front), elevation (degrees,
/// positive = up), distance (metres, 1.0 = reference radius).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolarPosition {
    pub azimuth: f64,
    pub elevation: f64,
    pub distance: f64,
}

impl PolarPosition {
    pub fn new(azimuth: f64, elevation: f64, distance: f64) -> Self {
        Self {
            azimuth,
            elevation,
            distance,
        }
    }

    /// Unit Cartesian direction vector, ignoring distance
    pub fn direction(self) -> [f64; 3] {
        let az = self.azimuth.to_radians();
        let el = self.elevation.to_radians();
        let cos_el = el.cos();
        [-az.sin() * cos_el, az.cos() * cos_el, el.sin()]
    }

    pub fn to_cartesian(self) -> CartesianPosition {
        let [x, y, z] = self.direction();
        CartesianPosition::new(x * self.distance, y * self.distance, z * self.distance)
    }
}

/// Cartesian position. BS.2076 convention: loudspeakers lie inside/on the
/// unit cube `[-1, 1]^3` for Cartesian rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CartesianPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl CartesianPosition {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn magnitude(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn normalized(self) -> Self {
        let m = self.magnitude();
        if m < 1e-12 {
            Self::new(0.0, 1.0, 0.0)
        } else {
            Self::new(self.x / m, self.y / m, self.z / m)
        }
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn to_polar(self) -> PolarPosition {
        let distance = self.magnitude();
        if distance < 1e-10 {
            return PolarPosition::new(0.0, 0.0, 0.0);
        }
        let azimuth = (-self.x).atan2(self.y).to_degrees();
        let elevation = (self.z / distance).clamp(-1.0, 1.0).asin().to_degrees();
        PolarPosition::new(azimuth, elevation, distance)
    }
}

/// A position in either coordinate mode. The Objects renderer's first
/// pipeline stage decides whether to keep the mode or convert it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Position {
    Polar(PolarPosition),
    Cartesian(CartesianPosition),
}

impl Position {
    pub fn as_polar(self) -> PolarPosition {
        match self {
            Position::Polar(p) => p,
            Position::Cartesian(c) => c.to_polar(),
        }
    }

    pub fn as_cartesian(self) -> CartesianPosition {
        match self {
            Position::Polar(p) => p.to_cartesian(),
            Position::Cartesian(c) => c,
        }
    }

    pub fn is_cartesian(self) -> bool {
        matches!(self, Position::Cartesian(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn round_trip_polar_to_cartesian_to_polar() {
        for (az, el) in [(0.0, 0.0), (30.0, 0.0), (-110.0, 0.0), (45.0, 45.0), (135.0, -30.0)] {
            let p = PolarPosition::new(az, el, 1.0);
            let back = p.to_cartesian().to_polar();
            assert_relative_eq!(back.azimuth, az, epsilon = 1e-8);
            assert_relative_eq!(back.elevation, el, epsilon = 1e-8);
            assert_relative_eq!(back.distance, 1.0, epsilon = 1e-8);
        }
    }

    #[test]
    fn front_center_is_positive_y() {
        let p = PolarPosition::new(0.0, 0.0, 1.0).to_cartesian();
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-8);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-8);
        assert_relative_eq!(p.z, 0.0, epsilon = 1e-8);
    }

    #[test]
    fn positive_azimuth_is_left_negative_x() {
        // BS.2076: azimuth is anticlockwise from front, so +90 is hard left.
        let p = PolarPosition::new(90.0, 0.0, 1.0).to_cartesian();
        assert_relative_eq!(p.x, -1.0, epsilon = 1e-8);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-8);
    }
}
