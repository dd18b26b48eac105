//! BS.2051 reproduction layouts.

use crate::position::PolarPosition;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("unknown channel name: {0}")]
    UnknownChannel(String),

    #[error("duplicate channel name: {0}")]
    DuplicateChannel(String),

    #[error(
        "speaker {name} real position az={az:.1} el={el:.1} outside BS.2051 tolerance of nominal az={nominal_az:.1} el={nominal_el:.1}"
    )]
    PositionOutOfTolerance {
        name: String,
        az: f64,
        el: f64,
        nominal_az: f64,
        nominal_el: f64,
    },
}

/// A single output channel of a reproduction layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutChannel {
    pub name: String,
    pub nominal_position: PolarPosition,
    pub real_position: PolarPosition,
    pub is_lfe: bool,
    /// Linear gain applied after rendering (e.g. real-world trim)
    pub gain: f64,
    /// BS.2051 tolerance box: (az_min, az_max, el_min, el_max) in degrees
    pub az_el_tolerance: (f64, f64, f64, f64),
}

impl LayoutChannel {
    pub fn new(name: &str, nominal: PolarPosition) -> Self {
        Self {
            name: name.to_string(),
            nominal_position: nominal,
            real_position: nominal,
            is_lfe: false,
            gain: 1.0,
            az_el_tolerance: (5.0, 5.0, 5.0, 5.0),
        }
    }

    pub fn new_lfe(name: &str) -> Self {
        Self {
            name: name.to_string(),
            nominal_position: PolarPosition::new(0.0, 0.0, 1.0),
            real_position: PolarPosition::new(0.0, 0.0, 1.0),
            is_lfe: true,
            gain: 1.0,
            az_el_tolerance: (180.0, 180.0, 90.0, 90.0),
        }
    }
}

/// An ordered BS.2051 reproduction layout, e.g. `0+5+0` or `4+9+0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layout {
    pub name: String,
    pub channels: Vec<LayoutChannel>,
}

impl Layout {
    pub fn new(name: &str, channels: Vec<LayoutChannel>) -> Self {
        Self {
            name: name.to_string(),
            channels,
        }
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn without_lfe(&self) -> Vec<&LayoutChannel> {
        self.channels.iter().filter(|c| !c.is_lfe).collect()
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn nominal_positions(&self) -> Vec<PolarPosition> {
        self.channels.iter().map(|c| c.nominal_position).collect()
    }

    pub fn real_positions(&self) -> Vec<PolarPosition> {
        self.channels.iter().map(|c| c.real_position).collect()
    }

    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.channels.iter().position(|c| c.name == name)
    }

    /// Verify each channel's real position lies within its BS.2051
    /// tolerance box around the nominal position, and that names are
    /// unique.
    pub fn check_positions(&self) -> Result<(), LayoutError> {
        let mut seen = std::collections::HashSet::new();
        for ch in &self.channels {
            if !seen.insert(ch.name.as_str()) {
                return Err(LayoutError::DuplicateChannel(ch.name.clone()));
            }
            let (az_lo, az_hi, el_lo, el_hi) = ch.az_el_tolerance;
            let d_az = angular_diff(ch.real_position.azimuth, ch.nominal_position.azimuth);
            let d_el = ch.real_position.elevation - ch.nominal_position.elevation;
            if d_az.abs() > az_lo.max(az_hi) || d_el.abs() > el_lo.max(el_hi) {
                return Err(LayoutError::PositionOutOfTolerance {
                    name: ch.name.clone(),
                    az: ch.real_position.azimuth,
                    el: ch.real_position.elevation,
                    nominal_az: ch.nominal_position.azimuth,
                    nominal_el: ch.nominal_position.elevation,
                });
            }
        }
        Ok(())
    }

    /// 0+5+0: ITU-R BS.775 5.1
    pub fn layout_0_5_0() -> Self {
        Self::new(
            "0+5+0",
            vec![
                LayoutChannel::new("M+030", PolarPosition::new(30.0, 0.0, 1.0)),
                LayoutChannel::new("M-030", PolarPosition::new(-30.0, 0.0, 1.0)),
                LayoutChannel::new("M+000", PolarPosition::new(0.0, 0.0, 1.0)),
                LayoutChannel::new_lfe("LFE1"),
                LayoutChannel::new("M+110", PolarPosition::new(110.0, 0.0, 1.0)),
                LayoutChannel::new("M-110", PolarPosition::new(-110.0, 0.0, 1.0)),
            ],
        )
    }

    /// 4+5+0: 5.1 plus four height speakers
    pub fn layout_4_5_0() -> Self {
        let mut channels = Self::layout_0_5_0().channels;
        channels.extend([
            LayoutChannel::new("U+030", PolarPosition::new(30.0, 30.0, 1.0)),
            LayoutChannel::new("U-030", PolarPosition::new(-30.0, 30.0, 1.0)),
            LayoutChannel::new("U+110", PolarPosition::new(110.0, 30.0, 1.0)),
            LayoutChannel::new("U-110", PolarPosition::new(-110.0, 30.0, 1.0)),
        ]);
        Self::new("4+5+0", channels)
    }

    /// 9+10+3: 22.2-derived theatrical layout
    pub fn layout_9_10_3() -> Self {
        let mut channels = vec![
            LayoutChannel::new("M+060", PolarPosition::new(60.0, 0.0, 1.0)),
            LayoutChannel::new("M-060", PolarPosition::new(-60.0, 0.0, 1.0)),
            LayoutChannel::new("M+030", PolarPosition::new(30.0, 0.0, 1.0)),
            LayoutChannel::new("M-030", PolarPosition::new(-30.0, 0.0, 1.0)),
            LayoutChannel::new("M+000", PolarPosition::new(0.0, 0.0, 1.0)),
            LayoutChannel::new_lfe("LFE1"),
            LayoutChannel::new("M+135", PolarPosition::new(135.0, 0.0, 1.0)),
            LayoutChannel::new("M-135", PolarPosition::new(-135.0, 0.0, 1.0)),
            LayoutChannel::new("M+090", PolarPosition::new(90.0, 0.0, 1.0)),
            LayoutChannel::new("M-090", PolarPosition::new(-90.0, 0.0, 1.0)),
        ];
        channels.extend([
            LayoutChannel::new("U+045", PolarPosition::new(45.0, 30.0, 1.0)),
            LayoutChannel::new("U-045", PolarPosition::new(-45.0, 30.0, 1.0)),
            LayoutChannel::new("U+000", PolarPosition::new(0.0, 30.0, 1.0)),
            LayoutChannel::new("U+135", PolarPosition::new(135.0, 30.0, 1.0)),
            LayoutChannel::new("U-135", PolarPosition::new(-135.0, 30.0, 1.0)),
            LayoutChannel::new("U+090", PolarPosition::new(90.0, 30.0, 1.0)),
            LayoutChannel::new("U-090", PolarPosition::new(-90.0, 30.0, 1.0)),
            LayoutChannel::new("UH+180", PolarPosition::new(180.0, 30.0, 1.0)),
            LayoutChannel::new("T+000", PolarPosition::new(0.0, 90.0, 1.0)),
            LayoutChannel::new("B+000", PolarPosition::new(0.0, -30.0, 1.0)),
            LayoutChannel::new("B+045", PolarPosition::new(45.0, -30.0, 1.0)),
            LayoutChannel::new("B-045", PolarPosition::new(-45.0, -30.0, 1.0)),
            LayoutChannel::new_lfe("LFE2"),
        ]);
        Self::new("9+10+3", channels)
    }

    /// Resolve a layout by its BS.2051 name
    pub fn by_name(name: &str) -> Result<Self, LayoutError> {
        match name {
            "0+5+0" => Ok(Self::layout_0_5_0()),
            "4+5+0" => Ok(Self::layout_4_5_0()),
            "9+10+3" => Ok(Self::layout_9_10_3()),
            other => Err(LayoutError::UnknownChannel(other.to_string())),
        }
    }
}

fn angular_diff(a: f64, b: f64) -> f64 {
    let mut d = a - b;
    while d > 180.0 {
        d -= 360.0;
    }
    while d < -180.0 {
        d += 360.0;
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_five_zero_has_six_channels_with_lfe() {
        let l = Layout::layout_0_5_0();
        assert_eq!(l.num_channels(), 6);
        assert_eq!(l.without_lfe().len(), 5);
    }

    #[test]
    fn check_positions_passes_for_nominal_real() {
        let l = Layout::layout_0_5_0();
        assert!(l.check_positions().is_ok());
    }

    #[test]
    fn check_positions_rejects_out_of_tolerance() {
        let mut l = Layout::layout_0_5_0();
        l.channels[0].real_position.azimuth = 80.0;
        assert!(l.check_positions().is_err());
    }

    #[test]
    fn duplicate_channel_name_is_rejected() {
        let mut l = Layout::layout_0_5_0();
        let dup = l.channels[0].clone();
        l.channels.push(dup);
        assert!(matches!(
            l.check_positions(),
            Err(LayoutError::DuplicateChannel(_))
        ));
    }
}
