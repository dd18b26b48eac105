//! `audioBlockFormat` variants: the time-bounded metadata atoms that the
//! four type renderers consume.

use crate::position::Position;
use serde::{Deserialize, Serialize};

/// ADM time value in seconds, independent of any particular sample rate.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct AdmTime(pub f64);

impl AdmTime {
    pub const ZERO: Self = Self(0.0);

    pub fn seconds(self) -> f64 {
        self.0
    }
}

impl std::ops::Add for AdmTime {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

/// Normalization convention for HOA channel formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Normalization {
    Sn3d,
    N3d,
    FuMa,
}

/// A zone exclusion region, either a Cartesian box or a polar sector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ZoneExclusion {
    Cartesian {
        min_x: f64,
        max_x: f64,
        min_y: f64,
        max_y: f64,
        min_z: f64,
        max_z: f64,
    },
    Polar {
        min_elevation: f64,
        max_elevation: f64,
        min_azimuth: f64,
        max_azimuth: f64,
    },
}

/// Channel-lock behaviour: snap to the nearest loudspeaker within
/// `max_distance` (Euclidean, unit-vector space).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelLock {
    pub max_distance: f64,
}

/// Object divergence: replace the point source with a three-point spread.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Divergence {
    /// `d` in `[0, 1]`: fraction of energy sent to the +/- azimuth images
    pub value: f64,
    /// `divergenceAzimuthRange` (polar) or spread along X (Cartesian)
    pub azimuth_range: f64,
}

/// `audioBlockFormat` for the Objects type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectsBlock {
    pub rtime: AdmTime,
    pub duration: AdmTime,
    pub position: Position,
    pub width: f64,
    pub height: f64,
    pub depth: f64,
    pub diffuse: f64,
    pub divergence: Option<Divergence>,
    pub channel_lock: Option<ChannelLock>,
    pub zone_exclusion: Vec<ZoneExclusion>,
    pub jump_position: bool,
    pub interpolation_length: AdmTime,
    pub screen_ref: bool,
    pub importance: Option<u8>,
    pub gain: f64,
    pub head_locked: bool,
}

impl Default for ObjectsBlock {
    fn default() -> Self {
        Self {
            rtime: AdmTime::ZERO,
            duration: AdmTime::ZERO,
            position: Position::Polar(crate::position::PolarPosition::new(0.0, 0.0, 1.0)),
            width: 0.0,
            height: 0.0,
            depth: 0.0,
            diffuse: 0.0,
            divergence: None,
            channel_lock: None,
            zone_exclusion: Vec::new(),
            jump_position: false,
            interpolation_length: AdmTime::ZERO,
            screen_ref: false,
            importance: None,
            gain: 1.0,
            head_locked: false,
        }
    }
}

/// Bounded polar position allowed for a DirectSpeakers block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionBounds {
    pub min_azimuth: f64,
    pub max_azimuth: f64,
    pub min_elevation: f64,
    pub max_elevation: f64,
}

/// `audioBlockFormat` for the DirectSpeakers type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectSpeakersBlock {
    pub rtime: AdmTime,
    pub duration: AdmTime,
    pub speaker_labels: Vec<String>,
    pub position: Position,
    pub position_bounds: Option<PositionBounds>,
    pub is_lfe: bool,
    pub gain: f64,
}

impl Default for DirectSpeakersBlock {
    fn default() -> Self {
        Self {
            rtime: AdmTime::ZERO,
            duration: AdmTime::ZERO,
            speaker_labels: Vec::new(),
            position: Position::Polar(crate::position::PolarPosition::new(0.0, 0.0, 1.0)),
            position_bounds: None,
            is_lfe: false,
            gain: 1.0,
        }
    }
}

/// `audioBlockFormat` for the HOA type (one per input channel / ACN index).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoaBlock {
    pub rtime: AdmTime,
    pub duration: AdmTime,
    pub order: u32,
    pub degree: i32,
    pub normalization: Normalization,
    pub nfc_ref_dist: f64,
    pub screen_ref: bool,
}

/// A single coefficient row in a Matrix block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatrixCoefficient {
    pub input_channel_index: usize,
    pub gain: f64,
    pub delay_samples: f64,
    pub phase_flip: bool,
}

/// `audioBlockFormat` for the Matrix type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixBlock {
    pub rtime: AdmTime,
    pub duration: AdmTime,
    pub coefficients: Vec<MatrixCoefficient>,
}

/// Closed set of block variants. New variants would break every
/// pattern-matched consumer at compile time, which is the intent: the ADM
/// type set is fixed by the standard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BlockFormat {
    Objects(ObjectsBlock),
    DirectSpeakers(DirectSpeakersBlock),
    Hoa(HoaBlock),
    Matrix(MatrixBlock),
}

impl BlockFormat {
    pub fn rtime(&self) -> AdmTime {
        match self {
            BlockFormat::Objects(b) => b.rtime,
            BlockFormat::DirectSpeakers(b) => b.rtime,
            BlockFormat::Hoa(b) => b.rtime,
            BlockFormat::Matrix(b) => b.rtime,
        }
    }

    pub fn duration(&self) -> AdmTime {
        match self {
            BlockFormat::Objects(b) => b.duration,
            BlockFormat::DirectSpeakers(b) => b.duration,
            BlockFormat::Hoa(b) => b.duration,
            BlockFormat::Matrix(b) => b.duration,
        }
    }

    pub fn end_time(&self) -> AdmTime {
        self.rtime() + self.duration()
    }
}
