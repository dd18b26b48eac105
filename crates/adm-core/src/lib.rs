//! `adm-core`: shared sample, time and error types used across the
//! rendering pipeline crates.

mod error;
mod sample;
mod time;

pub use error::*;
pub use sample::*;
pub use time::*;

/// Sample rate options the renderer accepts from the BW64 format chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[repr(u32)]
pub enum SampleRate {
    Hz44100 = 44100,
    Hz48000 = 48000,
    Hz88200 = 88200,
    Hz96000 = 96000,
    Hz176400 = 176400,
    Hz192000 = 192000,
}

impl SampleRate {
    #[inline]
    pub fn as_f64(self) -> f64 {
        self as u32 as f64
    }

    #[inline]
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

impl Default for SampleRate {
    fn default() -> Self {
        Self::Hz48000
    }
}

/// Decibel value wrapper, used for `--output-gain-db` and overload reporting
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Decibels(pub f64);

impl Decibels {
    pub const ZERO: Self = Self(0.0);
    pub const NEG_INF: Self = Self(f64::NEG_INFINITY);

    #[inline]
    pub fn from_gain(gain: f64) -> Self {
        if gain <= 0.0 {
            Self::NEG_INF
        } else {
            Self(20.0 * gain.log10())
        }
    }

    #[inline]
    pub fn to_gain(self) -> f64 {
        if self.0 <= -144.0 {
            0.0
        } else {
            10.0_f64.powf(self.0 / 20.0)
        }
    }
}

impl Default for Decibels {
    fn default() -> Self {
        Self::ZERO
    }
}
