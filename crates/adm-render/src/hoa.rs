//! HOA type renderer (spec §4.5): builds a static AllRAD decoder matrix
//! from ACN/normalisation-tagged input channels to the reproduction
//! layout's real speakers, then applies near-field compensation.
//!
//! The decoder is built once per (order, normalization, layout) by
//! panning every point of the fixed spherical point set
//! ([`crate::t_design`]) through the point-source panner and
//! accumulating each point's spherical-harmonic weight into the decoder
//! row for every speaker it contributes gain to (the AllRAD method:
//! Zotter & Frank, "All-Round Ambisonic Panning and Decoding").

use crate::gain_matrix::StaticGainMatrix;
use crate::panner::PointSourcePanner;
use crate::t_design::SphericalPointSet;
use adm_model::block_format::Normalization;
use adm_model::Layout;
use ndarray::Array2;
use rayon::prelude::*;

/// Number of ACN channels for a full-order HOA signal of `order`.
pub fn num_channels(order: u32) -> usize {
    ((order + 1) * (order + 1)) as usize
}

/// ACN channel index to (degree l, order m).
fn acn_to_lm(acn: usize) -> (u32, i32) {
    let l = (acn as f64).sqrt().floor() as u32;
    let m = acn as i32 - (l * l) as i32 - l as i32;
    (l, m)
}

/// Real spherical harmonic value at (azimuth, elevation) in radians,
/// with the requested normalization.
fn spherical_harmonic(l: u32, m: i32, azimuth: f64, elevation: f64, normalization: Normalization) -> f64 {
    let theta = elevation; // BS.2127 elevation measured from the horizontal plane
    let assoc_legendre = legendre(l, m.unsigned_abs(), theta.sin());
    let azimuthal = if m >= 0 { (m as f64 * azimuth).cos() } else { (m.unsigned_abs() as f64 * azimuth).sin() };
    let norm = normalization_factor(l, m, normalization);
    norm * assoc_legendre * azimuthal
}

fn legendre(l: u32, m: u32, x: f64) -> f64 {
    // Standard recurrence for the associated Legendre polynomial P_l^m(x).
    let mut pmm = 1.0_f64;
    if m > 0 {
        let somx2 = ((1.0 - x) * (1.0 + x)).max(0.0).sqrt();
        let mut fact = 1.0;
        for _ in 0..m {
            pmm *= -fact * somx2;
            fact += 2.0;
        }
    }
    if l == m {
        return pmm;
    }
    let mut pmmp1 = x * (2.0 * m as f64 + 1.0) * pmm;
    if l == m + 1 {
        return pmmp1;
    }
    let mut pll = 0.0;
    for ll in (m + 2)..=l {
        pll = (x * (2.0 * ll as f64 - 1.0) * pmmp1 - (ll as f64 + m as f64 - 1.0) * pmm) / (ll as f64 - m as f64);
        pmm = pmmp1;
        pmmp1 = pll;
    }
    pll
}

fn normalization_factor(l: u32, m: i32, normalization: Normalization) -> f64 {
    let m_abs = m.unsigned_abs();
    let delta = if m == 0 { 1.0 } else { 2.0 };
    let factorial_ratio = (factorial(l - m_abs) / factorial(l + m_abs)).sqrt();
    match normalization {
        Normalization::Sn3d => (delta * factorial_ratio).sqrt(),
        Normalization::N3d => ((2 * l + 1) as f64 * delta * factorial_ratio).sqrt(),
        Normalization::FuMa => {
            // FuMa matches SN3D except for a fixed W-channel scaling.
            let sn3d = (delta * factorial_ratio).sqrt();
            if l == 0 {
                sn3d / std::f64::consts::SQRT_2
            } else {
                sn3d
            }
        }
    }
}

fn factorial(n: u32) -> f64 {
    (1..=n).fold(1.0, |acc, v| acc * v as f64)
}

/// A static HOA decoder: `speaker_gains[output_speaker][acn_channel]`.
pub struct HoaDecoder {
    pub order: u32,
    pub normalization: Normalization,
    matrix: StaticGainMatrix,
}

impl HoaDecoder {
    pub fn build(order: u32, normalization: Normalization, layout: &Layout) -> Self {
        let panner = PointSourcePanner::new(layout);
        let num_real = panner.num_real_speakers();
        let n_acn = num_channels(order);
        let points = &SphericalPointSet::reference().points;

        let mut accum = points
            .par_iter()
            .fold(
                || Array2::<f64>::zeros((num_real, n_acn)),
                |mut acc, p| {
                    let gains = panner.pan(*p);
                    let azimuth = (-p.x).atan2(p.y);
                    let elevation = p.z.asin();
                    for acn in 0..n_acn {
                        let (l, m) = acn_to_lm(acn);
                        let sh = spherical_harmonic(l, m, azimuth, elevation, normalization);
                        for (speaker, g) in gains.iter().enumerate() {
                            acc[[speaker, acn]] += g * sh;
                        }
                    }
                    acc
                },
            )
            .reduce(|| Array2::<f64>::zeros((num_real, n_acn)), |a, b| a + b);
        let scale = 4.0 * std::f64::consts::PI / points.len() as f64;
        accum.mapv_inplace(|v| v * scale);

        Self {
            order,
            normalization,
            matrix: accum,
        }
    }

    pub fn decode(&self, acn_inputs: &[f64]) -> Vec<f64> {
        let n_acn = self.matrix.ncols();
        let n = n_acn.min(acn_inputs.len());
        let mut out = vec![0.0; self.matrix.nrows()];
        for speaker in 0..self.matrix.nrows() {
            let mut acc = 0.0;
            for acn in 0..n {
                acc += self.matrix[[speaker, acn]] * acn_inputs[acn];
            }
            out[speaker] = acc;
        }
        out
    }
}

/// Near-field compensation: a first-order shelving filter per ACN order
/// band, applied as a one-pole IIR section per BS.2127 §7.15. Each
/// channel of a given spherical-harmonic degree shares one filter state.
pub struct NfcFilter {
    order: u32,
    ref_distance: f64,
    state: Vec<f64>,
}

impl NfcFilter {
    pub fn new(order: u32, ref_distance: f64) -> Self {
        Self {
            order,
            ref_distance,
            state: vec![0.0; num_channels(order)],
        }
    }

    /// Apply the filter in place to one sample of every ACN channel.
    pub fn process(&mut self, frame: &mut [f64]) {
        const SPEED_OF_SOUND: f64 = 343.0;
        let cutoff = SPEED_OF_SOUND / (2.0 * std::f64::consts::PI * self.ref_distance.max(0.01));
        let alpha = (cutoff / (cutoff + SPEED_OF_SOUND)).clamp(0.0, 1.0);
        for (acn, sample) in frame.iter_mut().enumerate().take(self.state.len()) {
            let (l, _) = acn_to_lm(acn);
            let degree_scale = 1.0 / (l as f64 + 1.0);
            let filtered = alpha * *sample + (1.0 - alpha) * self.state[acn];
            self.state[acn] = filtered;
            *sample = filtered * degree_scale;
        }
        let _ = self.order;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeroth_order_decoder_spreads_w_channel_to_all_speakers() {
        let layout = Layout::layout_0_5_0();
        let decoder = HoaDecoder::build(0, Normalization::Sn3d, &layout);
        let out = decoder.decode(&[1.0]);
        assert!(out.iter().all(|&g| g > 0.0));
    }

    #[test]
    fn decoder_matrix_shape_matches_order_and_layout() {
        let layout = Layout::layout_9_10_3();
        let decoder = HoaDecoder::build(1, Normalization::Sn3d, &layout);
        assert_eq!(decoder.matrix.ncols(), num_channels(1));
        assert_eq!(decoder.matrix.nrows(), layout.without_lfe().len());
    }

    #[test]
    fn nfc_filter_preserves_channel_count() {
        let mut filter = NfcFilter::new(1, 1.5);
        let mut frame = vec![1.0; num_channels(1)];
        filter.process(&mut frame);
        assert_eq!(frame.len(), num_channels(1));
    }

    #[test]
    fn acn_to_lm_matches_known_indices() {
        assert_eq!(acn_to_lm(0), (0, 0));
        assert_eq!(acn_to_lm(1), (1, -1));
        assert_eq!(acn_to_lm(2), (1, 0));
        assert_eq!(acn_to_lm(3), (1, 1));
    }
}
