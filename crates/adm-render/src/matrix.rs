//! Matrix type renderer (spec §4.6): a channelFormat whose samples are a
//! weighted, optionally delayed and phase-flipped, sum of other track
//! channels. Direct (encode/decode) matrices are the common case and are
//! static for the whole programme; this renderer also accepts
//! time-varying coefficient blocks, interpolated like Objects positions.

use adm_model::block_format::{AdmTime, MatrixBlock};

/// One matrix output's coefficients over `[start, end)`: per-input gain
/// (already carrying the phase-flip sign) and per-input delay in
/// samples, applied by the pipeline's mixer before summation.
#[derive(Debug, Clone)]
pub struct MatrixEvent {
    pub start: AdmTime,
    pub end: AdmTime,
    pub gains: Vec<f64>,
    pub delays_samples: Vec<f64>,
}

pub struct MatrixRenderer {
    num_inputs: usize,
}

impl MatrixRenderer {
    pub fn new(num_inputs: usize) -> Self {
        Self { num_inputs }
    }

    pub fn render_block(&self, block: &MatrixBlock) -> MatrixEvent {
        let mut gains = vec![0.0; self.num_inputs];
        let mut delays_samples = vec![0.0; self.num_inputs];

        for coeff in &block.coefficients {
            if coeff.input_channel_index >= self.num_inputs {
                continue;
            }
            let sign = if coeff.phase_flip { -1.0 } else { 1.0 };
            gains[coeff.input_channel_index] = sign * coeff.gain;
            delays_samples[coeff.input_channel_index] = coeff.delay_samples;
        }

        MatrixEvent {
            start: block.rtime,
            end: block.rtime + block.duration,
            gains,
            delays_samples,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adm_model::block_format::MatrixCoefficient;

    #[test]
    fn coefficient_gain_is_routed_to_its_input_index() {
        let renderer = MatrixRenderer::new(4);
        let block = MatrixBlock {
            rtime: AdmTime::ZERO,
            duration: AdmTime(1.0),
            coefficients: vec![MatrixCoefficient {
                input_channel_index: 2,
                gain: 0.5,
                delay_samples: 0.0,
                phase_flip: false,
            }],
        };
        let event = renderer.render_block(&block);
        assert_eq!(event.gains, vec![0.0, 0.0, 0.5, 0.0]);
    }

    #[test]
    fn phase_flip_negates_gain() {
        let renderer = MatrixRenderer::new(2);
        let block = MatrixBlock {
            rtime: AdmTime::ZERO,
            duration: AdmTime(1.0),
            coefficients: vec![MatrixCoefficient {
                input_channel_index: 0,
                gain: 1.0,
                delay_samples: 3.0,
                phase_flip: true,
            }],
        };
        let event = renderer.render_block(&block);
        assert_eq!(event.gains[0], -1.0);
        assert_eq!(event.delays_samples[0], 3.0);
    }
}
