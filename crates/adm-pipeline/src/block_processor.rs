//! Block-to-sample gain interpolation and mixing (spec §4.7): expands
//! each channelFormat's `GainEvent` sequence into per-sample gain
//! vectors and accumulates the corresponding track signal into the
//! output bus.

use adm_core::{Sample, SampleBlock};
use adm_render::GainEvent;

/// Per-sample gain vectors for one `GainEvent`'s span, continuing the
/// ramp from `prev_gains` (the gain held at the end of the previous
/// event). `jump_position = true` steps immediately to the event's gain;
/// otherwise the gain ramps linearly over `interpolation_length` samples
/// and then holds.
pub fn expand_event(event: &GainEvent, sample_rate: f64, prev_gains: &[f64]) -> Vec<Vec<f64>> {
    let start_sample = (event.start.seconds() * sample_rate).round() as i64;
    let end_sample = (event.end.seconds() * sample_rate).round() as i64;
    let duration_samples = (end_sample - start_sample).max(0) as usize;
    let num_outputs = event.gains.len();

    let mut prev = prev_gains.to_vec();
    prev.resize(num_outputs, 0.0);

    let ramp_samples = ((event.interpolation_length.seconds() * sample_rate).round() as usize).min(duration_samples);

    if event.jump {
        // jump still holds the previous gain for interpolation_length, then
        // steps; it only skips the ramp, not the hold.
        let mut out = Vec::with_capacity(duration_samples);
        for i in 0..duration_samples {
            out.push(if i < ramp_samples { prev.clone() } else { event.gains.clone() });
        }
        return out;
    }

    let mut out = Vec::with_capacity(duration_samples);
    for i in 0..duration_samples {
        if ramp_samples == 0 || i >= ramp_samples {
            out.push(event.gains.clone());
        } else {
            let t = (i + 1) as f64 / ramp_samples as f64;
            let frame: Vec<f64> = prev.iter().zip(event.gains.iter()).map(|(p, g)| p + (g - p) * t).collect();
            out.push(frame);
        }
    }
    out
}

/// Accumulate one input channel's samples into `output`, weighted by a
/// per-sample, per-output-channel gain matrix produced by
/// [`expand_event`]. `output_offset` is the sample position in `output`
/// that the gain frames' first sample corresponds to.
pub fn accumulate(output: &mut SampleBlock, output_offset: usize, input: &[Sample], gain_frames: &[Vec<f64>]) {
    let n = input.len().min(gain_frames.len());
    for i in 0..n {
        let dst_idx = output_offset + i;
        if dst_idx >= output.num_samples() {
            break;
        }
        for (ch, gain) in gain_frames[i].iter().enumerate() {
            if ch >= output.num_channels() {
                break;
            }
            let sample = input[i] * gain;
            output.channel_mut(ch)[dst_idx] += sample;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adm_model::block_format::AdmTime;
    use approx::assert_relative_eq;

    #[test]
    fn jump_event_steps_immediately() {
        let event = GainEvent::new(AdmTime(0.0), AdmTime(0.001), vec![1.0, 0.0]).with_interpolation(AdmTime::ZERO, true);
        let frames = expand_event(&event, 48000.0, &[0.0, 1.0]);
        assert_eq!(frames.len(), 48);
        assert_eq!(frames[0], vec![1.0, 0.0]);
        assert_eq!(frames[47], vec![1.0, 0.0]);
    }

    #[test]
    fn jump_event_holds_previous_gain_through_interpolation_length_then_steps() {
        let event = GainEvent::new(AdmTime(0.0), AdmTime(0.01), vec![1.0]).with_interpolation(AdmTime(0.005), true);
        let frames = expand_event(&event, 1000.0, &[0.0]);
        assert_eq!(frames.len(), 10);
        assert_relative_eq!(frames[0][0], 0.0, epsilon = 1e-9);
        assert_relative_eq!(frames[4][0], 0.0, epsilon = 1e-9);
        assert_relative_eq!(frames[5][0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(frames[9][0], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn ramped_event_interpolates_then_holds() {
        let event = GainEvent::new(AdmTime(0.0), AdmTime(0.01), vec![1.0]).with_interpolation(AdmTime(0.005), false);
        let frames = expand_event(&event, 1000.0, &[0.0]);
        assert_eq!(frames.len(), 10);
        assert!(frames[0][0] > 0.0 && frames[0][0] < 1.0);
        assert_relative_eq!(frames[4][0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(frames[9][0], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn accumulate_sums_weighted_input_into_output() {
        let mut output = SampleBlock::new(2, 4);
        let input = vec![1.0, 1.0, 1.0, 1.0];
        let gain_frames = vec![vec![0.5, 0.0]; 4];
        accumulate(&mut output, 0, &input, &gain_frames);
        assert_eq!(output.channel(0), &[0.5, 0.5, 0.5, 0.5]);
        assert_eq!(output.channel(1), &[0.0, 0.0, 0.0, 0.0]);
    }
}
