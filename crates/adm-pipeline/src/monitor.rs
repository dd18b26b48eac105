//! Output gain and overload monitoring (spec §2 step 7): applies the
//! programme's global output gain and, if requested, fails the render
//! when any sample exceeds full scale.

use adm_core::{Decibels, SampleBlock};

use crate::error::{PipelineError, PipelineResult};

pub struct Monitor {
    output_gain: f64,
    fail_on_overload: bool,
}

impl Monitor {
    pub fn new(output_gain_db: Decibels, fail_on_overload: bool) -> Self {
        Self {
            output_gain: output_gain_db.to_gain(),
            fail_on_overload,
        }
    }

    /// Apply the output gain in place and check for overload, returning
    /// the absolute sample position of the first over-scale sample found
    /// when `fail_on_overload` is set.
    pub fn process(&self, block: &mut SampleBlock, block_start_sample: u64) -> PipelineResult<()> {
        for ch in 0..block.num_channels() {
            for s in block.channel_mut(ch).iter_mut() {
                *s *= self.output_gain;
            }
        }

        if self.fail_on_overload {
            let peak = block.peak();
            if peak > 1.0 {
                return Err(PipelineError::Overload {
                    sample: block_start_sample,
                    peak,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unity_gain_leaves_samples_unchanged() {
        let monitor = Monitor::new(Decibels::ZERO, false);
        let mut block = SampleBlock::new(1, 2);
        block.channel_mut(0).copy_from_slice(&[0.5, -0.5]);
        monitor.process(&mut block, 0).unwrap();
        assert_eq!(block.channel(0), &[0.5, -0.5]);
    }

    #[test]
    fn overload_is_detected_when_enabled() {
        let monitor = Monitor::new(Decibels::ZERO, true);
        let mut block = SampleBlock::new(1, 1);
        block.channel_mut(0).copy_from_slice(&[1.5]);
        assert!(monitor.process(&mut block, 0).is_err());
    }

    #[test]
    fn overload_is_ignored_when_disabled() {
        let monitor = Monitor::new(Decibels::ZERO, false);
        let mut block = SampleBlock::new(1, 1);
        block.channel_mut(0).copy_from_slice(&[1.5]);
        assert!(monitor.process(&mut block, 0).is_ok());
    }

    #[test]
    fn gain_is_applied_before_overload_check() {
        let monitor = Monitor::new(Decibels(-6.0), true);
        let mut block = SampleBlock::new(1, 1);
        block.channel_mut(0).copy_from_slice(&[1.5]);
        assert!(monitor.process(&mut block, 0).is_ok());
        assert!(block.channel(0)[0] < 1.0);
    }
}
