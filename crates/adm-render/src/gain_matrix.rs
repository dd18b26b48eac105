//! Shared output contract for every type renderer: a gain vector (or
//! static matrix) over an interval of the channelFormat's own time base,
//! consumed by the pipeline's interpolating block processor (spec §4.7).

use adm_model::block_format::AdmTime;
use ndarray::Array2;

/// One gain-vector event over `[start, end)` on the channelFormat's time
/// base. `interpolation_length` and `jump` mirror `ObjectsBlock`'s
/// jumpPosition semantics: a non-jump event ramps linearly from the
/// previous event's held gain over `interpolation_length`; a jump holds
/// the previous gain and then steps.
#[derive(Debug, Clone)]
pub struct GainEvent {
    pub start: AdmTime,
    pub end: AdmTime,
    pub gains: Vec<f64>,
    pub interpolation_length: AdmTime,
    pub jump: bool,
}

impl GainEvent {
    pub fn new(start: AdmTime, end: AdmTime, gains: Vec<f64>) -> Self {
        Self {
            start,
            end,
            gains,
            interpolation_length: AdmTime::ZERO,
            jump: false,
        }
    }

    pub fn with_interpolation(mut self, length: AdmTime, jump: bool) -> Self {
        self.interpolation_length = length;
        self.jump = jump;
        self
    }
}

/// A static `(num_outputs x num_inputs)` gain matrix, used by the HOA
/// decoder and by direct (non-time-varying) Matrix coefficients.
pub type StaticGainMatrix = Array2<f64>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gain_event_defaults_to_no_interpolation() {
        let e = GainEvent::new(AdmTime(0.0), AdmTime(1.0), vec![1.0, 0.0]);
        assert_eq!(e.interpolation_length.seconds(), 0.0);
        assert!(!e.jump);
    }
}
