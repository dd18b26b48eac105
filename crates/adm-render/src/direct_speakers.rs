//! DirectSpeakers type renderer (spec §4.4): maps each channelFormat to
//! an output speaker by label, falling back to nearest-position matching
//! within the block's bounds when no reproduction speaker carries that
//! exact label.

use crate::error::{RenderError, RenderResult};
use crate::gain_matrix::GainEvent;
use adm_model::block_format::DirectSpeakersBlock;
use adm_model::Layout;

pub struct DirectSpeakersRenderer {
    layout: Layout,
}

impl DirectSpeakersRenderer {
    pub fn new(layout: &Layout) -> Self {
        Self { layout: layout.clone() }
    }

    pub fn render_block(&self, block: &DirectSpeakersBlock) -> RenderResult<GainEvent> {
        let target = self.resolve_speaker(block)?;
        let channel = &self.layout.channels[target];

        if channel.is_lfe != block.is_lfe {
            log::warn!(
                "DirectSpeakers block labelled {:?} targets channel {} but LFE flag mismatches (block: {}, layout: {})",
                block.speaker_labels,
                channel.name,
                block.is_lfe,
                channel.is_lfe
            );
        }

        let mut gains = vec![0.0; self.layout.num_channels()];
        gains[target] = block.gain * channel.gain;

        Ok(GainEvent::new(block.rtime, block.rtime + block.duration, gains))
    }

    /// Exact label match first (spec §4.4 step 1); otherwise nearest
    /// real-position match among channels whose nominal position falls
    /// within the block's declared bounds, if any.
    fn resolve_speaker(&self, block: &DirectSpeakersBlock) -> RenderResult<usize> {
        for label in &block.speaker_labels {
            if let Some(idx) = self.layout.channel_index(label) {
                return Ok(idx);
            }
        }

        let position = block.position.as_polar();
        let mut best: Option<(usize, f64)> = None;
        for (idx, channel) in self.layout.channels.iter().enumerate() {
            if let Some(bounds) = block.position_bounds {
                let az = channel.nominal_position.azimuth;
                let el = channel.nominal_position.elevation;
                if az < bounds.min_azimuth || az > bounds.max_azimuth || el < bounds.min_elevation || el > bounds.max_elevation {
                    continue;
                }
            }
            let a = channel.nominal_position.to_cartesian();
            let b = position.to_cartesian();
            let dist = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2) + (a.z - b.z).powi(2)).sqrt();
            if best.map_or(true, |(_, best_dist)| dist < best_dist) {
                best = Some((idx, dist));
            }
        }

        best.map(|(idx, _)| idx).ok_or_else(|| {
            RenderError::IncompatiblePackGraph(format!(
                "no reproduction speaker matches labels {:?} within the declared bounds",
                block.speaker_labels
            ))
        })
    }
}
