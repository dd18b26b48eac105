//! Buffers a `Bw64Reader`'s PCM data in memory and exposes it as a
//! [`MetadataSource`] keyed by trackUID, resolving CHNA's physical track
//! index -> trackUID mapping against the ADM document's own trackUID ids.

use std::collections::HashMap;

use adm_core::Sample;
use adm_io::Bw64Reader;
use adm_model::{Adm, TrackUidId};

use crate::error::PipelineResult;
use crate::item::track_uid_physical_index;
use crate::track::MetadataSource;

/// Reads every frame of `reader` up front and indexes it by the physical
/// channel each trackUID in `adm` resolves to, via CHNA. This renderer is
/// an offline batch tool (spec §2), so holding the whole programme in
/// memory is the simplest correct approach; streaming block-by-block
/// would need `TrackProcessor`'s cache keyed by sample range instead of
/// node identity.
pub struct Bw64Source {
    channels: Vec<Vec<Sample>>,
    track_uid_to_channel: HashMap<TrackUidId, usize>,
}

impl Bw64Source {
    pub fn load(adm: &Adm, reader: &mut dyn Bw64Reader) -> PipelineResult<Self> {
        let num_channels = reader.num_channels();
        let mut channels = vec![Vec::new(); num_channels];

        while let Some(block) = reader.read_block(4096)? {
            for ch in 0..num_channels {
                channels[ch].extend_from_slice(block.channel(ch));
            }
        }

        let chna = reader.chna();
        let mut track_uid_to_channel = HashMap::new();
        for (idx, track_uid) in adm.track_uids.iter().enumerate() {
            let track_uid_id = TrackUidId(idx);
            let Some(physical_index) = track_uid_physical_index(adm, track_uid_id) else {
                continue;
            };
            if chna.track_uid_for_index(physical_index) == Some(track_uid.id.as_str()) {
                let channel_idx = (physical_index as usize).saturating_sub(1);
                if channel_idx < num_channels {
                    track_uid_to_channel.insert(track_uid_id, channel_idx);
                }
            }
        }

        Ok(Self {
            channels,
            track_uid_to_channel,
        })
    }
}

impl MetadataSource for Bw64Source {
    fn read_track(&self, track_uid: TrackUidId, start_sample: u64, num_samples: usize) -> Vec<Sample> {
        let Some(&channel_idx) = self.track_uid_to_channel.get(&track_uid) else {
            return vec![0.0; num_samples];
        };
        let channel = &self.channels[channel_idx];
        let start = start_sample as usize;
        let mut out = vec![0.0; num_samples];
        for i in 0..num_samples {
            if let Some(&s) = channel.get(start + i) {
                out[i] = s;
            }
        }
        out
    }
}
