//! Top-level render orchestration: item selection -> per-item type
//! rendering -> block-to-sample expansion -> mixing -> output gain and
//! overload monitoring.

use adm_core::{Decibels, SampleBlock};
use adm_model::{Adm, BlockFormat, Layout, PackType, ProgrammeId};
use adm_render::direct_speakers::DirectSpeakersRenderer;
use adm_render::hoa::{HoaDecoder, NfcFilter};
use adm_render::matrix::MatrixRenderer;
use adm_render::objects::ObjectsRenderer;
use adm_render::GainEvent;

use crate::block_processor::{accumulate, expand_event};
use crate::error::PipelineResult;
use crate::item::select_items;
use crate::monitor::Monitor;
use crate::track::{MetadataSource, TrackProcessor, TrackSpec};

pub struct RenderConfig {
    pub layout: Layout,
    pub sample_rate: f64,
    pub output_gain_db: Decibels,
    pub fail_on_overload: bool,
    /// Stretch each block's duration to close gaps against the next
    /// block's `rtime` instead of failing on a timing gap.
    pub fix_block_durations: bool,
    /// Promote validation warnings (e.g. a fixed timing gap) to errors.
    pub strict: bool,
}

/// Render the selected programme's items to a full-length output
/// `SampleBlock` sized `[layout.num_channels(), total_samples]`.
pub fn render_programme<S: MetadataSource>(
    adm: &mut Adm,
    source: &S,
    config: &RenderConfig,
    programme: Option<ProgrammeId>,
    comp_object_choices: &[String],
    total_samples: usize,
) -> PipelineResult<SampleBlock> {
    let options = adm_model::ValidateOptions {
        fix_block_durations: config.fix_block_durations,
        strict: config.strict,
    };
    let report = adm.validate(options)?;
    for warning in &report.warnings {
        log::warn!("{warning}");
    }
    if config.fix_block_durations {
        adm.fix_block_durations();
    }

    let items = select_items(adm, programme, comp_object_choices)?;
    let mut output = SampleBlock::new(config.layout.num_channels(), total_samples);

    let objects_renderer = ObjectsRenderer::new(&config.layout);
    let direct_speakers_renderer = DirectSpeakersRenderer::new(&config.layout);
    let real_indices = full_layout_real_indices(&config.layout);

    for item in &items {
        match item.pack_type {
            PackType::Objects => render_objects_item(item, adm, source, &objects_renderer, &real_indices, config, &mut output)?,
            PackType::DirectSpeakers => render_direct_speakers_item(item, adm, source, &direct_speakers_renderer, config, &mut output)?,
            PackType::Hoa => render_hoa_item(item, adm, source, config, &mut output)?,
            PackType::Matrix => render_matrix_item(item, adm, source, config, &mut output)?,
            PackType::Binaural => {
                log::warn!("item on object {:?} targets a Binaural pack, which this renderer does not produce", item.object_id);
            }
        }
    }

    let monitor = Monitor::new(config.output_gain_db, config.fail_on_overload);
    monitor.process(&mut output, 0)?;
    Ok(output)
}

/// Index into the full (LFE-inclusive) layout channel list for each of
/// `layout.without_lfe()`'s entries, in order.
fn full_layout_real_indices(layout: &Layout) -> Vec<usize> {
    layout.channels.iter().enumerate().filter(|(_, c)| !c.is_lfe).map(|(i, _)| i).collect()
}

fn render_objects_item<S: MetadataSource>(
    item: &crate::item::RenderingItem,
    adm: &Adm,
    source: &S,
    renderer: &ObjectsRenderer,
    real_indices: &[usize],
    config: &RenderConfig,
    output: &mut SampleBlock,
) -> PipelineResult<()> {
    let mut processor = TrackProcessor::new(source);
    for (channel_format_id, track_spec) in &item.tracks {
        let channel_format = adm.channel_format(*channel_format_id);
        let mut prev_gains = vec![0.0; real_indices.len()];
        for block in &channel_format.block_formats {
            let BlockFormat::Objects(objects_block) = block else {
                continue;
            };
            let event = renderer.render_block(objects_block)?;
            let remapped = remap_to_full_layout(&event, real_indices, output.num_channels());
            let start_sample = (remapped.start.seconds() * config.sample_rate).round() as u64;
            let frames = expand_event(&remapped, config.sample_rate, &prev_gains_full(&prev_gains, real_indices, output.num_channels()));
            prev_gains = event.gains.clone();
            let samples = matching_track_samples(&mut processor, track_spec, start_sample, frames.len());
            accumulate(output, start_sample as usize, &samples, &frames);
        }
    }
    Ok(())
}

fn render_direct_speakers_item<S: MetadataSource>(
    item: &crate::item::RenderingItem,
    adm: &Adm,
    source: &S,
    renderer: &DirectSpeakersRenderer,
    config: &RenderConfig,
    output: &mut SampleBlock,
) -> PipelineResult<()> {
    let mut processor = TrackProcessor::new(source);
    for (channel_format_id, track_spec) in &item.tracks {
        let channel_format = adm.channel_format(*channel_format_id);
        for block in &channel_format.block_formats {
            let BlockFormat::DirectSpeakers(direct_block) = block else {
                continue;
            };
            let event = renderer.render_block(direct_block)?;
            let start_sample = (event.start.seconds() * config.sample_rate).round() as u64;
            let frames = expand_event(&event, config.sample_rate, &vec![0.0; event.gains.len()]);
            let samples = matching_track_samples(&mut processor, track_spec, start_sample, frames.len());
            accumulate(output, start_sample as usize, &samples, &frames);
        }
    }
    Ok(())
}

fn render_hoa_item<S: MetadataSource>(item: &crate::item::RenderingItem, adm: &Adm, source: &S, config: &RenderConfig, output: &mut SampleBlock) -> PipelineResult<()> {
    let pack = adm.pack_format(item.pack_format_id);
    let order = ((item.tracks.len() as f64).sqrt().round() as u32).saturating_sub(1);
    let normalization = pack.normalization.unwrap_or(adm_model::block_format::Normalization::Sn3d);
    let decoder = HoaDecoder::build(order, normalization, &config.layout);
    let real_indices = full_layout_real_indices(&config.layout);
    let mut nfc_filter = pack.nfc_ref_dist.filter(|d| *d > 0.0).map(|d| NfcFilter::new(order, d));

    let mut processor = TrackProcessor::new(source);
    let num_samples = output.num_samples();
    let mut acn_inputs = vec![vec![0.0; num_samples]; item.tracks.len()];
    for (acn, (_, track_spec)) in item.tracks.iter().enumerate() {
        acn_inputs[acn] = processor.resolve(track_spec, 0, num_samples);
    }

    for s in 0..num_samples {
        let mut frame: Vec<f64> = acn_inputs.iter().map(|ch| ch[s]).collect();
        if let Some(filter) = nfc_filter.as_mut() {
            filter.process(&mut frame);
        }
        let decoded = decoder.decode(&frame);
        for (real_idx, value) in decoded.iter().enumerate() {
            let full_idx = real_indices[real_idx];
            output.channel_mut(full_idx)[s] += value;
        }
    }
    Ok(())
}

/// Each of the item's own tracks is one decode output channelFormat whose
/// `MatrixBlock` mixes down the item's other tracks (the encoded inputs).
/// The graph doesn't carry a separate cross-reference resolving a decode
/// output to a specific loudspeaker, so outputs are assigned to the
/// target layout's real channels in declared order.
fn render_matrix_item<S: MetadataSource>(item: &crate::item::RenderingItem, adm: &Adm, source: &S, config: &RenderConfig, output: &mut SampleBlock) -> PipelineResult<()> {
    let renderer = MatrixRenderer::new(item.tracks.len());
    let mut processor = TrackProcessor::new(source);
    let real_indices = full_layout_real_indices(&config.layout);

    for (output_idx, (channel_format_id, _)) in item.tracks.iter().enumerate() {
        let Some(&full_idx) = real_indices.get(output_idx) else {
            continue;
        };
        let channel_format = adm.channel_format(*channel_format_id);
        for block in &channel_format.block_formats {
            let BlockFormat::Matrix(matrix_block) = block else {
                continue;
            };
            let event = renderer.render_block(matrix_block);
            let start_sample = (event.start.seconds() * config.sample_rate).round() as u64;
            let end_sample = (event.end.seconds() * config.sample_rate).round() as u64;
            let num_samples = (end_sample.saturating_sub(start_sample)) as usize;

            let mut mixed = vec![0.0; num_samples];
            for (input_idx, (_, track_spec)) in item.tracks.iter().enumerate() {
                let gain = event.gains.get(input_idx).copied().unwrap_or(0.0);
                if gain == 0.0 {
                    continue;
                }
                let delay = event.delays_samples.get(input_idx).copied().unwrap_or(0.0) as u64;
                let samples = processor.resolve(track_spec, start_sample.saturating_sub(delay), num_samples);
                for (m, s) in mixed.iter_mut().zip(samples.iter()) {
                    *m += s * gain;
                }
            }

            let dst = output.channel_mut(full_idx);
            let start = start_sample as usize;
            for (i, s) in mixed.iter().enumerate() {
                if let Some(slot) = dst.get_mut(start + i) {
                    *slot += s;
                }
            }
        }
    }
    Ok(())
}

fn matching_track_samples<S: MetadataSource>(processor: &mut TrackProcessor<S>, spec: &TrackSpec, start_sample: u64, num_samples: usize) -> Vec<f64> {
    processor.resolve(spec, start_sample, num_samples)
}

fn remap_to_full_layout(event: &GainEvent, real_indices: &[usize], full_len: usize) -> GainEvent {
    let mut full = vec![0.0; full_len];
    for (real_idx, &full_idx) in real_indices.iter().enumerate() {
        if let Some(g) = event.gains.get(real_idx) {
            full[full_idx] = *g;
        }
    }
    GainEvent {
        start: event.start,
        end: event.end,
        gains: full,
        interpolation_length: event.interpolation_length,
        jump: event.jump,
    }
}

fn prev_gains_full(prev_real: &[f64], real_indices: &[usize], full_len: usize) -> Vec<f64> {
    let mut full = vec![0.0; full_len];
    for (real_idx, &full_idx) in real_indices.iter().enumerate() {
        if let Some(g) = prev_real.get(real_idx) {
            full[full_idx] = *g;
        }
    }
    full
}

#[cfg(test)]
mod tests {
    use super::*;
    use adm_model::{AudioChannelFormat, AudioContent, AudioObject, AudioPackFormat, AudioProgramme, AudioTrackUid};
    use adm_model::block_format::ObjectsBlock;
    use adm_model::{ChannelFormatId, ContentId, ObjectId, PackFormatId, Position, TrackUidId};

    struct ConstantSource;
    impl MetadataSource for ConstantSource {
        fn read_track(&self, _track_uid: TrackUidId, _start_sample: u64, num_samples: usize) -> Vec<f64> {
            vec![1.0; num_samples]
        }
    }

    fn single_object_adm(block: ObjectsBlock) -> Adm {
        Adm {
            programmes: vec![AudioProgramme {
                id: "APR_1001".into(),
                name: "P".into(),
                content_refs: vec![ContentId(0)],
            }],
            contents: vec![AudioContent {
                id: "ACO_1001".into(),
                name: "C".into(),
                object_refs: vec![ObjectId(0)],
            }],
            objects: vec![AudioObject {
                id: "AO_1001".into(),
                pack_format_ref: Some(PackFormatId(0)),
                track_uid_refs: vec![TrackUidId(0)],
                ..Default::default()
            }],
            pack_formats: vec![AudioPackFormat {
                id: "AP_00010001".into(),
                name: "Pack".into(),
                pack_type: PackType::Objects,
                channel_format_refs: vec![ChannelFormatId(0)],
                nested_pack_refs: vec![],
                normalization: None,
                nfc_ref_dist: None,
                screen_ref: false,
                importance: None,
            }],
            channel_formats: vec![AudioChannelFormat {
                id: "AC_00010001".into(),
                name: "Channel".into(),
                pack_type: PackType::Objects,
                block_formats: vec![BlockFormat::Objects(block)],
            }],
            track_uids: vec![AudioTrackUid {
                id: "ATU_00000001".into(),
                track_index: Some(1),
                pack_format_ref: Some(PackFormatId(0)),
                channel_format_ref: Some(ChannelFormatId(0)),
                sample_rate: Some(48000),
                bit_depth: Some(24),
            }],
        }
    }

    #[test]
    fn renders_a_single_object_block_into_the_output_bus() {
        let block = ObjectsBlock {
            duration: adm_model::block_format::AdmTime(0.01),
            position: Position::Polar(adm_model::PolarPosition::new(0.0, 0.0, 1.0)),
            ..Default::default()
        };
        let mut adm = single_object_adm(block);
        let config = RenderConfig {
            layout: Layout::layout_0_5_0(),
            sample_rate: 48000.0,
            output_gain_db: Decibels::ZERO,
            fail_on_overload: false,
            fix_block_durations: false,
            strict: false,
        };
        let source = ConstantSource;
        let output = render_programme(&mut adm, &source, &config, None, &[], 480).unwrap();
        assert!(output.peak() > 0.0);
    }
}
