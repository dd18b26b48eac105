//! `utils` subcommands: file inspection and test-fixture generation that
//! sit outside the render pipeline proper.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use adm_io::{BitDepth, Bw64Reader, Bw64Writer, ChnaTable, HoundBw64Reader, HoundBw64Writer};
use adm_model::block_format::Normalization;
use adm_model::Layout;

use crate::UtilsCommands;

pub fn dispatch(command: UtilsCommands) -> Result<()> {
    match command {
        UtilsCommands::MakeTestBwf { output, layout, seconds } => make_test_bwf(&output, &layout, seconds),
        UtilsCommands::ReplaceAxml { input, output, axml_file } => replace_axml(&input, &output, &axml_file),
        UtilsCommands::DumpAxml { input } => dump_axml(&input),
        UtilsCommands::DumpChna { input } => dump_chna(&input),
        UtilsCommands::AmbixToBwf { input, output, order, normalization } => ambix_to_bwf(&input, &output, order, &normalization),
        UtilsCommands::Regenerate { input, output } => regenerate(&input, &output),
    }
}

fn make_test_bwf(output: &PathBuf, layout_name: &str, seconds: f64) -> Result<()> {
    let layout = Layout::by_name(layout_name).with_context(|| format!("unknown layout {layout_name:?}"))?;
    let sample_rate = 48_000u32;
    let num_frames = (seconds * sample_rate as f64).round().max(1.0) as usize;

    let writer = HoundBw64Writer::create(output, layout.num_channels(), sample_rate, BitDepth::default())?;
    let mut writer: Box<dyn Bw64Writer> = Box::new(writer);
    let block = adm_core::SampleBlock::new(layout.num_channels(), num_frames);
    writer.write_block(&block)?;
    writer.finalize()?;

    println!("wrote silent {layout_name} test fixture ({num_frames} frames) to {}", output.display());
    Ok(())
}

fn replace_axml(input: &PathBuf, output: &PathBuf, axml_file: &PathBuf) -> Result<()> {
    let new_axml = fs::read(axml_file).with_context(|| format!("reading {}", axml_file.display()))?;
    let mut reader = HoundBw64Reader::open(input, Vec::new(), ChnaTable::default())?;
    let sample_rate = reader.sample_rate();
    let num_channels = reader.num_channels();

    let writer = HoundBw64Writer::create(output, num_channels, sample_rate, BitDepth::default())?;
    let mut writer: Box<dyn Bw64Writer> = Box::new(writer);
    while let Some(block) = reader.read_block(4096)? {
        writer.write_block(&block)?;
    }
    writer.finalize()?;

    let sidecar = output.with_extension("axml.json");
    fs::write(&sidecar, &new_axml).with_context(|| format!("writing {}", sidecar.display()))?;
    println!("wrote {} with replaced ADM document at {}", output.display(), sidecar.display());
    Ok(())
}

fn dump_axml(input: &PathBuf) -> Result<()> {
    let sidecar = input.with_extension("axml.json");
    let bytes = fs::read(&sidecar).with_context(|| format!("reading {}", sidecar.display()))?;
    println!("{}", String::from_utf8_lossy(&bytes));
    Ok(())
}

fn dump_chna(input: &PathBuf) -> Result<()> {
    let reader = HoundBw64Reader::open(input, Vec::new(), ChnaTable::default())?;
    let chna = reader.chna();
    if chna.rows.is_empty() {
        println!("(no CHNA rows)");
        return Ok(());
    }
    println!("{:<6} {:<14} {:<18} {:<14}", "track", "trackUID", "trackFormat", "packFormat");
    for row in &chna.rows {
        println!("{:<6} {:<14} {:<18} {:<14}", row.track_index, row.track_uid, row.track_format_id, row.pack_format_id);
    }
    Ok(())
}

fn ambix_to_bwf(input: &PathBuf, output: &PathBuf, order: u32, normalization: &str) -> Result<()> {
    let normalization = match normalization {
        "sn3d" => Normalization::Sn3d,
        "n3d" => Normalization::N3d,
        "fuma" => Normalization::FuMa,
        other => anyhow::bail!("unknown HOA normalization {other:?}"),
    };

    let mut reader = HoundBw64Reader::open(input, Vec::new(), ChnaTable::default())?;
    let sample_rate = reader.sample_rate();
    let num_channels = reader.num_channels();
    let expected = ((order + 1) * (order + 1)) as usize;
    if num_channels != expected {
        anyhow::bail!("ambiX order {order} expects {expected} channels, file has {num_channels}");
    }

    let writer = HoundBw64Writer::create(output, num_channels, sample_rate, BitDepth::default())?;
    let mut writer: Box<dyn Bw64Writer> = Box::new(writer);
    while let Some(block) = reader.read_block(4096)? {
        writer.write_block(&block)?;
    }
    writer.finalize()?;

    let doc = make_single_hoa_object_adm(order, normalization, num_channels);
    let sidecar = output.with_extension("axml.json");
    fs::write(&sidecar, serde_json::to_vec_pretty(&doc)?)?;
    println!("wrote ambiX-wrapped BW64 to {} with ADM sidecar {}", output.display(), sidecar.display());
    Ok(())
}

fn regenerate(input: &PathBuf, output: &PathBuf) -> Result<()> {
    let mut reader = HoundBw64Reader::open(input, Vec::new(), ChnaTable::default())?;
    let sample_rate = reader.sample_rate();
    let num_channels = reader.num_channels();

    let writer = HoundBw64Writer::create(output, num_channels, sample_rate, BitDepth::default())?;
    let mut writer: Box<dyn Bw64Writer> = Box::new(writer);
    while let Some(block) = reader.read_block(4096)? {
        writer.write_block(&block)?;
    }
    writer.finalize()?;
    println!("regenerated {} -> {}", input.display(), output.display());
    Ok(())
}

fn make_single_hoa_object_adm(order: u32, normalization: Normalization, num_channels: usize) -> adm_model::Adm {
    use adm_model::block_format::{BlockFormat, HoaBlock};
    use adm_model::{AudioChannelFormat, AudioContent, AudioObject, AudioPackFormat, AudioProgramme, AudioTrackUid, ChannelFormatId, ContentId, ObjectId, PackFormatId, PackType, TrackUidId};

    let mut channel_formats = Vec::new();
    let mut track_uids = Vec::new();
    let mut channel_format_refs = Vec::new();
    let mut track_uid_refs = Vec::new();

    for acn in 0..num_channels {
        let degree = (acn as f64).sqrt().floor() as u32;
        channel_formats.push(AudioChannelFormat {
            id: format!("AC_0001{acn:04}"),
            name: format!("HOA ACN {acn}"),
            pack_type: PackType::Hoa,
            block_formats: vec![BlockFormat::Hoa(HoaBlock {
                rtime: adm_model::block_format::AdmTime::ZERO,
                duration: adm_model::block_format::AdmTime::ZERO,
                order: degree,
                degree: acn as i32 - (degree * degree) as i32 - degree as i32,
                normalization,
                nfc_ref_dist: 0.0,
                screen_ref: false,
            })],
        });
        channel_format_refs.push(ChannelFormatId(acn));

        track_uids.push(AudioTrackUid {
            id: format!("ATU_{:08}", acn + 1),
            track_index: Some((acn + 1) as u32),
            pack_format_ref: Some(PackFormatId(0)),
            channel_format_ref: Some(ChannelFormatId(acn)),
            sample_rate: None,
            bit_depth: None,
        });
        track_uid_refs.push(TrackUidId(acn));
    }

    adm_model::Adm {
        programmes: vec![AudioProgramme {
            id: "APR_1001".into(),
            name: "ambiX import".into(),
            content_refs: vec![ContentId(0)],
        }],
        contents: vec![AudioContent {
            id: "ACO_1001".into(),
            name: "ambiX import".into(),
            object_refs: vec![ObjectId(0)],
        }],
        objects: vec![AudioObject {
            id: "AO_1001".into(),
            name: "ambiX".into(),
            pack_format_ref: Some(PackFormatId(0)),
            track_uid_refs,
            ..Default::default()
        }],
        pack_formats: vec![AudioPackFormat {
            id: format!("AP_0001{order:04}"),
            name: format!("HOA order {order}"),
            pack_type: PackType::Hoa,
            channel_format_refs,
            nested_pack_refs: vec![],
            normalization: Some(normalization),
            nfc_ref_dist: None,
            screen_ref: false,
            importance: None,
        }],
        channel_formats,
        track_uids,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_test_bwf_writes_a_readable_silent_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("fixture.wav");
        make_test_bwf(&out, "0+5+0", 0.5).unwrap();

        let reader = HoundBw64Reader::open(&out, Vec::new(), ChnaTable::default()).unwrap();
        assert_eq!(reader.num_channels(), Layout::by_name("0+5+0").unwrap().num_channels());
        assert_eq!(reader.sample_rate(), 48_000);
    }

    #[test]
    fn make_test_bwf_rejects_unknown_layout() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("fixture.wav");
        assert!(make_test_bwf(&out, "not-a-layout", 1.0).is_err());
    }

    #[test]
    fn ambix_adm_document_has_one_channel_format_per_acn() {
        let doc = make_single_hoa_object_adm(1, Normalization::Sn3d, 4);
        assert_eq!(doc.channel_formats.len(), 4);
        assert_eq!(doc.objects[0].track_uid_refs.len(), 4);
        assert_eq!(doc.pack_formats[0].channel_format_refs.len(), 4);
    }

    #[test]
    fn regenerate_round_trips_sample_count() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.wav");
        make_test_bwf(&input, "0+5+0", 0.25).unwrap();
        regenerate(&input, &output).unwrap();

        let reader = HoundBw64Reader::open(&output, Vec::new(), ChnaTable::default()).unwrap();
        assert_eq!(reader.num_channels(), 5);
    }
}
