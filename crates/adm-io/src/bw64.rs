//! BW64 container I/O (spec §6). BW64 is RIFF/WAV with two extra chunks
//! the ADM renderer needs: `axml` (raw ADM metadata XML) and `chna`
//! (channel index table). Actual chunk byte-layout parsing is out of
//! scope here, per the Non-goals: a `Bw64Reader` is handed its already
//! extracted `axml`/`chna` bytes and only owns PCM sample access, via
//! hound, which understands the standard `fmt `/`data` chunks.

use adm_core::{Sample, SampleBlock};
use std::io::{Read, Seek, Write};
use std::path::Path;

use crate::error::{IoError, IoResult};

/// One row of the CHNA table: which track carries which trackUID, and
/// which trackFormat/packFormat it declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChnaRow {
    pub track_index: u32,
    pub track_uid: String,
    pub track_format_id: String,
    pub pack_format_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct ChnaTable {
    pub rows: Vec<ChnaRow>,
}

impl ChnaTable {
    pub fn track_uid_for_index(&self, track_index: u32) -> Option<&str> {
        self.rows
            .iter()
            .find(|r| r.track_index == track_index)
            .map(|r| r.track_uid.as_str())
    }
}

/// Read access to a BW64 file's PCM data and embedded ADM metadata.
pub trait Bw64Reader {
    fn sample_rate(&self) -> u32;
    fn num_channels(&self) -> usize;
    fn num_frames(&self) -> u64;
    fn axml(&self) -> &[u8];
    fn chna(&self) -> &ChnaTable;

    /// Read up to `max_frames` frames starting at the reader's current
    /// position, returning fewer at end of file and `None` once
    /// exhausted.
    fn read_block(&mut self, max_frames: usize) -> IoResult<Option<SampleBlock>>;
}

/// Write access building a BW64 file frame-block by frame-block.
pub trait Bw64Writer {
    fn write_block(&mut self, block: &SampleBlock) -> IoResult<()>;
    fn finalize(self: Box<Self>) -> IoResult<()>;
}

/// Normalised PCM sample format for the output WAV.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitDepth {
    Int16,
    Int24,
    Float32,
}

impl BitDepth {
    fn bits(self) -> u16 {
        match self {
            BitDepth::Int16 => 16,
            BitDepth::Int24 => 24,
            BitDepth::Float32 => 32,
        }
    }

    fn sample_format(self) -> hound::SampleFormat {
        match self {
            BitDepth::Float32 => hound::SampleFormat::Float,
            _ => hound::SampleFormat::Int,
        }
    }
}

impl Default for BitDepth {
    fn default() -> Self {
        BitDepth::Int24
    }
}

/// A `Bw64Reader` backed by hound, with AXML/CHNA bytes supplied at
/// construction (their extraction is out of scope for this crate).
pub struct HoundBw64Reader<R: Read + Seek> {
    inner: hound::WavReader<R>,
    sample_rate: u32,
    num_channels: usize,
    num_frames: u64,
    axml: Vec<u8>,
    chna: ChnaTable,
}

impl HoundBw64Reader<std::io::BufReader<std::fs::File>> {
    pub fn open<P: AsRef<Path>>(path: P, axml: Vec<u8>, chna: ChnaTable) -> IoResult<Self> {
        let inner = hound::WavReader::open(path.as_ref())?;
        let spec = inner.spec();
        let num_frames = inner.duration() as u64;
        Ok(Self {
            inner,
            sample_rate: spec.sample_rate,
            num_channels: spec.channels as usize,
            num_frames,
            axml,
            chna,
        })
    }
}

impl<R: Read + Seek> Bw64Reader for HoundBw64Reader<R> {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn num_channels(&self) -> usize {
        self.num_channels
    }

    fn num_frames(&self) -> u64 {
        self.num_frames
    }

    fn axml(&self) -> &[u8] {
        &self.axml
    }

    fn chna(&self) -> &ChnaTable {
        &self.chna
    }

    fn read_block(&mut self, max_frames: usize) -> IoResult<Option<SampleBlock>> {
        let spec = self.inner.spec();
        let num_channels = self.num_channels;
        let max_value = match spec.sample_format {
            hound::SampleFormat::Int => (1i64 << (spec.bits_per_sample - 1)) as f64,
            hound::SampleFormat::Float => 1.0,
        };

        let mut block = SampleBlock::new(num_channels, max_frames);
        let mut frames_read = 0usize;

        'frames: for frame_idx in 0..max_frames {
            for ch in 0..num_channels {
                let sample = match spec.sample_format {
                    hound::SampleFormat::Float => match self.inner.samples::<f32>().next() {
                        Some(Ok(v)) => v as f64,
                        Some(Err(e)) => return Err(e.into()),
                        None => break 'frames,
                    },
                    hound::SampleFormat::Int => match self.inner.samples::<i32>().next() {
                        Some(Ok(v)) => v as f64 / max_value,
                        Some(Err(e)) => return Err(e.into()),
                        None => break 'frames,
                    },
                };
                block.channel_mut(ch)[frame_idx] = sample;
            }
            frames_read += 1;
        }

        if frames_read == 0 {
            return Ok(None);
        }
        if frames_read < max_frames {
            let mut trimmed = SampleBlock::new(num_channels, frames_read);
            for ch in 0..num_channels {
                trimmed.channel_mut(ch).copy_from_slice(&block.channel(ch)[..frames_read]);
            }
            block = trimmed;
        }
        Ok(Some(block))
    }
}

/// A `Bw64Writer` backed by hound. AXML/CHNA chunk emission is out of
/// scope; this writer emits a standard multichannel WAV at the given bit
/// depth (default 24-bit PCM per spec §6).
pub struct HoundBw64Writer<W: Write + Seek> {
    inner: hound::WavWriter<W>,
    bit_depth: BitDepth,
    num_channels: usize,
}

impl HoundBw64Writer<std::io::BufWriter<std::fs::File>> {
    pub fn create<P: AsRef<Path>>(path: P, num_channels: usize, sample_rate: u32, bit_depth: BitDepth) -> IoResult<Self> {
        let spec = hound::WavSpec {
            channels: num_channels as u16,
            sample_rate,
            bits_per_sample: bit_depth.bits(),
            sample_format: bit_depth.sample_format(),
        };
        let inner = hound::WavWriter::create(path.as_ref(), spec)?;
        Ok(Self {
            inner,
            bit_depth,
            num_channels,
        })
    }
}

impl<W: Write + Seek> Bw64Writer for HoundBw64Writer<W> {
    fn write_block(&mut self, block: &SampleBlock) -> IoResult<()> {
        if block.num_channels() != self.num_channels {
            return Err(IoError::ChannelCountMismatch {
                declared: self.num_channels,
                got: block.num_channels(),
            });
        }
        for sample in block.interleaved() {
            write_sample(&mut self.inner, sample, self.bit_depth)?;
        }
        Ok(())
    }

    fn finalize(self: Box<Self>) -> IoResult<()> {
        self.inner.finalize()?;
        Ok(())
    }
}

fn write_sample<W: Write + Seek>(writer: &mut hound::WavWriter<W>, sample: Sample, bit_depth: BitDepth) -> IoResult<()> {
    match bit_depth {
        BitDepth::Float32 => writer.write_sample(sample as f32)?,
        BitDepth::Int16 => writer.write_sample((sample.clamp(-1.0, 1.0) * 32767.0) as i16)?,
        BitDepth::Int24 => writer.write_sample((sample.clamp(-1.0, 1.0) * 8_388_607.0) as i32)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_depth_defaults_to_24() {
        assert_eq!(BitDepth::default(), BitDepth::Int24);
        assert_eq!(BitDepth::Int24.bits(), 24);
    }

    #[test]
    fn write_then_read_round_trips_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");

        let mut block = SampleBlock::new(2, 4);
        block.channel_mut(0).copy_from_slice(&[0.5, -0.5, 0.25, -0.25]);
        block.channel_mut(1).copy_from_slice(&[0.1, 0.2, 0.3, 0.4]);

        {
            let writer = HoundBw64Writer::create(&path, 2, 48000, BitDepth::Int24).unwrap();
            let mut writer: Box<dyn Bw64Writer> = Box::new(writer);
            writer.write_block(&block).unwrap();
            writer.finalize().unwrap();
        }

        let mut reader = HoundBw64Reader::open(&path, Vec::new(), ChnaTable::default()).unwrap();
        assert_eq!(reader.sample_rate(), 48000);
        assert_eq!(reader.num_channels(), 2);
        let read_back = reader.read_block(4).unwrap().unwrap();
        assert_eq!(read_back.num_samples(), 4);
        for (a, b) in read_back.channel(0).iter().zip(block.channel(0).iter()) {
            assert!((a - b).abs() < 1e-3);
        }
    }

    #[test]
    fn chna_lookup_finds_matching_track_index() {
        let table = ChnaTable {
            rows: vec![ChnaRow {
                track_index: 1,
                track_uid: "ATU_00000001".into(),
                track_format_id: "AT_00010001_01".into(),
                pack_format_id: "AP_00010002".into(),
            }],
        };
        assert_eq!(table.track_uid_for_index(1), Some("ATU_00000001"));
        assert_eq!(table.track_uid_for_index(2), None);
    }
}
