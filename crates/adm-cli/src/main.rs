//! ADM reference renderer CLI.
//!
//! Usage:
//!   adm-render render in.wav out.wav -s 0+5+0
//!   adm-render utils dump-chna in.wav
//!   adm-render utils make-test-bwf out.wav --layout 0+5+0 --seconds 1

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use adm_core::Decibels;
use adm_io::{BitDepth, Bw64Reader, Bw64Writer, ChnaTable, HoundBw64Reader, HoundBw64Writer};
use adm_model::{Adm, Layout};
use adm_pipeline::{render_programme, Bw64Source, RenderConfig};

mod speakers_file;
mod utils;

use speakers_file::SpeakersFile;

#[derive(Parser)]
#[command(name = "adm-render", about = "ITU-R BS.2127 reference ADM renderer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a BW64/ADM input to a loudspeaker-bed BW64 output
    Render {
        input: PathBuf,
        output: PathBuf,
        /// Target BS.2051 reproduction layout, e.g. 0+5+0
        #[arg(short = 's', long = "layout")]
        layout: String,
        /// Optional speakers file overriding real positions/gains/screen
        #[arg(short = 'l', long = "speakers-file")]
        speakers_file: Option<PathBuf>,
        #[arg(long = "output-gain-db", default_value_t = 0.0)]
        output_gain_db: f64,
        #[arg(long)]
        fail_on_overload: bool,
        #[arg(long)]
        enable_block_duration_fix: bool,
        #[arg(long)]
        programme: Option<usize>,
        #[arg(long = "comp-object")]
        comp_object: Vec<String>,
        /// Force every Objects block's position to one coordinate mode before panning
        #[arg(long = "apply-conversion", value_enum)]
        apply_conversion: Option<ConversionMode>,
        #[arg(long)]
        strict: bool,
        #[arg(long)]
        debug: bool,
    },
    /// File inspection and test-fixture utilities
    Utils {
        #[command(subcommand)]
        command: UtilsCommands,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum ConversionMode {
    ToCartesian,
    ToPolar,
}

#[derive(Subcommand)]
enum UtilsCommands {
    /// Synthesise a minimal test BW64 file with a trivial ADM document
    MakeTestBwf {
        output: PathBuf,
        #[arg(long, default_value = "0+5+0")]
        layout: String,
        #[arg(long, default_value_t = 1.0)]
        seconds: f64,
    },
    /// Replace a BW64 file's embedded ADM document
    ReplaceAxml {
        input: PathBuf,
        output: PathBuf,
        #[arg(long)]
        axml_file: PathBuf,
    },
    /// Print the embedded ADM document to stdout
    DumpAxml { input: PathBuf },
    /// Print the parsed CHNA table to stdout
    DumpChna { input: PathBuf },
    /// Wrap a bare ambiX file into a minimal single-object BW64/ADM document
    AmbixToBwf {
        input: PathBuf,
        output: PathBuf,
        #[arg(long)]
        order: u32,
        #[arg(long, default_value = "sn3d")]
        normalization: String,
    },
    /// Round-trip a BW64 file through the reader/writer pair unchanged
    Regenerate { input: PathBuf, output: PathBuf },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Render {
            input,
            output,
            layout,
            speakers_file,
            output_gain_db,
            fail_on_overload,
            enable_block_duration_fix,
            programme,
            comp_object,
            apply_conversion,
            strict,
            debug,
        } => run_render(
            input,
            output,
            &layout,
            speakers_file,
            output_gain_db,
            fail_on_overload,
            enable_block_duration_fix,
            strict,
            programme,
            &comp_object,
            apply_conversion,
            debug,
        ),
        Commands::Utils { command } => utils::dispatch(command),
    };

    if let Err(err) = &result {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
    Ok(())
}

fn run_render(
    input: PathBuf,
    output: PathBuf,
    layout_name: &str,
    speakers_file: Option<PathBuf>,
    output_gain_db: f64,
    fail_on_overload: bool,
    enable_block_duration_fix: bool,
    strict: bool,
    programme: Option<usize>,
    comp_object: &[String],
    apply_conversion: Option<ConversionMode>,
    debug: bool,
) -> Result<()> {
    let mut layout = Layout::by_name(layout_name).with_context(|| format!("unknown target layout {layout_name:?}"))?;

    if let Some(path) = speakers_file {
        let raw = fs::read_to_string(&path).with_context(|| format!("reading speakers file {}", path.display()))?;
        let parsed: SpeakersFile = serde_yml::from_str(&raw).with_context(|| format!("parsing speakers file {}", path.display()))?;
        parsed.apply_to(&mut layout);
    }
    layout.check_positions().context("speaker positions outside BS.2051 tolerance")?;

    let axml = read_axml_sidecar(&input)?;
    let mut adm: Adm = serde_json::from_slice(&axml).context("parsing embedded ADM document (expects the JSON-serialized resolved graph produced by the XML-parsing collaborator)")?;

    if let Some(mode) = apply_conversion {
        apply_position_conversion(&mut adm, mode);
    }

    let mut reader = HoundBw64Reader::open(&input, axml, ChnaTable::default()).with_context(|| format!("opening {}", input.display()))?;
    let sample_rate = reader.sample_rate();

    let source = Bw64Source::load(&adm, &mut reader).context("buffering input PCM")?;

    let config = RenderConfig {
        layout: layout.clone(),
        sample_rate: sample_rate as f64,
        output_gain_db: Decibels(output_gain_db),
        fail_on_overload,
        fix_block_durations: enable_block_duration_fix,
        strict,
    };

    let programme_id = programme.map(adm_model::ProgrammeId);
    let total_samples = (reader.num_frames() as usize).max(1);

    let rendered = render_programme(&mut adm, &source, &config, programme_id, comp_object, total_samples)
        .map_err(|e| if debug { anyhow::anyhow!("{e:#?}") } else { anyhow::anyhow!("{e}") })?;

    let writer = HoundBw64Writer::create(&output, layout.num_channels(), sample_rate, BitDepth::default()).with_context(|| format!("creating {}", output.display()))?;
    let mut writer: Box<dyn Bw64Writer> = Box::new(writer);
    writer.write_block(&rendered).context("writing output samples")?;
    writer.finalize().context("finalizing output file")?;

    Ok(())
}

/// AXML extraction from the BW64 container is out of scope (spec
/// Non-goals); this renderer expects the document at `<input>.axml.json`
/// next to the WAV, as the JSON-serialized resolved `Adm` graph an
/// XML-parsing collaborator would otherwise hand over in memory.
fn read_axml_sidecar(input: &std::path::Path) -> Result<Vec<u8>> {
    let sidecar = input.with_extension("axml.json");
    fs::read(&sidecar).with_context(|| format!("reading ADM sidecar {}", sidecar.display()))
}

/// Force every Objects block's position to one coordinate mode ahead of
/// panning, bypassing the renderer's own per-block polar/Cartesian
/// choice. Useful for exercising the allocentric panner against content
/// authored the other way round.
fn apply_position_conversion(adm: &mut Adm, mode: ConversionMode) {
    use adm_model::block_format::BlockFormat;
    use adm_model::Position;

    for channel_format in &mut adm.channel_formats {
        for block in &mut channel_format.block_formats {
            if let BlockFormat::Objects(objects_block) = block {
                objects_block.position = match mode {
                    ConversionMode::ToCartesian => Position::Cartesian(objects_block.position.as_cartesian()),
                    ConversionMode::ToPolar => Position::Polar(objects_block.position.as_polar()),
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_render_subcommand_with_defaults() {
        let cli = Cli::try_parse_from(["adm-render", "render", "in.wav", "out.wav", "-s", "0+5+0"]).unwrap();
        match cli.command {
            Commands::Render { input, output, layout, fail_on_overload, .. } => {
                assert_eq!(input, PathBuf::from("in.wav"));
                assert_eq!(output, PathBuf::from("out.wav"));
                assert_eq!(layout, "0+5+0");
                assert!(!fail_on_overload);
            }
            _ => panic!("expected Render"),
        }
    }

    #[test]
    fn parses_utils_make_test_bwf_with_default_layout() {
        let cli = Cli::try_parse_from(["adm-render", "utils", "make-test-bwf", "out.wav"]).unwrap();
        match cli.command {
            Commands::Utils { command: UtilsCommands::MakeTestBwf { output, layout, seconds } } => {
                assert_eq!(output, PathBuf::from("out.wav"));
                assert_eq!(layout, "0+5+0");
                assert_eq!(seconds, 1.0);
            }
            _ => panic!("expected Utils::MakeTestBwf"),
        }
    }

    #[test]
    fn rejects_render_without_layout() {
        assert!(Cli::try_parse_from(["adm-render", "render", "in.wav", "out.wav"]).is_err());
    }

    #[test]
    fn parses_apply_conversion_flag() {
        let cli = Cli::try_parse_from(["adm-render", "render", "in.wav", "out.wav", "-s", "0+5+0", "--apply-conversion", "to-cartesian"]).unwrap();
        match cli.command {
            Commands::Render { apply_conversion: Some(ConversionMode::ToCartesian), .. } => {}
            _ => panic!("expected ToCartesian"),
        }
    }

    #[test]
    fn apply_position_conversion_rewrites_objects_blocks_to_cartesian() {
        use adm_model::block_format::{BlockFormat, ObjectsBlock};
        use adm_model::{AudioChannelFormat, PackType, PolarPosition, Position};

        let mut adm = Adm {
            channel_formats: vec![AudioChannelFormat {
                id: "AC_00010001".into(),
                name: "test".into(),
                pack_type: PackType::Objects,
                block_formats: vec![BlockFormat::Objects(ObjectsBlock {
                    position: Position::Polar(PolarPosition::new(30.0, 0.0, 1.0)),
                    ..Default::default()
                })],
            }],
            ..Default::default()
        };

        apply_position_conversion(&mut adm, ConversionMode::ToCartesian);

        let BlockFormat::Objects(block) = &adm.channel_formats[0].block_formats[0] else {
            panic!("expected Objects block");
        };
        assert!(block.position.is_cartesian());
    }
}
