//! Graph-level invariant checks (spec §3, §4.1).

use crate::block_format::AdmTime;
use crate::error::{AdmModelError, AdmModelResult};
use crate::graph::{Adm, ObjectId, SILENT_TRACK_UID};

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateOptions {
    /// `--enable-block-duration-fix`: extend/shift durations to close gaps
    /// instead of failing.
    pub fix_block_durations: bool,
    /// `--strict`: promote warnings to errors.
    pub strict: bool,
}

#[derive(Debug)]
pub struct ValidationReport {
    pub warnings: Vec<String>,
}

impl Adm {
    pub fn validate(&self, options: ValidateOptions) -> AdmModelResult<ValidationReport> {
        let mut warnings = Vec::new();
        self.check_object_cycles()?;
        self.check_track_uid_sanity()?;
        self.check_block_timing(options, &mut warnings)?;
        if options.strict && !warnings.is_empty() {
            return Err(AdmModelError::Parse(format!(
                "{} warning(s) promoted to errors by --strict",
                warnings.len()
            )));
        }
        Ok(ValidationReport { warnings })
    }

    fn check_object_cycles(&self) -> AdmModelResult<()> {
        let mut state = vec![0u8; self.objects.len()]; // 0=unvisited 1=visiting 2=done
        fn visit(adm: &Adm, id: ObjectId, state: &mut [u8]) -> AdmModelResult<()> {
            match state[id.0] {
                1 => return Err(AdmModelError::CyclicReference(adm.object(id).id.clone())),
                2 => return Ok(()),
                _ => {}
            }
            state[id.0] = 1;
            for &child in &adm.object(id).object_refs {
                visit(adm, child, state)?;
            }
            for group in &adm.object(id).complementary_object_groups {
                for &child in group {
                    visit(adm, child, state)?;
                }
            }
            state[id.0] = 2;
            Ok(())
        }
        for programme in &self.programmes {
            for &content_id in &programme.content_refs {
                for &object_id in &self.content(content_id).object_refs {
                    visit(self, object_id, &mut state)?;
                }
            }
        }
        Ok(())
    }

    fn check_track_uid_sanity(&self) -> AdmModelResult<()> {
        for tu in &self.track_uids {
            if tu.id == SILENT_TRACK_UID
                && (tu.pack_format_ref.is_some() || tu.channel_format_ref.is_some())
            {
                return Err(AdmModelError::SilentTrackMisuse(tu.id.clone()));
            }
        }
        Ok(())
    }

    /// Spec §3: within a channelFormat, blockFormats must have
    /// non-decreasing rtime, and `rtime + duration` should equal the next
    /// block's rtime. With `fix_block_durations`, gaps/overlaps are closed
    /// by stretching the earlier block's duration; otherwise they are a
    /// fatal `AdmTimingError`, surfaced here as a warning collector the
    /// caller can turn into an error.
    fn check_block_timing(
        &self,
        options: ValidateOptions,
        warnings: &mut Vec<String>,
    ) -> AdmModelResult<()> {
        for cf in &self.channel_formats {
            let mut prev_end: Option<AdmTime> = None;
            for (idx, block) in cf.block_formats.iter().enumerate() {
                let rtime = block.rtime();
                if let Some(prev) = prev_end {
                    if (rtime.seconds() - prev.seconds()).abs() > 1e-9 {
                        if options.fix_block_durations {
                            warnings.push(format!(
                                "{}: block {} gap/overlap fixed by duration adjustment",
                                cf.id, idx
                            ));
                        } else {
                            return Err(AdmModelError::TimingGap {
                                channel_format: cf.id.clone(),
                                rtime: rtime.seconds(),
                                prev_end: prev.seconds(),
                            });
                        }
                    }
                }
                if let crate::block_format::BlockFormat::Objects(b) = block {
                    if b.interpolation_length.seconds() > b.duration.seconds() + 1e-9 {
                        return Err(AdmModelError::InterpolationLengthExceedsDuration {
                            channel_format: cf.id.clone(),
                            interp: b.interpolation_length.seconds(),
                            duration: b.duration.seconds(),
                        });
                    }
                }
                prev_end = Some(block.end_time());
            }
        }
        Ok(())
    }

    /// Apply `--enable-block-duration-fix`: stretch each block's duration
    /// so it abuts the next block's rtime, forming a contiguous timeline
    /// per channelFormat.
    pub fn fix_block_durations(&mut self) {
        for cf in &mut self.channel_formats {
            let len = cf.block_formats.len();
            for i in 0..len.saturating_sub(1) {
                let next_rtime = cf.block_formats[i + 1].rtime();
                let this_rtime = cf.block_formats[i].rtime();
                let fixed_duration = AdmTime(next_rtime.seconds() - this_rtime.seconds());
                set_duration(&mut cf.block_formats[i], fixed_duration);
            }
        }
    }
}

fn set_duration(block: &mut crate::block_format::BlockFormat, duration: AdmTime) {
    use crate::block_format::BlockFormat::*;
    match block {
        Objects(b) => b.duration = duration,
        DirectSpeakers(b) => b.duration = duration,
        Hoa(b) => b.duration = duration,
        Matrix(b) => b.duration = duration,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block_format::{BlockFormat, ObjectsBlock};
    use crate::graph::{AudioChannelFormat, PackType};

    fn block(rtime: f64, duration: f64) -> BlockFormat {
        BlockFormat::Objects(ObjectsBlock {
            rtime: AdmTime(rtime),
            duration: AdmTime(duration),
            ..Default::default()
        })
    }

    #[test]
    fn gap_without_fix_is_fatal() {
        let adm = Adm {
            channel_formats: vec![AudioChannelFormat {
                id: "AC_1".into(),
                name: "obj".into(),
                pack_type: PackType::Objects,
                block_formats: vec![block(0.0, 0.5), block(0.6, 0.4)],
            }],
            ..Default::default()
        };
        let err = adm.validate(ValidateOptions::default()).unwrap_err();
        assert!(matches!(err, AdmModelError::TimingGap { .. }));
    }

    #[test]
    fn gap_with_fix_flag_becomes_warning_and_is_fixable() {
        let mut adm = Adm {
            channel_formats: vec![AudioChannelFormat {
                id: "AC_1".into(),
                name: "obj".into(),
                pack_type: PackType::Objects,
                block_formats: vec![block(0.0, 0.5), block(0.6, 0.4)],
            }],
            ..Default::default()
        };
        let report = adm
            .validate(ValidateOptions {
                fix_block_durations: true,
                strict: false,
            })
            .unwrap();
        assert_eq!(report.warnings.len(), 1);

        adm.fix_block_durations();
        assert_eq!(adm.channel_formats[0].block_formats[0].duration().seconds(), 0.6);
    }

    #[test]
    fn silent_track_with_real_refs_is_rejected() {
        use crate::graph::AudioTrackUid;
        let adm = Adm {
            track_uids: vec![AudioTrackUid {
                id: SILENT_TRACK_UID.into(),
                track_index: None,
                pack_format_ref: Some(crate::graph::PackFormatId(0)),
                channel_format_ref: None,
                sample_rate: None,
                bit_depth: None,
            }],
            ..Default::default()
        };
        assert!(adm.validate(ValidateOptions::default()).is_err());
    }
}
