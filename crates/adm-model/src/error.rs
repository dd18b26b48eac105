//! The ADM parse/reference/timing error taxonomy from the renderer's
//! error-handling design.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdmModelError {
    #[error("malformed ADM XML: {0}")]
    Parse(String),

    #[error("dangling reference from {from} to {to}")]
    DanglingReference { from: String, to: String },

    #[error("cyclic reference involving {0}")]
    CyclicReference(String),

    #[error("ambiguous pack type for trackUID {0}")]
    AmbiguousPackType(String),

    #[error("audioTrackUID {0} used ATU_00000000 while also referencing real content")]
    SilentTrackMisuse(String),

    #[error(
        "channelFormat {channel_format}: block at rtime {rtime:.6}s does not abut the previous block's end at {prev_end:.6}s"
    )]
    TimingGap {
        channel_format: String,
        rtime: f64,
        prev_end: f64,
    },

    #[error("channelFormat {channel_format}: interpolationLength {interp:.6}s exceeds duration {duration:.6}s")]
    InterpolationLengthExceedsDuration {
        channel_format: String,
        interp: f64,
        duration: f64,
    },
}

pub type AdmModelResult<T> = Result<T, AdmModelError>;
