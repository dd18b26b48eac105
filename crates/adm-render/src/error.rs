//! Render-time error taxonomy (spec §7: `RenderError`).
//!
//! Raised by a type renderer while computing a gain matrix for one block.
//! The pipeline treats any `RenderError` as fatal for the whole render.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("invalid Ambisonic order: {0} (max supported: 7)")]
    InvalidAmbisonicOrder(usize),

    #[error("invalid speaker layout: {0}")]
    InvalidLayout(String),

    #[error("zone exclusion removed all non-LFE speakers")]
    AllSpeakersExcluded,

    #[error("screen scaling is undefined for a position at a pole or singular extreme: {0}")]
    UndefinedScreenScaling(String),

    #[error("incompatible pack graph: {0}")]
    IncompatiblePackGraph(String),

    #[error("no triangle on the point-source mesh contains the requested direction")]
    NoContainingTriangle,

    #[error("buffer size mismatch: expected {expected}, got {got}")]
    BufferSizeMismatch { expected: usize, got: usize },
}

pub type RenderResult<T> = Result<T, RenderError>;
