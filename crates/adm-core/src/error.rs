//! Shared low-level error type for `adm-core` utilities.
//!
//! Higher-level crates (`adm-model`, `adm-render`, `adm-pipeline`) define
//! their own error enums for the taxonomy in the renderer's error-handling
//! design and wrap this one where a core operation can fail.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(u32),

    #[error("buffer size mismatch: expected {expected}, got {got}")]
    BufferSizeMismatch { expected: usize, got: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;
