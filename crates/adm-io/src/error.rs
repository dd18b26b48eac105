//! BW64 I/O error types (spec §7: `RenderError` sibling taxonomy for the
//! container layer).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(String),

    #[error("unsupported bit depth: {0}")]
    UnsupportedBitDepth(u16),

    #[error("channel count mismatch: file declares {declared}, block has {got}")]
    ChannelCountMismatch { declared: usize, got: usize },
}

pub type IoResult<T> = Result<T, IoError>;

impl From<hound::Error> for IoError {
    fn from(err: hound::Error) -> Self {
        IoError::Wav(err.to_string())
    }
}
