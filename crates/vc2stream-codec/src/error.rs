//! Codec-level error types.

use thiserror::Error;
use vc2stream_serdes::SerdesError;

/// Result type for VC-2 grammar passes.
pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors raised while driving the VC-2 grammar.
#[derive(Error, Debug)]
pub enum CodecError {
    /// A parse_info carried a parse code this crate does not know.
    #[error("unknown parse code 0x{0:02X}")]
    UnknownParseCode(u8),

    /// Underlying serialisation driver failure.
    #[error(transparent)]
    Serdes(#[from] SerdesError),
}

impl From<vc2stream_io::BitstreamError> for CodecError {
    fn from(err: vc2stream_io::BitstreamError) -> Self {
        CodecError::Serdes(err.into())
    }
}
