//! Slice data model error types.

use thiserror::Error;
use vc2stream_io::BitstreamError;

/// Result type for slice array operations.
pub type Result<T> = std::result::Result<T, SliceError>;

/// Errors raised by slice arrays and their views.
#[derive(Error, Debug)]
pub enum SliceError {
    /// A slice, subband or pixel coordinate is outside the array geometry.
    #[error("coordinate out of range: {0}")]
    CoordOutOfRange(String),

    /// A stored header field cannot be represented in its bitstream field.
    #[error("slice field out of range: {0}")]
    FieldOutOfRange(String),

    /// Underlying bitstream failure while reading or writing slice data.
    #[error(transparent)]
    Bitstream(#[from] BitstreamError),
}
