//! Bitstream I/O error types.

use thiserror::Error;

/// Result type for bitstream I/O operations.
pub type Result<T> = std::result::Result<T, BitstreamError>;

/// Errors raised by the bit-level reader/writer and the primitive codecs.
///
/// Reading past the end of the stream is deliberately *not* represented here:
/// VC-2 defines such reads to yield `1` bits, so the reader synthesises them
/// and counts them instead (see [`BitReader::bits_past_eof`]). The
/// [`BitstreamError::EndOfStream`] variant exists only for callers which opt
/// into strict EOF detection.
///
/// [`BitReader::bits_past_eof`]: crate::BitReader::bits_past_eof
#[derive(Error, Debug)]
pub enum BitstreamError {
    /// A value does not fit the field width or sign constraints it is being
    /// written with.
    #[error("value out of range: {0}")]
    OutOfRange(String),

    /// Attempted to write a `0` bit past the end of an active bounded block.
    #[error("cannot write a 0 bit past the end of a bounded block")]
    BoundedBlockOverflow,

    /// Attempted to begin a bounded block while one is already active.
    #[error("bounded blocks cannot be nested")]
    NestedBoundedBlock,

    /// Attempted to end a bounded block when none is active.
    #[error("not in a bounded block")]
    NotInBoundedBlock,

    /// Attempted to seek forward past the end of an active bounded block.
    #[error("cannot seek beyond the end of a bounded block")]
    SeekBeyondBoundedBlock,

    /// Strict end-of-stream detection (only raised by `*_strict` calls).
    #[error("end of stream at bit offset {0}")]
    EndOfStream(u64),

    /// Underlying byte sink failure.
    #[error("I/O error")]
    Io(#[from] std::io::Error),
}
