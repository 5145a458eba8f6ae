//! Serialisation driver error types.

use thiserror::Error;
use vc2stream_io::BitstreamError;
use vc2stream_slices::SliceError;

/// Result type for serialisation passes.
pub type Result<T> = std::result::Result<T, SerdesError>;

/// Errors raised by the token-stream drivers.
#[derive(Error, Debug)]
pub enum SerdesError {
    /// While writing, the supplied context did not match the grammar's
    /// demands: a value was missing, left over, or of the wrong type.
    #[error("context mismatch: {0}")]
    ContextMismatch(String),

    /// The grammar finished with a bounded block still open.
    #[error("bounded block still open at end of grammar")]
    UnclosedBoundedBlock,

    /// A queried bit offset lies beyond the end of the serialised stream.
    #[error("bit offset {0} is past the end of the stream")]
    OffsetOutOfRange(u64),

    /// Underlying bit-level I/O failure.
    #[error(transparent)]
    Bitstream(#[from] BitstreamError),

    /// Slice data model failure.
    #[error(transparent)]
    Slice(#[from] SliceError),
}
