//! Bit-granular I/O for VC-2 (SMPTE ST 2042-1) bitstreams.
//!
//! This crate implements the lowest layers of the VC-2 serialisation engine:
//!
//! - [`BitReader`] / [`BitWriter`]: MSB-first bit access over an ordered byte
//!   source/sink, with explicit tracking of bits read or written past the end
//!   of the stream (reading past EOF is *not* an error in VC-2; the missing
//!   bits are synthesised as `1`s and counted).
//! - Bounded blocks (A.4.2): length-limited regions in which reads past the
//!   budget synthesise `1`s and writes past the budget silently drop `1` bits
//!   but refuse `0` bits.
//! - Primitive codecs (A.3, A.4): fixed-width integers, byte strings,
//!   byte-alignment padding, booleans, and the modified exp-Golomb
//!   variable-length integer codes.
//!
//! # Example
//!
//! ```
//! use vc2stream_io::{BitReader, BitWriter};
//!
//! let mut out = Vec::new();
//! let mut w = BitWriter::new(&mut out);
//! w.write_uint(1)?;
//! w.write_sint(-1)?;
//! w.flush()?;
//!
//! let mut r = BitReader::new(&out);
//! assert_eq!(r.read_uint()?, 1);
//! assert_eq!(r.read_sint()?, -1);
//! # Ok::<(), vc2stream_io::BitstreamError>(())
//! ```

pub mod bits;
pub mod error;
pub mod exp_golomb;
pub mod offsets;
pub mod reader;
pub mod writer;

pub use bits::Bits;
pub use error::{BitstreamError, Result};
pub use exp_golomb::{sint_length, uint_length};
pub use offsets::{from_bit_offset, to_bit_offset, BitOffset};
pub use reader::BitReader;
pub use writer::BitWriter;
