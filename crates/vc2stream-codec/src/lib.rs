//! The VC-2 (SMPTE ST 2042-1) bitstream grammar.
//!
//! This crate expresses the VC-2 data unit grammar as functions over the
//! [`Serdes`](vc2stream_serdes::Serdes) trait, one per pseudocode function
//! of SMPTE ST 2042-1, so a single description deserialises, serialises,
//! measures and attributes every stream:
//!
//! ```
//! use vc2stream_io::BitReader;
//! use vc2stream_serdes::Deserializer;
//! use vc2stream_codec::{parse_sequence, State};
//!
//! // A sequence holding a lone end-of-sequence data unit
//! let bytes = [0x42, 0x42, 0x43, 0x44, 0x10, 0, 0, 0, 0, 0, 0, 0, 0];
//! let mut reader = BitReader::new(&bytes);
//! let mut des = Deserializer::new(&mut reader);
//! let mut state = State::default();
//! parse_sequence(&mut des, &mut state)?;
//! let sequence = des.finish().unwrap();
//! assert_eq!(sequence.get("data_units").unwrap().len(), 1);
//! # Ok::<(), vc2stream_codec::CodecError>(())
//! ```
//!
//! Alongside the grammar live the stream [`State`], the constant tables,
//! the data unit [registry](crate::registry), and
//! [test-case helpers](crate::test_cases) for conformance streams that
//! probe bounded-block boundaries.

pub mod autofill;
pub mod error;
pub mod grammar;
pub mod registry;
pub mod state;
pub mod tables;
pub mod test_cases;

pub use autofill::autofill_parse_offsets;
pub use error::{CodecError, Result};
pub use grammar::{
    auxiliary_data, data_unit, fragment_parse, parse_info, parse_sequence, picture_parse,
    sequence_header, transform_parameters,
};
pub use registry::{data_unit_info, default_data_unit, DataUnitInfo, DataUnitKind};
pub use state::{State, VideoParameters};
pub use tables::{BaseVideoFormat, ParseCode, Profile, PARSE_INFO_PREFIX};

use vc2stream_io::{BitReader, BitWriter};
use vc2stream_serdes::{Context, Deserializer, Serializer};

/// Deserialise a whole sequence, returning the context tree, the final
/// stream state and the count of bits read past the end of the stream.
pub fn deserialize_sequence(bytes: &[u8]) -> Result<(Context, State, u64)> {
    let mut reader = BitReader::new(bytes);
    let mut des = Deserializer::new(&mut reader);
    let mut state = State::default();
    parse_sequence(&mut des, &mut state)?;
    let past_eof = des.bits_past_eof();
    let context = des.finish()?;
    Ok((context, state, past_eof))
}

/// Serialise a whole sequence context, returning the bytes and the context
/// handed back by the writing pass.
pub fn serialize_sequence(context: Context) -> Result<(Vec<u8>, Context)> {
    let mut out = Vec::new();
    let mut writer = BitWriter::new(&mut out);
    let mut ser = Serializer::new(&mut writer, context);
    let mut state = State::default();
    parse_sequence(&mut ser, &mut state)?;
    let context = ser.finish()?;
    writer.flush()?;
    Ok((out, context))
}
