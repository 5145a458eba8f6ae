//! Filling in the parse offset fields of a sequence.
//!
//! `next_parse_offset` and `previous_parse_offset` are byte distances
//! between consecutive parse_info headers. When a sequence context is built
//! by hand they are rarely known up front; this pass measures each data
//! unit with the bit-counting driver and rewrites the offsets so the
//! sequence serialises self-consistently.

use tracing::debug;

use vc2stream_serdes::{BitCounter, Context, Value};

use crate::error::{CodecError, Result};
use crate::grammar::data_unit;
use crate::state::State;
use crate::tables::{ParseCode, PARSE_INFO_HEADER_BYTES};

/// Measure every data unit of `sequence` and fill in its
/// `next_parse_offset` and `previous_parse_offset` fields.
///
/// Auxiliary-data and padding units have their `next_parse_offset` derived
/// from their payload length first (the payload size is itself defined by
/// the offset, so measuring cannot bootstrap it). The final end-of-sequence
/// unit keeps a zero `next_parse_offset`, as streams conventionally leave
/// it.
pub fn autofill_parse_offsets(sequence: &mut Context) -> Result<()> {
    let Some(units) = sequence.get_mut("data_units") else {
        return Ok(());
    };

    // Payload-defined offsets must be consistent before measuring
    for unit in units.iter_mut() {
        let Value::Context(unit) = unit else { continue };
        fixup_payload_defined_offset(unit);
    }

    let unit_count = units.len();
    let mut state = State::default();
    let mut previous_length: u64 = 0;
    for index in 0..unit_count {
        let Some(Value::Context(unit)) = sequence
            .get_mut("data_units")
            .and_then(|units| units.get_mut(index))
        else {
            continue;
        };

        // Measure the whole unit, parse_info included, threading the state
        // so geometry-dependent payloads size correctly
        let mut counter = BitCounter::new(unit.clone());
        data_unit(&mut counter, &mut state)?;
        let length_bytes = counter.bit_length().div_ceil(8);
        counter.finish().map_err(CodecError::from)?;
        debug!(index, length_bytes, "measured data unit");

        if let Some(parse_info) = unit_parse_info(unit) {
            if state.parse_code != ParseCode::EndOfSequence
                && !payload_defines_offset(state.parse_code)
            {
                parse_info.set("next_parse_offset", vec![Value::UInt(length_bytes)]);
            }
            parse_info.set("previous_parse_offset", vec![Value::UInt(previous_length)]);
        }
        previous_length = length_bytes;
    }
    Ok(())
}

fn payload_defines_offset(parse_code: ParseCode) -> bool {
    matches!(
        parse_code,
        ParseCode::AuxiliaryData | ParseCode::PaddingData
    )
}

fn unit_parse_info(unit: &mut Context) -> Option<&mut Context> {
    match unit.get_mut("parse_info")?.first_mut()? {
        Value::Context(parse_info) => Some(parse_info),
        _ => None,
    }
}

/// Auxiliary-data and padding units: set `next_parse_offset` from the
/// payload length.
fn fixup_payload_defined_offset(unit: &mut Context) {
    let payload_len = ["auxiliary_data", "padding"]
        .iter()
        .find_map(|target| unit.get(target))
        .and_then(|values| values.first())
        .and_then(|value| value.as_context())
        .and_then(|payload| payload.single("bytes"))
        .and_then(|value| value.as_bytes())
        .map(|bytes| bytes.len() as u64);

    if let (Some(payload_len), Some(parse_info)) = (payload_len, unit_parse_info(unit)) {
        parse_info.set(
            "next_parse_offset",
            vec![Value::UInt(payload_len + PARSE_INFO_HEADER_BYTES)],
        );
    }
}
