//! Conformance test-case construction helpers.
//!
//! Decoder conformance streams need values that land exactly on bounded
//! block boundaries: exp-Golomb codes whose total length fills a block to
//! the bit, and codes whose final bits dangle past the end of a block in
//! each of the distinct ways the coding allows. These helpers construct
//! such value sets, plus a few whole-stream conveniences.

use thiserror::Error;

use vc2stream_io::{sint_length, BitWriter};
use vc2stream_serdes::{Context, Serializer, Value};

use crate::error::Result;
use crate::grammar::parse_sequence;
use crate::registry::{default_data_unit, DataUnitKind};
use crate::state::State;

/// No combination of exp-Golomb codes can meet the requested size.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cannot encode {num_values} exp-Golomb value(s) in exactly {total_bits} bit(s)")]
pub struct UnsatisfiableBlockSize {
    pub num_values: usize,
    pub total_bits: u64,
}

/// Signed exp-Golomb values of strictly ascending code length: 0 (1 bit),
/// then the largest magnitude of each even length (4, 6, 8, ... bits).
///
/// Negative `sign` yields non-positive values.
pub fn exp_golomb_with_ascending_lengths(sign: i64) -> impl Iterator<Item = (u64, i64)> {
    std::iter::once((1, 0)).chain((1u32..63).map(move |m| {
        let magnitude = (1i64 << m) - 1;
        let value = if sign < 0 { -magnitude } else { magnitude };
        (sint_length(value), value)
    }))
}

/// Signed values whose exp-Golomb codes sum to exactly `total_bits`.
///
/// Code lengths are spread as evenly as possible, with the larger codes
/// first and any left-over positions filled with zeros; non-zero values
/// alternate in sign starting positive. Fails when no combination of
/// signed code lengths (1, 4, 6, 8, ...) can hit the total.
pub fn exp_golomb_with_length(
    num_values: usize,
    total_bits: u64,
) -> std::result::Result<Vec<i64>, UnsatisfiableBlockSize> {
    let unsat = UnsatisfiableBlockSize {
        num_values,
        total_bits,
    };

    let n = num_values as u64;
    if total_bits < n {
        return Err(unsat);
    }
    let surplus = total_bits - n;
    if surplus == 0 {
        return Ok(vec![0; num_values]);
    }

    // Each non-zero value adds an odd number of bits (>= 3) over the 1 bit
    // a zero costs. The largest workable count of non-zero values gives
    // the most even spread.
    let mut nonzero = n.min(surplus / 3);
    while nonzero > 0 && nonzero % 2 != surplus % 2 {
        nonzero -= 1;
    }
    if nonzero == 0 {
        return Err(unsat);
    }

    let mut values = Vec::with_capacity(num_values);
    let mut left = surplus;
    for i in 0..nonzero {
        let slots_after = nonzero - i - 1;
        let mut extra = left.div_ceil(nonzero - i);
        if extra % 2 == 0 {
            extra += 1;
        }
        extra = extra.max(3).min(left - 3 * slots_after);
        debug_assert!(extra >= 3 && extra % 2 == 1);
        left -= extra;

        // A code of 1 + extra bits carries magnitudes up to 2^(extra/2) - 1
        let magnitude = (1i64 << ((extra - 1) / 2)) - 1;
        let value = if i % 2 == 0 { magnitude } else { -magnitude };
        values.push(value);
    }
    debug_assert_eq!(left, 0);

    values.resize(num_values, 0);
    debug_assert_eq!(
        values.iter().map(|&v| sint_length(v)).sum::<u64>(),
        total_bits
    );
    Ok(values)
}

/// The distinct ways a signed exp-Golomb code can dangle past the end of a
/// bounded block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DanglingKind {
    /// A whole zero code (its lone stop bit) lies past the end.
    ZeroDangling,
    /// Only the sign bit lies past the end.
    SignDangling,
    /// The stop bit and sign bit lie past the end.
    StopAndSignDangling,
    /// The last magnitude bit, stop bit and sign bit lie past the end.
    LsbStopAndSignDangling,
}

impl DanglingKind {
    pub const ALL: [DanglingKind; 4] = [
        DanglingKind::ZeroDangling,
        DanglingKind::SignDangling,
        DanglingKind::StopAndSignDangling,
        DanglingKind::LsbStopAndSignDangling,
    ];
}

/// `num_values` signed values which, written into a bounded block of
/// `block_bits`, make one code cross the end of the block in the requested
/// way. Values after the dangling one are zeros whose codes fall entirely
/// past the end (legal, since a zero's code is a single `1` bit).
pub fn dangling_transform_values(
    block_bits: u64,
    num_values: usize,
    kind: DanglingKind,
    magnitude: u32,
) -> std::result::Result<Vec<i64>, UnsatisfiableBlockSize> {
    let unsat = UnsatisfiableBlockSize {
        num_values,
        total_bits: block_bits,
    };
    if num_values == 0 || magnitude == 0 || magnitude > 61 {
        return Err(unsat);
    }

    // Every dangling bit must be a 1 (a 0 cannot be written past a block
    // end): the stop and sign bits always are, and for the dangling-LSB
    // shape the magnitude 2^(m+1)-2 makes every code bit a 1 too.
    let (value, bits_past_end) = match kind {
        DanglingKind::ZeroDangling => (0i64, 1u64),
        DanglingKind::SignDangling => (-((1i64 << magnitude) - 1), 1),
        DanglingKind::StopAndSignDangling => (-((1i64 << magnitude) - 1), 2),
        DanglingKind::LsbStopAndSignDangling => (-((1i64 << (magnitude + 1)) - 2), 3),
    };

    let code_length = sint_length(value);
    debug_assert!(code_length >= bits_past_end);
    let bits_inside = code_length - bits_past_end;
    if bits_inside > block_bits {
        return Err(unsat);
    }

    // Earlier values fill the block right up to where the dangling code
    // must start; prefer using as many of them as possible.
    let prefix_bits = block_bits - bits_inside;
    for prefix_count in (0..num_values).rev() {
        if let Ok(mut values) = exp_golomb_with_length(prefix_count, prefix_bits) {
            values.push(value);
            values.resize(num_values, 0);
            return Ok(values);
        }
    }
    Err(unsat)
}

/// A minimal serialised sequence holding a single end-of-sequence data
/// unit; handy as a trailer when splicing test streams together.
pub fn make_dummy_end_of_sequence() -> Result<Vec<u8>> {
    let mut context = Context::new();
    context.append(
        "data_units",
        Value::Context(default_data_unit(DataUnitKind::EndOfSequence)),
    );

    let mut out = Vec::new();
    let mut writer = BitWriter::new(&mut out);
    let mut ser = Serializer::new(&mut writer, context);
    parse_sequence(&mut ser, &mut State::default())?;
    ser.finish()?;
    writer.flush()?;
    Ok(out)
}

/// Copy a deserialised sequence, replacing the payload of every padding
/// data unit with `bytes`.
pub fn replace_padding_data(sequence: &Context, bytes: &[u8]) -> Context {
    let mut sequence = sequence.clone();
    if let Some(units) = sequence.get_mut("data_units") {
        for unit in units {
            let Value::Context(unit) = unit else { continue };
            if let Some(padding_values) = unit.get_mut("padding") {
                for padding_unit in padding_values {
                    let Value::Context(padding_unit) = padding_unit else {
                        continue;
                    };
                    padding_unit.set("bytes", vec![Value::Bytes(bytes.to_vec())]);
                }
            }
        }
    }
    sequence
}
