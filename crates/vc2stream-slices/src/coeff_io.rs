//! Bounded-block coefficient I/O shared by the slice variants.
//!
//! Each coefficient block is a bounded region: coefficients that do not fit
//! dangle past the end as synthetic `1`s, and space the coefficients do not
//! use is preserved verbatim as a padding bit string.

use std::io::Write;

use vc2stream_io::{BitReader, BitWriter, Bits};

use crate::error::Result;

/// Read signed coefficients from a bounded block of `block_bits`, capturing
/// any unused tail of the block in `padding`.
pub(crate) fn read_coeff_block(
    r: &mut BitReader<'_>,
    block_bits: u64,
    coeffs: &mut [i64],
    padding: &mut Bits,
) -> Result<()> {
    r.bounded_block_begin(block_bits)?;
    for coeff in coeffs.iter_mut() {
        *coeff = r.read_sint()?;
    }
    let unused = r.bits_remaining().unwrap_or(0).max(0) as u64;
    *padding = r.read_bits(unused);
    r.bounded_block_end()?;
    Ok(())
}

/// As [`read_coeff_block`] but with two interleaved coefficient streams
/// (low-delay colour difference: c1 then c2 per sample position).
pub(crate) fn read_interleaved_coeff_block(
    r: &mut BitReader<'_>,
    block_bits: u64,
    c1_coeffs: &mut [i64],
    c2_coeffs: &mut [i64],
    padding: &mut Bits,
) -> Result<()> {
    debug_assert_eq!(c1_coeffs.len(), c2_coeffs.len());
    r.bounded_block_begin(block_bits)?;
    for (c1, c2) in c1_coeffs.iter_mut().zip(c2_coeffs.iter_mut()) {
        *c1 = r.read_sint()?;
        *c2 = r.read_sint()?;
    }
    let unused = r.bits_remaining().unwrap_or(0).max(0) as u64;
    *padding = r.read_bits(unused);
    r.bounded_block_end()?;
    Ok(())
}

/// Write signed coefficients into a bounded block of `block_bits`, filling
/// the unused tail from `padding` (right-aligned, zero-extended).
pub(crate) fn write_coeff_block<W: Write>(
    w: &mut BitWriter<W>,
    block_bits: u64,
    coeffs: &[i64],
    padding: &Bits,
) -> Result<()> {
    w.bounded_block_begin(block_bits)?;
    for &coeff in coeffs {
        w.write_sint(coeff)?;
    }
    let unused = w.bits_remaining().unwrap_or(0).max(0) as u64;
    w.write_bits(padding, unused)?;
    w.bounded_block_end()?;
    Ok(())
}

/// Interleaved-stream counterpart of [`write_coeff_block`].
pub(crate) fn write_interleaved_coeff_block<W: Write>(
    w: &mut BitWriter<W>,
    block_bits: u64,
    c1_coeffs: &[i64],
    c2_coeffs: &[i64],
    padding: &Bits,
) -> Result<()> {
    debug_assert_eq!(c1_coeffs.len(), c2_coeffs.len());
    w.bounded_block_begin(block_bits)?;
    for (&c1, &c2) in c1_coeffs.iter().zip(c2_coeffs) {
        w.write_sint(c1)?;
        w.write_sint(c2)?;
    }
    let unused = w.bits_remaining().unwrap_or(0).max(0) as u64;
    w.write_bits(padding, unused)?;
    w.bounded_block_end()?;
    Ok(())
}
