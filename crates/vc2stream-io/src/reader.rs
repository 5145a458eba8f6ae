//! Bit-level reader with past-EOF synthesis and bounded blocks.

use tracing::trace;

use crate::bits::Bits;
use crate::error::{BitstreamError, Result};
use crate::offsets::{to_bit_offset, BitOffset};

/// Bit budget of an active bounded block.
///
/// `bits_remaining` goes negative once the block has been overrun; each
/// excess read costs one more tick but leaves the underlying position alone.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BoundedRegion {
    pub(crate) bits_remaining: i64,
}

/// Bit reader over an in-memory byte stream.
///
/// Bits are consumed MSB-first within each byte. Reading past the end of the
/// stream is not an error: each missing bit is synthesised as `1` and counted
/// in [`bits_past_eof`](BitReader::bits_past_eof), as VC-2 requires. Reads
/// past the end of an active bounded block also synthesise `1`s but are
/// tallied separately in [`bits_past_eob`](BitReader::bits_past_eob) and
/// leave the underlying position untouched.
#[derive(Debug)]
pub struct BitReader<'a> {
    data: &'a [u8],
    byte_offset: usize,
    /// Bits already consumed from the current byte (0-7, 0 = MSB next).
    bit_offset: u8,
    bits_past_eof: u64,
    bits_past_eob: u64,
    bounded: Option<BoundedRegion>,
}

impl<'a> BitReader<'a> {
    /// Create a reader positioned at the first bit of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        BitReader {
            data,
            byte_offset: 0,
            bit_offset: 0,
            bits_past_eof: 0,
            bits_past_eob: 0,
            bounded: None,
        }
    }

    /// The offset of the next bit to be read. `(0, 7)` on a fresh reader.
    pub fn tell(&self) -> BitOffset {
        BitOffset::new(self.byte_offset, 7 - self.bit_offset)
    }

    /// Total number of synthetic `1` bits returned for reads past the end
    /// of the byte stream.
    pub fn bits_past_eof(&self) -> u64 {
        self.bits_past_eof
    }

    /// Total number of synthetic `1` bits returned for reads past the end
    /// of a bounded block (cumulative across blocks).
    pub fn bits_past_eob(&self) -> u64 {
        self.bits_past_eob
    }

    /// True once the next read would fall past the last byte of the stream.
    pub fn is_end_of_stream(&self) -> bool {
        self.byte_offset >= self.data.len()
    }

    /// Remaining bit budget of the active bounded block, if any.
    ///
    /// Negative once the block has been overrun.
    pub fn bits_remaining(&self) -> Option<i64> {
        self.bounded.map(|b| b.bits_remaining)
    }

    /// Read the next bit.
    ///
    /// Returns `1` for bits past the end of the stream (ticking
    /// [`bits_past_eof`]) or past the end of an active bounded block
    /// (ticking [`bits_past_eob`] and leaving the position untouched).
    ///
    /// [`bits_past_eof`]: BitReader::bits_past_eof
    /// [`bits_past_eob`]: BitReader::bits_past_eob
    pub fn read_bit(&mut self) -> u8 {
        if let Some(region) = &mut self.bounded {
            if region.bits_remaining < 1 {
                region.bits_remaining -= 1;
                self.bits_past_eob += 1;
                return 1;
            }
            region.bits_remaining -= 1;
        }

        if self.byte_offset >= self.data.len() {
            self.bits_past_eof += 1;
            return 1;
        }

        let bit = (self.data[self.byte_offset] >> (7 - self.bit_offset)) & 1;
        self.bit_offset += 1;
        if self.bit_offset == 8 {
            self.bit_offset = 0;
            self.byte_offset += 1;
        }
        bit
    }

    /// As [`read_bit`](BitReader::read_bit) but raising
    /// [`BitstreamError::EndOfStream`] instead of synthesising a bit, for
    /// callers needing strict EOF detection.
    pub fn read_bit_strict(&mut self) -> Result<u8> {
        if self.bounded.is_none() && self.is_end_of_stream() {
            return Err(BitstreamError::EndOfStream(self.tell().to_bits()));
        }
        Ok(self.read_bit())
    }

    /// Reposition the reader.
    ///
    /// Seeking past the end of the stream is allowed; subsequent reads
    /// synthesise `1`s. Within a bounded block the target must not lie beyond
    /// the block's end; moving backwards re-extends the remaining budget,
    /// while re-seeking to the end of an already-overrun block leaves the
    /// overrun count untouched.
    pub fn seek(&mut self, offset: BitOffset) -> Result<()> {
        let target = offset.to_bits();

        if let Some(region) = &mut self.bounded {
            let current = to_bit_offset(self.byte_offset, 7 - self.bit_offset);
            let end = current + region.bits_remaining.max(0) as u64;
            if target > end {
                return Err(BitstreamError::SeekBeyondBoundedBlock);
            }
            if target < end || region.bits_remaining > 0 {
                region.bits_remaining = (end - target) as i64;
            }
        }

        self.byte_offset = offset.byte;
        self.bit_offset = 7 - offset.bit;
        Ok(())
    }

    /// Begin a bounded block of `length` bits. Blocks do not nest.
    pub fn bounded_block_begin(&mut self, length: u64) -> Result<()> {
        if self.bounded.is_some() {
            return Err(BitstreamError::NestedBoundedBlock);
        }
        trace!(length, "bounded block begin");
        self.bounded = Some(BoundedRegion {
            bits_remaining: length as i64,
        });
        Ok(())
    }

    /// End the active bounded block, returning the number of unused bits
    /// (zero if the block was overrun).
    pub fn bounded_block_end(&mut self) -> Result<u64> {
        match self.bounded.take() {
            Some(region) => {
                trace!(
                    bits_remaining = region.bits_remaining,
                    "bounded block end"
                );
                Ok(region.bits_remaining.max(0) as u64)
            }
            None => Err(BitstreamError::NotInBoundedBlock),
        }
    }

    /// Read `n` bits (at most 64) MSB-first into an unsigned integer.
    pub fn read_nbits(&mut self, n: u32) -> Result<u64> {
        if n > 64 {
            return Err(BitstreamError::OutOfRange(format!(
                "cannot read {n} bits into a 64 bit integer"
            )));
        }
        let mut value: u64 = 0;
        for _ in 0..n {
            value = (value << 1) | self.read_bit() as u64;
        }
        Ok(value)
    }

    /// Read `n` bits of arbitrary length as a [`Bits`] string.
    pub fn read_bits(&mut self, n: u64) -> Bits {
        let mut bits = Bits::new();
        for _ in 0..n {
            bits.push(self.read_bit());
        }
        bits
    }

    /// Read `n` whole bytes. The reader need not be byte aligned.
    pub fn read_nbytes(&mut self, n: usize) -> Vec<u8> {
        (0..n)
            .map(|_| {
                let mut byte = 0u8;
                for _ in 0..8 {
                    byte = (byte << 1) | self.read_bit();
                }
                byte
            })
            .collect()
    }

    /// Read a single bit as a boolean.
    pub fn read_bool(&mut self) -> bool {
        self.read_bit() == 1
    }

    /// Advance to the next byte boundary, returning the discarded bits.
    ///
    /// A no-op (empty result) when already aligned. At end of stream the
    /// discarded bits are synthetic `1`s and tick the past-EOF counter. An
    /// exhausted bounded block pins the position, so alignment stops there
    /// rather than consuming synthetic bits forever.
    pub fn byte_align(&mut self) -> Bits {
        let mut bits = Bits::new();
        while !self.tell().is_byte_aligned() {
            if self.bits_remaining().is_some_and(|remaining| remaining <= 0) {
                break;
            }
            bits.push(self.read_bit());
        }
        bits
    }
}
