//! The measuring pass: context tree in, bit count out.

use vc2stream_io::{sint_length, uint_length, BitstreamError};
use vc2stream_slices::{HqSliceArray, LdSliceArray};

use crate::consume::ContextConsumer;
use crate::context::{Context, Value};
use crate::error::{Result, SerdesError};
use crate::serdes::{type_mismatch, Serdes};
use crate::token::{Token, TokenKind};

/// Drives a grammar as a measuring pass: values are consumed exactly as the
/// serialiser consumes them, but nothing is written; only the total bit
/// length is accumulated. Useful for preflight length computations such as
/// `next_parse_offset`.
pub struct BitCounter {
    consumer: ContextConsumer,
    position: u64,
    block_end: Option<u64>,
}

impl BitCounter {
    pub fn new(context: Context) -> Self {
        BitCounter {
            consumer: ContextConsumer::new(context),
            position: 0,
            block_end: None,
        }
    }

    /// Bits the grammar has produced so far.
    pub fn bit_length(&self) -> u64 {
        self.position
    }

    /// Complete the pass, handing the context back.
    pub fn finish(self) -> Result<Context> {
        if self.block_end.is_some() {
            return Err(SerdesError::UnclosedBoundedBlock);
        }
        self.consumer.finish()
    }

    /// Advance by a value of `width` bits, clamped to an active bounded
    /// block (bits past the block end produce no output).
    fn advance(&mut self, width: u64) {
        match self.block_end {
            Some(end) => self.position = (self.position + width).min(end),
            None => self.position += width,
        }
    }

    fn alignment_gap(&self) -> u64 {
        (8 - self.position % 8) % 8
    }
}

impl Serdes for BitCounter {
    fn token(&mut self, token: Token) -> Result<Value> {
        let target = token.target.unwrap_or_default();
        let value = match token.kind {
            TokenKind::NBits(n) => {
                let v = self.consumer.next_uint(target)?;
                self.advance(n as u64);
                Value::UInt(v)
            }
            TokenKind::NBytes(n) => {
                let value = self.consumer.next_value(target)?;
                let Value::Bytes(bytes) = value else {
                    return Err(type_mismatch(target, "byte string", value));
                };
                let bytes = bytes.clone();
                self.advance(8 * n as u64);
                Value::Bytes(bytes)
            }
            TokenKind::UInt => {
                let v = self.consumer.next_uint(target)?;
                self.advance(uint_length(v));
                Value::UInt(v)
            }
            TokenKind::SInt => {
                let v = self.consumer.next_sint(target)?;
                self.advance(sint_length(v));
                Value::SInt(v)
            }
            TokenKind::Bool => {
                let v = self.consumer.next_bool(target)?;
                self.advance(1);
                Value::Bool(v)
            }
            TokenKind::ByteAlign => {
                let value = self.consumer.next_value(target)?;
                let Value::Bits(bits) = value else {
                    return Err(type_mismatch(target, "bit string", value));
                };
                let bits = bits.clone();
                let gap = self.alignment_gap();
                self.advance(gap);
                Value::Bits(bits)
            }
            TokenKind::BoundedBlockBegin(length) => {
                if self.block_end.is_some() {
                    return Err(BitstreamError::NestedBoundedBlock.into());
                }
                self.block_end = Some(self.position + length);
                return Ok(Value::UInt(length));
            }
            TokenKind::BoundedBlockEnd => {
                let value = self.consumer.next_value(target)?;
                let Value::Bits(bits) = value else {
                    return Err(type_mismatch(target, "bit string", value));
                };
                let bits = bits.clone();
                let end = self
                    .block_end
                    .take()
                    .ok_or(BitstreamError::NotInBoundedBlock)?;
                self.position = end;
                Value::Bits(bits)
            }
        };
        Ok(value)
    }

    fn nested<E: From<SerdesError>>(
        &mut self,
        target: &'static str,
        f: impl FnOnce(&mut Self) -> std::result::Result<(), E>,
    ) -> std::result::Result<(), E> {
        self.consumer.enter_nested(target).map_err(E::from)?;
        f(self)?;
        self.consumer.exit_nested().map_err(E::from)
    }

    fn ld_slice_array(
        &mut self,
        target: &'static str,
        _make: impl FnOnce() -> LdSliceArray,
    ) -> Result<()> {
        let value = self.consumer.next_value(target)?;
        let Value::LdSlices(array) = value else {
            return Err(type_mismatch(target, "low-delay slice array", value));
        };
        let length = array.bit_length();
        self.advance(length);
        Ok(())
    }

    fn hq_slice_array(
        &mut self,
        target: &'static str,
        _make: impl FnOnce() -> HqSliceArray,
    ) -> Result<()> {
        let value = self.consumer.next_value(target)?;
        let Value::HqSlices(array) = value else {
            return Err(type_mismatch(target, "high-quality slice array", value));
        };
        let length = array.bit_length();
        self.advance(length);
        Ok(())
    }
}
