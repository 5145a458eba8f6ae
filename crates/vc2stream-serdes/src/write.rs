//! The serialisation pass: context tree in, bitstream out.

use std::io::Write;

use tracing::trace;

use vc2stream_io::BitWriter;
use vc2stream_slices::{HqSliceArray, LdSliceArray};

use crate::consume::ContextConsumer;
use crate::context::{Context, Value};
use crate::error::{Result, SerdesError};
use crate::serdes::{type_mismatch, Serdes};
use crate::token::{Token, TokenKind};

/// Drives a grammar as a writing pass over a supplied context.
///
/// Each token pops the next unused value of its target and writes it with
/// the corresponding primitive. A missing, surplus or ill-typed value is a
/// [`SerdesError::ContextMismatch`]; surplus values are detected when the
/// pass is [`finish`](Serializer::finish)ed.
pub struct Serializer<'w, W: Write> {
    writer: &'w mut BitWriter<W>,
    consumer: ContextConsumer,
}

impl<'w, W: Write> Serializer<'w, W> {
    pub fn new(writer: &'w mut BitWriter<W>, context: Context) -> Self {
        Serializer {
            writer,
            consumer: ContextConsumer::new(context),
        }
    }

    /// `1` bits dropped at bounded block boundaries so far.
    pub fn bits_past_eob(&self) -> u64 {
        self.writer.bits_past_eob()
    }

    /// Complete the pass, handing the context back.
    ///
    /// Fails if a bounded block is still open or any supplied value was
    /// never consumed. The writer is *not* flushed; callers flush when the
    /// whole stream is done.
    pub fn finish(self) -> Result<Context> {
        if self.writer.bits_remaining().is_some() {
            return Err(SerdesError::UnclosedBoundedBlock);
        }
        self.consumer.finish()
    }
}

impl<W: Write> Serdes for Serializer<'_, W> {
    fn token(&mut self, token: Token) -> Result<Value> {
        let value = match token.kind {
            TokenKind::NBits(n) => {
                let target = token.target.unwrap_or_default();
                let v = self.consumer.next_uint(target)?;
                self.writer.write_nbits(n, v)?;
                Value::UInt(v)
            }
            TokenKind::NBytes(n) => {
                let target = token.target.unwrap_or_default();
                let value = self.consumer.next_value(target)?;
                let Value::Bytes(bytes) = value else {
                    return Err(type_mismatch(target, "byte string", value));
                };
                let bytes = bytes.clone();
                self.writer.write_nbytes(n, &bytes)?;
                Value::Bytes(bytes)
            }
            TokenKind::UInt => {
                let target = token.target.unwrap_or_default();
                let v = self.consumer.next_uint(target)?;
                self.writer.write_uint(v)?;
                Value::UInt(v)
            }
            TokenKind::SInt => {
                let target = token.target.unwrap_or_default();
                let v = self.consumer.next_sint(target)?;
                self.writer.write_sint(v)?;
                Value::SInt(v)
            }
            TokenKind::Bool => {
                let target = token.target.unwrap_or_default();
                let v = self.consumer.next_bool(target)?;
                self.writer.write_bool(v)?;
                Value::Bool(v)
            }
            TokenKind::ByteAlign => {
                let target = token.target.unwrap_or_default();
                let value = self.consumer.next_value(target)?;
                let Value::Bits(bits) = value else {
                    return Err(type_mismatch(target, "bit string", value));
                };
                let bits = bits.clone();
                let gap = (8 - self.writer.tell().to_bits() % 8) % 8;
                self.writer.write_bits(&bits, gap)?;
                Value::Bits(bits)
            }
            TokenKind::BoundedBlockBegin(length) => {
                self.writer.bounded_block_begin(length)?;
                return Ok(Value::UInt(length));
            }
            TokenKind::BoundedBlockEnd => {
                let target = token.target.unwrap_or_default();
                let value = self.consumer.next_value(target)?;
                let Value::Bits(bits) = value else {
                    return Err(type_mismatch(target, "bit string", value));
                };
                let bits = bits.clone();
                let unused = self.writer.bits_remaining().unwrap_or(0).max(0) as u64;
                self.writer.write_bits(&bits, unused)?;
                self.writer.bounded_block_end()?;
                Value::Bits(bits)
            }
        };

        trace!(?token, %value, "write");
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
        array.write(self.writer)?;
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
        array.write(self.writer)?;
        Ok(())
    }
}
