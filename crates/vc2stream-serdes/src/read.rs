//! The deserialisation pass: bitstream in, context tree out.

use tracing::trace;

use vc2stream_io::BitReader;
use vc2stream_slices::{HqSliceArray, LdSliceArray};

use crate::context::{Context, Value};
use crate::error::{Result, SerdesError};
use crate::serdes::Serdes;
use crate::token::{Token, TokenKind};

/// Drives a grammar as a reading pass.
///
/// Each token executes the corresponding primitive read and appends the
/// value to the context under the token's target; repeated targets grow
/// their sequence in read order. Reading past the end of the stream is not
/// an error: the synthetic bits are tallied and available from
/// [`bits_past_eof`](Deserializer::bits_past_eof).
pub struct Deserializer<'r, 'a> {
    reader: &'r mut BitReader<'a>,
    stack: Vec<Context>,
}

impl<'r, 'a> Deserializer<'r, 'a> {
    pub fn new(reader: &'r mut BitReader<'a>) -> Self {
        Deserializer {
            reader,
            stack: vec![Context::new()],
        }
    }

    fn current(&mut self) -> &mut Context {
        self.stack.last_mut().expect("context stack is never empty")
    }

    /// Total synthetic bits consumed past the end of the byte stream.
    pub fn bits_past_eof(&self) -> u64 {
        self.reader.bits_past_eof()
    }

    /// Total synthetic bits consumed past bounded block ends.
    pub fn bits_past_eob(&self) -> u64 {
        self.reader.bits_past_eob()
    }

    /// Complete the pass, returning the context tree.
    ///
    /// Fails with [`SerdesError::UnclosedBoundedBlock`] if the grammar left
    /// a bounded block open.
    pub fn finish(mut self) -> Result<Context> {
        if self.reader.bits_remaining().is_some() {
            return Err(SerdesError::UnclosedBoundedBlock);
        }
        debug_assert_eq!(self.stack.len(), 1, "finish with nested contexts open");
        Ok(self.stack.pop().expect("context stack is never empty"))
    }
}

impl Serdes for Deserializer<'_, '_> {
    fn token(&mut self, token: Token) -> Result<Value> {
        let value = match token.kind {
            TokenKind::NBits(n) => Value::UInt(self.reader.read_nbits(n)?),
            TokenKind::NBytes(n) => Value::Bytes(self.reader.read_nbytes(n)),
            TokenKind::UInt => Value::UInt(self.reader.read_uint()?),
            TokenKind::SInt => Value::SInt(self.reader.read_sint()?),
            TokenKind::Bool => Value::Bool(self.reader.read_bool()),
            TokenKind::ByteAlign => Value::Bits(self.reader.byte_align()),
            TokenKind::BoundedBlockBegin(length) => {
                self.reader.bounded_block_begin(length)?;
                return Ok(Value::UInt(length));
            }
            TokenKind::BoundedBlockEnd => {
                let unused = self.reader.bits_remaining().unwrap_or(0).max(0) as u64;
                let padding = self.reader.read_bits(unused);
                self.reader.bounded_block_end()?;
                Value::Bits(padding)
            }
        };

        trace!(?token, %value, "read");
        if let Some(target) = token.target {
            self.current().append(target, value.clone());
        }
        Ok(value)
    }

    fn nested<E: From<SerdesError>>(
        &mut self,
        target: &'static str,
        f: impl FnOnce(&mut Self) -> std::result::Result<(), E>,
    ) -> std::result::Result<(), E> {
        self.stack.push(Context::new());
        let result = f(self);
        let child = self.stack.pop().expect("context stack is never empty");
        result?;
        self.current().append(target, Value::Context(child));
        Ok(())
    }

    fn ld_slice_array(
        &mut self,
        target: &'static str,
        make: impl FnOnce() -> LdSliceArray,
    ) -> Result<()> {
        let mut array = make();
        array.read(self.reader)?;
        self.current().append(target, Value::LdSlices(array));
        Ok(())
    }

    fn hq_slice_array(
        &mut self,
        target: &'static str,
        make: impl FnOnce() -> HqSliceArray,
    ) -> Result<()> {
        let mut array = make();
        array.read(self.reader)?;
        self.current().append(target, Value::HqSlices(array));
        Ok(())
    }
}
