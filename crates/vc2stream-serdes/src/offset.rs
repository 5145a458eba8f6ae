//! Bit-offset attribution: which field does a given bit belong to?
//!
//! Replays a grammar against a context, tracking where each token's bits
//! would land in the serialised stream, and reports the `(target, index)`
//! whose span contains a queried offset. Bits that a bounded block clips
//! off belong to no token; the unused tail of a block belongs to its
//! padding target, as do the bits `byte_align` introduces. This is what
//! lets inspection tools map byte positions back to semantic field names.

use vc2stream_io::{sint_length, uint_length, BitstreamError};
use vc2stream_slices::{HqSliceArray, LdSliceArray};

use crate::consume::ContextConsumer;
use crate::context::{Context, Value};
use crate::error::{Result, SerdesError};
use crate::serdes::{type_mismatch, Serdes};
use crate::token::{Token, TokenKind};

/// Map a bit offset in the stream a grammar would serialise to the target
/// (and index within that target's sequence) it falls in.
pub fn target_at_offset<F>(context: Context, offset: u64, grammar: F) -> Result<(String, usize)>
where
    F: FnOnce(&mut TargetAtOffset) -> Result<()>,
{
    let mut pass = TargetAtOffset::new(context, offset);
    grammar(&mut pass)?;
    pass.finish()
}

/// The attribution pass itself; normally used through [`target_at_offset`].
pub struct TargetAtOffset {
    consumer: ContextConsumer,
    position: u64,
    block_end: Option<u64>,
    query: u64,
    found: Option<(String, usize)>,
}

impl TargetAtOffset {
    pub fn new(context: Context, query: u64) -> Self {
        TargetAtOffset {
            consumer: ContextConsumer::new(context),
            position: 0,
            block_end: None,
            query,
            found: None,
        }
    }

    /// The attribution result, or `OffsetOutOfRange` if the queried offset
    /// lies past the end of the serialised stream.
    pub fn finish(self) -> Result<(String, usize)> {
        self.consumer.finish()?;
        self.found.ok_or(SerdesError::OffsetOutOfRange(self.query))
    }

    /// Record a value of `width` bits at `target`, clamped to the active
    /// bounded block.
    fn attribute(&mut self, target: &str, index: usize, width: u64) {
        let end = match self.block_end {
            Some(block_end) => (self.position + width).min(block_end),
            None => self.position + width,
        };
        if self.found.is_none() && (self.position..end).contains(&self.query) {
            self.found = Some((target.to_string(), index));
        }
        self.position = end;
    }

    fn alignment_gap(&self) -> u64 {
        (8 - self.position % 8) % 8
    }
}

impl Serdes for TargetAtOffset {
    fn token(&mut self, token: Token) -> Result<Value> {
        let target = token.target.unwrap_or_default();
        let value = match token.kind {
            TokenKind::NBits(n) => {
                let (index, value) = self.consumer.next_indexed(target)?;
                let Value::UInt(v) = *value else {
                    return Err(type_mismatch(target, "unsigned integer", value));
                };
                self.attribute(target, index, n as u64);
                Value::UInt(v)
            }
            TokenKind::NBytes(n) => {
                let (index, value) = self.consumer.next_indexed(target)?;
                let Value::Bytes(bytes) = value else {
                    return Err(type_mismatch(target, "byte string", value));
                };
                let bytes = bytes.clone();
                self.attribute(target, index, 8 * n as u64);
                Value::Bytes(bytes)
            }
            TokenKind::UInt => {
                let (index, value) = self.consumer.next_indexed(target)?;
                let Value::UInt(v) = *value else {
                    return Err(type_mismatch(target, "unsigned integer", value));
                };
                self.attribute(target, index, uint_length(v));
                Value::UInt(v)
            }
            TokenKind::SInt => {
                let (index, value) = self.consumer.next_indexed(target)?;
                let Value::SInt(v) = *value else {
                    return Err(type_mismatch(target, "signed integer", value));
                };
                self.attribute(target, index, sint_length(v));
                Value::SInt(v)
            }
            TokenKind::Bool => {
                let (index, value) = self.consumer.next_indexed(target)?;
                let Value::Bool(v) = *value else {
                    return Err(type_mismatch(target, "boolean", value));
                };
                self.attribute(target, index, 1);
                Value::Bool(v)
            }
            TokenKind::ByteAlign => {
                let (index, value) = self.consumer.next_indexed(target)?;
                let Value::Bits(bits) = value else {
                    return Err(type_mismatch(target, "bit string", value));
                };
                let bits = bits.clone();
                let gap = self.alignment_gap();
                self.attribute(target, index, gap);
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
                let (index, value) = self.consumer.next_indexed(target)?;
                let Value::Bits(bits) = value else {
                    return Err(type_mismatch(target, "bit string", value));
                };
                let bits = bits.clone();
                let end = self
                    .block_end
                    .take()
                    .ok_or(BitstreamError::NotInBoundedBlock)?;
                // The unused tail of the block is the padding's span
                if self.found.is_none() && (self.position..end).contains(&self.query) {
                    self.found = Some((target.to_string(), index));
                }
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
        let (index, value) = self.consumer.next_indexed(target)?;
        let Value::LdSlices(array) = value else {
            return Err(type_mismatch(target, "low-delay slice array", value));
        };
        let length = array.bit_length();
        self.attribute(target, index, length);
        Ok(())
    }

    fn hq_slice_array(
        &mut self,
        target: &'static str,
        _make: impl FnOnce() -> HqSliceArray,
    ) -> Result<()> {
        let (index, value) = self.consumer.next_indexed(target)?;
        let Value::HqSlices(array) = value else {
            return Err(type_mismatch(target, "high-quality slice array", value));
        };
        let length = array.bit_length();
        self.attribute(target, index, length);
        Ok(())
    }
}
