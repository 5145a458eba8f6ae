//! The [`Serdes`] trait: one grammar description, many passes.

use vc2stream_io::Bits;
use vc2stream_slices::{HqSliceArray, LdSliceArray};

use crate::context::Value;
use crate::error::{Result, SerdesError};
use crate::token::{Token, TokenKind};

pub(crate) fn type_mismatch(target: &str, wanted: &'static str, got: &Value) -> SerdesError {
    SerdesError::ContextMismatch(format!(
        "target {target:?} holds a {} where a {wanted} is required",
        got.kind_name()
    ))
}

/// A serialisation pass a grammar description can drive.
///
/// Grammar functions are written once, generic over this trait, in the shape
/// of the VC-2 pseudocode; the implementation decides whether each call
/// reads from a bitstream, writes to one, measures bits or attributes
/// offsets. Every call returns the value it read or wrote so the grammar
/// can branch on it in any pass.
pub trait Serdes {
    /// Perform one token's worth of I/O and hand back its value.
    ///
    /// This is the raw protocol; grammars normally use the typed wrappers
    /// below.
    fn token(&mut self, token: Token) -> Result<Value>;

    /// Process the grammar fragment `f` inside a nested context stored at
    /// `target`.
    ///
    /// Generic over the error type so grammars layered above this crate can
    /// thread their own errors through nested calls.
    fn nested<E: From<SerdesError>>(
        &mut self,
        target: &'static str,
        f: impl FnOnce(&mut Self) -> std::result::Result<(), E>,
    ) -> std::result::Result<(), E>
    where
        Self: Sized;

    /// Process a low-delay slice array stored at `target`.
    ///
    /// `make` builds an array with the geometry implied by the bitstream
    /// values read so far; passes which consume an existing context use the
    /// stored array instead.
    fn ld_slice_array(
        &mut self,
        target: &'static str,
        make: impl FnOnce() -> LdSliceArray,
    ) -> Result<()>
    where
        Self: Sized;

    /// Process a high-quality slice array stored at `target`.
    fn hq_slice_array(
        &mut self,
        target: &'static str,
        make: impl FnOnce() -> HqSliceArray,
    ) -> Result<()>
    where
        Self: Sized;

    /// A fixed-width unsigned integer of `n` bits, as per read_nbits (A.3.3).
    fn nbits(&mut self, target: &'static str, n: u32) -> Result<u64> {
        match self.token(Token::new(TokenKind::NBits(n), target))? {
            Value::UInt(v) => Ok(v),
            other => Err(type_mismatch(target, "unsigned integer", &other)),
        }
    }

    /// A byte string of `n` bytes.
    fn nbytes(&mut self, target: &'static str, n: usize) -> Result<Vec<u8>> {
        match self.token(Token::new(TokenKind::NBytes(n), target))? {
            Value::Bytes(v) => Ok(v),
            other => Err(type_mismatch(target, "byte string", &other)),
        }
    }

    /// An unsigned exp-Golomb integer, as per read_uint (A.4.3).
    fn uint(&mut self, target: &'static str) -> Result<u64> {
        match self.token(Token::new(TokenKind::UInt, target))? {
            Value::UInt(v) => Ok(v),
            other => Err(type_mismatch(target, "unsigned integer", &other)),
        }
    }

    /// A signed exp-Golomb integer, as per read_sint (A.4.4).
    fn sint(&mut self, target: &'static str) -> Result<i64> {
        match self.token(Token::new(TokenKind::SInt, target))? {
            Value::SInt(v) => Ok(v),
            other => Err(type_mismatch(target, "signed integer", &other)),
        }
    }

    /// A single-bit boolean, as per read_bool (A.3.2).
    fn flag(&mut self, target: &'static str) -> Result<bool> {
        match self.token(Token::new(TokenKind::Bool, target))? {
            Value::Bool(v) => Ok(v),
            other => Err(type_mismatch(target, "boolean", &other)),
        }
    }

    /// Padding up to the next byte boundary, as per byte_align (A.2.4).
    ///
    /// The bits crossed (discarded on read, emitted on write) are kept at
    /// `target` so realignment round-trips bit-exactly.
    fn byte_align(&mut self, target: &'static str) -> Result<Bits> {
        match self.token(Token::new(TokenKind::ByteAlign, target))? {
            Value::Bits(v) => Ok(v),
            other => Err(type_mismatch(target, "bit string", &other)),
        }
    }

    /// Open a bounded block of `length` bits (A.4.2).
    fn bounded_block_begin(&mut self, length: u64) -> Result<()> {
        self.token(Token::untargeted(TokenKind::BoundedBlockBegin(length)))?;
        Ok(())
    }

    /// Close the bounded block; the unused tail of the block is carried as
    /// a padding bit string at `target`.
    fn bounded_block_end(&mut self, target: &'static str) -> Result<Bits> {
        match self.token(Token::new(TokenKind::BoundedBlockEnd, target))? {
            Value::Bits(v) => Ok(v),
            other => Err(type_mismatch(target, "bit string", &other)),
        }
    }
}
