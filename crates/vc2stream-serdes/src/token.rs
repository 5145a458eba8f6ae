//! The token protocol between grammars and drivers.

use serde::{Deserialize, Serialize};

/// What a grammar asks the driver to read or write next.
///
/// Arguments that the pseudocode passes alongside the token kind (field
/// widths, block lengths) are carried in the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    /// A fixed-width unsigned integer of the given number of bits.
    NBits(u32),
    /// A byte string of the given length.
    NBytes(usize),
    /// An unsigned exp-Golomb integer.
    UInt,
    /// A signed exp-Golomb integer.
    SInt,
    /// A single-bit boolean.
    Bool,
    /// Padding up to the next byte boundary.
    ByteAlign,
    /// Open a bounded block of the given number of bits.
    BoundedBlockBegin(u64),
    /// Close the bounded block, carrying its unused bits as padding.
    BoundedBlockEnd,
}

/// A single step of a grammar: a token kind plus the context target the
/// value belongs to.
///
/// `BoundedBlockBegin` produces no value and carries no target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub target: Option<&'static str>,
}

impl Token {
    pub fn new(kind: TokenKind, target: &'static str) -> Self {
        Token {
            kind,
            target: Some(target),
        }
    }

    pub fn untargeted(kind: TokenKind) -> Self {
        Token { kind, target: None }
    }
}
