//! Bounded block (A.4.2) semantics on both the reader and the writer.

use vc2stream_io::{BitOffset, BitReader, BitWriter, BitstreamError};

#[test]
fn reader_bounded_block() {
    let mut r = BitReader::new(&[0xA0]);

    r.bounded_block_begin(4).unwrap();

    // No nesting
    assert!(matches!(
        r.bounded_block_begin(1),
        Err(BitstreamError::NestedBoundedBlock)
    ));

    assert_eq!(r.read_bit(), 1);
    assert_eq!(r.bits_remaining(), Some(3));
    assert_eq!(r.tell(), BitOffset::new(0, 6));

    assert_eq!(r.read_bit(), 0);
    assert_eq!(r.read_bit(), 1);
    assert_eq!(r.read_bit(), 0);
    assert_eq!(r.bits_remaining(), Some(0));
    assert_eq!(r.tell(), BitOffset::new(0, 3));

    // Past the end of the block: all ones, position frozen
    assert_eq!(r.read_bit(), 1);
    assert_eq!(r.bits_remaining(), Some(-1));
    assert_eq!(r.tell(), BitOffset::new(0, 3));

    assert_eq!(r.read_bit(), 1);
    assert_eq!(r.bits_remaining(), Some(-2));
    assert_eq!(r.tell(), BitOffset::new(0, 3));

    // Fully consumed block reports no unused bits
    assert_eq!(r.bounded_block_end().unwrap(), 0);

    // No double close
    assert!(matches!(
        r.bounded_block_end(),
        Err(BitstreamError::NotInBoundedBlock)
    ));

    // Back outside the block the underlying stream continues
    assert_eq!(r.read_bit(), 0);
    assert_eq!(r.bits_remaining(), None);
    assert_eq!(r.tell(), BitOffset::new(0, 2));

    // An untouched block reports all its bits unused
    r.bounded_block_begin(3).unwrap();
    assert_eq!(r.bounded_block_end().unwrap(), 3);
}

#[test]
fn reader_bounded_block_seek() {
    let mut r = BitReader::new(&[0xA0]);

    r.bounded_block_begin(4).unwrap();
    assert_eq!(r.tell(), BitOffset::new(0, 7));
    assert_eq!(r.bits_remaining(), Some(4));

    // Seeking to the current position is fine
    r.seek(BitOffset::new(0, 7)).unwrap();
    assert_eq!(r.bits_remaining(), Some(4));

    // Seeking to the end of the block is fine
    r.seek(BitOffset::new(0, 3)).unwrap();
    assert_eq!(r.bits_remaining(), Some(0));

    // And back again
    r.seek(BitOffset::new(0, 4)).unwrap();
    assert_eq!(r.bits_remaining(), Some(1));

    // Overrun the block, then re-seek to its end: the overrun is kept
    assert_eq!(r.read_nbits(5).unwrap(), 0b01111);
    assert_eq!(r.tell(), BitOffset::new(0, 3));
    assert_eq!(r.bits_remaining(), Some(-4));
    r.seek(BitOffset::new(0, 3)).unwrap();
    assert_eq!(r.bits_remaining(), Some(-4));

    // Moving back before the end adjusts the count again
    r.seek(BitOffset::new(0, 4)).unwrap();
    assert_eq!(r.bits_remaining(), Some(1));

    // Seeking past the end of the block is refused
    assert!(matches!(
        r.seek(BitOffset::new(0, 2)),
        Err(BitstreamError::SeekBeyondBoundedBlock)
    ));
    assert_eq!(r.tell(), BitOffset::new(0, 4));
    assert_eq!(r.bits_remaining(), Some(1));
}

#[test]
fn writer_bounded_block_discards_ones() {
    let mut out = Vec::new();
    let mut w = BitWriter::new(&mut out);

    w.bounded_block_begin(4).unwrap();
    assert!(matches!(
        w.bounded_block_begin(1),
        Err(BitstreamError::NestedBoundedBlock)
    ));

    for bit in [1, 0, 1, 0] {
        assert_eq!(w.write_bit(bit).unwrap(), 1);
    }
    assert_eq!(w.bits_remaining(), Some(0));

    // A 1 past the end is dropped and counted
    assert_eq!(w.write_bit(1).unwrap(), 0);
    assert_eq!(w.bits_past_eob(), 1);
    assert_eq!(w.bits_remaining(), Some(-1));
    assert_eq!(w.tell(), BitOffset::new(0, 3));

    // A 0 past the end cannot be represented
    assert!(matches!(
        w.write_bit(0),
        Err(BitstreamError::BoundedBlockOverflow)
    ));

    assert_eq!(w.bounded_block_end().unwrap(), 0);
    w.flush().unwrap();
    assert_eq!(out, vec![0xA0]);
}

#[test]
fn writer_unused_block_bits_are_reported() {
    let mut w = BitWriter::new(Vec::new());
    w.bounded_block_begin(12).unwrap();
    w.write_nbits(4, 0xA).unwrap();
    assert_eq!(w.bounded_block_end().unwrap(), 8);
}

#[test]
fn value_truncated_by_block_round_trips_with_padding() {
    // Spec scenario 7: v = 0xABFF written as nbits(12) into an 8 bit block
    // leaves 0xAB in the stream with 4 bits past the end.
    let mut out = Vec::new();
    let mut w = BitWriter::new(&mut out);
    w.bounded_block_begin(8).unwrap();
    w.write_nbits(12, 0xABF).unwrap();
    assert_eq!(w.bits_past_eob(), 4);
    w.bounded_block_end().unwrap();
    w.flush().unwrap();
    assert_eq!(out, vec![0xAB]);

    // Reading the same block back recovers the value because the lost bits
    // re-appear as synthetic 1s.
    let mut r = BitReader::new(&out);
    r.bounded_block_begin(8).unwrap();
    assert_eq!(r.read_nbits(12).unwrap(), 0xABF);
    assert_eq!(r.bounded_block_end().unwrap(), 0);
}
