//! Property-based round-trip laws for the primitive codecs.

use proptest::prelude::*;

use vc2stream_io::{sint_length, uint_length, BitReader, BitWriter};

proptest! {
    /// Writing then reading an n-bit field yields the value back, for any
    /// width wide enough to hold it.
    #[test]
    fn nbits_round_trip(value: u64, extra in 0u32..8) {
        let width = (64 - value.leading_zeros() + extra).min(64);

        let mut out = Vec::new();
        let mut w = BitWriter::new(&mut out);
        w.write_nbits(width, value).unwrap();
        w.flush().unwrap();

        let mut r = BitReader::new(&out);
        prop_assert_eq!(r.read_nbits(width).unwrap(), value);
        prop_assert_eq!(r.bits_past_eof(), 0);
    }

    /// Writing a value into a field narrower than its magnitude is refused.
    #[test]
    fn nbits_narrow_field_is_out_of_range(value in 1u64..) {
        let width = 64 - value.leading_zeros() - 1;
        let mut w = BitWriter::new(Vec::new());
        prop_assert!(w.write_nbits(width, value).is_err());
    }

    /// uint round-trips and its encoded length matches 2*floor(log2(n+1))+1.
    #[test]
    fn uint_round_trip(value in 0u64..=u64::MAX - 1) {
        let mut out = Vec::new();
        let mut w = BitWriter::new(&mut out);
        w.write_uint(value).unwrap();
        let written = w.tell().to_bits();
        w.flush().unwrap();

        prop_assert_eq!(written, uint_length(value));

        let mut r = BitReader::new(&out);
        prop_assert_eq!(r.read_uint().unwrap(), value);
        prop_assert_eq!(r.tell().to_bits(), written);
    }

    /// sint round-trips; length is the uint length of |n| plus a sign bit
    /// for non-zero values.
    #[test]
    fn sint_round_trip(value: i64) {
        let mut out = Vec::new();
        let mut w = BitWriter::new(&mut out);
        w.write_sint(value).unwrap();
        let written = w.tell().to_bits();
        w.flush().unwrap();

        let expected = uint_length(value.unsigned_abs())
            + if value != 0 { 1 } else { 0 };
        prop_assert_eq!(written, expected);
        prop_assert_eq!(written, sint_length(value));

        let mut r = BitReader::new(&out);
        prop_assert_eq!(r.read_sint().unwrap(), value);
    }

    /// A stream of bits written bit-by-bit reads back identically.
    #[test]
    fn bit_for_bit_round_trip(bits in prop::collection::vec(0u8..=1, 0..256)) {
        let mut out = Vec::new();
        let mut w = BitWriter::new(&mut out);
        for &bit in &bits {
            w.write_bit(bit).unwrap();
        }
        w.flush().unwrap();

        let mut r = BitReader::new(&out);
        for &bit in &bits {
            prop_assert_eq!(r.read_bit(), bit);
        }
    }

    /// Reading never panics on arbitrary input, bounded block or not.
    #[test]
    fn reads_never_panic(data in prop::collection::vec(any::<u8>(), 0..64)) {
        let mut r = BitReader::new(&data);
        let _ = r.read_uint();
        let _ = r.read_sint();
        let _ = r.read_nbits(17);
        r.bounded_block_begin(9).unwrap();
        let _ = r.read_uint();
        let _ = r.bounded_block_end();
        let _ = r.read_nbytes(3);
    }
}
