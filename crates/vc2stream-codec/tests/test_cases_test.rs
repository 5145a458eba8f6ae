//! Boundary test-case generation: values that probe bounded block edges.

use vc2stream_io::{BitReader, BitWriter};
use vc2stream_serdes::Deserializer;
use vc2stream_codec::test_cases::{
    dangling_transform_values, exp_golomb_with_length, make_dummy_end_of_sequence, DanglingKind,
};
use vc2stream_codec::{parse_sequence, ParseCode, State};

/// Write `values` into a bounded block of `block_bits` and report which
/// value first crossed the end of the block and by how many bits.
fn first_value_beyond_end(values: &[i64], block_bits: u64) -> (i64, i64) {
    let mut out = Vec::new();
    let mut w = BitWriter::new(&mut out);
    w.bounded_block_begin(block_bits).unwrap();
    for &value in values {
        w.write_sint(value).unwrap();
    }
    // The block must be filled to the bit and overrun
    assert_eq!(w.tell().to_bits(), block_bits);
    assert!(w.bits_remaining().unwrap() < 0);
    w.bounded_block_end().unwrap();
    w.flush().unwrap();

    let mut r = BitReader::new(&out);
    r.bounded_block_begin(block_bits).unwrap();
    let mut value_beyond = None;
    while r.bits_remaining().unwrap() >= 0 {
        let value = r.read_sint().unwrap();
        value_beyond = Some((value, -r.bits_remaining().unwrap()));
    }
    value_beyond.unwrap()
}

#[test]
fn dangling_values_cross_the_block_end_each_way() {
    for (block_bits, num_values, magnitude) in
        [(8u64, 4usize, 1u32), (16, 4, 1), (16, 4, 4), (8, 10, 1), (24, 6, 2)]
    {
        for kind in DanglingKind::ALL {
            let values =
                dangling_transform_values(block_bits, num_values, kind, magnitude).unwrap();
            assert_eq!(values.len(), num_values);

            let (value, bits_beyond) = first_value_beyond_end(&values, block_bits);
            match kind {
                DanglingKind::ZeroDangling => {
                    assert_eq!(value, 0);
                    assert_eq!(bits_beyond, 1);
                }
                DanglingKind::SignDangling => {
                    assert_eq!((-value).ilog2() + 1, magnitude);
                    assert_eq!(bits_beyond, 1);
                }
                DanglingKind::StopAndSignDangling => {
                    assert_eq!((-value).ilog2() + 1, magnitude);
                    assert_eq!(bits_beyond, 2);
                }
                DanglingKind::LsbStopAndSignDangling => {
                    // One magnitude bit larger, so a data bit can dangle
                    assert_eq!((-value).ilog2() + 1, magnitude + 1);
                    assert_eq!(bits_beyond, 3);
                }
            }
        }
    }
}

#[test]
fn dangling_values_respect_impossible_geometry() {
    // No values at all: nothing can dangle
    for kind in DanglingKind::ALL {
        assert!(dangling_transform_values(8, 0, kind, 1).is_err());
    }

    // A sign-dangling code of magnitude 1 needs 3 bits inside the block
    assert!(dangling_transform_values(0, 1, DanglingKind::SignDangling, 1).is_err());
    assert!(dangling_transform_values(3, 1, DanglingKind::SignDangling, 1).is_ok());
}

#[test]
fn filled_blocks_sum_exactly() {
    // Values fill a 488 bit block with 16 coefficients to the bit
    let values = exp_golomb_with_length(16, 488).unwrap();
    let mut w = BitWriter::new(Vec::new());
    w.bounded_block_begin(488).unwrap();
    for &value in &values {
        w.write_sint(value).unwrap();
    }
    assert_eq!(w.bits_remaining(), Some(0));
}

#[test]
fn dummy_end_of_sequence_deserialises() {
    let bytes = make_dummy_end_of_sequence().unwrap();
    assert_eq!(bytes.len(), 13);

    let mut reader = BitReader::new(&bytes);
    let mut des = Deserializer::new(&mut reader);
    let mut state = State::default();
    parse_sequence(&mut des, &mut state).unwrap();
    assert_eq!(state.parse_code, ParseCode::EndOfSequence);

    let sequence = des.finish().unwrap();
    assert_eq!(sequence.get("data_units").unwrap().len(), 1);
}
