//! High-quality slice array round trips against a hand-built bitstream.

use vc2stream_io::{BitOffset, BitReader, BitWriter, Bits};
use vc2stream_slices::{Component, HqSliceArray, SliceArrayParams};

fn params() -> SliceArrayParams {
    SliceArrayParams {
        luma_width: 16,
        luma_height: 8,
        color_diff_width: 8,
        color_diff_height: 4,
        dwt_depth: 0,
        dwt_depth_ho: 0,
        slices_x: 4,
        slices_y: 2,
        start_sx: 0,
        start_sy: 0,
        slice_count: 2,
    }
}

fn array() -> HqSliceArray {
    // Two prefix bytes per slice, slice_size_scaler of three
    HqSliceArray::new(params(), 2, 3)
}

/// A sample high-quality bitstream containing two slices:
///
/// - slice 0: prefix 0xDEAD, qindex 10, all Y coefficients 1 (9 byte block,
///   length field 3), all C1 coefficients 7 and all C2 coefficients -7
///   (6 byte blocks, length fields 2), padding pattern 0b100...001;
/// - slice 1: prefix 0xBEEF, qindex 11, zero-length blocks everywhere.
fn example_bitstream() -> Vec<u8> {
    let mut out = Vec::new();

    // Slice 0: prefix, qindex, slice_y_length
    out.extend_from_slice(&[0xDE, 0xAD, 0x0A, 0x03]);
    // y_coeffs: sixteen 1s (0b0010 each) then 8 bits of padding
    out.extend_from_slice(&[0x22; 8]);
    out.push(0x81);
    // slice_c1_length then four 7s (0b00000010 each) and 16 bits of padding
    out.push(0x02);
    out.extend_from_slice(&[0x02; 4]);
    out.extend_from_slice(&[0x80, 0x01]);
    // slice_c2_length then four -7s (0b00000011 each) and 16 bits of padding
    out.push(0x02);
    out.extend_from_slice(&[0x03; 4]);
    out.extend_from_slice(&[0x80, 0x01]);

    // Slice 1: prefix, qindex, three zero length fields
    out.extend_from_slice(&[0xBE, 0xEF, 0x0B, 0x00, 0x00, 0x00]);

    out
}

#[test]
fn read_recovers_the_example_fields() {
    let mut a = array();
    let bytes = example_bitstream();
    let mut r = BitReader::new(&bytes);
    a.read(&mut r).unwrap();

    assert_eq!(r.tell(), BitOffset::new(bytes.len(), 7));
    assert_eq!(r.bits_past_eof(), 0);

    assert_eq!(a.prefix_bytes(0, 0), &[0xDE, 0xAD]);
    assert_eq!(a.prefix_bytes(1, 0), &[0xBE, 0xEF]);
    assert_eq!(a.qindex(0, 0), 10);
    assert_eq!(a.qindex(1, 0), 11);
    assert_eq!(a.slice_length(Component::Y, 0, 0), 3);
    assert_eq!(a.slice_length(Component::C1, 0, 0), 2);
    assert_eq!(a.slice_length(Component::C2, 0, 0), 2);
    assert_eq!(a.slice_length(Component::Y, 1, 0), 0);

    let mut expected_y = vec![0i64; 32];
    for coeff in expected_y.iter_mut().take(16) {
        *coeff = 1;
    }
    assert_eq!(a.coeffs(Component::Y), &expected_y[..]);
    assert_eq!(a.coeffs(Component::C1), &[7, 7, 7, 7, 0, 0, 0, 0]);
    assert_eq!(a.coeffs(Component::C2), &[-7, -7, -7, -7, 0, 0, 0, 0]);

    assert_eq!(*a.block_padding(Component::Y, 0, 0), Bits::from_int(0x81, 8));
    assert_eq!(
        *a.block_padding(Component::C1, 0, 0),
        Bits::from_int(0x8001, 16)
    );
    assert_eq!(
        *a.block_padding(Component::C2, 0, 0),
        Bits::from_int(0x8001, 16)
    );
    assert!(a.block_padding(Component::Y, 1, 0).is_empty());
}

#[test]
fn write_reproduces_the_example_bit_for_bit() {
    let mut a = array();
    let bytes = example_bitstream();
    a.read(&mut BitReader::new(&bytes)).unwrap();

    let mut out = Vec::new();
    let mut w = BitWriter::new(&mut out);
    a.write(&mut w).unwrap();
    w.flush().unwrap();
    assert_eq!(out, bytes);
}

#[test]
fn bit_length_matches_the_bitstream() {
    let mut a = array();
    let bytes = example_bitstream();
    a.read(&mut BitReader::new(&bytes)).unwrap();
    assert_eq!(a.bit_length(), bytes.len() as u64 * 8);
}

#[test]
fn view_accessors_mirror_the_array() {
    let mut a = array();
    a.set_prefix_bytes(0, 0, vec![0xAA]);
    a.set_prefix_bytes(1, 0, vec![0xBB]);
    a.set_slice_length(Component::Y, 0, 0, 10);
    a.set_slice_length(Component::Y, 1, 0, 20);
    a.set_slice_length(Component::C1, 0, 0, 100);
    a.set_slice_length(Component::C2, 0, 0, 200);
    a.set_block_padding(Component::Y, 0, 0, Bits::from_int(0b101, 3));

    let view = a.slice_view(0, 0);
    assert_eq!(view.prefix_bytes(), &[0xAA]);
    assert_eq!(view.slice_length(Component::Y), 10);
    assert_eq!(view.slice_length(Component::C1), 100);
    assert_eq!(view.slice_length(Component::C2), 200);
    assert_eq!(*view.block_padding(Component::Y), Bits::from_int(0b101, 3));

    let view = a.slice_view(1, 0);
    assert_eq!(view.prefix_bytes(), &[0xBB]);
    assert_eq!(view.slice_length(Component::Y), 20);
}

#[test]
fn mutation_bumps_the_generation() {
    let mut a = array();

    let before = a.generation();
    a.set_qindex(0, 0, 5);
    assert!(a.generation() > before);

    let before = a.generation();
    a.slice_coeffs_mut(Component::Y, 0, 0)[0] = 42;
    assert!(a.generation() > before);
    assert_eq!(a.coeffs(Component::Y)[0], 42);

    let before = a.generation();
    a.set_block_padding(Component::C1, 1, 0, Bits::from_int(1, 1));
    assert!(a.generation() > before);
}
