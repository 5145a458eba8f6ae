//! Coded picture round trips: transform parameters plus slice payloads.

use vc2stream_io::{BitReader, BitWriter};
use vc2stream_serdes::{target_at_offset, BitCounter, Context, Deserializer, Serializer, Value};
use vc2stream_codec::{picture_parse, CodecError, ParseCode, State};

/// State as a sequence header for an 8x4 4:2:0 stream leaves it. With a
/// 2x1 slice grid each slice covers 4x4 luma and 2x2 colour-diff samples.
fn picture_state(parse_code: ParseCode) -> State {
    State {
        major_version: 3,
        minor_version: 0,
        parse_code,
        luma_width: 8,
        luma_height: 4,
        color_diff_width: 4,
        color_diff_height: 2,
        ..State::default()
    }
}

fn read_picture(bytes: &[u8], parse_code: ParseCode) -> (Context, State, u64) {
    let mut reader = BitReader::new(bytes);
    let mut des = Deserializer::new(&mut reader);
    let mut state = picture_state(parse_code);
    picture_parse(&mut des, &mut state).unwrap();
    let past_eof = des.bits_past_eof();
    (des.finish().unwrap(), state, past_eof)
}

fn write_picture(context: Context, parse_code: ParseCode) -> Vec<u8> {
    let mut out = Vec::new();
    let mut writer = BitWriter::new(&mut out);
    let mut ser = Serializer::new(&mut writer, context);
    let mut state = picture_state(parse_code);
    picture_parse(&mut ser, &mut state).unwrap();
    ser.finish().unwrap();
    writer.flush().unwrap();
    out
}

/// The high-quality slice payload: two slices with 2 prefix bytes each and
/// a slice size scaler of 3.
fn hq_slice_payload() -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&[0xDE, 0xAD, 0x0A, 0x03]);
    out.extend_from_slice(&[0x22; 8]);
    out.push(0x81);
    out.push(0x02);
    out.extend_from_slice(&[0x02; 4]);
    out.extend_from_slice(&[0x80, 0x01]);
    out.push(0x02);
    out.extend_from_slice(&[0x03; 4]);
    out.extend_from_slice(&[0x80, 0x01]);
    out.extend_from_slice(&[0xBE, 0xEF, 0x0B, 0x00, 0x00, 0x00]);
    out
}

/// A high-quality picture: zero picture number; wavelet_index 0, depth 0,
/// no asymmetric transform; 2x1 slices, 2 prefix bytes, scaler 3, default
/// quant matrix; five alignment zeros; then the slice payload.
fn hq_picture_bytes() -> Vec<u8> {
    let mut out = vec![0, 0, 0, 0];
    out.extend_from_slice(&[0xC6, 0x58, 0x40]);
    out.extend(hq_slice_payload());
    out
}

#[test]
fn hq_picture_reads_and_reserialises() {
    let bytes = hq_picture_bytes();
    let (context, state, past_eof) = read_picture(&bytes, ParseCode::HighQualityPicture);
    assert_eq!(past_eof, 0);

    // Slice parameters flowed into the state
    assert_eq!((state.slices_x, state.slices_y), (2, 1));
    assert_eq!(state.slice_prefix_bytes, 2);
    assert_eq!(state.slice_size_scaler, 3);

    // The slice array landed in the tree with its data intact
    let wavelet = context
        .single("wavelet_transform")
        .unwrap()
        .as_context()
        .unwrap();
    let Some(Value::HqSlices(slices)) = wavelet.single("hq_slice_array") else {
        panic!("expected a high-quality slice array");
    };
    assert_eq!(slices.qindex(0, 0), 10);
    assert_eq!(slices.qindex(1, 0), 11);
    assert_eq!(slices.prefix_bytes(0, 0), &[0xDE, 0xAD]);
    assert_eq!(slices.prefix_bytes(1, 0), &[0xBE, 0xEF]);

    // Writing the tree back reproduces the bytes exactly
    assert_eq!(
        write_picture(context.clone(), ParseCode::HighQualityPicture),
        bytes
    );

    // The measuring pass agrees without touching a writer
    let mut counter = BitCounter::new(context.clone());
    let mut state = picture_state(ParseCode::HighQualityPicture);
    picture_parse(&mut counter, &mut state).unwrap();
    assert_eq!(counter.bit_length(), bytes.len() as u64 * 8);
    counter.finish().unwrap();

    // Offsets attribute to semantic fields: the picture number first, the
    // slice data after the aligned transform parameters
    let lookup = |offset: u64| {
        let mut state = picture_state(ParseCode::HighQualityPicture);
        target_at_offset(context.clone(), offset, |s| {
            picture_parse(s, &mut state).map_err(|e| match e {
                CodecError::Serdes(e) => e,
                other => panic!("{other}"),
            })
        })
        .unwrap()
    };
    assert_eq!(lookup(0).0, "picture_number");
    assert_eq!(lookup(31).0, "picture_number");
    assert_eq!(lookup(32).0, "wavelet_index");
    // The transform parameters end 51 bits in; five alignment bits follow
    assert_eq!(lookup(53).0, "padding");
    assert_eq!(lookup(56).0, "hq_slice_array");
    assert_eq!(lookup(bytes.len() as u64 * 8 - 1).0, "hq_slice_array");
}

/// The low-delay slice payload: 127/2 bytes per slice, two slices.
fn ld_slice_payload() -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&[0x14, 0x05]);
    out.extend_from_slice(&[0x2B, 0x3B, 0x3B, 0x3B, 0x3C]);
    out.extend_from_slice(&[0x00; 55]);
    out.push(0x01);
    out.extend_from_slice(&[0x17, 0xE7]);
    out.extend_from_slice(&[0x22; 8]);
    out.push(0x80);
    out.extend_from_slice(&[0x00; 51]);
    out.extend_from_slice(&[0x02, 0xCF]);
    out
}

/// A low-delay picture: wavelet_index 0, depth 0, no asymmetric transform;
/// 2x1 slices of 127/2 bytes; three alignment zeros; the slice payload.
fn ld_picture_bytes() -> Vec<u8> {
    let mut out = vec![0, 0, 0, 0];
    out.extend_from_slice(&[0xC6, 0x40, 0x00, 0xB0]);
    out.extend(ld_slice_payload());
    out
}

#[test]
fn ld_picture_reads_and_reserialises() {
    let bytes = ld_picture_bytes();
    let (context, state, _) = read_picture(&bytes, ParseCode::LowDelayPicture);

    assert_eq!((state.slices_x, state.slices_y), (2, 1));
    assert_eq!(state.slice_bytes_numerator, 127);
    assert_eq!(state.slice_bytes_denominator, 2);

    let wavelet = context
        .single("wavelet_transform")
        .unwrap()
        .as_context()
        .unwrap();
    let Some(Value::LdSlices(slices)) = wavelet.single("ld_slice_array") else {
        panic!("expected a low-delay slice array");
    };
    assert_eq!(slices.qindex(0, 0), 10);
    assert_eq!(slices.qindex(1, 0), 11);
    assert_eq!(slices.slice_y_length(0, 0), 5);
    assert_eq!(slices.slice_y_length(1, 0), 487);

    assert_eq!(
        write_picture(context, ParseCode::LowDelayPicture),
        bytes
    );
}
