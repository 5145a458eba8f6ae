//! The process-wide data unit registry.
//!
//! One table maps each data unit kind to its parse codes, its payload
//! target within a `data_units` context, and a factory for a default
//! context that serialises to a valid (if minimal) data unit. Dispatch of
//! the grammar functions themselves happens in
//! [`data_unit`](crate::grammar::data_unit); Rust cannot store a function
//! generic over every [`Serdes`](vc2stream_serdes::Serdes) pass in a table,
//! so the registry carries the data and the match carries the code.

use once_cell::sync::Lazy;

use vc2stream_io::Bits;
use vc2stream_serdes::{Context, Value};
use vc2stream_slices::HqSliceArray;

use crate::state::State;
use crate::tables::{ParseCode, PARSE_INFO_PREFIX};

/// The closed set of data unit kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DataUnitKind {
    SequenceHeader,
    PictureParse,
    FragmentParse,
    AuxiliaryData,
    Padding,
    EndOfSequence,
}

impl DataUnitKind {
    pub fn from_parse_code(parse_code: ParseCode) -> DataUnitKind {
        match parse_code {
            ParseCode::SequenceHeader => DataUnitKind::SequenceHeader,
            ParseCode::EndOfSequence => DataUnitKind::EndOfSequence,
            ParseCode::AuxiliaryData => DataUnitKind::AuxiliaryData,
            ParseCode::PaddingData => DataUnitKind::Padding,
            ParseCode::LowDelayPicture | ParseCode::HighQualityPicture => {
                DataUnitKind::PictureParse
            }
            ParseCode::LowDelayPictureFragment | ParseCode::HighQualityPictureFragment => {
                DataUnitKind::FragmentParse
            }
        }
    }
}

/// Registry entry for one data unit kind.
pub struct DataUnitInfo {
    pub kind: DataUnitKind,
    /// Target of the payload context inside the data unit (`None` for
    /// end-of-sequence, which has no payload).
    pub target: Option<&'static str>,
    /// Parse codes that select this kind.
    pub parse_codes: &'static [ParseCode],
    /// Build a context that serialises to a minimal valid unit of this
    /// kind (picture and fragment defaults use the high-quality profile
    /// with an empty slice grid).
    pub default_context: fn() -> Context,
}

/// The data unit registry, built once per process.
pub static DATA_UNIT_REGISTRY: Lazy<Vec<DataUnitInfo>> = Lazy::new(|| {
    vec![
        DataUnitInfo {
            kind: DataUnitKind::SequenceHeader,
            target: Some("sequence_header"),
            parse_codes: &[ParseCode::SequenceHeader],
            default_context: default_sequence_header,
        },
        DataUnitInfo {
            kind: DataUnitKind::PictureParse,
            target: Some("picture_parse"),
            // First entry doubles as the parse code of the default context
            parse_codes: &[ParseCode::HighQualityPicture, ParseCode::LowDelayPicture],
            default_context: default_picture_parse,
        },
        DataUnitInfo {
            kind: DataUnitKind::FragmentParse,
            target: Some("fragment_parse"),
            parse_codes: &[
                ParseCode::HighQualityPictureFragment,
                ParseCode::LowDelayPictureFragment,
            ],
            default_context: default_fragment_parse,
        },
        DataUnitInfo {
            kind: DataUnitKind::AuxiliaryData,
            target: Some("auxiliary_data"),
            parse_codes: &[ParseCode::AuxiliaryData],
            default_context: default_auxiliary_data,
        },
        DataUnitInfo {
            kind: DataUnitKind::Padding,
            target: Some("padding"),
            parse_codes: &[ParseCode::PaddingData],
            default_context: default_auxiliary_data,
        },
        DataUnitInfo {
            kind: DataUnitKind::EndOfSequence,
            target: None,
            parse_codes: &[ParseCode::EndOfSequence],
            default_context: Context::new,
        },
    ]
});

/// Look up the registry entry for a kind.
pub fn data_unit_info(kind: DataUnitKind) -> &'static DataUnitInfo {
    DATA_UNIT_REGISTRY
        .iter()
        .find(|info| info.kind == kind)
        .expect("every kind is registered")
}

/// Default parse_info context announcing `parse_code`.
pub fn default_parse_info(parse_code: ParseCode) -> Context {
    let mut context = Context::new();
    context.append("padding", Value::Bits(Bits::new()));
    context.append("parse_info_prefix", Value::UInt(PARSE_INFO_PREFIX));
    context.append("parse_code", Value::UInt(parse_code.code() as u64));
    context.append("next_parse_offset", Value::UInt(0));
    context.append("previous_parse_offset", Value::UInt(0));
    context
}

/// Default whole data unit context for a kind: parse_info plus the kind's
/// default payload.
pub fn default_data_unit(kind: DataUnitKind) -> Context {
    let info = data_unit_info(kind);
    let mut context = Context::new();
    context.append(
        "parse_info",
        Value::Context(default_parse_info(info.parse_codes[0])),
    );
    if let Some(target) = info.target {
        context.append(target, Value::Context((info.default_context)()));
    }
    context
}

fn flag_only(name: &'static str) -> Context {
    let mut context = Context::new();
    context.append(name, Value::Bool(false));
    context
}

fn default_sequence_header() -> Context {
    let mut parse_parameters = Context::new();
    parse_parameters.append("major_version", Value::UInt(3));
    parse_parameters.append("minor_version", Value::UInt(0));
    parse_parameters.append("profile", Value::UInt(3));
    parse_parameters.append("level", Value::UInt(0));

    let mut video_parameters = Context::new();
    video_parameters.append(
        "frame_size",
        Value::Context(flag_only("custom_dimensions_flag")),
    );
    video_parameters.append(
        "color_diff_sampling_format",
        Value::Context(flag_only("custom_color_diff_format_flag")),
    );
    video_parameters.append(
        "scan_format",
        Value::Context(flag_only("custom_scan_format_flag")),
    );
    video_parameters.append(
        "frame_rate",
        Value::Context(flag_only("custom_frame_rate_flag")),
    );
    video_parameters.append(
        "pixel_aspect_ratio",
        Value::Context(flag_only("custom_pixel_aspect_ratio_flag")),
    );
    video_parameters.append(
        "clean_area",
        Value::Context(flag_only("custom_clean_area_flag")),
    );
    video_parameters.append(
        "signal_range",
        Value::Context(flag_only("custom_signal_range_flag")),
    );
    video_parameters.append(
        "color_spec",
        Value::Context(flag_only("custom_color_spec_flag")),
    );

    let mut context = Context::new();
    context.append("padding", Value::Bits(Bits::new()));
    context.append("parse_parameters", Value::Context(parse_parameters));
    context.append("base_video_format", Value::UInt(0));
    context.append("video_parameters", Value::Context(video_parameters));
    context.append("picture_coding_mode", Value::UInt(0));
    context
}

fn default_transform_parameters() -> Context {
    let mut extended = Context::new();
    extended.append("asym_transform_index_flag", Value::Bool(false));
    extended.append("asym_transform_flag", Value::Bool(false));

    let mut slice_parameters = Context::new();
    slice_parameters.append("slices_x", Value::UInt(0));
    slice_parameters.append("slices_y", Value::UInt(0));
    slice_parameters.append("slice_prefix_bytes", Value::UInt(0));
    slice_parameters.append("slice_size_scaler", Value::UInt(0));

    let mut context = Context::new();
    context.append("wavelet_index", Value::UInt(0));
    context.append("dwt_depth", Value::UInt(0));
    context.append("extended_transform_parameters", Value::Context(extended));
    context.append("slice_parameters", Value::Context(slice_parameters));
    context.append("quant_matrix", Value::Context(flag_only("custom_quant_matrix")));
    context
}

fn default_picture_parse() -> Context {
    let mut picture_header = Context::new();
    picture_header.append("picture_number", Value::UInt(0));

    let mut state = State::default();
    state.parse_code = ParseCode::HighQualityPicture;
    let mut wavelet_transform = Context::new();
    wavelet_transform.append(
        "transform_parameters",
        Value::Context(default_transform_parameters()),
    );
    wavelet_transform.append("padding", Value::Bits(Bits::new()));
    wavelet_transform.append(
        "hq_slice_array",
        Value::HqSlices(HqSliceArray::new(state.whole_picture_slice_params(), 0, 0)),
    );

    let mut context = Context::new();
    context.append("padding1", Value::Bits(Bits::new()));
    context.append("picture_header", Value::Context(picture_header));
    context.append("padding2", Value::Bits(Bits::new()));
    context.append("wavelet_transform", Value::Context(wavelet_transform));
    context
}

fn default_fragment_parse() -> Context {
    let mut fragment_header = Context::new();
    fragment_header.append("picture_number", Value::UInt(0));
    fragment_header.append("fragment_data_length", Value::UInt(0));
    fragment_header.append("fragment_slice_count", Value::UInt(0));

    let mut context = Context::new();
    context.append("padding1", Value::Bits(Bits::new()));
    context.append("fragment_header", Value::Context(fragment_header));
    context.append("padding2", Value::Bits(Bits::new()));
    context.append(
        "transform_parameters",
        Value::Context(default_transform_parameters()),
    );
    context
}

fn default_auxiliary_data() -> Context {
    let mut context = Context::new();
    context.append("padding", Value::Bits(Bits::new()));
    context.append("bytes", Value::Bytes(Vec::new()));
    context
}
