//! The VC-2 bitstream grammar, one function per pseudocode function.
//!
//! Each function mirrors the structure of the corresponding pseudocode in
//! SMPTE ST 2042-1 and drives a [`Serdes`] pass, so the same description
//! deserialises, serialises, measures and attributes offsets. Functions
//! update the [`State`] with the values later grammar decisions depend on.

use tracing::debug;

use vc2stream_serdes::Serdes;
use vc2stream_slices::{num_subbands, HqSliceArray, LdSliceArray};

use crate::error::{CodecError, Result};
use crate::state::{State, VideoParameters};
use crate::tables::{ParseCode, PARSE_INFO_HEADER_BYTES};

/// The parse_info header (10.5.1).
pub fn parse_info<S: Serdes>(s: &mut S, state: &mut State) -> Result<()> {
    s.byte_align("padding")?;
    s.nbits("parse_info_prefix", 32)?;
    let code = s.nbits("parse_code", 8)? as u8;
    state.parse_code = ParseCode::from_code(code).ok_or(CodecError::UnknownParseCode(code))?;
    state.next_parse_offset = s.nbits("next_parse_offset", 32)?;
    state.previous_parse_offset = s.nbits("previous_parse_offset", 32)?;
    debug!(parse_code = ?state.parse_code, "parse info");
    Ok(())
}

/// The sequence header (11.1).
pub fn sequence_header<S: Serdes>(s: &mut S, state: &mut State) -> Result<()> {
    s.byte_align("padding")?;
    s.nested("parse_parameters", |s| parse_parameters(s, state))?;
    let base_video_format = s.uint("base_video_format")?;

    let mut video = VideoParameters::from_base_format(base_video_format);
    s.nested("video_parameters", |s| {
        source_parameters(s, &mut video)
    })?;

    let picture_coding_mode = s.uint("picture_coding_mode")?;
    state.set_coding_parameters(&video, picture_coding_mode);
    Ok(())
}

/// Stream version and profile (11.2.1).
pub fn parse_parameters<S: Serdes>(s: &mut S, state: &mut State) -> Result<()> {
    state.major_version = s.uint("major_version")?;
    state.minor_version = s.uint("minor_version")?;
    state.profile = s.uint("profile")?;
    state.level = s.uint("level")?;
    Ok(())
}

/// The source parameter overrides (11.4.1).
pub fn source_parameters<S: Serdes>(s: &mut S, video: &mut VideoParameters) -> Result<()> {
    s.nested("frame_size", |s| frame_size(s, video))?;
    s.nested("color_diff_sampling_format", |s| {
        color_diff_sampling_format(s, video)
    })?;
    s.nested("scan_format", |s| scan_format(s))?;
    s.nested("frame_rate", |s| frame_rate(s))?;
    s.nested("pixel_aspect_ratio", |s| pixel_aspect_ratio(s))?;
    s.nested("clean_area", |s| clean_area(s))?;
    s.nested("signal_range", |s| signal_range(s))?;
    s.nested("color_spec", |s| color_spec(s))?;
    Ok(())
}

/// Custom frame dimensions (11.4.3).
pub fn frame_size<S: Serdes>(s: &mut S, video: &mut VideoParameters) -> Result<()> {
    if s.flag("custom_dimensions_flag")? {
        video.frame_width = s.uint("frame_width")? as usize;
        video.frame_height = s.uint("frame_height")? as usize;
    }
    Ok(())
}

/// Custom colour difference sampling (11.4.4).
pub fn color_diff_sampling_format<S: Serdes>(
    s: &mut S,
    video: &mut VideoParameters,
) -> Result<()> {
    if s.flag("custom_color_diff_format_flag")? {
        video.color_diff_format_index = s.uint("color_diff_format_index")?;
    }
    Ok(())
}

/// Custom scan format (11.4.5).
pub fn scan_format<S: Serdes>(s: &mut S) -> Result<()> {
    if s.flag("custom_scan_format_flag")? {
        s.uint("source_sampling")?;
    }
    Ok(())
}

/// Custom frame rate (11.4.6).
pub fn frame_rate<S: Serdes>(s: &mut S) -> Result<()> {
    if s.flag("custom_frame_rate_flag")? {
        let index = s.uint("index")?;
        if index == 0 {
            s.uint("frame_rate_numer")?;
            s.uint("frame_rate_denom")?;
        }
    }
    Ok(())
}

/// Custom pixel aspect ratio (11.4.7).
pub fn pixel_aspect_ratio<S: Serdes>(s: &mut S) -> Result<()> {
    if s.flag("custom_pixel_aspect_ratio_flag")? {
        let index = s.uint("index")?;
        if index == 0 {
            s.uint("pixel_aspect_ratio_numer")?;
            s.uint("pixel_aspect_ratio_denom")?;
        }
    }
    Ok(())
}

/// Custom clean area (11.4.8).
pub fn clean_area<S: Serdes>(s: &mut S) -> Result<()> {
    if s.flag("custom_clean_area_flag")? {
        s.uint("clean_width")?;
        s.uint("clean_height")?;
        s.uint("left_offset")?;
        s.uint("top_offset")?;
    }
    Ok(())
}

/// Custom signal range (11.4.9).
pub fn signal_range<S: Serdes>(s: &mut S) -> Result<()> {
    if s.flag("custom_signal_range_flag")? {
        let index = s.uint("index")?;
        if index == 0 {
            s.uint("luma_offset")?;
            s.uint("luma_excursion")?;
            s.uint("color_diff_offset")?;
            s.uint("color_diff_excursion")?;
        }
    }
    Ok(())
}

/// Custom colour specification (11.4.10).
pub fn color_spec<S: Serdes>(s: &mut S) -> Result<()> {
    if s.flag("custom_color_spec_flag")? {
        let index = s.uint("index")?;
        if index == 0 {
            s.nested("color_primaries", |s| color_primaries(s))?;
            s.nested("color_matrix", |s| color_matrix(s))?;
            s.nested("transfer_function", |s| transfer_function(s))?;
        }
    }
    Ok(())
}

pub fn color_primaries<S: Serdes>(s: &mut S) -> Result<()> {
    if s.flag("custom_color_primaries_flag")? {
        s.uint("index")?;
    }
    Ok(())
}

pub fn color_matrix<S: Serdes>(s: &mut S) -> Result<()> {
    if s.flag("custom_color_matrix_flag")? {
        s.uint("index")?;
    }
    Ok(())
}

pub fn transfer_function<S: Serdes>(s: &mut S) -> Result<()> {
    if s.flag("custom_transfer_function_flag")? {
        s.uint("index")?;
    }
    Ok(())
}

/// A whole coded picture (12.1).
pub fn picture_parse<S: Serdes>(s: &mut S, state: &mut State) -> Result<()> {
    s.byte_align("padding1")?;
    s.nested("picture_header", |s| picture_header(s))?;
    s.byte_align("padding2")?;
    s.nested("wavelet_transform", |s| wavelet_transform(s, state))?;
    Ok(())
}

/// The picture number (12.2).
pub fn picture_header<S: Serdes>(s: &mut S) -> Result<()> {
    s.nbits("picture_number", 32)?;
    Ok(())
}

/// Transform parameters followed by the coefficient data (12.3).
pub fn wavelet_transform<S: Serdes>(s: &mut S, state: &mut State) -> Result<()> {
    s.nested("transform_parameters", |s| transform_parameters(s, state))?;
    s.byte_align("padding")?;
    transform_data(s, state)
}

/// Wavelet filter, depths, slice and quantisation parameters (12.4.1).
pub fn transform_parameters<S: Serdes>(s: &mut S, state: &mut State) -> Result<()> {
    s.uint("wavelet_index")?;
    state.dwt_depth = s.uint("dwt_depth")? as usize;

    if state.major_version >= 3 {
        s.nested("extended_transform_parameters", |s| {
            extended_transform_parameters(s, state)
        })?;
    } else {
        state.dwt_depth_ho = 0;
    }

    s.nested("slice_parameters", |s| slice_parameters(s, state))?;
    s.nested("quant_matrix", |s| quant_matrix(s, state))?;
    Ok(())
}

/// Asymmetric transform extensions, version 3 onwards (12.4.4).
pub fn extended_transform_parameters<S: Serdes>(s: &mut S, state: &mut State) -> Result<()> {
    if s.flag("asym_transform_index_flag")? {
        s.uint("wavelet_index_ho")?;
    }
    state.dwt_depth_ho = 0;
    if s.flag("asym_transform_flag")? {
        state.dwt_depth_ho = s.uint("dwt_depth_ho")? as usize;
    }
    Ok(())
}

/// The slice grid and per-profile slice sizing fields (12.4.5.2).
pub fn slice_parameters<S: Serdes>(s: &mut S, state: &mut State) -> Result<()> {
    state.slices_x = s.uint("slices_x")? as usize;
    state.slices_y = s.uint("slices_y")? as usize;

    if state.parse_code.is_low_delay() {
        state.slice_bytes_numerator = s.uint("slice_bytes_numerator")?;
        state.slice_bytes_denominator = s.uint("slice_bytes_denominator")?;
    } else {
        state.slice_prefix_bytes = s.uint("slice_prefix_bytes")?;
        state.slice_size_scaler = s.uint("slice_size_scaler")?;
    }
    Ok(())
}

/// Optional custom quantisation matrix, one value per subband (12.4.5.3).
pub fn quant_matrix<S: Serdes>(s: &mut S, state: &mut State) -> Result<()> {
    if s.flag("custom_quant_matrix")? {
        for _ in 0..num_subbands(state.dwt_depth, state.dwt_depth_ho) {
            s.uint("quant_matrix")?;
        }
    }
    Ok(())
}

/// The coefficient data of a whole picture (13.5.1).
pub fn transform_data<S: Serdes>(s: &mut S, state: &mut State) -> Result<()> {
    let params = state.whole_picture_slice_params();
    if state.parse_code.is_low_delay() {
        let numerator = state.slice_bytes_numerator;
        let denominator = state.slice_bytes_denominator;
        s.ld_slice_array("ld_slice_array", || {
            LdSliceArray::new(params, numerator, denominator)
        })?;
    } else {
        let prefix_bytes = state.slice_prefix_bytes as usize;
        let size_scaler = state.slice_size_scaler;
        s.hq_slice_array("hq_slice_array", || {
            HqSliceArray::new(params, prefix_bytes, size_scaler)
        })?;
    }
    Ok(())
}

/// A picture fragment (14.1): the first fragment of a picture carries the
/// transform parameters, subsequent fragments carry runs of slices.
pub fn fragment_parse<S: Serdes>(s: &mut S, state: &mut State) -> Result<()> {
    s.byte_align("padding1")?;
    s.nested("fragment_header", |s| fragment_header(s, state))?;
    s.byte_align("padding2")?;

    if state.fragment_slice_count == 0 {
        s.nested("transform_parameters", |s| transform_parameters(s, state))?;
    } else {
        fragment_data(s, state)?;
    }
    Ok(())
}

/// The fragment header (14.2).
pub fn fragment_header<S: Serdes>(s: &mut S, state: &mut State) -> Result<()> {
    s.nbits("picture_number", 32)?;
    s.nbits("fragment_data_length", 16)?;
    state.fragment_slice_count = s.nbits("fragment_slice_count", 16)? as usize;
    if state.fragment_slice_count != 0 {
        state.fragment_x_offset = s.nbits("fragment_x_offset", 16)? as usize;
        state.fragment_y_offset = s.nbits("fragment_y_offset", 16)? as usize;
    }
    Ok(())
}

/// The slice run carried by a non-initial fragment (14.4).
pub fn fragment_data<S: Serdes>(s: &mut S, state: &mut State) -> Result<()> {
    let params = state.slice_array_params(
        state.fragment_x_offset,
        state.fragment_y_offset,
        state.fragment_slice_count,
    );
    if state.parse_code.is_low_delay() {
        let numerator = state.slice_bytes_numerator;
        let denominator = state.slice_bytes_denominator;
        s.ld_slice_array("ld_slice_array", || {
            LdSliceArray::new(params, numerator, denominator)
        })?;
    } else {
        let prefix_bytes = state.slice_prefix_bytes as usize;
        let size_scaler = state.slice_size_scaler;
        s.hq_slice_array("hq_slice_array", || {
            HqSliceArray::new(params, prefix_bytes, size_scaler)
        })?;
    }
    Ok(())
}

/// Auxiliary data payload (10.4.4): everything between this parse_info
/// header and the next.
pub fn auxiliary_data<S: Serdes>(s: &mut S, state: &mut State) -> Result<()> {
    s.byte_align("padding")?;
    let payload = state.next_parse_offset.saturating_sub(PARSE_INFO_HEADER_BYTES);
    s.nbytes("bytes", payload as usize)?;
    Ok(())
}

/// Padding data payload (10.4.5).
pub fn padding<S: Serdes>(s: &mut S, state: &mut State) -> Result<()> {
    s.byte_align("padding")?;
    let payload = state.next_parse_offset.saturating_sub(PARSE_INFO_HEADER_BYTES);
    s.nbytes("bytes", payload as usize)?;
    Ok(())
}

/// One data unit: a parse_info header and its payload.
pub fn data_unit<S: Serdes>(s: &mut S, state: &mut State) -> Result<()> {
    s.nested("parse_info", |s| parse_info(s, state))?;
    match state.parse_code {
        ParseCode::SequenceHeader => s.nested("sequence_header", |s| sequence_header(s, state)),
        ParseCode::EndOfSequence => Ok(()),
        ParseCode::AuxiliaryData => s.nested("auxiliary_data", |s| auxiliary_data(s, state)),
        ParseCode::PaddingData => s.nested("padding", |s| padding(s, state)),
        code if code.is_fragment() => s.nested("fragment_parse", |s| fragment_parse(s, state)),
        _ => s.nested("picture_parse", |s| picture_parse(s, state)),
    }
}

/// A whole sequence: data units up to and including end-of-sequence
/// (10.3). Each data unit lands as one nested context in the `data_units`
/// sequence.
pub fn parse_sequence<S: Serdes>(s: &mut S, state: &mut State) -> Result<()> {
    loop {
        s.nested("data_units", |s| data_unit(s, state))?;
        if state.parse_code == ParseCode::EndOfSequence {
            return Ok(());
        }
    }
}
