//! Cross-data-unit decoder state threaded through the grammar.

use serde::{Deserialize, Serialize};

use vc2stream_slices::SliceArrayParams;

use crate::tables::{color_diff_sampling_factors, ParseCode};

/// Video source parameters relevant to the bitstream geometry.
///
/// Defaults come from the base video format preset; the custom flags in
/// `source_parameters` override individual fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoParameters {
    pub frame_width: usize,
    pub frame_height: usize,
    pub color_diff_format_index: u64,
}

impl VideoParameters {
    pub fn from_base_format(index: u64) -> Self {
        let preset = crate::tables::base_video_format(index);
        VideoParameters {
            frame_width: preset.frame_width,
            frame_height: preset.frame_height,
            color_diff_format_index: preset.color_diff_format_index,
        }
    }
}

/// The values earlier parts of the stream establish which later grammar
/// decisions and geometry computations depend on (10.4.1).
///
/// The slice array geometry in particular derives from half a dozen of
/// these at once; see [`State::slice_array_params`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub major_version: u64,
    pub minor_version: u64,
    pub profile: u64,
    pub level: u64,

    pub parse_code: ParseCode,
    pub next_parse_offset: u64,
    pub previous_parse_offset: u64,

    /// Picture component dimensions, set by `set_coding_parameters` after
    /// each sequence header.
    pub luma_width: usize,
    pub luma_height: usize,
    pub color_diff_width: usize,
    pub color_diff_height: usize,

    pub picture_coding_mode: u64,

    pub dwt_depth: usize,
    pub dwt_depth_ho: usize,

    pub slices_x: usize,
    pub slices_y: usize,
    pub slice_bytes_numerator: u64,
    pub slice_bytes_denominator: u64,
    pub slice_prefix_bytes: u64,
    pub slice_size_scaler: u64,

    /// Header fields of the fragment currently being parsed.
    pub fragment_slice_count: usize,
    pub fragment_x_offset: usize,
    pub fragment_y_offset: usize,
}

impl State {
    /// Derive the picture component dimensions from the video parameters
    /// and picture coding mode (11.6.2).
    ///
    /// Fields hold half the frame height when pictures are fields.
    pub fn set_coding_parameters(&mut self, video: &VideoParameters, picture_coding_mode: u64) {
        self.picture_coding_mode = picture_coding_mode;

        self.luma_width = video.frame_width;
        self.luma_height = video.frame_height;

        let (sx, sy) = color_diff_sampling_factors(video.color_diff_format_index);
        self.color_diff_width = video.frame_width / sx;
        self.color_diff_height = video.frame_height / sy;

        if picture_coding_mode == 1 {
            self.luma_height /= 2;
            self.color_diff_height /= 2;
        }
    }

    /// Slice array geometry for a run of `slice_count` slices starting at
    /// `(start_sx, start_sy)`.
    pub fn slice_array_params(
        &self,
        start_sx: usize,
        start_sy: usize,
        slice_count: usize,
    ) -> SliceArrayParams {
        SliceArrayParams {
            luma_width: self.luma_width,
            luma_height: self.luma_height,
            color_diff_width: self.color_diff_width,
            color_diff_height: self.color_diff_height,
            dwt_depth: self.dwt_depth,
            dwt_depth_ho: self.dwt_depth_ho,
            slices_x: self.slices_x,
            slices_y: self.slices_y,
            start_sx,
            start_sy,
            slice_count,
        }
    }

    /// Slice array geometry covering the whole picture.
    pub fn whole_picture_slice_params(&self) -> SliceArrayParams {
        self.slice_array_params(0, 0, self.slices_x * self.slices_y)
    }
}
