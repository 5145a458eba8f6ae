//! Constant tables from SMPTE ST 2042-1: parse codes, profiles, base video
//! formats.

use serde::{Deserialize, Serialize};

/// Data unit parse codes (Table 10.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParseCode {
    SequenceHeader,
    EndOfSequence,
    AuxiliaryData,
    PaddingData,
    LowDelayPicture,
    HighQualityPicture,
    LowDelayPictureFragment,
    HighQualityPictureFragment,
}

impl ParseCode {
    pub fn from_code(code: u8) -> Option<ParseCode> {
        match code {
            0x00 => Some(ParseCode::SequenceHeader),
            0x10 => Some(ParseCode::EndOfSequence),
            0x20 => Some(ParseCode::AuxiliaryData),
            0x30 => Some(ParseCode::PaddingData),
            0xC8 => Some(ParseCode::LowDelayPicture),
            0xE8 => Some(ParseCode::HighQualityPicture),
            0xCC => Some(ParseCode::LowDelayPictureFragment),
            0xEC => Some(ParseCode::HighQualityPictureFragment),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            ParseCode::SequenceHeader => 0x00,
            ParseCode::EndOfSequence => 0x10,
            ParseCode::AuxiliaryData => 0x20,
            ParseCode::PaddingData => 0x30,
            ParseCode::LowDelayPicture => 0xC8,
            ParseCode::HighQualityPicture => 0xE8,
            ParseCode::LowDelayPictureFragment => 0xCC,
            ParseCode::HighQualityPictureFragment => 0xEC,
        }
    }

    /// True for whole-picture data units.
    pub fn is_picture(self) -> bool {
        matches!(
            self,
            ParseCode::LowDelayPicture | ParseCode::HighQualityPicture
        )
    }

    /// True for picture-fragment data units.
    pub fn is_fragment(self) -> bool {
        matches!(
            self,
            ParseCode::LowDelayPictureFragment | ParseCode::HighQualityPictureFragment
        )
    }

    /// True for low-delay coded pictures or fragments.
    pub fn is_low_delay(self) -> bool {
        matches!(
            self,
            ParseCode::LowDelayPicture | ParseCode::LowDelayPictureFragment
        )
    }

    /// True for high-quality coded pictures or fragments.
    pub fn is_high_quality(self) -> bool {
        matches!(
            self,
            ParseCode::HighQualityPicture | ParseCode::HighQualityPictureFragment
        )
    }
}

impl Default for ParseCode {
    fn default() -> Self {
        ParseCode::EndOfSequence
    }
}

/// The parse_info prefix magic, "BBCD" (10.5.1).
pub const PARSE_INFO_PREFIX: u64 = 0x42424344;

/// Bytes occupied by a parse_info header.
pub const PARSE_INFO_HEADER_BYTES: u64 = 13;

/// Codec profiles (Table C.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Profile {
    LowDelay,
    HighQuality,
}

impl Profile {
    pub fn index(self) -> u64 {
        match self {
            Profile::LowDelay => 0,
            Profile::HighQuality => 3,
        }
    }
}

/// Colour difference sampling formats (Table 4.1).
///
/// The index is the `color_diff_format_index` bitstream value; the factors
/// are the horizontal and vertical subsampling divisors.
pub fn color_diff_sampling_factors(color_diff_format_index: u64) -> (usize, usize) {
    match color_diff_format_index {
        0 => (1, 1), // 4:4:4
        1 => (2, 1), // 4:2:2
        _ => (2, 2), // 4:2:0
    }
}

/// A base video format preset (Annex B), reduced to the fields the
/// bitstream geometry depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BaseVideoFormat {
    pub name: &'static str,
    pub frame_width: usize,
    pub frame_height: usize,
    pub color_diff_format_index: u64,
}

/// Base video format presets indexed by `base_video_format` (Table B.1).
pub const BASE_VIDEO_FORMATS: &[BaseVideoFormat] = &[
    BaseVideoFormat { name: "custom_format", frame_width: 640, frame_height: 480, color_diff_format_index: 2 },
    BaseVideoFormat { name: "qsif525", frame_width: 176, frame_height: 120, color_diff_format_index: 2 },
    BaseVideoFormat { name: "qcif", frame_width: 176, frame_height: 144, color_diff_format_index: 2 },
    BaseVideoFormat { name: "sif525", frame_width: 352, frame_height: 240, color_diff_format_index: 2 },
    BaseVideoFormat { name: "cif", frame_width: 352, frame_height: 288, color_diff_format_index: 2 },
    BaseVideoFormat { name: "4sif525", frame_width: 704, frame_height: 480, color_diff_format_index: 2 },
    BaseVideoFormat { name: "4cif", frame_width: 704, frame_height: 576, color_diff_format_index: 2 },
    BaseVideoFormat { name: "sd480i_60", frame_width: 720, frame_height: 480, color_diff_format_index: 1 },
    BaseVideoFormat { name: "sd576i_50", frame_width: 720, frame_height: 576, color_diff_format_index: 1 },
    BaseVideoFormat { name: "hd720p_60", frame_width: 1280, frame_height: 720, color_diff_format_index: 1 },
    BaseVideoFormat { name: "hd720p_50", frame_width: 1280, frame_height: 720, color_diff_format_index: 1 },
    BaseVideoFormat { name: "hd1080i_60", frame_width: 1920, frame_height: 1080, color_diff_format_index: 1 },
    BaseVideoFormat { name: "hd1080i_50", frame_width: 1920, frame_height: 1080, color_diff_format_index: 1 },
    BaseVideoFormat { name: "hd1080p_60", frame_width: 1920, frame_height: 1080, color_diff_format_index: 1 },
    BaseVideoFormat { name: "hd1080p_50", frame_width: 1920, frame_height: 1080, color_diff_format_index: 1 },
    BaseVideoFormat { name: "dc2k_24", frame_width: 2048, frame_height: 1080, color_diff_format_index: 0 },
    BaseVideoFormat { name: "dc4k_24", frame_width: 4096, frame_height: 2160, color_diff_format_index: 0 },
    BaseVideoFormat { name: "uhd4k_60", frame_width: 3840, frame_height: 2160, color_diff_format_index: 1 },
    BaseVideoFormat { name: "uhd4k_50", frame_width: 3840, frame_height: 2160, color_diff_format_index: 1 },
    BaseVideoFormat { name: "uhd8k_60", frame_width: 7680, frame_height: 4320, color_diff_format_index: 1 },
    BaseVideoFormat { name: "uhd8k_50", frame_width: 7680, frame_height: 4320, color_diff_format_index: 1 },
    BaseVideoFormat { name: "hd1080p_24", frame_width: 1920, frame_height: 1080, color_diff_format_index: 1 },
    BaseVideoFormat { name: "sd_pro486", frame_width: 720, frame_height: 486, color_diff_format_index: 1 },
];

/// Look up a base video format, falling back to the minimal custom format
/// for out-of-range indices (out-of-spec streams must still be
/// representable).
pub fn base_video_format(index: u64) -> BaseVideoFormat {
    BASE_VIDEO_FORMATS
        .get(index as usize)
        .copied()
        .unwrap_or(BASE_VIDEO_FORMATS[0])
}
