//! Wavelet subband and slice geometry arithmetic.
//!
//! All of the slice serialisations derive their shape from the same small
//! set of rules: subband dimensions come from the padded component
//! dimensions divided by a power of two per decomposition level (11.4.4),
//! slice edges come from floor divisions of the subband dimensions (13.5.6),
//! and coefficients are laid out slice-major, subband-minor, row-major.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SliceError};

/// Ceiling of log2, as per the `intlog2` pseudocode function (5.5.3).
///
/// `intlog2(1)` is 0; `intlog2(497)` is 9.
pub fn intlog2(value: u64) -> u32 {
    if value <= 1 {
        0
    } else {
        64 - (value - 1).leading_zeros()
    }
}

fn round_up_to_multiple(value: usize, power_of_two: usize) -> usize {
    (value + power_of_two - 1) / power_of_two * power_of_two
}

/// Subband orientation within a decomposition level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    /// Untransformed residual (no wavelet levels at all).
    Dc,
    /// Low-pass band of a horizontal-only decomposition.
    L,
    /// Low-pass band of a 2D decomposition.
    Ll,
    /// High-pass band of a horizontal-only level.
    H,
    Hl,
    Lh,
    Hh,
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Orientation::Dc => "DC",
            Orientation::L => "L",
            Orientation::Ll => "LL",
            Orientation::H => "H",
            Orientation::Hl => "HL",
            Orientation::Lh => "LH",
            Orientation::Hh => "HH",
        };
        write!(f, "{name}")
    }
}

/// The (level, orientation) name of a subband.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubbandLabel {
    pub level: usize,
    pub orientation: Orientation,
}

impl SubbandLabel {
    /// Label of subband `index` for a transform of the given depths.
    ///
    /// Subband 0 is the residual band; each horizontal-only level
    /// contributes one `H` band and each 2D level contributes `HL`, `LH`,
    /// `HH` in that order.
    pub fn from_index(index: usize, dwt_depth: usize, dwt_depth_ho: usize) -> Self {
        debug_assert!(index < num_subbands(dwt_depth, dwt_depth_ho));
        if index == 0 {
            let orientation = if dwt_depth_ho > 0 {
                Orientation::L
            } else if dwt_depth > 0 {
                Orientation::Ll
            } else {
                Orientation::Dc
            };
            SubbandLabel {
                level: 0,
                orientation,
            }
        } else if index <= dwt_depth_ho {
            SubbandLabel {
                level: index,
                orientation: Orientation::H,
            }
        } else {
            let i = index - dwt_depth_ho - 1;
            SubbandLabel {
                level: dwt_depth_ho + 1 + i / 3,
                orientation: [Orientation::Hl, Orientation::Lh, Orientation::Hh][i % 3],
            }
        }
    }
}

/// Number of subbands produced by a transform of the given depths.
pub fn num_subbands(dwt_depth: usize, dwt_depth_ho: usize) -> usize {
    1 + dwt_depth_ho + 3 * dwt_depth
}

/// Number of decomposition levels (including level 0).
pub fn num_subband_levels(dwt_depth: usize, dwt_depth_ho: usize) -> usize {
    1 + dwt_depth_ho + dwt_depth
}

/// Dimensions of the subbands at decomposition `level` for a component of
/// `width` x `height` pixels.
///
/// The component dimensions are first padded up to a multiple of
/// 2^(dwt_depth + dwt_depth_ho) horizontally and 2^dwt_depth vertically so
/// that every division below is exact.
pub fn subband_dimensions(
    width: usize,
    height: usize,
    dwt_depth: usize,
    dwt_depth_ho: usize,
    level: usize,
) -> (usize, usize) {
    debug_assert!(level <= dwt_depth + dwt_depth_ho);
    let scale_w = dwt_depth + dwt_depth_ho;
    let scale_h = dwt_depth;
    let width = round_up_to_multiple(width, 1 << scale_w);
    let height = round_up_to_multiple(height, 1 << scale_h);

    if level == 0 {
        (width >> scale_w, height >> scale_h)
    } else if level <= dwt_depth_ho {
        (width >> (scale_w - level + 1), height >> scale_h)
    } else {
        let level_2d = level - dwt_depth_ho;
        (
            width >> (scale_w - level + 1),
            height >> (scale_h - level_2d + 1),
        )
    }
}

/// Widths and heights of every subband (in index order) of a component.
pub fn component_subband_dimensions(
    width: usize,
    height: usize,
    dwt_depth: usize,
    dwt_depth_ho: usize,
) -> (Vec<usize>, Vec<usize>) {
    let mut widths = Vec::with_capacity(num_subbands(dwt_depth, dwt_depth_ho));
    let mut heights = Vec::with_capacity(num_subbands(dwt_depth, dwt_depth_ho));
    for index in 0..num_subbands(dwt_depth, dwt_depth_ho) {
        let label = SubbandLabel::from_index(index, dwt_depth, dwt_depth_ho);
        let (w, h) = subband_dimensions(width, height, dwt_depth, dwt_depth_ho, label.level);
        widths.push(w);
        heights.push(h);
    }
    (widths, heights)
}

/// Pixel bounds `(x1, y1, x2, y2)` of slice `(sx, sy)` within a subband.
///
/// Edges are the floor divisions mandated by the codec; slices need not all
/// be the same size (the right/bottom slices absorb any remainder).
pub fn slice_subband_bounds(
    sx: usize,
    sy: usize,
    subband_width: usize,
    subband_height: usize,
    slices_x: usize,
    slices_y: usize,
) -> (usize, usize, usize, usize) {
    (
        sx * subband_width / slices_x,
        sy * subband_height / slices_y,
        (sx + 1) * subband_width / slices_x,
        (sy + 1) * subband_height / slices_y,
    )
}

/// Flat-buffer offset of the first coefficient of slice `(sx, sy)`.
///
/// `sy` may point past the bottom of the slice grid; the phantom rows
/// continue the raster numbering, which is what lets fragmented pictures
/// compute end offsets one-past their last slice.
pub fn slice_coeff_offset(
    subband_widths: &[usize],
    subband_heights: &[usize],
    slices_x: usize,
    slices_y: usize,
    sx: usize,
    sy: usize,
) -> usize {
    let mut offset = 0;
    for (&width, &height) in subband_widths.iter().zip(subband_heights) {
        let (x1, y1, _, y2) = slice_subband_bounds(sx, sy, width, height, slices_x, slices_y);
        // Whole slice-rows above, plus earlier slices within this row
        offset += width * y1 + x1 * (y2 - y1);
    }
    offset
}

/// Flat-buffer index of coefficient `(x, y)` of one subband of one slice.
///
/// The layout is: slices in raster order (`sy` outer), subbands in index
/// order within each slice, row-major within each subband slice. The mapping
/// is a bijection with `0..total_coefficients`.
#[allow(clippy::too_many_arguments)]
pub fn to_coeff_index(
    subband_widths: &[usize],
    subband_heights: &[usize],
    slices_x: usize,
    slices_y: usize,
    sx: usize,
    sy: usize,
    subband_index: usize,
    x: usize,
    y: usize,
) -> Result<usize> {
    if sx >= slices_x {
        return Err(SliceError::CoordOutOfRange(format!(
            "slice x {sx} outside 0..{slices_x}"
        )));
    }
    if subband_index >= subband_widths.len() {
        return Err(SliceError::CoordOutOfRange(format!(
            "subband index {subband_index} outside 0..{}",
            subband_widths.len()
        )));
    }

    let mut index = slice_coeff_offset(subband_widths, subband_heights, slices_x, slices_y, sx, sy);

    for earlier in 0..subband_index {
        let (x1, y1, x2, y2) = slice_subband_bounds(
            sx,
            sy,
            subband_widths[earlier],
            subband_heights[earlier],
            slices_x,
            slices_y,
        );
        index += (x2 - x1) * (y2 - y1);
    }

    let (x1, y1, x2, y2) = slice_subband_bounds(
        sx,
        sy,
        subband_widths[subband_index],
        subband_heights[subband_index],
        slices_x,
        slices_y,
    );
    let slice_width = x2 - x1;
    let slice_height = y2 - y1;
    if x >= slice_width {
        return Err(SliceError::CoordOutOfRange(format!(
            "x {x} outside 0..{slice_width} in subband {subband_index}"
        )));
    }
    if y >= slice_height {
        return Err(SliceError::CoordOutOfRange(format!(
            "y {y} outside 0..{slice_height} in subband {subband_index}"
        )));
    }

    Ok(index + y * slice_width + x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intlog2_is_ceiling_log2() {
        assert_eq!(intlog2(1), 0);
        assert_eq!(intlog2(2), 1);
        assert_eq!(intlog2(3), 2);
        assert_eq!(intlog2(4), 2);
        assert_eq!(intlog2(5), 3);
        assert_eq!(intlog2(497), 9);
        assert_eq!(intlog2(512), 9);
        assert_eq!(intlog2(513), 10);
    }

    #[test]
    fn dc_band_dimensions() {
        assert_eq!(subband_dimensions(11, 5, 0, 0, 0), (11, 5));
    }

    #[test]
    fn horizontal_only_dimensions() {
        // Width padded to the next multiple of 2^dwt_depth_ho
        assert_eq!(subband_dimensions(11, 5, 0, 1, 1), (12 / 2, 5));
        assert_eq!(subband_dimensions(11, 5, 0, 2, 2), (12 / 2, 5));
        assert_eq!(subband_dimensions(11, 5, 0, 3, 3), (16 / 2, 5));

        // Working down the horizontal-only levels
        assert_eq!(subband_dimensions(11, 5, 0, 3, 2), (16 / 4, 5));
        assert_eq!(subband_dimensions(11, 5, 0, 3, 1), (16 / 8, 5));
        assert_eq!(subband_dimensions(11, 5, 0, 3, 0), (16 / 8, 5));
    }

    #[test]
    fn two_dimensional_and_horizontal_only_dimensions() {
        assert_eq!(subband_dimensions(11, 5, 1, 3, 4), (16 / 2, 6 / 2));
        assert_eq!(subband_dimensions(11, 5, 2, 3, 5), (32 / 2, 8 / 2));
        assert_eq!(subband_dimensions(11, 5, 3, 3, 6), (64 / 2, 8 / 2));

        // Working down the 2D levels
        assert_eq!(subband_dimensions(11, 5, 3, 3, 5), (64 / 4, 8 / 4));
        assert_eq!(subband_dimensions(11, 5, 3, 3, 4), (64 / 8, 8 / 8));

        // Into the horizontal-only levels
        assert_eq!(subband_dimensions(11, 5, 3, 3, 3), (64 / 16, 8 / 8));
        assert_eq!(subband_dimensions(11, 5, 3, 3, 2), (64 / 32, 8 / 8));
        assert_eq!(subband_dimensions(11, 5, 3, 3, 1), (64 / 64, 8 / 8));

        // And the residual band
        assert_eq!(subband_dimensions(11, 5, 3, 3, 0), (64 / 64, 8 / 8));
    }

    #[test]
    fn slice_bounds_partition_the_subband() {
        for (sx, sy, expected) in [
            // Consecutive and complete along the x axis
            (0, 0, (0, 0, 3, 2)),
            (1, 0, (3, 0, 7, 2)),
            (2, 0, (7, 0, 11, 2)),
            // And along the y axis
            (0, 1, (0, 2, 3, 5)),
            (1, 1, (3, 2, 7, 5)),
            (2, 1, (7, 2, 11, 5)),
        ] {
            assert_eq!(slice_subband_bounds(sx, sy, 11, 5, 3, 2), expected);
        }
    }

    #[test]
    fn subband_labels() {
        assert_eq!(
            SubbandLabel::from_index(0, 0, 0),
            SubbandLabel {
                level: 0,
                orientation: Orientation::Dc
            }
        );

        // Horizontal-only then 2D levels
        let labels: Vec<_> = (0..num_subbands(2, 1))
            .map(|i| SubbandLabel::from_index(i, 2, 1))
            .collect();
        assert_eq!(labels[0].level, 0);
        assert_eq!(labels[0].orientation, Orientation::L);
        assert_eq!(labels[1].level, 1);
        assert_eq!(labels[1].orientation, Orientation::H);
        assert_eq!(labels[2].level, 2);
        assert_eq!(labels[2].orientation, Orientation::Hl);
        assert_eq!(labels[3].orientation, Orientation::Lh);
        assert_eq!(labels[4].orientation, Orientation::Hh);
        assert_eq!(labels[5].level, 3);
        assert_eq!(labels[7].orientation, Orientation::Hh);
    }

    #[test]
    fn coeff_index_order_is_raster_subband_row_major() {
        let slices_x = 3;
        let slices_y = 2;

        // Chosen so that subband 0 has empty subband slices, subband 1 has
        // unevenly sized slices and subband 2 evenly sized ones.
        let subband_widths = [2, 11, 30];
        let subband_heights = [1, 5, 20];

        let mut indices = Vec::new();
        // Also walk one phantom row past slices_y
        for sy in 0..slices_y + 1 {
            for sx in 0..slices_x {
                for (subband_index, (&w, &h)) in
                    subband_widths.iter().zip(&subband_heights).enumerate()
                {
                    let (x1, y1, x2, y2) = slice_subband_bounds(sx, sy, w, h, slices_x, slices_y);
                    for y in 0..y2 - y1 {
                        for x in 0..x2 - x1 {
                            indices.push(
                                to_coeff_index(
                                    &subband_widths,
                                    &subband_heights,
                                    slices_x,
                                    slices_y,
                                    sx,
                                    sy,
                                    subband_index,
                                    x,
                                    y,
                                )
                                .unwrap(),
                            );
                        }
                    }
                }
            }
        }

        let expected: Vec<usize> = (0..indices.len()).collect();
        assert_eq!(indices, expected);
    }

    #[test]
    fn coeff_index_out_of_range() {
        let subband_widths = [2, 11, 30];
        let subband_heights = [1, 5, 20];

        for (sx, sy, subband_index, x, y) in [
            // sx out of range
            (3, 0, 0, 0, 0),
            (4, 0, 0, 0, 0),
            // subband index out of range
            (0, 0, 3, 0, 0),
            (0, 0, 4, 0, 0),
            // x out of range (zero-sized subband slice)
            (0, 0, 0, 1, 0),
            (0, 0, 0, 2, 0),
            // x out of range (smaller than usual subband slice)
            (0, 0, 1, 3, 0),
            (0, 0, 1, 4, 0),
            // y out of range (zero-sized subband slice)
            (0, 0, 0, 0, 1),
            (0, 0, 0, 0, 2),
            // y out of range (smaller than usual subband slice)
            (0, 0, 1, 0, 2),
            (0, 0, 1, 0, 3),
        ] {
            assert!(
                to_coeff_index(
                    &subband_widths,
                    &subband_heights,
                    3,
                    2,
                    sx,
                    sy,
                    subband_index,
                    x,
                    y,
                )
                .is_err(),
                "({sx}, {sy}, {subband_index}, {x}, {y}) should be out of range"
            );
        }
    }
}
