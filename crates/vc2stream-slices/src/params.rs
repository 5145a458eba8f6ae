//! Slice array geometry parameters and the values derived from them.

use serde::{Deserialize, Serialize};

use crate::geometry::{
    component_subband_dimensions, num_subband_levels, num_subbands, slice_coeff_offset,
    slice_subband_bounds,
};

/// A picture colour component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Component {
    Y,
    C1,
    C2,
}

/// Every upstream bitstream value the slice array geometry depends on.
///
/// Changing any of these regenerates the coefficient buffers; see
/// [`LdSliceArray::update`](crate::LdSliceArray::update).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceArrayParams {
    /// Luma picture dimensions in pixels.
    pub luma_width: usize,
    pub luma_height: usize,
    /// Colour-difference picture dimensions in pixels.
    pub color_diff_width: usize,
    pub color_diff_height: usize,
    /// Number of 2D wavelet decomposition levels.
    pub dwt_depth: usize,
    /// Number of horizontal-only decomposition levels.
    pub dwt_depth_ho: usize,
    /// The slice grid covering the whole picture.
    pub slices_x: usize,
    pub slices_y: usize,
    /// First slice held by this array (raster order), for fragmented
    /// pictures. Whole pictures use `(0, 0)`.
    pub start_sx: usize,
    pub start_sy: usize,
    /// Number of slices held by this array, in raster order from the start
    /// slice.
    pub slice_count: usize,
}

impl SliceArrayParams {
    /// Parameters for an array holding every slice of the picture.
    pub fn whole_picture(
        luma_width: usize,
        luma_height: usize,
        color_diff_width: usize,
        color_diff_height: usize,
        dwt_depth: usize,
        dwt_depth_ho: usize,
        slices_x: usize,
        slices_y: usize,
    ) -> Self {
        SliceArrayParams {
            luma_width,
            luma_height,
            color_diff_width,
            color_diff_height,
            dwt_depth,
            dwt_depth_ho,
            slices_x,
            slices_y,
            start_sx: 0,
            start_sy: 0,
            slice_count: slices_x * slices_y,
        }
    }

    pub fn num_subbands(&self) -> usize {
        num_subbands(self.dwt_depth, self.dwt_depth_ho)
    }

    pub fn num_subband_levels(&self) -> usize {
        num_subband_levels(self.dwt_depth, self.dwt_depth_ho)
    }

    /// Index of slice `(sx, sy)` within this array (0 = the start slice).
    pub fn to_slice_index(&self, sx: usize, sy: usize) -> usize {
        let absolute = sy * self.slices_x + sx;
        let start = self.start_sy * self.slices_x + self.start_sx;
        absolute - start
    }

    /// Inverse of [`to_slice_index`](SliceArrayParams::to_slice_index).
    pub fn from_slice_index(&self, index: usize) -> (usize, usize) {
        if self.slices_x == 0 {
            return (0, 0);
        }
        let absolute = self.start_sy * self.slices_x + self.start_sx + index;
        (absolute % self.slices_x, absolute / self.slices_x)
    }

    /// Raster index of slice `(sx, sy)` within the whole picture.
    pub fn picture_slice_number(&self, sx: usize, sy: usize) -> usize {
        sy * self.slices_x + sx
    }

    /// Iterate `(index, sx, sy)` over the slices held by this array.
    pub fn iter_slice_indices_and_coords(
        &self,
    ) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        (0..self.slice_count).map(move |index| {
            let (sx, sy) = self.from_slice_index(index);
            (index, sx, sy)
        })
    }
}

/// Geometry derived from a [`SliceArrayParams`], cached between
/// regenerations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceGeometry {
    pub luma_subband_widths: Vec<usize>,
    pub luma_subband_heights: Vec<usize>,
    pub color_diff_subband_widths: Vec<usize>,
    pub color_diff_subband_heights: Vec<usize>,
    /// Flat-buffer offset of the array's first slice within a whole-picture
    /// numbering, per component kind.
    pub luma_coeffs_index_offset: usize,
    pub color_diff_coeffs_index_offset: usize,
    /// Total buffer sizes for this array's slice run.
    pub luma_coeffs_len: usize,
    pub color_diff_coeffs_len: usize,
}

impl SliceGeometry {
    pub fn compute(params: &SliceArrayParams) -> Self {
        let (luma_subband_widths, luma_subband_heights) = component_subband_dimensions(
            params.luma_width,
            params.luma_height,
            params.dwt_depth,
            params.dwt_depth_ho,
        );
        let (color_diff_subband_widths, color_diff_subband_heights) =
            component_subband_dimensions(
                params.color_diff_width,
                params.color_diff_height,
                params.dwt_depth,
                params.dwt_depth_ho,
            );

        // An empty slice grid (e.g. a freshly defaulted stream) has no
        // coefficients at all
        if params.slices_x == 0 || params.slices_y == 0 {
            return SliceGeometry {
                luma_subband_widths,
                luma_subband_heights,
                color_diff_subband_widths,
                color_diff_subband_heights,
                luma_coeffs_index_offset: 0,
                color_diff_coeffs_index_offset: 0,
                luma_coeffs_len: 0,
                color_diff_coeffs_len: 0,
            };
        }

        let offset = |widths: &[usize], heights: &[usize], sx: usize, sy: usize| {
            slice_coeff_offset(widths, heights, params.slices_x, params.slices_y, sx, sy)
        };

        let (end_sx, end_sy) = params.from_slice_index(params.slice_count);
        let luma_coeffs_index_offset = offset(
            &luma_subband_widths,
            &luma_subband_heights,
            params.start_sx,
            params.start_sy,
        );
        let color_diff_coeffs_index_offset = offset(
            &color_diff_subband_widths,
            &color_diff_subband_heights,
            params.start_sx,
            params.start_sy,
        );
        let luma_coeffs_len = offset(&luma_subband_widths, &luma_subband_heights, end_sx, end_sy)
            - luma_coeffs_index_offset;
        let color_diff_coeffs_len = offset(
            &color_diff_subband_widths,
            &color_diff_subband_heights,
            end_sx,
            end_sy,
        ) - color_diff_coeffs_index_offset;

        SliceGeometry {
            luma_subband_widths,
            luma_subband_heights,
            color_diff_subband_widths,
            color_diff_subband_heights,
            luma_coeffs_index_offset,
            color_diff_coeffs_index_offset,
            luma_coeffs_len,
            color_diff_coeffs_len,
        }
    }

    /// Subband widths of a component.
    pub fn subband_widths(&self, component: Component) -> &[usize] {
        match component {
            Component::Y => &self.luma_subband_widths,
            Component::C1 | Component::C2 => &self.color_diff_subband_widths,
        }
    }

    /// Subband heights of a component.
    pub fn subband_heights(&self, component: Component) -> &[usize] {
        match component {
            Component::Y => &self.luma_subband_heights,
            Component::C1 | Component::C2 => &self.color_diff_subband_heights,
        }
    }

    /// Flat-buffer offset of this array's first slice for a component.
    pub fn coeffs_index_offset(&self, component: Component) -> usize {
        match component {
            Component::Y => self.luma_coeffs_index_offset,
            Component::C1 | Component::C2 => self.color_diff_coeffs_index_offset,
        }
    }

    /// Number of coefficients slice `(sx, sy)` holds for a component.
    pub fn slice_coeff_count(
        &self,
        params: &SliceArrayParams,
        component: Component,
        sx: usize,
        sy: usize,
    ) -> usize {
        let widths = self.subband_widths(component);
        let heights = self.subband_heights(component);
        widths
            .iter()
            .zip(heights)
            .map(|(&w, &h)| {
                let (x1, y1, x2, y2) =
                    slice_subband_bounds(sx, sy, w, h, params.slices_x, params.slices_y);
                (x2 - x1) * (y2 - y1)
            })
            .sum()
    }

    /// Range of a component's flat buffer covered by slice `(sx, sy)`.
    pub fn slice_coeff_range(
        &self,
        params: &SliceArrayParams,
        component: Component,
        sx: usize,
        sy: usize,
    ) -> std::ops::Range<usize> {
        let widths = self.subband_widths(component);
        let heights = self.subband_heights(component);
        let start =
            slice_coeff_offset(widths, heights, params.slices_x, params.slices_y, sx, sy)
                - self.coeffs_index_offset(component);
        start..start + self.slice_coeff_count(params, component, sx, sy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SliceArrayParams {
        SliceArrayParams {
            luma_width: 256,
            luma_height: 128,
            color_diff_width: 128,
            color_diff_height: 64,
            dwt_depth: 2,
            dwt_depth_ho: 1,
            slices_x: 4,
            slices_y: 2,
            start_sx: 2,
            start_sy: 1,
            slice_count: 2,
        }
    }

    #[test]
    fn subband_metrics() {
        let geometry = SliceGeometry::compute(&params());

        assert_eq!(
            geometry.luma_subband_widths,
            vec![
                256 / 8, // Level 0: L
                256 / 8, // Level 1: H
                256 / 4, // Level 2: HL
                256 / 4, // Level 2: LH
                256 / 4, // Level 2: HH
                256 / 2, // Level 3: HL
                256 / 2, // Level 3: LH
                256 / 2, // Level 3: HH
            ]
        );
        assert_eq!(
            geometry.luma_subband_heights,
            vec![
                128 / 4,
                128 / 4,
                128 / 4,
                128 / 4,
                128 / 4,
                128 / 2,
                128 / 2,
                128 / 2,
            ]
        );
        assert_eq!(
            geometry.color_diff_subband_widths,
            vec![
                128 / 8,
                128 / 8,
                128 / 4,
                128 / 4,
                128 / 4,
                128 / 2,
                128 / 2,
                128 / 2,
            ]
        );
        assert_eq!(
            geometry.color_diff_subband_heights,
            vec![64 / 4, 64 / 4, 64 / 4, 64 / 4, 64 / 4, 64 / 2, 64 / 2, 64 / 2]
        );
    }

    #[test]
    fn index_offsets_follow_the_start_slice() {
        let params = params();
        let geometry = SliceGeometry::compute(&params);

        assert_eq!(
            geometry.luma_coeffs_index_offset,
            slice_coeff_offset(
                &geometry.luma_subband_widths,
                &geometry.luma_subband_heights,
                4,
                2,
                2,
                1,
            )
        );

        let whole = SliceArrayParams {
            start_sx: 0,
            start_sy: 0,
            ..params
        };
        let geometry = SliceGeometry::compute(&whole);
        assert_eq!(geometry.luma_coeffs_index_offset, 0);
        assert_eq!(geometry.color_diff_coeffs_index_offset, 0);
    }

    #[test]
    fn slice_index_conversions() {
        let params = SliceArrayParams {
            luma_width: 1,
            luma_height: 1,
            color_diff_width: 1,
            color_diff_height: 1,
            dwt_depth: 0,
            dwt_depth_ho: 0,
            slices_x: 4,
            slices_y: 3,
            start_sx: 2,
            start_sy: 1,
            slice_count: 6,
        };

        assert_eq!(params.to_slice_index(2, 1), 0);
        assert_eq!(params.to_slice_index(3, 1), 1);
        assert_eq!(params.to_slice_index(0, 2), 2);
        assert_eq!(params.to_slice_index(1, 2), 3);
        assert_eq!(params.to_slice_index(2, 2), 4);
        assert_eq!(params.to_slice_index(3, 2), 5);

        for index in 0..6 {
            let (sx, sy) = params.from_slice_index(index);
            assert_eq!(params.to_slice_index(sx, sy), index);
        }

        assert_eq!(
            params.iter_slice_indices_and_coords().collect::<Vec<_>>()[..4],
            [(0, 2, 1), (1, 3, 1), (2, 0, 2), (3, 1, 2)]
        );
    }

    #[test]
    fn slice_coeff_counts_vary_with_uneven_dimensions() {
        let params = SliceArrayParams {
            luma_width: 127,
            luma_height: 63,
            color_diff_width: 63,
            color_diff_height: 31,
            dwt_depth: 0,
            dwt_depth_ho: 0,
            slices_x: 4,
            slices_y: 2,
            start_sx: 0,
            start_sy: 0,
            slice_count: 8,
        };
        let geometry = SliceGeometry::compute(&params);

        // The first slice is the smaller one; the last absorbs the remainder
        assert_eq!(
            geometry.slice_coeff_count(&params, Component::Y, 0, 0),
            (127 / 4) * (63 / 2)
        );
        assert_eq!(
            geometry.slice_coeff_count(&params, Component::Y, 3, 1),
            (128 / 4) * (64 / 2)
        );
        assert_eq!(
            geometry.slice_coeff_count(&params, Component::C1, 0, 0),
            (63 / 4) * (31 / 2)
        );
    }
}
