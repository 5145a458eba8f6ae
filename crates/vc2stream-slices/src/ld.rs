//! Low-delay slice arrays (13.5.3).
//!
//! Low-delay slices have a fixed byte budget derived from the
//! `slice_bytes_numerator / slice_bytes_denominator` rational: slice `n` (in
//! whole-picture raster order) occupies
//! `floor((n+1)*numer/denom) - floor(n*numer/denom)` bytes, so the rounding
//! surplus is spread across the picture while the total stays exact. Each
//! slice carries a 7-bit qindex, a luma length field, a luma coefficient
//! block of that many bits and a colour-difference block (c1/c2 interleaved)
//! filling the remainder.

use std::io::Write;

use serde::{Deserialize, Serialize};
use tracing::debug;

use vc2stream_io::{BitReader, BitWriter, Bits};

use crate::coeff_io::{
    read_coeff_block, read_interleaved_coeff_block, write_coeff_block,
    write_interleaved_coeff_block,
};
use crate::error::Result;
use crate::geometry::intlog2;
use crate::params::{Component, SliceArrayParams, SliceGeometry};
use crate::views::ComponentView;

/// The slice data of a low-delay picture (or picture fragment).
///
/// Coefficients live in one flat buffer per component, slice-major,
/// subband-minor, row-major. Padding bit strings capture the unused tail of
/// each slice's bounded blocks so serialisation is bit-exact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LdSliceArray {
    params: SliceArrayParams,
    geometry: SliceGeometry,
    generation: u64,
    slice_bytes_numerator: u64,
    slice_bytes_denominator: u64,
    qindex: Vec<u8>,
    slice_y_length: Vec<u64>,
    y_coeffs: Vec<i64>,
    c1_coeffs: Vec<i64>,
    c2_coeffs: Vec<i64>,
    y_block_padding: Vec<Bits>,
    c_block_padding: Vec<Bits>,
}

impl LdSliceArray {
    pub fn new(
        params: SliceArrayParams,
        slice_bytes_numerator: u64,
        slice_bytes_denominator: u64,
    ) -> Self {
        let mut array = LdSliceArray {
            params,
            geometry: SliceGeometry::compute(&params),
            generation: 0,
            slice_bytes_numerator,
            slice_bytes_denominator,
            qindex: Vec::new(),
            slice_y_length: Vec::new(),
            y_coeffs: Vec::new(),
            c1_coeffs: Vec::new(),
            c2_coeffs: Vec::new(),
            y_block_padding: Vec::new(),
            c_block_padding: Vec::new(),
        };
        array.regenerate();
        array
    }

    pub fn params(&self) -> &SliceArrayParams {
        &self.params
    }

    pub fn geometry(&self) -> &SliceGeometry {
        &self.geometry
    }

    /// Monotonic counter bumped by every regeneration and mutation; caches
    /// of derived values should be invalidated when it moves.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn slice_bytes_numerator(&self) -> u64 {
        self.slice_bytes_numerator
    }

    pub fn slice_bytes_denominator(&self) -> u64 {
        self.slice_bytes_denominator
    }

    pub fn set_slice_bytes(&mut self, numerator: u64, denominator: u64) {
        self.slice_bytes_numerator = numerator;
        self.slice_bytes_denominator = denominator;
        self.generation += 1;
    }

    /// Apply a batch of geometry changes, then regenerate the buffers once.
    ///
    /// Values whose indices survive the change are preserved; new entries
    /// are zero.
    pub fn update(&mut self, f: impl FnOnce(&mut SliceArrayParams)) {
        f(&mut self.params);
        self.regenerate();
    }

    fn regenerate(&mut self) {
        self.geometry = SliceGeometry::compute(&self.params);
        let slices = self.params.slice_count;
        debug!(
            slices,
            luma_coeffs = self.geometry.luma_coeffs_len,
            "regenerating low-delay slice array"
        );
        self.qindex.resize(slices, 0);
        self.slice_y_length.resize(slices, 0);
        self.y_block_padding.resize(slices, Bits::new());
        self.c_block_padding.resize(slices, Bits::new());
        self.y_coeffs.resize(self.geometry.luma_coeffs_len, 0);
        self.c1_coeffs.resize(self.geometry.color_diff_coeffs_len, 0);
        self.c2_coeffs.resize(self.geometry.color_diff_coeffs_len, 0);
        self.generation += 1;
    }

    /// Byte budget of slice `(sx, sy)`, by the floor-difference allocation.
    pub fn slice_bytes(&self, sx: usize, sy: usize) -> u64 {
        let n = self.params.picture_slice_number(sx, sy) as u64;
        ((n + 1) * self.slice_bytes_numerator / self.slice_bytes_denominator)
            - (n * self.slice_bytes_numerator / self.slice_bytes_denominator)
    }

    /// Total bit length of slice `(sx, sy)` in the bitstream.
    pub fn slice_bit_length(&self, sx: usize, sy: usize) -> u64 {
        8 * self.slice_bytes(sx, sy)
    }

    /// Bits taken by the qindex and luma-length header fields.
    pub fn header_length(&self, sx: usize, sy: usize) -> u64 {
        7 + self.length_field_bits(sx, sy) as u64
    }

    fn length_field_bits(&self, sx: usize, sy: usize) -> u32 {
        intlog2(self.slice_bit_length(sx, sy).saturating_sub(7))
    }

    /// The stored luma length clamped to the space actually available.
    pub fn true_slice_y_length(&self, sx: usize, sy: usize) -> u64 {
        let available = self
            .slice_bit_length(sx, sy)
            .saturating_sub(self.header_length(sx, sy));
        self.slice_y_length[self.params.to_slice_index(sx, sy)].min(available)
    }

    /// Bits left for the colour-difference block of slice `(sx, sy)`.
    pub fn slice_c_length(&self, sx: usize, sy: usize) -> u64 {
        self.slice_bit_length(sx, sy)
            .saturating_sub(self.header_length(sx, sy))
            .saturating_sub(self.true_slice_y_length(sx, sy))
    }

    /// Total bit length of the whole array in the bitstream.
    pub fn bit_length(&self) -> u64 {
        self.params
            .iter_slice_indices_and_coords()
            .map(|(_, sx, sy)| self.slice_bit_length(sx, sy))
            .sum()
    }

    pub fn qindex(&self, sx: usize, sy: usize) -> u8 {
        self.qindex[self.params.to_slice_index(sx, sy)]
    }

    pub fn set_qindex(&mut self, sx: usize, sy: usize, qindex: u8) {
        let index = self.params.to_slice_index(sx, sy);
        self.qindex[index] = qindex;
        self.generation += 1;
    }

    pub fn slice_y_length(&self, sx: usize, sy: usize) -> u64 {
        self.slice_y_length[self.params.to_slice_index(sx, sy)]
    }

    pub fn set_slice_y_length(&mut self, sx: usize, sy: usize, length: u64) {
        let index = self.params.to_slice_index(sx, sy);
        self.slice_y_length[index] = length;
        self.generation += 1;
    }

    pub fn y_block_padding(&self, sx: usize, sy: usize) -> &Bits {
        &self.y_block_padding[self.params.to_slice_index(sx, sy)]
    }

    pub fn set_y_block_padding(&mut self, sx: usize, sy: usize, padding: Bits) {
        let index = self.params.to_slice_index(sx, sy);
        self.y_block_padding[index] = padding;
        self.generation += 1;
    }

    pub fn c_block_padding(&self, sx: usize, sy: usize) -> &Bits {
        &self.c_block_padding[self.params.to_slice_index(sx, sy)]
    }

    pub fn set_c_block_padding(&mut self, sx: usize, sy: usize, padding: Bits) {
        let index = self.params.to_slice_index(sx, sy);
        self.c_block_padding[index] = padding;
        self.generation += 1;
    }

    /// The whole flat coefficient buffer of a component.
    pub fn coeffs(&self, component: Component) -> &[i64] {
        match component {
            Component::Y => &self.y_coeffs,
            Component::C1 => &self.c1_coeffs,
            Component::C2 => &self.c2_coeffs,
        }
    }

    /// Mutable access to one slice's run of a component's coefficients.
    ///
    /// Taking this borrow counts as a mutation: the generation counter is
    /// bumped so dependent caches re-derive.
    pub fn slice_coeffs_mut(&mut self, component: Component, sx: usize, sy: usize) -> &mut [i64] {
        self.generation += 1;
        let range = self
            .geometry
            .slice_coeff_range(&self.params, component, sx, sy);
        match component {
            Component::Y => &mut self.y_coeffs[range],
            Component::C1 => &mut self.c1_coeffs[range],
            Component::C2 => &mut self.c2_coeffs[range],
        }
    }

    /// Borrowed view of one slice's run of a component's coefficients.
    pub fn component_view(&self, component: Component, sx: usize, sy: usize) -> ComponentView<'_> {
        ComponentView::new(&self.params, &self.geometry, self.coeffs(component), component, sx, sy)
    }

    /// Borrowed view of one slice.
    pub fn slice_view(&self, sx: usize, sy: usize) -> LdSliceView<'_> {
        LdSliceView {
            array: self,
            sx,
            sy,
        }
    }

    /// Deserialise the array from `r`, regenerating buffers from the current
    /// geometry first.
    pub fn read(&mut self, r: &mut BitReader<'_>) -> Result<()> {
        self.regenerate();
        let params = self.params;
        for (index, sx, sy) in params.iter_slice_indices_and_coords() {
            self.qindex[index] = r.read_nbits(7)? as u8;

            let mut bits_left = self.slice_bit_length(sx, sy).saturating_sub(7);
            let field_bits = intlog2(bits_left);
            let y_length = r.read_nbits(field_bits)?;
            self.slice_y_length[index] = y_length;
            bits_left -= field_bits as u64;

            let true_y_length = y_length.min(bits_left);
            let y_range = self.geometry.slice_coeff_range(&params, Component::Y, sx, sy);
            read_coeff_block(
                r,
                true_y_length,
                &mut self.y_coeffs[y_range],
                &mut self.y_block_padding[index],
            )?;

            let c_length = bits_left - true_y_length;
            let c_range = self
                .geometry
                .slice_coeff_range(&params, Component::C1, sx, sy);
            read_interleaved_coeff_block(
                r,
                c_length,
                &mut self.c1_coeffs[c_range.clone()],
                &mut self.c2_coeffs[c_range],
                &mut self.c_block_padding[index],
            )?;
        }
        self.generation += 1;
        Ok(())
    }

    /// Serialise the array to `w`.
    pub fn write<W: Write>(&self, w: &mut BitWriter<W>) -> Result<()> {
        let params = self.params;
        for (index, sx, sy) in params.iter_slice_indices_and_coords() {
            w.write_nbits(7, self.qindex[index] as u64)?;

            let bits_left = self.slice_bit_length(sx, sy).saturating_sub(7);
            let field_bits = intlog2(bits_left);
            w.write_nbits(field_bits, self.slice_y_length[index])?;
            let bits_left = bits_left - field_bits as u64;

            let true_y_length = self.slice_y_length[index].min(bits_left);
            let y_range = self.geometry.slice_coeff_range(&params, Component::Y, sx, sy);
            write_coeff_block(
                w,
                true_y_length,
                &self.y_coeffs[y_range],
                &self.y_block_padding[index],
            )?;

            let c_length = bits_left - true_y_length;
            let c_range = self
                .geometry
                .slice_coeff_range(&params, Component::C1, sx, sy);
            write_interleaved_coeff_block(
                w,
                c_length,
                &self.c1_coeffs[c_range.clone()],
                &self.c2_coeffs[c_range],
                &self.c_block_padding[index],
            )?;
        }
        Ok(())
    }
}

/// Borrowed view of a single low-delay slice.
#[derive(Debug, Clone, Copy)]
pub struct LdSliceView<'a> {
    array: &'a LdSliceArray,
    sx: usize,
    sy: usize,
}

impl<'a> LdSliceView<'a> {
    pub fn sx(&self) -> usize {
        self.sx
    }

    pub fn sy(&self) -> usize {
        self.sy
    }

    pub fn qindex(&self) -> u8 {
        self.array.qindex(self.sx, self.sy)
    }

    pub fn slice_y_length(&self) -> u64 {
        self.array.slice_y_length(self.sx, self.sy)
    }

    pub fn true_slice_y_length(&self) -> u64 {
        self.array.true_slice_y_length(self.sx, self.sy)
    }

    pub fn slice_c_length(&self) -> u64 {
        self.array.slice_c_length(self.sx, self.sy)
    }

    pub fn header_length(&self) -> u64 {
        self.array.header_length(self.sx, self.sy)
    }

    /// Total bit length of this slice in the bitstream.
    pub fn bit_length(&self) -> u64 {
        self.array.slice_bit_length(self.sx, self.sy)
    }

    pub fn y_block_padding(&self) -> &'a Bits {
        self.array.y_block_padding(self.sx, self.sy)
    }

    pub fn c_block_padding(&self) -> &'a Bits {
        self.array.c_block_padding(self.sx, self.sy)
    }

    pub fn component(&self, component: Component) -> ComponentView<'a> {
        self.array.component_view(component, self.sx, self.sy)
    }
}
