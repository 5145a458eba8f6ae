//! High-quality slice arrays (13.5.4).
//!
//! High-quality slices are byte oriented: an optional run of prefix bytes,
//! an 8-bit qindex, then for each of Y, C1 and C2 an 8-bit length field and
//! a coefficient block of `length * slice_size_scaler` bytes. Unused space
//! in each block is kept as a padding bit string.

use std::io::Write;

use serde::{Deserialize, Serialize};
use tracing::debug;

use vc2stream_io::{BitReader, BitWriter, Bits};

use crate::coeff_io::{read_coeff_block, write_coeff_block};
use crate::error::Result;
use crate::params::{Component, SliceArrayParams, SliceGeometry};
use crate::views::ComponentView;

/// The slice data of a high-quality picture (or picture fragment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HqSliceArray {
    params: SliceArrayParams,
    geometry: SliceGeometry,
    generation: u64,
    slice_prefix_bytes: usize,
    slice_size_scaler: u64,
    prefix_bytes: Vec<Vec<u8>>,
    qindex: Vec<u8>,
    slice_y_length: Vec<u64>,
    slice_c1_length: Vec<u64>,
    slice_c2_length: Vec<u64>,
    y_coeffs: Vec<i64>,
    c1_coeffs: Vec<i64>,
    c2_coeffs: Vec<i64>,
    y_block_padding: Vec<Bits>,
    c1_block_padding: Vec<Bits>,
    c2_block_padding: Vec<Bits>,
}

impl HqSliceArray {
    pub fn new(params: SliceArrayParams, slice_prefix_bytes: usize, slice_size_scaler: u64) -> Self {
        let mut array = HqSliceArray {
            params,
            geometry: SliceGeometry::compute(&params),
            generation: 0,
            slice_prefix_bytes,
            slice_size_scaler,
            prefix_bytes: Vec::new(),
            qindex: Vec::new(),
            slice_y_length: Vec::new(),
            slice_c1_length: Vec::new(),
            slice_c2_length: Vec::new(),
            y_coeffs: Vec::new(),
            c1_coeffs: Vec::new(),
            c2_coeffs: Vec::new(),
            y_block_padding: Vec::new(),
            c1_block_padding: Vec::new(),
            c2_block_padding: Vec::new(),
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

    /// Monotonic counter bumped by every regeneration and mutation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn slice_prefix_bytes(&self) -> usize {
        self.slice_prefix_bytes
    }

    pub fn slice_size_scaler(&self) -> u64 {
        self.slice_size_scaler
    }

    pub fn set_slice_scaling(&mut self, slice_prefix_bytes: usize, slice_size_scaler: u64) {
        self.slice_prefix_bytes = slice_prefix_bytes;
        self.slice_size_scaler = slice_size_scaler;
        self.generation += 1;
    }

    /// Apply a batch of geometry changes, then regenerate the buffers once.
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
            "regenerating high-quality slice array"
        );
        self.prefix_bytes.resize(slices, Vec::new());
        self.qindex.resize(slices, 0);
        self.slice_y_length.resize(slices, 0);
        self.slice_c1_length.resize(slices, 0);
        self.slice_c2_length.resize(slices, 0);
        self.y_block_padding.resize(slices, Bits::new());
        self.c1_block_padding.resize(slices, Bits::new());
        self.c2_block_padding.resize(slices, Bits::new());
        self.y_coeffs.resize(self.geometry.luma_coeffs_len, 0);
        self.c1_coeffs.resize(self.geometry.color_diff_coeffs_len, 0);
        self.c2_coeffs.resize(self.geometry.color_diff_coeffs_len, 0);
        self.generation += 1;
    }

    pub fn prefix_bytes(&self, sx: usize, sy: usize) -> &[u8] {
        &self.prefix_bytes[self.params.to_slice_index(sx, sy)]
    }

    pub fn set_prefix_bytes(&mut self, sx: usize, sy: usize, bytes: Vec<u8>) {
        let index = self.params.to_slice_index(sx, sy);
        self.prefix_bytes[index] = bytes;
        self.generation += 1;
    }

    pub fn qindex(&self, sx: usize, sy: usize) -> u8 {
        self.qindex[self.params.to_slice_index(sx, sy)]
    }

    pub fn set_qindex(&mut self, sx: usize, sy: usize, qindex: u8) {
        let index = self.params.to_slice_index(sx, sy);
        self.qindex[index] = qindex;
        self.generation += 1;
    }

    /// The raw 8-bit length field of a component block; the block occupies
    /// `length * slice_size_scaler` bytes.
    pub fn slice_length(&self, component: Component, sx: usize, sy: usize) -> u64 {
        self.lengths(component)[self.params.to_slice_index(sx, sy)]
    }

    pub fn set_slice_length(&mut self, component: Component, sx: usize, sy: usize, length: u64) {
        let index = self.params.to_slice_index(sx, sy);
        match component {
            Component::Y => self.slice_y_length[index] = length,
            Component::C1 => self.slice_c1_length[index] = length,
            Component::C2 => self.slice_c2_length[index] = length,
        }
        self.generation += 1;
    }

    fn lengths(&self, component: Component) -> &[u64] {
        match component {
            Component::Y => &self.slice_y_length,
            Component::C1 => &self.slice_c1_length,
            Component::C2 => &self.slice_c2_length,
        }
    }

    pub fn block_padding(&self, component: Component, sx: usize, sy: usize) -> &Bits {
        let index = self.params.to_slice_index(sx, sy);
        match component {
            Component::Y => &self.y_block_padding[index],
            Component::C1 => &self.c1_block_padding[index],
            Component::C2 => &self.c2_block_padding[index],
        }
    }

    pub fn set_block_padding(&mut self, component: Component, sx: usize, sy: usize, padding: Bits) {
        let index = self.params.to_slice_index(sx, sy);
        match component {
            Component::Y => self.y_block_padding[index] = padding,
            Component::C1 => self.c1_block_padding[index] = padding,
            Component::C2 => self.c2_block_padding[index] = padding,
        }
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
    pub fn slice_view(&self, sx: usize, sy: usize) -> HqSliceView<'_> {
        HqSliceView {
            array: self,
            sx,
            sy,
        }
    }

    /// Bit length of one slice in the bitstream, from the stored length
    /// fields.
    pub fn slice_bit_length(&self, sx: usize, sy: usize) -> u64 {
        let index = self.params.to_slice_index(sx, sy);
        let blocks = self.slice_y_length[index]
            + self.slice_c1_length[index]
            + self.slice_c2_length[index];
        8 * self.slice_prefix_bytes as u64 + 8 + 3 * 8 + 8 * self.slice_size_scaler * blocks
    }

    /// Total bit length of the whole array in the bitstream.
    pub fn bit_length(&self) -> u64 {
        self.params
            .iter_slice_indices_and_coords()
            .map(|(_, sx, sy)| self.slice_bit_length(sx, sy))
            .sum()
    }

    /// Deserialise the array from `r`, regenerating buffers from the current
    /// geometry first.
    pub fn read(&mut self, r: &mut BitReader<'_>) -> Result<()> {
        self.regenerate();
        let params = self.params;
        for (index, sx, sy) in params.iter_slice_indices_and_coords() {
            self.prefix_bytes[index] = r.read_nbytes(self.slice_prefix_bytes);
            self.qindex[index] = r.read_nbits(8)? as u8;

            let y_length = r.read_nbits(8)?;
            self.slice_y_length[index] = y_length;
            let y_range = self.geometry.slice_coeff_range(&params, Component::Y, sx, sy);
            read_coeff_block(
                r,
                8 * self.slice_size_scaler * y_length,
                &mut self.y_coeffs[y_range],
                &mut self.y_block_padding[index],
            )?;

            let c1_length = r.read_nbits(8)?;
            self.slice_c1_length[index] = c1_length;
            let c1_range = self
                .geometry
                .slice_coeff_range(&params, Component::C1, sx, sy);
            read_coeff_block(
                r,
                8 * self.slice_size_scaler * c1_length,
                &mut self.c1_coeffs[c1_range],
                &mut self.c1_block_padding[index],
            )?;

            let c2_length = r.read_nbits(8)?;
            self.slice_c2_length[index] = c2_length;
            let c2_range = self
                .geometry
                .slice_coeff_range(&params, Component::C2, sx, sy);
            read_coeff_block(
                r,
                8 * self.slice_size_scaler * c2_length,
                &mut self.c2_coeffs[c2_range],
                &mut self.c2_block_padding[index],
            )?;
        }
        self.generation += 1;
        Ok(())
    }

    /// Serialise the array to `w`.
    pub fn write<W: Write>(&self, w: &mut BitWriter<W>) -> Result<()> {
        let params = self.params;
        for (index, sx, sy) in params.iter_slice_indices_and_coords() {
            w.write_nbytes(self.slice_prefix_bytes, &self.prefix_bytes[index])?;
            w.write_nbits(8, self.qindex[index] as u64)?;

            w.write_nbits(8, self.slice_y_length[index])?;
            let y_range = self.geometry.slice_coeff_range(&params, Component::Y, sx, sy);
            write_coeff_block(
                w,
                8 * self.slice_size_scaler * self.slice_y_length[index],
                &self.y_coeffs[y_range],
                &self.y_block_padding[index],
            )?;

            w.write_nbits(8, self.slice_c1_length[index])?;
            let c1_range = self
                .geometry
                .slice_coeff_range(&params, Component::C1, sx, sy);
            write_coeff_block(
                w,
                8 * self.slice_size_scaler * self.slice_c1_length[index],
                &self.c1_coeffs[c1_range],
                &self.c1_block_padding[index],
            )?;

            w.write_nbits(8, self.slice_c2_length[index])?;
            let c2_range = self
                .geometry
                .slice_coeff_range(&params, Component::C2, sx, sy);
            write_coeff_block(
                w,
                8 * self.slice_size_scaler * self.slice_c2_length[index],
                &self.c2_coeffs[c2_range],
                &self.c2_block_padding[index],
            )?;
        }
        Ok(())
    }
}

/// Borrowed view of a single high-quality slice.
#[derive(Debug, Clone, Copy)]
pub struct HqSliceView<'a> {
    array: &'a HqSliceArray,
    sx: usize,
    sy: usize,
}

impl<'a> HqSliceView<'a> {
    pub fn sx(&self) -> usize {
        self.sx
    }

    pub fn sy(&self) -> usize {
        self.sy
    }

    pub fn prefix_bytes(&self) -> &'a [u8] {
        self.array.prefix_bytes(self.sx, self.sy)
    }

    pub fn qindex(&self) -> u8 {
        self.array.qindex(self.sx, self.sy)
    }

    pub fn slice_length(&self, component: Component) -> u64 {
        self.array.slice_length(component, self.sx, self.sy)
    }

    pub fn block_padding(&self, component: Component) -> &'a Bits {
        self.array.block_padding(component, self.sx, self.sy)
    }

    /// Total bit length of this slice in the bitstream.
    pub fn bit_length(&self) -> u64 {
        self.array.slice_bit_length(self.sx, self.sy)
    }

    pub fn component(&self, component: Component) -> ComponentView<'a> {
        self.array.component_view(component, self.sx, self.sy)
    }
}
