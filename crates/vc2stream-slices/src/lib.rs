//! Transform-coefficient slice data model for VC-2 pictures.
//!
//! A VC-2 picture is divided into a regular grid of slices, each carrying a
//! quantisation index and, per colour component, the wavelet coefficients of
//! every subband restricted to that slice. This crate models the two slice
//! serialisations (low-delay and high-quality) as geometry-aware containers:
//!
//! - [`SliceArrayParams`] captures every upstream bitstream value the slice
//!   geometry depends on (frame dimensions, transform depths, slice grid,
//!   fragment start offsets).
//! - [`LdSliceArray`] / [`HqSliceArray`] own one flat coefficient buffer per
//!   component, laid out slice-major, subband-minor, row-major, together
//!   with the per-slice header fields and bounded-block padding needed for
//!   bit-exact round trips.
//! - [`LdSliceView`] / [`HqSliceView`] and the component/subband views
//!   expose borrowed, geometry-resolved access to a single slice, component
//!   or subband, including 2D indexing.
//!
//! Changing any geometry input regenerates the buffers, preserving values
//! whose indices survive; a generation counter lets dependent caches detect
//! staleness.

mod coeff_io;
pub mod error;
pub mod geometry;
pub mod hq;
pub mod ld;
pub mod params;
pub mod views;

pub use error::{Result, SliceError};
pub use geometry::{
    component_subband_dimensions, intlog2, num_subband_levels, num_subbands, slice_coeff_offset,
    slice_subband_bounds, subband_dimensions, to_coeff_index, Orientation, SubbandLabel,
};
pub use hq::{HqSliceArray, HqSliceView};
pub use ld::{LdSliceArray, LdSliceView};
pub use params::{Component, SliceArrayParams, SliceGeometry};
pub use views::{ComponentSubbandView, ComponentView};
