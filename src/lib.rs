//! GAP: a patch-wise gradient-aligned spectral image codec.
//!
//! Each 8x8 pixel patch is analyzed for its dominant gradient direction,
//! permuted so that direction aligns with the scan order, transformed with a
//! 64-point DFT, reshaped in the frequency domain by a polylogarithmic
//! filter with noise-floor gating, sparsified by a hard magnitude threshold,
//! quantized to 8 bits, and range-coded across five per-plane byte streams.
//! Decoding reverses each stage and finishes with a post-reconstruction
//! filter chain that removes block-seam and ringing artifacts.
//!
//! See [`image::encode_rgb`], [`image::encode_gray`], and [`image::decode`]
//! for the top-level entry points.

pub mod color;
pub mod container;
pub mod entropy;
pub mod error;
pub mod header;
pub mod image;
pub mod patch;
pub mod pipeline;
pub mod pool;
pub mod postfilter;
pub mod spectral;

pub use error::{GapError, GapResult};
pub use header::Header;
pub use image::{decode, encode_gray, encode_rgb};
