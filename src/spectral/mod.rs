//! Spectral Core: the 64-point FFT/IFFT, polylogarithmic forward/inverse
//! weighting, and the hard-threshold sparsifier.

pub mod fft;
pub mod polylog;
pub mod threshold;

pub use fft::N as FFT_SIZE;
