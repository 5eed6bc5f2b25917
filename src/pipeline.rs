//! Patch Pipeline: the pure function wiring Gradient Analyzer -> Permutation
//! -> FFT -> polylog filter -> threshold sparsifier (forward), and its
//! mirror image for reconstruction.
//!
//! Both directions draw their scratch state from a caller-supplied
//! [`ScratchPools`] rather than allocating fresh `Vec`s per patch (§5's
//! pooling requirement): a 128-float buffer backs the interleaved re/im
//! spectral array (first 64 floats `re`, next 64 `im`), and a 64-float
//! buffer backs the reconstructed pixel patch.

use std::sync::atomic::{AtomicBool, Ordering};

use num_complex::Complex32;

use crate::patch::{self, permutation, Patch};
use crate::pool::ScratchPools;
use crate::spectral::{fft, polylog, threshold};

/// One non-zero spectral bin kept after sparsification: its index and its
/// complex value, still in full precision (quantization to int8 happens in
/// the container layer, which also needs `MaxVal`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coeff {
    pub k: u8,
    pub value: Complex32,
}

/// Output of the forward patch pipeline: the angle used to align the patch,
/// and the sparse set of surviving coefficients in ascending bin order.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardPatch {
    pub angle_index: permutation::AngleIndex,
    pub coeffs: Vec<Coeff>,
}

/// Run the full forward pipeline on one edge-clamped 8x8 patch, drawing its
/// scratch coefficient buffer from `pools`.
pub fn forward(pools: &ScratchPools, patch_samples: &Patch, s: f32, t: f32) -> ForwardPatch {
    let gradient = patch::analyze(patch_samples);
    let angle_index = permutation::quantize_angle(gradient.angle);
    let map = permutation::permutation_for(angle_index);

    let mut coeff_buf = pools.coeffs.take();
    let coeffs = {
        let (re_slice, im_slice) = coeff_buf.split_at_mut(fft::N);
        permutation::permute_into(patch_samples, map, re_slice);
        let re: &mut [f32; fft::N] = re_slice.try_into().unwrap();
        let im: &mut [f32; fft::N] = im_slice.try_into().unwrap();

        fft::fft(re, im);
        polylog::forward(re, im, s);
        threshold::sparsify(re, im, t);

        let mut out = Vec::new();
        for k in 0..fft::N {
            if re[k] != 0.0 || im[k] != 0.0 {
                out.push(Coeff { k: k as u8, value: Complex32::new(re[k], im[k]) });
            }
        }
        out
    };
    pools.coeffs.give(coeff_buf);

    ForwardPatch { angle_index, coeffs }
}

/// Run the full inverse pipeline, reconstructing a clamped-to-`[0,1]` 8x8
/// patch from a sparse coefficient set and the angle used to encode it.
///
/// `degenerate_warned` is shared across every patch of the plane being
/// reconstructed: a non-finite sample is still clamped to zero every time
/// (§7's clamp-and-continue policy), but the `warn!` that reports it fires
/// only once per plane, not once per patch, to avoid flooding the log on
/// pathological input.
pub fn inverse(
    pools: &ScratchPools,
    angle_index: permutation::AngleIndex,
    coeffs: &[Coeff],
    s: f32,
    degenerate_warned: &AtomicBool,
) -> Patch {
    let mut coeff_buf = pools.coeffs.take();
    let mut pixel_buf = pools.pixels.take();
    {
        let (re_slice, im_slice) = coeff_buf.split_at_mut(fft::N);
        for c in coeffs {
            re_slice[c.k as usize] = c.value.re;
            im_slice[c.k as usize] = c.value.im;
        }
        let re: &mut [f32; fft::N] = re_slice.try_into().unwrap();
        let im: &mut [f32; fft::N] = im_slice.try_into().unwrap();

        polylog::inverse(re, im, s);
        fft::ifft(re, im);

        let map = permutation::permutation_for(angle_index);
        let out: &mut [f32; patch::PATCH_LEN] = (&mut pixel_buf[..]).try_into().unwrap();
        permutation::unpermute_into(re, map, out);
    }
    pools.coeffs.give(coeff_buf);

    let mut out = [0.0f32; patch::PATCH_LEN];
    for (i, v) in pixel_buf.iter().enumerate() {
        let mut v = *v;
        if !v.is_finite() {
            if !degenerate_warned.swap(true, Ordering::Relaxed) {
                log::warn!(
                    "clamping non-finite sample after inverse transform (further occurrences in this plane suppressed)"
                );
            }
            v = 0.0;
        }
        out[i] = v.clamp(0.0, 1.0);
    }
    pools.pixels.give(pixel_buf);
    out
}
