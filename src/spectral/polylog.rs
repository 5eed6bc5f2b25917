//! Polylogarithmic spectral shaping (PLTM) and its inverse (FWSM).
//!
//! The forward filter applies a smooth `k^(-s)` energy roll-off that
//! approximates the `1/f` decay of natural-image spectra. The inverse
//! filter (Frequency-Weighted Spectral Masking) undoes the roll-off while
//! gating out isolated spectral noise and capping single-bin impulses that
//! would otherwise show up as visible dots after the IDFT.

use super::fft::N;

/// Empirical FWSM noise-floor coefficient (`noise_floor = 0.0001 * sqrt(k)`).
pub const NOISE_FLOOR_COEFF: f32 = 0.0001;
/// Empirical FWSM impulse cap: no bin's reconstructed magnitude may exceed this.
pub const IMPULSE_CAP: f32 = 4.0;

/// Quantize the continuous decay parameter `s` (domain `[0, ~6)`) to the
/// 64-step table index used by both filters.
pub fn quantize_s(s: f32) -> usize {
    ((s * 10.0).floor() as i32).clamp(0, 63) as usize
}

fn s_q_for(s_idx: usize) -> f32 {
    s_idx as f32 * 0.1
}

/// Forward filter: bin 0 keeps weight 1; bins 1..64 are scaled by `k^(-s_q)`.
pub fn forward(re: &mut [f32; N], im: &mut [f32; N], s: f32) {
    let s_idx = quantize_s(s);
    let s_q = s_q_for(s_idx);
    for k in 1..N {
        let weight = (k as f32).powf(-s_q);
        re[k] *= weight;
        im[k] *= weight;
    }
}

/// Inverse filter (FWSM): noise-gates near-zero bins, reapplies the `k^(+s_q)`
/// boost, then clamps any bin whose magnitude exceeds [`IMPULSE_CAP`]. Bin 0
/// is left untouched.
pub fn inverse(re: &mut [f32; N], im: &mut [f32; N], s: f32) {
    let s_idx = quantize_s(s);
    let s_q = s_q_for(s_idx);
    for k in 1..N {
        let freq_factor = (k as f32).sqrt();
        let noise_floor = NOISE_FLOOR_COEFF * freq_factor;
        let sq_mag = re[k] * re[k] + im[k] * im[k];
        if sq_mag <= noise_floor * noise_floor {
            re[k] = 0.0;
            im[k] = 0.0;
            continue;
        }
        let weight = (k as f32).powf(s_q);
        re[k] *= weight;
        im[k] *= weight;

        let mag = (re[k] * re[k] + im[k] * im[k]).sqrt();
        if mag > IMPULSE_CAP {
            let rescale = IMPULSE_CAP / mag;
            re[k] *= rescale;
            im[k] *= rescale;
        }
    }
}
