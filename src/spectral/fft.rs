//! Radix-2 Cooley-Tukey FFT/IFFT fixed at 64 points.
//!
//! Bit-reversal permutation and both forward/inverse twiddle factors are
//! precomputed once behind a `OnceLock`, the same lazy-table idiom used
//! elsewhere in this crate. Operates on parallel `re`/`im` arrays of
//! `num_complex::Complex32` components kept split (not `Complex<f32>`
//! throughout) so the butterfly inner loop reads/writes contiguous `f32`
//! slices.

use std::sync::OnceLock;

pub const N: usize = 64;
const LOG2_N: u32 = 6;

struct Tables {
    bit_reversal: [u8; N],
    /// Forward twiddles: `exp(-2*pi*i*k/N)` for `k` in `0..N/2`.
    fwd_cos: [f32; N / 2],
    fwd_sin: [f32; N / 2],
    /// Inverse twiddles: `exp(+2*pi*i*k/N)` for `k` in `0..N/2`.
    inv_cos: [f32; N / 2],
    inv_sin: [f32; N / 2],
}

static TABLES: OnceLock<Tables> = OnceLock::new();

fn bit_reverse_6(mut v: usize) -> usize {
    let mut r = 0usize;
    for _ in 0..LOG2_N {
        r = (r << 1) | (v & 1);
        v >>= 1;
    }
    r
}

fn build_tables() -> Tables {
    let mut bit_reversal = [0u8; N];
    for i in 0..N {
        bit_reversal[i] = bit_reverse_6(i) as u8;
    }
    let mut fwd_cos = [0.0f32; N / 2];
    let mut fwd_sin = [0.0f32; N / 2];
    let mut inv_cos = [0.0f32; N / 2];
    let mut inv_sin = [0.0f32; N / 2];
    for k in 0..N / 2 {
        let theta = -2.0 * std::f32::consts::PI * k as f32 / N as f32;
        fwd_cos[k] = theta.cos();
        fwd_sin[k] = theta.sin();
        inv_cos[k] = theta.cos();
        inv_sin[k] = -theta.sin();
    }
    Tables { bit_reversal, fwd_cos, fwd_sin, inv_cos, inv_sin }
}

fn tables() -> &'static Tables {
    TABLES.get_or_init(build_tables)
}

fn butterfly(re: &mut [f32; N], im: &mut [f32; N], cos_tab: &[f32; N / 2], sin_tab: &[f32; N / 2]) {
    let mut size = 2usize;
    while size <= N {
        let half = size / 2;
        let stride = N / size;
        let mut start = 0usize;
        while start < N {
            for j in 0..half {
                let twiddle_idx = j * stride;
                let w_re = cos_tab[twiddle_idx];
                let w_im = sin_tab[twiddle_idx];

                let a = start + j;
                let b = start + j + half;

                let b_re = re[b] * w_re - im[b] * w_im;
                let b_im = re[b] * w_im + im[b] * w_re;

                let a_re = re[a];
                let a_im = im[a];

                re[a] = a_re + b_re;
                im[a] = a_im + b_im;
                re[b] = a_re - b_re;
                im[b] = a_im - b_im;
            }
            start += size;
        }
        size *= 2;
    }
}

/// In-place forward FFT. `im` is expected to be all-zero on entry (real
/// input); both arrays are overwritten with the 64-point spectrum.
pub fn fft(re: &mut [f32; N], im: &mut [f32; N]) {
    let t = tables();
    bit_reverse_permute(re, im, &t.bit_reversal);
    butterfly(re, im, &t.fwd_cos, &t.fwd_sin);
}

/// In-place inverse FFT. Divides every output sample by `N` after the
/// butterfly passes.
pub fn ifft(re: &mut [f32; N], im: &mut [f32; N]) {
    let t = tables();
    bit_reverse_permute(re, im, &t.bit_reversal);
    butterfly(re, im, &t.inv_cos, &t.inv_sin);
    let scale = 1.0 / N as f32;
    for i in 0..N {
        re[i] *= scale;
        im[i] *= scale;
    }
}

fn bit_reverse_permute(re: &mut [f32; N], im: &mut [f32; N], bit_reversal: &[u8; N]) {
    for i in 0..N {
        let j = bit_reversal[i] as usize;
        if j > i {
            re.swap(i, j);
            im.swap(i, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_dft(re_in: &[f32; N], im_in: &[f32; N], sign: f32) -> ([f32; N], [f32; N]) {
        let mut re_out = [0.0f32; N];
        let mut im_out = [0.0f32; N];
        for k in 0..N {
            let mut acc_re = 0.0f64;
            let mut acc_im = 0.0f64;
            for n in 0..N {
                let theta = sign as f64 * 2.0 * std::f64::consts::PI * (k * n) as f64 / N as f64;
                let (s, c) = theta.sin_cos();
                acc_re += re_in[n] as f64 * c - im_in[n] as f64 * s;
                acc_im += re_in[n] as f64 * s + im_in[n] as f64 * c;
            }
            re_out[k] = acc_re as f32;
            im_out[k] = acc_im as f32;
        }
        (re_out, im_out)
    }

    #[test]
    fn forward_fft_matches_reference_dft() {
        let mut re: [f32; N] = std::array::from_fn(|i| (i as f32 * 0.137).sin());
        let mut im = [0.0f32; N];
        let (ref_re, ref_im) = reference_dft(&re, &[0.0; N], -1.0);
        fft(&mut re, &mut im);
        for i in 0..N {
            assert!((re[i] - ref_re[i]).abs() < 1e-2, "re[{i}]: {} vs {}", re[i], ref_re[i]);
            assert!((im[i] - ref_im[i]).abs() < 1e-2, "im[{i}]: {} vs {}", im[i], ref_im[i]);
        }
    }

    #[test]
    fn fft_then_ifft_round_trips_p2() {
        let original: [f32; N] = std::array::from_fn(|i| ((i * 7 % 13) as f32) / 13.0);
        let mut re = original;
        let mut im = [0.0f32; N];
        fft(&mut re, &mut im);
        ifft(&mut re, &mut im);
        for i in 0..N {
            assert!((re[i] - original[i]).abs() < 1e-4, "sample {i}: {} vs {}", re[i], original[i]);
            assert!(im[i].abs() < 1e-4);
        }
    }

    #[test]
    fn dc_only_input_produces_flat_spectrum_bin_zero() {
        let mut re = [1.0f32; N];
        let mut im = [0.0f32; N];
        fft(&mut re, &mut im);
        assert!((re[0] - N as f32).abs() < 1e-3);
        for k in 1..N {
            assert!(re[k].abs() < 1e-2 && im[k].abs() < 1e-2);
        }
    }
}
