//! Hard-threshold sparsifier: zero every spectral bin whose energy falls
//! below `threshold^2`.

use super::fft::N;

/// Zero bins with `re^2 + im^2 < threshold^2`. Returns the keep-count `K`.
pub fn sparsify(re: &mut [f32; N], im: &mut [f32; N], threshold: f32) -> usize {
    let t_sq = threshold * threshold;
    let mut keep = 0usize;
    for k in 0..N {
        let sq_mag = re[k] * re[k] + im[k] * im[k];
        if sq_mag < t_sq {
            re[k] = 0.0;
            im[k] = 0.0;
        } else {
            keep += 1;
        }
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_threshold_keeps_everything_nonzero() {
        let mut re: [f32; N] = std::array::from_fn(|i| i as f32);
        let mut im = [0.0f32; N];
        let k = sparsify(&mut re, &mut im, 0.0);
        // bin 0 has value 0.0 -> below threshold^2 == 0? 0 < 0 is false, so it
        // is kept (sq_mag == 0, threshold 0 => 0 < 0 is false => kept).
        assert_eq!(k, N);
    }

    #[test]
    fn large_threshold_zeroes_all_bins() {
        let mut re: [f32; N] = std::array::from_fn(|i| i as f32 * 0.01);
        let mut im = [0.0f32; N];
        let k = sparsify(&mut re, &mut im, 1000.0);
        assert_eq!(k, 0);
        assert!(re.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn partial_threshold_keeps_only_strong_bins() {
        let mut re = [0.0f32; N];
        let mut im = [0.0f32; N];
        re[0] = 10.0;
        re[1] = 0.01;
        let k = sparsify(&mut re, &mut im, 1.0);
        assert_eq!(k, 1);
        assert_eq!(re[0], 10.0);
        assert_eq!(re[1], 0.0);
    }
}
