//! Gradient Analyzer: computes the dominant (dx, dy, magnitude, angle) of an
//! 8x8 patch from forward differences.

use super::permutation::PATCH_LEN;

const PATCH_SIDE: usize = 8;

/// Result of analyzing a patch's dominant gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientResult {
    pub dx: f32,
    pub dy: f32,
    pub magnitude: f32,
    /// In `(-PI, PI]`. Defined even for flat patches: `atan2(0, 0) == 0` by
    /// contract here.
    pub angle: f32,
}

/// Sum forward differences along x over all 8 rows and 7 column-pairs (56
/// pairs total), and along y symmetrically, then average each by 56.0.
pub fn analyze(patch: &[f32; PATCH_LEN]) -> GradientResult {
    let mut sum_dx = 0.0f32;
    let mut sum_dy = 0.0f32;

    for y in 0..PATCH_SIDE {
        for x in 0..PATCH_SIDE - 1 {
            let a = patch[y * PATCH_SIDE + x];
            let b = patch[y * PATCH_SIDE + x + 1];
            sum_dx += b - a;
        }
    }
    for x in 0..PATCH_SIDE {
        for y in 0..PATCH_SIDE - 1 {
            let a = patch[y * PATCH_SIDE + x];
            let b = patch[(y + 1) * PATCH_SIDE + x];
            sum_dy += b - a;
        }
    }

    let dx = sum_dx / 56.0;
    let dy = sum_dy / 56.0;
    let magnitude = (dx * dx + dy * dy).sqrt();
    let angle = dy.atan2(dx);

    GradientResult { dx, dy, magnitude, angle }
}
