//! Gradient-aligned permutation table.
//!
//! For each of the 256 possible [`AngleIndex`] values, precomputes the
//! bijection `[0..64) -> [0..64)` that reorders an 8x8 patch so that pixels
//! along the dominant gradient direction become spectrally adjacent. The
//! table is a process-lifetime constant, built once behind a `OnceLock` the
//! same way this codebase's other precomputed lookup tables are lazily
//! initialized on first use.

use std::f32::consts::PI;
use std::sync::OnceLock;

/// Integer in 0..256, the quantization of a normalized angle theta in [0, 2*PI).
pub type AngleIndex = u8;

const PATCH_SIDE: usize = 8;
pub const PATCH_LEN: usize = PATCH_SIDE * PATCH_SIDE;

/// `PERMUTATION_TABLE[i]` holds the 64 source indices (into the unsorted,
/// row-major patch) that land at each destination position after aligning
/// to `AngleIndex i`.
pub type PermutationMap = [u8; PATCH_LEN];

static PERMUTATION_TABLE: OnceLock<Vec<PermutationMap>> = OnceLock::new();

fn build_permutation_table() -> Vec<PermutationMap> {
    let mut table = Vec::with_capacity(256);
    for i in 0..256u32 {
        let angle_i = i as f32 * 2.0 * PI / 255.0;
        let (sin_a, cos_a) = angle_i.sin_cos();

        let mut order: Vec<(f32, usize)> = (0..PATCH_LEN)
            .map(|idx| {
                let x = (idx % PATCH_SIDE) as f32;
                let y = (idx / PATCH_SIDE) as f32;
                let projection = x * cos_a + y * sin_a;
                (projection, idx)
            })
            .collect();

        // Stable sort by projection ascending, original linear index as tie-break.
        order.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });

        let mut map = [0u8; PATCH_LEN];
        for (dest, &(_, src)) in order.iter().enumerate() {
            map[dest] = src as u8;
        }
        table.push(map);
    }
    table
}

/// The 256-entry permutation table, built on first access.
pub fn permutation_table() -> &'static [PermutationMap] {
    PERMUTATION_TABLE.get_or_init(build_permutation_table)
}

/// Look up the permutation map for a given angle index.
pub fn permutation_for(angle_index: AngleIndex) -> &'static PermutationMap {
    &permutation_table()[angle_index as usize]
}

/// Quantize a raw angle (any real value; normalized internally to `[0, 2*PI)`
/// by repeated add/subtract) to an `AngleIndex` via
/// `round-towards-zero(theta * 255 / (2*PI))`, clamped to `[0, 255]`.
pub fn quantize_angle(mut theta: f32) -> AngleIndex {
    let two_pi = 2.0 * PI;
    while theta < 0.0 {
        theta += two_pi;
    }
    while theta >= two_pi {
        theta -= two_pi;
    }
    let scaled = (theta * 255.0 / two_pi).trunc();
    scaled.clamp(0.0, 255.0) as AngleIndex
}

/// Scatter a permuted 64-sample buffer back into patch order: `out[perm[j]]
/// = permuted[j]`.
pub fn unpermute_into(permuted: &[f32; PATCH_LEN], map: &PermutationMap, out: &mut [f32; PATCH_LEN]) {
    for (j, &src) in map.iter().enumerate() {
        out[src as usize] = permuted[j];
    }
}

/// Gather a patch into permuted order: `permuted[j] = patch[perm[j]]`.
pub fn permute(patch: &[f32; PATCH_LEN], map: &PermutationMap) -> [f32; PATCH_LEN] {
    let mut out = [0.0f32; PATCH_LEN];
    permute_into(patch, map, &mut out);
    out
}

/// Same as [`permute`] but writes into a caller-supplied slice (`out.len()
/// >= PATCH_LEN`) instead of allocating, so pooled scratch buffers can be
/// used as the destination.
pub fn permute_into(patch: &[f32; PATCH_LEN], map: &PermutationMap, out: &mut [f32]) {
    for (j, &src) in map.iter().enumerate() {
        out[j] = patch[src as usize];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_angle_index_is_a_bijection() {
        for i in 0..=255u16 {
            let map = permutation_for(i as u8);
            let mut seen = [false; PATCH_LEN];
            for &src in map.iter() {
                assert!(!seen[src as usize], "angle {i} repeats source {src}");
                seen[src as usize] = true;
            }
            assert!(seen.iter().all(|&b| b), "angle {i} misses a source index");
        }
    }

    #[test]
    fn permute_then_unpermute_round_trips() {
        let patch: [f32; PATCH_LEN] = std::array::from_fn(|i| i as f32 / 64.0);
        let map = permutation_for(37);
        let permuted = permute(&patch, map);
        let mut back = [0.0f32; PATCH_LEN];
        unpermute_into(&permuted, map, &mut back);
        assert_eq!(patch, back);
    }

    #[test]
    fn angle_quantization_truncates_towards_zero() {
        // theta = 0 -> index 0
        assert_eq!(quantize_angle(0.0), 0);
        // a hair under 2*PI should not round up to 256/overflow
        assert_eq!(quantize_angle(2.0 * PI - 1e-6), 254);
    }

    #[test]
    fn angle_quantization_wraps_negative() {
        assert_eq!(quantize_angle(-0.0001), quantize_angle(2.0 * PI - 0.0001));
    }
}
