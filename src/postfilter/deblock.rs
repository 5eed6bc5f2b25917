//! Block-seam deblocking filter.
//!
//! Operates on RGBA after YCbCr->RGB. For every vertical seam (a column `x`
//! at a multiple of 8, `8 <= x < W-1`) and every horizontal seam
//! (symmetrically for rows), a 4-tap stencil `(p2, p1, q0, q1)` straddling
//! the seam is evaluated per color channel; the cross-channel "difference"
//! used for the activity test is the max over R, G, B of the absolute
//! difference. The vertical pass runs to completion before the horizontal
//! pass starts (each is internally parallel over independent seam
//! columns/rows, but the two passes are sequential for stable output).

use rayon::prelude::*;

use super::RgbaBuffer;

const BETA: i32 = 12;
const NORM_THRESHOLD: i32 = 30;
const HIGH_THRESHOLD: i32 = 45;

fn max_channel_abs_diff(a: [u8; 4], b: [u8; 4]) -> i32 {
    (0..3).map(|c| (a[c] as i32 - b[c] as i32).abs()).max().unwrap()
}

fn smooth_tap(p2: u8, p1: u8, q0: u8, q1: u8) -> (u8, u8) {
    let p1p = (p2 as i32 + 2 * p1 as i32 + q0 as i32 + 2) / 4;
    let q0p = (p1 as i32 + 2 * q0 as i32 + q1 as i32 + 2) / 4;
    (p1p.clamp(0, 255) as u8, q0p.clamp(0, 255) as u8)
}

/// Decide whether a seam with taps `(p2, p1, q0, q1)` (all same channel, or
/// the cross-channel max metric) should be smoothed, and if so smooth every
/// channel of `p1`/`q1` in place.
fn maybe_smooth_seam(p2: [u8; 4], p1: &mut [u8; 4], q0: &mut [u8; 4], q1: [u8; 4]) {
    let flat_p = max_channel_abs_diff(p2, *p1) < BETA;
    let flat_q = max_channel_abs_diff(q1, *q0) < BETA;
    let d = max_channel_abs_diff(*q0, *p1);

    let threshold = if flat_p && flat_q { HIGH_THRESHOLD } else { NORM_THRESHOLD };
    if d >= threshold {
        return;
    }

    for c in 0..3 {
        let (p1c, q0c) = smooth_tap(p2[c], p1[c], q0[c], q1[c]);
        p1[c] = p1c;
        q0[c] = q0c;
    }
}

fn vertical_pass(src: &RgbaBuffer) -> RgbaBuffer {
    let mut dst = src.clone();
    let width = src.width;
    let height = src.height;

    let columns: Vec<usize> = (8..width.saturating_sub(1)).step_by(8).collect();
    log::trace!("dispatching {} vertical seam columns to the worker pool", columns.len());
    let rows_out: Vec<Vec<([u8; 4], [u8; 4])>> = columns
        .par_iter()
        .map(|&x| {
            (0..height)
                .map(|y| {
                    let p2 = src.pixel(x - 2, y);
                    let mut p1 = src.pixel(x - 1, y);
                    let mut q0 = src.pixel(x, y);
                    let q1 = src.pixel(x + 1, y);
                    maybe_smooth_seam(p2, &mut p1, &mut q0, q1);
                    (p1, q0)
                })
                .collect()
        })
        .collect();

    for (col_idx, &x) in columns.iter().enumerate() {
        for y in 0..height {
            let (p1, q0) = rows_out[col_idx][y];
            dst.set_pixel(x - 1, y, p1);
            dst.set_pixel(x, y, q0);
        }
    }
    dst
}

fn horizontal_pass(src: &RgbaBuffer) -> RgbaBuffer {
    let mut dst = src.clone();
    let width = src.width;
    let height = src.height;

    let rows: Vec<usize> = (8..height.saturating_sub(1)).step_by(8).collect();
    log::trace!("dispatching {} horizontal seam rows to the worker pool", rows.len());
    let cols_out: Vec<Vec<([u8; 4], [u8; 4])>> = rows
        .par_iter()
        .map(|&y| {
            (0..width)
                .map(|x| {
                    let p2 = src.pixel(x, y - 2);
                    let mut p1 = src.pixel(x, y - 1);
                    let mut q0 = src.pixel(x, y);
                    let q1 = src.pixel(x, y + 1);
                    maybe_smooth_seam(p2, &mut p1, &mut q0, q1);
                    (p1, q0)
                })
                .collect()
        })
        .collect();

    for (row_idx, &y) in rows.iter().enumerate() {
        for x in 0..width {
            let (p1, q0) = cols_out[row_idx][x];
            dst.set_pixel(x, y - 1, p1);
            dst.set_pixel(x, y, q0);
        }
    }
    dst
}

/// Apply the full deblocking stage: vertical seams first, then horizontal.
pub fn apply(src: &RgbaBuffer) -> RgbaBuffer {
    let after_vertical = vertical_pass(src);
    horizontal_pass(&after_vertical)
}
