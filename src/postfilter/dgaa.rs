//! Directional Guided Antialiasing (DGAA).
//!
//! Per pixel (ignoring a 1-pixel border so every 3x3 neighborhood is fully
//! in-bounds): an impulse despeckle check runs first; if it doesn't fire,
//! a 3x3 Sobel gradient (summed over R/G/B, divided by 3) decides whether
//! to blend the center with its two along-edge neighbors.

use rayon::prelude::*;

use super::RgbaBuffer;

const IMPULSE_THRESHOLD: i32 = 100;
const EDGE_THRESHOLD: f32 = 30.0;

fn mean_channel(px: [u8; 4]) -> i32 {
    (px[0] as i32 + px[1] as i32 + px[2] as i32) / 3
}

fn is_impulse(center: [u8; 4], neighbors: &[[u8; 4]; 8]) -> bool {
    let c = mean_channel(center);
    neighbors.iter().all(|&n| (mean_channel(n) - c).abs() >= IMPULSE_THRESHOLD)
}

fn neighbor_mean(neighbors: &[[u8; 4]; 8], center_alpha: u8) -> [u8; 4] {
    let mut sum = [0i32; 3];
    for n in neighbors {
        for c in 0..3 {
            sum[c] += n[c] as i32;
        }
    }
    [(sum[0] / 8) as u8, (sum[1] / 8) as u8, (sum[2] / 8) as u8, center_alpha]
}

fn sobel(src: &RgbaBuffer, x: usize, y: usize) -> (f32, f32) {
    // Kernel rows top..bottom, columns left..right.
    const GX: [[i32; 3]; 3] = [[-1, 0, 1], [-2, 0, 2], [-1, 0, 1]];
    const GY: [[i32; 3]; 3] = [[-1, -2, -1], [0, 0, 0], [1, 2, 1]];

    let mut gx_sum = 0i32;
    let mut gy_sum = 0i32;
    for c in 0..3 {
        let mut gx = 0i32;
        let mut gy = 0i32;
        for (ky, row) in GX.iter().enumerate() {
            for (kx, &wx) in row.iter().enumerate() {
                let sx = x + kx - 1;
                let sy = y + ky - 1;
                let v = src.pixel(sx, sy)[c] as i32;
                gx += wx * v;
                gy += GY[ky][kx] * v;
            }
        }
        gx_sum += gx;
        gy_sum += gy;
    }
    (gx_sum as f32 / 3.0, gy_sum as f32 / 3.0)
}

fn gather_8_neighbors(src: &RgbaBuffer, x: usize, y: usize) -> [[u8; 4]; 8] {
    [
        src.pixel(x - 1, y - 1),
        src.pixel(x, y - 1),
        src.pixel(x + 1, y - 1),
        src.pixel(x - 1, y),
        src.pixel(x + 1, y),
        src.pixel(x - 1, y + 1),
        src.pixel(x, y + 1),
        src.pixel(x + 1, y + 1),
    ]
}

fn process_pixel(src: &RgbaBuffer, x: usize, y: usize) -> [u8; 4] {
    let center = src.pixel(x, y);
    if x == 0 || y == 0 || x + 1 >= src.width || y + 1 >= src.height {
        return center;
    }

    let neighbors = gather_8_neighbors(src, x, y);
    if is_impulse(center, &neighbors) {
        return neighbor_mean(&neighbors, center[3]);
    }

    let (gx, gy) = sobel(src, x, y);
    if (gx * gx + gy * gy).sqrt() <= EDGE_THRESHOLD {
        return center;
    }

    // Along-edge neighbors: when the horizontal gradient dominates the
    // edge runs vertically, so blend along y; otherwise blend along x.
    let (n1, n2) = if gx.abs() > gy.abs() {
        (src.pixel(x, y - 1), src.pixel(x, y + 1))
    } else {
        (src.pixel(x - 1, y), src.pixel(x + 1, y))
    };

    let mut out = center;
    for c in 0..3 {
        out[c] = (((2 * center[c] as i32 + n1[c] as i32 + n2[c] as i32) / 4).clamp(0, 255)) as u8;
    }
    out
}

/// Apply the DGAA pass over the whole buffer; border pixels pass through
/// unchanged.
pub fn apply(src: &RgbaBuffer) -> RgbaBuffer {
    let width = src.width;
    let height = src.height;
    let mut dst = RgbaBuffer::new(width, height);

    log::trace!("dispatching {height} rows to the worker pool for DGAA");
    let rows: Vec<Vec<[u8; 4]>> =
        (0..height).into_par_iter().map(|y| (0..width).map(|x| process_pixel(src, x, y)).collect()).collect();

    for (y, row) in rows.into_iter().enumerate() {
        for (x, px) in row.into_iter().enumerate() {
            dst.set_pixel(x, y, px);
        }
    }
    dst
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_image_is_untouched() {
        let mut buf = RgbaBuffer::new(8, 8);
        for y in 0..8 {
            for x in 0..8 {
                buf.set_pixel(x, y, [100, 100, 100, 255]);
            }
        }
        let out = apply(&buf);
        assert_eq!(out.data, buf.data);
    }

    #[test]
    fn single_pixel_impulse_is_despeckled() {
        let mut buf = RgbaBuffer::new(8, 8);
        for y in 0..8 {
            for x in 0..8 {
                buf.set_pixel(x, y, [50, 50, 50, 255]);
            }
        }
        buf.set_pixel(4, 4, [255, 255, 255, 255]);
        let out = apply(&buf);
        let px = out.pixel(4, 4);
        assert_eq!(px[0], 50);
        assert_eq!(px[1], 50);
    }

    #[test]
    fn border_pixels_pass_through() {
        let mut buf = RgbaBuffer::new(4, 4);
        for i in 0..buf.data.len() {
            buf.data[i] = (i % 251) as u8;
        }
        let out = apply(&buf);
        assert_eq!(out.pixel(0, 0), buf.pixel(0, 0));
        assert_eq!(out.pixel(3, 3), buf.pixel(3, 3));
    }
}
