//! Bilateral line-continuity filter.
//!
//! Mops up residual broadband seam energy that survives deblocking and
//! DGAA. A pixel is "near seam" if `x mod 8 < 2 || x mod 8 >= 6 || y mod 8
//! < 2 || y mod 8 >= 6`; such pixels get a 7x7 bilateral filter
//! (`SigmaSpace=2.0`, `SigmaColor=22.0`) run twice in sequence, each pass
//! reading from the previous pass's output buffer.

use rayon::prelude::*;

use super::RgbaBuffer;

const SIGMA_SPACE: f32 = 2.0;
const SIGMA_COLOR: f32 = 22.0;
const RADIUS: i32 = 3; // 7x7 window

fn is_near_seam(x: usize, y: usize) -> bool {
    let xm = x % 8;
    let ym = y % 8;
    xm < 2 || xm >= 6 || ym < 2 || ym >= 6
}

fn color_distance(a: [u8; 4], b: [u8; 4]) -> f32 {
    let dr = a[0] as f32 - b[0] as f32;
    let dg = a[1] as f32 - b[1] as f32;
    let db = a[2] as f32 - b[2] as f32;
    (dr * dr + dg * dg + db * db).sqrt()
}

fn bilateral_pixel(src: &RgbaBuffer, x: usize, y: usize) -> [u8; 4] {
    let center = src.pixel(x, y);
    let mut sum = [0.0f32; 3];
    let mut weight_sum = 0.0f32;

    for dy in -RADIUS..=RADIUS {
        for dx in -RADIUS..=RADIUS {
            let sx = x as i32 + dx;
            let sy = y as i32 + dy;
            if sx < 0 || sy < 0 || sx as usize >= src.width || sy as usize >= src.height {
                continue;
            }
            let sample = src.pixel(sx as usize, sy as usize);
            let d_sq = (dx * dx + dy * dy) as f32;
            let spatial_weight = (-d_sq / (2.0 * SIGMA_SPACE * SIGMA_SPACE)).exp();
            let color_d = color_distance(center, sample);
            let color_weight = (-(color_d * color_d) / (2.0 * SIGMA_COLOR * SIGMA_COLOR)).exp();
            let weight = spatial_weight * color_weight;

            for c in 0..3 {
                sum[c] += sample[c] as f32 * weight;
            }
            weight_sum += weight;
        }
    }

    if weight_sum <= 0.0 {
        return center;
    }
    [
        (sum[0] / weight_sum).round().clamp(0.0, 255.0) as u8,
        (sum[1] / weight_sum).round().clamp(0.0, 255.0) as u8,
        (sum[2] / weight_sum).round().clamp(0.0, 255.0) as u8,
        center[3],
    ]
}

fn one_pass(src: &RgbaBuffer) -> RgbaBuffer {
    let width = src.width;
    let height = src.height;
    let mut dst = src.clone();

    log::trace!("dispatching {height} rows to the worker pool for the bilateral seam pass");
    let rows: Vec<(usize, Vec<(usize, [u8; 4])>)> = (0..height)
        .into_par_iter()
        .map(|y| {
            let row: Vec<(usize, [u8; 4])> = (0..width)
                .filter(|&x| is_near_seam(x, y))
                .map(|x| (x, bilateral_pixel(src, x, y)))
                .collect();
            (y, row)
        })
        .collect();

    for (y, row) in rows {
        for (x, px) in row {
            dst.set_pixel(x, y, px);
        }
    }
    dst
}

/// Apply two sequential bilateral passes over near-seam pixels.
pub fn apply(src: &RgbaBuffer) -> RgbaBuffer {
    let first = one_pass(src);
    one_pass(&first)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn far_from_seam_pixels_are_untouched() {
        let mut buf = RgbaBuffer::new(16, 16);
        for y in 0..16 {
            for x in 0..16 {
                buf.set_pixel(x, y, [((x * 7 + y * 13) % 256) as u8, 10, 20, 255]);
            }
        }
        let out = apply(&buf);
        // x=4,y=4 -> xm=4,ym=4, both in [2,6) so far from seam.
        assert_eq!(out.pixel(4, 4), buf.pixel(4, 4));
    }

    #[test]
    fn uniform_image_unaffected() {
        let mut buf = RgbaBuffer::new(16, 16);
        for y in 0..16 {
            for x in 0..16 {
                buf.set_pixel(x, y, [80, 80, 80, 255]);
            }
        }
        let out = apply(&buf);
        assert_eq!(out.data, buf.data);
    }
}
