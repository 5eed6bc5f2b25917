//! YCbCr plane decomposition (standard JFIF formulas), 4:2:0 chroma
//! subsampling by 2x2 averaging, and bilinear chroma upsampling.
//!
//! All samples are normalized floats in `[0, 1]`; alpha is not modeled here
//! (the caller fixes it at 255 when merging back to RGBA).

/// One color plane: row-major samples in `[0, 1]` over `width x height`.
#[derive(Debug, Clone)]
pub struct Plane {
    pub width: usize,
    pub height: usize,
    pub samples: Vec<f32>,
}

impl Plane {
    pub fn new(width: usize, height: usize) -> Self {
        Plane { width, height, samples: vec![0.0; width * height] }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.samples[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: f32) {
        self.samples[y * self.width + x] = v;
    }
}

/// Split an 8-bit RGB buffer into Y, Cb, Cr planes at full resolution using
/// the standard JFIF RGB->YCbCr formulas.
pub fn rgb_to_ycbcr_full(width: usize, height: usize, rgb: &[u8]) -> (Plane, Plane, Plane) {
    let mut y = Plane::new(width, height);
    let mut cb = Plane::new(width, height);
    let mut cr = Plane::new(width, height);

    for i in 0..width * height {
        let r = rgb[i * 3] as f32 / 255.0;
        let g = rgb[i * 3 + 1] as f32 / 255.0;
        let b = rgb[i * 3 + 2] as f32 / 255.0;

        y.samples[i] = 0.299 * r + 0.587 * g + 0.114 * b;
        cb.samples[i] = -0.168736 * r - 0.331264 * g + 0.5 * b + 0.5;
        cr.samples[i] = 0.5 * r - 0.418688 * g - 0.081312 * b + 0.5;
    }

    (y, cb, cr)
}

/// Downsample a chroma plane 2x in each dimension by 2x2-block averaging
/// (4:2:0). Destination dimensions are `width / 2, height / 2` (integer
/// division, per the container's plane-dimension contract); a trailing odd
/// row/column of the source is dropped, not folded in.
pub fn downsample_2x2(plane: &Plane) -> Plane {
    let dst_w = plane.width / 2;
    let dst_h = plane.height / 2;
    let mut out = Plane::new(dst_w, dst_h);

    for dy in 0..dst_h {
        for dx in 0..dst_w {
            let x0 = dx * 2;
            let x1 = dx * 2 + 1;
            let y0 = dy * 2;
            let y1 = dy * 2 + 1;
            let sum = plane.get(x0, y0) + plane.get(x1, y0) + plane.get(x0, y1) + plane.get(x1, y1);
            out.set(dx, dy, sum * 0.25);
        }
    }
    out
}

/// Bilinearly upsample a chroma plane to `(target_w, target_h)`.
pub fn upsample_bilinear(plane: &Plane, target_w: usize, target_h: usize) -> Plane {
    let mut out = Plane::new(target_w, target_h);
    if plane.width == 0 || plane.height == 0 {
        return out;
    }

    let scale_x = plane.width as f32 / target_w as f32;
    let scale_y = plane.height as f32 / target_h as f32;

    for ty in 0..target_h {
        let sy = ((ty as f32 + 0.5) * scale_y - 0.5).max(0.0);
        let y0 = sy.floor() as usize;
        let y1 = (y0 + 1).min(plane.height - 1);
        let fy = sy - y0 as f32;

        for tx in 0..target_w {
            let sx = ((tx as f32 + 0.5) * scale_x - 0.5).max(0.0);
            let x0 = sx.floor() as usize;
            let x1 = (x0 + 1).min(plane.width - 1);
            let fx = sx - x0 as f32;

            let x0 = x0.min(plane.width - 1);

            let top = plane.get(x0, y0) * (1.0 - fx) + plane.get(x1, y0) * fx;
            let bottom = plane.get(x0, y1) * (1.0 - fx) + plane.get(x1, y1) * fx;
            out.set(tx, ty, top * (1.0 - fy) + bottom * fy);
        }
    }
    out
}

/// Merge Y/Cb/Cr planes (all at full resolution) back to interleaved RGBA8,
/// alpha fixed at 255.
pub fn ycbcr_to_rgba(y: &Plane, cb: &Plane, cr: &Plane) -> Vec<u8> {
    let width = y.width;
    let height = y.height;
    let mut out = vec![0u8; width * height * 4];

    for i in 0..width * height {
        let yy = y.samples[i];
        let cb_v = cb.samples[i] - 0.5;
        let cr_v = cr.samples[i] - 0.5;

        let r = yy + 1.402 * cr_v;
        let g = yy - 0.344136 * cb_v - 0.714136 * cr_v;
        let b = yy + 1.772 * cb_v;

        out[i * 4] = to_u8(r);
        out[i * 4 + 1] = to_u8(g);
        out[i * 4 + 2] = to_u8(b);
        out[i * 4 + 3] = 255;
    }
    out
}

fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grey_round_trips_through_color_space() {
        let rgb = vec![128u8, 128, 128];
        let (y, cb, cr) = rgb_to_ycbcr_full(1, 1, &rgb);
        let rgba = ycbcr_to_rgba(&y, &cb, &cr);
        assert!((rgba[0] as i32 - 128).abs() <= 1);
        assert!((rgba[1] as i32 - 128).abs() <= 1);
        assert!((rgba[2] as i32 - 128).abs() <= 1);
        assert_eq!(rgba[3], 255);
    }

    #[test]
    fn downsample_averages_2x2_blocks() {
        let mut plane = Plane::new(2, 2);
        plane.set(0, 0, 0.0);
        plane.set(1, 0, 1.0);
        plane.set(0, 1, 1.0);
        plane.set(1, 1, 0.0);
        let down = downsample_2x2(&plane);
        assert_eq!(down.width, 1);
        assert_eq!(down.height, 1);
        assert!((down.get(0, 0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn downsample_drops_trailing_odd_row_and_column() {
        // 3x3 source: only the top-left 2x2 block contributes; the trailing
        // row/column (index 2) is dropped by integer division, not folded
        // into a clamped 2x2 average.
        let mut plane = Plane::new(3, 3);
        for y in 0..3 {
            for x in 0..3 {
                plane.set(x, y, if x == 2 || y == 2 { 1.0 } else { 0.0 });
            }
        }
        let down = downsample_2x2(&plane);
        assert_eq!(down.width, 1);
        assert_eq!(down.height, 1);
        assert!((down.get(0, 0) - 0.0).abs() < 1e-6);
    }

    #[test]
    fn upsample_preserves_constant_planes() {
        let mut plane = Plane::new(2, 2);
        for s in plane.samples.iter_mut() {
            *s = 0.42;
        }
        let up = upsample_bilinear(&plane, 4, 4);
        for &s in &up.samples {
            assert!((s - 0.42).abs() < 1e-6);
        }
    }
}
