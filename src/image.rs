//! Plane Pipeline: the top-level orchestration wiring color decomposition,
//! per-plane patch grids, the container codec, and the post-filter chain
//! into whole-image `encode`/`decode` entry points.
//!
//! Patches within a plane are processed in raster order: `patch_cursor =
//! row * cols + col`, row-major over `ceil(W/8) x ceil(H/8)` patches. The
//! forward direction computes every patch's record independently in
//! parallel and then appends them to the plane's streams in that order (the
//! streams themselves are order-sensitive; the per-patch math is not). The
//! inverse direction walks the decoded streams sequentially to materialize
//! each patch's record (the stream cursors are inherently stateful) and then
//! reconstructs every patch in parallel.

use std::sync::atomic::AtomicBool;

use rayon::prelude::*;

use crate::color::{self, Plane};
use crate::container::{decode_container, encode_container, DecodedPlaneStreams};
use crate::container::streams::{PatchRecord, PlaneStreamReader, PlaneStreams};
use crate::error::{GapError, GapResult};
use crate::header::Header;
use crate::patch::{self, PATCH_LEN};
use crate::pipeline;
use crate::pool::ScratchPools;
use crate::postfilter::{self, RgbaBuffer};

const PATCH: usize = 8;

/// Non-uniform chroma codec parameters: empirical constants, not derived
/// from the Y plane's `(s, t)` by any theoretical relationship.
const CHROMA_S_SCALE: f32 = 0.4;
const CHROMA_T_SCALE: f32 = 0.44;

fn patch_grid(width: usize, height: usize) -> (usize, usize) {
    let cols = (width + PATCH - 1) / PATCH;
    let rows = (height + PATCH - 1) / PATCH;
    (cols, rows)
}

fn chroma_dims(width: usize, height: usize) -> (usize, usize) {
    (width / 2, height / 2)
}

fn validate_params(s: f32, t: f32) -> GapResult<()> {
    if !s.is_finite() || s < 0.0 || s >= 6.4 {
        return Err(GapError::ParameterOutOfRange { name: "s", value: s });
    }
    if !t.is_finite() || t < 0.0 {
        return Err(GapError::ParameterOutOfRange { name: "threshold", value: t });
    }
    Ok(())
}

/// Run the forward pipeline over every patch of `plane`, in parallel, then
/// append the resulting records to the plane's five streams in raster
/// order.
fn encode_plane(plane: &Plane, s: f32, t: f32) -> PlaneStreams {
    let (cols, rows) = patch_grid(plane.width, plane.height);
    let total = cols * rows;
    let pools = ScratchPools::new();

    log::trace!("dispatching {total} patches ({cols}x{rows}) to the worker pool for forward transform");
    let records: Vec<PatchRecord> = (0..total)
        .into_par_iter()
        .map(|i| {
            let pr = i / cols;
            let pc = i % cols;
            let patch_samples =
                patch::extract_patch(&plane.samples, plane.width, plane.height, pc * PATCH, pr * PATCH);
            let fwd = pipeline::forward(&pools, &patch_samples, s, t);
            PatchRecord::quantize(&fwd)
        })
        .collect();

    let mut streams = PlaneStreams::new();
    for record in &records {
        streams.push(record);
    }
    streams
}

/// Reconstruct a `width x height` plane from its decoded streams.
fn decode_plane(width: usize, height: usize, streams: &DecodedPlaneStreams, s: f32) -> GapResult<Plane> {
    let (cols, rows) = patch_grid(width, height);
    let total = cols * rows;

    let mut reader = PlaneStreamReader::new(
        &streams.angles,
        &streams.counts,
        &streams.max_vals,
        &streams.indices,
        &streams.values,
    );
    let mut records = Vec::with_capacity(total);
    for _ in 0..total {
        records.push(reader.next_record()?);
    }

    let pools = ScratchPools::new();
    let degenerate_warned = AtomicBool::new(false);
    log::trace!("dispatching {total} patches ({cols}x{rows}) to the worker pool for inverse transform");
    let patches: Vec<[f32; PATCH_LEN]> = records
        .into_par_iter()
        .map(|record| {
            let coeffs = record.dequantize();
            pipeline::inverse(&pools, record.angle_index, &coeffs, s, &degenerate_warned)
        })
        .collect();

    let mut plane = Plane::new(width, height);
    for (i, patch_samples) in patches.into_iter().enumerate() {
        let pr = i / cols;
        let pc = i % cols;
        for y in 0..PATCH {
            let py = pr * PATCH + y;
            if py >= height {
                continue;
            }
            for x in 0..PATCH {
                let px = pc * PATCH + x;
                if px >= width {
                    continue;
                }
                plane.set(px, py, patch_samples[y * PATCH + x]);
            }
        }
    }
    Ok(plane)
}

/// Encode an 8-bit interleaved RGB image (no alpha) into a `.gap` container:
/// YCbCr decomposition, 4:2:0 chroma subsampling, and non-uniform chroma
/// codec parameters.
pub fn encode_rgb(width: u32, height: u32, rgb: &[u8], s: f32, t: f32) -> GapResult<Vec<u8>> {
    validate_params(s, t)?;
    let w = width as usize;
    let h = height as usize;
    if rgb.len() != w * h * 3 {
        return Err(GapError::InputInvalid(format!(
            "expected {} RGB bytes for {w}x{h}, got {}",
            w * h * 3,
            rgb.len()
        )));
    }

    let (y, cb, cr) = color::rgb_to_ycbcr_full(w, h, rgb);
    let cb_down = color::downsample_2x2(&cb);
    let cr_down = color::downsample_2x2(&cr);

    log::debug!(
        "encoding {w}x{h} RGB image (chroma {}x{}, s={s}, t={t})",
        cb_down.width,
        cb_down.height
    );

    let chroma_s = s * CHROMA_S_SCALE;
    let chroma_t = t * CHROMA_T_SCALE;

    let planes =
        [encode_plane(&y, s, t), encode_plane(&cb_down, chroma_s, chroma_t), encode_plane(&cr_down, chroma_s, chroma_t)];

    let header = Header::new(width, height, s, t, 3);
    encode_container(&header, &planes)
}

/// Encode an 8-bit grayscale image (single plane, no subsampling) into a
/// `.gap` container.
pub fn encode_gray(width: u32, height: u32, gray: &[u8], s: f32, t: f32) -> GapResult<Vec<u8>> {
    validate_params(s, t)?;
    let w = width as usize;
    let h = height as usize;
    if gray.len() != w * h {
        return Err(GapError::InputInvalid(format!(
            "expected {} gray bytes for {w}x{h}, got {}",
            w * h,
            gray.len()
        )));
    }

    let mut plane = Plane::new(w, h);
    for (i, &v) in gray.iter().enumerate() {
        plane.samples[i] = v as f32 / 255.0;
    }

    log::debug!("encoding {w}x{h} grayscale image (s={s}, t={t})");
    let streams = encode_plane(&plane, s, t);
    let header = Header::new(width, height, s, t, 1);
    encode_container(&header, std::slice::from_ref(&streams))
}

/// Decode a `.gap` container back to an interleaved RGBA8 buffer, with the
/// full post-reconstruction filter chain applied. A grayscale source comes
/// back with R=G=B and alpha fixed at 255.
pub fn decode(data: &[u8]) -> GapResult<(Header, RgbaBuffer)> {
    let (header, planes) = decode_container(data)?;
    let width = header.width as usize;
    let height = header.height as usize;

    log::debug!(
        "decoding {width}x{height} image, channels={}, flags={:#06b}",
        header.channels,
        header.flags
    );

    let merged = if header.channels == 3 {
        let y = decode_plane(width, height, &planes[0], header.s)?;
        let chroma_s = header.s * CHROMA_S_SCALE;
        let (cw, ch) = chroma_dims(width, height);
        let cb = decode_plane(cw, ch, &planes[1], chroma_s)?;
        let cr = decode_plane(cw, ch, &planes[2], chroma_s)?;
        let cb_full = color::upsample_bilinear(&cb, width, height);
        let cr_full = color::upsample_bilinear(&cr, width, height);
        let rgba = color::ycbcr_to_rgba(&y, &cb_full, &cr_full);
        RgbaBuffer { width, height, data: rgba }
    } else {
        let gray = decode_plane(width, height, &planes[0], header.s)?;
        let mut data = vec![0u8; width * height * 4];
        for i in 0..width * height {
            let v = (gray.samples[i].clamp(0.0, 1.0) * 255.0).round() as u8;
            data[i * 4] = v;
            data[i * 4 + 1] = v;
            data[i * 4 + 2] = v;
            data[i * 4 + 3] = 255;
        }
        RgbaBuffer { width, height, data }
    };

    Ok((header, postfilter::apply_chain(&merged)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grayscale_flat_image_round_trips_with_one_coefficient_per_patch() {
        let gray = vec![128u8; 8 * 8];
        let bytes = encode_gray(8, 8, &gray, 0.0, 0.0).unwrap();
        let (header, out) = decode(&bytes).unwrap();
        assert_eq!(header.channels, 1);
        for y in 0..8 {
            for x in 0..8 {
                let px = out.pixel(x, y);
                assert!((px[0] as i32 - 128).abs() <= 2);
            }
        }
    }

    #[test]
    fn rgb_round_trip_preserves_dimensions_and_flags() {
        let width = 16u32;
        let height = 8u32;
        let rgb: Vec<u8> = (0..width * height * 3).map(|i| (i % 256) as u8).collect();
        let bytes = encode_rgb(width, height, &rgb, 0.1, 0.2).unwrap();
        let (header, out) = decode(&bytes).unwrap();
        assert_eq!(header.width, width);
        assert_eq!(header.height, height);
        assert_eq!(header.channels, 3);
        assert_eq!(out.width, width as usize);
        assert_eq!(out.height, height as usize);
    }

    #[test]
    fn negative_s_is_rejected() {
        let gray = vec![0u8; 64];
        assert!(encode_gray(8, 8, &gray, -0.1, 0.0).is_err());
    }

    #[test]
    fn s_at_or_beyond_table_bound_is_rejected() {
        let gray = vec![0u8; 64];
        assert!(encode_gray(8, 8, &gray, 6.4, 0.0).is_err());
        assert!(encode_gray(8, 8, &gray, 7.0, 0.0).is_err());
        assert!(encode_gray(8, 8, &gray, 6.3999, 0.0).is_ok());
    }

    #[test]
    fn odd_dimensions_round_trip_with_floor_divided_chroma() {
        let width = 17u32;
        let height = 9u32;
        assert_eq!(chroma_dims(width as usize, height as usize), (8, 4));
        let rgb: Vec<u8> = (0..width * height * 3).map(|i| (i % 256) as u8).collect();
        let bytes = encode_rgb(width, height, &rgb, 0.1, 0.2).unwrap();
        let (header, out) = decode(&bytes).unwrap();
        assert_eq!(header.width, width);
        assert_eq!(header.height, height);
        assert_eq!(out.width, width as usize);
        assert_eq!(out.height, height as usize);
    }

    #[test]
    fn wrong_buffer_length_is_rejected() {
        let gray = vec![0u8; 10];
        assert!(encode_gray(8, 8, &gray, 0.0, 0.0).is_err());
    }

    #[test]
    fn mismatched_declared_channel_count_is_rejected() {
        let gray = vec![64u8; 64];
        let mut bytes = encode_gray(8, 8, &gray, 0.0, 0.0).unwrap();
        // Flip the channel count in the header without touching the single
        // plane actually present in the container.
        bytes[24..28].copy_from_slice(&3u32.to_le_bytes());
        assert!(decode(&bytes).is_err());
    }
}
