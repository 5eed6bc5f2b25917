//! Per-patch quantization and the five per-plane byte streams (Angles,
//! Counts, MaxVals, Indices, Values).

use num_complex::Complex32;

use crate::error::{GapError, GapResult};
use crate::pipeline::{Coeff, ForwardPatch};

/// One patch's fully-quantized record: angle, keep-count, scale, and the
/// kept (bin, q_re, q_im) triplets in ascending bin order.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchRecord {
    pub angle_index: u8,
    pub max_val: f32,
    pub coeffs: Vec<(u8, i8, i8)>,
}

impl PatchRecord {
    /// Quantize a forward-pipeline result into its wire representation.
    pub fn quantize(fwd: &ForwardPatch) -> Self {
        let max_val = max_val_of(&fwd.coeffs);
        let coeffs = fwd
            .coeffs
            .iter()
            .map(|c| {
                let q_re = quantize_component(c.value.re, max_val);
                let q_im = quantize_component(c.value.im, max_val);
                (c.k, q_re, q_im)
            })
            .collect();
        PatchRecord { angle_index: fwd.angle_index, max_val, coeffs }
    }

    /// Dequantize back into full-precision coefficients for the inverse
    /// pipeline.
    pub fn dequantize(&self) -> Vec<Coeff> {
        self.coeffs
            .iter()
            .map(|&(k, q_re, q_im)| Coeff {
                k,
                value: Complex32::new(
                    dequantize_component(q_re, self.max_val),
                    dequantize_component(q_im, self.max_val),
                ),
            })
            .collect()
    }

    pub fn keep_count(&self) -> usize {
        self.coeffs.len()
    }
}

/// `MaxVal = max over all kept k of max(|re_k|, |im_k|)`. `1.0` when there
/// are no kept coefficients (K=0).
fn max_val_of(coeffs: &[Coeff]) -> f32 {
    let mut max_val = 0.0f32;
    for c in coeffs {
        max_val = max_val.max(c.value.re.abs()).max(c.value.im.abs());
    }
    if max_val == 0.0 {
        1.0
    } else {
        max_val
    }
}

fn quantize_component(v: f32, max_val: f32) -> i8 {
    let scaled = (v * 127.0 / max_val).trunc();
    scaled.clamp(-127.0, 127.0) as i8
}

fn dequantize_component(q: i8, max_val: f32) -> f32 {
    q as f32 * max_val / 127.0
}

/// The five byte streams for one plane, accumulated patch-by-patch in
/// raster order.
#[derive(Debug, Clone, Default)]
pub struct PlaneStreams {
    pub angles: Vec<u8>,
    pub counts: Vec<u8>,
    pub max_vals: Vec<u8>,
    pub indices: Vec<u8>,
    pub values: Vec<u8>,
}

impl PlaneStreams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one patch's record to the five streams.
    pub fn push(&mut self, record: &PatchRecord) {
        self.angles.push(record.angle_index);
        self.counts.push(record.keep_count() as u8);
        self.max_vals.extend_from_slice(&record.max_val.to_le_bytes());
        for &(k, q_re, q_im) in &record.coeffs {
            self.indices.push(k);
            self.values.push(q_re as u8);
            self.values.push(q_im as u8);
        }
    }
}

/// Stateful cursor walking the five streams patch-by-patch, used by the
/// decoder after each stream has been range-decoded back to its original
/// uncompressed bytes.
pub struct PlaneStreamReader<'a> {
    angles: &'a [u8],
    counts: &'a [u8],
    max_vals: &'a [u8],
    indices: &'a [u8],
    values: &'a [u8],
    patch_cursor: usize,
    index_cursor: usize,
    value_cursor: usize,
}

impl<'a> PlaneStreamReader<'a> {
    pub fn new(
        angles: &'a [u8],
        counts: &'a [u8],
        max_vals: &'a [u8],
        indices: &'a [u8],
        values: &'a [u8],
    ) -> Self {
        PlaneStreamReader {
            angles,
            counts,
            max_vals,
            indices,
            values,
            patch_cursor: 0,
            index_cursor: 0,
            value_cursor: 0,
        }
    }

    /// Read the next patch record in raster order.
    pub fn next_record(&mut self) -> GapResult<PatchRecord> {
        let i = self.patch_cursor;
        if i >= self.angles.len() || i >= self.counts.len() {
            log::error!("stream Angles/Counts: exhausted at patch {i}");
            return Err(GapError::InputInvalid(format!(
                "patch stream exhausted at patch {i}"
            )));
        }
        let angle_index = self.angles[i];
        let count = self.counts[i] as usize;

        let mv_off = i * 4;
        if mv_off + 4 > self.max_vals.len() {
            log::error!("stream MaxVals: exhausted at patch {i}");
            return Err(GapError::InputInvalid(format!(
                "MaxVals stream exhausted at patch {i}"
            )));
        }
        let max_val = f32::from_le_bytes(self.max_vals[mv_off..mv_off + 4].try_into().unwrap());

        let mut coeffs = Vec::with_capacity(count);
        let mut prev_k: i32 = -1;
        for _ in 0..count {
            if self.index_cursor >= self.indices.len() || self.value_cursor + 2 > self.values.len() {
                log::error!("stream Indices/Values: exhausted at patch {i}");
                return Err(GapError::InputInvalid(format!(
                    "Indices/Values stream exhausted at patch {i}"
                )));
            }
            let k = self.indices[self.index_cursor];
            self.index_cursor += 1;
            if (k as i32) <= prev_k {
                log::error!("stream Indices: bin indices not strictly increasing at patch {i}");
                return Err(GapError::InputInvalid(format!(
                    "bin indices not strictly increasing in patch {i}"
                )));
            }
            prev_k = k as i32;

            let q_re = self.values[self.value_cursor] as i8;
            let q_im = self.values[self.value_cursor + 1] as i8;
            self.value_cursor += 2;

            coeffs.push((k, q_re, q_im));
        }

        self.patch_cursor += 1;
        Ok(PatchRecord { angle_index, max_val, coeffs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ForwardPatch;

    #[test]
    fn quantize_invariant_max_val_strictly_positive_and_bounds_components() {
        let fwd = ForwardPatch {
            angle_index: 12,
            coeffs: vec![
                Coeff { k: 0, value: Complex32::new(3.0, -1.5) },
                Coeff { k: 4, value: Complex32::new(-2.0, 0.75) },
            ],
        };
        let record = PatchRecord::quantize(&fwd);
        assert!(record.max_val > 0.0);
        for &(_, q_re, q_im) in &record.coeffs {
            assert!((q_re as f32 * record.max_val / 127.0).abs() <= record.max_val + 1e-3);
            assert!((q_im as f32 * record.max_val / 127.0).abs() <= record.max_val + 1e-3);
        }
    }

    #[test]
    fn zero_coeff_patch_gets_max_val_one() {
        let fwd = ForwardPatch { angle_index: 0, coeffs: vec![] };
        let record = PatchRecord::quantize(&fwd);
        assert_eq!(record.max_val, 1.0);
    }

    #[test]
    fn stream_round_trip_reproduces_records() {
        let records = vec![
            PatchRecord { angle_index: 7, max_val: 2.0, coeffs: vec![(0, 10, -5), (3, 20, 127)] },
            PatchRecord { angle_index: 200, max_val: 1.0, coeffs: vec![] },
        ];
        let mut streams = PlaneStreams::new();
        for r in &records {
            streams.push(r);
        }
        let mut reader = PlaneStreamReader::new(
            &streams.angles,
            &streams.counts,
            &streams.max_vals,
            &streams.indices,
            &streams.values,
        );
        for expected in &records {
            let got = reader.next_record().unwrap();
            assert_eq!(&got, expected);
        }
    }

    #[test]
    fn bin_indices_strictly_increasing_is_enforced_on_read() {
        let mut streams = PlaneStreams::new();
        streams.angles.push(0);
        streams.counts.push(2);
        streams.max_vals.extend_from_slice(&1.0f32.to_le_bytes());
        // Deliberately out of order.
        streams.indices.push(5);
        streams.indices.push(3);
        streams.values.extend_from_slice(&[1, 1, 1, 1]);

        let mut reader = PlaneStreamReader::new(
            &streams.angles,
            &streams.counts,
            &streams.max_vals,
            &streams.indices,
            &streams.values,
        );
        assert!(reader.next_record().is_err());
    }
}
