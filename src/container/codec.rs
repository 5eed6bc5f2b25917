//! Container assembly: header + per-plane, per-stream length-prefixed
//! range-coded blobs.
//!
//! Per plane, the five streams are written in a fixed order (Angles,
//! Counts, MaxVals, Indices, Values); per stream the layout is
//! `[u32 uncompressed_len][u32 compressed_len][compressed bytes]`. The five
//! streams of a plane, and the planes themselves, are independent and are
//! range-coded in parallel via the shared worker pool.

use rayon::prelude::*;

use super::streams::PlaneStreams;
use crate::entropy;
use crate::error::{GapError, GapResult};
use crate::header::Header;

/// The five raw (already range-decoded) byte buffers for one plane, in
/// stream order.
#[derive(Debug, Clone, Default)]
pub struct DecodedPlaneStreams {
    pub angles: Vec<u8>,
    pub counts: Vec<u8>,
    pub max_vals: Vec<u8>,
    pub indices: Vec<u8>,
    pub values: Vec<u8>,
}

fn stream_refs(streams: &PlaneStreams) -> [&[u8]; 5] {
    [&streams.angles, &streams.counts, &streams.max_vals, &streams.indices, &streams.values]
}

/// Range-code a plane's five streams in parallel and write them, in order,
/// into `out`.
fn write_plane(out: &mut Vec<u8>, streams: &PlaneStreams) -> GapResult<()> {
    let refs = stream_refs(streams);
    log::trace!("dispatching {} streams to the worker pool for range encoding", refs.len());
    let mut compressed: Vec<GapResult<Vec<u8>>> =
        refs.par_iter().map(|s| entropy::encode_bytes(s)).collect();

    for (i, raw) in refs.iter().enumerate() {
        let blob = std::mem::replace(&mut compressed[i], Ok(Vec::new())).map_err(|e| {
            log::error!("stream {}: entropy encoder failed: {e}", STREAM_NAMES[i]);
            GapError::Encoding(format!("stream {}: {e}", STREAM_NAMES[i]))
        })?;
        out.extend_from_slice(&(raw.len() as u32).to_le_bytes());
        out.extend_from_slice(&(blob.len() as u32).to_le_bytes());
        out.extend_from_slice(&blob);
    }
    Ok(())
}

/// Assemble the full container: header followed by each plane's five
/// streams, planes coded in parallel.
pub fn encode_container(header: &Header, planes: &[PlaneStreams]) -> GapResult<Vec<u8>> {
    log::trace!("dispatching {} planes to the worker pool for container encoding", planes.len());
    let plane_bytes: Vec<GapResult<Vec<u8>>> = planes
        .par_iter()
        .map(|p| {
            let mut buf = Vec::new();
            write_plane(&mut buf, p)?;
            Ok(buf)
        })
        .collect();

    let mut out = Vec::new();
    out.extend_from_slice(&header.to_bytes());
    for (i, chunk) in plane_bytes.into_iter().enumerate() {
        let chunk = chunk.map_err(|e| {
            log::error!("plane {i}: {e}");
            GapError::Encoding(format!("plane {i}: {e}"))
        })?;
        out.extend_from_slice(&chunk);
    }
    Ok(out)
}

struct StreamCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> StreamCursor<'a> {
    fn read_stream(&mut self, plane: usize, stream_name: &str) -> GapResult<(usize, &'a [u8])> {
        if self.pos + 8 > self.data.len() {
            log::error!("plane {plane} stream {stream_name}: truncated length prefix");
            return Err(GapError::InputInvalid(format!(
                "plane {plane} stream {stream_name}: truncated length prefix"
            )));
        }
        let uncompressed_len =
            u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().unwrap()) as usize;
        let compressed_len =
            u32::from_le_bytes(self.data[self.pos + 4..self.pos + 8].try_into().unwrap()) as usize;
        self.pos += 8;

        if self.pos + compressed_len > self.data.len() {
            log::error!("plane {plane} stream {stream_name}: truncated payload");
            return Err(GapError::InputInvalid(format!(
                "plane {plane} stream {stream_name}: truncated payload"
            )));
        }
        let blob = &self.data[self.pos..self.pos + compressed_len];
        self.pos += compressed_len;
        Ok((uncompressed_len, blob))
    }
}

const STREAM_NAMES: [&str; 5] = ["Angles", "Counts", "MaxVals", "Indices", "Values"];

/// Parse the header and pre-read every plane's five `(U, C, data)` blocks,
/// then range-decode them (in parallel, five streams per plane and all
/// planes at once).
pub fn decode_container(data: &[u8]) -> GapResult<(Header, Vec<DecodedPlaneStreams>)> {
    let header = Header::from_bytes(data)?;
    let mut cursor = StreamCursor { data, pos: crate::header::HEADER_LEN };

    // Pre-read all blocks sequentially (framing must be walked in order),
    // then hand the independent blobs to the worker pool for decoding.
    let mut raw_blocks: Vec<[(usize, &[u8]); 5]> = Vec::with_capacity(header.channels as usize);
    for plane in 0..header.channels as usize {
        let mut blocks: [(usize, &[u8]); 5] = [(0, &[]); 5];
        for (s, name) in STREAM_NAMES.iter().enumerate() {
            blocks[s] = cursor.read_stream(plane, name)?;
        }
        raw_blocks.push(blocks);
    }

    log::trace!(
        "dispatching {} planes ({} streams each) to the worker pool for range decoding",
        raw_blocks.len(),
        STREAM_NAMES.len()
    );
    let decoded: GapResult<Vec<DecodedPlaneStreams>> = raw_blocks
        .par_iter()
        .enumerate()
        .map(|(plane, blocks)| {
            let mut out = [Vec::new(), Vec::new(), Vec::new(), Vec::new(), Vec::new()];
            for (i, (ulen, blob)) in blocks.iter().enumerate() {
                out[i] = entropy::decode_bytes(blob, *ulen).map_err(|e| {
                    log::error!("plane {plane} stream {}: {e}", STREAM_NAMES[i]);
                    e
                })?;
            }
            let [angles, counts, max_vals, indices, values] = out;
            Ok(DecodedPlaneStreams { angles, counts, max_vals, indices, values })
        })
        .collect();

    Ok((header, decoded?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::streams::PatchRecord;

    #[test]
    fn container_round_trip_preserves_streams() {
        let header = Header::new(16, 8, 0.1, 0.5, 1);
        let mut streams = PlaneStreams::new();
        streams.push(&PatchRecord { angle_index: 3, max_val: 1.0, coeffs: vec![(0, 10, -10)] });
        streams.push(&PatchRecord { angle_index: 200, max_val: 2.0, coeffs: vec![] });

        let bytes = encode_container(&header, std::slice::from_ref(&streams)).unwrap();
        let (decoded_header, planes) = decode_container(&bytes).unwrap();
        assert_eq!(decoded_header, header);
        assert_eq!(planes.len(), 1);
        assert_eq!(planes[0].angles, streams.angles);
        assert_eq!(planes[0].counts, streams.counts);
        assert_eq!(planes[0].max_vals, streams.max_vals);
        assert_eq!(planes[0].indices, streams.indices);
        assert_eq!(planes[0].values, streams.values);
    }

    #[test]
    fn truncated_container_is_rejected() {
        let header = Header::new(8, 8, 0.1, 0.5, 1);
        let mut streams = PlaneStreams::new();
        streams.push(&PatchRecord { angle_index: 0, max_val: 1.0, coeffs: vec![] });
        let mut bytes = encode_container(&header, std::slice::from_ref(&streams)).unwrap();
        bytes.truncate(bytes.len() - 2);
        assert!(decode_container(&bytes).is_err());
    }
}
