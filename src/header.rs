//! The 28-byte `.gap` container header.
//!
//! Binary layout (little-endian):
//!
//! ```text
//! off  size  field       notes
//! 0    4     magic       0x47 0x41 0x50 0x01  ("GAP\x01")
//! 4    4     width       original pixels
//! 8    4     height      original pixels
//! 12   4     s           f32, polylog decay
//! 16   4     threshold   f32, sparsifier cutoff
//! 20   4     flags       bit1=Quantized bit2=Subsampled bit3=RangeCoded
//! 24   4     channels    1 (grayscale) or 3 (YCbCr)
//! ```

use crate::error::{GapError, GapResult};

pub const MAGIC: [u8; 4] = [0x47, 0x41, 0x50, 0x01];
pub const HEADER_LEN: usize = 28;

bitflags::bitflags! {
    /// Feature flags carried in the header. Bit 0 (gzip) and the legacy
    /// non-range-coded path are reserved for forward-reading robustness
    /// only; this codec never emits them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Flags: u32 {
        const GZIP = 0b0001;
        const QUANTIZED = 0b0010;
        const SUBSAMPLED = 0b0100;
        const RANGE_CODED = 0b1000;
    }
}

/// Canonical flag value emitted by this codec: Quantized | Subsampled | RangeCoded.
pub const CANONICAL_FLAGS: u32 = 0b1110;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Header {
    pub width: u32,
    pub height: u32,
    pub s: f32,
    pub threshold: f32,
    pub flags: u32,
    pub channels: u32,
}

impl Header {
    pub fn new(width: u32, height: u32, s: f32, threshold: f32, channels: u32) -> Self {
        let mut flags = Flags::QUANTIZED.bits() | Flags::RANGE_CODED.bits();
        if channels == 3 {
            flags |= Flags::SUBSAMPLED.bits();
        }
        Header { width, height, s, threshold, flags, channels }
    }

    pub fn is_subsampled(&self) -> bool {
        self.flags & Flags::SUBSAMPLED.bits() != 0
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..4].copy_from_slice(&MAGIC);
        buf[4..8].copy_from_slice(&self.width.to_le_bytes());
        buf[8..12].copy_from_slice(&self.height.to_le_bytes());
        buf[12..16].copy_from_slice(&self.s.to_le_bytes());
        buf[16..20].copy_from_slice(&self.threshold.to_le_bytes());
        buf[20..24].copy_from_slice(&self.flags.to_le_bytes());
        buf[24..28].copy_from_slice(&self.channels.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: &[u8]) -> GapResult<Self> {
        if buf.len() < HEADER_LEN {
            log::error!("header: truncated, got {} bytes, need {HEADER_LEN}", buf.len());
            return Err(GapError::InputInvalid(format!(
                "header truncated: got {} bytes, need {}",
                buf.len(),
                HEADER_LEN
            )));
        }
        if buf[0..4] != MAGIC {
            log::error!("header: bad magic {:02x?}, expected {:02x?}", &buf[0..4], MAGIC);
            return Err(GapError::InputInvalid(format!(
                "bad magic: {:02x?}, expected {:02x?}",
                &buf[0..4],
                MAGIC
            )));
        }
        let width = u32::from_le_bytes(buf[4..8].try_into().unwrap());
        let height = u32::from_le_bytes(buf[8..12].try_into().unwrap());
        let s = f32::from_le_bytes(buf[12..16].try_into().unwrap());
        let threshold = f32::from_le_bytes(buf[16..20].try_into().unwrap());
        let flags = u32::from_le_bytes(buf[20..24].try_into().unwrap());
        let channels = u32::from_le_bytes(buf[24..28].try_into().unwrap());
        if channels != 1 && channels != 3 {
            log::error!("header: unsupported channel count {channels}");
            return Err(GapError::InputInvalid(format!(
                "unsupported channel count: {channels}"
            )));
        }
        Ok(Header { width, height, s, threshold, flags, channels })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_emission_matches_spec_table() {
        let h = Header::new(16, 8, 0.1, 0.5, 3);
        let bytes = h.to_bytes();
        assert_eq!(&bytes[0..4], &MAGIC);
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 16);
        assert_eq!(u32::from_le_bytes(bytes[8..12].try_into().unwrap()), 8);
        assert_eq!(f32::from_le_bytes(bytes[12..16].try_into().unwrap()), 0.1);
        assert_eq!(f32::from_le_bytes(bytes[16..20].try_into().unwrap()), 0.5);
        assert_eq!(u32::from_le_bytes(bytes[20..24].try_into().unwrap()), CANONICAL_FLAGS);
        assert_eq!(u32::from_le_bytes(bytes[24..28].try_into().unwrap()), 3);
    }

    #[test]
    fn round_trips_through_bytes() {
        let h = Header::new(1024, 768, 0.2, 0.3, 1);
        let back = Header::from_bytes(&h.to_bytes()).unwrap();
        assert_eq!(h, back);
    }

    #[test]
    fn magic_validation_rejects_garbage() {
        let mut bytes = Header::new(4, 4, 0.0, 0.0, 1).to_bytes();
        bytes[0] = 0x00;
        assert!(Header::from_bytes(&bytes).is_err());
    }

    #[test]
    fn rejects_unsupported_channel_count() {
        let mut bytes = Header::new(4, 4, 0.0, 0.0, 1).to_bytes();
        bytes[24..28].copy_from_slice(&2u32.to_le_bytes());
        assert!(Header::from_bytes(&bytes).is_err());
    }
}
