//! 32-bit range coder with carry-delayed byte emission, driven by the
//! [`FrequencyModel`](super::model::FrequencyModel).

use super::model::FrequencyModel;
use crate::error::{GapError, GapResult};

const TOP: u32 = 1 << 24;

/// Range encoder. `low` is kept as `u64` so a carry out of the top 32 bits
/// is directly observable as bit 32.
pub struct RangeEncoder {
    low: u64,
    range: u32,
    cache: u8,
    ff_run: u64,
    started: bool,
    out: Vec<u8>,
    model: FrequencyModel,
}

impl RangeEncoder {
    pub fn new() -> Self {
        RangeEncoder {
            low: 0,
            range: 0xFFFF_FFFF,
            cache: 0,
            ff_run: 0,
            started: false,
            out: Vec::new(),
            model: FrequencyModel::new(),
        }
    }

    fn shift_low(&mut self) {
        // Top byte of `low`, widened: values 0x100..=0x1FF mean a carry
        // occurred and must be propagated into the cached byte.
        let byte = (self.low >> 24) as u32;
        if byte != 0xFF {
            let carry = (byte >> 8) as u8;
            if self.started {
                self.out.push(self.cache.wrapping_add(carry));
                let fill = if carry == 1 { 0x00u8 } else { 0xFFu8 };
                for _ in 0..self.ff_run {
                    self.out.push(fill);
                }
            }
            self.ff_run = 0;
            self.cache = (byte & 0xFF) as u8;
            self.started = true;
        } else {
            self.ff_run += 1;
        }
        self.low = (self.low << 8) & 0xFFFF_FFFF;
    }

    /// Encode one symbol and update the model.
    pub fn encode(&mut self, symbol: u8) {
        let total = self.model.total() as u64;
        let (low, range) = self.model.get_range(symbol);
        let r_div = self.range as u64 / total;

        self.low += low as u64 * r_div;
        self.range = (range as u64 * r_div) as u32;

        while self.range < TOP {
            self.shift_low();
            self.range <<= 8;
        }

        self.model.update(symbol);
    }

    /// Encode a full byte slice, returning the compressed bytes.
    pub fn encode_all(mut self, data: &[u8]) -> GapResult<Vec<u8>> {
        for &b in data {
            self.encode(b);
        }
        Ok(self.finish())
    }

    /// Flush the remaining state: five more bytes through the same carry
    /// discipline.
    pub fn finish(mut self) -> Vec<u8> {
        for _ in 0..5 {
            self.shift_low();
        }
        self.out
    }
}

impl Default for RangeEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Range decoder. Reads exactly the number of symbols the caller prescribes
/// (the stream's recorded uncompressed length); it does not self-terminate.
pub struct RangeDecoder<'a> {
    code: u32,
    range: u32,
    input: &'a [u8],
    pos: usize,
    model: FrequencyModel,
}

impl<'a> RangeDecoder<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        let mut code = 0u32;
        let mut pos = 0usize;
        for _ in 0..4 {
            code = (code << 8) | Self::next_byte(input, &mut pos);
        }
        RangeDecoder { code, range: 0xFFFF_FFFF, input, pos, model: FrequencyModel::new() }
    }

    fn next_byte(input: &[u8], pos: &mut usize) -> u32 {
        let b = input.get(*pos).copied().unwrap_or(0);
        *pos += 1;
        b as u32
    }

    pub fn decode_one(&mut self) -> u8 {
        let total = self.model.total() as u64;
        let r_div = self.range as u64 / total;
        let value = (self.code as u64 / r_div.max(1)).min(total.saturating_sub(1)) as u32;

        let (symbol, low, range) = self.model.get_symbol(value);

        self.code -= (low as u64 * r_div) as u32;
        self.range = (range as u64 * r_div) as u32;

        while self.range < TOP {
            self.code = (self.code << 8) | Self::next_byte(self.input, &mut self.pos) as u32;
            self.range <<= 8;
        }

        self.model.update(symbol);
        symbol
    }

    /// Decode exactly `count` symbols.
    pub fn decode_all(input: &'a [u8], count: usize) -> GapResult<Vec<u8>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let mut decoder = RangeDecoder::new(input);
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(decoder.decode_one());
        }
        Ok(out)
    }
}

/// Convenience wrapper matching the container layer's needs: compress a
/// byte slice and also validate the round trip length during tests.
pub fn encode_bytes(data: &[u8]) -> GapResult<Vec<u8>> {
    if data.is_empty() {
        return Ok(Vec::new());
    }
    RangeEncoder::new().encode_all(data)
}

pub fn decode_bytes(data: &[u8], uncompressed_len: usize) -> GapResult<Vec<u8>> {
    if uncompressed_len == 0 {
        return Ok(Vec::new());
    }
    if data.is_empty() {
        return Err(GapError::InputInvalid("empty range-coded stream with nonzero length".into()));
    }
    RangeDecoder::decode_all(data, uncompressed_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_arbitrary_bytes() {
        let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let compressed = encode_bytes(&data).unwrap();
        let decoded = decode_bytes(&compressed, data.len()).unwrap();
        assert_eq!(data, decoded);
    }

    #[test]
    fn round_trips_empty_input() {
        let compressed = encode_bytes(&[]).unwrap();
        assert!(compressed.is_empty());
        let decoded = decode_bytes(&compressed, 0).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn range_coder_smoke_test_from_spec() {
        let data = b"Hello GAP! This is a test of the Range Coder bridge.";
        assert_eq!(data.len(), 52);
        let compressed = encode_bytes(data).unwrap();
        let decoded = decode_bytes(&compressed, data.len()).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn round_trips_highly_repetitive_data() {
        let data = vec![42u8; 5000];
        let compressed = encode_bytes(&data).unwrap();
        assert!(compressed.len() < data.len() / 4);
        let decoded = decode_bytes(&compressed, data.len()).unwrap();
        assert_eq!(data, decoded);
    }

    #[test]
    fn round_trips_random_like_data() {
        let mut data = Vec::with_capacity(2000);
        let mut x: u32 = 0x1234_5678;
        for _ in 0..2000 {
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            data.push((x & 0xFF) as u8);
        }
        let compressed = encode_bytes(&data).unwrap();
        let decoded = decode_bytes(&compressed, data.len()).unwrap();
        assert_eq!(data, decoded);
    }
}
