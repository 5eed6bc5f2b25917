//! Entropy Codec: an order-0 adaptive frequency model driving a 32-bit
//! range coder, used to compress each of the five per-plane streams
//! independently.

pub mod model;
pub mod range_coder;

pub use range_coder::{decode_bytes, encode_bytes, RangeDecoder, RangeEncoder};
