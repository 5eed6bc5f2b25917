//! Container & Stream Splitter: per-patch quantization into the five
//! per-plane byte streams, and the length-prefixed range-coded container
//! format that wraps them.

pub mod codec;
pub mod streams;

pub use codec::{decode_container, encode_container, DecodedPlaneStreams};
pub use streams::{PatchRecord, PlaneStreamReader, PlaneStreams};
