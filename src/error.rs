//! Error types for the GAP codec.
//!
//! Mirrors the four failure categories from the error handling design:
//! bad input framing, out-of-range parameters, IO failures surfaced from the
//! collaborator layer, and entropy-coder allocation failure. Numerically
//! degenerate samples are never represented here — they are clamped in
//! place and only observable through a `warn!` log line.

use thiserror::Error;

/// Crate-wide result alias.
pub type GapResult<T> = Result<T, GapError>;

/// Errors that can occur while encoding or decoding a `.gap` container.
#[derive(Debug, Error)]
pub enum GapError {
    /// Unreadable source image, bad magic, bad channel count, or a stream
    /// that failed to recover its prescribed uncompressed length.
    #[error("invalid input: {0}")]
    InputInvalid(String),

    /// A numeric parameter (`s`, `threshold`) fell outside its documented
    /// domain.
    #[error("parameter {name} out of range: {value}")]
    ParameterOutOfRange { name: &'static str, value: f32 },

    /// IO failure surfaced from the collaborator layer (file read/write).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Image load/save failure surfaced from the `image` crate collaborator.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Entropy encoder could not allocate its output buffer, or a plane's
    /// stream failed mid-encode.
    #[error("entropy coder error: {0}")]
    Encoding(String),
}
