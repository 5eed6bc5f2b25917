//! Thread-safe scratch-buffer pool for per-patch transient state.
//!
//! Pooling is a performance concern, not a correctness one: every consumer
//! of a pooled buffer zero-fills it before use, so a pool miss (a fresh
//! allocation) and a pool hit (a reused allocation) are observably
//! identical. An image with `P` patches needs `O(P * 128)` floats for the
//! staged coefficient array and `O(P * 64)` for the pixel staging buffer;
//! drawing both from a pool avoids allocator pressure on large images.

use std::sync::Mutex;

/// A pool of same-sized `Vec<f32>` scratch buffers.
pub struct BufferPool {
    len: usize,
    free: Mutex<Vec<Vec<f32>>>,
}

impl BufferPool {
    pub fn new(len: usize) -> Self {
        BufferPool { len, free: Mutex::new(Vec::new()) }
    }

    /// Check out a zero-filled buffer of this pool's configured length.
    pub fn take(&self) -> Vec<f32> {
        let mut buf = self.free.lock().unwrap().pop().unwrap_or_else(|| vec![0.0; self.len]);
        buf.iter_mut().for_each(|v| *v = 0.0);
        buf
    }

    /// Return a buffer for reuse. Buffers of the wrong length are dropped
    /// rather than corrupting the pool.
    pub fn give(&self, buf: Vec<f32>) {
        if buf.len() == self.len {
            self.free.lock().unwrap().push(buf);
        }
    }
}

/// Process-lifetime pools for the two scratch-buffer shapes the patch
/// pipeline needs: 128 floats (interleaved re/im for 64 complex bins) and
/// 64 floats (one pixel patch).
pub struct ScratchPools {
    pub coeffs: BufferPool,
    pub pixels: BufferPool,
}

impl ScratchPools {
    pub fn new() -> Self {
        ScratchPools { coeffs: BufferPool::new(128), pixels: BufferPool::new(64) }
    }
}

impl Default for ScratchPools {
    fn default() -> Self {
        Self::new()
    }
}
