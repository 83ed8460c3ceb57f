//! Output buffer pool and per-call leases.
//!
//! A [`BufferPool`] is a cheap, cloneable handle shared by every generator of
//! a process. Each generation call draws its buffers into a [`Lease`]; the
//! lease hands them back when released or dropped, so a buffer returns to the
//! pool exactly once whatever path the caller takes.

use std::sync::{Arc, Mutex, MutexGuard};

use bytes::BytesMut;
use tracing::trace;

use crate::error::{H2Error, Result};

/// Released buffers kept for reuse; extras are dropped.
const MAX_RETAINED: usize = 64;

#[derive(Debug, Default)]
struct PoolState {
    free: Vec<BytesMut>,
    outstanding: usize,
}

/// Shared, thread-safe pool of output buffers.
#[derive(Debug, Clone, Default)]
pub struct BufferPool {
    state: Arc<Mutex<PoolState>>,
    /// Maximum buffers checked out at once (`None` = unbounded).
    limit: Option<usize>,
}

impl BufferPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pool that refuses to have more than `max_outstanding` buffers checked
    /// out at the same time.
    pub fn with_limit(max_outstanding: usize) -> Self {
        Self {
            state: Arc::default(),
            limit: Some(max_outstanding),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        // Pool state stays consistent even if a holder panicked.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Check out an empty buffer with room for at least `size` bytes.
    pub fn acquire(&self, size: usize) -> Result<BytesMut> {
        let mut state = self.lock();
        if let Some(limit) = self.limit {
            if state.outstanding >= limit {
                return Err(H2Error::Resource(format!(
                    "buffer pool exhausted ({} outstanding)",
                    state.outstanding
                )));
            }
        }
        state.outstanding += 1;

        let mut buf = state.free.pop().unwrap_or_default();
        drop(state);
        buf.reserve(size);
        Ok(buf)
    }

    /// Return a buffer for reuse.
    pub fn release(&self, mut buf: BytesMut) {
        buf.clear();
        let mut state = self.lock();
        state.outstanding = state.outstanding.saturating_sub(1);
        if state.free.len() < MAX_RETAINED {
            state.free.push(buf);
        }
    }

    /// Buffers currently checked out.
    pub fn outstanding(&self) -> usize {
        self.lock().outstanding
    }

    /// Released buffers waiting for reuse.
    pub fn available(&self) -> usize {
        self.lock().free.len()
    }
}

/// Buffers produced by one generation call.
///
/// Write them to the transport in order, then release the lease.
#[derive(Debug)]
pub struct Lease {
    pool: BufferPool,
    buffers: Vec<BytesMut>,
}

impl Lease {
    pub fn new(pool: BufferPool) -> Self {
        Self {
            pool,
            buffers: Vec::new(),
        }
    }

    /// Draw a new buffer from the pool into this lease.
    pub fn acquire(&mut self, size: usize) -> Result<&mut BytesMut> {
        let buf = self.pool.acquire(size)?;
        self.buffers.push(buf);
        let index = self.buffers.len() - 1;
        Ok(&mut self.buffers[index])
    }

    pub fn buffers(&self) -> &[BytesMut] {
        &self.buffers
    }

    /// Total bytes held across all buffers.
    pub fn len(&self) -> usize {
        self.buffers.iter().map(BytesMut::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Concatenation of every buffer, in order.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        for buf in &self.buffers {
            out.extend_from_slice(buf);
        }
        out
    }

    /// Hand every buffer back to the pool.
    pub fn release(mut self) {
        self.return_buffers();
    }

    fn return_buffers(&mut self) {
        if self.buffers.is_empty() {
            return;
        }
        trace!(count = self.buffers.len(), "releasing lease");
        for buf in self.buffers.drain(..) {
            self.pool.release(buf);
        }
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.return_buffers();
    }
}
