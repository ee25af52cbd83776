//! In-memory byte pipe with explicit publication.
//!
//! Bytes written to a [`PipeWriter`] stay private until `flush`, which makes
//! them visible to every [`PipeReader`] at once. Closing (or dropping) the
//! writer publishes whatever is staged and marks the stream finished. This
//! mirrors a buffered file shared between a writing and a tailing process.

use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::BytesMut;
use tracing::trace;

use crate::source::ByteSource;

#[derive(Debug, Default)]
struct Shared {
    published: Vec<u8>,
    finished: bool,
}

/// Create a connected writer/reader pair.
pub fn pipe() -> (PipeWriter, PipeReader) {
    let shared = Arc::new(Mutex::new(Shared::default()));
    let writer = PipeWriter {
        shared: Arc::clone(&shared),
        staged: BytesMut::new(),
        closed: false,
    };
    let reader = PipeReader { shared, pos: 0 };
    (writer, reader)
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    // A panic while holding the lock cannot leave `Shared` half-updated.
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Writing half of a [`pipe`].
#[derive(Debug)]
pub struct PipeWriter {
    shared: Arc<Mutex<Shared>>,
    staged: BytesMut,
    closed: bool,
}

impl PipeWriter {
    /// Publish staged bytes and mark the stream finished. Idempotent.
    pub fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.flush()?;
        lock(&self.shared).finished = true;
        self.closed = true;
        trace!("pipe writer closed");
        Ok(())
    }

    /// Number of bytes written but not yet published.
    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    /// Number of bytes visible to readers.
    pub fn published_len(&self) -> usize {
        lock(&self.shared).published.len()
    }
}

impl Write for PipeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.closed {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "write to closed pipe",
            ));
        }
        self.staged.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.staged.is_empty() {
            return Ok(());
        }
        let staged = self.staged.split();
        let mut shared = lock(&self.shared);
        shared.published.extend_from_slice(&staged);
        trace!(
            bytes = staged.len(),
            total = shared.published.len(),
            "pipe published"
        );
        Ok(())
    }
}

impl Drop for PipeWriter {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Reading half of a [`pipe`]. Each reader keeps its own position.
#[derive(Debug)]
pub struct PipeReader {
    shared: Arc<Mutex<Shared>>,
    pos: usize,
}

impl PipeReader {
    /// Another reader over the same pipe, starting at this reader's position.
    pub fn try_clone(&self) -> io::Result<Self> {
        Ok(Self {
            shared: Arc::clone(&self.shared),
            pos: self.pos,
        })
    }

    /// Current read position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of bytes visible to readers.
    pub fn published_len(&self) -> usize {
        lock(&self.shared).published.len()
    }
}

impl Read for PipeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let shared = lock(&self.shared);
        let available = shared.published.len().saturating_sub(self.pos);
        let n = available.min(buf.len());
        buf[..n].copy_from_slice(&shared.published[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

impl ByteSource for PipeReader {
    fn is_finished(&self) -> bool {
        lock(&self.shared).finished
    }
}
