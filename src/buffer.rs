use std::io::{self, Read};

/// Initial capacity used by the stream readers.
///
/// Deliberately tiny so that growth happens early and often.
pub const DEFAULT_INITIAL_BUFFER_SIZE: usize = 8;

/// A growable byte arena holding bytes read but not yet consumed.
///
/// `[0, write_cursor)` are pending bytes, `[write_cursor, capacity)` is the
/// writable region. Consumed bytes are shifted out and never retained.
#[derive(Debug, Clone)]
pub struct AccumulationBuffer {
    buf: Vec<u8>,
    write_cursor: usize,
}

impl AccumulationBuffer {
    /// Create a buffer with the given capacity (zero is clamped to one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity.max(1)],
            write_cursor: 0,
        }
    }

    /// Total size of the arena, pending and writable regions together.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes read but not yet consumed.
    pub fn pending(&self) -> &[u8] {
        &self.buf[..self.write_cursor]
    }

    /// Returns `true` when no writable space is left.
    pub fn is_full(&self) -> bool {
        self.write_cursor == self.buf.len()
    }

    /// Double the capacity, keeping the pending bytes.
    ///
    /// Does nothing while the writable region is non-empty.
    pub fn grow(&mut self) {
        if !self.is_full() {
            return;
        }
        let new_capacity = self.buf.len().saturating_mul(2);
        self.buf.resize(new_capacity, 0);
        tracing::trace!(capacity = new_capacity, "accumulation buffer grown");
    }

    /// Issue one read into the writable region.
    ///
    /// Returns the number of bytes read; `0` means end of stream. Grows the
    /// buffer first when it is full. Reads interrupted by a signal are
    /// re-issued.
    pub fn fill_from<R: Read + ?Sized>(&mut self, source: &mut R) -> io::Result<usize> {
        self.grow();
        let n = loop {
            match source.read(&mut self.buf[self.write_cursor..]) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };
        // Guard against a reader reporting more than it was given.
        self.write_cursor = (self.write_cursor + n).min(self.buf.len());
        Ok(n)
    }

    /// Discard the first `n` pending bytes, shifting the rest to the front.
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.write_cursor);
        self.buf.copy_within(n..self.write_cursor, 0);
        self.write_cursor -= n;
    }

    /// Take every pending byte out of the buffer.
    pub fn take_pending(&mut self) -> Vec<u8> {
        let out = self.pending().to_vec();
        self.write_cursor = 0;
        out
    }
}

impl Default for AccumulationBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_INITIAL_BUFFER_SIZE)
    }
}
