use std::io::{self, Read};

use crate::buffer::{AccumulationBuffer, DEFAULT_INITIAL_BUFFER_SIZE};

/// Default upper bound on a single line yielded by [`LineReader`].
pub const DEFAULT_MAX_LINE_LEN: usize = 64 * 1024;

/// Splits a byte stream into delimiter-terminated lines.
///
/// Uses the same accumulate / scan / consume cycle as
/// [`RequestReader`](crate::RequestReader): any number of lines may arrive in
/// one read, and a line may span any number of reads. At end of stream a
/// non-empty unterminated remainder is yielded as the last line.
///
/// ```rust
/// use httpfromtcp::LineReader;
///
/// let lines: Vec<Vec<u8>> = LineReader::new(&b"one\ntwo\nthree"[..])
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(lines, [&b"one"[..], b"two", b"three"]);
/// ```
#[derive(Debug)]
pub struct LineReader<R> {
    source: R,
    buffer: AccumulationBuffer,
    delimiter: u8,
    max_line_len: usize,
    /// Bytes at the front of the buffer already known to hold no delimiter.
    scanned: usize,
    eof: bool,
    finished: bool,
}

impl<R: Read> LineReader<R> {
    /// Split on `\n`.
    pub fn new(source: R) -> Self {
        Self::with_delimiter(source, b'\n')
    }

    /// Split on an arbitrary delimiter byte.
    pub fn with_delimiter(source: R, delimiter: u8) -> Self {
        Self {
            source,
            buffer: AccumulationBuffer::with_capacity(DEFAULT_INITIAL_BUFFER_SIZE),
            delimiter,
            max_line_len: DEFAULT_MAX_LINE_LEN,
            scanned: 0,
            eof: false,
            finished: false,
        }
    }

    /// Replace the maximum line length, delimiter excluded.
    pub fn max_line_len(mut self, max_line_len: usize) -> Self {
        self.max_line_len = max_line_len;
        self
    }

    fn next_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        loop {
            let pending = self.buffer.pending();
            if let Some(pos) = pending[self.scanned..]
                .iter()
                .position(|&b| b == self.delimiter)
            {
                let end = self.scanned + pos;
                let line = pending[..end].to_vec();
                self.buffer.consume(end + 1);
                self.scanned = 0;
                self.check_len(line.len())?;
                return Ok(Some(line));
            }
            self.scanned = pending.len();
            self.check_len(pending.len())?;

            if self.eof {
                self.scanned = 0;
                let rest = self.buffer.take_pending();
                return Ok((!rest.is_empty()).then_some(rest));
            }

            if self.buffer.fill_from(&mut self.source)? == 0 {
                tracing::trace!(pending = self.buffer.pending().len(), "line source ended");
                self.eof = true;
            }
        }
    }

    fn check_len(&self, len: usize) -> io::Result<()> {
        if len > self.max_line_len {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("line exceeds {} bytes", self.max_line_len),
            ));
        }
        Ok(())
    }
}

impl<R: Read> Iterator for LineReader<R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_line() {
            Ok(Some(line)) => Some(Ok(line)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl<R: Read> std::iter::FusedIterator for LineReader<R> {}
