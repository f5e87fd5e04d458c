use std::io::Read;

use crate::buffer::{AccumulationBuffer, DEFAULT_INITIAL_BUFFER_SIZE};
use crate::error::{Error, ParseError};
use crate::types::{DEFAULT_MAX_REQUEST_LINE_LEN, Request};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Settings for [`RequestReader`].
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Capacity of the accumulation buffer before any growth (default: 8).
    pub initial_buffer_size: usize,
    /// Maximum length of the request line, CRLF excluded (default: 8 192).
    pub max_request_line_len: usize,
    /// Parse trailing bytes as a final line when the stream ends without a
    /// CRLF, instead of failing with [`ParseError::IncompleteRequest`]
    /// (default: `false`).
    pub allow_unterminated_line: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            initial_buffer_size: DEFAULT_INITIAL_BUFFER_SIZE,
            max_request_line_len: DEFAULT_MAX_REQUEST_LINE_LEN,
            allow_unterminated_line: false,
        }
    }
}

// ---------------------------------------------------------------------------
// RequestReader
// ---------------------------------------------------------------------------

/// Drives [`Request::parse`] from a blocking byte source.
///
/// The reader owns its accumulation buffer; one instance per connection.
///
/// ```rust
/// use httpfromtcp::RequestReader;
///
/// let mut reader = RequestReader::new(&b"GET /a HTTP/1.1\r\nHost: x\r\n"[..]);
/// let request = reader.read_request().unwrap();
/// assert_eq!(request.request_line().unwrap().target(), "/a");
/// // Bytes past the request line are kept, not parsed.
/// assert!(reader.buffered().starts_with(b"Host"));
/// ```
#[derive(Debug)]
pub struct RequestReader<R> {
    source: R,
    buffer: AccumulationBuffer,
    config: ReaderConfig,
}

impl<R: Read> RequestReader<R> {
    /// Create a reader with default configuration.
    pub fn new(source: R) -> Self {
        Self::with_config(source, ReaderConfig::default())
    }

    /// Create a reader with custom buffer size, line limit and end-of-stream
    /// handling.
    pub fn with_config(source: R, config: ReaderConfig) -> Self {
        Self {
            source,
            buffer: AccumulationBuffer::with_capacity(config.initial_buffer_size),
            config,
        }
    }

    /// Read from the source until a request line is recognized.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] if the source fails; nothing is retried.
    /// - [`Error::Parse`] if the line is rejected, too long, or the stream
    ///   ends before a complete line.
    pub fn read_request(&mut self) -> Result<Request, Error> {
        let mut request = Request::with_max_line_len(self.config.max_request_line_len);
        let mut eof = false;

        while !request.is_done() {
            let n = self.buffer.fill_from(&mut self.source)?;
            if n == 0 {
                tracing::debug!(pending = self.buffer.pending().len(), "end of stream");
                eof = true;
            }

            let consumed = request.parse(self.buffer.pending())?;
            if consumed > 0 {
                self.buffer.consume(consumed);
                continue;
            }

            if eof {
                self.finish_at_eof(&mut request)?;
            }
        }

        if let Some(line) = request.request_line() {
            tracing::debug!(
                method = line.method(),
                target = line.target(),
                buffered = self.buffer.pending().len(),
                "request line parsed"
            );
        }
        Ok(request)
    }

    /// Handle end of stream when no CRLF-terminated line was found.
    fn finish_at_eof(&mut self, request: &mut Request) -> Result<(), ParseError> {
        if !self.config.allow_unterminated_line || self.buffer.pending().is_empty() {
            return Err(ParseError::IncompleteRequest);
        }
        let tail = self.buffer.take_pending();
        request.parse_unterminated(&tail)?;
        Ok(())
    }

    /// Bytes read from the source but not consumed by the parser.
    ///
    /// Only what the last read happened to deliver past the request line;
    /// the source may still hold more.
    pub fn buffered(&self) -> &[u8] {
        self.buffer.pending()
    }

    /// Current capacity of the accumulation buffer.
    pub fn buffer_capacity(&self) -> usize {
        self.buffer.capacity()
    }
}
