//! # httpfromtcp
//!
//! An **incremental HTTP/1.1 request-line parser** driven by a blocking byte
//! source, usable as a Rust library and as a CLI tool.
//!
//! Bytes may arrive in chunks of any size. The parser only ever looks at the
//! bytes buffered so far and reports how many it consumed, so the result is
//! the same whether a line arrives in one read or one byte at a time. Only the
//! request line (`METHOD TARGET HTTP/1.1`) is parsed; headers and bodies are
//! left in the reader's buffer untouched.
//!
//! ## Quick start: reading from a source
//!
//! ```rust
//! use httpfromtcp::request_from_reader;
//!
//! let raw = &b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n"[..];
//! let request = request_from_reader(raw).expect("valid request line");
//! let line = request.request_line().unwrap();
//! assert_eq!(line.method(), "GET");
//! assert_eq!(line.target(), "/index.html");
//! assert_eq!(line.http_version(), "1.1");
//! ```
//!
//! ## Quick start: feeding the parser by hand
//!
//! ```rust
//! use httpfromtcp::{ParserState, Request};
//!
//! let mut request = Request::new();
//!
//! assert_eq!(request.parse(b"GET / HT").unwrap(), 0);
//! assert_eq!(request.state(), ParserState::Initialized);
//!
//! assert_eq!(request.parse(b"GET / HTTP/1.1\r\n").unwrap(), 16);
//! assert!(request.is_done());
//! ```

mod buffer;
mod error;
mod lines;
mod output;
mod parser;
mod reader;
mod types;

// Re-export public API.
pub use buffer::{AccumulationBuffer, DEFAULT_INITIAL_BUFFER_SIZE};
pub use error::{Error, ParseError};
pub use lines::{DEFAULT_MAX_LINE_LEN, LineReader};
pub use output::{format_debug, format_json, format_request_line};
pub use reader::{ReaderConfig, RequestReader};
pub use types::{DEFAULT_MAX_REQUEST_LINE_LEN, ParserState, Request, RequestLine};

use std::io::Read;

/// Read one request line from `source` with the default [`ReaderConfig`].
///
/// This is a convenience wrapper around [`RequestReader`]. Use a
/// `RequestReader` directly to tune limits or inspect the bytes buffered past
/// the request line.
///
/// # Errors
///
/// Returns [`Error::Io`] when the source fails and [`Error::Parse`] when the
/// line is rejected or the stream ends before a complete line.
pub fn request_from_reader<R: Read>(source: R) -> Result<Request, Error> {
    RequestReader::new(source).read_request()
}

/// Read one request line from `source` using custom [`ReaderConfig`] settings.
///
/// # Errors
///
/// Same as [`request_from_reader`].
pub fn request_from_reader_with_config<R: Read>(
    source: R,
    config: ReaderConfig,
) -> Result<Request, Error> {
    RequestReader::with_config(source, config).read_request()
}
