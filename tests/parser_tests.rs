use std::io::{self, Read};

use proptest::prelude::*;

use httpfromtcp::{
    format_debug, format_json, format_request_line, request_from_reader,
    request_from_reader_with_config, Error, ParseError, ParserState, ReaderConfig, Request,
    RequestReader, DEFAULT_MAX_REQUEST_LINE_LEN,
};

// =========================================================================
// Test sources
// =========================================================================

/// Delivers `data` at most `chunk` bytes per read, then optionally fails.
struct ChunkReader {
    data: Vec<u8>,
    pos: usize,
    chunk: usize,
    fail_at_end: bool,
}

impl ChunkReader {
    fn new(data: impl AsRef<[u8]>, chunk: usize) -> Self {
        Self {
            data: data.as_ref().to_vec(),
            pos: 0,
            chunk,
            fail_at_end: false,
        }
    }

    fn failing(data: impl AsRef<[u8]>, chunk: usize) -> Self {
        Self {
            fail_at_end: true,
            ..Self::new(data, chunk)
        }
    }
}

impl Read for ChunkReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.data.len() && self.fail_at_end {
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer reset"));
        }
        let end = (self.pos + self.chunk).min(self.data.len());
        let n = (end - self.pos).min(buf.len());
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Yields one `Interrupted` error before every successful read.
struct InterruptingReader {
    inner: ChunkReader,
    interrupt: bool,
}

impl Read for InterruptingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.interrupt = !self.interrupt;
        if self.interrupt {
            return Err(io::ErrorKind::Interrupted.into());
        }
        self.inner.read(buf)
    }
}

fn parse_err(raw: &[u8]) -> ParseError {
    match request_from_reader(raw) {
        Err(Error::Parse(e)) => e,
        other => panic!("expected parse error, got {other:?}"),
    }
}

// =========================================================================
// Request-line parsing
// =========================================================================

#[test]
fn good_request_line_single_chunk() {
    let mut reader = RequestReader::new(&b"GET /index.html HTTP/1.1\r\n"[..]);
    let req = reader.read_request().expect("should parse");
    let line = req.request_line().expect("request line");
    assert_eq!(line.method(), "GET");
    assert_eq!(line.target(), "/index.html");
    assert_eq!(line.http_version(), "1.1");
    assert_eq!(req.state(), ParserState::Done);
    assert!(reader.buffered().is_empty());
}

#[test]
fn good_request_line_one_byte_chunks() {
    let raw = b"GET /index.html HTTP/1.1\r\n";
    let req = request_from_reader(ChunkReader::new(raw, 1)).expect("should parse");
    let line = req.request_line().unwrap();
    assert_eq!(line.method(), "GET");
    assert_eq!(line.target(), "/index.html");
    assert_eq!(line.http_version(), "1.1");
}

#[test]
fn good_request_line_with_path_and_headers() {
    let raw = "GET /coffee HTTP/1.1\r\nHost: localhost:42069\r\nUser-Agent: curl/7.81.0\r\n\r\n";
    let req = request_from_reader(ChunkReader::new(raw, 3)).expect("should parse");
    let line = req.request_line().unwrap();
    assert_eq!(line.method(), "GET");
    assert_eq!(line.target(), "/coffee");
}

#[test]
fn post_request_line() {
    let raw = b"POST /api/chirps HTTP/1.1\r\nContent-Length: 2\r\n\r\n{}";
    let req = request_from_reader(&raw[..]).expect("should parse");
    assert_eq!(req.request_line().unwrap().method(), "POST");
}

#[test]
fn every_chunk_size_gives_the_same_line() {
    let raw = b"OPTIONS * HTTP/1.1\r\nHost: h\r\n\r\n";
    let expected = request_from_reader(&raw[..]).unwrap();
    for chunk in 1..=raw.len() {
        let req = request_from_reader(ChunkReader::new(raw, chunk))
            .unwrap_or_else(|e| panic!("chunk {chunk}: {e}"));
        assert_eq!(req, expected, "mismatch for chunk size {chunk}");
    }
}

#[test]
fn method_with_digits_and_symbols_is_accepted() {
    let req = request_from_reader(&b"M-SEARCH2 * HTTP/1.1\r\n"[..]).expect("should parse");
    assert_eq!(req.request_line().unwrap().method(), "M-SEARCH2");
}

#[test]
fn target_is_not_validated() {
    let req = request_from_reader(&b"GET %zz?a=&&b HTTP/1.1\r\n"[..]).expect("should parse");
    assert_eq!(req.request_line().unwrap().target(), "%zz?a=&&b");
}

#[test]
fn bytes_after_request_line_stay_buffered() {
    let raw = b"GET / HTTP/1.1\r\nHost: x\r\n";
    let config = ReaderConfig {
        initial_buffer_size: 32,
        ..ReaderConfig::default()
    };
    let mut reader = RequestReader::with_config(&raw[..], config);
    reader.read_request().expect("should parse");
    assert_eq!(reader.buffered(), b"Host: x\r\n");
}

#[test]
fn only_bytes_already_read_are_buffered() {
    // 16 bytes fill the grown buffer exactly, so nothing past the line is read.
    let raw = b"GET / HTTP/1.1\r\nHost: x\r\n";
    let mut reader = RequestReader::new(&raw[..]);
    reader.read_request().expect("should parse");
    assert_eq!(reader.buffer_capacity(), 16);
    assert!(reader.buffered().is_empty());
}

#[test]
fn interrupted_reads_are_reissued() {
    let source = InterruptingReader {
        inner: ChunkReader::new("PUT /x HTTP/1.1\r\n", 4),
        interrupt: false,
    };
    let req = request_from_reader(source).expect("should parse");
    assert_eq!(req.request_line().unwrap().method(), "PUT");
}

// =========================================================================
// Parser state machine
// =========================================================================

#[test]
fn parse_without_crlf_consumes_nothing() {
    let mut req = Request::new();
    assert_eq!(req.parse(b"GET / HTTP/1.1").unwrap(), 0);
    assert_eq!(req.parse(b"GET / HTTP/1.1\r").unwrap(), 0);
    assert_eq!(req.state(), ParserState::Initialized);
    assert!(req.request_line().is_none());
}

#[test]
fn parse_reports_line_length_plus_crlf() {
    let mut req = Request::new();
    assert_eq!(req.parse(b"GET / HTTP/1.1\r\nHost: x\r\n").unwrap(), 16);
    assert!(req.is_done());
}

#[test]
fn parse_after_done_is_rejected_without_mutation() {
    let mut req = Request::new();
    req.parse(b"GET /first HTTP/1.1\r\n").unwrap();
    let before = req.clone();

    assert_eq!(
        req.parse(b"POST /second HTTP/1.1\r\n"),
        Err(ParseError::AlreadyDone)
    );
    assert_eq!(req.parse_unterminated(b"POST /x HTTP/1.1"), Err(ParseError::AlreadyDone));
    assert_eq!(req, before);
}

#[test]
fn parse_finds_crlf_split_across_calls() {
    let raw = b"GET /split HTTP/1.1\r\n";
    let mut req = Request::new();
    for end in 1..raw.len() {
        assert_eq!(req.parse(&raw[..end]).unwrap(), 0, "prefix of {end} bytes");
    }
    assert_eq!(req.parse(raw).unwrap(), raw.len());
    assert_eq!(req.request_line().unwrap().target(), "/split");
    assert_eq!(req, {
        let mut whole = Request::new();
        whole.parse(raw).unwrap();
        whole
    });
}

#[test]
fn parse_restarts_search_on_a_shorter_slice() {
    let mut req = Request::new();
    assert_eq!(req.parse(b"GET / HTTP/1.1 and some noise").unwrap(), 0);
    assert_eq!(req.parse(b"GET / HTTP/1.1\r\n").unwrap(), 16);
}

#[test]
fn custom_line_limit_is_reported() {
    assert_eq!(Request::with_max_line_len(64).max_line_len(), 64);
    assert_eq!(Request::new().max_line_len(), DEFAULT_MAX_REQUEST_LINE_LEN);
}

#[test]
fn failed_parse_leaves_request_initialized() {
    let mut req = Request::new();
    assert!(req.parse(b"get / HTTP/1.1\r\n").is_err());
    assert_eq!(req.state(), ParserState::Initialized);
    assert!(req.request_line().is_none());
}

// =========================================================================
// Errors
// =========================================================================

#[test]
fn error_lowercase_method() {
    assert_eq!(
        parse_err(b"get / HTTP/1.1\r\n"),
        ParseError::InvalidMethod("get".into())
    );
}

#[test]
fn error_mixed_case_method() {
    assert!(matches!(
        parse_err(b"Get / HTTP/1.1\r\n"),
        ParseError::InvalidMethod(_)
    ));
}

#[test]
fn error_unsupported_version() {
    assert_eq!(
        parse_err(b"GET / HTTP/2.0\r\n"),
        ParseError::UnsupportedVersion("HTTP/2.0".into())
    );
}

#[test]
fn error_http_10_is_unsupported() {
    assert!(matches!(
        parse_err(b"GET / HTTP/1.0\r\n"),
        ParseError::UnsupportedVersion(_)
    ));
}

#[test]
fn error_missing_token() {
    assert!(matches!(
        parse_err(b"GET HTTP/1.1\r\n"),
        ParseError::MalformedRequestLine(_)
    ));
}

#[test]
fn error_too_many_tokens() {
    assert!(matches!(
        parse_err(b"GET / extra HTTP/1.1\r\n"),
        ParseError::MalformedRequestLine(_)
    ));
}

#[test]
fn error_empty_line() {
    assert!(matches!(
        parse_err(b"\r\nGET / HTTP/1.1\r\n"),
        ParseError::MalformedRequestLine(_)
    ));
}

#[test]
fn error_io_is_propagated() {
    let source = ChunkReader::failing("GET / HT", 3);
    match request_from_reader(source) {
        Err(Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::ConnectionReset),
        other => panic!("expected i/o error, got {other:?}"),
    }
}

#[test]
fn error_io_after_line_is_not_observed() {
    let source = ChunkReader::failing("GET / HTTP/1.1\r\n", 64);
    assert!(request_from_reader(source).is_ok());
}

// =========================================================================
// End of stream
// =========================================================================

#[test]
fn empty_source_is_incomplete() {
    assert_eq!(parse_err(b""), ParseError::IncompleteRequest);
}

#[test]
fn eof_before_crlf_is_incomplete_by_default() {
    let err = request_from_reader(ChunkReader::new("GET / HTTP/1.1", 5)).unwrap_err();
    assert_eq!(err.as_parse(), Some(&ParseError::IncompleteRequest));
}

#[test]
fn eof_before_crlf_parses_tail_when_allowed() {
    let config = ReaderConfig {
        allow_unterminated_line: true,
        ..ReaderConfig::default()
    };
    let req = request_from_reader_with_config(ChunkReader::new("DELETE /x HTTP/1.1", 5), config)
        .expect("should parse");
    let line = req.request_line().unwrap();
    assert_eq!(line.method(), "DELETE");
    assert_eq!(line.target(), "/x");
    assert!(req.is_done());
}

#[test]
fn unterminated_tail_is_still_validated() {
    let config = ReaderConfig {
        allow_unterminated_line: true,
        ..ReaderConfig::default()
    };
    let err = request_from_reader_with_config(&b"get / HTTP/1.1"[..], config).unwrap_err();
    assert_eq!(err.as_parse(), Some(&ParseError::InvalidMethod("get".into())));
}

#[test]
fn empty_source_is_incomplete_even_when_lenient() {
    let config = ReaderConfig {
        allow_unterminated_line: true,
        ..ReaderConfig::default()
    };
    let err = request_from_reader_with_config(&b""[..], config).unwrap_err();
    assert_eq!(err.as_parse(), Some(&ParseError::IncompleteRequest));
}

// =========================================================================
// Configuration limits
// =========================================================================

#[test]
fn config_max_line_len_enforced_without_crlf() {
    let config = ReaderConfig {
        max_request_line_len: 16,
        ..ReaderConfig::default()
    };
    let raw = vec![b'A'; 4096];
    let mut reader = RequestReader::with_config(ChunkReader::new(raw, 1), config);
    let err = reader.read_request().unwrap_err();
    assert_eq!(
        err.as_parse(),
        Some(&ParseError::RequestLineTooLong { limit: 16 })
    );
    assert!(reader.buffer_capacity() <= 32);
}

#[test]
fn config_max_line_len_enforced_with_crlf() {
    let config = ReaderConfig {
        max_request_line_len: 10,
        ..ReaderConfig::default()
    };
    let err = request_from_reader_with_config(&b"GET /long-target HTTP/1.1\r\n"[..], config)
        .unwrap_err();
    assert_eq!(
        err.as_parse(),
        Some(&ParseError::RequestLineTooLong { limit: 10 })
    );
}

#[test]
fn config_line_exactly_at_limit_is_accepted() {
    let raw = b"GET / HTTP/1.1\r\n";
    let config = ReaderConfig {
        max_request_line_len: raw.len() - 2,
        ..ReaderConfig::default()
    };
    assert!(request_from_reader_with_config(ChunkReader::new(raw, 1), config).is_ok());
}

#[test]
fn config_zero_initial_buffer_still_works() {
    let config = ReaderConfig {
        initial_buffer_size: 0,
        ..ReaderConfig::default()
    };
    let req = request_from_reader_with_config(&b"GET / HTTP/1.1\r\n"[..], config)
        .expect("should parse");
    assert!(req.is_done());
}

#[test]
fn buffer_grows_by_doubling() {
    let raw = b"GET /a/rather/long/target/path HTTP/1.1\r\n";
    let mut reader = RequestReader::new(ChunkReader::new(raw, 1));
    reader.read_request().expect("should parse");
    assert_eq!(reader.buffer_capacity(), 64);
}

// =========================================================================
// Output formatting
// =========================================================================

#[test]
fn json_output_compact() {
    let req = request_from_reader(&b"GET /x HTTP/1.1\r\n"[..]).unwrap();
    assert_eq!(
        format_json(&req, false),
        r#"{"state":"done","request_line":{"method":"GET","target":"/x","http_version":"1.1"}}"#
    );
}

#[test]
fn json_output_pretty() {
    let req = request_from_reader(&b"GET /x HTTP/1.1\r\n"[..]).unwrap();
    let json = format_json(&req, true);
    assert!(json.contains('\n'));
    assert!(json.contains("\"method\": \"GET\""));
}

#[test]
fn debug_output_contains_fields() {
    let req = request_from_reader(&b"PATCH /y HTTP/1.1\r\n"[..]).unwrap();
    let out = format_debug(&req);
    assert!(out.contains("State:   done"));
    assert!(out.contains("Method:  PATCH"));
    assert!(out.contains("Target:  /y"));
    assert!(out.contains("Version: 1.1"));
}

#[test]
fn debug_output_without_request_line() {
    let out = format_debug(&Request::new());
    assert!(out.contains("State:   initialized"));
    assert!(out.contains("No Request Line"));
}

#[test]
fn request_line_output_is_canonical() {
    let req = request_from_reader(&b"HEAD /z HTTP/1.1\r\n"[..]).unwrap();
    assert_eq!(format_request_line(&req), "HEAD /z HTTP/1.1\n");
    assert_eq!(format_request_line(&Request::new()), "");
}

#[test]
fn error_display_messages() {
    assert_eq!(
        ParseError::InvalidMethod("get".into()).to_string(),
        "invalid HTTP method: 'get'"
    );
    assert_eq!(
        ParseError::RequestLineTooLong { limit: 8 }.to_string(),
        "request line exceeds 8 bytes"
    );
    let io_err = Error::from(io::Error::new(io::ErrorKind::Other, "boom"));
    assert_eq!(io_err.to_string(), "i/o error: boom");
    assert!(std::error::Error::source(&io_err).is_some());
}

// =========================================================================
// Chunk-size invariance
// =========================================================================

fn request_line_bytes() -> impl Strategy<Value = String> {
    (
        "[A-Z][A-Z0-9_-]{0,9}",
        "/[A-Za-z0-9/._?=&%-]{0,40}",
        "(\r\n[A-Za-z-]{1,12}: [ -~]{0,20}){0,3}",
    )
        .prop_map(|(method, target, rest)| format!("{method} {target} HTTP/1.1\r\n{rest}"))
}

proptest! {
    #[test]
    fn chunking_never_changes_the_request(
        raw in request_line_bytes(),
        chunk in 1usize..32,
        initial in 1usize..16,
    ) {
        let whole = request_from_reader(raw.as_bytes()).unwrap();
        let config = ReaderConfig { initial_buffer_size: initial, ..ReaderConfig::default() };
        let chunked = request_from_reader_with_config(ChunkReader::new(&raw, chunk), config).unwrap();
        prop_assert_eq!(chunked, whole);
    }
}
