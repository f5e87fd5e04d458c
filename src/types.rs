use serde::Serialize;
use std::fmt;

// ---------------------------------------------------------------------------
// RequestLine
// ---------------------------------------------------------------------------

/// The first line of an HTTP/1.1 request: `METHOD TARGET HTTP/1.1`.
///
/// All three fields are non-empty and come from exactly one CRLF-terminated
/// line. The value cannot be modified once produced by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RequestLine {
    method: String,
    target: String,
    http_version: String,
}

impl RequestLine {
    pub(crate) fn new(method: String, target: String, http_version: String) -> Self {
        Self {
            method,
            target,
            http_version,
        }
    }

    /// The method token, e.g. `GET`.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The request target, unvalidated and not percent-decoded.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The numeric version with the `HTTP/` prefix stripped, e.g. `1.1`.
    pub fn http_version(&self) -> &str {
        &self.http_version
    }
}

impl fmt::Display for RequestLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} HTTP/{}", self.method, self.target, self.http_version)
    }
}

// ---------------------------------------------------------------------------
// ParserState
// ---------------------------------------------------------------------------

/// Progress of a [`Request`] through the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserState {
    /// No request line recognized yet.
    Initialized,
    /// Terminal: the request line was recognized.
    Done,
}

impl ParserState {
    /// Return the state as a static string slice.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for ParserState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Default upper bound on the length of a request line, CRLF excluded.
pub const DEFAULT_MAX_REQUEST_LINE_LEN: usize = 8_192;

/// A request under construction.
///
/// Starts [`ParserState::Initialized`] and is only mutated by
/// [`Request::parse`]; once [`ParserState::Done`] it never changes again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Request {
    pub(crate) state: ParserState,
    pub(crate) request_line: Option<RequestLine>,
    #[serde(skip)]
    pub(crate) max_line_len: usize,
    /// Leading pending bytes already searched for a CRLF.
    #[serde(skip)]
    pub(crate) scanned: usize,
}

impl Request {
    /// Create an empty request accepting lines up to
    /// [`DEFAULT_MAX_REQUEST_LINE_LEN`] bytes.
    pub fn new() -> Self {
        Self::with_max_line_len(DEFAULT_MAX_REQUEST_LINE_LEN)
    }

    /// Create an empty request with a custom request-line limit.
    pub fn with_max_line_len(max_line_len: usize) -> Self {
        Self {
            state: ParserState::Initialized,
            request_line: None,
            max_line_len,
            scanned: 0,
        }
    }

    /// Current position in the state machine.
    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Returns `true` once the parser reached its terminal state.
    pub fn is_done(&self) -> bool {
        self.state == ParserState::Done
    }

    /// The parsed request line, available once the request is done.
    pub fn request_line(&self) -> Option<&RequestLine> {
        self.request_line.as_ref()
    }

    /// Longest request line accepted, CRLF excluded.
    pub fn max_line_len(&self) -> usize {
        self.max_line_len
    }
}

impl Default for Request {
    fn default() -> Self {
        Self::new()
    }
}
