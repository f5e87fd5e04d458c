use std::{fmt, io};

/// Errors produced while recognizing a request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The line did not split into exactly three non-empty tokens separated
    /// by single spaces, or was not valid UTF-8.
    MalformedRequestLine(String),
    /// The version token was present but is not `HTTP/1.1`.
    UnsupportedVersion(String),
    /// The method token contains a letter that is not uppercase.
    InvalidMethod(String),
    /// `parse` was called on a request that already reached `Done`.
    AlreadyDone,
    /// The request line (without CRLF) exceeds the configured maximum.
    RequestLineTooLong {
        /// Maximum accepted line length in bytes.
        limit: usize,
    },
    /// The source ended before a complete request line was seen.
    IncompleteRequest,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedRequestLine(l) => write!(f, "malformed request line: '{l}'"),
            Self::UnsupportedVersion(v) => write!(f, "unsupported HTTP version: '{v}'"),
            Self::InvalidMethod(m) => write!(f, "invalid HTTP method: '{m}'"),
            Self::AlreadyDone => write!(f, "parser invoked after the request was done"),
            Self::RequestLineTooLong { limit } => {
                write!(f, "request line exceeds {limit} bytes")
            }
            Self::IncompleteRequest => write!(f, "stream ended before a complete request line"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Errors returned by the stream driver.
#[derive(Debug)]
pub enum Error {
    /// The byte source failed for a reason other than end of stream.
    Io(io::Error),
    /// The buffered bytes could not be parsed.
    Parse(ParseError),
}

impl Error {
    /// Returns the parse error, if this is one.
    pub fn as_parse(&self) -> Option<&ParseError> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Io(_) => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "i/o error: {err}"),
            Self::Parse(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
        }
    }
}

impl From<io::Error> for Error {
    fn from(v: io::Error) -> Self {
        Self::Io(v)
    }
}

impl From<ParseError> for Error {
    fn from(v: ParseError) -> Self {
        Self::Parse(v)
    }
}
