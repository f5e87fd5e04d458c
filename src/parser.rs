use crate::error::ParseError;
use crate::types::{ParserState, Request, RequestLine};

const CRLF: &[u8] = b"\r\n";
const SUPPORTED_VERSION: &str = "HTTP/1.1";

impl Request {
    /// Try to recognize the request line at the start of `data`.
    ///
    /// `data` is every pending byte seen so far. Returns the number of bytes
    /// consumed: `0` when no CRLF has arrived yet (the caller must supply more
    /// bytes and call again with the grown slice), or the line length plus
    /// two once the line was recognized and the request moved to
    /// [`ParserState::Done`].
    ///
    /// Successive calls are expected to pass the same pending bytes, grown at
    /// the end. Only the bytes not searched by the previous call are scanned,
    /// so one-byte reads stay linear in the line length. A shorter slice
    /// restarts the search from the front.
    ///
    /// # Errors
    ///
    /// - [`ParseError::AlreadyDone`] if the request is already done. The
    ///   request is left untouched.
    /// - [`ParseError::RequestLineTooLong`] if the line, or the pending bytes
    ///   still waiting for a CRLF, cannot fit the configured limit.
    /// - [`ParseError::MalformedRequestLine`], [`ParseError::UnsupportedVersion`]
    ///   or [`ParseError::InvalidMethod`] when the line is rejected.
    pub fn parse(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        match self.state {
            ParserState::Initialized => {
                // Back up one byte: the previous call may have ended on a CR.
                let from = if data.len() >= self.scanned {
                    self.scanned.saturating_sub(1)
                } else {
                    0
                };
                let Some(line_len) = find_crlf(&data[from..]).map(|pos| from + pos) else {
                    self.scanned = data.len();
                    // A CR may still be followed by its LF, so one extra byte
                    // is tolerated.
                    if data.len() > self.max_line_len.saturating_add(1) {
                        return Err(ParseError::RequestLineTooLong {
                            limit: self.max_line_len,
                        });
                    }
                    return Ok(0);
                };
                self.complete(&data[..line_len])?;
                Ok(line_len + CRLF.len())
            }
            ParserState::Done => Err(ParseError::AlreadyDone),
        }
    }

    /// Parse `line` as the final, unterminated line of a stream that ended.
    ///
    /// Returns the number of bytes consumed, which is always `line.len()`.
    ///
    /// # Errors
    ///
    /// Same as [`Request::parse`]; a `line` that still contains a CRLF is
    /// rejected as malformed.
    pub fn parse_unterminated(&mut self, line: &[u8]) -> Result<usize, ParseError> {
        if self.state == ParserState::Done {
            return Err(ParseError::AlreadyDone);
        }
        if find_crlf(line).is_some() {
            return Err(ParseError::MalformedRequestLine(
                String::from_utf8_lossy(line).into_owned(),
            ));
        }
        self.complete(line)?;
        Ok(line.len())
    }

    fn complete(&mut self, line: &[u8]) -> Result<(), ParseError> {
        if line.len() > self.max_line_len {
            return Err(ParseError::RequestLineTooLong {
                limit: self.max_line_len,
            });
        }
        let request_line = parse_request_line(line)?;
        tracing::trace!(%request_line, "request line recognized");
        self.request_line = Some(request_line);
        self.state = ParserState::Done;
        self.scanned = 0;
        Ok(())
    }
}

/// Parse one request line, CRLF already stripped.
fn parse_request_line(line: &[u8]) -> Result<RequestLine, ParseError> {
    let text = std::str::from_utf8(line).map_err(|_| {
        ParseError::MalformedRequestLine(String::from_utf8_lossy(line).into_owned())
    })?;

    let mut parts = text.split(' ');
    let (Some(method), Some(target), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ParseError::MalformedRequestLine(text.to_owned()));
    };
    if method.is_empty() || target.is_empty() || version.is_empty() {
        return Err(ParseError::MalformedRequestLine(text.to_owned()));
    }

    if version != SUPPORTED_VERSION {
        return Err(ParseError::UnsupportedVersion(version.to_owned()));
    }

    if !is_uppercase_method(method) {
        return Err(ParseError::InvalidMethod(method.to_owned()));
    }

    let numeric = version.strip_prefix("HTTP/").unwrap_or(version);

    Ok(RequestLine::new(
        method.to_owned(),
        target.to_owned(),
        numeric.to_owned(),
    ))
}

/// Offset of the first `\r\n` in `data`.
#[inline]
fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(CRLF.len()).position(|w| w == CRLF)
}

/// No letter in `method` may be anything but uppercase. Digits and symbols
/// pass.
#[inline]
fn is_uppercase_method(method: &str) -> bool {
    method
        .chars()
        .all(|c| !c.is_alphabetic() || c.is_uppercase())
}

// ---------------------------------------------------------------------------
// Tests (unit)
// ---------------------------------------------------------------------------
