use crate::types::Request;

/// Serialize a [`Request`] to a JSON string.
///
/// When `pretty` is `true` the output is indented for readability.
pub fn format_json(request: &Request, pretty: bool) -> String {
    if pretty {
        serde_json::to_string_pretty(request).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    } else {
        serde_json::to_string(request).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }
}

/// Render a [`Request`] in a human-readable debug format.
pub fn format_debug(request: &Request) -> String {
    let mut out = String::with_capacity(128);

    out.push_str("=== HTTP Request Line ===\n");
    out.push_str(&format!("State:   {}\n", request.state()));
    match request.request_line() {
        Some(line) => {
            out.push_str(&format!("Method:  {}\n", line.method()));
            out.push_str(&format!("Target:  {}\n", line.target()));
            out.push_str(&format!("Version: {}\n", line.http_version()));
        }
        None => out.push_str("--- No Request Line ---\n"),
    }
    out.push_str("=========================\n");
    out
}

/// Render the canonical `METHOD TARGET HTTP/x.y` line, newline-terminated.
///
/// Empty when no request line was parsed.
pub fn format_request_line(request: &Request) -> String {
    request
        .request_line()
        .map(|line| format!("{line}\n"))
        .unwrap_or_default()
}
