use std::io::{IsTerminal, Read};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::PathBuf;
use std::process;
use std::thread;
use std::time::Duration;

use clap::{CommandFactory, Parser as ClapParser};
use tracing_subscriber::EnvFilter;

use httpfromtcp::{
    format_debug, format_json, format_request_line, Error, LineReader, ReaderConfig,
    Request, RequestReader, DEFAULT_INITIAL_BUFFER_SIZE, DEFAULT_MAX_REQUEST_LINE_LEN,
};

/// httpfromtcp CLI: incremental HTTP/1.1 request-line parser.
///
/// Reads a raw HTTP request from a file, --raw string, stdin, or from every
/// TCP connection accepted on --listen, and prints the parsed request line in
/// the chosen format.
///
/// Escape sequences (\r, \n, \t, \\) in the --raw value are interpreted so
/// you can pass a full request line as a single shell argument.
#[derive(ClapParser)]
#[command(name = "httpfromtcp-cli", version, about, long_about = None)]
struct Cli {
    /// Path to a file containing a raw HTTP request.
    /// Reads from stdin when neither FILE, --raw nor --listen is given.
    #[arg(value_name = "FILE", conflicts_with_all = ["raw", "listen"])]
    file: Option<PathBuf>,

    /// Raw HTTP request string (escape sequences \r \n \t \\ are expanded).
    #[arg(long, conflicts_with = "listen")]
    raw: Option<String>,

    /// Accept TCP connections on this address and parse each one.
    #[arg(long, value_name = "ADDR")]
    listen: Option<SocketAddr>,

    /// Print every newline-terminated line as `read: <line>` instead of
    /// parsing a request line.
    #[arg(long)]
    lines: bool,

    /// Output format.
    #[arg(short, long, default_value = "json", value_enum)]
    format: OutputFormat,

    /// Pretty-print JSON output (ignored for other formats).
    #[arg(short, long)]
    pretty: bool,

    /// Initial size of the accumulation buffer in bytes.
    #[arg(long, default_value_t = DEFAULT_INITIAL_BUFFER_SIZE)]
    initial_buffer_size: usize,

    /// Maximum request-line length in bytes, CRLF excluded.
    #[arg(long, default_value_t = DEFAULT_MAX_REQUEST_LINE_LEN)]
    max_line_len: usize,

    /// Accept a final request line that is not CRLF-terminated.
    #[arg(long)]
    allow_unterminated: bool,

    /// Give up on a connection whose reads block longer than this (listen
    /// mode only).
    #[arg(long, value_name = "MS")]
    read_timeout_ms: Option<u64>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    /// JSON output
    Json,
    /// Human-readable debug output
    Debug,
    /// Canonical request line only
    Line,
}

impl Cli {
    fn reader_config(&self) -> ReaderConfig {
        ReaderConfig {
            initial_buffer_size: self.initial_buffer_size,
            max_request_line_len: self.max_line_len,
            allow_unterminated_line: self.allow_unterminated,
        }
    }
}

fn render(request: &Request, format: OutputFormat, pretty: bool) -> String {
    match format {
        OutputFormat::Json => format!("{}\n", format_json(request, pretty)),
        OutputFormat::Debug => format_debug(request),
        OutputFormat::Line => format_request_line(request),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Some(addr) = cli.listen {
        if let Err(e) = serve(&cli, addr) {
            eprintln!("Error listening on {addr}: {e}");
            process::exit(1);
        }
        return;
    }

    // When no input source is provided and stdin is a terminal (not piped),
    // show help instead of blocking.
    if cli.file.is_none() && cli.raw.is_none() && std::io::stdin().is_terminal() {
        Cli::command().print_help().ok();
        println!();
        process::exit(0);
    }

    let source: Box<dyn Read> = match open_input(&cli) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading input: {e}");
            process::exit(1);
        }
    };

    if cli.lines {
        for line in LineReader::new(source) {
            match line {
                Ok(line) => println!("read: {}", String::from_utf8_lossy(&line)),
                Err(e) => {
                    eprintln!("Error reading input: {e}");
                    process::exit(1);
                }
            }
        }
        return;
    }

    match RequestReader::with_config(source, cli.reader_config()).read_request() {
        Ok(request) => print!("{}", render(&request, cli.format, cli.pretty)),
        Err(Error::Io(e)) => {
            eprintln!("Error reading input: {e}");
            process::exit(1);
        }
        Err(Error::Parse(e)) => {
            eprintln!("Parse error: {e}");
            process::exit(2);
        }
    }
}

/// Accept connections forever, one thread and one reader per connection.
fn serve(cli: &Cli, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr)?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    for stream in listener.incoming() {
        let stream = match stream {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "could not accept connection");
                continue;
            }
        };
        let peer = stream.peer_addr().ok();
        println!("accepted connection");
        tracing::debug!(?peer, "accepted connection");

        if let Err(e) = stream.set_read_timeout(cli.read_timeout_ms.map(Duration::from_millis)) {
            tracing::warn!(error = %e, "could not set read timeout");
        }

        let lines = cli.lines;
        let config = cli.reader_config();
        let format = cli.format;
        let pretty = cli.pretty;
        thread::spawn(move || {
            handle_connection(stream, lines, config, format, pretty);
            println!("closed connection");
            tracing::debug!(?peer, "closed connection");
        });
    }
    Ok(())
}

fn handle_connection(
    stream: TcpStream,
    lines: bool,
    config: ReaderConfig,
    format: OutputFormat,
    pretty: bool,
) {
    if lines {
        for line in LineReader::new(stream) {
            match line {
                Ok(line) => println!("read: {}", String::from_utf8_lossy(&line)),
                Err(e) => {
                    tracing::warn!(error = %e, "line reader failed");
                    return;
                }
            }
        }
        return;
    }

    match RequestReader::with_config(stream, config).read_request() {
        Ok(request) => print!("{}", render(&request, format, pretty)),
        Err(e) => tracing::warn!(error = %e, "request rejected"),
    }
}

/// Open --raw, a file, or stdin as the byte source.
fn open_input(cli: &Cli) -> Result<Box<dyn Read>, std::io::Error> {
    if let Some(raw) = &cli.raw {
        return Ok(Box::new(std::io::Cursor::new(unescape(raw).into_bytes())));
    }
    match &cli.file {
        Some(path) => Ok(Box::new(std::fs::File::open(path)?)),
        None => Ok(Box::new(std::io::stdin())),
    }
}

/// Expand C-style escape sequences (`\r`, `\n`, `\t`, `\\`) in a string.
///
/// Any other `\X` sequence is kept as-is (both the backslash and `X`).
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('r') => out.push('\r'),
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(ch);
        }
    }
    out
}
