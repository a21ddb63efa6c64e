//! Access-log line parser.
//!
//! Accepts exactly one line shape:
//!
//! ```text
//! <address> - [<YYYY-MM-DD hh:mm:ss[.ffffff]>] "GET /projects/260 HTTP/1.1" <status> <size>
//! ```
//!
//! The whole line must match. Instead of compiling a regex, a small
//! byte scanner walks the tokens left to right; every token is ASCII, so
//! slicing at scanner positions always lands on a char boundary.

use crate::model::{LogRecord, StatusCode};

/// The only request token accepted.
const REQUEST: &str = "\"GET /projects/260 HTTP/1.1\"";

/// Maximum number of digits in the size token.
const MAX_SIZE_DIGITS: usize = 12;

/// Maximum number of fractional-second digits in the timestamp.
const MAX_FRACTION_DIGITS: usize = 12;

/// A line that does not match the access-log grammar.
#[derive(Debug, Clone, PartialEq)]
pub struct NoMatch {
    pub message: String,
}

impl NoMatch {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for NoMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "No match: {}", self.message)
    }
}

impl std::error::Error for NoMatch {}

/// A matched line with the tokens that are not folded into metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLine<'a> {
    /// Client address or host name.
    pub address: &'a str,
    /// Timestamp between the brackets, unparsed.
    pub timestamp: &'a str,
    pub record: LogRecord,
}

/// Classifies a line, keeping only what the accumulator needs.
pub fn classify(line: &str) -> Result<LogRecord, NoMatch> {
    parse_line(line).map(|parsed| parsed.record)
}

/// Parses a line with trailing terminators already removed.
pub fn parse_line(line: &str) -> Result<ParsedLine<'_>, NoMatch> {
    let mut scanner = Scanner::new(line);

    let address = scanner.take_while(usize::MAX, is_address_byte);
    if address.is_empty() {
        return Err(NoMatch::new("missing address"));
    }
    scanner.literal(" - [", "' - [' after address")?;

    let timestamp = scanner.timestamp()?;
    scanner.literal("] ", "'] ' after timestamp")?;

    scanner.literal(REQUEST, "request token")?;
    scanner.literal(" ", "space after request")?;

    let status_token = scanner.take_while(3, |b| b.is_ascii_digit());
    let status = StatusCode::from_digits(status_token)
        .ok_or_else(|| NoMatch::new(format!("untracked status code '{}'", status_token)))?;
    scanner.literal(" ", "space after status code")?;

    let size_token = scanner.take_while(MAX_SIZE_DIGITS, |b| b.is_ascii_digit());
    if !scanner.is_done() {
        return Err(NoMatch::new(format!(
            "unexpected trailing input '{}'",
            scanner.rest()
        )));
    }
    if size_token.is_empty() {
        return Err(NoMatch::new("empty size"));
    }
    let bytes = size_token
        .parse::<u64>()
        .map_err(|e| NoMatch::new(format!("invalid size '{}': {}", size_token, e)))?;

    Ok(ParsedLine {
        address,
        timestamp,
        record: LogRecord { status, bytes },
    })
}

fn is_address_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'.' || b == b'-'
}

struct Scanner<'a> {
    line: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(line: &'a str) -> Self {
        Self { line, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.line[self.pos..]
    }

    fn is_done(&self) -> bool {
        self.pos == self.line.len()
    }

    /// Consumes `lit` or fails naming `what`.
    fn literal(&mut self, lit: &str, what: &str) -> Result<(), NoMatch> {
        if self.rest().starts_with(lit) {
            self.pos += lit.len();
            Ok(())
        } else {
            Err(NoMatch::new(format!("expected {}", what)))
        }
    }

    /// Consumes up to `max` ASCII bytes satisfying `pred`.
    fn take_while(&mut self, max: usize, pred: impl Fn(u8) -> bool) -> &'a str {
        let bytes = self.line.as_bytes();
        let start = self.pos;
        while self.pos < bytes.len() && self.pos - start < max && pred(bytes[self.pos]) {
            self.pos += 1;
        }
        &self.line[start..self.pos]
    }

    fn digits(&mut self, n: usize, what: &str) -> Result<(), NoMatch> {
        if self.take_while(n, |b| b.is_ascii_digit()).len() == n {
            Ok(())
        } else {
            Err(NoMatch::new(format!("expected {} digits in {}", n, what)))
        }
    }

    /// `YYYY-MM-DD hh:mm:ss` with an optional `.` and up to 12 fraction digits.
    fn timestamp(&mut self) -> Result<&'a str, NoMatch> {
        let start = self.pos;
        self.digits(4, "year")?;
        self.literal("-", "'-' after year")?;
        self.digits(2, "month")?;
        self.literal("-", "'-' after month")?;
        self.digits(2, "day")?;
        self.literal(" ", "space between date and time")?;
        self.digits(2, "hour")?;
        self.literal(":", "':' after hour")?;
        self.digits(2, "minute")?;
        self.literal(":", "':' after minute")?;
        self.digits(2, "second")?;
        if self.rest().starts_with('.') {
            self.pos += 1;
            self.take_while(MAX_FRACTION_DIGITS, |b| b.is_ascii_digit());
        }
        Ok(&self.line[start..self.pos])
    }
}
