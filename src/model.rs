//! Access-log record types.
//!
//! A `LogRecord` is produced per matched line and folded into the running
//! totals straight away; nothing here outlives a single line.

use std::fmt;

use serde::{Serialize, Serializer};

/// HTTP status codes tracked by the report.
///
/// Variants are declared in ascending numeric order, so the derived `Ord`
/// matches the order codes are printed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatusCode {
    Ok,
    MovedPermanently,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    InternalServerError,
}

impl StatusCode {
    /// All tracked codes, ascending.
    pub const ALL: [StatusCode; 8] = [
        StatusCode::Ok,
        StatusCode::MovedPermanently,
        StatusCode::BadRequest,
        StatusCode::Unauthorized,
        StatusCode::Forbidden,
        StatusCode::NotFound,
        StatusCode::MethodNotAllowed,
        StatusCode::InternalServerError,
    ];

    /// Numeric value of the code.
    pub fn as_u16(self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::MovedPermanently => 301,
            StatusCode::BadRequest => 400,
            StatusCode::Unauthorized => 401,
            StatusCode::Forbidden => 403,
            StatusCode::NotFound => 404,
            StatusCode::MethodNotAllowed => 405,
            StatusCode::InternalServerError => 500,
        }
    }

    /// Recognises a three-digit status token.
    ///
    /// Returns `None` for anything outside the tracked set, including valid
    /// HTTP codes such as `302` or `503`.
    pub fn from_digits(token: &str) -> Option<StatusCode> {
        let code = match token {
            "200" => StatusCode::Ok,
            "301" => StatusCode::MovedPermanently,
            "400" => StatusCode::BadRequest,
            "401" => StatusCode::Unauthorized,
            "403" => StatusCode::Forbidden,
            "404" => StatusCode::NotFound,
            "405" => StatusCode::MethodNotAllowed,
            "500" => StatusCode::InternalServerError,
            _ => return None,
        };
        Some(code)
    }

    /// Position of the code in [`StatusCode::ALL`].
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

// Serialized as the bare number so JSON maps read `"404": 3`.
impl Serialize for StatusCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.as_u16())
    }
}

/// One classified access-log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRecord {
    /// Response status.
    pub status: StatusCode,
    /// Response body size in bytes.
    pub bytes: u64,
}
