//! Error kinds surfaced by the parser, the tree and the writer
use std::fmt;

/// A mailtree failure
///
/// `MalformedHeader`, `MalformedBoundary` and `TruncatedMessage` are also
/// recorded as flags on the affected part rather than aborting the parse;
/// most callers read those flags instead of matching on this type.
#[derive(Debug)]
pub enum Error {
    /// The underlying input could not be read
    IoFailure(std::io::Error),
    /// A header line could not be parsed into a name/value pair
    MalformedHeader(String),
    /// A `boundary` parameter was missing, empty or never matched in the
    /// body
    MalformedBoundary(String),
    /// The input ended before a part's content or an expected terminator
    /// boundary was found
    TruncatedMessage(String),
    /// An attempted tree edit violated a structural invariant (e.g.
    /// reparenting a part under its own descendant)
    InvalidMutation(String),
    /// A transfer or charset decoder could not produce valid output for a
    /// content stream
    DecodingFailure(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::IoFailure(e) => write!(f, "i/o failure: {e}"),
            Error::MalformedHeader(s) => write!(f, "malformed header: {s}"),
            Error::MalformedBoundary(s) => write!(f, "malformed boundary: {s}"),
            Error::TruncatedMessage(s) => write!(f, "truncated message: {s}"),
            Error::InvalidMutation(s) => write!(f, "invalid mutation: {s}"),
            Error::DecodingFailure(s) => write!(f, "decoding failure: {s}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoFailure(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoFailure(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
