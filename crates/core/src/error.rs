//! Error types for the streaming server library.

use std::fmt;

/// Errors that can occur in the streaming server library.
///
/// Variants map to specific failure modes across the stack:
///
/// - **Protocol**: [`Parse`](Self::Parse) — malformed control requests.
/// - **Transport**: [`Io`](Self::Io) — socket/network failures.
/// - **Media**: [`StreamNotFound`](Self::StreamNotFound) — SETUP named a
///   resource the [`MediaProvider`](crate::media::MediaProvider) cannot open.
/// - **Server**: [`AlreadyRunning`](Self::AlreadyRunning).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Underlying I/O or socket error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested media resource could not be opened.
    #[error("stream not found: {0}")]
    StreamNotFound(String),

    /// [`Server::start`](crate::Server::start) was called while already running.
    #[error("server already running")]
    AlreadyRunning,

    /// Failed to parse a control request.
    #[error("request parse error: {kind}")]
    Parse { kind: ParseErrorKind },
}

/// Specific kind of control-request parse failure.
#[derive(Debug)]
pub enum ParseErrorKind {
    /// Input was empty (no request line).
    EmptyRequest,
    /// Request line did not have the expected `Method Resource Version` format.
    InvalidRequestLine,
    /// Second line was missing or did not carry a `CSeq:` token pair.
    MissingCseq,
    /// SETUP transport line was missing or its port token did not parse.
    InvalidTransport,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyRequest => write!(f, "empty request"),
            Self::InvalidRequestLine => write!(f, "invalid request line"),
            Self::MissingCseq => write!(f, "missing CSeq line"),
            Self::InvalidTransport => write!(f, "invalid transport line"),
        }
    }
}

/// Convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
