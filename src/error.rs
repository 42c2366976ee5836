use std::io;

/// Protocol violations detected while decoding a request.
///
/// Every variant is terminal for the current request and is reported to the
/// connection owner as [`HttpCode::BadRequest`](crate::HttpCode::BadRequest).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The request line does not match `METHOD SP TARGET SP HTTP/VERSION`.
    #[error("malformed request line: {0:?}")]
    RequestLine(String),

    /// The request target is neither origin-form nor absolute-form.
    #[error("unparseable request target: {0:?}")]
    Target(String),

    /// The protocol version is not a dotted `major.minor` pair.
    #[error("unsupported protocol version: {0:?}")]
    Version(String),
}

/// Errors produced while driving a [`Connection`](crate::Connection).
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// No bytes arrived within the configured read timeout.
    #[error("read timed out")]
    Timeout,

    /// The peer closed the connection before a write finished.
    #[error("connection closed")]
    Closed,
}
