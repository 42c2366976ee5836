use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpStream;

use crate::buffer::Buffer;
use crate::dev_print;
use crate::error::ConnectionError;
use crate::helpers::traits::http_stream::StreamHttp;
use crate::parser::RequestParser;
use crate::request::{HttpCode, Request};
use crate::Options;

/// One client connection: the socket, its inbound and outbound buffers and
/// the parser for the request in flight.
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    addr: Option<SocketAddr>,
    read_buf: Buffer,
    write_buf: Buffer,
    parser: RequestParser,
    read_timeout: Duration,
}

impl Connection {
    pub fn new(stream: TcpStream, parser: RequestParser, options: &Options) -> Self {
        let addr = stream.peer_addr().ok();
        Self::with_addr(stream, addr, parser, options)
    }

    /// Like [`new`](Self::new) with a peer address already known from
    /// `accept`.
    pub fn with_addr(
        stream: TcpStream,
        addr: Option<SocketAddr>,
        parser: RequestParser,
        options: &Options,
    ) -> Self {
        Self {
            addr,
            stream,
            read_buf: Buffer::new(options.read_buffer_size),
            write_buf: Buffer::new(options.write_buffer_size),
            parser: parser
                .strict_body_length(options.strict_body_length)
                .remote_addr(addr),
            read_timeout: Duration::from_millis(options.read_timeout_milliseconds),
        }
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.addr
    }

    /// Reads and parses until the parser produces something other than
    /// [`HttpCode::NoRequest`].
    ///
    /// Bytes already buffered (e.g. a pipelined request) are parsed before
    /// touching the socket. Returns [`HttpCode::ClosedConnection`] when the
    /// peer closes before a request completes.
    pub async fn read_request(&mut self) -> Result<HttpCode, ConnectionError> {
        loop {
            let code = self.parser.consume(&mut self.read_buf);
            if code != HttpCode::NoRequest {
                return Ok(code);
            }

            let read = tokio::time::timeout(
                self.read_timeout,
                self.stream.read_buffer(&mut self.read_buf),
            )
            .await
            .map_err(|_| ConnectionError::Timeout)??;

            if read == 0 {
                dev_print!("connection closed by {:?}", self.addr);
                return Ok(HttpCode::ClosedConnection);
            }
            dev_print!("read {} bytes from {:?}", read, self.addr);
        }
    }

    pub fn request(&self) -> &Request {
        self.parser.request()
    }

    pub fn parser(&self) -> &RequestParser {
        &self.parser
    }

    pub fn is_keep_alive(&self) -> bool {
        self.parser.is_keep_alive()
    }

    /// Outbound staging buffer. Drained by [`flush`](Self::flush).
    pub fn write_buffer_mut(&mut self) -> &mut Buffer {
        &mut self.write_buf
    }

    pub async fn flush(&mut self) -> Result<usize, ConnectionError> {
        match self.stream.write_buffer(&mut self.write_buf).await {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::WriteZero => Err(ConnectionError::Closed),
            Err(e) => Err(e.into()),
        }
    }

    /// Prepares for the next request on a kept-alive connection. Unparsed
    /// bytes stay buffered.
    pub fn reset(&mut self) {
        self.parser.init();
    }

    pub fn into_stream(self) -> TcpStream {
        self.stream
    }
}
