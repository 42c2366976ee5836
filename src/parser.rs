use std::net::SocketAddr;
use std::sync::Arc;

use http::{HeaderName, HeaderValue};

use crate::buffer::Buffer;
use crate::dev_print;
use crate::error::ParseError;
use crate::helpers::traits::bytes::{FindBytes, SplitOnce, CRLF};
use crate::helpers::traits::DecodeForm;
use crate::request::{HttpCode, Request};
use crate::routes::RouteTable;
use crate::verify::UserVerifier;

/// Position of the parser within a request. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParseState {
    RequestLine,
    Headers,
    Body,
    Finish,
}

/// Incremental HTTP/1.1 request decoder.
///
/// Feed it the connection's read buffer every time new bytes arrive. It
/// consumes complete lines, keeps partial ones in the buffer and resumes
/// where it stopped on the next call.
pub struct RequestParser {
    state: ParseState,
    request: Request,
    routes: Arc<RouteTable>,
    verifier: Arc<dyn UserVerifier>,
    strict_body_length: bool,
    remote_addr: Option<SocketAddr>,
    finalized: bool,
}

impl std::fmt::Debug for RequestParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestParser")
            .field("state", &self.state)
            .field("request", &self.request)
            .field("strict_body_length", &self.strict_body_length)
            .field("remote_addr", &self.remote_addr)
            .finish()
    }
}

impl RequestParser {
    pub fn new(routes: Arc<RouteTable>, verifier: Arc<dyn UserVerifier>) -> Self {
        Self {
            state: ParseState::RequestLine,
            request: Request::default(),
            routes,
            verifier,
            strict_body_length: false,
            remote_addr: None,
            finalized: false,
        }
    }

    /// Peer address stamped on every request this parser produces.
    pub fn remote_addr(mut self, addr: Option<SocketAddr>) -> Self {
        self.remote_addr = addr;
        self.request.remote_addr = addr;
        self
    }

    /// When enabled the body is accumulated across reads until the declared
    /// `Content-Length` is reached. When disabled (the default) whatever is
    /// readable once the headers end is taken as the whole body.
    pub fn strict_body_length(mut self, strict: bool) -> Self {
        self.strict_body_length = strict;
        self
    }

    /// Resets the parser for the next request on a kept-alive connection.
    pub fn init(&mut self) {
        self.state = ParseState::RequestLine;
        self.request = Request {
            remote_addr: self.remote_addr,
            ..Default::default()
        };
        self.finalized = false;
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    pub fn take_request(&mut self) -> Request {
        std::mem::take(&mut self.request)
    }

    pub fn is_keep_alive(&self) -> bool {
        self.request.is_keep_alive()
    }

    /// Parses what `buf` holds and maps the outcome onto [`HttpCode`].
    pub fn consume(&mut self, buf: &mut Buffer) -> HttpCode {
        match self.parse(buf) {
            Ok(ParseState::Finish) => HttpCode::GetRequest,
            Ok(_) => HttpCode::NoRequest,
            Err(e) => {
                dev_print!("bad request: {}", e);
                HttpCode::BadRequest
            }
        }
    }

    /// Consumes as many bytes from `buf` as the current state allows.
    ///
    /// Returns the state reached. Anything short of [`ParseState::Finish`]
    /// means the parser is waiting for more bytes.
    pub fn parse(&mut self, buf: &mut Buffer) -> Result<ParseState, ParseError> {
        while buf.readable_bytes() > 0 && self.state != ParseState::Finish {
            match self.state {
                ParseState::RequestLine | ParseState::Headers => {
                    let Some(line_end) = buf.peek().find_crlf() else {
                        break;
                    };
                    let line = buf.peek()[..line_end].to_vec();
                    buf.retrieve_until(line_end + CRLF.len());

                    if self.state == ParseState::RequestLine {
                        self.parse_request_line(&line)?;
                    } else {
                        self.parse_header(&line);
                    }
                }
                ParseState::Body => self.parse_body(buf),
                ParseState::Finish => unreachable!("loop exits on Finish"),
            }
        }

        if self.state == ParseState::Finish && !self.finalized {
            self.finalize();
        }
        Ok(self.state)
    }

    fn parse_request_line(&mut self, line: &[u8]) -> Result<(), ParseError> {
        let line = std::str::from_utf8(line)
            .map_err(|_| ParseError::RequestLine(String::from_utf8_lossy(line).into_owned()))?;

        let mut parts = line.split(' ');
        let (Some(method), Some(target), Some(version), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(ParseError::RequestLine(line.into()));
        };

        if method.is_empty() || !method.bytes().all(is_token_byte) {
            return Err(ParseError::RequestLine(line.into()));
        }
        let version = version
            .strip_prefix("HTTP/")
            .ok_or_else(|| ParseError::RequestLine(line.into()))?;
        if !is_dotted_version(version) {
            return Err(ParseError::Version(version.into()));
        }
        let (path, query) = split_target(target)?;

        self.request.method = method.into();
        self.request.path = self.routes.resolve(&path);
        self.request.query = query;
        self.request.version = version.into();
        dev_print!(
            "request line: {} {} HTTP/{}",
            self.request.method,
            self.request.path,
            self.request.version
        );

        self.state = ParseState::Headers;
        Ok(())
    }

    fn parse_header(&mut self, line: &[u8]) {
        if line.is_empty() {
            self.state = if self.request.content_length() > 0 {
                ParseState::Body
            } else {
                ParseState::Finish
            };
            return;
        }

        // Lines without a colon or with an invalid name are skipped rather
        // than failing the whole request.
        let Some((name, value)) = line.split_once_byte(b':') else {
            dev_print!("ignored header line: {:?}", String::from_utf8_lossy(line));
            return;
        };
        let value = value.strip_prefix(b" ").unwrap_or(value);

        match (HeaderName::from_bytes(name), HeaderValue::from_bytes(value)) {
            (Ok(name), Ok(value)) => {
                self.request.headers.insert(name, value);
            }
            _ => {
                dev_print!("ignored header line: {:?}", String::from_utf8_lossy(line));
            }
        }
    }

    fn parse_body(&mut self, buf: &mut Buffer) {
        let take = if self.strict_body_length {
            let declared = self.request.content_length();
            declared
                .saturating_sub(self.request.body.len())
                .min(buf.readable_bytes())
        } else {
            buf.readable_bytes()
        };

        self.request.body.extend_from_slice(&buf.peek()[..take]);
        buf.retrieve(take);

        if !self.strict_body_length || self.request.body.len() >= self.request.content_length() {
            self.state = ParseState::Finish;
        }
    }

    fn finalize(&mut self) {
        self.finalized = true;

        if self.request.method != "POST" || !self.request.is_form_urlencoded() {
            return;
        }
        self.request.post = self.request.body.decode_form();

        if let Some(tag) = self.routes.tag_of(&self.request.path) {
            let username = self.request.post_field("username").unwrap_or_default();
            let password = self.request.post_field("password").unwrap_or_default();
            let verified = self.verifier.verify(username, password, tag.is_login());
            dev_print!("verification for {:?} ({:?}): {}", username, tag, verified);

            self.request.verified = Some(verified);
            self.request.path = self.routes.verification_page(verified).to_owned();
        }
    }
}

fn is_token_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&byte)
}

fn is_dotted_version(version: &str) -> bool {
    match version.split_once('.') {
        Some((major, minor)) => {
            !major.is_empty()
                && !minor.is_empty()
                && major.bytes().all(|b| b.is_ascii_digit())
                && minor.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

/// Splits a request target into path and query. Accepts an empty target,
/// origin-form (`/a?b`) and absolute-form (`http://host/a?b`).
fn split_target(target: &str) -> Result<(String, Option<String>), ParseError> {
    if target.is_empty() {
        return Ok((String::new(), None));
    }
    if target.starts_with('/') {
        return Ok(match target.split_once('?') {
            Some((path, query)) => (path.into(), Some(query.into())),
            None => (target.into(), None),
        });
    }

    let uri: http::Uri = target
        .parse()
        .map_err(|_| ParseError::Target(target.into()))?;
    if uri.scheme().is_none() || uri.authority().is_none() {
        return Err(ParseError::Target(target.into()));
    }
    Ok((uri.path().into(), uri.query().map(Into::into)))
}
