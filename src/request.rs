use std::collections::HashMap;
use std::net::SocketAddr;

use http::header::{CONNECTION, CONTENT_LENGTH, CONTENT_TYPE};
use http::HeaderMap;

use crate::Body;

/// Outcome reported upward after feeding bytes to a parser.
///
/// The parser itself only produces `NoRequest`, `GetRequest` and
/// `BadRequest`; the connection driver adds `ClosedConnection`. The
/// remaining variants belong to the resource resolution step so a handler
/// can switch over a single enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpCode {
    /// More bytes are needed. Not an error.
    NoRequest,
    /// A complete request was parsed.
    GetRequest,
    BadRequest,
    NoResource,
    ForbiddenRequest,
    FileRequest,
    InternalError,
    ClosedConnection,
}

/// A decoded HTTP/1.1 request.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) query: Option<String>,
    pub(crate) version: String,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Vec<u8>,
    pub(crate) post: HashMap<String, String>,
    pub(crate) verified: Option<bool>,
    pub(crate) remote_addr: Option<SocketAddr>,
}

impl Request {
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Resolved resource path, e.g. `/index.html` for `/`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn path_mut(&mut self) -> &mut String {
        &mut self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Version without the `HTTP/` prefix, e.g. `1.1`.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Case-insensitive header lookup. Values that are not visible ASCII
    /// are reported as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn body_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn post_fields(&self) -> &HashMap<String, String> {
        &self.post
    }

    pub fn post_field(&self, key: &str) -> Option<&str> {
        self.post.get(key).map(String::as_str)
    }

    /// Declared `Content-Length`, `0` when absent or unparseable.
    pub fn content_length(&self) -> usize {
        self.header(CONTENT_LENGTH.as_str())
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(0)
    }

    /// True for an `application/x-www-form-urlencoded` content type, or when
    /// no `Content-Type` header was sent at all.
    pub fn is_form_urlencoded(&self) -> bool {
        match self.header(CONTENT_TYPE.as_str()) {
            Some(value) => value
                .trim_start()
                .get(..33)
                .map(|prefix| prefix.eq_ignore_ascii_case("application/x-www-form-urlencoded"))
                .unwrap_or(false),
            None => !self.headers.contains_key(CONTENT_TYPE),
        }
    }

    /// Result of the credential check, if this request triggered one.
    pub fn verified(&self) -> Option<bool> {
        self.verified
    }

    /// Peer address of the connection the request arrived on.
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    pub fn is_keep_alive(&self) -> bool {
        match self.header(CONNECTION.as_str()) {
            Some(value) if value.trim().eq_ignore_ascii_case("close") => false,
            Some(value) if value.trim().eq_ignore_ascii_case("keep-alive") => true,
            _ => self.version == "1.1",
        }
    }

    /// Converts the record into an `http::Request` for handler code built
    /// on the `http` crate.
    pub fn into_http(self) -> Result<http::Request<Body>, http::Error> {
        let target = match &self.query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        };
        let version = match self.version.as_str() {
            "0.9" => http::Version::HTTP_09,
            "1.0" => http::Version::HTTP_10,
            "2" | "2.0" => http::Version::HTTP_2,
            "3" | "3.0" => http::Version::HTTP_3,
            _ => http::Version::HTTP_11,
        };

        let mut builder = http::Request::builder()
            .method(self.method.as_str())
            .uri(target)
            .version(version);
        if let Some(headers) = builder.headers_mut() {
            *headers = self.headers;
        }

        let len = self.body.len();
        builder.body(Body {
            bytes: self.body,
            len,
            form: self.post,
            ip: self.remote_addr,
        })
    }
}
